//! End-to-end command tests against a mock backend.

use gridwire::cli::ViewArgs;
use gridwire::commands::{cmd_get, cmd_view};
use gridwire::config::AppConfig;
use gridwire_fetch::FetchConfig;
use gridwire_viewport::RenderPlan;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn config_for(server: &MockServer) -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig {
        tenant: Some("acme".to_string()),
        token: Some("t1".to_string()),
        fetch: FetchConfig::with_base_url(Url::parse(&server.uri())?),
        ..AppConfig::default()
    })
}

fn customers(count: usize) -> Vec<serde_json::Value> {
    (0..count).map(|i| json!({"id": i, "name": format!("c{i}")})).collect()
}

#[tokio::test]
async fn test_get_prints_body_with_tenant_and_token() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("x-tenant-code", "acme"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ana"})))
        .expect(1)
        .mount(&server)
        .await;

    let body = cmd_get(&config_for(&server)?, "/api/me").await?;

    assert_eq!(body, json!({"name": "ana"}));
    Ok(())
}

#[tokio::test]
async fn given_small_total_when_viewing_then_paged_plan() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .and(query_param("start", "25"))
        .and(query_param("size", "25"))
        .and(query_param("filters", r#"[{"id":"name","value":"c"}]"#))
        .and(query_param("sorting", r#"[{"id":"name","desc":true}]"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": customers(25),
            "meta": {"totalRowCount": 60}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let args = ViewArgs {
        target: "/api/customers".to_string(),
        filters: vec!["name=c".to_string()],
        sort: vec!["name:desc".to_string()],
        page: Some(1),
        ..ViewArgs::default()
    };
    let report = cmd_view(&config_for(&server)?, &args).await?;

    assert_eq!(report.total_row_count, 60);
    assert_eq!(report.rows.len(), 25);
    assert!(matches!(report.plan, RenderPlan::Paged(c) if c.page_index == 1 && c.page_count == 3));
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn given_large_total_when_viewing_cards_then_virtualized_grid() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": customers(500),
            "meta": {"totalRowCount": 500}
        })))
        .mount(&server)
        .await;

    let args = ViewArgs {
        target: "/api/customers".to_string(),
        page_size: Some(500),
        mode: Some("card".to_string()),
        viewport_width: Some(1100.0),
        viewport_height: Some(700.0),
        ..ViewArgs::default()
    };
    let report = cmd_view(&config_for(&server)?, &args).await?;

    let RenderPlan::Cards(window) = &report.plan else {
        return Err(format!("expected a card plan, got {:?}", report.plan).into());
    };
    assert_eq!(window.column_count, 4);
    assert_eq!(report.rows.len(), window.cards.len());
    assert!(report.rows.len() < 500);
    Ok(())
}

fn numbered(range: std::ops::Range<u64>) -> Vec<serde_json::Value> {
    range.map(|i| json!({"id": i})).collect()
}

#[tokio::test]
async fn given_total_beyond_page_when_scrolled_then_window_loads_covering_pages() -> TestResult {
    let server = MockServer::start().await;
    for (start, rows) in [("0", 0..25), ("75", 75..100), ("100", 100..125)] {
        Mock::given(method("GET"))
            .and(path("/api/customers"))
            .and(query_param("start", start))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": numbered(rows),
                "meta": {"totalRowCount": 1000}
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let args = ViewArgs {
        target: "/api/customers".to_string(),
        scroll_top: 7000.0,
        viewport_height: Some(700.0),
        ..ViewArgs::default()
    };
    let report = cmd_view(&config_for(&server)?, &args).await?;

    let RenderPlan::Table(window) = &report.plan else {
        return Err(format!("expected a table plan, got {:?}", report.plan).into());
    };
    assert_eq!(window.range(), 90..120);
    assert_eq!(window.bottom_spacer, 880.0 * 70.0);
    assert_eq!(report.loaded_rows, 75);
    assert_eq!(report.rows.first(), Some(&json!({"id": 90})));
    assert_eq!(report.rows.last(), Some(&json!({"id": 119})));
    assert_eq!(report.rows.len(), 30);
    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn test_view_without_list_parameters() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/lookup/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "pt"}, {"id": "es"}])))
        .expect(1)
        .mount(&server)
        .await;

    let args = ViewArgs {
        target: "/api/lookup/countries".to_string(),
        no_filter: true,
        ..ViewArgs::default()
    };
    let report = cmd_view(&config_for(&server)?, &args).await?;
    let requests = server.received_requests().await.unwrap_or_default();

    assert_eq!(report.loaded_rows, 2);
    assert!(requests.iter().all(|r| r.url.query().is_none()));
    Ok(())
}

#[tokio::test]
async fn test_malformed_filter_fails_before_any_request() -> TestResult {
    let server = MockServer::start().await;

    let args = ViewArgs {
        target: "/api/customers".to_string(),
        filters: vec!["no-equals-sign".to_string()],
        ..ViewArgs::default()
    };

    assert!(cmd_view(&config_for(&server)?, &args).await.is_err());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}
