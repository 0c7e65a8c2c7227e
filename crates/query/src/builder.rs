//! Canonical request construction.
//!
//! [`QueryBuilder::build`] turns a view's live state into the request that is
//! sent over the wire and the [`CanonicalKey`] used for caching, request
//! deduplication and stale-response detection. Building is pure: equal
//! states always produce equal keys.
//!
//! List parameters are appended in a fixed order:
//! `start`, `size`, `filters`, `globalFilter`, `sorting`.

use gridwire_core::{
    DEFAULT_PAGE_SIZE, FieldDescriptor, Filter, FilterSet, FilterValue, Pagination, SortDirection,
    SortField, ViewId, find_field,
};
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use url::Url;
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::state::TableView;

/// Trailing path segment that addresses a single resource.
const RESOURCE_ID_PATTERN: &str =
    r"^(\d+|[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})$";

/// Endpoint classification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Regexes matched against the endpoint path; a match marks the
    /// endpoint as static (never paginated).
    #[serde(default = "default_static_patterns")]
    pub static_patterns: Vec<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            static_patterns: default_static_patterns(),
        }
    }
}

impl BuilderConfig {
    /// Add a static endpoint pattern.
    #[must_use]
    pub fn static_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.static_patterns.push(pattern.into());
        self
    }
}

fn default_static_patterns() -> Vec<String> {
    ["/lookup", "/options", "/enums", "/me"]
        .iter()
        .map(|segment| format!("{segment}(/|$)"))
        .collect()
}

/// Value identity of a list request.
///
/// Two requests with equal keys are interchangeable. The view id is not part
/// of the key so that views showing the same data share cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CanonicalKey {
    /// Endpoint URL as configured on the view, without list parameters.
    pub url: String,
    pub filters: String,
    pub global_filter: String,
    pub sorting: String,
    pub start: u64,
    pub size: u64,
    pub no_filter: bool,
}

impl CanonicalKey {
    /// Whether this key's endpoint lies under `prefix` (same path, or a
    /// sub-path, or the same path with a query string).
    #[must_use]
    pub fn is_under(&self, prefix: &str) -> bool {
        is_under(&self.url, prefix)
    }
}

pub(crate) fn is_under(url: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    url.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
}

/// A built request: the target to GET and its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub view_id: ViewId,
    /// Endpoint URL with list parameters appended; relative targets are
    /// resolved by the transport.
    pub target: String,
    pub key: CanonicalKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFilter {
    id: String,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireSort {
    id: String,
    desc: bool,
}

/// Deterministic request builder.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    static_patterns: RegexSet,
    resource_id: Regex,
}

impl QueryBuilder {
    /// Compile the endpoint classification patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if a static pattern is not a valid
    /// regex.
    pub fn new(config: &BuilderConfig) -> Result<Self> {
        let static_patterns = RegexSet::new(&config.static_patterns)
            .map_err(|e| Error::invalid_query(format!("invalid static pattern: {e}")))?;
        let resource_id =
            Regex::new(RESOURCE_ID_PATTERN).map_err(|e| Error::invalid_query(e.to_string()))?;
        Ok(Self {
            static_patterns,
            resource_id,
        })
    }

    /// Whether list parameters are appended for `endpoint_url`.
    #[must_use]
    pub fn is_paginated(&self, endpoint_url: &str) -> bool {
        let path = endpoint_path(endpoint_url);
        let last_segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
        !(self.resource_id.is_match(last_segment) || self.static_patterns.is_match(&path))
    }

    /// Build the canonical request for `view`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] for an empty endpoint URL and
    /// [`Error::Json`] if the parameters cannot be encoded.
    pub fn build(&self, view_id: &ViewId, view: &TableView) -> Result<CanonicalRequest> {
        let endpoint = &view.endpoint;
        if endpoint.url.trim().is_empty() {
            return Err(Error::invalid_query(format!(
                "view '{view_id}' has no endpoint URL"
            )));
        }

        if endpoint.no_filter || !self.is_paginated(&endpoint.url) {
            return Ok(CanonicalRequest {
                view_id: view_id.clone(),
                target: endpoint.url.clone(),
                key: CanonicalKey {
                    url: endpoint.url.clone(),
                    filters: "[]".to_string(),
                    global_filter: String::new(),
                    sorting: "[]".to_string(),
                    start: 0,
                    size: 0,
                    no_filter: endpoint.no_filter,
                },
            });
        }

        let filters = encode_filters(&view.filters)?;
        let sorting = encode_sorting(&view.sort)?;
        let start = view.pagination.offset();
        let size = view.pagination.size();

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("start", &start.to_string())
            .append_pair("size", &size.to_string())
            .append_pair("filters", &filters)
            .append_pair("globalFilter", &view.search_text)
            .append_pair("sorting", &sorting)
            .finish();

        Ok(CanonicalRequest {
            view_id: view_id.clone(),
            target: append_query(&endpoint.url, &query),
            key: CanonicalKey {
                url: endpoint.url.clone(),
                filters,
                global_filter: view.search_text.clone(),
                sorting,
                start,
                size,
                no_filter: false,
            },
        })
    }
}

fn encode_filters(filters: &FilterSet) -> Result<String> {
    let wire: Vec<WireFilter> = filters
        .iter()
        .map(|f| WireFilter {
            id: f.field_id.clone(),
            value: f.value.to_wire(),
        })
        .collect();
    Ok(serde_json::to_string(&wire)?)
}

fn encode_sorting(sort: &[SortField]) -> Result<String> {
    let wire: Vec<WireSort> = sort
        .iter()
        .map(|s| WireSort {
            id: s.field_id.clone(),
            desc: s.direction.is_desc(),
        })
        .collect();
    Ok(serde_json::to_string(&wire)?)
}

fn append_query(url: &str, query: &str) -> String {
    if url.ends_with('?') || url.ends_with('&') {
        format!("{url}{query}")
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}

/// Path component of an absolute or relative endpoint URL.
fn endpoint_path(endpoint_url: &str) -> String {
    match Url::parse(endpoint_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => endpoint_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// A list query as the server sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: FilterSet,
    pub global_filter: String,
    pub sort: Vec<SortField>,
    pub pagination: Pagination,
}

impl ListQuery {
    /// Parse the list parameters of `url`, typing filter values against
    /// `columns`. Missing parameters take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed `filters`/`sorting`, a core
    /// error for unknown fields, invalid values or misaligned pagination,
    /// and [`Error::InvalidQuery`] for non-numeric `start`/`size`.
    pub fn parse(url: &Url, columns: &[FieldDescriptor]) -> Result<Self> {
        let mut start = 0;
        let mut size = DEFAULT_PAGE_SIZE;
        let mut filters = FilterSet::new();
        let mut global_filter = String::new();
        let mut sort = Vec::new();

        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "start" => start = parse_number("start", &value)?,
                "size" => size = parse_number("size", &value)?,
                "filters" => filters = decode_filters(&value, columns)?,
                "globalFilter" => global_filter = value.into_owned(),
                "sorting" => sort = decode_sorting(&value)?,
                _ => {}
            }
        }

        Ok(Self {
            filters,
            global_filter,
            sort,
            pagination: Pagination::from_offset(start, size)?,
        })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| Error::invalid_query(format!("'{name}' must be a non-negative integer, got '{raw}'")))
}

fn decode_filters(raw: &str, columns: &[FieldDescriptor]) -> Result<FilterSet> {
    let wire: Vec<WireFilter> = serde_json::from_str(raw)?;
    wire.into_iter()
        .map(|f| -> Result<Filter> {
            let field = find_field(columns, &f.id)
                .ok_or_else(|| gridwire_core::Error::unknown_field(&f.id))?;
            let value = FilterValue::parse(&field.kind, &f.id, &f.value)?;
            Ok(Filter::new(f.id, value))
        })
        .collect()
}

fn decode_sorting(raw: &str) -> Result<Vec<SortField>> {
    let wire: Vec<WireSort> = serde_json::from_str(raw)?;
    Ok(wire
        .into_iter()
        .map(|s| SortField {
            field_id: s.id,
            direction: if s.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Endpoint, ViewDescriptor};
    use gridwire_core::FieldDescriptor;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn view(url: &str) -> TableView {
        TableView::new(ViewDescriptor::new(
            Endpoint::new(url),
            vec![
                FieldDescriptor::text("Name", "name"),
                FieldDescriptor::enumeration("Status", "status", ["active", "closed"]),
            ],
        ))
    }

    fn builder() -> Result<QueryBuilder> {
        QueryBuilder::new(&BuilderConfig::default())
    }

    #[test]
    fn test_paginated_endpoint_gets_params_in_order() -> TestResult {
        let mut state = view("/api/customers");
        state.filters.insert(Filter::text("name", "ana"));
        state.search_text = "north".to_string();
        state.sort = vec![SortField::desc("name")];
        state.pagination = Pagination::new(2, 25)?;

        let request = builder()?.build(&ViewId::new("v"), &state)?;

        assert_eq!(
            request.target,
            "/api/customers?start=50&size=25\
             &filters=%5B%7B%22id%22%3A%22name%22%2C%22value%22%3A%22ana%22%7D%5D\
             &globalFilter=north\
             &sorting=%5B%7B%22id%22%3A%22name%22%2C%22desc%22%3Atrue%7D%5D"
        );
        assert_eq!(request.key.start, 50);
        assert_eq!(request.key.filters, r#"[{"id":"name","value":"ana"}]"#);
        Ok(())
    }

    #[test]
    fn test_empty_state_still_sends_all_params() -> TestResult {
        let request = builder()?.build(&ViewId::new("v"), &view("/api/customers"))?;
        assert_eq!(
            request.target,
            "/api/customers?start=0&size=25&filters=%5B%5D&globalFilter=&sorting=%5B%5D"
        );
        Ok(())
    }

    #[test]
    fn test_existing_query_is_extended() -> TestResult {
        let request = builder()?.build(&ViewId::new("v"), &view("/api/customers?archived=true"))?;
        assert!(request.target.starts_with("/api/customers?archived=true&start=0"));
        Ok(())
    }

    #[test]
    fn test_no_filter_endpoint_is_untouched() -> TestResult {
        let mut state = view("/api/customers");
        state.endpoint.no_filter = true;
        state.search_text = "ignored".to_string();

        let request = builder()?.build(&ViewId::new("v"), &state)?;
        assert_eq!(request.target, "/api/customers");
        assert!(request.key.no_filter);
        Ok(())
    }

    #[test]
    fn test_endpoint_classification() -> TestResult {
        let builder = builder()?;
        assert!(builder.is_paginated("/api/customers"));
        assert!(builder.is_paginated("https://api.example.com/v2/orders/"));
        assert!(!builder.is_paginated("/api/customers/42"));
        assert!(!builder.is_paginated(
            "/api/customers/0b7e7dee-87bd-4bd4-8a3c-6f1f3b8b2a11"
        ));
        assert!(!builder.is_paginated("/api/customers/lookup"));
        assert!(!builder.is_paginated("/api/me"));
        assert!(builder.is_paginated("/api/members"));
        Ok(())
    }

    #[test]
    fn test_custom_static_pattern() -> TestResult {
        let builder = QueryBuilder::new(&BuilderConfig::default().static_pattern("/summary$"))?;
        assert!(!builder.is_paginated("/api/sales/summary"));
        Ok(())
    }

    #[test]
    fn test_invalid_static_pattern_is_rejected() {
        let config = BuilderConfig {
            static_patterns: vec!["(".to_string()],
        };
        assert!(QueryBuilder::new(&config).is_err());
    }

    #[test]
    fn test_view_id_not_part_of_key() -> TestResult {
        let builder = builder()?;
        let state = view("/api/customers");
        let a = builder.build(&ViewId::new("left"), &state)?;
        let b = builder.build(&ViewId::new("right"), &state)?;
        assert_eq!(a.key, b.key);
        Ok(())
    }

    #[test]
    fn test_parse_reconstructs_state() -> TestResult {
        let mut state = view("/api/customers");
        state
            .filters
            .insert(Filter::new("status", FilterValue::Enum("active".to_string())));
        state.sort = vec![SortField::asc("name"), SortField::desc("status")];
        state.search_text = "a&b=c".to_string();
        state.pagination = Pagination::new(3, 10)?;

        let request = builder()?.build(&ViewId::new("v"), &state)?;
        let url = Url::parse("http://localhost")?.join(&request.target)?;
        let parsed = ListQuery::parse(&url, &state.columns)?;

        assert_eq!(parsed.filters, state.filters);
        assert_eq!(parsed.sort, state.sort);
        assert_eq!(parsed.global_filter, "a&b=c");
        assert_eq!(parsed.pagination, state.pagination);
        Ok(())
    }

    #[test]
    fn test_parse_rejects_unknown_field() -> TestResult {
        let url = Url::parse(
            "http://localhost/api?filters=%5B%7B%22id%22%3A%22nope%22%2C%22value%22%3A%22x%22%7D%5D",
        )?;
        let err = ListQuery::parse(&url, &[]).err().ok_or("expected an error")?;
        assert!(matches!(
            err,
            Error::Core(gridwire_core::Error::UnknownField { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_parse_defaults() -> TestResult {
        let parsed = ListQuery::parse(&Url::parse("http://localhost/api/customers")?, &[])?;
        assert!(parsed.filters.is_empty());
        assert_eq!(parsed.pagination, Pagination::default());
        Ok(())
    }

    #[test]
    fn test_is_under_respects_segment_boundaries() {
        assert!(is_under("/api/customers", "/api/customers"));
        assert!(is_under("/api/customers?archived=true", "/api/customers"));
        assert!(is_under("/api/customers/7/orders", "/api/customers/"));
        assert!(!is_under("/api/customers-archive", "/api/customers"));
    }
}
