//! CLI command handlers.
//!
//! Each handler builds the layers it needs from [`AppConfig`], runs them
//! against the backend and returns a serializable report that
//! [`execute_command`] prints as JSON.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use gridwire_core::{
    FieldDescriptor, Filter, FilterSet, Pagination, SortField, TenantId, ViewId, ViewMode,
};
use gridwire_fetch::{ApiRequest, FetchClient, SessionContext};
use gridwire_query::{
    ConsumerView, Endpoint, QueryBinding, QueryBuilder, QueryCache, QueryRegistry, ViewDescriptor,
    ViewPatch,
};
use gridwire_viewport::{ContainerSize, RenderInput, RenderPlan, ScrollState, covering_pages};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{Commands, ViewArgs};
use crate::config::AppConfig;

/// Execute a CLI command.
///
/// # Errors
///
/// Returns the first error of the command, with context.
pub async fn execute_command(command: Commands, config: AppConfig) -> Result<()> {
    let output = match command {
        Commands::Get { target } => cmd_get(&config, &target).await?,
        Commands::View(args) => serde_json::to_value(cmd_view(&config, &args).await?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Fetch one resource.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the request fails.
pub async fn cmd_get(config: &AppConfig, target: &str) -> Result<Value> {
    let (client, tenant) = connect(config)?;
    info!(url = target, tenant = %tenant, "GET");

    client
        .request(ApiRequest::get(target), &tenant)
        .await
        .with_context(|| format!("GET {target} failed"))
}

/// Output of the `view` command.
#[derive(Debug, Clone, Serialize)]
pub struct ViewReport {
    pub view_id: ViewId,
    pub mode: ViewMode,
    pub pagination: Pagination,
    pub total_row_count: u64,
    /// Rows fetched to fill the plan, across every page it touches.
    pub loaded_rows: usize,
    pub plan: RenderPlan,
    /// Rows the plan renders, in position order.
    pub rows: Vec<Value>,
}

/// Load a list view and compute its render plan. A virtualized window that
/// reaches past the current page loads the pages it covers.
///
/// # Errors
///
/// Returns an error for malformed arguments, an unauthenticated session, or
/// a failed fetch.
pub async fn cmd_view(config: &AppConfig, args: &ViewArgs) -> Result<ViewReport> {
    let (client, tenant) = connect(config)?;
    let builder = QueryBuilder::new(&config.builder).context("Invalid static endpoint pattern")?;
    let registry = Arc::new(QueryRegistry::new(builder));
    let binding = QueryBinding::new(
        registry,
        Arc::new(QueryCache::with_config(&config.cache)),
        Arc::new(client),
        tenant,
    );

    let view_id = ViewId::new(args.target.clone());
    let filters = parse_filters(&args.filters)?;
    let sort = parse_sort(&args.sort)?;
    let endpoint = if args.no_filter {
        Endpoint::unfiltered(args.target.clone())
    } else {
        Endpoint::new(args.target.clone())
    };
    binding
        .registry()
        .initialize(view_id.clone(), ViewDescriptor::new(endpoint, columns_for(&filters, &sort)));

    for patch in patches(args, filters, sort)? {
        binding.dispatch_patch(&view_id, patch)?;
    }

    let view = binding
        .sync(&view_id)
        .await
        .with_context(|| format!("Failed to load view {}", args.target))?;
    let plan = RenderPlan::compute(&render_input(config, args, &view));
    debug!(view_id = %view.view_id, ?plan, "render plan");

    let (rows, loaded_rows) = materialize(&binding, &view, &plan).await?;
    binding.dispose(&view_id);
    Ok(ViewReport {
        mode: view.state.view_mode,
        pagination: view.state.pagination,
        total_row_count: view.total_row_count,
        view_id: view.view_id,
        loaded_rows,
        plan,
        rows,
    })
}

fn connect(config: &AppConfig) -> Result<(FetchClient, TenantId)> {
    let session = config.token.as_ref().map_or_else(SessionContext::new, |token| {
        SessionContext::with_token(token.clone())
    });
    let client = FetchClient::new(config.fetch.clone(), Arc::new(session))
        .context("Failed to build HTTP client")?;
    Ok((client, TenantId::new(config.tenant_or_default())))
}

/// Patches for the command-line state, in dispatch order. Page size goes
/// before the page index because a page-size change resets the page.
fn patches(args: &ViewArgs, filters: FilterSet, sort: Vec<SortField>) -> Result<Vec<ViewPatch>> {
    let mut pagination = Pagination::default();
    let mut patches = Vec::new();

    if !filters.is_empty() {
        patches.push(ViewPatch::filters(filters, pagination));
    }
    if !sort.is_empty() {
        patches.push(ViewPatch::sort(sort, pagination));
    }
    if let Some(search) = args.search.as_ref().filter(|s| !s.is_empty()) {
        patches.push(ViewPatch::search(search.clone(), pagination));
    }
    if let Some(size) = args.page_size {
        let patch = ViewPatch::page_size(pagination, size)?;
        pagination = patch.pagination.unwrap_or(pagination);
        patches.push(patch);
    }
    if let Some(page) = args.page {
        patches.push(ViewPatch::page(pagination.with_page_index(page)?));
    }
    if let Some(mode) = &args.mode {
        patches.push(ViewPatch::view_mode(mode.parse()?));
    }
    Ok(patches)
}

fn render_input(config: &AppConfig, args: &ViewArgs, view: &ConsumerView) -> RenderInput {
    let mut container = ContainerSize::default();
    if let Some(width) = args.viewport_width {
        container.width = width;
    }
    if let Some(height) = args.viewport_height {
        container.height = height;
    }

    RenderInput::new(view.state.view_mode, view.rows.len(), view.total_row_count)
        .with_pagination(view.state.pagination)
        .with_scroll(ScrollState::vertical(args.scroll_top))
        .with_container(container)
        .with_config(config.viewport)
}

/// Rows at the plan's positions and the number of rows fetched for them.
///
/// Every page the plan covers is synced through the binding. Lists loaded
/// without list parameters are already whole and are indexed directly.
async fn materialize(
    binding: &QueryBinding,
    view: &ConsumerView,
    plan: &RenderPlan,
) -> Result<(Vec<Value>, usize)> {
    let positions = plan.visible_positions();
    let whole_list = view.state.result_key.as_ref().is_none_or(|key| key.size == 0);
    if whole_list {
        let rows = positions
            .filter_map(|position| usize::try_from(position).ok())
            .filter_map(|index| view.rows.get(index).cloned())
            .collect();
        return Ok((rows, view.rows.len()));
    }

    let pagination = view.state.pagination;
    let size = pagination.size();
    let mut pages = BTreeMap::from([(pagination.page_index(), view.rows.clone())]);
    for page_index in covering_pages(&positions, size) {
        if pages.contains_key(&page_index) {
            continue;
        }
        debug!(view_id = %view.view_id, page_index, "Loading page for virtual window");
        binding.dispatch_patch(&view.view_id, ViewPatch::page(pagination.with_page_index(page_index)?))?;
        let page = binding
            .sync(&view.view_id)
            .await
            .with_context(|| format!("Failed to load page {page_index} of {}", view.view_id))?;
        pages.insert(page_index, page.rows);
    }

    let loaded = pages.values().map(Vec::len).sum();
    let rows = positions
        .filter_map(|position| {
            let page = pages.get(&position.checked_div(size)?)?;
            let index = usize::try_from(position.checked_rem(size)?).ok()?;
            page.get(index).cloned()
        })
        .collect();
    Ok((rows, loaded))
}

/// Parse `field=value` pairs into text filters.
fn parse_filters(raw: &[String]) -> Result<FilterSet> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => {
                Ok(Filter::text(field.trim(), value))
            }
            _ => bail!("Invalid filter '{pair}', expected FIELD=VALUE"),
        })
        .collect()
}

/// Parse `field` or `field:asc|desc` into sort fields.
fn parse_sort(raw: &[String]) -> Result<Vec<SortField>> {
    raw.iter()
        .map(|entry| {
            let (field, direction) = entry.split_once(':').unwrap_or((entry.as_str(), "asc"));
            if field.trim().is_empty() {
                bail!("Invalid sort '{entry}', expected FIELD[:asc|desc]");
            }
            match direction.to_lowercase().as_str() {
                "asc" => Ok(SortField::asc(field.trim())),
                "desc" => Ok(SortField::desc(field.trim())),
                other => bail!("Invalid sort direction '{other}' in '{entry}'"),
            }
        })
        .collect()
}

/// Text columns for every field the command line refers to.
fn columns_for(filters: &FilterSet, sort: &[SortField]) -> Vec<FieldDescriptor> {
    let mut fields: Vec<&str> = filters
        .iter()
        .map(|f| f.field_id.as_str())
        .chain(sort.iter().map(|s| s.field_id.as_str()))
        .collect();
    fields.sort_unstable();
    fields.dedup();
    fields
        .into_iter()
        .map(|field| FieldDescriptor::text(field, field))
        .collect()
}
