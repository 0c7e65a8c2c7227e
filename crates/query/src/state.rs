//! Per-view table state and the patches that mutate it.

use std::collections::BTreeMap;
use std::sync::Arc;

use gridwire_core::{FieldDescriptor, FilterSet, Pagination, RowId, SortField, ViewMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::builder::CanonicalKey;
use crate::result::QueryResult;

/// Selected rows, keyed by row id.
pub type Selection = BTreeMap<RowId, Value>;

/// Where a view loads its rows from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    /// Send the URL as is, without list parameters.
    #[serde(default)]
    pub no_filter: bool,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            no_filter: false,
        }
    }

    /// Endpoint that never receives list parameters.
    pub fn unfiltered(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            no_filter: true,
        }
    }
}

/// Static configuration of a view, supplied once at initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    pub endpoint: Endpoint,
    #[serde(default)]
    pub columns: Vec<FieldDescriptor>,
    #[serde(default = "default_row_id_field")]
    pub row_id_field: String,
    #[serde(default)]
    pub pagination: Pagination,
}

impl ViewDescriptor {
    #[must_use]
    pub fn new(endpoint: Endpoint, columns: Vec<FieldDescriptor>) -> Self {
        Self {
            endpoint,
            columns,
            row_id_field: default_row_id_field(),
            pagination: Pagination::default(),
        }
    }

    /// Set the field rows are identified by.
    #[must_use]
    pub fn row_id_field(mut self, field: impl Into<String>) -> Self {
        self.row_id_field = field.into();
        self
    }

    /// Set the initial pagination.
    #[must_use]
    pub const fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }
}

fn default_row_id_field() -> String {
    "id".to_string()
}

/// Live state of one grid view.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub endpoint: Endpoint,
    pub columns: Vec<FieldDescriptor>,
    pub row_id_field: String,

    pub filters: FilterSet,
    pub search_text: String,
    pub sort: Vec<SortField>,
    pub pagination: Pagination,
    pub selection: Selection,
    pub view_mode: ViewMode,

    /// Last result applied under the live key.
    pub result: Option<Arc<QueryResult>>,
    pub result_key: Option<CanonicalKey>,
    /// Last `meta.totalRowCount` the server sent for this view.
    pub reported_total: Option<u64>,

    pub is_loading: bool,
    pub is_refetching: bool,
    pub should_refetch: bool,
    pub unauthenticated: bool,

    /// Every row this view has received, by id.
    pub(crate) observed: BTreeMap<RowId, Value>,
}

impl TableView {
    /// Default state for a freshly initialized view.
    #[must_use]
    pub fn new(descriptor: ViewDescriptor) -> Self {
        Self {
            endpoint: descriptor.endpoint,
            columns: descriptor.columns,
            row_id_field: descriptor.row_id_field,
            filters: FilterSet::new(),
            search_text: String::new(),
            sort: Vec::new(),
            pagination: descriptor.pagination,
            selection: Selection::new(),
            view_mode: ViewMode::default(),
            result: None,
            result_key: None,
            reported_total: None,
            is_loading: false,
            is_refetching: false,
            should_refetch: false,
            unauthenticated: false,
            observed: BTreeMap::new(),
        }
    }

    /// Rows of the applied result.
    #[must_use]
    pub fn rows(&self) -> &[Value] {
        match &self.result {
            Some(result) => &result.rows,
            None => &[],
        }
    }

    /// Last total the server reported. A response without a count keeps
    /// the previous one; before any count the applied row count is used.
    #[must_use]
    pub fn total_row_count(&self) -> u64 {
        self.reported_total
            .unwrap_or_else(|| self.result.as_ref().map_or(0, |r| r.total()))
    }

    /// Look up a row this view has received.
    #[must_use]
    pub fn observed_row(&self, id: &RowId) -> Option<&Value> {
        self.observed.get(id)
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selection.contains_key(id)
    }
}

/// Shallow update of a [`TableView`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewPatch {
    pub filters: Option<FilterSet>,
    pub search_text: Option<String>,
    pub sort: Option<Vec<SortField>>,
    pub pagination: Option<Pagination>,
    /// Ids to select; rows are materialized from the observed rows.
    pub selection: Option<Vec<RowId>>,
    /// Any mode patch clears the selection.
    pub view_mode: Option<ViewMode>,
    pub is_loading: Option<bool>,
    pub is_refetching: Option<bool>,
}

impl ViewPatch {
    /// Move to another page.
    #[must_use]
    pub fn page(pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::default()
        }
    }

    /// Change the page size; the offset returns to the first page.
    ///
    /// # Errors
    ///
    /// Returns [`gridwire_core::Error::InvalidPageSize`] for a zero size.
    pub fn page_size(current: Pagination, page_size: u64) -> gridwire_core::Result<Self> {
        Ok(Self::page(current.with_page_size(page_size)?))
    }

    /// Replace the filters and return to the first page.
    #[must_use]
    pub fn filters(filters: FilterSet, current: Pagination) -> Self {
        Self {
            filters: Some(filters),
            pagination: Some(current.reset()),
            ..Self::default()
        }
    }

    /// Replace the search text and return to the first page.
    #[must_use]
    pub fn search(text: impl Into<String>, current: Pagination) -> Self {
        Self {
            search_text: Some(text.into()),
            pagination: Some(current.reset()),
            ..Self::default()
        }
    }

    /// Replace the sort and return to the first page.
    #[must_use]
    pub fn sort(sort: Vec<SortField>, current: Pagination) -> Self {
        Self {
            sort: Some(sort),
            pagination: Some(current.reset()),
            ..Self::default()
        }
    }

    /// Replace the selection.
    #[must_use]
    pub fn select(ids: impl IntoIterator<Item = RowId>) -> Self {
        Self {
            selection: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Switch between table and card mode.
    #[must_use]
    pub fn view_mode(mode: ViewMode) -> Self {
        Self {
            view_mode: Some(mode),
            ..Self::default()
        }
    }

    /// Set the transient fetch flags.
    #[must_use]
    pub fn loading(is_loading: bool, is_refetching: bool) -> Self {
        Self {
            is_loading: Some(is_loading),
            is_refetching: Some(is_refetching),
            ..Self::default()
        }
    }

    /// Add a selection to this patch.
    #[must_use]
    pub fn with_selection(mut self, ids: impl IntoIterator<Item = RowId>) -> Self {
        self.selection = Some(ids.into_iter().collect());
        self
    }

    /// Add a mode change to this patch.
    #[must_use]
    pub const fn with_view_mode(mut self, mode: ViewMode) -> Self {
        self.view_mode = Some(mode);
        self
    }

    /// Whether the patch changes no field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.filters.is_none()
            && self.search_text.is_none()
            && self.sort.is_none()
            && self.pagination.is_none()
            && self.selection.is_none()
            && self.view_mode.is_none()
            && self.is_loading.is_none()
            && self.is_refetching.is_none()
    }
}
