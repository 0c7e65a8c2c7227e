//! Process-wide store of view state.
//!
//! Every view is keyed by its [`ViewId`] and mutated only through
//! [`ViewPatch`]es. Results are applied under a key guard: a response whose
//! canonical key no longer matches the view's live key is recorded as
//! observed rows but never becomes the view's data. Views marked
//! unauthenticated accept no results until the session is re-established.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use gridwire_core::{RowId, ViewId};
use tracing::{debug, info, warn};

use crate::builder::{CanonicalKey, QueryBuilder};
use crate::error::{Error, Result};
use crate::result::QueryResult;
use crate::state::{Selection, TableView, ViewDescriptor, ViewPatch};

/// Concurrent map of view states.
#[derive(Debug)]
pub struct QueryRegistry {
    views: DashMap<ViewId, TableView>,
    builder: QueryBuilder,
}

impl QueryRegistry {
    #[must_use]
    pub fn new(builder: QueryBuilder) -> Self {
        Self {
            views: DashMap::new(),
            builder,
        }
    }

    /// The builder used to derive live keys.
    #[must_use]
    pub const fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Create default state for `view_id` unless it exists.
    ///
    /// Returns whether the view was created.
    pub fn initialize(&self, view_id: ViewId, descriptor: ViewDescriptor) -> bool {
        match self.views.entry(view_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                debug!(view_id = %entry.key(), url = %descriptor.endpoint.url, "Initializing view");
                entry.insert(TableView::new(descriptor));
                true
            }
        }
    }

    /// Merge `patch` into the view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn patch(&self, view_id: &ViewId, patch: ViewPatch) -> Result<()> {
        let mut view = self
            .views
            .get_mut(view_id)
            .ok_or_else(|| Error::unknown_view(view_id))?;
        apply_patch(view_id, &mut view, patch);
        Ok(())
    }

    /// Merge `patch` only while the view's live key equals `key`.
    ///
    /// Returns whether the patch was applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn patch_if_current(
        &self,
        view_id: &ViewId,
        key: &CanonicalKey,
        patch: ViewPatch,
    ) -> Result<bool> {
        let mut view = self
            .views
            .get_mut(view_id)
            .ok_or_else(|| Error::unknown_view(view_id))?;
        if !self.is_current(view_id, &view, key) {
            return Ok(false);
        }
        apply_patch(view_id, &mut view, patch);
        Ok(true)
    }

    /// Ask the next sync to bypass cache freshness.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn request_refetch(&self, view_id: &ViewId) -> Result<()> {
        let mut view = self
            .views
            .get_mut(view_id)
            .ok_or_else(|| Error::unknown_view(view_id))?;
        view.should_refetch = true;
        Ok(())
    }

    /// Consume a pending refetch request. Returns whether one was pending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn acknowledge_refetch(&self, view_id: &ViewId) -> Result<bool> {
        let mut view = self
            .views
            .get_mut(view_id)
            .ok_or_else(|| Error::unknown_view(view_id))?;
        Ok(std::mem::replace(&mut view.should_refetch, false))
    }

    /// Record the rows of `result` and make it the view's data if `key` is
    /// still the live key. Returns whether the result was applied.
    ///
    /// Unauthenticated views ignore results entirely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn apply_result(
        &self,
        view_id: &ViewId,
        key: &CanonicalKey,
        result: Arc<QueryResult>,
    ) -> Result<bool> {
        let mut view = self
            .views
            .get_mut(view_id)
            .ok_or_else(|| Error::unknown_view(view_id))?;

        if view.unauthenticated {
            debug!(view_id = %view_id, "Ignoring result for unauthenticated view");
            return Ok(false);
        }

        for row in &result.rows {
            if let Some(id) = RowId::from_row(row, &view.row_id_field) {
                view.observed.insert(id, row.clone());
            }
        }

        if !self.is_current(view_id, &view, key) {
            debug!(view_id = %view_id, start = key.start, "Ignoring result for superseded key");
            return Ok(false);
        }

        if let Some(total) = result.total_row_count {
            view.reported_total = Some(total);
        }
        view.result = Some(result);
        view.result_key = Some(key.clone());
        Ok(true)
    }

    /// Remove a view. Returns whether it existed.
    pub fn dispose(&self, view_id: &ViewId) -> bool {
        let removed = self.views.remove(view_id).is_some();
        if removed {
            debug!(view_id = %view_id, "Disposed view");
        }
        removed
    }

    /// Copy of the view's state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn snapshot(&self, view_id: &ViewId) -> Result<TableView> {
        self.views
            .get(view_id)
            .map(|view| view.clone())
            .ok_or_else(|| Error::unknown_view(view_id))
    }

    /// Canonical key of the view's current state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] or the builder's error.
    pub fn live_key(&self, view_id: &ViewId) -> Result<CanonicalKey> {
        let view = self
            .views
            .get(view_id)
            .ok_or_else(|| Error::unknown_view(view_id))?;
        Ok(self.builder.build(view_id, &view)?.key)
    }

    /// Ids of all registered views, sorted.
    #[must_use]
    pub fn view_ids(&self) -> Vec<ViewId> {
        let mut ids: Vec<ViewId> = self.views.iter().map(|v| v.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Ids of views whose endpoint lies under `prefix`.
    #[must_use]
    pub fn views_under(&self, prefix: &str) -> Vec<ViewId> {
        let mut ids: Vec<ViewId> = self
            .views
            .iter()
            .filter(|v| crate::builder::is_under(&v.endpoint.url, prefix))
            .map(|v| v.key().clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drop data, selection and transient flags of every view after the
    /// session was torn down.
    pub fn mark_all_unauthenticated(&self) {
        for mut view in self.views.iter_mut() {
            view.result = None;
            view.result_key = None;
            view.reported_total = None;
            view.selection.clear();
            view.observed.clear();
            view.is_loading = false;
            view.is_refetching = false;
            view.should_refetch = false;
            view.unauthenticated = true;
        }
        info!(views = self.views.len(), "Marked all views unauthenticated");
    }

    /// Let views accept results again after a new login.
    pub fn mark_all_authenticated(&self) {
        let mut restored = 0_usize;
        for mut view in self.views.iter_mut() {
            if std::mem::replace(&mut view.unauthenticated, false) {
                restored = restored.saturating_add(1);
            }
        }
        if restored > 0 {
            info!(views = restored, "Session re-established, views accept data again");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    fn is_current(&self, view_id: &ViewId, view: &TableView, key: &CanonicalKey) -> bool {
        self.builder
            .build(view_id, view)
            .is_ok_and(|request| &request.key == key)
    }
}

fn apply_patch(view_id: &ViewId, view: &mut TableView, patch: ViewPatch) {
    if let Some(filters) = patch.filters {
        view.filters = filters;
    }
    if let Some(search_text) = patch.search_text {
        view.search_text = search_text;
    }
    if let Some(sort) = patch.sort {
        view.sort = sort;
    }
    if let Some(pagination) = patch.pagination {
        view.pagination = pagination;
    }
    if let Some(is_loading) = patch.is_loading {
        view.is_loading = is_loading;
    }
    if let Some(is_refetching) = patch.is_refetching {
        view.is_refetching = is_refetching;
    }

    if let Some(mode) = patch.view_mode {
        if mode != view.view_mode {
            debug!(view_id = %view_id, mode = %mode, "Switching view mode");
        }
        view.view_mode = mode;
        view.selection.clear();
        return;
    }

    if let Some(ids) = patch.selection {
        view.selection = materialize_selection(view_id, view, ids);
    }
}

fn materialize_selection(view_id: &ViewId, view: &TableView, ids: Vec<RowId>) -> Selection {
    ids.into_iter()
        .filter_map(|id| match view.observed.get(&id) {
            Some(row) => Some((id, row.clone())),
            None => {
                warn!(view_id = %view_id, row_id = %id, "Dropping selection of unknown row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuilderConfig;
    use crate::state::Endpoint;
    use gridwire_core::{FieldDescriptor, Filter, FilterSet, Pagination, ViewMode};
    use serde_json::json;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn registry() -> Result<QueryRegistry> {
        Ok(QueryRegistry::new(QueryBuilder::new(&BuilderConfig::default())?))
    }

    fn customers() -> ViewDescriptor {
        ViewDescriptor::new(
            Endpoint::new("/api/customers"),
            vec![FieldDescriptor::text("Name", "name")],
        )
    }

    fn rows(ids: &[u64], total: u64) -> Arc<QueryResult> {
        Arc::new(QueryResult::new(
            ids.iter().map(|id| json!({"id": id, "name": format!("c{id}")})).collect(),
            Some(total),
        ))
    }

    #[test]
    fn test_initialize_is_idempotent() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        assert!(registry.initialize(id.clone(), customers()));
        registry.patch(&id, ViewPatch::search("ana", Pagination::default()))?;
        assert!(!registry.initialize(id.clone(), customers()));
        assert_eq!(registry.snapshot(&id)?.search_text, "ana");
        Ok(())
    }

    #[test]
    fn test_unknown_view_is_an_error() -> TestResult {
        let registry = registry()?;
        let err = registry
            .patch(&ViewId::new("ghost"), ViewPatch::default())
            .err()
            .ok_or("expected an error")?;
        assert!(matches!(err, Error::UnknownView { .. }));
        Ok(())
    }

    #[test]
    fn test_patch_is_shallow() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());

        registry.patch(&id, ViewPatch::search("ana", Pagination::default()))?;
        registry.patch(&id, ViewPatch::loading(true, false))?;

        let view = registry.snapshot(&id)?;
        assert_eq!(view.search_text, "ana");
        assert!(view.is_loading);
        Ok(())
    }

    #[test]
    fn given_governed_page_size_change_then_offset_is_aligned() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());

        let current = registry.snapshot(&id)?.pagination;
        registry.patch(&id, ViewPatch::page(current.with_page_index(3)?))?;
        let current = registry.snapshot(&id)?.pagination;
        registry.patch(&id, ViewPatch::page_size(current, 40)?)?;

        let pagination = registry.snapshot(&id)?.pagination;
        assert_eq!(pagination.offset().checked_rem(pagination.size()), Some(0));
        assert_eq!(pagination.offset(), 0);
        Ok(())
    }

    #[test]
    fn given_selection_when_view_mode_toggles_then_selection_is_empty() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());
        let key = registry.live_key(&id)?;
        registry.apply_result(&id, &key, rows(&[1, 2, 3], 3))?;

        registry.patch(&id, ViewPatch::select([RowId::new("1"), RowId::new("2")]))?;
        assert_eq!(registry.snapshot(&id)?.selection.len(), 2);

        let mode = registry.snapshot(&id)?.view_mode.toggled();
        registry.patch(
            &id,
            ViewPatch::view_mode(mode).with_selection([RowId::new("3")]),
        )?;

        let view = registry.snapshot(&id)?;
        assert_eq!(view.view_mode, ViewMode::Card);
        assert!(view.selection.is_empty());
        Ok(())
    }

    #[test]
    fn test_selection_drops_unknown_ids() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());
        let key = registry.live_key(&id)?;
        registry.apply_result(&id, &key, rows(&[1], 1))?;

        registry.patch(&id, ViewPatch::select([RowId::new("1"), RowId::new("99")]))?;

        let view = registry.snapshot(&id)?;
        assert!(view.is_selected(&RowId::new("1")));
        assert!(!view.is_selected(&RowId::new("99")));
        assert_eq!(
            view.selection.get(&RowId::new("1")),
            Some(&json!({"id": 1, "name": "c1"}))
        );
        Ok(())
    }

    #[test]
    fn given_stale_key_response_then_newer_total_is_kept() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());

        let first_page = registry.live_key(&id)?;
        let current = registry.snapshot(&id)?.pagination;
        registry.patch(&id, ViewPatch::page(current.with_page_index(1)?))?;
        let second_page = registry.live_key(&id)?;

        assert!(registry.apply_result(&id, &second_page, rows(&[26], 120))?);
        assert!(!registry.apply_result(&id, &first_page, rows(&[1], 999))?);

        let view = registry.snapshot(&id)?;
        assert_eq!(view.total_row_count(), 120);
        assert_eq!(view.result_key, Some(second_page));
        assert!(view.observed_row(&RowId::new("1")).is_some());
        Ok(())
    }

    #[test]
    fn test_patch_if_current_ignores_superseded_key() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());
        let old = registry.live_key(&id)?;

        registry.patch(
            &id,
            ViewPatch::filters(
                FilterSet::new().with(Filter::text("name", "x")),
                Pagination::default(),
            ),
        )?;

        assert!(!registry.patch_if_current(&id, &old, ViewPatch::loading(true, false))?);
        assert!(!registry.snapshot(&id)?.is_loading);
        Ok(())
    }

    #[test]
    fn test_refetch_flag_is_edge_triggered() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());

        registry.request_refetch(&id)?;
        assert!(registry.acknowledge_refetch(&id)?);
        assert!(!registry.acknowledge_refetch(&id)?);
        Ok(())
    }

    #[test]
    fn test_mark_all_unauthenticated_and_dispose() -> TestResult {
        let registry = registry()?;
        let a = ViewId::new("a");
        let b = ViewId::new("b");
        registry.initialize(a.clone(), customers());
        registry.initialize(b.clone(), customers());
        let key = registry.live_key(&a)?;
        registry.apply_result(&a, &key, rows(&[1], 1))?;

        registry.mark_all_unauthenticated();

        let view = registry.snapshot(&a)?;
        assert!(view.unauthenticated);
        assert!(view.rows().is_empty());
        assert_eq!(registry.view_ids(), vec![a.clone(), b.clone()]);

        assert!(registry.dispose(&a));
        assert!(!registry.dispose(&a));
        assert_eq!(registry.view_ids(), vec![b]);
        Ok(())
    }

    #[test]
    fn given_unauthenticated_view_then_results_are_ignored_until_login() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());
        let key = registry.live_key(&id)?;

        registry.mark_all_unauthenticated();
        assert!(!registry.apply_result(&id, &key, rows(&[1], 1))?);

        let view = registry.snapshot(&id)?;
        assert!(view.unauthenticated);
        assert!(view.rows().is_empty());
        assert!(view.observed_row(&RowId::new("1")).is_none());

        registry.mark_all_authenticated();
        assert!(registry.apply_result(&id, &key, rows(&[1], 1))?);
        assert!(!registry.snapshot(&id)?.unauthenticated);
        Ok(())
    }

    #[test]
    fn given_response_without_total_then_previous_total_is_kept() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());
        let key = registry.live_key(&id)?;

        registry.apply_result(&id, &key, rows(&[1, 2], 240))?;
        let uncounted = Arc::new(QueryResult::new(vec![json!({"id": 3})], None));
        assert!(registry.apply_result(&id, &key, uncounted)?);

        let view = registry.snapshot(&id)?;
        assert_eq!(view.rows().len(), 1);
        assert_eq!(view.total_row_count(), 240);
        Ok(())
    }

    #[test]
    fn given_no_reported_total_then_row_count_is_used() -> TestResult {
        let registry = registry()?;
        let id = ViewId::new("customers");
        registry.initialize(id.clone(), customers());
        let key = registry.live_key(&id)?;

        let uncounted = Arc::new(QueryResult::new(vec![json!({"id": 1}), json!({"id": 2})], None));
        registry.apply_result(&id, &key, uncounted)?;

        assert_eq!(registry.snapshot(&id)?.total_row_count(), 2);
        Ok(())
    }

    #[test]
    fn test_views_under_prefix() -> TestResult {
        let registry = registry()?;
        registry.initialize(ViewId::new("customers"), customers());
        registry.initialize(
            ViewId::new("orders"),
            ViewDescriptor::new(Endpoint::new("/api/orders"), Vec::new()),
        );
        assert_eq!(
            registry.views_under("/api/customers"),
            vec![ViewId::new("customers")]
        );
        Ok(())
    }
}
