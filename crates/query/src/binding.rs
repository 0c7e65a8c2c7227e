//! Binds view state to cached query execution.
//!
//! [`QueryBinding::sync`] derives the canonical request from a view's live
//! state, serves it from the [`QueryCache`] when possible, fetches through
//! the [`Transport`] otherwise, and applies the result under the key guard.
//! Results that arrive for a superseded key never overwrite newer data, and
//! results of loads retired by an invalidation are never shown.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use gridwire_core::{ResultExt, TenantId, ViewId};
use gridwire_fetch::{ApiRequest, Body, SessionContext, SessionState, Transport};
use serde_json::Value;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::builder::{CanonicalKey, CanonicalRequest};
use crate::cache::{Loaded, Lookup, QueryCache};
use crate::error::{Error, Result};
use crate::invalidation::Mutation;
use crate::registry::QueryRegistry;
use crate::result::QueryResult;
use crate::state::{TableView, ViewPatch};

/// What a grid consumer renders for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerView {
    pub view_id: ViewId,
    pub rows: Vec<Value>,
    pub total_row_count: u64,
    /// Fetching with nothing cached for the key.
    pub is_loading: bool,
    /// Fetching while cached rows are shown.
    pub is_refetching: bool,
    pub unauthenticated: bool,
    pub state: TableView,
}

impl ConsumerView {
    #[must_use]
    pub fn from_state(view_id: ViewId, state: TableView) -> Self {
        Self {
            view_id,
            rows: state.rows().to_vec(),
            total_row_count: state.total_row_count(),
            is_loading: state.is_loading,
            is_refetching: state.is_refetching,
            unauthenticated: state.unauthenticated,
            state,
        }
    }
}

struct Inner {
    registry: Arc<QueryRegistry>,
    cache: Arc<QueryCache>,
    transport: Arc<dyn Transport>,
    tenant: TenantId,
    tasks: DashMap<ViewId, (CanonicalKey, AbortHandle)>,
}

/// Query execution for every view of one tenant. Cheap to clone.
#[derive(Clone)]
pub struct QueryBinding {
    inner: Arc<Inner>,
}

impl QueryBinding {
    #[must_use]
    pub fn new(
        registry: Arc<QueryRegistry>,
        cache: Arc<QueryCache>,
        transport: Arc<dyn Transport>,
        tenant: TenantId,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                cache,
                transport,
                tenant,
                tasks: DashMap::new(),
            }),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<QueryRegistry> {
        &self.inner.registry
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    #[must_use]
    pub fn tenant(&self) -> &TenantId {
        &self.inner.tenant
    }

    /// Bring a view's data in line with its live state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`], a builder error, or the fetch error of
    /// the load. Loading flags are cleared before an error is returned.
    pub async fn sync(&self, view_id: &ViewId) -> Result<ConsumerView> {
        let registry = &self.inner.registry;
        let view = registry.snapshot(view_id)?;
        let request = registry.builder().build(view_id, &view)?;
        let key = request.key.clone();

        let forced = registry.acknowledge_refetch(view_id)?;
        if forced {
            debug!(view_id = %view_id, "Refetch requested, bypassing cache");
        } else {
            match self.inner.cache.lookup(&key).await {
                Lookup::Fresh(result) => {
                    registry.apply_result(view_id, &key, result)?;
                    self.settle_loading(view_id)?;
                    return self.view(view_id);
                }
                Lookup::Stale(result) => {
                    registry.apply_result(view_id, &key, result)?;
                    registry.patch_if_current(view_id, &key, ViewPatch::loading(false, true))?;
                    self.revalidate(request);
                    return self.view(view_id);
                }
                Lookup::Miss => {}
            }
        }

        let has_cached = self.inner.cache.contains(&key);
        registry.patch_if_current(view_id, &key, ViewPatch::loading(!has_cached, has_cached))?;
        let outcome = self.load(&request, forced).await;
        self.settle_loading(view_id)?;

        let loaded = outcome.inspect_err(|e| {
            warn!(view_id = %view_id, url = %key.url, error = %e, "Query failed");
        })?;
        if !self.inner.cache.is_current(&key, loaded.generation) {
            debug!(view_id = %view_id, start = key.start, "Dropping result of invalidated load");
            return self.view(view_id);
        }
        if registry.apply_result(view_id, &key, loaded.result)? {
            debug!(view_id = %view_id, start = key.start, "Applied query result");
        }
        self.view(view_id)
    }

    /// Run [`sync`](Self::sync) on a task. A still-running task of the same
    /// view for a different key is aborted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] or a builder error.
    pub fn spawn_sync(&self, view_id: &ViewId) -> Result<JoinHandle<Result<ConsumerView>>> {
        let key = self.inner.registry.live_key(view_id)?;
        let binding = self.clone();
        let id = view_id.clone();
        let handle = tokio::spawn(async move { binding.sync(&id).await });

        if let Some((previous_key, previous)) = self
            .inner
            .tasks
            .insert(view_id.clone(), (key.clone(), handle.abort_handle()))
        {
            if previous_key != key && !previous.is_finished() {
                debug!(view_id = %view_id, "Aborting sync for superseded key");
                previous.abort();
            }
        }
        Ok(handle)
    }

    /// Current consumer view without fetching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn view(&self, view_id: &ViewId) -> Result<ConsumerView> {
        let state = self.inner.registry.snapshot(view_id)?;
        Ok(ConsumerView::from_state(view_id.clone(), state))
    }

    /// Patch a view on behalf of its consumer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn dispatch_patch(&self, view_id: &ViewId, patch: ViewPatch) -> Result<()> {
        self.inner.registry.patch(view_id, patch)
    }

    /// Make the next sync of the view bypass the cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownView`] if the view was never initialized.
    pub fn request_refetch(&self, view_id: &ViewId) -> Result<()> {
        self.inner.registry.request_refetch(view_id)
    }

    /// Abort the view's pending sync and drop its state.
    pub fn dispose(&self, view_id: &ViewId) -> bool {
        if let Some((_, (_, task))) = self.inner.tasks.remove(view_id) {
            task.abort();
        }
        self.inner.registry.dispose(view_id)
    }

    /// Send a write, then invalidate the cached queries of its collection and
    /// flag the views showing it for refetch.
    ///
    /// # Errors
    ///
    /// Returns the transport error; nothing is invalidated in that case.
    pub async fn mutate(&self, mutation: Mutation) -> Result<Body> {
        let body = self
            .inner
            .transport
            .send(mutation.to_request(), &self.inner.tenant)
            .await?;

        let prefix = mutation.invalidation_prefix();
        self.inner.cache.invalidate_prefix(&prefix)?;
        let affected = self.inner.registry.views_under(&prefix);
        for view_id in &affected {
            self.inner.registry.request_refetch(view_id)?;
        }
        info!(
            prefix = %prefix,
            kind = ?mutation.kind,
            views = affected.len(),
            "Mutation applied, cached queries invalidated"
        );
        Ok(body)
    }

    /// React to session changes. On teardown every view becomes
    /// unauthenticated and the cache is emptied, which also retires every
    /// load still in flight. A new login lets views accept data again. The
    /// task ends when the session is dropped.
    pub fn watch_session(&self, session: &SessionContext) -> JoinHandle<()> {
        let mut state = session.subscribe();
        let binding = self.clone();
        tokio::spawn(async move {
            while state.changed().await.is_ok() {
                let current = state.borrow_and_update().clone();
                match current {
                    SessionState::Cleared => {
                        binding.inner.cache.invalidate_all();
                        binding.inner.registry.mark_all_unauthenticated();
                        info!("Session cleared, dropped all view data");
                    }
                    SessionState::Authenticated { .. } => {
                        binding.inner.registry.mark_all_authenticated();
                    }
                    SessionState::Empty => {}
                }
            }
        })
    }

    fn revalidate(&self, request: CanonicalRequest) {
        let binding = self.clone();
        tokio::spawn(async move {
            let registry = &binding.inner.registry;
            let CanonicalRequest { view_id, key, .. } = request.clone();
            debug!(view_id = %view_id, "Revalidating stale result");

            let outcome = binding.load(&request, false).await;
            binding
                .settle_loading(&view_id)
                .into_option_logged("clear revalidating");

            let Some(loaded) = outcome.into_option_logged("background revalidation") else {
                return;
            };
            if binding.inner.cache.is_current(&key, loaded.generation) {
                registry
                    .apply_result(&view_id, &key, loaded.result)
                    .into_option_logged("apply revalidated result");
            }
        });
    }

    /// Clear the loading flags unless a load for the view's live key is
    /// still running.
    fn settle_loading(&self, view_id: &ViewId) -> Result<()> {
        let registry = &self.inner.registry;
        let live = registry.live_key(view_id)?;
        if !self.inner.cache.is_loading(&live) {
            registry.patch_if_current(view_id, &live, ViewPatch::loading(false, false))?;
        }
        Ok(())
    }

    async fn load(&self, request: &CanonicalRequest, forced: bool) -> Result<Loaded> {
        let transport = Arc::clone(&self.inner.transport);
        let tenant = self.inner.tenant.clone();
        let target = request.target.clone();
        let loader = move || async move {
            transport
                .send(ApiRequest::get(target), &tenant)
                .await
                .map_err(Error::from)
                .and_then(QueryResult::from_body)
        };
        if forced {
            self.inner.cache.reload(request.key.clone(), loader).await
        } else {
            self.inner.cache.load(request.key.clone(), loader).await
        }
    }
}

impl fmt::Debug for QueryBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBinding")
            .field("tenant", &self.inner.tenant)
            .field("views", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}
