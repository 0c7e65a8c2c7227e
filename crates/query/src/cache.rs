//! Stale-while-revalidate cache for list results.
//!
//! Uses moka for async-aware caching with capacity eviction and a time to
//! live. Entries younger than `stale_after` are fresh; older entries are
//! still served but flagged stale so the caller revalidates. Concurrent
//! loads of one key share a single flight.
//!
//! Each key has a load generation. Invalidating a key retires its
//! generation: flights started before the invalidation no longer write to
//! the cache, and later loads start a new flight instead of joining them.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use gridwire_fetch::Coordinator;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::CanonicalKey;
use crate::error::{Error, Result};
use crate::result::QueryResult;

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Age at which entries are dropped entirely
    #[serde(with = "duration_secs", default = "default_time_to_live")]
    pub time_to_live: Duration,
    /// Age after which entries are served stale and revalidated
    #[serde(with = "duration_secs", default = "default_stale_after")]
    pub stale_after: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            time_to_live: default_time_to_live(),
            stale_after: default_stale_after(),
        }
    }
}

impl CacheConfig {
    /// Set the freshness window.
    #[must_use]
    pub const fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Set the maximum number of entries.
    #[must_use]
    pub const fn max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

const fn default_max_capacity() -> u64 {
    1000
}

const fn default_time_to_live() -> Duration {
    Duration::from_secs(300) // 5 minutes
}

const fn default_stale_after() -> Duration {
    Duration::from_secs(30)
}

/// A cached result and when it was fetched.
#[derive(Debug, Clone)]
pub struct CachedResult {
    pub result: Arc<QueryResult>,
    pub fetched_at: Instant,
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Young enough to serve without I/O.
    Fresh(Arc<QueryResult>),
    /// Serve, then revalidate.
    Stale(Arc<QueryResult>),
    Miss,
}

/// A loaded result and the generation of the flight that produced it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub result: Arc<QueryResult>,
    pub generation: u64,
}

type FlightKey = (CanonicalKey, u64);

/// Result cache keyed by canonical key.
#[derive(Debug)]
pub struct QueryCache {
    entries: Cache<CanonicalKey, CachedResult>,
    loads: Arc<Coordinator<FlightKey, Arc<QueryResult>, Error>>,
    generations: Arc<DashMap<CanonicalKey, u64>>,
    next_generation: AtomicU64,
    stale_after: Duration,
}

impl QueryCache {
    /// Create a new cache with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create a new cache with custom configuration
    #[must_use]
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.time_to_live)
                .support_invalidation_closures()
                .build(),
            loads: Arc::new(Coordinator::new()),
            generations: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(0),
            stale_after: config.stale_after,
        }
    }

    /// Look up `key` and classify its freshness.
    pub async fn lookup(&self, key: &CanonicalKey) -> Lookup {
        match self.entries.get(key).await {
            Some(cached) if cached.fetched_at.elapsed() < self.stale_after => {
                Lookup::Fresh(cached.result)
            }
            Some(cached) => Lookup::Stale(cached.result),
            None => Lookup::Miss,
        }
    }

    /// Whether any value (fresh or stale) is cached for `key`.
    #[must_use]
    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a result fetched now.
    pub async fn insert(&self, key: CanonicalKey, result: Arc<QueryResult>) {
        self.entries
            .insert(
                key,
                CachedResult {
                    result,
                    fetched_at: Instant::now(),
                },
            )
            .await;
    }

    /// Run `loader` for `key` and cache its result, unless a load for the
    /// same key and generation is already in flight, in which case its
    /// result is shared.
    ///
    /// The load runs on its own task, so it completes and populates the
    /// cache even if every caller is cancelled. A load whose generation was
    /// retired while it ran returns its result but does not cache it.
    ///
    /// # Errors
    ///
    /// Returns the loader's error to every caller sharing the flight, or
    /// [`Error::TaskFailed`] if the load task panicked.
    pub async fn load<F, Fut>(&self, key: CanonicalKey, loader: F) -> Result<Loaded>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<QueryResult>> + Send + 'static,
    {
        let generation = self.current_generation(&key);
        let loads = Arc::clone(&self.loads);
        let entries = self.entries.clone();
        let generations = Arc::clone(&self.generations);

        let task = tokio::spawn(async move {
            let flight_key = (key.clone(), generation);
            loads
                .run_exclusive(flight_key, move || async move {
                    debug!(url = %key.url, start = key.start, generation, "Loading query");
                    let result = Arc::new(loader().await?);
                    if is_live(&generations, &key, generation) {
                        entries
                            .insert(
                                key.clone(),
                                CachedResult {
                                    result: Arc::clone(&result),
                                    fetched_at: Instant::now(),
                                },
                            )
                            .await;
                        // An invalidation may have landed during the insert.
                        if !is_live(&generations, &key, generation) {
                            entries.invalidate(&key).await;
                        }
                    } else {
                        debug!(url = %key.url, start = key.start, "Not caching retired load");
                    }
                    Ok::<_, Error>(result)
                })
                .await
        });

        let result = task.await.map_err(|e| Error::task_failed(e.to_string()))??;
        Ok(Loaded { result, generation })
    }

    /// Like [`load`](Self::load), but never joins a flight that started
    /// before this call.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn reload<F, Fut>(&self, key: CanonicalKey, loader: F) -> Result<Loaded>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<QueryResult>> + Send + 'static,
    {
        self.generations.remove(&key);
        self.load(key, loader).await
    }

    /// Whether results loaded under `generation` may still be shown for `key`.
    #[must_use]
    pub fn is_current(&self, key: &CanonicalKey, generation: u64) -> bool {
        is_live(&self.generations, key, generation)
    }

    /// Whether a load for `key` is in flight.
    #[must_use]
    pub fn is_loading(&self, key: &CanonicalKey) -> bool {
        self.generations
            .get(key)
            .map(|generation| *generation)
            .is_some_and(|generation| self.loads.is_in_flight(&(key.clone(), generation)))
    }

    /// Invalidate a cache entry
    pub async fn invalidate(&self, key: &CanonicalKey) {
        self.generations.remove(key);
        self.entries.invalidate(key).await;
    }

    /// Invalidate every entry whose endpoint lies under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if the cache rejects the predicate.
    pub fn invalidate_prefix(&self, prefix: &str) -> Result<()> {
        let prefix = prefix.to_string();
        debug!(prefix = %prefix, "Invalidating cached queries");
        self.generations.retain(|key, _| !key.is_under(&prefix));
        self.entries
            .invalidate_entries_if(move |key, _| key.is_under(&prefix))
            .map(|_| ())
            .map_err(|e| Error::invalid_query(e.to_string()))
    }

    /// Invalidate all cache entries
    pub fn invalidate_all(&self) {
        self.generations.clear();
        self.entries.invalidate_all();
    }

    /// Get the current number of cached entries
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Run pending maintenance tasks (cleanup, eviction)
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }
}

impl QueryCache {
    fn current_generation(&self, key: &CanonicalKey) -> u64 {
        *self
            .generations
            .entry(key.clone())
            .or_insert_with(|| self.next_generation.fetch_add(1, Ordering::Relaxed))
    }
}

fn is_live(generations: &DashMap<CanonicalKey, u64>, key: &CanonicalKey, generation: u64) -> bool {
    generations.get(key).is_some_and(|current| *current == generation)
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialization helper for Duration as seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
