//! Single-flight execution keyed by an arbitrary key.
//!
//! [`Coordinator::run_exclusive`] guarantees that at most one operation per
//! key is in progress. Callers arriving while an operation is outstanding
//! await the same shared future and observe the same result. The entry is
//! removed inside the shared future as soon as the operation settles, before
//! any waiter resumes, so a later call starts a fresh attempt.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

type Flight<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;
type FlightMap<K, T, E> = HashMap<K, (u64, Flight<T, E>)>;

/// Keyed single-flight coordinator.
pub struct Coordinator<K, T, E> {
    flights: Arc<Mutex<FlightMap<K, T, E>>>,
    next_generation: AtomicU64,
}

impl<K, T, E> Coordinator<K, T, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Run `operation` unless one is already in flight for `key`, in which
    /// case wait for that one instead. `operation` is only invoked when this
    /// caller starts the flight.
    ///
    /// # Errors
    ///
    /// Returns the error of the shared operation to every waiter.
    pub async fn run_exclusive<F, Fut>(&self, key: K, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let flight = {
            let mut flights = self.flights.lock();
            if let Some((_, flight)) = flights.get(&key) {
                debug!("Attaching to in-flight operation");
                flight.clone()
            } else {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let registry = Arc::clone(&self.flights);
                let settle_key = key.clone();
                let pending = operation();
                let flight = async move {
                    let outcome = pending.await;
                    let mut flights = registry.lock();
                    if flights
                        .get(&settle_key)
                        .is_some_and(|(current, _)| *current == generation)
                    {
                        flights.remove(&settle_key);
                    }
                    outcome
                }
                .boxed()
                .shared();
                flights.insert(key, (generation, flight.clone()));
                flight
            }
        };
        flight.await
    }

    /// Whether an operation is outstanding for `key`.
    #[must_use]
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.flights.lock().contains_key(key)
    }

    /// Number of outstanding operations.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }
}

impl<K, T, E> Default for Coordinator<K, T, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T, E> fmt::Debug for Coordinator<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("in_flight", &self.flights.lock().len())
            .finish()
    }
}
