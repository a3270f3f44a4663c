// src/pipeline/revalidate.rs

//! Single-flight background refreshes keyed by cache key.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

type InFlight = Arc<Mutex<HashSet<String>>>;

/// Tracks which keys have a refresh running and starts at most one per key.
#[derive(Debug, Clone, Default)]
pub struct Revalidator {
    in_flight: InFlight,
}

impl Revalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `refresh` for `key` unless one is already running.
    ///
    /// Returns the task handle when a refresh was started and `None` when
    /// the key was already in flight. The marker is cleared when the task
    /// ends, whether it completes, panics or is dropped by the runtime.
    pub fn ensure_single_in_flight<F>(
        &self,
        key: impl Into<String>,
        refresh: F,
    ) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let guard = self.try_mark(&key)?;
        log::debug!("Revalidation started for '{}'", key);

        Some(tokio::spawn(async move {
            let _guard = guard;
            refresh.await;
        }))
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        lock(&self.in_flight).contains(key)
    }

    pub fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }

    fn try_mark(&self, key: &str) -> Option<InFlightGuard> {
        if !lock(&self.in_flight).insert(key.to_string()) {
            log::debug!("Revalidation already in flight for '{}'", key);
            return None;
        }
        Some(InFlightGuard {
            key: key.to_string(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }
}

/// Removes its key from the in-flight set when dropped.
struct InFlightGuard {
    key: String,
    in_flight: InFlight,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.key);
        log::debug!("Revalidation finished for '{}'", self.key);
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashSet<String>> {
    // Runs inside Drop during unwinding, so poisoning must not panic again.
    in_flight.lock().unwrap_or_else(|e| e.into_inner())
}
