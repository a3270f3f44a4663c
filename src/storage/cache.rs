//! In-memory two-tier TTL cache.
//!
//! ```text
//!  age:  0 ───────── fresh_ttl ───────── stale_ttl ─────────▶
//!        │   fresh    │       stale        │     absent
//! ```
//!
//! Expired entries are dropped lazily when read and swept in bulk once the
//! store grows past `max_entries`. There is no background timer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::CacheConfig;
use crate::utils::clock::{Clock, elapsed};

/// A stored value with its write time.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    written_at: DateTime<Utc>,
}

/// A successful cache read.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit<V> {
    pub payload: V,
    /// True when older than the fresh TTL but within the stale TTL
    pub is_stale: bool,
    pub age: Duration,
}

/// Entry counts by freshness tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub stale: usize,
    /// Past the stale TTL but not yet purged
    pub expired: usize,
}

/// TTL tiers and size bound for a [`CacheStore`].
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub fresh_ttl: Duration,
    pub stale_ttl: Duration,
    pub max_entries: usize,
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            fresh_ttl: config.fresh_ttl(),
            stale_ttl: config.stale_ttl(),
            max_entries: config.max_entries,
        }
    }
}

enum Tier {
    Fresh,
    Stale,
    Expired,
}

/// Thread-safe keyed store with fresh/stale tiers.
///
/// The map lock is only held for map operations, never across an await.
pub struct CacheStore<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    pub fn new(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policy,
            clock,
        }
    }

    /// Read an entry. Expired entries are purged and reported as absent.
    pub fn get(&self, key: &str) -> Option<CacheHit<V>> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let age = elapsed(entries.get(key)?.written_at, now);

        match self.tier(age) {
            Tier::Expired => {
                entries.remove(key);
                log::debug!("Cache entry '{}' expired after {}s", key, age.as_secs());
                None
            }
            tier => entries.get(key).map(|entry| CacheHit {
                payload: entry.payload.clone(),
                is_stale: matches!(tier, Tier::Stale),
                age,
            }),
        }
    }

    /// Replace the whole entry for `key`, sweeping expired entries when the
    /// store has grown past its bound.
    pub fn set(&self, key: impl Into<String>, payload: V) {
        let now = self.clock.now();
        let mut entries = self.lock();
        entries.insert(
            key.into(),
            CacheEntry {
                payload,
                written_at: now,
            },
        );
        if entries.len() > self.policy.max_entries {
            let swept = Self::sweep(&mut entries, self.policy.stale_ttl, now);
            log::debug!(
                "Cache over {} entries, swept {} expired ({} remain)",
                self.policy.max_entries,
                swept,
                entries.len()
            );
        }
    }

    /// Drop every entry older than the stale TTL. Returns how many were removed.
    pub fn evict(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        Self::sweep(&mut entries, self.policy.stale_ttl, now)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.lock();
        let mut stats = CacheStats {
            total: entries.len(),
            ..CacheStats::default()
        };
        for entry in entries.values() {
            match self.tier(elapsed(entry.written_at, now)) {
                Tier::Fresh => stats.fresh += 1,
                Tier::Stale => stats.stale += 1,
                Tier::Expired => stats.expired += 1,
            }
        }
        stats
    }

    fn tier(&self, age: Duration) -> Tier {
        if age < self.policy.fresh_ttl {
            Tier::Fresh
        } else if age < self.policy.stale_ttl {
            Tier::Stale
        } else {
            Tier::Expired
        }
    }

    fn sweep(
        entries: &mut HashMap<String, CacheEntry<V>>,
        stale_ttl: Duration,
        now: DateTime<Utc>,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| elapsed(entry.written_at, now) < stale_ttl);
        before - entries.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // Entries are whole-value replacements, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
