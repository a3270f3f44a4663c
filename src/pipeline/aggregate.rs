// src/pipeline/aggregate.rs

//! Stale-while-revalidate aggregation over the provider chain.
//!
//! ```text
//! get_listings(query)
//!   ├─ fresh hit ──────────────▶ page
//!   ├─ stale hit ──┬───────────▶ page (is_stale)
//!   │              └─ spawn refresh (one per key)
//!   └─ miss ─▶ join_all(providers) ─▶ concat ─▶ dedupe ─▶ cache ─▶ page
//! ```

use std::sync::Arc;

use futures::future::join_all;

use crate::error::{AppError, Result};
use crate::models::{AggregatedListings, Config, ListingsPage, Query};
use crate::pipeline::dedupe::dedupe;
use crate::pipeline::revalidate::Revalidator;
use crate::services::{JobProvider, build_providers};
use crate::storage::{CachePolicy, CacheStats, CacheStore};
use crate::utils::{Clock, HttpFetch};

/// Long-lived aggregation handle. Clones share the cache and in-flight set.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

struct Inner {
    /// Priority order; the last entry is the fallback feed
    providers: Vec<Arc<dyn JobProvider>>,
    cache: CacheStore<AggregatedListings>,
    revalidator: Revalidator,
    page_size: usize,
}

impl Aggregator {
    /// Create an aggregator over `providers`, highest priority first.
    pub fn new(
        providers: Vec<Arc<dyn JobProvider>>,
        policy: CachePolicy,
        page_size: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if providers.is_empty() {
            return Err(AppError::config("at least one provider is required"));
        }
        Ok(Self {
            inner: Arc::new(Inner {
                providers,
                cache: CacheStore::new(policy, clock),
                revalidator: Revalidator::new(),
                page_size: page_size.max(1),
            }),
        })
    }

    /// Build the standard provider chain from configuration.
    pub fn from_config(
        config: &Config,
        http: Arc<dyn HttpFetch>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let providers = build_providers(config, http, Arc::clone(&clock));
        Self::new(
            providers,
            CachePolicy::from(&config.cache),
            config.search.page_size,
            clock,
        )
    }

    /// Return one page of listings for `query`.
    ///
    /// Fresh cache hits make no upstream calls. Stale hits are returned at
    /// once and refreshed in the background. Misses query every available
    /// provider concurrently.
    pub async fn get_listings(&self, query: &Query) -> Result<ListingsPage> {
        let key = query.cache_key();

        if let Some(hit) = self.inner.cache.get(&key) {
            log::debug!(
                "Cache hit for '{}' ({}s old, stale: {})",
                key,
                hit.age.as_secs(),
                hit.is_stale
            );
            if hit.is_stale {
                self.revalidate(key, query.clone());
            }
            return Ok(self.page(&hit.payload, query, hit.is_stale));
        }

        log::debug!("Cache miss for '{}'", key);
        let results = self.inner.aggregate(query).await?;
        if results.listings.is_empty() {
            log::info!("No listings for {}; not caching", query);
        } else {
            self.inner.cache.set(key, results.clone());
        }
        Ok(self.page(&results, query, false))
    }

    /// Entry counts of the query cache by freshness tier.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Number of background refreshes currently running.
    pub fn revalidations_in_flight(&self) -> usize {
        self.inner.revalidator.in_flight_count()
    }

    /// Providers in priority order.
    pub fn providers(&self) -> &[Arc<dyn JobProvider>] {
        &self.inner.providers
    }

    fn page(&self, results: &AggregatedListings, query: &Query, is_stale: bool) -> ListingsPage {
        ListingsPage::from_results(results, query.page(), self.inner.page_size, is_stale)
    }

    /// Start a background refresh for `key` unless one is running. A failed
    /// or empty refresh leaves the stale entry in place.
    fn revalidate(&self, key: String, query: Query) {
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let started = self.inner.revalidator.ensure_single_in_flight(
            key.clone(),
            async move {
                match inner.aggregate(&query).await {
                    Ok(results) if !results.listings.is_empty() => {
                        log::info!(
                            "Revalidated '{}' with {} listings from {}",
                            task_key,
                            results.listings.len(),
                            results.source
                        );
                        inner.cache.set(task_key, results);
                    }
                    Ok(_) => log::warn!(
                        "Revalidation of '{}' found nothing; keeping stale entry",
                        task_key
                    ),
                    Err(e) => log::warn!(
                        "Revalidation of '{}' failed: {}; keeping stale entry",
                        task_key,
                        e
                    ),
                }
            },
        );
        if started.is_some() {
            log::info!("Serving stale '{}' while refreshing in the background", key);
        }
    }
}

impl Inner {
    fn fallback_name(&self) -> &str {
        self.providers
            .last()
            .map(|provider| provider.name())
            .unwrap_or_default()
    }

    /// Query every available provider and merge the answers in priority order.
    async fn aggregate(&self, query: &Query) -> Result<AggregatedListings> {
        let active: Vec<&Arc<dyn JobProvider>> = self
            .providers
            .iter()
            .filter(|provider| provider.is_available())
            .collect();
        if active.is_empty() {
            log::warn!("No providers available for {}", query);
            return Err(AppError::Unavailable);
        }
        if active.len() == 1 && self.providers.len() > 1 {
            log::info!(
                "Primary providers unavailable; querying only '{}'",
                active[0].name()
            );
        }

        let results = join_all(active.iter().map(|provider| provider.fetch(query))).await;

        let mut listings = Vec::new();
        let mut source = None;
        let mut answered = false;
        for (provider, result) in active.iter().zip(results) {
            if result.status.is_failure() {
                log::warn!(
                    "[{}] contributed nothing for {}: {}",
                    provider.name(),
                    query,
                    result.status
                );
            }
            answered |= result.answered();
            if source.is_none() && !result.listings.is_empty() {
                source = Some(provider.name().to_string());
            }
            listings.extend(result.listings);
        }

        if !answered {
            log::warn!("Every provider failed for {}", query);
            return Err(AppError::Unavailable);
        }

        let before = listings.len();
        let listings = dedupe(listings);
        let source = source.unwrap_or_else(|| self.fallback_name().to_string());
        log::info!(
            "Aggregated {} listings ({} duplicates) for {} from {}",
            listings.len(),
            before - listings.len(),
            query,
            source
        );
        Ok(AggregatedListings { listings, source })
    }
}
