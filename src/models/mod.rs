// src/models/mod.rs

//! Domain models for the aggregator.

mod config;
mod country;
mod listing;
mod query;

pub use config::{
    CacheConfig, Config, HttpConfig, JSearchConfig, LinkedInConfig, ProvidersConfig,
    RemotiveConfig, SearchConfig,
};
pub use country::{Country, is_worldwide_location};
pub use listing::{NormalizedListing, SalaryRange};
pub use query::Query;

use serde::{Deserialize, Serialize};

/// Merged, deduplicated result set stored in the query cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedListings {
    pub listings: Vec<NormalizedListing>,
    /// Label of the highest-priority provider that contributed results
    pub source: String,
}

/// One page of results returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsPage {
    pub listings: Vec<NormalizedListing>,
    pub source: String,
    /// True when served from a stale cache entry
    pub is_stale: bool,
    pub page: usize,
    pub page_size: usize,
    /// Size of the full deduplicated result set
    pub total: usize,
    pub has_more: bool,
}

impl ListingsPage {
    /// Slice `page` (1-based) out of an aggregated result set.
    pub fn from_results(
        results: &AggregatedListings,
        page: usize,
        page_size: usize,
        is_stale: bool,
    ) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = results.listings.len();
        let start = (page - 1).saturating_mul(page_size).min(total);
        let end = start.saturating_add(page_size).min(total);

        Self {
            listings: results.listings[start..end].to_vec(),
            source: results.source.clone(),
            is_stale,
            page,
            page_size,
            total,
            has_more: end < total,
        }
    }

    /// True when the underlying result set had no listings at all.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
