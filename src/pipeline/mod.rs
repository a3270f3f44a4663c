//! Aggregation pipeline.
//!
//! - `Aggregator`: cache-first entry point over the provider chain
//! - `dedupe`: collapse postings reported by several providers
//! - `Revalidator`: at most one background refresh per cache key

pub mod aggregate;
pub mod dedupe;
pub mod revalidate;

pub use aggregate::Aggregator;
pub use dedupe::{dedup_key, dedupe};
pub use revalidate::Revalidator;
