//! Storage for aggregated results.
//!
//! Everything lives in process memory and is rebuilt from the upstream
//! providers after a restart.

pub mod cache;

pub use cache::{CacheHit, CachePolicy, CacheStats, CacheStore};
