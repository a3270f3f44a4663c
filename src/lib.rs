// src/lib.rs

//! Job listings aggregator library.
//!
//! Queries several upstream job providers, merges and deduplicates their
//! answers and serves them from a stale-while-revalidate cache.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
pub use models::{ListingsPage, NormalizedListing, Query};
pub use pipeline::Aggregator;
