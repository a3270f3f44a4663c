// src/config.rs

//! Configuration loading utilities.
//!
//! File settings are loaded first, then API keys from the environment are
//! applied on top so secrets can stay out of `config.toml`.

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

/// Shared RapidAPI key, used by both RapidAPI providers.
pub const RAPIDAPI_KEY: &str = "RAPIDAPI_KEY";
/// Key for the structured-search provider only; wins over `RAPIDAPI_KEY`.
pub const JSEARCH_API_KEY: &str = "JSEARCH_API_KEY";
/// Key for the professional-network provider only; wins over `RAPIDAPI_KEY`.
pub const LINKEDIN_API_KEY: &str = "LINKEDIN_API_KEY";

/// Apply API keys found through `lookup` on top of `config`.
///
/// Empty values are ignored. Returns the names of the variables applied.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<&'static str> {
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let mut applied = Vec::new();

    if let Some(key) = get(RAPIDAPI_KEY) {
        config.providers.jsearch.api_key = Some(key.clone());
        config.providers.linkedin.api_key = Some(key);
        applied.push(RAPIDAPI_KEY);
    }
    if let Some(key) = get(JSEARCH_API_KEY) {
        config.providers.jsearch.api_key = Some(key);
        applied.push(JSEARCH_API_KEY);
    }
    if let Some(key) = get(LINKEDIN_API_KEY) {
        config.providers.linkedin.api_key = Some(key);
        applied.push(LINKEDIN_API_KEY);
    }
    applied
}

/// Load configuration from a TOML file, apply environment overrides and
/// validate the result.
///
/// A missing or unreadable file falls back to defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut config = Config::load_or_default(path);
    for name in apply_env_overrides(&mut config, lookup) {
        log::debug!("Applied {} from environment", name);
    }
    config.validate()?;
    Ok(config)
}
