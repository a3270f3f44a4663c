//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Country;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client settings shared by all providers
    #[serde(default)]
    pub http: HttpConfig,

    /// Query result cache tiers
    #[serde(default)]
    pub cache: CacheConfig,

    /// Result paging
    #[serde(default)]
    pub search: SearchConfig,

    /// Upstream provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.cache.fresh_ttl_secs == 0 {
            return Err(AppError::validation("cache.fresh_ttl_secs must be > 0"));
        }
        if self.cache.stale_ttl_secs <= self.cache.fresh_ttl_secs {
            return Err(AppError::validation(
                "cache.stale_ttl_secs must be greater than cache.fresh_ttl_secs",
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(AppError::validation("cache.max_entries must be > 0"));
        }
        if self.search.page_size == 0 {
            return Err(AppError::validation("search.page_size must be > 0"));
        }

        let jsearch = &self.providers.jsearch;
        if jsearch.timeout_secs == 0 {
            return Err(AppError::validation(
                "providers.jsearch.timeout_secs must be > 0",
            ));
        }
        if Country::from_code(&jsearch.default_country).is_none() {
            return Err(AppError::validation(format!(
                "providers.jsearch.default_country '{}' is not a supported country",
                jsearch.default_country
            )));
        }

        let linkedin = &self.providers.linkedin;
        if linkedin.timeout_secs == 0 {
            return Err(AppError::validation(
                "providers.linkedin.timeout_secs must be > 0",
            ));
        }
        if linkedin.limit == 0 {
            return Err(AppError::validation("providers.linkedin.limit must be > 0"));
        }

        let remotive = &self.providers.remotive;
        if remotive.timeout_secs == 0 {
            return Err(AppError::validation(
                "providers.remotive.timeout_secs must be > 0",
            ));
        }
        if remotive.feed_stale_ttl_secs <= remotive.feed_fresh_ttl_secs {
            return Err(AppError::validation(
                "providers.remotive.feed_stale_ttl_secs must be greater than feed_fresh_ttl_secs",
            ));
        }
        if remotive.max_results == 0 {
            return Err(AppError::validation(
                "providers.remotive.max_results must be > 0",
            ));
        }

        for (name, base_url) in [
            ("jsearch", &jsearch.base_url),
            ("linkedin", &linkedin.base_url),
            ("remotive", &remotive.base_url),
        ] {
            url::Url::parse(base_url).map_err(|e| {
                AppError::validation(format!("providers.{name}.base_url is invalid: {e}"))
            })?;
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Client-wide request timeout in seconds; provider timeouts are tighter
    #[serde(default = "defaults::http_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::http_timeout(),
        }
    }
}

/// Two-tier cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entries younger than this are served as fresh
    #[serde(default = "defaults::fresh_ttl")]
    pub fresh_ttl_secs: u64,

    /// Entries younger than this are served as stale; older ones are gone
    #[serde(default = "defaults::stale_ttl")]
    pub stale_ttl_secs: u64,

    /// Entry count above which expired entries are swept
    #[serde(default = "defaults::max_entries")]
    pub max_entries: usize,
}

impl CacheConfig {
    pub fn fresh_ttl(&self) -> Duration {
        Duration::from_secs(self.fresh_ttl_secs)
    }

    pub fn stale_ttl(&self) -> Duration {
        Duration::from_secs(self.stale_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fresh_ttl_secs: defaults::fresh_ttl(),
            stale_ttl_secs: defaults::stale_ttl(),
            max_entries: defaults::max_entries(),
        }
    }
}

/// Result paging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Listings per page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
        }
    }
}

/// Per-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub jsearch: JSearchConfig,

    #[serde(default)]
    pub linkedin: LinkedInConfig,

    #[serde(default)]
    pub remotive: RemotiveConfig,
}

/// Primary structured-search provider (JSearch on RapidAPI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JSearchConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// RapidAPI key; the provider is unavailable without one
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "defaults::jsearch_base_url")]
    pub base_url: String,

    /// Value of the `X-RapidAPI-Host` header
    #[serde(default = "defaults::jsearch_host")]
    pub host: String,

    #[serde(default = "defaults::provider_timeout")]
    pub timeout_secs: u64,

    /// Region the provider searches when no country is given
    #[serde(default = "defaults::jsearch_default_country")]
    pub default_country: String,
}

impl Default for JSearchConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            api_key: None,
            base_url: defaults::jsearch_base_url(),
            host: defaults::jsearch_host(),
            timeout_secs: defaults::provider_timeout(),
            default_country: defaults::jsearch_default_country(),
        }
    }
}

/// Secondary professional-network provider (LinkedIn Job Search on RapidAPI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "defaults::linkedin_base_url")]
    pub base_url: String,

    #[serde(default = "defaults::linkedin_host")]
    pub host: String,

    #[serde(default = "defaults::provider_timeout")]
    pub timeout_secs: u64,

    /// Maximum listings requested per call
    #[serde(default = "defaults::linkedin_limit")]
    pub limit: usize,
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            api_key: None,
            base_url: defaults::linkedin_base_url(),
            host: defaults::linkedin_host(),
            timeout_secs: defaults::provider_timeout(),
            limit: defaults::linkedin_limit(),
        }
    }
}

/// Open bulk-feed provider (Remotive). Needs no credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotiveConfig {
    #[serde(default = "defaults::remotive_base_url")]
    pub base_url: String,

    #[serde(default = "defaults::feed_timeout")]
    pub timeout_secs: u64,

    /// Raw feed is refetched once older than this
    #[serde(default = "defaults::feed_fresh_ttl")]
    pub feed_fresh_ttl_secs: u64,

    /// Raw feed may still be used when a refetch fails until this age
    #[serde(default = "defaults::feed_stale_ttl")]
    pub feed_stale_ttl_secs: u64,

    /// Maximum listings returned per query after ranking
    #[serde(default = "defaults::feed_max_results")]
    pub max_results: usize,
}

impl Default for RemotiveConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::remotive_base_url(),
            timeout_secs: defaults::feed_timeout(),
            feed_fresh_ttl_secs: defaults::feed_fresh_ttl(),
            feed_stale_ttl_secs: defaults::feed_stale_ttl(),
            max_results: defaults::feed_max_results(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; job-aggregator/0.1)".into()
    }
    pub fn http_timeout() -> u64 {
        30
    }

    // Cache defaults
    pub fn fresh_ttl() -> u64 {
        60 * 60
    }
    pub fn stale_ttl() -> u64 {
        2 * 60 * 60
    }
    pub fn max_entries() -> usize {
        500
    }
    pub fn page_size() -> usize {
        10
    }

    // Provider defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn provider_timeout() -> u64 {
        8
    }
    pub fn jsearch_base_url() -> String {
        "https://jsearch.p.rapidapi.com".into()
    }
    pub fn jsearch_host() -> String {
        "jsearch.p.rapidapi.com".into()
    }
    pub fn jsearch_default_country() -> String {
        "us".into()
    }
    pub fn linkedin_base_url() -> String {
        "https://linkedin-job-search-api.p.rapidapi.com".into()
    }
    pub fn linkedin_host() -> String {
        "linkedin-job-search-api.p.rapidapi.com".into()
    }
    pub fn linkedin_limit() -> usize {
        50
    }
    pub fn remotive_base_url() -> String {
        "https://remotive.com".into()
    }
    pub fn feed_timeout() -> u64 {
        6
    }
    pub fn feed_fresh_ttl() -> u64 {
        30 * 60
    }
    pub fn feed_stale_ttl() -> u64 {
        6 * 60 * 60
    }
    pub fn feed_max_results() -> usize {
        50
    }
}
