//! Provider adapters for the aggregator.
//!
//! This module contains one adapter per upstream source:
//! - Structured search (`JSearchProvider`)
//! - Professional network (`LinkedInProvider`)
//! - Open bulk feed (`RemotiveProvider`)
//!
//! [`build_providers`] returns them in fixed priority order. The last one is
//! the always-available fallback.

mod jsearch;
mod linkedin;
pub mod provider;
mod remotive;

use std::sync::Arc;

pub use jsearch::JSearchProvider;
pub use linkedin::LinkedInProvider;
pub use provider::{FetchStatus, JobProvider, ProviderResult};
pub use remotive::RemotiveProvider;

use crate::models::Config;
use crate::utils::{Clock, HttpFetch};

/// Build every configured provider in priority order.
///
/// Providers without credentials are still returned; they report
/// themselves unavailable and are skipped at query time.
pub fn build_providers(
    config: &Config,
    http: Arc<dyn HttpFetch>,
    clock: Arc<dyn Clock>,
) -> Vec<Arc<dyn JobProvider>> {
    let providers = &config.providers;
    let jsearch: Arc<dyn JobProvider> = Arc::new(JSearchProvider::new(
        Arc::clone(&http),
        providers.jsearch.clone(),
    ));
    let linkedin: Arc<dyn JobProvider> = Arc::new(LinkedInProvider::new(
        Arc::clone(&http),
        providers.linkedin.clone(),
    ));
    let remotive: Arc<dyn JobProvider> = Arc::new(RemotiveProvider::new(
        http,
        providers.remotive.clone(),
        clock,
    ));
    vec![jsearch, linkedin, remotive]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::testing::ScriptedHttp;
    use crate::utils::ManualClock;

    #[test]
    fn test_priority_order_and_availability() {
        let mut config = Config::default();
        config.providers.linkedin.api_key = Some("key".into());

        let providers = build_providers(
            &config,
            Arc::new(ScriptedHttp::default()),
            Arc::new(ManualClock::default()),
        );
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["jsearch", "linkedin", "remotive"]);

        let available: Vec<_> = providers.iter().map(|p| p.is_available()).collect();
        assert_eq!(available, vec![false, true, true]);
    }
}
