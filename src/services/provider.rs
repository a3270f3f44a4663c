// src/services/provider.rs

//! Provider adapter contract and the request plumbing the adapters share.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::models::{NormalizedListing, Query};
use crate::utils::HttpFetch;

/// Outcome of one provider call, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The provider answered; the listing list may still be empty
    Ok,
    /// 401, 403 or 429: stop calling this provider for the request
    RateLimited(u16),
    /// The call did not finish within the provider's timeout
    Timeout,
    /// The body was not JSON or not the expected shape
    Malformed,
    /// Transport error or another non-success status
    Failed,
    /// Not configured or disabled; never called
    Unavailable,
}

impl FetchStatus {
    pub fn is_failure(&self) -> bool {
        !matches!(self, FetchStatus::Ok)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Ok => write!(f, "ok"),
            FetchStatus::RateLimited(code) => write!(f, "rate limited or unauthorized ({code})"),
            FetchStatus::Timeout => write!(f, "timed out"),
            FetchStatus::Malformed => write!(f, "malformed response"),
            FetchStatus::Failed => write!(f, "request failed"),
            FetchStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Listings returned by a provider plus how the call went.
///
/// Ordinary failures never become errors: they yield an empty list and a
/// failure status so one bad provider cannot abort an aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResult {
    pub listings: Vec<NormalizedListing>,
    pub status: FetchStatus,
}

impl ProviderResult {
    pub fn ok(listings: Vec<NormalizedListing>) -> Self {
        Self {
            listings,
            status: FetchStatus::Ok,
        }
    }

    pub fn failed(status: FetchStatus) -> Self {
        Self {
            listings: Vec::new(),
            status,
        }
    }

    /// Whether the provider produced a usable answer, even an empty one.
    pub fn answered(&self) -> bool {
        !self.status.is_failure() || !self.listings.is_empty()
    }
}

/// An upstream job source.
#[async_trait]
pub trait JobProvider: Send + Sync {
    /// Label reported as `source` and attached to listings.
    fn name(&self) -> &str;

    /// Whether the provider can be called at all (credentials, enabled flag).
    fn is_available(&self) -> bool {
        true
    }

    /// Search the provider. Never fails; see [`ProviderResult`].
    async fn fetch(&self, query: &Query) -> ProviderResult;
}

/// Map statuses that must stop further attempts against a provider.
pub fn classify_status(status: u16) -> Option<FetchStatus> {
    match status {
        200..=299 => None,
        401 | 403 | 429 => Some(FetchStatus::RateLimited(status)),
        _ => Some(FetchStatus::Failed),
    }
}

/// Perform one bounded GET and decode the JSON body.
///
/// Every failure is logged here and reduced to a [`FetchStatus`].
pub async fn get_json<T: DeserializeOwned>(
    http: &dyn HttpFetch,
    provider: &str,
    url: &Url,
    headers: &[(&str, &str)],
    timeout: Duration,
) -> Result<T, FetchStatus> {
    let response = match tokio::time::timeout(timeout, http.get(url, headers)).await {
        Err(_) => {
            log::warn!(
                "[{}] request timed out after {}ms",
                provider,
                timeout.as_millis()
            );
            return Err(FetchStatus::Timeout);
        }
        Ok(Err(e)) => {
            log::warn!("[{}] request failed: {}", provider, e);
            return Err(FetchStatus::Failed);
        }
        Ok(Ok(response)) => response,
    };

    if let Some(status) = classify_status(response.status) {
        log::warn!(
            "[{}] upstream returned HTTP {}: {}",
            provider,
            response.status,
            status
        );
        return Err(status);
    }

    serde_json::from_str(&response.body).map_err(|e| {
        log::warn!("[{}] could not parse response: {}", provider, e);
        FetchStatus::Malformed
    })
}

/// Normalize the many spellings of employment types into one vocabulary.
pub fn normalize_employment_type(raw: &str) -> String {
    let key: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    match key.as_str() {
        "" => String::new(),
        "fulltime" => "Full-time".into(),
        "parttime" => "Part-time".into(),
        "contract" | "contractor" => "Contract".into(),
        "intern" | "internship" => "Internship".into(),
        "temporary" | "temp" => "Temporary".into(),
        "freelance" => "Freelance".into(),
        "volunteer" => "Volunteer".into(),
        _ => raw.trim().to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Reply, ScriptedHttp};
    use super::*;

    #[derive(serde::Deserialize, Debug)]
    struct Body {
        value: u32,
    }

    fn url() -> Url {
        Url::parse("https://upstream.test/search").unwrap()
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200), None);
        assert_eq!(classify_status(401), Some(FetchStatus::RateLimited(401)));
        assert_eq!(classify_status(403), Some(FetchStatus::RateLimited(403)));
        assert_eq!(classify_status(429), Some(FetchStatus::RateLimited(429)));
        assert_eq!(classify_status(500), Some(FetchStatus::Failed));
        assert_eq!(classify_status(404), Some(FetchStatus::Failed));
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let http = ScriptedHttp::new(vec![ScriptedHttp::json(200, r#"{"value": 7}"#)]);
        let body: Body = get_json(&http, "t", &url(), &[], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(body.value, 7);
    }

    #[tokio::test]
    async fn test_get_json_non_json_is_malformed() {
        let http = ScriptedHttp::new(vec![ScriptedHttp::json(200, "<html>oops</html>")]);
        let err = get_json::<Body>(&http, "t", &url(), &[], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, FetchStatus::Malformed);
    }

    #[tokio::test]
    async fn test_get_json_timeout() {
        let http = ScriptedHttp::new(vec![Reply::Hang]);
        let err = get_json::<Body>(&http, "t", &url(), &[], Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err, FetchStatus::Timeout);
    }

    #[tokio::test]
    async fn test_get_json_transport_error() {
        let http = ScriptedHttp::new(vec![Reply::Error]);
        let err = get_json::<Body>(&http, "t", &url(), &[], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, FetchStatus::Failed);
    }

    #[test]
    fn test_normalize_employment_type() {
        assert_eq!(normalize_employment_type("FULLTIME"), "Full-time");
        assert_eq!(normalize_employment_type("FULL_TIME"), "Full-time");
        assert_eq!(normalize_employment_type("full_time"), "Full-time");
        assert_eq!(normalize_employment_type("CONTRACTOR"), "Contract");
        assert_eq!(normalize_employment_type("Apprenticeship"), "Apprenticeship");
        assert_eq!(normalize_employment_type(""), "");
    }

    #[test]
    fn test_answered() {
        assert!(ProviderResult::ok(Vec::new()).answered());
        assert!(!ProviderResult::failed(FetchStatus::Timeout).answered());
    }
}
