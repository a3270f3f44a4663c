// src/services/linkedin.rs

//! Secondary professional-network provider (LinkedIn Job Search on RapidAPI).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::Result;
use crate::models::{Country, LinkedInConfig, NormalizedListing, Query, SalaryRange};
use crate::services::provider::{
    FetchStatus, JobProvider, ProviderResult, get_json, normalize_employment_type,
};
use crate::utils::HttpFetch;
use crate::utils::text::{html_to_text, non_empty, stable_id};

#[derive(Debug, Deserialize)]
struct LinkedInJob {
    /// Numeric or string depending on the upstream version
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    organization_logo: Option<String>,
    #[serde(default)]
    cities_derived: Option<Vec<String>>,
    #[serde(default)]
    regions_derived: Option<Vec<String>>,
    #[serde(default)]
    countries_derived: Option<Vec<String>>,
    #[serde(default)]
    date_posted: Option<String>,
    #[serde(default)]
    employment_type: Option<Vec<String>>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description_text: Option<String>,
    #[serde(default)]
    salary_raw: Option<SalaryRaw>,
}

#[derive(Debug, Deserialize)]
struct SalaryRaw {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    value: Option<SalaryValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalaryValue {
    #[serde(default)]
    min_value: Option<f64>,
    #[serde(default)]
    max_value: Option<f64>,
    /// Single figure used when no range is given
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    unit_text: Option<String>,
}

fn first(values: Option<Vec<String>>) -> Option<String> {
    values.and_then(|v| v.into_iter().find(|s| !s.trim().is_empty()))
}

impl LinkedInJob {
    fn in_country(&self, country: &Country) -> bool {
        self.countries_derived
            .iter()
            .flatten()
            .any(|name| country.matches_location(name))
    }

    fn into_listing(self, source: &str) -> NormalizedListing {
        let title = non_empty(self.title);
        let employer = non_empty(self.organization);
        let apply_link = non_empty(self.url);
        let id = match self.id {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => stable_id(&[
                title.as_deref().unwrap_or_default(),
                employer.as_deref().unwrap_or_default(),
                apply_link.as_deref().unwrap_or_default(),
            ]),
        };

        let mut listing = NormalizedListing::new(id, title, employer, source);
        listing.employer_logo = non_empty(self.organization_logo);
        listing.city = first(self.cities_derived);
        listing.region = first(self.regions_derived);
        listing.country = first(self.countries_derived);
        listing.description = self
            .description_text
            .as_deref()
            .map(html_to_text)
            .unwrap_or_default();
        listing.posted_at = non_empty(self.date_posted);
        listing.employment_type = first(self.employment_type)
            .map(|t| normalize_employment_type(&t))
            .unwrap_or_default();
        listing.apply_link = apply_link;
        if let Some(raw) = self.salary_raw {
            let value = raw.value;
            listing.salary = SalaryRange {
                min: value.as_ref().and_then(|v| v.min_value.or(v.value)),
                max: value.as_ref().and_then(|v| v.max_value.or(v.value)),
                currency: non_empty(raw.currency),
                period: value.and_then(|v| non_empty(v.unit_text)),
            };
        }
        listing
    }
}

/// LinkedIn Job Search adapter.
///
/// The upstream location filter also matches postings that merely mention
/// the country, so results are filtered again locally. The local filter is
/// dropped when it would leave nothing.
pub struct LinkedInProvider {
    http: Arc<dyn HttpFetch>,
    config: LinkedInConfig,
    timeout: Duration,
}

impl LinkedInProvider {
    pub const NAME: &'static str = "linkedin";

    pub fn new(http: Arc<dyn HttpFetch>, config: LinkedInConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            http,
            config,
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn search_url(&self, query: &Query) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)?.join("active-jb-7d")?;
        {
            let mut params = url.query_pairs_mut();
            if !query.text().is_empty() {
                params.append_pair("title_filter", &format!("\"{}\"", query.text()));
            }
            params
                .append_pair("description_type", "text")
                .append_pair("limit", &self.config.limit.to_string());
            if let Some(country) = query.country() {
                params.append_pair("location_filter", country.name);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl JobProvider for LinkedInProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_available(&self) -> bool {
        self.config.enabled
            && self
                .config
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }

    async fn fetch(&self, query: &Query) -> ProviderResult {
        if !self.is_available() {
            return ProviderResult::failed(FetchStatus::Unavailable);
        }

        let url = match self.search_url(query) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("[{}] could not build request URL: {}", Self::NAME, e);
                return ProviderResult::failed(FetchStatus::Failed);
            }
        };
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let headers = [
            ("X-RapidAPI-Key", key),
            ("X-RapidAPI-Host", self.config.host.as_str()),
        ];

        let jobs: Vec<LinkedInJob> =
            match get_json(self.http.as_ref(), Self::NAME, &url, &headers, self.timeout).await {
                Ok(jobs) => jobs,
                Err(status) => return ProviderResult::failed(status),
            };

        let jobs = match query.country() {
            Some(country) => {
                let total = jobs.len();
                let (matching, others): (Vec<_>, Vec<_>) =
                    jobs.into_iter().partition(|job| job.in_country(country));
                if matching.is_empty() && total > 0 {
                    log::debug!(
                        "[{}] local filter for {} would drop all {} listings; keeping them",
                        Self::NAME,
                        country.code,
                        total
                    );
                    others
                } else {
                    matching
                }
            }
            None => jobs,
        };

        log::debug!("[{}] {} listings for {}", Self::NAME, jobs.len(), query);
        ProviderResult::ok(
            jobs.into_iter()
                .map(|job| job.into_listing(Self::NAME))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::testing::ScriptedHttp;

    fn job(id: u64, title: &str, country: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "organization": "Globex",
            "cities_derived": ["Berlin"],
            "countries_derived": [country],
            "employment_type": ["FULL_TIME"],
            "url": format!("https://jobs.test/{id}"),
            "description_text": "Plain text",
            "salary_raw": {
                "currency": "EUR",
                "value": { "minValue": 60000, "maxValue": 80000, "unitText": "YEAR" }
            }
        })
    }

    fn provider(http: Arc<ScriptedHttp>) -> LinkedInProvider {
        let config = LinkedInConfig {
            api_key: Some("key".into()),
            base_url: "https://linkedin.test".into(),
            limit: 25,
            ..LinkedInConfig::default()
        };
        LinkedInProvider::new(http, config)
    }

    #[tokio::test]
    async fn test_request_shape_and_mapping() {
        let body = serde_json::json!([job(1, "Rust Dev", "Germany")]).to_string();
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(200, &body)]));
        let result = provider(http.clone())
            .fetch(&Query::new("rust", "de", None).unwrap())
            .await;

        assert_eq!(result.status, FetchStatus::Ok);
        let listing = &result.listings[0];
        assert_eq!(listing.id, "1");
        assert_eq!(listing.city.as_deref(), Some("Berlin"));
        assert_eq!(listing.country.as_deref(), Some("Germany"));
        assert_eq!(listing.employment_type, "Full-time");
        assert_eq!(listing.salary.min, Some(60000.0));
        assert_eq!(listing.salary.currency.as_deref(), Some("EUR"));
        assert_eq!(listing.salary.period.as_deref(), Some("YEAR"));

        let url = &http.requests()[0];
        assert_eq!(url.path(), "/active-jb-7d");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("title_filter".into(), "\"rust\"".into())));
        assert!(pairs.contains(&("location_filter".into(), "Germany".into())));
        assert!(pairs.contains(&("limit".into(), "25".into())));
    }

    #[tokio::test]
    async fn test_local_country_filter() {
        let body = serde_json::json!([
            job(1, "Rust Dev", "Germany"),
            job(2, "Go Dev", "France"),
            job(3, "Ops", "Deutschland"),
        ])
        .to_string();
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(200, &body)]));
        let result = provider(http)
            .fetch(&Query::new("dev", "de", None).unwrap())
            .await;

        let ids: Vec<_> = result.listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_local_filter_discarded_when_it_empties_results() {
        let body = serde_json::json!([job(1, "Rust Dev", "France"), job(2, "Go Dev", "Spain")])
            .to_string();
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(200, &body)]));
        let result = provider(http)
            .fetch(&Query::new("dev", "de", None).unwrap())
            .await;

        assert_eq!(result.listings.len(), 2);
    }

    #[tokio::test]
    async fn test_error_object_is_malformed() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(
            200,
            r#"{"message":"You are not subscribed to this API."}"#,
        )]));
        let result = provider(http)
            .fetch(&Query::new("dev", "", None).unwrap())
            .await;
        assert_eq!(result.status, FetchStatus::Malformed);
        assert!(result.listings.is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_is_rate_limited() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(403, "{}")]));
        let result = provider(http.clone())
            .fetch(&Query::new("dev", "gb", None).unwrap())
            .await;
        assert_eq!(result.status, FetchStatus::RateLimited(403));
        assert_eq!(http.requests().len(), 1);
    }

    #[test]
    fn test_string_id_and_single_salary_value() {
        let job: LinkedInJob = serde_json::from_str(
            r#"{"id":"abc","title":"Dev","salary_raw":{"currency":"USD","value":{"value":42.5,"unitText":"HOUR"}}}"#,
        )
        .unwrap();
        let listing = job.into_listing("linkedin");
        assert_eq!(listing.id, "abc");
        assert_eq!(listing.employer_name, "");
        assert_eq!(listing.salary.min, Some(42.5));
        assert_eq!(listing.salary.max, Some(42.5));
    }
}
