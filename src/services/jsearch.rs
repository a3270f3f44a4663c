// src/services/jsearch.rs

//! Primary structured-search provider (JSearch on RapidAPI).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::Result;
use crate::models::{JSearchConfig, NormalizedListing, Query, SalaryRange};
use crate::services::provider::{
    FetchStatus, JobProvider, ProviderResult, get_json, normalize_employment_type,
};
use crate::utils::HttpFetch;
use crate::utils::text::{html_to_text, non_empty, stable_id};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<JSearchJob>,
}

#[derive(Debug, Deserialize)]
struct JSearchJob {
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    job_title: Option<String>,
    #[serde(default)]
    employer_name: Option<String>,
    #[serde(default)]
    employer_logo: Option<String>,
    #[serde(default)]
    job_city: Option<String>,
    #[serde(default)]
    job_state: Option<String>,
    #[serde(default)]
    job_country: Option<String>,
    #[serde(default)]
    job_description: Option<String>,
    #[serde(default)]
    job_posted_at_datetime_utc: Option<String>,
    #[serde(default)]
    job_employment_type: Option<String>,
    #[serde(default)]
    job_apply_link: Option<String>,
    #[serde(default)]
    job_min_salary: Option<f64>,
    #[serde(default)]
    job_max_salary: Option<f64>,
    #[serde(default)]
    job_salary_currency: Option<String>,
    #[serde(default)]
    job_salary_period: Option<String>,
}

impl JSearchJob {
    fn into_listing(self, source: &str) -> NormalizedListing {
        let title = non_empty(self.job_title);
        let employer = non_empty(self.employer_name);
        let apply_link = non_empty(self.job_apply_link);
        let id = non_empty(self.job_id).unwrap_or_else(|| {
            stable_id(&[
                title.as_deref().unwrap_or_default(),
                employer.as_deref().unwrap_or_default(),
                apply_link.as_deref().unwrap_or_default(),
            ])
        });

        let mut listing = NormalizedListing::new(id, title, employer, source);
        listing.employer_logo = non_empty(self.employer_logo);
        listing.city = non_empty(self.job_city);
        listing.region = non_empty(self.job_state);
        listing.country = non_empty(self.job_country);
        listing.description = self
            .job_description
            .as_deref()
            .map(html_to_text)
            .unwrap_or_default();
        listing.posted_at = non_empty(self.job_posted_at_datetime_utc);
        listing.employment_type = self
            .job_employment_type
            .as_deref()
            .map(normalize_employment_type)
            .unwrap_or_default();
        listing.apply_link = apply_link;
        listing.salary = SalaryRange {
            min: self.job_min_salary,
            max: self.job_max_salary,
            currency: non_empty(self.job_salary_currency),
            period: non_empty(self.job_salary_period),
        };
        listing
    }
}

/// JSearch adapter.
///
/// Searches with the query text and country code first. When that answers
/// with nothing for a non-default, non-worldwide country, it retries once
/// with the country name folded into the text, since the upstream country
/// parameter misses many regional postings.
pub struct JSearchProvider {
    http: Arc<dyn HttpFetch>,
    config: JSearchConfig,
    timeout: Duration,
}

impl JSearchProvider {
    pub const NAME: &'static str = "jsearch";

    pub fn new(http: Arc<dyn HttpFetch>, config: JSearchConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            http,
            config,
            timeout,
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn search_url(&self, text: &str, country: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)?.join("search")?;
        {
            let mut params = url.query_pairs_mut();
            params
                .append_pair("query", text)
                .append_pair("page", "1")
                .append_pair("num_pages", "1");
            if let Some(country) = country {
                params.append_pair("country", country);
            }
        }
        Ok(url)
    }

    async fn search(
        &self,
        text: &str,
        country: Option<&str>,
    ) -> std::result::Result<Vec<NormalizedListing>, FetchStatus> {
        let url = self.search_url(text, country).map_err(|e| {
            log::warn!("[{}] could not build request URL: {}", Self::NAME, e);
            FetchStatus::Failed
        })?;
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let headers = [
            ("X-RapidAPI-Key", key),
            ("X-RapidAPI-Host", self.config.host.as_str()),
        ];

        let response: SearchResponse =
            get_json(self.http.as_ref(), Self::NAME, &url, &headers, self.timeout).await?;
        Ok(response
            .data
            .into_iter()
            .map(|job| job.into_listing(Self::NAME))
            .collect())
    }

    /// Free-text variant used when the country parameter finds nothing.
    fn retry_text(&self, query: &Query) -> Option<String> {
        let country = query.country()?;
        if country.code == self.config.default_country.to_lowercase() {
            return None;
        }
        Some(format!("{} in {}", query.text(), country.name))
    }
}

#[async_trait]
impl JobProvider for JSearchProvider {
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

        let country = (!query.is_worldwide()).then(|| query.country_code());
        match self.search(query.text(), country).await {
            Ok(listings) if !listings.is_empty() => {
                log::debug!("[{}] {} listings for {}", Self::NAME, listings.len(), query);
                return ProviderResult::ok(listings);
            }
            Ok(_) => {}
            Err(status) => return ProviderResult::failed(status),
        }

        let Some(text) = self.retry_text(query) else {
            return ProviderResult::ok(Vec::new());
        };
        log::info!(
            "[{}] no results for {}, retrying as '{}'",
            Self::NAME,
            query,
            text
        );
        match self.search(&text, None).await {
            Ok(listings) => ProviderResult::ok(listings),
            Err(status) => ProviderResult::failed(status),
        }
    }
}
