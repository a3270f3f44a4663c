// src/services/remotive.rs

//! Open bulk-feed provider (Remotive).
//!
//! The whole feed is downloaded at once and cached on its own TTLs. Each
//! query is answered in-process by filtering on country and ranking by
//! keyword overlap.

use std::sync::{Arc, LazyLock, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::error::Result;
use crate::models::{
    Country, NormalizedListing, Query, RemotiveConfig, SalaryRange, is_worldwide_location,
};
use crate::services::provider::{
    FetchStatus, JobProvider, ProviderResult, get_json, normalize_employment_type,
};
use crate::storage::{CachePolicy, CacheStore};
use crate::utils::clock::elapsed;
use crate::utils::text::{html_to_text, keywords, non_empty, stable_id};
use crate::utils::{Clock, HttpFetch};

const FEED_KEY: &str = "remotive-feed";

/// How long a failed feed download is remembered before trying again.
pub const FAILED_DOWNLOAD_BACKOFF: Duration = Duration::from_secs(30);

/// Points for a query word found in the title.
const TITLE_WEIGHT: usize = 3;
/// Points for a query word found in tags, category or description.
const BODY_WEIGHT: usize = 1;

static SALARY_AMOUNT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3}(?:[,.]\d{3})+|\d+(?:\.\d+)?)\s*(k)?\b").ok());

#[derive(Debug, Deserialize)]
struct FeedResponse {
    jobs: Vec<FeedJob>,
}

#[derive(Debug, Deserialize)]
struct FeedJob {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    company_logo: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    job_type: Option<String>,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default)]
    candidate_required_location: Option<String>,
    #[serde(default)]
    salary: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// A normalized feed listing plus the lowercase text it is ranked on.
#[derive(Debug, Clone)]
struct FeedEntry {
    listing: NormalizedListing,
    title: String,
    body: String,
}

impl FeedEntry {
    fn from_job(job: FeedJob, source: &str) -> Self {
        let title = non_empty(job.title);
        let employer = non_empty(job.company_name);
        let apply_link = non_empty(job.url);
        let id = match job.id {
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
            _ => stable_id(&[
                title.as_deref().unwrap_or_default(),
                employer.as_deref().unwrap_or_default(),
                apply_link.as_deref().unwrap_or_default(),
            ]),
        };

        let mut listing = NormalizedListing::new(id, title, employer, source);
        listing.employer_logo = non_empty(job.company_logo);
        listing.country = non_empty(job.candidate_required_location);
        listing.description = job
            .description
            .as_deref()
            .map(html_to_text)
            .unwrap_or_default();
        listing.posted_at = non_empty(job.publication_date);
        listing.employment_type = job
            .job_type
            .as_deref()
            .map(normalize_employment_type)
            .unwrap_or_default();
        listing.apply_link = apply_link;
        listing.salary = job
            .salary
            .as_deref()
            .map(parse_salary)
            .unwrap_or_default();

        let mut body = job.tags.unwrap_or_default().join(" ");
        if let Some(category) = job.category {
            body.push(' ');
            body.push_str(&category);
        }
        body.push(' ');
        body.push_str(&listing.description);

        Self {
            title: listing.title.to_lowercase(),
            body: body.to_lowercase(),
            listing,
        }
    }

    /// Listings without a location, or open worldwide, match every country.
    fn open_to(&self, country: &Country) -> bool {
        match self.listing.country.as_deref() {
            None => true,
            Some(location) => {
                is_worldwide_location(location) || country.matches_location(location)
            }
        }
    }

    fn score(&self, words: &[String]) -> usize {
        if words.is_empty() {
            return BODY_WEIGHT;
        }
        words
            .iter()
            .map(|word| {
                let mut score = 0;
                if self.title.contains(word.as_str()) {
                    score += TITLE_WEIGHT;
                }
                if self.body.contains(word.as_str()) {
                    score += BODY_WEIGHT;
                }
                score
            })
            .sum()
    }
}

/// Best-effort parse of free-text salaries such as "$80k - $100k" or
/// "EUR 50,000 - 60,000 per year".
fn parse_salary(text: &str) -> SalaryRange {
    let Some(amount) = SALARY_AMOUNT.as_ref() else {
        return SalaryRange::default();
    };
    let lower = text.to_lowercase();

    let amounts: Vec<f64> = amount
        .captures_iter(text)
        .filter_map(|caps| {
            let digits: String = caps[1].chars().filter(|c| *c != ',').collect();
            // "50.000" is a thousands separator, "42.5" is a decimal
            let digits = if digits.matches('.').count() == 1
                && digits.split('.').nth(1).is_some_and(|d| d.len() == 3)
            {
                digits.replace('.', "")
            } else {
                digits
            };
            let value: f64 = digits.parse().ok()?;
            Some(if caps.get(2).is_some() {
                value * 1000.0
            } else {
                value
            })
        })
        .take(2)
        .collect();

    let currency = if lower.contains('$') || lower.contains("usd") {
        Some("USD")
    } else if lower.contains('€') || lower.contains("eur") {
        Some("EUR")
    } else if lower.contains('£') || lower.contains("gbp") {
        Some("GBP")
    } else if lower.contains("cad") {
        Some("CAD")
    } else if lower.contains("aud") {
        Some("AUD")
    } else {
        None
    };

    let period = if lower.contains("hour") || lower.contains("/hr") {
        Some("HOUR")
    } else if lower.contains("month") {
        Some("MONTH")
    } else if lower.contains("year")
        || lower.contains("annum")
        || lower.contains("/yr")
        || lower.contains("annual")
    {
        Some("YEAR")
    } else {
        None
    };

    SalaryRange {
        min: amounts.first().copied(),
        max: amounts.get(1).or(amounts.first()).copied(),
        currency: currency.map(String::from),
        period: period.map(String::from),
    }
}

type FeedResult = std::result::Result<Arc<Vec<FeedEntry>>, FetchStatus>;
type Download = Shared<BoxFuture<'static, FeedResult>>;

/// Feed cache plus the bookkeeping a running download reports back to.
struct FeedState {
    cache: CacheStore<Arc<Vec<FeedEntry>>>,
    clock: Arc<dyn Clock>,
    /// Download in progress; every caller that misses meanwhile joins it
    pending: Mutex<Option<Download>>,
    /// When the last download failed and how
    failed: Mutex<Option<(DateTime<Utc>, FetchStatus)>>,
}

impl FeedState {
    fn recent_failure(&self) -> Option<FetchStatus> {
        let (at, status) = (*lock(&self.failed))?;
        (elapsed(at, self.clock.now()) < FAILED_DOWNLOAD_BACKOFF).then_some(status)
    }

    fn finish(&self, result: &FeedResult) {
        match result {
            Ok(entries) => {
                self.cache.set(FEED_KEY, Arc::clone(entries));
                *lock(&self.failed) = None;
            }
            Err(status) => *lock(&self.failed) = Some((self.clock.now(), *status)),
        }
        *lock(&self.pending) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Download and normalize the feed, then record the outcome in `state`.
async fn download(
    http: Arc<dyn HttpFetch>,
    url: Url,
    timeout: Duration,
    state: Weak<FeedState>,
) -> FeedResult {
    let result = get_json::<FeedResponse>(
        http.as_ref(),
        RemotiveProvider::NAME,
        &url,
        &[],
        timeout,
    )
    .await
    .map(|response| {
        log::info!(
            "[{}] downloaded feed with {} listings",
            RemotiveProvider::NAME,
            response.jobs.len()
        );
        Arc::new(
            response
                .jobs
                .into_iter()
                .map(|job| FeedEntry::from_job(job, RemotiveProvider::NAME))
                .collect::<Vec<_>>(),
        )
    });
    if let Some(state) = state.upgrade() {
        state.finish(&result);
    }
    result
}

/// Remotive feed adapter. Always available.
///
/// Concurrent misses share a single download and its outcome, so each
/// caller waits at most one timeout. A failed download is not retried for
/// [`FAILED_DOWNLOAD_BACKOFF`].
pub struct RemotiveProvider {
    http: Arc<dyn HttpFetch>,
    config: RemotiveConfig,
    timeout: Duration,
    state: Arc<FeedState>,
}

impl RemotiveProvider {
    pub const NAME: &'static str = "remotive";

    pub fn new(http: Arc<dyn HttpFetch>, config: RemotiveConfig, clock: Arc<dyn Clock>) -> Self {
        let policy = CachePolicy {
            fresh_ttl: Duration::from_secs(config.feed_fresh_ttl_secs),
            stale_ttl: Duration::from_secs(config.feed_stale_ttl_secs),
            max_entries: 1,
        };
        Self {
            http,
            timeout: Duration::from_secs(config.timeout_secs),
            config,
            state: Arc::new(FeedState {
                cache: CacheStore::new(policy, Arc::clone(&clock)),
                clock,
                pending: Mutex::new(None),
                failed: Mutex::new(None),
            }),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn feed_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.config.base_url)?.join("api/remote-jobs")?)
    }

    /// Join the running download or start one.
    fn join_download(&self) -> std::result::Result<Download, FetchStatus> {
        let mut pending = lock(&self.state.pending);
        if let Some(running) = pending.as_ref() {
            return Ok(running.clone());
        }
        let url = self.feed_url().map_err(|e| {
            log::warn!("[{}] could not build feed URL: {}", Self::NAME, e);
            FetchStatus::Failed
        })?;
        let started = download(
            Arc::clone(&self.http),
            url,
            self.timeout,
            Arc::downgrade(&self.state),
        )
        .boxed()
        .shared();
        *pending = Some(started.clone());
        Ok(started)
    }

    /// Current feed: cached if fresh, otherwise downloaded. A failed download
    /// falls back to a stale copy when one is still cached.
    async fn feed(&self) -> FeedResult {
        let cached = self.state.cache.get(FEED_KEY);
        if let Some(hit) = cached.as_ref().filter(|hit| !hit.is_stale) {
            return Ok(Arc::clone(&hit.payload));
        }

        let outcome = match self.state.recent_failure() {
            Some(status) => {
                log::debug!(
                    "[{}] last feed download failed ({}); not retrying yet",
                    Self::NAME,
                    status
                );
                Err(status)
            }
            None => match self.join_download() {
                Ok(running) => running.await,
                Err(status) => Err(status),
            },
        };

        match (outcome, cached) {
            (Ok(feed), _) => Ok(feed),
            (Err(status), Some(hit)) => {
                log::warn!(
                    "[{}] feed refresh failed ({}); serving feed cached {}s ago",
                    Self::NAME,
                    status,
                    hit.age.as_secs()
                );
                Ok(hit.payload)
            }
            (Err(status), None) => Err(status),
        }
    }

    fn select(&self, feed: &[FeedEntry], query: &Query) -> Vec<NormalizedListing> {
        let words = keywords(query.text());
        let country = query.country();

        let mut ranked: Vec<(usize, &FeedEntry)> = feed
            .iter()
            .filter(|entry| country.is_none_or(|c| entry.open_to(c)))
            .map(|entry| (entry.score(&words), entry))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable sort keeps feed order among equal scores.
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        ranked
            .into_iter()
            .take(self.config.max_results)
            .map(|(_, entry)| entry.listing.clone())
            .collect()
    }
}

#[async_trait]
impl JobProvider for RemotiveProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, query: &Query) -> ProviderResult {
        match self.feed().await {
            Ok(feed) => {
                let listings = self.select(&feed, query);
                log::debug!(
                    "[{}] {} of {} feed listings match {}",
                    Self::NAME,
                    listings.len(),
                    feed.len(),
                    query
                );
                ProviderResult::ok(listings)
            }
            Err(status) => ProviderResult::failed(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::testing::{Reply, ScriptedHttp};
    use crate::utils::ManualClock;

    fn feed_body() -> String {
        serde_json::json!({
            "job-count": 4,
            "jobs": [
                {
                    "id": 1,
                    "url": "https://remotive.test/1",
                    "title": "Office Manager",
                    "company_name": "Initech",
                    "category": "Admin",
                    "tags": ["operations"],
                    "job_type": "full_time",
                    "candidate_required_location": "USA Only",
                    "salary": "",
                    "description": "<p>Help our <em>engineering</em> team</p>"
                },
                {
                    "id": 2,
                    "url": "https://remotive.test/2",
                    "title": "Senior Rust Engineer",
                    "company_name": "Acme",
                    "category": "Software Development",
                    "tags": ["rust", "backend"],
                    "job_type": "full_time",
                    "candidate_required_location": "Worldwide",
                    "salary": "$120k - $150k",
                    "description": "<p>Build &amp; ship</p>"
                },
                {
                    "id": 3,
                    "url": "https://remotive.test/3",
                    "title": "Platform Engineer",
                    "company_name": "Globex",
                    "category": "DevOps",
                    "tags": [],
                    "job_type": "contract",
                    "candidate_required_location": "Germany",
                    "salary": null,
                    "description": "Kubernetes"
                },
                {
                    "id": 4,
                    "url": "https://remotive.test/4",
                    "title": "Designer",
                    "company_name": "Hooli",
                    "category": "Design",
                    "tags": ["figma"],
                    "job_type": "full_time",
                    "candidate_required_location": "UK",
                    "description": "Pixels"
                }
            ]
        })
        .to_string()
    }

    fn provider(http: Arc<ScriptedHttp>, clock: Arc<ManualClock>) -> RemotiveProvider {
        let config = RemotiveConfig {
            base_url: "https://remotive.test".into(),
            ..RemotiveConfig::default()
        };
        RemotiveProvider::new(http, config, clock)
    }

    fn ids(result: &ProviderResult) -> Vec<&str> {
        result.listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_ranks_title_matches_first() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(200, &feed_body())]));
        let provider = provider(http.clone(), Arc::new(ManualClock::default()));
        let result = provider
            .fetch(&Query::new("engineer", "", None).unwrap())
            .await;

        assert_eq!(result.status, FetchStatus::Ok);
        // Title hits score above the description-only hit; designer drops out.
        assert_eq!(ids(&result), vec!["2", "3", "1"]);
        assert_eq!(http.requests()[0].path(), "/api/remote-jobs");
    }

    #[tokio::test]
    async fn test_country_filter_keeps_worldwide() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(200, &feed_body())]));
        let provider = provider(http, Arc::new(ManualClock::default()));

        let result = provider
            .fetch(&Query::new("engineer", "de", None).unwrap())
            .await;
        assert_eq!(ids(&result), vec!["2", "3"]);

        let result = provider.fetch(&Query::new("", "gb", None).unwrap()).await;
        assert_eq!(ids(&result), vec!["2", "4"]);
    }

    #[tokio::test]
    async fn test_feed_is_cached_between_queries() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(200, &feed_body())]));
        let clock = Arc::new(ManualClock::default());
        let provider = provider(http.clone(), clock.clone());

        provider.fetch(&Query::new("rust", "", None).unwrap()).await;
        clock.advance(chrono::Duration::minutes(20));
        provider.fetch(&Query::new("design", "", None).unwrap()).await;
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_feed_used_when_refresh_fails() {
        let http = Arc::new(ScriptedHttp::new(vec![
            ScriptedHttp::json(200, &feed_body()),
            Reply::Error,
        ]));
        let clock = Arc::new(ManualClock::default());
        let provider = provider(http.clone(), clock.clone());

        provider.fetch(&Query::new("rust", "", None).unwrap()).await;
        clock.advance(chrono::Duration::hours(1));
        let result = provider.fetch(&Query::new("rust", "", None).unwrap()).await;

        assert_eq!(http.requests().len(), 2);
        assert_eq!(result.status, FetchStatus::Ok);
        assert_eq!(ids(&result), vec!["2"]);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_download() {
        let http = Arc::new(ScriptedHttp::new(vec![Reply::Hang]));
        let provider = provider(http.clone(), Arc::new(ManualClock::default()))
            .with_timeout(Duration::from_millis(100));
        let query = Query::new("rust", "", None).unwrap();

        let started = std::time::Instant::now();
        let results =
            futures::future::join_all((0..4).map(|_| provider.fetch(&query))).await;

        // One timeout for everyone, not one per waiting caller.
        assert!(started.elapsed() < Duration::from_millis(300));
        assert_eq!(http.requests().len(), 1);
        assert!(results.iter().all(|r| r.status == FetchStatus::Timeout));
    }

    #[tokio::test]
    async fn test_failed_download_is_not_retried_immediately() {
        let http = Arc::new(ScriptedHttp::new(vec![
            Reply::Error,
            ScriptedHttp::json(200, &feed_body()),
        ]));
        let clock = Arc::new(ManualClock::default());
        let provider = provider(http.clone(), clock.clone());
        let query = Query::new("rust", "", None).unwrap();

        assert_eq!(provider.fetch(&query).await.status, FetchStatus::Failed);
        assert_eq!(provider.fetch(&query).await.status, FetchStatus::Failed);
        assert_eq!(http.requests().len(), 1);

        clock.advance(chrono::Duration::seconds(31));
        let result = provider.fetch(&query).await;
        assert_eq!(http.requests().len(), 2);
        assert_eq!(ids(&result), vec!["2"]);
    }

    #[tokio::test]
    async fn test_no_feed_reports_failure() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(502, "Bad gateway")]));
        let result = provider(http, Arc::new(ManualClock::default()))
            .fetch(&Query::new("rust", "", None).unwrap())
            .await;
        assert_eq!(result.status, FetchStatus::Failed);
        assert!(result.listings.is_empty());
    }

    #[tokio::test]
    async fn test_caps_results() {
        let http = Arc::new(ScriptedHttp::new(vec![ScriptedHttp::json(200, &feed_body())]));
        let config = RemotiveConfig {
            base_url: "https://remotive.test".into(),
            max_results: 1,
            ..RemotiveConfig::default()
        };
        let provider = RemotiveProvider::new(http, config, Arc::new(ManualClock::default()));
        let result = provider.fetch(&Query::new("", "", None).unwrap()).await;
        assert_eq!(ids(&result), vec!["1"]);
    }

    #[test]
    fn test_feed_entry_mapping() {
        let job: FeedJob = serde_json::from_str(
            r#"{"id": 9, "title": "Dev", "company_name": "Acme", "job_type": "full_time",
                "description": "<p>Build &amp; ship</p>", "candidate_required_location": "Europe"}"#,
        )
        .unwrap();
        let entry = FeedEntry::from_job(job, "remotive");
        assert_eq!(entry.listing.id, "9");
        assert_eq!(entry.listing.description, "Build & ship");
        assert_eq!(entry.listing.employment_type, "Full-time");
        assert_eq!(entry.listing.country.as_deref(), Some("Europe"));
        assert!(entry.listing.salary.is_empty());
    }

    #[test]
    fn test_parse_salary() {
        let range = parse_salary("$120k - $150k");
        assert_eq!(range.min, Some(120_000.0));
        assert_eq!(range.max, Some(150_000.0));
        assert_eq!(range.currency.as_deref(), Some("USD"));

        let range = parse_salary("EUR 50,000 - 60,000 per year");
        assert_eq!(range.min, Some(50_000.0));
        assert_eq!(range.max, Some(60_000.0));
        assert_eq!(range.currency.as_deref(), Some("EUR"));
        assert_eq!(range.period.as_deref(), Some("YEAR"));

        let range = parse_salary("£40 per hour");
        assert_eq!(range.min, Some(40.0));
        assert_eq!(range.max, Some(40.0));
        assert_eq!(range.period.as_deref(), Some("HOUR"));

        assert!(parse_salary("Competitive").is_empty());
    }
}
