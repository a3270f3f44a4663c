//! Search query and its cache key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Country;

/// A search request: free text, country and page.
///
/// An empty country means worldwide. The text is not validated here;
/// it is only trimmed and lowercased so the cache key is stable.
/// Deserialization goes through [`Query::new`], so the same rules apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuery")]
pub struct Query {
    text: String,
    country: String,
    page: usize,
}

/// Unchecked wire form of a [`Query`].
#[derive(Deserialize)]
struct RawQuery {
    text: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    page: Option<usize>,
}

impl TryFrom<RawQuery> for Query {
    type Error = AppError;

    fn try_from(raw: RawQuery) -> Result<Self> {
        Query::new(&raw.text, &raw.country, raw.page)
    }
}

impl Query {
    /// Build a query, rejecting country codes outside the allow-list.
    pub fn new(text: &str, country: &str, page: Option<usize>) -> Result<Self> {
        let country = country.trim().to_lowercase();
        if !country.is_empty() && Country::from_code(&country).is_none() {
            return Err(AppError::validation(format!(
                "unsupported country code '{country}'"
            )));
        }
        Ok(Self {
            text: text.trim().to_lowercase(),
            country,
            page: page.filter(|p| *p > 0).unwrap_or(1),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercase country code, empty for worldwide.
    pub fn country_code(&self) -> &str {
        &self.country
    }

    /// Allow-list entry for the country, `None` for worldwide.
    pub fn country(&self) -> Option<&'static Country> {
        Country::from_code(&self.country)
    }

    pub fn is_worldwide(&self) -> bool {
        self.country.is_empty()
    }

    /// 1-based page number.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Composite cache key, e.g. `hiring|us`. Page is not part of the key.
    pub fn cache_key(&self) -> String {
        format!("{}|{}", self.text, self.country)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let country = if self.is_worldwide() {
            "worldwide"
        } else {
            self.country.as_str()
        };
        write!(f, "'{}' ({}, page {})", self.text, country, self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        let query = Query::new("hiring", "us", None).unwrap();
        assert_eq!(query.cache_key(), "hiring|us");

        let worldwide = Query::new("hiring", "", None).unwrap();
        assert_eq!(worldwide.cache_key(), "hiring|");
        assert!(worldwide.is_worldwide());
        assert!(worldwide.country().is_none());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let a = Query::new("  Rust Engineer ", " GB", Some(2)).unwrap();
        let b = Query::new(a.text(), a.country_code(), Some(1)).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "rust engineer|gb");
    }

    #[test]
    fn test_page_defaults_to_one() {
        assert_eq!(Query::new("x", "", None).unwrap().page(), 1);
        assert_eq!(Query::new("x", "", Some(0)).unwrap().page(), 1);
        assert_eq!(Query::new("x", "", Some(3)).unwrap().page(), 3);
    }

    #[test]
    fn test_rejects_unknown_country() {
        let err = Query::new("x", "zz", None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_deserialize_validates_and_normalizes() {
        let query: Query =
            serde_json::from_str(r#"{"text": " Rust ", "country": "DE", "page": 0}"#).unwrap();
        assert_eq!(query, Query::new("rust", "de", None).unwrap());

        let worldwide: Query = serde_json::from_str(r#"{"text": "rust"}"#).unwrap();
        assert!(worldwide.is_worldwide());

        let err = serde_json::from_str::<Query>(r#"{"text": "rust", "country": "zz", "page": 1}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unsupported country code 'zz'"));
    }
}
