//! Normalized job listing.

use serde::{Deserialize, Serialize};

/// Salary range as reported by a provider. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SalaryRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
    /// Pay period, e.g. "YEAR" or "HOUR"
    pub period: Option<String>,
}

impl SalaryRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// A job posting converted from any provider's response shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedListing {
    /// Provider-scoped identifier; not globally unique
    pub id: String,

    /// Job title (empty string when the provider omits it)
    pub title: String,

    /// Employer name (empty string when the provider omits it)
    pub employer_name: String,

    #[serde(default)]
    pub employer_logo: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub country: Option<String>,

    /// Plain text, HTML already stripped
    #[serde(default)]
    pub description: String,

    /// Provider-supplied timestamp string
    #[serde(default)]
    pub posted_at: Option<String>,

    #[serde(default)]
    pub employment_type: String,

    #[serde(default)]
    pub apply_link: Option<String>,

    #[serde(default)]
    pub salary: SalaryRange,

    /// Label of the provider this listing came from
    pub source: String,
}

impl NormalizedListing {
    /// Create a listing with the required fields; missing title or employer
    /// become empty strings so the dedup key is always well-formed.
    pub fn new(
        id: impl Into<String>,
        title: Option<String>,
        employer_name: Option<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.unwrap_or_default(),
            employer_name: employer_name.unwrap_or_default(),
            employer_logo: None,
            city: None,
            region: None,
            country: None,
            description: String::new(),
            posted_at: None,
            employment_type: String::new(),
            apply_link: None,
            salary: SalaryRange::default(),
            source: source.into(),
        }
    }

    /// Human readable location built from the non-empty parts.
    pub fn location(&self) -> String {
        [&self.city, &self.region, &self.country]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_title_and_employer_become_empty() {
        let listing = NormalizedListing::new("1", None, None, "jsearch");
        assert_eq!(listing.title, "");
        assert_eq!(listing.employer_name, "");
    }

    #[test]
    fn test_location_joins_present_parts() {
        let mut listing = NormalizedListing::new("1", Some("Dev".into()), None, "x");
        assert_eq!(listing.location(), "");
        listing.city = Some("London".into());
        listing.country = Some("GB".into());
        assert_eq!(listing.location(), "London, GB");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"id":"a","title":"t","employer_name":"e","source":"remotive"}"#;
        let listing: NormalizedListing = serde_json::from_str(json).unwrap();
        assert!(listing.salary.is_empty());
        assert!(listing.apply_link.is_none());
    }
}
