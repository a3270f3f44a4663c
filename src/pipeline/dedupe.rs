// src/pipeline/dedupe.rs

//! Collapse listings that several providers report for the same posting.

use std::collections::HashSet;

use crate::models::NormalizedListing;

/// Identity of a posting across providers: trimmed, lowercased title and
/// employer joined by `|`.
///
/// Distinct postings that share both are merged.
pub fn dedup_key(listing: &NormalizedListing) -> String {
    format!(
        "{}|{}",
        listing.title.trim().to_lowercase(),
        listing.employer_name.trim().to_lowercase()
    )
}

/// Drop repeated postings, keeping the first occurrence and the input order.
pub fn dedupe(listings: Vec<NormalizedListing>) -> Vec<NormalizedListing> {
    let mut seen = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|listing| seen.insert(dedup_key(listing)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, title: &str, employer: &str, source: &str) -> NormalizedListing {
        NormalizedListing::new(id, Some(title.into()), Some(employer.into()), source)
    }

    #[test]
    fn test_first_occurrence_wins() {
        let listings = vec![
            listing("a", "Rust Engineer", "Acme", "jsearch"),
            listing("b", "Go Engineer", "Acme", "jsearch"),
            listing("c", "  rust engineer ", "ACME", "linkedin"),
            listing("d", "Rust Engineer", "Globex", "remotive"),
        ];
        let ids: Vec<_> = dedupe(listings).into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_idempotent() {
        let listings = vec![
            listing("a", "Dev", "Acme", "jsearch"),
            listing("b", "dev", "acme", "remotive"),
            listing("c", "Ops", "Acme", "remotive"),
        ];
        let once = dedupe(listings);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_missing_fields_still_keyed() {
        let listings = vec![
            NormalizedListing::new("a", None, None, "x"),
            NormalizedListing::new("b", None, None, "y"),
        ];
        assert_eq!(dedup_key(&listings[0]), "|");
        assert_eq!(dedupe(listings).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}
