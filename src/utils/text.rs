// src/utils/text.rs

//! Text cleaning helpers shared by the provider adapters.

use scraper::Html;
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Minimum keyword length kept by [`keywords`].
const MIN_KEYWORD_LENGTH: usize = 2;

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convert an HTML fragment into plain text.
///
/// Tags are dropped, entities decoded and whitespace collapsed. Plain
/// text input passes through unchanged apart from whitespace.
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return normalize_whitespace(html);
    }
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    normalize_whitespace(&text)
}

/// Split text into lowercase unicode words, dropping very short ones.
pub fn keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .unicode_words()
        .filter(|word| word.chars().count() >= MIN_KEYWORD_LENGTH)
        .map(String::from)
        .collect()
}

/// Derive a stable identifier from listing fields when a provider omits one.
pub fn stable_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.trim().to_lowercase().as_bytes());
        hasher.update(b"|");
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Treat empty or whitespace-only strings as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
