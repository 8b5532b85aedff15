//! Social-search query distillation.
//!
//! Product descriptions carry marketing noise ("free shipping", pack
//! counts) that tanks social keyword search. This strips the noise down to
//! at most six content-bearing terms.

use regex::Regex;

const MAX_QUERY_TERMS: usize = 6;
const MIN_TERM_LEN: usize = 3;

/// Marketing filler that never helps a social search.
const MARKETING_STOPWORDS: &[&str] = &[
    "free", "shipping", "discount", "extra", "new", "best", "off", "hot",
];

/// Distill a product description into a compact social-search query.
///
/// Lowercases, strips punctuation, drops marketing stopwords, pure numbers
/// and short tokens, and keeps the first six remaining terms in order.
/// Returns an empty string when nothing survives.
#[must_use]
pub fn distill_social_query(description: &str) -> String {
    let non_word = Regex::new(r"[^\w\s]").expect("valid punctuation regex");
    let cleaned = non_word.replace_all(&description.to_lowercase(), "");

    cleaned
        .split_whitespace()
        .filter(|term| term.len() >= MIN_TERM_LEN)
        .filter(|term| !term.chars().all(|c| c.is_ascii_digit()))
        .filter(|term| !MARKETING_STOPWORDS.contains(term))
        .take(MAX_QUERY_TERMS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a distilled query is strong enough to spend a provider call on.
#[must_use]
pub fn is_searchable(query: &str) -> bool {
    query.len() >= MIN_TERM_LEN
}
