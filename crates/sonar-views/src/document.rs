//! Hit normalization and matched-term attribution.

use serde_json::Value;

use sonar_core::types::{AnalyticDocument, CategorySet};
use sonar_query::category::CategoryMatch;

/// Text-bearing fields scanned for matched terms, in scan order.
pub const MATCH_FIELDS: &[&str] = &[
    "message_text",
    "content",
    "keywords",
    "title",
    "hashtags",
    "source_url",
    "expanded_url",
    "display_name",
];

/// Build the UI-ready document from a raw `_source`, attributing which of
/// the category filter terms occur in it.
pub fn normalize(source: &Value, terms: &[String]) -> AnalyticDocument {
    AnalyticDocument {
        id: text(source, "id"),
        user_name: text(source, "user_name"),
        display_name: text(source, "display_name"),
        profile_image_url: text(source, "profile_image_url"),
        followers: count(source, "followers"),
        likes: count(source, "likes"),
        comments: count(source, "comments"),
        shares: count(source, "shares"),
        views: count(source, "views"),
        message_text: text(source, "message_text"),
        title: text(source, "title"),
        hashtags: text_list(source, "hashtags"),
        source: text(source, "source"),
        source_url: text(source, "source_url"),
        sentiment: text(source, "sentiment"),
        emotion: text(source, "emotion"),
        mention_type: text(source, "llm_mention_type"),
        matched_terms: matched_terms(source, terms),
        created_time: text(source, "created_time"),
    }
}

/// The filter terms in scope for attribution: the resolved category's own
/// terms, or every category's when the whole set is active. The free-text
/// fallback string is attributed like any other term.
pub fn active_terms(matched: &CategoryMatch, set: &CategorySet) -> Vec<String> {
    match matched {
        CategoryMatch::Single(c) => c.all_terms().map(str::to_string).collect(),
        CategoryMatch::All => set.all_terms(),
        CategoryMatch::FreeText(raw) => {
            let mut terms = set.all_terms();
            terms.push(raw.clone());
            terms
        }
    }
}

/// The subset of `terms` found in the document, case-insensitive substring
/// over [`MATCH_FIELDS`], original term order, deduplicated. Enrichment
/// only: never affects which documents are included.
pub fn matched_terms(source: &Value, terms: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() || out.iter().any(|t| t == term) {
            continue;
        }
        if MATCH_FIELDS.iter().any(|f| value_contains(&source[*f], &needle)) {
            out.push(term.clone());
        }
    }
    out
}

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|v| value_contains(v, needle)),
        _ => false,
    }
}

fn text(source: &Value, field: &str) -> String {
    source[field].as_str().unwrap_or_default().to_string()
}

fn text_list(source: &Value, field: &str) -> Vec<String> {
    match &source[field] {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn count(source: &Value, field: &str) -> u64 {
    match &source[field] {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        // engagement counters sometimes arrive as strings
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
