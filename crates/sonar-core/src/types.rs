//! Domain types shared by the query compiler and the analytic views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named set of keyword/hashtag/URL terms defining a topical filter.
///
/// Supplied per request by the category store; immutable for the duration
/// of one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

impl Category {
    /// A category with no criteria at all. It must compile to a clause that
    /// matches zero documents, never be silently dropped.
    pub fn is_unfilterable(&self) -> bool {
        self.keywords.is_empty() && self.hashtags.is_empty() && self.urls.is_empty()
    }

    /// Keywords, hashtags and urls flattened in definition order.
    pub fn all_terms(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .chain(self.hashtags.iter())
            .chain(self.urls.iter())
            .map(String::as_str)
    }
}

/// Insertion-ordered collection of categories, keyed by name.
///
/// Insertion order is irrelevant for matching; it only gives stable output
/// ordering to categories that end up with zero matches.
#[derive(Debug, Clone, Default)]
pub struct CategorySet {
    entries: Vec<Category>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by name, keeping first-insertion position.
    pub fn insert(&mut self, category: Category) {
        match self.entries.iter_mut().find(|c| c.name == category.name) {
            Some(slot) => *slot = category,
            None => self.entries.push(category),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.entries.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every filter term of every category, flattened in set order.
    pub fn all_terms(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|c| c.all_terms().map(str::to_string))
            .collect()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = CategorySet::new();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

/// Resolved time restriction.
///
/// `active == false` means no time clause is added to the query at all,
/// which is not the same thing as "all time" encoded as wide bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub active: bool,
}

impl TimeWindow {
    pub fn inactive() -> Self {
        Self { from: None, to: None, active: false }
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from: Some(from), to: Some(to), active: true }
    }
}

/// The normalized, UI-ready shape of one search hit. Created fresh per
/// response; never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticDocument {
    pub id: String,
    pub user_name: String,
    pub display_name: String,
    pub profile_image_url: String,
    pub followers: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub message_text: String,
    pub title: String,
    pub hashtags: Vec<String>,
    pub source: String,
    pub source_url: String,
    pub sentiment: String,
    pub emotion: String,
    pub mention_type: String,
    pub matched_terms: Vec<String>,
    pub created_time: String,
}

/// Success envelope: `{"success": true, ...payload}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self { success: true, payload }
    }
}

/// Failure envelope: `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl From<&crate::error::Error> for ApiError {
    fn from(err: &crate::error::Error) -> Self {
        Self { success: false, error: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfilterable_category() {
        let empty = Category { name: "Empty".into(), ..Default::default() };
        assert!(empty.is_unfilterable());
        let with_kw = Category { name: "Kw".into(), keywords: vec!["a".into()], ..Default::default() };
        assert!(!with_kw.is_unfilterable());
    }

    #[test]
    fn category_set_keeps_insertion_order_on_replace() {
        let mut set = CategorySet::new();
        set.insert(Category { name: "A".into(), ..Default::default() });
        set.insert(Category { name: "B".into(), ..Default::default() });
        set.insert(Category { name: "A".into(), keywords: vec!["x".into()], ..Default::default() });
        let names: Vec<_> = set.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(set.get("A").map(|c| c.keywords.len()), Some(1));
    }

    #[test]
    fn upstream_error_hides_detail() {
        let err = crate::error::Error::upstream(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(err.status_code(), 500);
    }
}
