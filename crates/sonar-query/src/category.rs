//! Category model resolver.
//!
//! Category names typed by end users rarely match stored keys exactly, so
//! resolution falls through three tiers before giving up on the set: exact
//! key, whitespace/case-normalized key, substring in either direction.
//! When nothing matches, the raw string is carried forward as a free-text
//! phrase instead of erroring out.

use sonar_core::types::{Category, CategorySet};

/// Outcome of resolving a requested category name against a set.
#[derive(Debug, Clone)]
pub enum CategoryMatch {
    /// Use every category in the set as an OR-union.
    All,
    /// One concrete category.
    Single(Category),
    /// No key matched: match the raw string as a free-text phrase, still
    /// scoped by whichever categories are defined.
    FreeText(String),
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

pub fn resolve(requested: &str, set: &CategorySet) -> CategoryMatch {
    let wanted = requested.trim();
    if wanted.is_empty() || wanted.eq_ignore_ascii_case("all") {
        return CategoryMatch::All;
    }

    if let Some(c) = set.get(wanted) {
        return CategoryMatch::Single(c.clone());
    }

    let squashed = squash(wanted);
    if let Some(c) = set.iter().find(|c| squash(&c.name) == squashed) {
        return CategoryMatch::Single(c.clone());
    }

    let lowered = wanted.to_lowercase();
    if let Some(c) = set.iter().find(|c| {
        let name = c.name.to_lowercase();
        name.contains(&lowered) || lowered.contains(&name)
    }) {
        return CategoryMatch::Single(c.clone());
    }

    CategoryMatch::FreeText(wanted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(names: &[&str]) -> CategorySet {
        names
            .iter()
            .map(|n| Category {
                name: (*n).to_string(),
                keywords: vec![format!("{n} kw")],
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn all_sentinel() {
        let set = set_of(&["Tech"]);
        assert!(matches!(resolve("all", &set), CategoryMatch::All));
        assert!(matches!(resolve("All", &set), CategoryMatch::All));
        assert!(matches!(resolve("", &set), CategoryMatch::All));
    }

    #[test]
    fn exact_beats_everything() {
        let set = set_of(&["Tech", "Technology"]);
        match resolve("Tech", &set) {
            CategoryMatch::Single(c) => assert_eq!(c.name, "Tech"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn case_normalized_beats_substring() {
        // "tech" normalizes to "Tech" exactly, so it must not land on
        // "Technology" via the substring tier.
        let set = set_of(&["Technology", "Tech"]);
        match resolve("tech", &set) {
            CategoryMatch::Single(c) => assert_eq!(c.name, "Tech"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn substring_both_directions() {
        let set = set_of(&["Customer Service"]);
        match resolve("service", &set) {
            CategoryMatch::Single(c) => assert_eq!(c.name, "Customer Service"),
            other => panic!("unexpected: {other:?}"),
        }
        match resolve("Customer Service Desk", &set) {
            CategoryMatch::Single(c) => assert_eq!(c.name, "Customer Service"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn whitespace_normalization() {
        let set = set_of(&["Customer Service"]);
        match resolve("customerservice", &set) {
            CategoryMatch::Single(c) => assert_eq!(c.name, "Customer Service"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_falls_back_to_free_text() {
        let set = set_of(&["Tech"]);
        match resolve("great coffee", &set) {
            CategoryMatch::FreeText(raw) => assert_eq!(raw, "great coffee"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
