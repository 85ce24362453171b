//! Boolean query compiler.
//!
//! Assembles the resolved category scope, time window, source list and
//! filter values into one boolean query tree. All clause groups are ANDed
//! at the top level, so clause order never affects correctness; the one
//! invariant that must hold under every code path is that an unfilterable
//! category compiles to an impossible clause instead of no clause.

use chrono::{DateTime, Utc};
use serde_json::Value;

use sonar_core::request::NormalizedRequest;
use sonar_core::types::{Category, CategorySet, TimeWindow};

use crate::category::CategoryMatch;
use crate::clause::{self, BoolBuilder};
use crate::{routing, window};

/// Fields keyword terms are phrase-matched against.
pub const KEYWORD_FIELDS: &[&str] = &["message_text", "content", "keywords", "title"];

/// Fields the free-text fallback phrase is matched against.
pub const FREE_TEXT_FIELDS: &[&str] =
    &["message_text", "content", "hashtags", "source_url", "expanded_url"];

/// URL terms match either url-bearing field.
pub const URL_FIELDS: &[&str] = &["source_url", "expanded_url"];

/// The date field every time clause and histogram runs on.
pub const TIME_FIELD: &str = "created_time";

/// A compiled boolean query tree, ready for execution. Never mutated after
/// compilation.
#[derive(Debug, Clone)]
pub struct CompiledQuery(Value);

impl CompiledQuery {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// The non-category inputs of one compilation, produced by the three
/// resolvers. The resolvers are independent pure functions; the compiler
/// is the join point.
#[derive(Debug, Clone)]
pub struct QueryScope {
    pub window: TimeWindow,
    pub sources: Vec<String>,
    pub sentiments: Vec<String>,
    pub mention_types: Vec<String>,
    pub extra: Vec<Value>,
}

impl QueryScope {
    pub fn from_request(req: &NormalizedRequest, now: DateTime<Utc>) -> Self {
        Self {
            window: window::resolve(req.from_date, req.to_date, req.time_slot, req.topic_id, now),
            sources: routing::resolve_sources(req.topic_id, &req.sources),
            sentiments: req.sentiments.clone(),
            mention_types: req.mention_types.clone(),
            extra: routing::extra_clauses(req.topic_id),
        }
    }
}

pub fn compile(matched: &CategoryMatch, set: &CategorySet, scope: &QueryScope) -> CompiledQuery {
    let mut root = BoolBuilder::new();
    if let Some(c) = category_clause(matched, set) {
        root.push_must(c);
    }
    if scope.window.active {
        root.push_must(clause::date_range(TIME_FIELD, scope.window.from, scope.window.to));
    }
    if let Some(c) = source_clause(&scope.sources) {
        root.push_must(c);
    }
    if let Some(c) = sentiment_clause(&scope.sentiments) {
        root.push_must(c);
    }
    if let Some(c) = mention_type_clause(&scope.mention_types) {
        root.push_must(c);
    }
    // Topic-specific mandatory clauses go last.
    for extra in &scope.extra {
        root.push_must(extra.clone());
    }
    CompiledQuery(root.build())
}

/// Bulk variant used by the leaderboard: one query per category, the
/// impossible-clause invariant preserved for each.
pub fn compile_per_category(set: &CategorySet, scope: &QueryScope) -> Vec<(Category, CompiledQuery)> {
    set.iter()
        .map(|c| {
            let empty = CategorySet::new();
            (c.clone(), compile(&CategoryMatch::Single(c.clone()), &empty, scope))
        })
        .collect()
}

/// The category clause for each resolution outcome. `None` means "no
/// category restriction" and only ever happens when the set itself is
/// empty.
pub fn category_clause(matched: &CategoryMatch, set: &CategorySet) -> Option<Value> {
    match matched {
        CategoryMatch::All => {
            if set.is_empty() {
                return None;
            }
            let clauses: Vec<Value> = set.iter().flat_map(category_term_clauses).collect();
            if clauses.is_empty() {
                // every category is unfilterable, and each must report zero
                Some(clause::match_none())
            } else {
                Some(clause::any_of(clauses))
            }
        }
        CategoryMatch::Single(c) => {
            if c.is_unfilterable() {
                Some(clause::match_none())
            } else {
                Some(clause::any_of(category_term_clauses(c)))
            }
        }
        CategoryMatch::FreeText(raw) => {
            let mut clauses: Vec<Value> = set.iter().flat_map(category_term_clauses).collect();
            clauses.push(clause::multi_match_phrase(FREE_TEXT_FIELDS, raw));
            Some(clause::any_of(clauses))
        }
    }
}

/// Phrase-match clauses for one category's keywords, hashtags and urls.
pub fn category_term_clauses(c: &Category) -> Vec<Value> {
    let mut out = Vec::new();
    for kw in &c.keywords {
        out.push(clause::multi_match_phrase(KEYWORD_FIELDS, kw));
    }
    for tag in &c.hashtags {
        out.push(clause::match_phrase("hashtags", tag));
    }
    for url in &c.urls {
        out.push(clause::any_of(
            URL_FIELDS.iter().map(|f| clause::match_phrase(f, url)).collect(),
        ));
    }
    out
}

pub fn source_clause(sources: &[String]) -> Option<Value> {
    if sources.is_empty() {
        return None;
    }
    Some(clause::any_of(sources.iter().map(|s| clause::match_phrase("source", s)).collect()))
}

/// One requested sentiment compiles to a single Title Case match; multiple
/// expand each value to Title/lower/UPPER variants to absorb upstream case
/// drift.
pub fn sentiment_clause(sentiments: &[String]) -> Option<Value> {
    match sentiments {
        [] => None,
        [single] => Some(clause::match_term("sentiment", &title_case(single))),
        many => {
            let mut variants = Vec::new();
            for s in many {
                variants.push(clause::match_term("sentiment", &title_case(s)));
                variants.push(clause::match_term("sentiment", &s.trim().to_lowercase()));
                variants.push(clause::match_term("sentiment", &s.trim().to_uppercase()));
            }
            Some(clause::any_of(variants))
        }
    }
}

pub fn mention_type_clause(types: &[String]) -> Option<Value> {
    match types {
        [] => None,
        [single] => Some(clause::match_term("llm_mention_type", single)),
        many => Some(clause::any_of(
            many.iter().map(|t| clause::match_term("llm_mention_type", t)).collect(),
        )),
    }
}

pub fn title_case(value: &str) -> String {
    let mut chars = value.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
