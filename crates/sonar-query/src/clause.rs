//! Composable boolean-clause builders.
//!
//! Every compiled query is assembled from these small functions instead of
//! inline query literals, so compiler logic stays testable independent of
//! the wire format.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

pub fn match_term(field: &str, value: &str) -> Value {
    json!({ "match": { field: value } })
}

pub fn match_bool(field: &str, value: bool) -> Value {
    json!({ "match": { field: value } })
}

pub fn match_phrase(field: &str, value: &str) -> Value {
    json!({ "match_phrase": { field: value } })
}

pub fn multi_match_phrase(fields: &[&str], text: &str) -> Value {
    json!({ "multi_match": { "query": text, "type": "phrase", "fields": fields } })
}

pub fn match_all() -> Value {
    json!({ "match_all": {} })
}

/// A clause guaranteed to match zero documents. Used for unfilterable
/// categories, which must report zero results rather than all results.
pub fn match_none() -> Value {
    json!({ "bool": { "must_not": [ { "match_all": {} } ] } })
}

pub fn date_range(field: &str, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Value {
    let mut bounds = serde_json::Map::new();
    if let Some(from) = from {
        bounds.insert("gte".into(), json!(from.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
    if let Some(to) = to {
        bounds.insert("lte".into(), json!(to.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
    json!({ "range": { field: bounds } })
}

/// OR-union with `minimum_should_match = 1`.
pub fn any_of(clauses: Vec<Value>) -> Value {
    BoolBuilder::new().shoulds(clauses).minimum_should_match(1).build()
}

/// Builder for `bool` queries. Only non-empty occurrence lists are emitted.
#[derive(Debug, Clone, Default)]
pub struct BoolBuilder {
    must: Vec<Value>,
    should: Vec<Value>,
    must_not: Vec<Value>,
    filter: Vec<Value>,
    minimum_should_match: Option<u32>,
}

impl BoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, clause: Value) -> Self {
        self.must.push(clause);
        self
    }

    /// Append a `must` clause in place; compilation extends a query only
    /// this way.
    pub fn push_must(&mut self, clause: Value) {
        self.must.push(clause);
    }

    pub fn should(mut self, clause: Value) -> Self {
        self.should.push(clause);
        self
    }

    pub fn shoulds(mut self, clauses: Vec<Value>) -> Self {
        self.should.extend(clauses);
        self
    }

    pub fn must_not(mut self, clause: Value) -> Self {
        self.must_not.push(clause);
        self
    }

    pub fn filter(mut self, clause: Value) -> Self {
        self.filter.push(clause);
        self
    }

    pub fn minimum_should_match(mut self, n: u32) -> Self {
        self.minimum_should_match = Some(n);
        self
    }

    pub fn build(self) -> Value {
        let mut body = serde_json::Map::new();
        if !self.must.is_empty() {
            body.insert("must".into(), Value::Array(self.must));
        }
        if !self.should.is_empty() {
            body.insert("should".into(), Value::Array(self.should));
            if let Some(n) = self.minimum_should_match {
                body.insert("minimum_should_match".into(), json!(n));
            }
        }
        if !self.must_not.is_empty() {
            body.insert("must_not".into(), Value::Array(self.must_not));
        }
        if !self.filter.is_empty() {
            body.insert("filter".into(), Value::Array(self.filter));
        }
        json!({ "bool": body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_builder_emits_only_nonempty_lists() {
        let q = BoolBuilder::new().must(match_term("sentiment", "Positive")).build();
        assert_eq!(q["bool"]["must"][0]["match"]["sentiment"], "Positive");
        assert!(q["bool"].get("should").is_none());
        assert!(q["bool"].get("must_not").is_none());
    }

    #[test]
    fn any_of_sets_minimum_should_match() {
        let q = any_of(vec![match_phrase("source", "Facebook"), match_phrase("source", "Twitter")]);
        assert_eq!(q["bool"]["minimum_should_match"], 1);
        assert_eq!(q["bool"]["should"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn match_none_is_an_impossible_bool() {
        let q = match_none();
        assert_eq!(q["bool"]["must_not"][0], match_all());
    }

    #[test]
    fn date_range_bounds_are_rfc3339() {
        use chrono::TimeZone;
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        let to = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).single();
        let q = date_range("created_time", from, to);
        assert_eq!(q["range"]["created_time"]["gte"], "2024-01-01T00:00:00Z");
        assert_eq!(q["range"]["created_time"]["lte"], "2024-01-31T23:59:59Z");
    }
}
