use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

use sonar_core::request::AnalyticsRequest;
use sonar_core::types::{Category, CategorySet};
use sonar_query::category::{self, CategoryMatch};
use sonar_query::compiler::{self, QueryScope};
use sonar_query::routing;

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single().expect("valid timestamp")
}

fn compile_request(body: Value, set: &CategorySet) -> compiler::CompiledQuery {
    let req: AnalyticsRequest = serde_json::from_value(body).expect("request shape");
    let norm = req.normalize().expect("normalization");
    let matched = category::resolve(&norm.category, set);
    let scope = QueryScope::from_request(&norm, fixed_now());
    compiler::compile(&matched, set, &scope)
}

fn must_clauses(q: &compiler::CompiledQuery) -> Vec<Value> {
    q.as_value()["bool"]["must"].as_array().cloned().unwrap_or_default()
}

fn sample_set() -> CategorySet {
    vec![
        Category {
            name: "Banking".into(),
            keywords: vec!["interest rate".into()],
            hashtags: vec!["#banking".into()],
            ..Default::default()
        },
        Category { name: "Empty".into(), ..Default::default() },
    ]
    .into_iter()
    .collect()
}

#[test]
fn default_time_window_is_90_days_in_the_compiled_range_clause() {
    let q = compile_request(json!({ "topicId": 999 }), &sample_set());
    let range = must_clauses(&q)
        .into_iter()
        .find(|c| c.get("range").is_some())
        .expect("range clause");
    let expected_from = (fixed_now() - Duration::days(90))
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    assert_eq!(range["range"]["created_time"]["gte"], expected_from);
}

#[test]
fn wide_range_topic_compiles_no_range_clause() {
    let q = compile_request(json!({ "topicId": 103 }), &sample_set());
    assert!(must_clauses(&q).iter().all(|c| c.get("range").is_none()));
}

#[test]
fn linkedin_only_topic_routes_exactly_two_source_phrases() {
    let q = compile_request(json!({ "topicId": 204 }), &sample_set());
    let source = must_clauses(&q)
        .into_iter()
        .find(|c| {
            c["bool"]["should"]
                .as_array()
                .is_some_and(|s| s.iter().any(|v| v.get("match_phrase").is_some()
                    && v["match_phrase"].get("source").is_some()))
        })
        .expect("source clause");
    let platforms: Vec<&str> = source["bool"]["should"]
        .as_array()
        .expect("should")
        .iter()
        .filter_map(|v| v["match_phrase"]["source"].as_str())
        .collect();
    assert_eq!(platforms, vec!["LinkedIn", "Linkedin"]);
}

#[test]
fn explicit_sources_override_topic_rules() {
    let q = compile_request(json!({ "topicId": 204, "source": "Reddit" }), &sample_set());
    let rendered = q.as_value().to_string();
    assert!(rendered.contains("Reddit"));
    assert!(!rendered.contains("LinkedIn"));
}

#[test]
fn empty_category_matches_nothing_regardless_of_other_filters() {
    let q = compile_request(
        json!({
            "topicId": 118,
            "category": "Empty",
            "sentiment": "Positive",
            "timeSlot": "last7days"
        }),
        &sample_set(),
    );
    let must = must_clauses(&q);
    assert_eq!(must[0]["bool"]["must_not"][0], json!({ "match_all": {} }));
}

#[test]
fn public_opinion_topic_appends_mandatory_clause_last() {
    assert!(routing::PUBLIC_OPINION_TOPICS.contains(&118));
    let q = compile_request(json!({ "topicId": 118 }), &sample_set());
    let must = must_clauses(&q);
    let last = must.last().expect("clauses");
    assert_eq!(last["match"]["is_public_opinion"], true);
}

#[test]
fn category_resolution_feeds_the_compiler() {
    let set = sample_set();
    match category::resolve("banking", &set) {
        CategoryMatch::Single(c) => assert_eq!(c.name, "Banking"),
        other => panic!("unexpected: {other:?}"),
    }
    let q = compile_request(json!({ "topicId": 999, "category": "banking" }), &set);
    let rendered = q.as_value().to_string();
    assert!(rendered.contains("interest rate"));
    assert!(rendered.contains("#banking"));
}
