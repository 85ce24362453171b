//! Aggregation execution over matched documents.
//!
//! Walks the terms / date_histogram / top_hits spec the compiler built and
//! evaluates it over the matched documents, emitting the same bucket-tree
//! JSON shape a remote engine returns.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde_json::{json, Map, Value};

use crate::index::parse_timestamp;
use crate::schema::TIME_FIELD;

#[derive(Debug, Clone, Copy)]
pub struct ScoredDoc<'a> {
    pub score: f32,
    pub source: &'a Value,
}

pub fn execute(spec: &Value, docs: &[ScoredDoc]) -> Value {
    let mut out = Map::new();
    if let Some(obj) = spec.as_object() {
        for (name, agg) in obj {
            if let Some(result) = execute_one(agg, docs) {
                out.insert(name.clone(), result);
            }
        }
    }
    Value::Object(out)
}

fn execute_one(agg: &Value, docs: &[ScoredDoc]) -> Option<Value> {
    if agg.get("terms").is_some() {
        Some(terms_agg(&agg["terms"], agg.get("aggs"), docs))
    } else if agg.get("date_histogram").is_some() {
        Some(date_histogram_agg(&agg["date_histogram"], agg.get("aggs"), docs))
    } else if agg.get("top_hits").is_some() {
        Some(top_hits_agg(&agg["top_hits"], docs))
    } else {
        tracing::warn!(spec = %agg, "ignoring unsupported aggregation");
        None
    }
}

fn terms_agg(terms: &Value, sub: Option<&Value>, docs: &[ScoredDoc]) -> Value {
    let Some(field) = terms["field"].as_str() else {
        return json!({ "buckets": [] });
    };
    let size = terms["size"].as_u64().unwrap_or(10) as usize;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ScoredDoc>> = HashMap::new();
    for doc in docs {
        for key in field_keys(&doc.source[field]) {
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(*doc);
        }
    }

    let mut keyed: Vec<(String, Vec<ScoredDoc>)> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key).map(|members| (key, members)))
        .collect();
    keyed.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
    keyed.truncate(size);

    let buckets: Vec<Value> = keyed
        .into_iter()
        .map(|(key, members)| bucket(json!(key), None, &members, sub))
        .collect();
    json!({ "buckets": buckets })
}

fn date_histogram_agg(histogram: &Value, sub: Option<&Value>, docs: &[ScoredDoc]) -> Value {
    let field = histogram["field"].as_str().unwrap_or(TIME_FIELD);
    let interval = histogram["calendar_interval"]
        .as_str()
        .or_else(|| histogram["fixed_interval"].as_str())
        .unwrap_or("day");

    let mut groups: BTreeMap<NaiveDate, Vec<ScoredDoc>> = BTreeMap::new();
    for doc in docs {
        let Some(ts) = parse_timestamp(&doc.source[field]) else { continue };
        groups.entry(bucket_start(ts.date_naive(), interval)).or_default().push(*doc);
    }

    let buckets: Vec<Value> = groups
        .into_iter()
        .map(|(day, members)| {
            let start = day.and_time(NaiveTime::MIN).and_utc();
            bucket(
                json!(start.timestamp_millis()),
                Some(format!("{}T00:00:00Z", day.format("%Y-%m-%d"))),
                &members,
                sub,
            )
        })
        .collect();
    json!({ "buckets": buckets })
}

fn bucket(key: Value, key_as_string: Option<String>, members: &[ScoredDoc], sub: Option<&Value>) -> Value {
    let mut body = Map::new();
    body.insert("key".into(), key);
    if let Some(s) = key_as_string {
        body.insert("key_as_string".into(), json!(s));
    }
    body.insert("doc_count".into(), json!(members.len() as u64));
    if let Some(sub_spec) = sub {
        if let Value::Object(nested) = execute(sub_spec, members) {
            body.extend(nested);
        }
    }
    Value::Object(body)
}

fn top_hits_agg(top_hits: &Value, docs: &[ScoredDoc]) -> Value {
    let size = top_hits["size"].as_u64().unwrap_or(3) as usize;
    let mut ordered: Vec<ScoredDoc> = docs.to_vec();
    if sort_field(top_hits) == Some(TIME_FIELD) {
        ordered.sort_by_key(|d| {
            std::cmp::Reverse(
                parse_timestamp(&d.source[TIME_FIELD]).map(|t| t.timestamp()).unwrap_or(i64::MIN),
            )
        });
    } else {
        ordered.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    }
    ordered.truncate(size);
    let hits: Vec<Value> = ordered
        .into_iter()
        .map(|d| json!({ "_score": d.score, "_source": d.source.clone() }))
        .collect();
    json!({ "hits": { "total": hits.len() as u64, "hits": hits } })
}

fn sort_field(top_hits: &Value) -> Option<&str> {
    top_hits["sort"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(Value::as_object)
        .and_then(|obj| obj.keys().next())
        .map(String::as_str)
}

/// Values a terms aggregation groups a document under.
fn field_keys(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Bool(b) => vec![if *b { "true" } else { "false" }.to_string()],
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

/// The calendar bucket a day belongs to: the day itself, the ISO week's
/// Monday, or the first of the month.
fn bucket_start(day: NaiveDate, interval: &str) -> NaiveDate {
    match interval {
        "week" | "1w" | "7d" => day - Duration::days(i64::from(day.weekday().num_days_from_monday())),
        "month" | "1M" => NaiveDate::from_ymd_opt(day.year(), day.month(), 1).unwrap_or(day),
        _ => day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_then_histogram_counts() {
        let a = json!({ "emotion": "joy", "created_time": "2024-01-01T10:00:00Z" });
        let b = json!({ "emotion": "joy", "created_time": "2024-01-02T10:00:00Z" });
        let c = json!({ "emotion": "anger", "created_time": "2024-01-01T11:00:00Z" });
        let docs: Vec<ScoredDoc> =
            [&a, &b, &c].into_iter().map(|v| ScoredDoc { score: 1.0, source: v }).collect();
        let spec = json!({
            "emotions": {
                "terms": { "field": "emotion", "size": 20 },
                "aggs": { "over_time": { "date_histogram": { "field": "created_time", "calendar_interval": "day" } } }
            }
        });
        let out = execute(&spec, &docs);
        let buckets = out["emotions"]["buckets"].as_array().expect("buckets");
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0]["key"], "joy");
        assert_eq!(buckets[0]["doc_count"], 2);
        let days = buckets[0]["over_time"]["buckets"].as_array().expect("days");
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["key_as_string"], "2024-01-01T00:00:00Z");
        assert_eq!(days[0]["doc_count"], 1);
    }

    #[test]
    fn weekly_buckets_align_to_monday() {
        // 2024-01-03 is a Wednesday
        let wed = NaiveDate::from_ymd_opt(2024, 1, 3).expect("date");
        assert_eq!(bucket_start(wed, "week"), NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"));
        assert_eq!(bucket_start(wed, "month"), NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"));
        assert_eq!(bucket_start(wed, "day"), wed);
    }

    #[test]
    fn array_fields_count_each_element() {
        let a = json!({ "keywords": ["espresso", "latte"] });
        let docs: Vec<ScoredDoc> = vec![ScoredDoc { score: 1.0, source: &a }];
        let out = execute(&json!({ "themes": { "terms": { "field": "keywords" } } }), &docs);
        assert_eq!(out["themes"]["buckets"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn top_hits_orders_by_score_by_default() {
        let a = json!({ "id": "low" });
        let b = json!({ "id": "high" });
        let docs = vec![
            ScoredDoc { score: 0.5, source: &a },
            ScoredDoc { score: 2.0, source: &b },
        ];
        let out = top_hits_agg(&json!({ "size": 1 }), &docs);
        assert_eq!(out["hits"]["hits"][0]["_source"]["id"], "high");
    }
}
