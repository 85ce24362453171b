//! Read-only walk of the engine's aggregation bucket tree.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::Value;

use sonar_core::request::Interval;
use sonar_query::window::{end_of_day, start_of_day};

/// One bucket of a terms or date-histogram aggregation, with its nested
/// sub-aggregations kept as raw JSON. Consumed once per response.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub key: String,
    pub key_as_string: Option<String>,
    pub doc_count: u64,
    sub: Value,
}

impl Bucket {
    fn parse(value: &Value) -> Bucket {
        let key = match &value["key"] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        Bucket {
            key,
            key_as_string: value["key_as_string"].as_str().map(str::to_string),
            doc_count: value["doc_count"].as_u64().unwrap_or(0),
            sub: value.clone(),
        }
    }

    /// Buckets of a nested sub-aggregation.
    pub fn sub_buckets(&self, name: &str) -> Vec<Bucket> {
        terms_buckets(&self.sub, name)
    }

    /// `_source` documents of a nested `top_hits` sub-aggregation, paired
    /// with their scores.
    pub fn top_hits(&self, name: &str) -> Vec<(f64, Value)> {
        self.sub[name]["hits"]["hits"]
            .as_array()
            .map(|hits| {
                hits.iter()
                    .map(|h| (h["_score"].as_f64().unwrap_or(0.0), h["_source"].clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The literal calendar day of a date-histogram bucket, re-derived
    /// from `key_as_string` (falling back to an epoch-millis key).
    pub fn day(&self) -> Option<NaiveDate> {
        if let Some(raw) = &self.key_as_string {
            let day_part = raw.split('T').next().unwrap_or(raw);
            if let Ok(day) = NaiveDate::parse_from_str(day_part, "%Y-%m-%d") {
                return Some(day);
            }
        }
        let millis: i64 = self.key.parse().ok()?;
        DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
    }
}

/// Top-level (or nested) terms/histogram buckets under `name`.
pub fn terms_buckets(aggregations: &Value, name: &str) -> Vec<Bucket> {
    aggregations[name]["buckets"]
        .as_array()
        .map(|arr| arr.iter().map(Bucket::parse).collect())
        .unwrap_or_default()
}

/// The closed `[start, end]` span a histogram bucket starting at `day`
/// covers for the given interval.
pub fn bucket_span(day: NaiveDate, interval: Interval) -> (DateTime<Utc>, DateTime<Utc>) {
    let last_day = match interval {
        Interval::Daily => day,
        Interval::Weekly => day + chrono::Duration::days(6),
        Interval::Monthly => {
            let (year, month) = if day.month() == 12 { (day.year() + 1, 1) } else { (day.year(), day.month() + 1) };
            NaiveDate::from_ymd_opt(year, month, 1)
                .map(|first| first - chrono::Duration::days(1))
                .unwrap_or(day)
        }
    };
    (start_of_day(day), end_of_day(last_day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_terms_and_nested_histogram() {
        let aggs = json!({
            "emotions": { "buckets": [
                { "key": "joy", "doc_count": 7, "over_time": { "buckets": [
                    { "key": 1704067200000i64, "key_as_string": "2024-01-01T00:00:00Z", "doc_count": 4 }
                ] } }
            ] }
        });
        let top = terms_buckets(&aggs, "emotions");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].key, "joy");
        assert_eq!(top[0].doc_count, 7);
        let nested = top[0].sub_buckets("over_time");
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].day(), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn day_falls_back_to_epoch_key() {
        let aggs = json!({ "t": { "buckets": [ { "key": 1704067200000i64, "doc_count": 1 } ] } });
        let b = &terms_buckets(&aggs, "t")[0];
        assert_eq!(b.day(), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn monthly_span_covers_the_calendar_month() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).expect("date");
        let (start, end) = bucket_span(day, Interval::Monthly);
        assert_eq!(start.date_naive().day(), 1);
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).expect("leap day"));
    }

    #[test]
    fn december_monthly_span_rolls_the_year() {
        let day = NaiveDate::from_ymd_opt(2023, 12, 1).expect("date");
        let (_, end) = bucket_span(day, Interval::Monthly);
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2023, 12, 31).expect("date"));
    }
}
