//! Aggregation spec builders for the analytic views.

use serde_json::{json, Value};

use sonar_core::request::Interval;

use crate::compiler::TIME_FIELD;

pub fn interval_name(interval: Interval) -> &'static str {
    match interval {
        Interval::Daily => "day",
        Interval::Weekly => "week",
        Interval::Monthly => "month",
    }
}

pub fn date_histogram(interval: Interval) -> Value {
    json!({ "date_histogram": { "field": TIME_FIELD, "calendar_interval": interval_name(interval) } })
}

/// terms(emotion) -> date_histogram, for the emotion mix time-series.
pub fn emotions(interval: Interval) -> Value {
    json!({
        "emotions": {
            "terms": { "field": "emotion", "size": 20 },
            "aggs": { "over_time": date_histogram(interval) }
        }
    })
}

/// terms(sentiment) -> {trend, themes, samples}, per leaderboard category.
pub fn leaderboard(interval: Interval, sample_size: usize) -> Value {
    json!({
        "sentiments": {
            "terms": { "field": "sentiment", "size": 10 },
            "aggs": {
                "trend": date_histogram(interval),
                "themes": { "terms": { "field": "keywords", "size": 20 } },
                "samples": { "top_hits": { "size": sample_size, "sort": [ { "_score": { "order": "desc" } } ] } }
            }
        }
    })
}

/// terms(sector) -> top_hits, for the sector distribution view.
pub fn sectors(doc_limit: usize) -> Value {
    json!({
        "sectors": {
            "terms": { "field": "sector", "size": 50 },
            "aggs": { "docs": { "top_hits": { "size": doc_limit } } }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_spec_nests_histogram_under_terms() {
        let spec = emotions(Interval::Weekly);
        assert_eq!(spec["emotions"]["terms"]["field"], "emotion");
        assert_eq!(
            spec["emotions"]["aggs"]["over_time"]["date_histogram"]["calendar_interval"],
            "week"
        );
    }

    #[test]
    fn leaderboard_spec_carries_sample_size() {
        let spec = leaderboard(Interval::Daily, 5);
        assert_eq!(spec["sentiments"]["aggs"]["samples"]["top_hits"]["size"], 5);
    }
}
