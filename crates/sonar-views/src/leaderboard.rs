//! Sentiment leaderboard view.
//!
//! One query per category (bulk compile), each aggregated by sentiment
//! with trend/theme/sample sub-aggregations. Categories that could not be
//! queried at all still appear in the final board, zero-filled.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;

use sonar_core::error::Result;
use sonar_core::request::AnalyticsRequest;
use sonar_core::traits::{SearchClient, SearchRequest, SearchResponse};
use sonar_core::types::{AnalyticDocument, Category, CategorySet};
use sonar_query::compiler::{self, QueryScope};
use sonar_query::aggspec;

use crate::service::Analytics;
use crate::{buckets, document};

/// Theme sub-buckets kept per category.
const TOP_THEMES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeCount {
    pub theme: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub category: String,
    pub total_mentions: u64,
    pub average_sentiment: f64,
    pub trend: Vec<TrendCount>,
    pub top_themes: Vec<ThemeCount>,
    pub sample_reviews: Vec<AnalyticDocument>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Positive=+1, Neutral=0, Negative=-1.
pub fn sentiment_weight(sentiment: &str) -> i64 {
    match sentiment.trim().to_lowercase().as_str() {
        "positive" => 1,
        "negative" => -1,
        _ => 0,
    }
}

/// Merge per-sentiment trend series into one per-category series: counts
/// for identical dates are summed, output ascending by date.
pub fn merge_trends(series: Vec<Vec<TrendCount>>) -> Vec<TrendCount> {
    let mut by_date: BTreeMap<String, u64> = BTreeMap::new();
    for points in series {
        for p in points {
            *by_date.entry(p.date).or_insert(0) += p.count;
        }
    }
    by_date.into_iter().map(|(date, count)| TrendCount { date, count }).collect()
}

fn zero_entry(category: &str) -> LeaderboardEntry {
    LeaderboardEntry {
        category: category.to_string(),
        total_mentions: 0,
        average_sentiment: 0.0,
        trend: Vec::new(),
        top_themes: Vec::new(),
        sample_reviews: Vec::new(),
    }
}

fn entry_from(
    category: &Category,
    resp: &SearchResponse,
    sample_size: usize,
) -> LeaderboardEntry {
    let terms: Vec<String> = category.all_terms().map(str::to_string).collect();
    let sentiment_buckets = buckets::terms_buckets(&resp.aggregations, "sentiments");

    let total: u64 = sentiment_buckets.iter().map(|b| b.doc_count).sum();
    let weighted: i64 = sentiment_buckets
        .iter()
        .map(|b| sentiment_weight(&b.key) * b.doc_count as i64)
        .sum();
    let average = if total == 0 { 0.0 } else { weighted as f64 / total as f64 };

    let trend = merge_trends(
        sentiment_buckets
            .iter()
            .map(|b| {
                b.sub_buckets("trend")
                    .iter()
                    .filter_map(|t| {
                        t.day().map(|d| TrendCount {
                            date: d.format("%Y-%m-%d").to_string(),
                            count: t.doc_count,
                        })
                    })
                    .collect()
            })
            .collect(),
    );

    let mut theme_counts: HashMap<String, u64> = HashMap::new();
    for bucket in &sentiment_buckets {
        for theme in bucket.sub_buckets("themes") {
            *theme_counts.entry(theme.key).or_insert(0) += theme.doc_count;
        }
    }
    let mut top_themes: Vec<ThemeCount> = theme_counts
        .into_iter()
        .map(|(theme, count)| ThemeCount { theme, count })
        .collect();
    top_themes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.theme.cmp(&b.theme)));
    top_themes.truncate(TOP_THEMES);

    let mut samples: Vec<(f64, Value)> = sentiment_buckets
        .iter()
        .flat_map(|b| b.top_hits("samples"))
        .collect();
    samples.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    samples.truncate(sample_size);
    let sample_reviews = samples
        .iter()
        .map(|(_, source)| document::normalize(source, &terms))
        .collect();

    LeaderboardEntry {
        category: category.name.clone(),
        total_mentions: total,
        average_sentiment: average,
        trend,
        top_themes,
        sample_reviews,
    }
}

impl<C: SearchClient> Analytics<C> {
    pub async fn sentiment_leaderboard(
        &self,
        request: &AnalyticsRequest,
        categories: &CategorySet,
    ) -> Result<LeaderboardResponse> {
        let norm = request.normalize()?;
        let scope = QueryScope::from_request(&norm, Utc::now());
        let per_category = compiler::compile_per_category(categories, &scope);

        let aggs = aggspec::leaderboard(norm.interval, self.config().sample_size);
        let runs = per_category.iter().filter(|(c, _)| !c.is_unfilterable()).map(|(c, q)| {
            let search = SearchRequest::new(q.as_value().clone()).with_aggs(aggs.clone());
            async move { (c.name.clone(), self.try_run(&search).await) }
        });
        let concurrency = self.config().fetch_concurrency.max(1);
        let mut results: HashMap<String, SearchResponse> = futures::stream::iter(runs)
            .buffer_unordered(concurrency)
            .filter_map(|(name, resp)| async move { resp.map(|r| (name, r)) })
            .collect()
            .await;

        // Reassemble in set order so ties stay deterministic, zero-filled
        // categories appended after computed entries.
        let mut entries = Vec::new();
        let mut zero_fill = Vec::new();
        for (cat, _) in &per_category {
            if cat.is_unfilterable() {
                zero_fill.push(zero_entry(&cat.name));
            } else {
                match results.remove(&cat.name) {
                    Some(resp) => entries.push(entry_from(cat, &resp, self.config().sample_size)),
                    // fetch failed: degraded to a zero result, already logged
                    None => entries.push(zero_entry(&cat.name)),
                }
            }
        }
        entries.extend(zero_fill);
        entries.sort_by(|a, b| b.total_mentions.cmp(&a.total_mentions));
        Ok(LeaderboardResponse { leaderboard: entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_merge_sums_equal_dates_and_sorts() {
        let merged = merge_trends(vec![
            vec![TrendCount { date: "2024-01-01".into(), count: 3 }],
            vec![
                TrendCount { date: "2024-01-01".into(), count: 2 },
                TrendCount { date: "2024-01-02".into(), count: 1 },
            ],
        ]);
        assert_eq!(
            merged,
            vec![
                TrendCount { date: "2024-01-01".into(), count: 5 },
                TrendCount { date: "2024-01-02".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn trend_merge_of_nothing_is_empty() {
        assert!(merge_trends(Vec::new()).is_empty());
    }

    #[test]
    fn weights() {
        assert_eq!(sentiment_weight("Positive"), 1);
        assert_eq!(sentiment_weight("NEGATIVE"), -1);
        assert_eq!(sentiment_weight("Neutral"), 0);
        assert_eq!(sentiment_weight("anything else"), 0);
    }

    #[test]
    fn average_sentiment_is_weighted_by_bucket_counts() {
        let resp = SearchResponse {
            hits: Vec::new(),
            total: 10,
            aggregations: serde_json::json!({
                "sentiments": { "buckets": [
                    { "key": "Positive", "doc_count": 6 },
                    { "key": "Negative", "doc_count": 2 },
                    { "key": "Neutral", "doc_count": 2 }
                ] }
            }),
        };
        let cat = Category { name: "Cafe".into(), keywords: vec!["coffee".into()], ..Default::default() };
        let entry = entry_from(&cat, &resp, 5);
        assert_eq!(entry.total_mentions, 10);
        assert!((entry.average_sentiment - 0.4).abs() < f64::EPSILON);
    }
}
