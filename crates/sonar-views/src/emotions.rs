//! Emotion mix time-series view.
//!
//! terms(emotion) -> date_histogram, then one capped document fetch per
//! `(emotion, bucket)` pair. When a fetch succeeds the returned count
//! replaces the aggregation's count, so UI counts always equal the number
//! of attached documents; when it fails the aggregation count stands and
//! the time series keeps its shape.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use sonar_core::error::Result;
use sonar_core::request::AnalyticsRequest;
use sonar_core::traits::{SearchClient, SearchRequest};
use sonar_core::types::{AnalyticDocument, CategorySet};
use sonar_query::clause::{self, BoolBuilder};
use sonar_query::compiler::{self, QueryScope, TIME_FIELD};
use sonar_query::{aggspec, category};

use crate::fetch::{self, BucketFetch};
use crate::service::Analytics;
use crate::{buckets, document};

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub count: u64,
    pub documents: Vec<AnalyticDocument>,
}

#[derive(Debug, Serialize)]
pub struct EmotionSeries {
    pub emotion: String,
    pub total: u64,
    pub trend: Vec<TrendPoint>,
}

#[derive(Debug, Serialize)]
pub struct EmotionsResponse {
    pub emotions: Vec<EmotionSeries>,
}

impl<C: SearchClient> Analytics<C> {
    pub async fn emotion_mix(
        &self,
        request: &AnalyticsRequest,
        categories: &CategorySet,
    ) -> Result<EmotionsResponse> {
        let norm = request.normalize()?;
        let matched = category::resolve(&norm.category, categories);
        let scope = QueryScope::from_request(&norm, Utc::now());
        let compiled = compiler::compile(&matched, categories, &scope);
        let terms = document::active_terms(&matched, categories);

        let search = SearchRequest::new(compiled.as_value().clone())
            .with_aggs(aggspec::emotions(norm.interval));
        let resp = self.run(&search).await?;

        let emotion_buckets = buckets::terms_buckets(&resp.aggregations, "emotions");
        let mut jobs = Vec::new();
        for emotion in &emotion_buckets {
            for slot in emotion.sub_buckets("over_time") {
                let Some(day) = slot.day() else {
                    tracing::warn!(key = %slot.key, "skipping histogram bucket without a date");
                    continue;
                };
                let (from, to) = buckets::bucket_span(day, norm.interval);
                let query = BoolBuilder::new()
                    .must(compiled.as_value().clone())
                    .must(clause::match_term("emotion", &emotion.key))
                    .must(clause::date_range(TIME_FIELD, Some(from), Some(to)))
                    .build();
                jobs.push(BucketFetch {
                    key: emotion.key.clone(),
                    date: day.format("%Y-%m-%d").to_string(),
                    agg_count: slot.doc_count,
                    request: SearchRequest::new(query)
                        .with_size(self.config().bucket_doc_limit)
                        .with_sort(json!([ { TIME_FIELD: { "order": "desc" } } ])),
                });
            }
        }

        let fetched = fetch::fetch_all(self, jobs, &terms).await;
        let mut by_emotion: HashMap<String, Vec<TrendPoint>> = HashMap::new();
        for bucket in fetched {
            let (count, documents) = match bucket.docs {
                Some(docs) => (docs.len() as u64, docs),
                None => (bucket.agg_count, Vec::new()),
            };
            by_emotion
                .entry(bucket.key)
                .or_default()
                .push(TrendPoint { date: bucket.date, count, documents });
        }

        let emotions = emotion_buckets
            .iter()
            .map(|e| {
                let mut trend = by_emotion.remove(&e.key).unwrap_or_default();
                trend.sort_by(|a, b| a.date.cmp(&b.date));
                let total = trend.iter().map(|p| p.count).sum();
                EmotionSeries { emotion: e.key.clone(), total, trend }
            })
            .collect();
        Ok(EmotionsResponse { emotions })
    }
}
