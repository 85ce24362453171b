//! Institutional-trust tone view.
//!
//! Each document carries a JSON-encoded `trust_dimensions` field mapping
//! an institutional dimension to a tone, e.g.
//! `{"government":"Supportive","media":"Distrustful"}`. Unparseable
//! payloads are logged and skipped.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use sonar_core::error::Result;
use sonar_core::request::AnalyticsRequest;
use sonar_core::traits::{SearchClient, SearchRequest};
use sonar_core::types::{AnalyticDocument, CategorySet};
use sonar_query::compiler::{self, QueryScope, TIME_FIELD};
use sonar_query::category;

use crate::document;
use crate::service::Analytics;

/// The tone vocabulary produced upstream.
pub const TONES: &[&str] = &["Supportive", "Distrustful", "Neutral", "Mixed", "Not Applicable"];

pub fn parse_tones(source: &Value) -> Option<HashMap<String, String>> {
    let raw = source.get("trust_dimensions")?.as_str()?;
    match serde_json::from_str(raw) {
        Ok(tones) => Some(tones),
        Err(err) => {
            tracing::warn!(error = %err, "skipping document with unparseable trust payload");
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToneCount {
    pub tone: String,
    pub count: u64,
    /// `round(count / total * 100)` within the dimension.
    pub percentage: u64,
}

#[derive(Debug, Serialize)]
pub struct DimensionTones {
    pub dimension: String,
    pub total: u64,
    pub tones: Vec<ToneCount>,
    pub documents: Vec<AnalyticDocument>,
}

#[derive(Debug, Serialize)]
pub struct TrustResponse {
    pub dimensions: Vec<DimensionTones>,
}

impl<C: SearchClient> Analytics<C> {
    pub async fn trust_tones(
        &self,
        request: &AnalyticsRequest,
        categories: &CategorySet,
    ) -> Result<TrustResponse> {
        let norm = request.normalize()?;
        let matched = category::resolve(&norm.category, categories);
        let scope = QueryScope::from_request(&norm, Utc::now());
        let compiled = compiler::compile(&matched, categories, &scope);
        let terms = document::active_terms(&matched, categories);

        let search = SearchRequest::new(compiled.into_value())
            .with_size(self.config().scan_limit)
            .with_sort(json!([ { TIME_FIELD: { "order": "desc" } } ]));
        let resp = self.run(&search).await?;

        let doc_cap = self.config().bucket_doc_limit;
        let mut acc: HashMap<String, (HashMap<String, u64>, Vec<AnalyticDocument>)> =
            HashMap::new();
        for hit in &resp.hits {
            let Some(tones) = parse_tones(&hit.source) else { continue };
            for (dimension, tone) in tones {
                let slot = acc.entry(dimension).or_default();
                *slot.0.entry(tone).or_insert(0) += 1;
                if slot.1.len() < doc_cap {
                    slot.1.push(document::normalize(&hit.source, &terms));
                }
            }
        }

        let mut dimensions: Vec<DimensionTones> = acc
            .into_iter()
            .map(|(dimension, (tone_counts, documents))| {
                let total: u64 = tone_counts.values().sum();
                let mut tones: Vec<ToneCount> = tone_counts
                    .into_iter()
                    .map(|(tone, count)| ToneCount {
                        tone,
                        count,
                        percentage: if total == 0 {
                            0
                        } else {
                            (count as f64 / total as f64 * 100.0).round() as u64
                        },
                    })
                    .collect();
                tones.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tone.cmp(&b.tone)));
                DimensionTones { dimension, total, tones, documents }
            })
            .collect();
        dimensions.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.dimension.cmp(&b.dimension)));
        Ok(TrustResponse { dimensions })
    }
}
