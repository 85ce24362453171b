//! Inflation narrative tracking.
//!
//! Each document carries a JSON-encoded `llm_inflation` analytic field.
//! Documents whose payload fails to parse are logged and skipped; one bad
//! document never aborts the response.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sonar_core::error::Result;
use sonar_core::request::AnalyticsRequest;
use sonar_core::traits::{SearchClient, SearchRequest};
use sonar_core::types::{AnalyticDocument, CategorySet};
use sonar_query::compiler::{self, QueryScope, TIME_FIELD};
use sonar_query::category;

use crate::document;
use crate::service::Analytics;

/// Parsed `llm_inflation` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InflationSignal {
    #[serde(default)]
    pub is_inflation_related: bool,
    #[serde(default)]
    pub inflation_trigger_phrases: Vec<String>,
    #[serde(default)]
    pub inflation_direction: Option<String>,
    #[serde(default)]
    pub inflation_sectors: Vec<String>,
    #[serde(default)]
    pub inflation_type: Option<String>,
}

pub fn parse_signal(source: &Value) -> Option<InflationSignal> {
    let raw = source.get("llm_inflation")?.as_str()?;
    match serde_json::from_str(raw) {
        Ok(signal) => Some(signal),
        Err(err) => {
            tracing::warn!(error = %err, "skipping document with unparseable inflation payload");
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhraseCount {
    pub phrase: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct DirectionCount {
    pub direction: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct SectorNarrative {
    pub sector: String,
    pub count: u64,
    pub documents: Vec<AnalyticDocument>,
}

#[derive(Debug, Serialize)]
pub struct TypeShare {
    pub inflation_type: String,
    pub count: u64,
    /// Share of the cross-type total, to two decimals.
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct InflationResponse {
    pub total_scanned: u64,
    pub inflation_related: u64,
    pub phrases: Vec<PhraseCount>,
    pub directions: Vec<DirectionCount>,
    pub sectors: Vec<SectorNarrative>,
    pub types: Vec<TypeShare>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl<C: SearchClient> Analytics<C> {
    pub async fn inflation_narratives(
        &self,
        request: &AnalyticsRequest,
        categories: &CategorySet,
    ) -> Result<InflationResponse> {
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
        let mut related: u64 = 0;
        let mut phrase_counts: HashMap<String, u64> = HashMap::new();
        let mut direction_counts: HashMap<String, u64> = HashMap::new();
        let mut sector_acc: HashMap<String, (u64, Vec<AnalyticDocument>)> = HashMap::new();
        let mut type_counts: HashMap<String, u64> = HashMap::new();

        for hit in &resp.hits {
            let Some(signal) = parse_signal(&hit.source) else { continue };
            if !signal.is_inflation_related {
                continue;
            }
            related += 1;
            for phrase in &signal.inflation_trigger_phrases {
                *phrase_counts.entry(phrase.clone()).or_insert(0) += 1;
            }
            if let Some(direction) = &signal.inflation_direction {
                *direction_counts.entry(direction.clone()).or_insert(0) += 1;
            }
            for sector in &signal.inflation_sectors {
                let slot = sector_acc.entry(sector.clone()).or_insert_with(|| (0, Vec::new()));
                slot.0 += 1;
                if slot.1.len() < doc_cap {
                    slot.1.push(document::normalize(&hit.source, &terms));
                }
            }
            if let Some(kind) = &signal.inflation_type {
                *type_counts.entry(kind.clone()).or_insert(0) += 1;
            }
        }

        let mut phrases: Vec<PhraseCount> = phrase_counts
            .into_iter()
            .map(|(phrase, count)| PhraseCount { phrase, count })
            .collect();
        phrases.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.phrase.cmp(&b.phrase)));

        let mut directions: Vec<DirectionCount> = direction_counts
            .into_iter()
            .map(|(direction, count)| DirectionCount { direction, count })
            .collect();
        directions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.direction.cmp(&b.direction)));

        let mut sectors: Vec<SectorNarrative> = sector_acc
            .into_iter()
            .map(|(sector, (count, documents))| SectorNarrative { sector, count, documents })
            .collect();
        sectors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sector.cmp(&b.sector)));

        let type_total: u64 = type_counts.values().sum();
        let mut types: Vec<TypeShare> = type_counts
            .into_iter()
            .map(|(inflation_type, count)| TypeShare {
                inflation_type,
                count,
                percentage: if type_total == 0 {
                    0.0
                } else {
                    round2(count as f64 / type_total as f64 * 100.0)
                },
            })
            .collect();
        types.sort_by(|a, b| {
            b.percentage
                .partial_cmp(&a.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.inflation_type.cmp(&b.inflation_type))
        });

        Ok(InflationResponse {
            total_scanned: resp.hits.len() as u64,
            inflation_related: related,
            phrases,
            directions,
            sectors,
            types,
        })
    }
}
