//! Seam to the external search engine.
//!
//! The core depends on exactly one engine capability: a `search` call
//! taking a compiled query plus an aggregation spec and returning raw hits
//! and bucketed aggregations. No scroll/cursor APIs, no index mutation.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One request against the engine's search endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchRequest {
    pub query: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggs: Option<Value>,
    pub size: usize,
    pub from: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source_fields: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn new(query: Value) -> Self {
        Self { query, ..Default::default() }
    }

    pub fn with_aggs(mut self, aggs: Value) -> Self {
        self.aggs = Some(aggs);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// A single hit with its stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    #[serde(rename = "_source")]
    pub source: Value,
}

/// Engine response: raw hits plus the aggregation bucket tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub total: u64,
    #[serde(default)]
    pub aggregations: Value,
}

/// The engine boundary. Implemented by the embedded executor and by any
/// remote client a deployment substitutes for it.
pub trait SearchClient: Send + Sync {
    fn search(
        &self,
        index: &str,
        req: &SearchRequest,
    ) -> impl Future<Output = anyhow::Result<SearchResponse>> + Send;
}
