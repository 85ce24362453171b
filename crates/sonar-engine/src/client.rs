//! Embedded tantivy-backed implementation of the engine boundary.
//!
//! Collects every match up to a fixed window, reassembles the stored JSON
//! payloads, windows the hits and evaluates the aggregation spec over the
//! full match set. A production deployment swaps this for a remote client
//! behind the same `SearchClient` trait.

use std::path::Path;

use anyhow::Result;
use serde_json::Value;
use tantivy::collector::{Count, TopDocs};
use tantivy::schema::Value as _;
use tantivy::{Index, IndexReader, TantivyDocument};

use sonar_core::traits::{SearchClient, SearchHit, SearchRequest, SearchResponse};

use crate::aggs::{self, ScoredDoc};
use crate::index::parse_timestamp;
use crate::schema::{register_tokenizer, FieldTable, TIME_FIELD};
use crate::translate;

/// Matched-document window per query.
const COLLECT_LIMIT: usize = 10_000;

pub struct EmbeddedEngine {
    reader: IndexReader,
    fields: FieldTable,
}

impl EmbeddedEngine {
    pub fn open(index_dir: &Path) -> Result<Self> {
        let index = Index::open_in_dir(index_dir)?;
        register_tokenizer(&index);
        Self::from_index(&index)
    }

    pub fn from_index(index: &Index) -> Result<Self> {
        let reader = index.reader()?;
        let fields = FieldTable::from_schema(&index.schema())?;
        Ok(Self { reader, fields })
    }

    fn execute(&self, req: &SearchRequest) -> Result<SearchResponse> {
        let searcher = self.reader.searcher();
        let query = translate::translate(&self.fields, &req.query)?;
        let limit = COLLECT_LIMIT.max(req.from + req.size).max(1);
        let (top, total) = searcher.search(&*query, &(TopDocs::with_limit(limit), Count))?;

        let mut matched: Vec<(f32, Value)> = Vec::with_capacity(top.len());
        for (score, addr) in top {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let payload =
                doc.get_first(self.fields.payload).and_then(|v| v.as_str()).unwrap_or("{}");
            match serde_json::from_str(payload) {
                Ok(source) => matched.push((score, source)),
                Err(err) => tracing::warn!(error = %err, "dropping hit with unreadable payload"),
            }
        }
        sort_matched(&mut matched, req.sort.as_ref());

        let aggregations = match &req.aggs {
            Some(spec) => {
                let scored: Vec<ScoredDoc> =
                    matched.iter().map(|(s, v)| ScoredDoc { score: *s, source: v }).collect();
                aggs::execute(spec, &scored)
            }
            None => Value::Null,
        };

        let hits = matched
            .iter()
            .skip(req.from)
            .take(req.size)
            .map(|(score, source)| SearchHit {
                id: source["id"].as_str().unwrap_or_default().to_string(),
                score: *score,
                source: source.clone(),
            })
            .collect();
        Ok(SearchResponse { hits, total: total as u64, aggregations })
    }
}

/// `TopDocs` already yields score-descending order; only an explicit
/// `created_time` sort needs a re-sort here.
fn sort_matched(matched: &mut [(f32, Value)], sort: Option<&Value>) {
    let by_time = sort
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .is_some_and(|first| first.get(TIME_FIELD).is_some());
    if by_time {
        matched.sort_by_key(|(_, source)| {
            std::cmp::Reverse(
                parse_timestamp(&source[TIME_FIELD]).map(|t| t.timestamp()).unwrap_or(i64::MIN),
            )
        });
    }
}

impl SearchClient for EmbeddedEngine {
    async fn search(&self, _index: &str, req: &SearchRequest) -> Result<SearchResponse> {
        // single-index engine: the index name is part of the remote
        // contract and ignored here
        self.execute(req)
    }
}
