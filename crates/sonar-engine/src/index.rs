//! JSON document indexer for the embedded engine.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use tantivy::{Index, TantivyDocument};

use crate::schema::{build_schema, register_tokenizer, FieldTable};

pub struct SocialIndexer {
    index: Index,
    fields: FieldTable,
}

impl SocialIndexer {
    /// Create a fresh index at `index_dir`, wiping any previous one.
    pub fn create(index_dir: &Path) -> Result<Self> {
        let schema = build_schema();
        if index_dir.exists() {
            std::fs::remove_dir_all(index_dir)?;
        }
        std::fs::create_dir_all(index_dir)?;
        let index = Index::create_in_dir(index_dir, schema.clone())?;
        register_tokenizer(&index);
        let fields = FieldTable::from_schema(&schema)?;
        Ok(Self { index, fields })
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Index a batch of raw JSON documents; one commit per batch.
    pub fn add_documents(&self, docs: &[Value]) -> Result<usize> {
        let mut writer = self.index.writer(50_000_000)?;
        let mut count = 0;
        for source in docs {
            writer.add_document(self.to_tantivy(source))?;
            count += 1;
        }
        writer.commit()?;
        Ok(count)
    }

    fn to_tantivy(&self, source: &Value) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        if let Some(id) = source["id"].as_str() {
            doc.add_text(self.fields.id, id);
        }
        for (name, field) in &self.fields.text {
            match &source[name.as_str()] {
                Value::String(s) => doc.add_text(*field, s),
                Value::Array(items) => {
                    for item in items.iter().filter_map(Value::as_str) {
                        doc.add_text(*field, item);
                    }
                }
                Value::Bool(b) => doc.add_text(*field, if *b { "true" } else { "false" }),
                Value::Number(n) => doc.add_text(*field, n.to_string()),
                _ => {}
            }
        }
        if let Some(ts) = parse_timestamp(&source["created_time"]) {
            doc.add_i64(self.fields.created_time, ts.timestamp());
        }
        doc.add_text(self.fields.payload, source.to_string());
        doc
    }
}

/// Accept RFC3339 timestamps, bare `YYYY-MM-DD` days, or numeric epochs
/// (seconds or milliseconds).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => {
            if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
                return Some(ts.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        }
        Value::Number(n) => {
            let raw = n.as_i64()?;
            let secs = if raw.abs() >= 100_000_000_000 { raw / 1000 } else { raw };
            DateTime::<Utc>::from_timestamp(secs, 0)
        }
        _ => None,
    }
}
