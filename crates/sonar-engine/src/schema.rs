//! Index schema for social documents.
//!
//! Every text-bearing field is indexed with a lowercasing tokenizer so the
//! translated queries match case-insensitively; the original document is
//! kept verbatim in a stored `payload` field and returned as `_source`.

use std::collections::HashMap;

use tantivy::schema::{
    IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};
use tantivy::Index;

pub const TOKENIZER_NAME: &str = "social_text";

/// Indexed text fields, matching the fields the compiler targets.
pub const TEXT_FIELDS: &[&str] = &[
    "message_text",
    "content",
    "title",
    "keywords",
    "hashtags",
    "source",
    "source_url",
    "expanded_url",
    "sentiment",
    "emotion",
    "llm_mention_type",
    "user_name",
    "display_name",
    "category_tag",
    "sector",
    "is_public_opinion",
];

pub const TIME_FIELD: &str = "created_time";
pub const PAYLOAD_FIELD: &str = "payload";
pub const ID_FIELD: &str = "id";

pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    let _id = schema_builder.add_text_field(ID_FIELD, STRING | STORED);
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER_NAME)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default().set_indexing_options(indexing);
    for field in TEXT_FIELDS {
        let _ = schema_builder.add_text_field(field, text_options.clone());
    }
    let _time = schema_builder.add_i64_field(TIME_FIELD, INDEXED | STORED | FAST);
    let _payload = schema_builder.add_text_field(PAYLOAD_FIELD, STORED);
    schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
    let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .build();
    index.tokenizers().register(TOKENIZER_NAME, tokenizer);
}

/// Resolved field handles, looked up once per open index.
#[derive(Debug, Clone)]
pub struct FieldTable {
    pub id: tantivy::schema::Field,
    pub text: HashMap<String, tantivy::schema::Field>,
    pub created_time: tantivy::schema::Field,
    pub payload: tantivy::schema::Field,
}

impl FieldTable {
    pub fn from_schema(schema: &Schema) -> anyhow::Result<Self> {
        let mut text = HashMap::new();
        for field in TEXT_FIELDS {
            text.insert((*field).to_string(), schema.get_field(field)?);
        }
        Ok(Self {
            id: schema.get_field(ID_FIELD)?,
            text,
            created_time: schema.get_field(TIME_FIELD)?,
            payload: schema.get_field(PAYLOAD_FIELD)?,
        })
    }
}
