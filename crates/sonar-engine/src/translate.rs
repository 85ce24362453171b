//! Compiled boolean tree -> tantivy queries.
//!
//! The compiler emits `minimum_should_match = 1` only on bool groups that
//! contain nothing but `should` clauses; a tantivy `BooleanQuery` with
//! only Should clauses already requires at least one to match, so the
//! option needs no explicit handling here.

use std::ops::Bound;

use anyhow::{bail, Result};
use serde_json::Value;
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, Occur, PhraseQuery, Query, RangeQuery, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

use crate::index::parse_timestamp;
use crate::schema::{FieldTable, TIME_FIELD};

pub fn translate(fields: &FieldTable, query: &Value) -> Result<Box<dyn Query>> {
    let Some(obj) = query.as_object() else {
        bail!("query clause must be an object");
    };
    let Some((kind, body)) = obj.iter().next() else {
        return Ok(Box::new(AllQuery));
    };
    match kind.as_str() {
        "match_all" => Ok(Box::new(AllQuery)),
        "bool" => translate_bool(fields, body),
        "match" => {
            let (field, value) = single_entry(body)?;
            all_tokens_query(fields, field, &scalar_text(value)?)
        }
        "match_phrase" => {
            let (field, value) = single_entry(body)?;
            phrase_query(fields, field, &scalar_text(value)?)
        }
        "multi_match" => translate_multi_match(fields, body),
        "range" => translate_range(fields, body),
        other => bail!("unsupported query clause: {other}"),
    }
}

fn translate_bool(fields: &FieldTable, body: &Value) -> Result<Box<dyn Query>> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for clause in list(body, "must").iter().chain(list(body, "filter").iter()) {
        clauses.push((Occur::Must, translate(fields, clause)?));
    }
    for clause in list(body, "should") {
        clauses.push((Occur::Should, translate(fields, &clause)?));
    }
    let must_not = list(body, "must_not");
    let has_positive = !clauses.is_empty();
    if !must_not.is_empty() && !has_positive {
        // exclusion-only bool: everything except the excluded set
        clauses.push((Occur::Must, Box::new(AllQuery)));
    }
    for clause in must_not {
        clauses.push((Occur::MustNot, translate(fields, &clause)?));
    }
    if clauses.is_empty() {
        return Ok(Box::new(AllQuery));
    }
    Ok(Box::new(BooleanQuery::new(clauses)))
}

fn translate_multi_match(fields: &FieldTable, body: &Value) -> Result<Box<dyn Query>> {
    let Some(text) = body["query"].as_str() else {
        bail!("multi_match requires a query string");
    };
    let Some(field_names) = body["fields"].as_array() else {
        bail!("multi_match requires a field list");
    };
    let mut shoulds: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for name in field_names.iter().filter_map(Value::as_str) {
        shoulds.push((Occur::Should, phrase_query(fields, name, text)?));
    }
    if shoulds.is_empty() {
        return Ok(Box::new(EmptyQuery));
    }
    Ok(Box::new(BooleanQuery::new(shoulds)))
}

fn translate_range(fields: &FieldTable, body: &Value) -> Result<Box<dyn Query>> {
    let (field_name, bounds) = single_entry(body)?;
    if field_name != TIME_FIELD {
        bail!("range is only supported on {TIME_FIELD}");
    }
    let lower = match bounds.get("gte") {
        Some(raw) => Bound::Included(time_term(fields.created_time, raw)?),
        None => Bound::Unbounded,
    };
    let upper = match bounds.get("lte") {
        Some(raw) => Bound::Included(time_term(fields.created_time, raw)?),
        None => Bound::Unbounded,
    };
    Ok(Box::new(RangeQuery::new(lower, upper)))
}

fn time_term(field: Field, raw: &Value) -> Result<Term> {
    let Some(ts) = parse_timestamp(raw) else {
        bail!("unparseable range bound: {raw}");
    };
    Ok(Term::from_field_i64(field, ts.timestamp()))
}

/// `match`: every token of the value must be present.
fn all_tokens_query(fields: &FieldTable, field_name: &str, text: &str) -> Result<Box<dyn Query>> {
    let field = lookup(fields, field_name)?;
    let terms = tokenize(field, text);
    match terms.len() {
        0 => Ok(Box::new(EmptyQuery)),
        1 => Ok(term_query(terms.into_iter().next().ok_or_else(|| anyhow::anyhow!("empty terms"))?)),
        _ => Ok(Box::new(BooleanQuery::new(
            terms.into_iter().map(|t| (Occur::Must, term_query(t))).collect(),
        ))),
    }
}

fn phrase_query(fields: &FieldTable, field_name: &str, text: &str) -> Result<Box<dyn Query>> {
    let field = lookup(fields, field_name)?;
    let terms = tokenize(field, text);
    match terms.len() {
        0 => Ok(Box::new(EmptyQuery)),
        1 => Ok(term_query(terms.into_iter().next().ok_or_else(|| anyhow::anyhow!("empty terms"))?)),
        _ => Ok(Box::new(PhraseQuery::new(terms))),
    }
}

fn term_query(term: Term) -> Box<dyn Query> {
    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqsAndPositions))
}

/// Mirrors the index-side analyzer: alphanumeric runs, lowercased.
fn tokenize(field: Field, text: &str) -> Vec<Term> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| !tok.is_empty())
        .map(|tok| Term::from_field_text(field, tok))
        .collect()
}

fn lookup(fields: &FieldTable, name: &str) -> Result<Field> {
    fields
        .text
        .get(name)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("unknown query field: {name}"))
}

fn single_entry(body: &Value) -> Result<(&str, &Value)> {
    body.as_object()
        .and_then(|m| m.iter().next())
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| anyhow::anyhow!("expected a single-field clause"))
}

fn scalar_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => bail!("unsupported match value: {other}"),
    }
}

fn list(body: &Value, key: &str) -> Vec<Value> {
    body[key].as_array().cloned().unwrap_or_default()
}
