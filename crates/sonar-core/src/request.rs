//! Request boundary.
//!
//! Upstream clients send several fields as string, array or boolean
//! interchangeably. Each is modeled as an untagged union here and
//! normalized to one canonical type before any business logic runs;
//! anything that fails normalization is a validation error.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// `true` for the values that mean "no filter" wherever a filter field is
/// optional: empty, "All", "undefined", "null". All four are treated
/// identically.
pub fn is_no_filter_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty()
        || v.eq_ignore_ascii_case("all")
        || v.eq_ignore_ascii_case("undefined")
        || v.eq_ignore_ascii_case("null")
}

/// A field that arrives as a single (possibly comma-separated) string or
/// as a string array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    /// Split on commas, trim, and strip the no-filter sentinels. An empty
    /// result means the field places no restriction.
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            StringOrList::One(s) => s.split(',').collect(),
            StringOrList::Many(items) => items.iter().map(String::as_str).collect(),
        };
        raw.iter()
            .map(|s| s.trim())
            .filter(|s| !is_no_filter_sentinel(s))
            .map(str::to_string)
            .collect()
    }
}

/// A topic identifier that arrives as a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TopicId {
    Num(u64),
    Text(String),
}

impl TopicId {
    pub fn normalize(&self) -> Result<u64> {
        match self {
            TopicId::Num(n) => Ok(*n),
            TopicId::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::validation(format!("invalid topic id: {s:?}"))),
        }
    }
}

/// A flag that arrives as a boolean or as "true"/"false" text
/// (`enable_archive_data` style fields).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoolOrText {
    Flag(bool),
    Text(String),
}

impl BoolOrText {
    pub fn normalize(&self) -> Result<bool> {
        match self {
            BoolOrText::Flag(b) => Ok(*b),
            BoolOrText::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                other => Err(Error::validation(format!("invalid boolean flag: {other:?}"))),
            },
        }
    }
}

/// Normalize an `allowed_sources` style field: either an actual string
/// array or a JSON-encoded array in a string. Malformed JSON is rejected
/// outright, with no partial processing.
pub fn normalize_json_list(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::validation("expected a list of strings"))
            })
            .collect(),
        Value::String(raw) => {
            if is_no_filter_sentinel(raw) {
                return Ok(Vec::new());
            }
            serde_json::from_str::<Vec<String>>(raw)
                .map_err(|e| Error::validation(format!("malformed JSON list: {e}")))
        }
        _ => Err(Error::validation("expected a string or a list of strings")),
    }
}

/// Named lookback slots accepted by the time window resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Last24Hours,
    Last7Days,
    Last30Days,
    Last60Days,
    Last90Days,
    Last120Days,
}

impl TimeSlot {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "last24hours" => Ok(TimeSlot::Last24Hours),
            "last7days" => Ok(TimeSlot::Last7Days),
            "last30days" => Ok(TimeSlot::Last30Days),
            "last60days" => Ok(TimeSlot::Last60Days),
            "last90days" => Ok(TimeSlot::Last90Days),
            "last120days" => Ok(TimeSlot::Last120Days),
            other => Err(Error::validation(format!("invalid time slot: {other:?}"))),
        }
    }

    pub fn days(self) -> i64 {
        match self {
            TimeSlot::Last24Hours => 1,
            TimeSlot::Last7Days => 7,
            TimeSlot::Last30Days => 30,
            TimeSlot::Last60Days => 60,
            TimeSlot::Last90Days => 90,
            TimeSlot::Last120Days => 120,
        }
    }
}

/// Histogram interval for the time-series views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            other => Err(Error::validation(format!("invalid interval: {other:?}"))),
        }
    }
}

/// Common analytics request body (JSON POST), shared by all five views.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsRequest {
    #[serde(rename = "topicId")]
    pub topic_id: Option<TopicId>,
    pub source: Option<StringOrList>,
    pub category: Option<String>,
    pub sentiment: Option<StringOrList>,
    pub llm_mention_type: Option<StringOrList>,
    #[serde(rename = "fromDate")]
    pub from_date: Option<String>,
    #[serde(rename = "toDate")]
    pub to_date: Option<String>,
    #[serde(rename = "timeSlot")]
    pub time_slot: Option<String>,
    pub interval: Option<String>,
    pub allowed_sources: Option<Value>,
    pub enable_archive_data: Option<BoolOrText>,
}

/// The canonical request every resolver and the compiler consume.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub topic_id: u64,
    pub sources: Vec<String>,
    pub category: String,
    pub sentiments: Vec<String>,
    pub mention_types: Vec<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub time_slot: Option<TimeSlot>,
    pub interval: Interval,
    pub allowed_sources: Vec<String>,
    pub archive_data: bool,
}

impl AnalyticsRequest {
    pub fn normalize(&self) -> Result<NormalizedRequest> {
        let topic_id = self
            .topic_id
            .as_ref()
            .ok_or_else(|| Error::validation("topicId is required"))?
            .normalize()?;

        let category = match self.category.as_deref() {
            None => "all".to_string(),
            Some(c) if c.trim().is_empty() => "all".to_string(),
            Some(c) => c.trim().to_string(),
        };

        let time_slot = match self.time_slot.as_deref() {
            None => None,
            Some(s) if is_no_filter_sentinel(s) => None,
            Some(s) => Some(TimeSlot::parse(s)?),
        };

        let interval = match self.interval.as_deref() {
            None => Interval::default(),
            Some(s) if s.trim().is_empty() => Interval::default(),
            Some(s) => Interval::parse(s)?,
        };

        Ok(NormalizedRequest {
            topic_id,
            sources: self.source.as_ref().map(StringOrList::normalize).unwrap_or_default(),
            category,
            sentiments: self.sentiment.as_ref().map(StringOrList::normalize).unwrap_or_default(),
            mention_types: self
                .llm_mention_type
                .as_ref()
                .map(StringOrList::normalize)
                .unwrap_or_default(),
            from_date: parse_date(self.from_date.as_deref())?,
            to_date: parse_date(self.to_date.as_deref())?,
            time_slot,
            interval,
            allowed_sources: self
                .allowed_sources
                .as_ref()
                .map(normalize_json_list)
                .transpose()?
                .unwrap_or_default(),
            archive_data: self
                .enable_archive_data
                .as_ref()
                .map(BoolOrText::normalize)
                .transpose()?
                .unwrap_or(false),
        })
    }
}

/// Accept `YYYY-MM-DD` or a full ISO timestamp, normalized to day
/// granularity.
fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(raw) = raw else { return Ok(None) };
    let raw = raw.trim();
    if is_no_filter_sentinel(raw) {
        return Ok(None);
    }
    let day_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::validation(format!("invalid date: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_or_list_splits_and_strips_sentinels() {
        let one = StringOrList::One("Positive, Negative, All".into());
        assert_eq!(one.normalize(), vec!["Positive", "Negative"]);
        let many = StringOrList::Many(vec!["Facebook".into(), "".into(), "null".into()]);
        assert_eq!(many.normalize(), vec!["Facebook"]);
    }

    #[test]
    fn topic_id_from_number_or_text() {
        assert_eq!(TopicId::Num(118).normalize().unwrap(), 118);
        assert_eq!(TopicId::Text("204".into()).normalize().unwrap(), 204);
        assert!(TopicId::Text("abc".into()).normalize().is_err());
    }

    #[test]
    fn malformed_allowed_sources_is_a_validation_error() {
        let err = normalize_json_list(&json!("[\"Facebook\"")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(normalize_json_list(&json!("[\"Facebook\"]")).unwrap(), vec!["Facebook"]);
        assert_eq!(normalize_json_list(&json!(["Web", "Reddit"])).unwrap(), vec!["Web", "Reddit"]);
    }

    #[test]
    fn normalize_requires_topic_id() {
        let req = AnalyticsRequest::default();
        let err = req.normalize().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn normalize_full_request() {
        let req: AnalyticsRequest = serde_json::from_value(json!({
            "topicId": "118",
            "source": "Facebook,Twitter",
            "category": "  Banking ",
            "sentiment": ["positive", "All"],
            "fromDate": "2024-01-01T12:30:00Z",
            "toDate": "2024-02-01",
            "interval": "weekly",
            "enable_archive_data": "true"
        }))
        .unwrap();
        let norm = req.normalize().unwrap();
        assert_eq!(norm.topic_id, 118);
        assert_eq!(norm.sources, vec!["Facebook", "Twitter"]);
        assert_eq!(norm.category, "Banking");
        assert_eq!(norm.sentiments, vec!["positive"]);
        assert_eq!(norm.from_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(norm.to_date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(norm.interval, Interval::Weekly);
        assert!(norm.archive_data);
    }
}
