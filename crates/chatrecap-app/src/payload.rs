// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A year reported by the analysis service. The service may send integers or
/// strings; whichever shape arrived is echoed back on `/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(i64),
    Text(String),
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Year {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Analysis results for one year, held verbatim.
///
/// Nothing here is validated up front. Each metric is interpreted lazily
/// through [`AnalysisPayload::metric`] so one malformed metric cannot poison
/// the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisPayload(Map<String, Value>);

impl AnalysisPayload {
    pub fn new(metrics: Map<String, Value>) -> Self {
        Self(metrics)
    }

    /// Accepts only a JSON object; anything else is not a payload.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns `None` when the key is absent or its `data` is not an array.
    pub fn metric(&self, key: &str) -> Option<MetricRecord<'_>> {
        let record = self.0.get(key)?.as_object()?;
        let data = record.get("data")?.as_array()?;
        Some(MetricRecord {
            data,
            caption: record.get("caption").and_then(Value::as_str),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricRecord<'a> {
    data: &'a [Value],
    caption: Option<&'a str>,
}

impl<'a> MetricRecord<'a> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn caption(&self) -> Option<&'a str> {
        self.caption
    }

    /// Non-object rows read as rows with every field missing.
    pub fn rows(self) -> impl Iterator<Item = Row<'a>> {
        self.data.iter().map(Row::new)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Row<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            fields: value.as_object(),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields?.get(field)
    }

    /// Strings come back verbatim and numbers rendered. Other shapes are
    /// treated as missing.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Numbers, or strings that parse as finite numbers.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            Value::Number(value) => value.as_f64(),
            Value::String(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|parsed| parsed.is_finite()),
            _ => None,
        }
    }

    pub fn list(&self, field: &str) -> Option<&'a [Value]> {
        self.get(field)?.as_array().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisPayload, Row, Year};
    use serde_json::json;

    fn payload(value: serde_json::Value) -> AnalysisPayload {
        AnalysisPayload::from_value(value).expect("object payload")
    }

    #[test]
    fn metric_requires_data_array() {
        let payload = payload(json!({
            "good": {"data": [{"a": 1}], "caption": "hi"},
            "no_data": {"caption": "x"},
            "scalar_data": {"data": 4},
            "not_a_record": [1, 2, 3],
        }));

        let good = payload.metric("good").expect("good metric");
        assert_eq!(good.len(), 1);
        assert_eq!(good.caption(), Some("hi"));
        assert!(payload.metric("no_data").is_none());
        assert!(payload.metric("scalar_data").is_none());
        assert!(payload.metric("not_a_record").is_none());
        assert!(payload.metric("absent").is_none());
    }

    #[test]
    fn number_distinguishes_missing_from_zero() {
        let value = json!({"zero": 0, "text_zero": "0", "word": "many", "null": null});
        let row = Row::new(&value);

        assert_eq!(row.number("zero"), Some(0.0));
        assert_eq!(row.number("text_zero"), Some(0.0));
        assert_eq!(row.number("word"), None);
        assert_eq!(row.number("null"), None);
        assert_eq!(row.number("missing"), None);
    }

    #[test]
    fn text_renders_numbers_and_rejects_other_shapes() {
        let value = json!({"name": "Ana", "hour": 7, "flag": true, "empty": ""});
        let row = Row::new(&value);

        assert_eq!(row.text("name").as_deref(), Some("Ana"));
        assert_eq!(row.text("hour").as_deref(), Some("7"));
        assert_eq!(row.text("empty").as_deref(), Some(""));
        assert_eq!(row.text("flag"), None);
    }

    #[test]
    fn non_object_rows_have_no_fields() {
        let value = json!("just a string");
        let row = Row::new(&value);
        assert_eq!(row.text("anything"), None);
        assert_eq!(row.number("anything"), None);
        assert!(row.list("anything").is_none());
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(AnalysisPayload::from_value(json!([1, 2])).is_none());
        assert!(AnalysisPayload::from_value(json!(null)).is_none());
        assert!(AnalysisPayload::from_value(json!({})).is_some_and(|p| p.is_empty()));
    }

    #[test]
    fn years_keep_their_wire_shape() -> serde_json::Result<()> {
        let years: Vec<Year> = serde_json::from_str(r#"[2023, "2022"]"#)?;
        assert_eq!(years, vec![Year::Number(2023), Year::Text("2022".to_owned())]);
        assert_eq!(serde_json::to_string(&years)?, r#"[2023,"2022"]"#);
        assert_eq!(years[0].to_string(), "2023");
        Ok(())
    }
}
