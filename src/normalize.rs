//! Payload normalization.
//!
//! Upstream tools hand over query results either as native structures or as text.
//! The [`Normalizer`] runs an ordered chain of [`PayloadParser`]s; each one states
//! explicitly whether it accepts the payload, and the first acceptance wins.

use crate::data::{Record, Scalar, Table};
use crate::error::{Result, VizError};
use crate::literal::{self, Literal};
use log::debug;
use serde_json::Value;

/// Raw result payload as received from the upstream data source.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Already-structured rows (a sequence of mappings, or a single mapping).
    Native(Value),
    /// Serialized rows, either strict JSON or a host-language literal.
    Text(String),
}

impl Payload {
    fn source_text(&self) -> String {
        match self {
            Payload::Native(v) => v.to_string(),
            Payload::Text(s) => s.clone(),
        }
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Native(v)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

/// One link of the normalization chain.
pub trait PayloadParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Some(table)` if this parser accepts the payload, `None` to decline.
    fn parse(&self, payload: &Payload) -> Option<Table>;
}

/// Accepts native structures that are shaped like a table.
pub struct NativeParser;

impl PayloadParser for NativeParser {
    fn name(&self) -> &'static str {
        "native"
    }

    fn parse(&self, payload: &Payload) -> Option<Table> {
        match payload {
            Payload::Native(v) => table_from_json(v),
            Payload::Text(_) => None,
        }
    }
}

/// Accepts strict JSON text.
pub struct JsonTextParser;

impl PayloadParser for JsonTextParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, payload: &Payload) -> Option<Table> {
        match payload {
            Payload::Text(s) => serde_json::from_str::<Value>(s)
                .ok()
                .and_then(|v| table_from_json(&v)),
            Payload::Native(_) => None,
        }
    }
}

/// Accepts host-language literal text (single quotes, `None`, `Decimal(...)`, dates).
pub struct LiteralTextParser;

impl PayloadParser for LiteralTextParser {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn parse(&self, payload: &Payload) -> Option<Table> {
        match payload {
            Payload::Text(s) => literal::parse_literal(s).and_then(|lit| table_from_literal(&lit)),
            Payload::Native(_) => None,
        }
    }
}

pub struct Normalizer {
    parsers: Vec<Box<dyn PayloadParser>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            parsers: vec![
                Box::new(NativeParser),
                Box::new(JsonTextParser),
                Box::new(LiteralTextParser),
            ],
        }
    }
}

impl Normalizer {
    pub fn with_parsers(parsers: Vec<Box<dyn PayloadParser>>) -> Self {
        Self { parsers }
    }

    pub fn normalize(&self, payload: &Payload) -> Result<Table> {
        for parser in &self.parsers {
            match parser.parse(payload) {
                Some(table) => {
                    debug!(
                        "payload accepted by {} parser ({} rows)",
                        parser.name(),
                        table.len()
                    );
                    return Ok(table);
                }
                None => debug!("{} parser declined payload", parser.name()),
            }
        }
        Err(VizError::data_format(&payload.source_text()))
    }
}

/// Normalize a payload with the standard parser chain.
pub fn normalize(payload: impl Into<Payload>) -> Result<Table> {
    Normalizer::default().normalize(&payload.into())
}

fn table_from_json(value: &Value) -> Option<Table> {
    match value {
        Value::Array(items) => {
            let records = items
                .iter()
                .map(|item| item.as_object().map(Record::from_json_object))
                .collect::<Option<Vec<_>>>()?;
            Some(Table::new(records))
        }
        Value::Object(obj) => {
            let columns: Vec<(&String, &Vec<Value>)> = obj
                .iter()
                .map(|(k, v)| v.as_array().map(|arr| (k, arr)))
                .collect::<Option<Vec<_>>>()
                .unwrap_or_default();

            match column_oriented_len(columns.iter().map(|(_, arr)| arr.len()), obj.len()) {
                Some(rows) => Some(Table::new(
                    (0..rows)
                        .map(|i| {
                            columns
                                .iter()
                                .map(|(k, arr)| ((*k).clone(), Scalar::from_json(&arr[i])))
                                .collect()
                        })
                        .collect(),
                )),
                None => Some(Table::new(vec![Record::from_json_object(obj)])),
            }
        }
        _ => None,
    }
}

fn table_from_literal(lit: &Literal) -> Option<Table> {
    match lit {
        Literal::List(items) => {
            let records = items
                .iter()
                .map(|item| match item {
                    Literal::Dict(entries) => Some(record_from_entries(entries)),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            Some(Table::new(records))
        }
        Literal::Dict(entries) => {
            let columns: Vec<(String, &Vec<Literal>)> = entries
                .iter()
                .map(|(k, v)| match v {
                    Literal::List(items) => Some((key_name(k), items)),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .unwrap_or_default();

            match column_oriented_len(columns.iter().map(|(_, items)| items.len()), entries.len()) {
                Some(rows) => Some(Table::new(
                    (0..rows)
                        .map(|i| {
                            columns
                                .iter()
                                .map(|(k, items)| (k.clone(), literal_scalar(&items[i])))
                                .collect()
                        })
                        .collect(),
                )),
                None => Some(Table::new(vec![record_from_entries(entries)])),
            }
        }
        _ => None,
    }
}

/// Row count of a column-oriented mapping: every value is a list and all lists share a length.
fn column_oriented_len(lens: impl Iterator<Item = usize>, field_count: usize) -> Option<usize> {
    let lens: Vec<usize> = lens.collect();
    if field_count == 0 || lens.len() != field_count {
        return None;
    }
    let first = lens[0];
    lens.iter().all(|&l| l == first).then_some(first)
}

fn record_from_entries(entries: &[(Literal, Literal)]) -> Record {
    entries
        .iter()
        .map(|(k, v)| (key_name(k), literal_scalar(v)))
        .collect()
}

fn key_name(key: &Literal) -> String {
    match key {
        Literal::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

fn literal_scalar(lit: &Literal) -> Scalar {
    match lit {
        Literal::None => Scalar::Null,
        Literal::Bool(b) => Scalar::Bool(*b),
        Literal::Int(i) => Scalar::Number(*i as f64),
        Literal::Float(f) => Scalar::Number(*f),
        Literal::Str(s) => Scalar::Text(s.clone()),
        Literal::Timestamp(ts) => Scalar::Timestamp(*ts),
        nested @ (Literal::List(_) | Literal::Dict(_)) => Scalar::Text(nested.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PREVIEW_CHARS;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_rows() -> Value {
        json!([
            {"category": "A", "revenue": 100, "note": null},
            {"category": "B", "revenue": 50.5, "note": "late"}
        ])
    }

    #[test]
    fn test_native_passthrough() {
        let table = normalize(sample_rows()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), vec!["category", "revenue", "note"]);
        assert_eq!(table.records()[1].get("revenue"), Some(&Scalar::Number(50.5)));
    }

    #[test]
    fn test_all_shapes_are_row_equivalent() {
        let native = normalize(sample_rows()).unwrap();
        let json_text = normalize(sample_rows().to_string()).unwrap();
        let literal_text = normalize(
            "[{'category': 'A', 'revenue': 100, 'note': None}, {'category': 'B', 'revenue': 50.5, 'note': 'late'}]",
        )
        .unwrap();
        assert_eq!(native, json_text);
        assert_eq!(native, literal_text);
    }

    #[test]
    fn test_single_mapping_is_one_record() {
        let table = normalize(json!({"total": 10, "label": "all"})).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].get("total"), Some(&Scalar::Number(10.0)));
    }

    #[test]
    fn test_column_oriented_mapping() {
        let table = normalize("{'month': ['Jan', 'Feb'], 'orders': [3, 4]}").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records()[1].get("month"),
            Some(&Scalar::Text("Feb".to_string()))
        );
        assert_eq!(table.records()[1].get("orders"), Some(&Scalar::Number(4.0)));
    }

    #[test]
    fn test_ragged_column_mapping_is_one_record() {
        let table = normalize(json!({"a": [1, 2], "b": [1]})).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_empty_array_is_empty_table() {
        let table = normalize("[]").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_unparsable_text_has_bounded_preview() {
        let garbage = format!("SELECT * FROM orders -- {}", "x".repeat(300));
        match normalize(garbage.as_str()) {
            Err(VizError::DataFormat { preview }) => {
                assert_eq!(preview.chars().count(), PREVIEW_CHARS);
                assert!(preview.starts_with("SELECT * FROM orders"));
            }
            other => panic!("expected DataFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_deeply_nested_text_is_data_format_error() {
        let deep = "[".repeat(100_000);
        match normalize(deep.as_str()) {
            Err(VizError::DataFormat { preview }) => assert_eq!(preview, "[".repeat(PREVIEW_CHARS)),
            other => panic!("expected DataFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_scalar_is_rejected() {
        assert!(matches!(normalize("42"), Err(VizError::DataFormat { .. })));
        assert!(matches!(normalize(json!([1, 2, 3])), Err(VizError::DataFormat { .. })));
    }

    #[test]
    fn test_custom_chain_declines_everything() {
        let normalizer = Normalizer::with_parsers(vec![Box::new(NativeParser)]);
        let result = normalizer.normalize(&Payload::from("[{\"a\": 1}]"));
        assert!(matches!(result, Err(VizError::DataFormat { .. })));
    }
}
