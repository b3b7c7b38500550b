//! Coerces an arbitrary parsed model response into a fully populated
//! [`AnalysisDocument`], driven entirely by [`DOCUMENT_SCHEMA`].

use serde_json::{Map, Value};

use super::coerce::{self, FieldValue};
use super::fallback::fallback_document;
use super::schema::{FieldKind, RecordSchema, DOCUMENT_SCHEMA};
use crate::models::analysis::AnalysisDocument;

/// Normalize a parsed response. Never fails.
///
/// Anything that is not an object is treated as an empty object, so the
/// result is the all-defaults document.
pub fn normalize(parsed: &Value) -> AnalysisDocument {
    let value = normalize_value(parsed);
    match serde_json::from_value(value) {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(error = %e, "Normalized document does not match the analysis types");
            fallback_document()
        }
    }
}

/// Schema-shaped JSON for `parsed`. Every section and every declared field
/// is present; keys the schema does not declare are dropped.
pub fn normalize_value(parsed: &Value) -> Value {
    let empty = Map::new();
    let root = parsed.as_object().unwrap_or(&empty);

    let sections = DOCUMENT_SCHEMA.iter().map(|section| {
        let body = match root.get(section.name) {
            Some(Value::Object(map)) => normalize_record(section, map),
            _ => normalize_record(section, &empty),
        };
        (section.name.to_string(), Value::Object(body))
    });
    Value::Object(sections.collect())
}

fn normalize_record(schema: &RecordSchema, input: &Map<String, Value>) -> Map<String, Value> {
    schema
        .fields
        .iter()
        .map(|field| {
            let raw = FieldValue::lookup(input, field.key, field.aliases);
            (field.key.to_string(), coerce_field(field.kind, raw))
        })
        .collect()
}

fn coerce_field(kind: FieldKind, raw: FieldValue<'_>) -> Value {
    match kind {
        FieldKind::Text { default } => Value::String(coerce::text(raw, default)),
        FieldKind::TextList { placeholder } => coerce::text_list(raw, placeholder).into(),
        FieldKind::TextMap { key, value } => {
            let map = coerce::text_map(raw, key, value);
            Value::Object(map.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
        }
        FieldKind::Score { min, max, default } => coerce::score(raw, min, max, default).into(),
        FieldKind::Choice { allowed, default } => coerce::choice(raw, allowed, default).into(),
        FieldKind::Flag { default } => coerce::flag(raw, default).into(),
        FieldKind::Coordinate { default } => coerce::coordinate(raw, default).into(),
        FieldKind::Records(schema) => Value::Array(normalize_records(schema, raw)),
    }
}

/// Lists keep their usable entries, a lone object becomes a one-item list
/// and bare strings go through the record's text parser. An empty result
/// holds a single all-defaults record.
fn normalize_records(schema: &RecordSchema, raw: FieldValue<'_>) -> Vec<Value> {
    let record_from = |item: &Value| -> Option<Map<String, Value>> {
        match item {
            Value::Object(map) => Some(normalize_record(schema, map)),
            Value::String(s) if !s.trim().is_empty() => schema
                .from_text
                .map(|parse| normalize_record(schema, &parse(s))),
            _ => None,
        }
    };

    let mut records: Vec<Map<String, Value>> = match raw {
        FieldValue::List(items) => items.iter().filter_map(record_from).collect(),
        FieldValue::Map(map) => vec![normalize_record(schema, map)],
        FieldValue::Scalar(value) => record_from(value).into_iter().collect(),
        FieldValue::Missing => Vec::new(),
    };
    if records.is_empty() {
        records.push(normalize_record(schema, &Map::new()));
    }
    records.into_iter().map(Value::Object).collect()
}
