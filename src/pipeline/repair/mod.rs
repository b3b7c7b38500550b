//! Turns raw model output into a JSON object, escalating through
//! progressively more destructive repair stages.
//!
//! Output is sanitized first. If that does not parse, each repair stage is
//! tried on the sanitized text in order. Every stage is a pure
//! `&str -> String` function that never fails; the first candidate that
//! parses as a non-empty JSON object wins.

pub mod sanitize;
pub mod scan;
pub mod structural;
pub mod syntax;

pub use sanitize::sanitize;
pub use structural::repair_structurally;
pub use syntax::repair_syntax;

use serde_json::{Map, Value};
use thiserror::Error;

/// Shared contract of every repair stage.
pub type RepairStage = fn(&str) -> String;

/// Repair stages in escalation order. Each receives the sanitized text.
pub const REPAIR_STAGES: &[(&str, RepairStage)] = &[
    ("syntax", repair_syntax),
    ("structural", repair_structurally),
];

#[derive(Error, Debug, Clone, PartialEq)]
#[error("No repair stage produced a JSON object (last parse error: {last_error})")]
pub struct RepairExhausted {
    pub last_error: String,
}

/// A JSON object recovered from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairedJson {
    pub object: Map<String, Value>,
    /// Name of the stage whose output parsed.
    pub stage: &'static str,
}

/// Sanitize, then run the repair stages in order until one yields a
/// usable object.
pub fn parse_model_output(raw: &str) -> Result<RepairedJson, RepairExhausted> {
    let sanitized = sanitize(raw);
    let mut last_error = match parse_object(&sanitized) {
        Ok(object) => {
            return Ok(RepairedJson {
                object,
                stage: "sanitize",
            })
        }
        Err(e) => e,
    };

    for &(name, stage) in REPAIR_STAGES {
        let candidate = stage(&sanitized);
        match parse_object(&candidate) {
            Ok(object) => {
                tracing::debug!(stage = name, "Model output parsed");
                return Ok(RepairedJson {
                    object,
                    stage: name,
                });
            }
            Err(e) => {
                tracing::debug!(stage = name, error = %e, "Model output still unparseable");
                last_error = e;
            }
        }
    }

    Err(RepairExhausted { last_error })
}

/// An empty object carries nothing worth normalizing and counts as a miss.
fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        Ok(Value::Object(_)) => Err("object has no fields".into()),
        Ok(other) => Err(format!("expected an object, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
