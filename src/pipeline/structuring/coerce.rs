//! Per-kind coercion of whatever shape the model produced for a field.
//!
//! Every coercion is total: bad input yields the field's default, never an
//! error. Output of a coercion fed back in comes out unchanged.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Keys whose value best names a record when a list of records shows up
/// where a list of strings was expected.
const NAME_KEYS: &[&str] = &["name", "alternative", "title", "label", "technology"];

/// Shape of an incoming field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Absent or `null`.
    Missing,
    /// String, number or boolean.
    Scalar(&'a Value),
    List(&'a [Value]),
    Map(&'a Map<String, Value>),
}

impl<'a> FieldValue<'a> {
    pub fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Missing,
            Some(Value::Array(items)) => Self::List(items),
            Some(Value::Object(map)) => Self::Map(map),
            Some(scalar) => Self::Scalar(scalar),
        }
    }

    /// Look up `key`, then each alias in order.
    pub fn lookup(map: &'a Map<String, Value>, key: &str, aliases: &[&str]) -> Self {
        std::iter::once(key)
            .chain(aliases.iter().copied())
            .map(|k| Self::of(map.get(k)))
            .find(|v| !matches!(v, Self::Missing))
            .unwrap_or(Self::Missing)
    }
}

/// Text of a scalar: trimmed strings, numbers and booleans as written.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Text naming a list item: scalars directly, maps by their name-like key
/// or else their first textual value.
fn item_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => NAME_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(scalar_text))
            .or_else(|| map.values().find_map(scalar_text)),
        other => scalar_text(other),
    }
}

pub fn text(value: FieldValue<'_>, default: &str) -> String {
    let text = match value {
        FieldValue::Scalar(v) => scalar_text(v),
        FieldValue::List(items) => {
            let parts: Vec<String> = items.iter().filter_map(item_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        FieldValue::Map(map) => {
            let parts: Vec<String> = map
                .iter()
                .filter_map(|(k, v)| scalar_text(v).map(|v| format!("{}: {v}", k.trim())))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        FieldValue::Missing => None,
    };
    text.unwrap_or_else(|| default.to_string())
}

/// A string or null where a list belongs carries no usable items.
pub fn text_list(value: FieldValue<'_>, placeholder: &str) -> Vec<String> {
    let items: Vec<String> = match value {
        FieldValue::List(items) => items.iter().filter_map(item_text).collect(),
        FieldValue::Map(map) => item_text(&Value::Object(map.clone())).into_iter().collect(),
        FieldValue::Scalar(_) | FieldValue::Missing => Vec::new(),
    };
    if items.is_empty() {
        vec![placeholder.to_string()]
    } else {
        items
    }
}

/// Maps keep their textual entries; lists of `"key: value"` strings are
/// re-keyed into a map.
pub fn text_map(value: FieldValue<'_>, key: &str, placeholder: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    match value {
        FieldValue::Map(map) => {
            for (k, v) in map {
                let k = k.trim();
                if let (false, Some(v)) = (k.is_empty(), scalar_text(v)) {
                    out.insert(k.to_string(), v);
                }
            }
        }
        FieldValue::List(items) => {
            for item in items {
                let Some(Value::String(s)) = Some(item) else { continue };
                if let Some((k, v)) = s.split_once(':') {
                    let (k, v) = (k.trim(), v.trim());
                    if !k.is_empty() && !v.is_empty() {
                        out.insert(k.to_string(), v.to_string());
                    }
                }
            }
        }
        FieldValue::Scalar(_) | FieldValue::Missing => {}
    }
    if out.is_empty() {
        out.insert(key.to_string(), placeholder.to_string());
    }
    out
}

/// Integers in range are kept. Floats, strings and out-of-range values get
/// the default.
pub fn score(value: FieldValue<'_>, min: i64, max: i64, default: i64) -> i64 {
    match value {
        FieldValue::Scalar(Value::Number(n)) => n
            .as_i64()
            .filter(|s| (min..=max).contains(s))
            .unwrap_or(default),
        _ => default,
    }
}

/// Case-insensitive match against the allowed members, returning the
/// canonical spelling.
pub fn choice(value: FieldValue<'_>, allowed: &[&'static str], default: &'static str) -> &'static str {
    match value {
        FieldValue::Scalar(Value::String(s)) => {
            let s = s.trim();
            allowed
                .iter()
                .copied()
                .find(|member| member.eq_ignore_ascii_case(s))
                .unwrap_or(default)
        }
        _ => default,
    }
}

pub fn flag(value: FieldValue<'_>, default: bool) -> bool {
    match value {
        FieldValue::Scalar(Value::Bool(b)) => *b,
        FieldValue::Scalar(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => true,
            "false" | "no" => false,
            _ => default,
        },
        _ => default,
    }
}

pub fn coordinate(value: FieldValue<'_>, default: f64) -> f64 {
    match value {
        FieldValue::Scalar(Value::Number(n)) => {
            n.as_f64().filter(|x| x.is_finite()).unwrap_or(default)
        }
        _ => default,
    }
}
