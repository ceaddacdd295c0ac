//! Forgiving deserializers for model-produced JSON.
//!
//! The reasoning engine is told the exact schema but does not always honor it:
//! lists come back as `null`, strings come back as objects, one bad entry sits
//! in an otherwise good list. These helpers are wired in with
//! `#[serde(deserialize_with = ...)]` so every structured document coerces the
//! same way, and list-typed fields always end up present.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::models::cv::Achievement;

/// Coerces one JSON value into display text. `null` and blank strings yield `None`.
pub fn coerce_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        Value::Object(_) => match serde_json::from_value::<Achievement>(value.clone()) {
            Ok(achievement) => Some(achievement.into_text()),
            Err(_) => Some(value.to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// `null` becomes empty, a lone scalar becomes a one-item list.
pub fn coerce_string_list(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().filter_map(coerce_text).collect(),
        other => coerce_text(other).into_iter().collect(),
    }
}

pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(coerce_string_list(value.unwrap_or(Value::Null)))
}

pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(coerce_text))
}

pub fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

/// The rule for required text: a non-blank string, or a number stringified.
pub fn required_text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A required text field: must be present and satisfy [`required_text_value`].
pub fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    required_text_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected non-empty text, got {value}")))
}

/// A categorical label from the model ("strong", "high", "yes", ...).
///
/// Accepts any JSON value so that an odd label never fails the surrounding
/// object: `null` and blank strings read as no label, other values are
/// coerced with [`coerce_text`]. Label enums deserialize through this with
/// `#[serde(from = "Label")]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Label(Option<Value>);

impl Label {
    pub fn into_text(self) -> Option<String> {
        self.0.and_then(coerce_text)
    }
}

/// A list of structured entries. Each entry that fails to deserialize is
/// logged and dropped; the remaining entries are kept.
pub fn item_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    };

    Ok(items
        .into_iter()
        .filter(|item| !item.is_null())
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping invalid {} entry: {e}", short_type_name::<T>());
                None
            }
        })
        .collect())
}

/// Category → skills. Non-object input becomes empty; each category's value is
/// coerced like any other string list.
pub fn category_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => return Ok(BTreeMap::new()),
    };

    Ok(map
        .into_iter()
        .map(|(category, skills)| (category, coerce_string_list(skills)))
        .filter(|(_, skills)| !skills.is_empty())
        .collect())
}

/// A nested object that may be `null` or malformed; falls back to its default.
pub fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Replacing invalid {} with default: {e}", short_type_name::<T>());
            T::default()
        })),
        _ => Ok(T::default()),
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
