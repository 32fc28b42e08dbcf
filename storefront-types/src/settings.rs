//! Opaque settings payloads carried by sections and blocks.
//!
//! Themes attach arbitrary key/value settings to every section and block.
//! The engine never interprets them beyond the reserved nested-children key
//! on container blocks, so they are kept as a closed union of JSON-shaped
//! values rather than a schema per theme.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered map of setting name to value.
pub type Settings = BTreeMap<String, SettingValue>;

/// A single setting value.
///
/// Serialized untagged, so the JSON form is the plain JSON document:
/// `{"title": "Sale", "columns": 3, "tags": ["a", "b"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<SettingValue>),
    Map(Settings),
}

impl SettingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SettingValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Settings> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<SettingValue>> for SettingValue {
    fn from(value: Vec<SettingValue>) -> Self {
        Self::List(value)
    }
}

impl From<Settings> for SettingValue {
    fn from(value: Settings) -> Self {
        Self::Map(value)
    }
}
