//! The parsed, type-agnostic configuration tree.
//!
//! A [`ConfigValue`] is what the document parser produces and what the
//! applier consumes. It carries no type information: every leaf is text, and
//! only the target descriptor decides whether `"5"` becomes an `int32`, a
//! `double` or a one-character string.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A configuration value: scalar text, an ordered array, or a named compound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Scalar(String),
    Array(Vec<ConfigValue>),
    Compound(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn scalar(text: impl Into<String>) -> Self {
        ConfigValue::Scalar(text.into())
    }

    /// An empty compound, the identity of [`deep_merge`](crate::merge::deep_merge).
    pub fn empty_compound() -> Self {
        ConfigValue::Compound(BTreeMap::new())
    }

    pub fn compound<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ConfigValue)>,
    {
        ConfigValue::Compound(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the variant, used in shape-mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::Scalar(_) => "scalar",
            ConfigValue::Array(_) => "array",
            ConfigValue::Compound(_) => "compound",
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Compound(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a direct child of a compound.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_compound().and_then(|map| map.get(key))
    }

    /// Flatten into `(dotted_path, text)` pairs, one per scalar leaf.
    ///
    /// Array elements are addressed as `path[i]`. Empty arrays and compounds
    /// produce no entries.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        flatten_into(self, String::new(), &mut out);
        out
    }
}

fn flatten_into(value: &ConfigValue, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        ConfigValue::Scalar(s) => out.push((prefix, s.clone())),
        ConfigValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(item, format!("{prefix}[{i}]"), out);
            }
        }
        ConfigValue::Compound(map) => {
            for (key, item) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(item, path, out);
            }
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Scalar(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Scalar(s)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::Array(items)
    }
}
