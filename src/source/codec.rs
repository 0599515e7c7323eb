//! Dotted-path codec between nested documents and flat sources.
//!
//! `flatten` walks object keys depth-first and emits one entry per leaf;
//! arrays are leaves and are never expanded by index. `unflatten` regroups
//! the dotted keys level by level and decodes every leaf literal.
//!
//! Empty nested objects have no leaves and therefore do not survive a
//! flatten/unflatten round trip.

use super::FlatConfig;
use super::literal::{LiteralMode, decode_literal, encode_literal};
use crate::error::{OptionError, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// What to do when a key is both a leaf and the prefix of deeper keys,
/// e.g. `server` and `server.port` in the same source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// The entry enumerated last decides. Enumeration is insertion order,
    /// so later sources of a merge win.
    #[default]
    LastWins,
    /// The leaf value always wins and the deeper keys are dropped.
    LeafWins,
    /// Fail with [`OptionError::AmbiguousPath`].
    Reject,
}

/// Options for [`unflatten_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecOptions {
    pub literal_mode: LiteralMode,
    pub ambiguity: AmbiguityPolicy,
}

impl CodecOptions {
    pub fn strict() -> Self {
        Self {
            literal_mode: LiteralMode::Strict,
            ambiguity: AmbiguityPolicy::Reject,
        }
    }

    pub fn with_literal_mode(mut self, mode: LiteralMode) -> Self {
        self.literal_mode = mode;
        self
    }

    pub fn with_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity = policy;
        self
    }
}

/// Flatten a document into dotted keys and literal-encoded leaves.
pub fn flatten(document: &Map<String, Value>) -> FlatConfig {
    let mut out = FlatConfig::new();
    flatten_into(document, &mut out, "");
    out
}

/// Flatten any value whose root is an object.
pub fn flatten_value(document: &Value) -> Result<FlatConfig> {
    match document {
        Value::Object(map) => Ok(flatten(map)),
        _ => Err(OptionError::not_an_object("document root")),
    }
}

fn flatten_into(map: &Map<String, Value>, out: &mut FlatConfig, path: &str) {
    for (name, value) in map {
        let key = if path.is_empty() {
            name.clone()
        } else {
            format!("{path}.{name}")
        };
        match value {
            Value::Object(nested) => flatten_into(nested, out, &key),
            leaf => {
                out.insert(key, encode_literal(leaf));
            }
        }
    }
}

/// Rebuild a nested object from a flat source using default options.
pub fn unflatten(flat: &FlatConfig) -> Result<Value> {
    unflatten_with(flat, &CodecOptions::default())
}

/// Rebuild a nested object from a flat source.
pub fn unflatten_with(flat: &FlatConfig, options: &CodecOptions) -> Result<Value> {
    for key in flat.keys() {
        validate_path(key)?;
    }
    let object = unflatten_level(flat, "", options)?;
    debug!(keys = flat.len(), fields = object.len(), "Unflattened source");
    Ok(Value::Object(object))
}

/// Check that a dotted key has no empty segment.
pub fn validate_path(key: &str) -> Result<()> {
    if key.split('.').any(str::is_empty) {
        return Err(OptionError::InvalidPath {
            path: key.to_string(),
        });
    }
    Ok(())
}

fn unflatten_level(
    flat: &FlatConfig,
    path: &str,
    options: &CodecOptions,
) -> Result<Map<String, Value>> {
    let prefix = if path.is_empty() {
        String::new()
    } else {
        format!("{path}.")
    };

    // segment -> (key, value) in enumeration order
    let mut groups: IndexMap<&str, Vec<(&str, &str)>> = IndexMap::new();
    for (key, value) in flat {
        let Some(rest) = key.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let segment = rest.split_once('.').map_or(rest, |(head, _)| head);
        groups
            .entry(segment)
            .or_default()
            .push((key.as_str(), value.as_str()));
    }

    let mut object = Map::new();
    for (segment, entries) in groups {
        let full = format!("{prefix}{segment}");
        let leaf = entries.iter().find(|(key, _)| *key == full);
        let nested = entries.iter().any(|(key, _)| key.len() > full.len());

        let use_leaf = match (leaf, nested) {
            (Some(_), false) => true,
            (None, _) => false,
            (Some(_), true) => match options.ambiguity {
                AmbiguityPolicy::Reject => {
                    return Err(OptionError::AmbiguousPath { path: full });
                }
                AmbiguityPolicy::LeafWins => {
                    warn!(path = %full, "Ambiguous dotted path, keeping the leaf value");
                    true
                }
                AmbiguityPolicy::LastWins => {
                    let last_is_leaf = entries.last().is_some_and(|(key, _)| *key == full);
                    warn!(
                        path = %full,
                        leaf = last_is_leaf,
                        "Ambiguous dotted path, last entry wins"
                    );
                    last_is_leaf
                }
            },
        };

        let value = match leaf {
            Some((key, text)) if use_leaf => decode_literal(key, text, options.literal_mode)?,
            _ => Value::Object(unflatten_level(flat, &full, options)?),
        };
        object.insert(segment.to_string(), value);
    }
    Ok(object)
}
