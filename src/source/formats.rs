//! Front-ends that turn JSON/YAML text, environment variables and
//! command-line assignments into flat sources.

use super::codec::{flatten, validate_path};
use super::literal::encode_literal;
use super::{FlatConfig, SourceMap};
use crate::error::{OptionError, Result};
use serde_json::{Map, Number, Value};
use std::ffi::OsString;
use std::path::Path;
use tracing::warn;

/// Textual format of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(OptionError::UnsupportedFormat(format!(
                "{} (expected .json, .yaml or .yml)",
                path.display()
            ))),
        }
    }

    /// Parse text in this format into a document.
    pub fn parse(self, text: &str) -> Result<Value> {
        match self {
            Self::Json => Ok(serde_json::from_str(text)?),
            Self::Yaml => Ok(yaml_to_json(serde_yaml::from_str(text)?)),
        }
    }
}

/// Decode a JSON object into a flat source.
pub fn decode_json_source(text: &str) -> Result<FlatConfig> {
    flatten_root(SourceFormat::Json.parse(text)?, "JSON source")
}

/// Decode a YAML mapping into a flat source.
pub fn decode_yaml_source(text: &str) -> Result<FlatConfig> {
    flatten_root(SourceFormat::Yaml.parse(text)?, "YAML source")
}

/// Read and decode a source file, picking the format from its extension.
pub fn read_source_file(path: &Path) -> Result<FlatConfig> {
    let format = SourceFormat::from_path(path)?;
    if !path.exists() {
        return Err(OptionError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    flatten_root(format.parse(&text)?, &path.display().to_string())
}

/// Read a file that already holds a flat source: an object of dotted keys.
/// String values are taken as literal text, anything else is encoded.
pub fn read_flat_file(path: &Path) -> Result<FlatConfig> {
    let format = SourceFormat::from_path(path)?;
    if !path.exists() {
        return Err(OptionError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    flat_object(format.parse(&text)?, &path.display().to_string())
}

fn flat_object(document: Value, what: &str) -> Result<FlatConfig> {
    let Value::Object(map) = document else {
        return Err(OptionError::not_an_object(what));
    };
    Ok(map
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => (key, text),
            other => (key, encode_literal(&other)),
        })
        .collect())
}

fn flatten_root(document: Value, what: &str) -> Result<FlatConfig> {
    match document {
        Value::Object(map) => Ok(flatten(&map)),
        // An empty YAML document is null.
        Value::Null => Ok(FlatConfig::new()),
        _ => Err(OptionError::not_an_object(what)),
    }
}

/// Convert a YAML value into the JSON document model.
///
/// Non-string mapping keys are rendered as text and tags are dropped.
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        // .nan and .inf have no JSON number form
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(n.to_string()), Value::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Build a source from environment variables.
///
/// `PREFIX_SERVER__PORT=8080` becomes `server.port = 8080`: the prefix is
/// stripped, the name lowercased and `__` turned into the path separator.
/// Values are kept raw; lenient decoding reads bare words as strings.
/// Names that map to an invalid dotted path (`PREFIX___X`) are skipped.
pub fn env_source<I, K, V>(prefix: &str, vars: I) -> SourceMap
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut source = SourceMap::new();
    for (name, value) in vars {
        let Some(rest) = name.as_ref().strip_prefix(prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let key = rest.to_lowercase().replace("__", ".");
        if validate_path(&key).is_err() {
            warn!(
                name = name.as_ref(),
                key = %key,
                "Skipping environment variable with invalid path"
            );
            continue;
        }
        source.insert(key, Some(value.into()));
    }
    source
}

/// Build a source from the current process environment.
pub fn process_env_source(prefix: &str) -> SourceMap {
    let mut vars = unicode_vars(std::env::vars_os());
    // Process env order is unspecified; sort for a stable enumeration.
    vars.sort();
    env_source(prefix, vars)
}

/// Keep the variables whose name and value are valid UTF-8.
fn unicode_vars<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut out = Vec::new();
    for (name, value) in vars {
        match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => out.push((name, value)),
            (name, _) => {
                warn!(name = ?name, "Skipping environment variable that is not valid UTF-8");
            }
        }
    }
    out
}

/// Build a source from `key=value` assignments such as `--set` flags.
pub fn assignment_source<I, S>(assignments: I) -> Result<SourceMap>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut source = SourceMap::new();
    for assignment in assignments {
        let assignment = assignment.as_ref();
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(OptionError::InvalidAssignment(assignment.to_string()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(OptionError::InvalidAssignment(assignment.to_string()));
        }
        source.insert(key.to_string(), Some(value.to_string()));
    }
    Ok(source)
}
