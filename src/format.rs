//! Output rendering for flat sources and documents.

use crate::error::Result;
use crate::source::{FlatConfig, flatten_value};
use serde_json::Value;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    /// One `key=literal` line per flat entry.
    Pairs,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "pairs" | "kv" => Some(OutputFormat::Pairs),
            _ => None,
        }
    }
}

/// Render a flat source. JSON and YAML keep literal text as string values,
/// which is the form `unflatten` reads back.
pub fn render_flat(flat: &FlatConfig, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(flat)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(flat)?),
        OutputFormat::Pairs => Ok(format_pairs(flat)),
    }
}

/// Render a nested document. `Pairs` flattens it first.
pub fn render_document(document: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(document)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(document)?),
        OutputFormat::Pairs => Ok(format_pairs(&flatten_value(document)?)),
    }
}

fn format_pairs(flat: &FlatConfig) -> String {
    let mut out = String::new();
    for (key, literal) in flat {
        out.push_str(&format!("{}={}\n", key, literal));
    }
    out
}
