//! Textual literal codec for flat values.
//!
//! Every flat value is the JSON text of a scalar or array (objects are legal
//! too). Lenient decoding additionally accepts bare words, so environment
//! variables and command-line flags can be written without JSON quoting.

use crate::error::{OptionError, Result};
use serde_json::Value;

/// How strictly flat values are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiteralMode {
    /// Only valid JSON text is accepted.
    Strict,
    /// Valid JSON, or a bare word taken verbatim as a string.
    #[default]
    Lenient,
}

/// Encode a leaf value as compact JSON text.
pub fn encode_literal(value: &Value) -> String {
    // Serializing a `Value` cannot fail: keys are always strings.
    serde_json::to_string(value).unwrap_or_default()
}

/// Decode the literal stored under `key`.
pub fn decode_literal(key: &str, text: &str, mode: LiteralMode) -> Result<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(source) => {
            if mode == LiteralMode::Lenient && is_bare_word(text) {
                return Ok(Value::String(text.to_string()));
            }
            Err(OptionError::MalformedLiteral {
                key: key.to_string(),
                literal: text.to_string(),
                source,
            })
        }
    }
}

/// A bare word does not open a JSON string, array or object.
fn is_bare_word(text: &str) -> bool {
    !matches!(text.trim_start().chars().next(), Some('{' | '[' | '"'))
}
