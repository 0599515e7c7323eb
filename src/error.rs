//! Error taxonomy for source compilation and schema derivation.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Schema derivation
    UnsupportedShape,

    // Source decoding
    MalformedLiteral,
    AmbiguousPath,
    InvalidPath,
    InvalidAssignment,
    NotAnObject,
    DecodeFailed,

    // Input errors
    UnsupportedFormat,
    FileNotFound,
    IoError,
    ParseError,
}

/// Errors raised while reading, merging and decoding option sources, or
/// while deriving a schema.
#[derive(Error, Debug)]
pub enum OptionError {
    /// The schema compiler met a shape outside the closed set it can render.
    #[error("cannot derive schema for type `{name}`")]
    UnsupportedShape { name: String },

    /// A flat value is not a valid literal.
    #[error("malformed literal for `{key}`: {literal:?} ({source})")]
    MalformedLiteral {
        key: String,
        literal: String,
        #[source]
        source: serde_json::Error,
    },

    /// A dotted key is both a leaf and a prefix of deeper keys.
    #[error("ambiguous path `{path}`: used both as a value and as an object")]
    AmbiguousPath { path: String },

    /// A dotted key has an empty segment.
    #[error("invalid dotted path `{path}`")]
    InvalidPath { path: String },

    /// A `key=value` assignment without `=`.
    #[error("invalid assignment `{0}`, expected key=value")]
    InvalidAssignment(String),

    /// A document root (or decoded source) was not an object.
    #[error("{what} must be an object")]
    NotAnObject { what: String },

    /// The typed decoder rejected the compiled document.
    #[error("failed to decode options at `{path}`: {message}")]
    Decode { path: String, message: String },

    /// The file extension does not map to a known source format.
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// A required source file does not exist.
    #[error("source file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl OptionError {
    pub fn unsupported_shape(name: impl Into<String>) -> Self {
        Self::UnsupportedShape { name: name.into() }
    }

    pub fn not_an_object(what: impl Into<String>) -> Self {
        Self::NotAnObject { what: what.into() }
    }

    /// The error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedShape { .. } => ErrorCode::UnsupportedShape,
            Self::MalformedLiteral { .. } => ErrorCode::MalformedLiteral,
            Self::AmbiguousPath { .. } => ErrorCode::AmbiguousPath,
            Self::InvalidPath { .. } => ErrorCode::InvalidPath,
            Self::InvalidAssignment(_) => ErrorCode::InvalidAssignment,
            Self::NotAnObject { .. } => ErrorCode::NotAnObject,
            Self::Decode { .. } => ErrorCode::DecodeFailed,
            Self::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            Self::FileNotFound(_) => ErrorCode::FileNotFound,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Yaml(_) => ErrorCode::ParseError,
        }
    }

    /// The dotted path or file the error refers to, if any.
    pub fn path(&self) -> Option<String> {
        match self {
            Self::MalformedLiteral { key, .. } => Some(key.clone()),
            Self::AmbiguousPath { path } | Self::InvalidPath { path } => Some(path.clone()),
            Self::Decode { path, .. } => Some(path.clone()),
            Self::FileNotFound(path) => Some(path.display().to_string()),
            _ => None,
        }
    }

    /// Structured form of this error, as printed by the CLI.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            path: self.path(),
        }
    }
}

/// Serializable error summary.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Result type for option compilation.
pub type Result<T> = std::result::Result<T, OptionError>;
