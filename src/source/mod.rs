//! Option sources: flat dotted-key maps and the codec, merge and loader
//! built around them.
//!
//! ## Model
//! - [`FlatConfig`] maps dotted paths (`server.port`) to JSON literal text
//!   (`8080`, `"localhost"`, `[1,2]`).
//! - [`SourceMap`] is the nullable form accepted by [`merge_sources`]; a
//!   `None` value contributes nothing.
//!
//! ## Pipeline
//! sources → [`merge_sources`] → [`unflatten`] → [`decode_document`]

mod codec;
mod compile;
mod formats;
mod literal;
mod loader;
mod merge;

use indexmap::IndexMap;

pub use codec::{
    AmbiguityPolicy, CodecOptions, flatten, flatten_value, unflatten, unflatten_with,
    validate_path,
};
pub use compile::{compile_sources, compile_sources_with, decode_document};
pub use formats::{
    SourceFormat, assignment_source, decode_json_source, decode_yaml_source, env_source,
    process_env_source, read_flat_file, read_source_file, yaml_to_json,
};
pub use literal::{LiteralMode, decode_literal, encode_literal};
pub use loader::{LoadedSource, SourceLoader, SourceTier};
pub use merge::{merge_flat, merge_sources, to_source};

/// Dotted path to literal-encoded leaf value.
pub type FlatConfig = IndexMap<String, String>;

/// Flat source whose values may be absent.
pub type SourceMap = IndexMap<String, Option<String>>;
