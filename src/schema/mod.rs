//! JSON-Schema generation for option types.
//!
//! A type is first described as a [`TypeDescription`] (by hand, through
//! [`Described`], or deserialized from JSON/YAML), then compiled by a
//! [`SchemaCompiler`] into a [`SchemaDocument`] whose named types live under
//! `$defs`.

mod compiler;
mod describe;
mod identity;
mod node;
mod types;

pub use compiler::{DEFAULT_DISCRIMINATOR, DEFAULT_DOT_MARKER, SchemaCompiler, schema_for};
pub use describe::Described;
pub use identity::{
    IdentityResolver, NameResolver, RegisteredNames, SharedResolver, TypeIdentity,
    TypePathResolver, content_hash,
};
pub use node::{
    DEFS_PREFIX, Definitions, SchemaDocument, SchemaNode, SchemaObject, merge_definitions,
};
pub use types::{DocFragment, Field, NumberKind, TypeDescription, TypeShape, apply_docs};
