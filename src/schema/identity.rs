//! Definition names for described types.
//!
//! A name is resolved through an ordered chain, first hit wins:
//! 1. the description's explicit `reference`
//! 2. each registered [`NameResolver`], in order
//! 3. a content hash of the description
//!
//! The hash is 128 bits of SHA-256, so two structurally different anonymous
//! types can collide only by accident.

use super::types::TypeDescription;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Bytes of the digest kept for hashed names.
const HASH_BYTES: usize = 16;

/// Maps a serial name to a short, human-readable type name.
pub trait NameResolver {
    fn simple_name(&self, serial_name: &str) -> Option<String>;
}

impl<F> NameResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn simple_name(&self, serial_name: &str) -> Option<String> {
        self(serial_name)
    }
}

/// Resolves Rust type paths (`my_crate::config::Options`) to their last
/// segment. Names with generics or non-identifier characters do not resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypePathResolver;

impl NameResolver for TypePathResolver {
    fn simple_name(&self, serial_name: &str) -> Option<String> {
        let mut last = None;
        for segment in serial_name.split("::") {
            if !is_identifier(segment) {
                return None;
            }
            last = Some(segment);
        }
        last.map(str::to_string)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Explicit table of known qualified names.
#[derive(Debug, Clone, Default)]
pub struct RegisteredNames {
    names: HashMap<String, String>,
}

impl RegisteredNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level type; its simple name is the last path segment.
    pub fn insert(&mut self, qualified: &str) -> &mut Self {
        self.insert_nested(qualified, 0)
    }

    /// Register a type nested inside `depth` enclosing types. The simple
    /// name keeps the enclosing type names, joined with `.`:
    /// `com.example.Outer.Inner` at depth 1 becomes `Outer.Inner`.
    pub fn insert_nested(&mut self, qualified: &str, depth: usize) -> &mut Self {
        let segments: Vec<&str> = qualified
            .split("::")
            .flat_map(|part| part.split('.'))
            .filter(|s| !s.is_empty())
            .collect();
        let start = segments.len().saturating_sub(depth + 1);
        let simple = segments[start..].join(".");
        self.insert_as(qualified, simple)
    }

    /// Register a qualified name with an explicit simple name.
    pub fn insert_as(&mut self, qualified: &str, simple: impl Into<String>) -> &mut Self {
        self.names.insert(qualified.to_string(), simple.into());
        self
    }
}

impl NameResolver for RegisteredNames {
    fn simple_name(&self, serial_name: &str) -> Option<String> {
        self.names.get(serial_name).cloned()
    }
}

/// The resolved name of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeIdentity {
    /// Key under `$defs`.
    pub key: String,
    /// Human-readable `title`.
    pub title: String,
}

/// Shared, thread-safe resolver handle.
pub type SharedResolver = Arc<dyn NameResolver + Send + Sync>;

/// Ordered chain of name resolvers.
#[derive(Clone)]
pub struct IdentityResolver {
    resolvers: Vec<SharedResolver>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            resolvers: vec![Arc::new(TypePathResolver)],
        }
    }
}

impl fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

impl IdentityResolver {
    /// A chain with no resolvers: only explicit references and hashes.
    pub fn empty() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    pub fn push(&mut self, resolver: SharedResolver) {
        self.resolvers.push(resolver);
    }

    /// First non-empty name from the chain, without the hash fallback.
    pub fn resolve_name(&self, desc: &TypeDescription) -> Option<String> {
        desc.reference.clone().or_else(|| {
            self.resolvers
                .iter()
                .find_map(|resolver| resolver.simple_name(&desc.serial_name))
        })
    }

    /// Resolve the definition key and title of a type.
    pub fn identify(&self, desc: &TypeDescription) -> TypeIdentity {
        match self.resolve_name(desc) {
            Some(name) => TypeIdentity {
                key: name.clone(),
                title: name,
            },
            None => TypeIdentity {
                key: content_hash(desc),
                title: desc.serial_name.clone(),
            },
        }
    }
}

/// URL-safe, unpadded base64 of a truncated SHA-256 over the serial name
/// and canonical form of `desc`.
pub fn content_hash(desc: &TypeDescription) -> String {
    let mut hasher = Sha256::new();
    hasher.update(desc.serial_name.as_bytes());
    hasher.update(desc.canonical_form().as_bytes());
    let digest = hasher.finalize();
    URL_SAFE_NO_PAD.encode(&digest[..HASH_BYTES])
}
