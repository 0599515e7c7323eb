//! Intermediate and final schema values.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// A JSON-Schema object.
pub type SchemaObject = Map<String, Value>;

/// Named definitions, keyed by definition name.
pub type Definitions = IndexMap<String, SchemaObject>;

/// Prefix of local definition references.
pub const DEFS_PREFIX: &str = "#/$defs/";

/// Result of deriving one type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    /// How the type is rendered where it is used.
    pub inline: SchemaObject,
    /// Serial name of named types; unions use it as the discriminator value.
    pub serial_name: Option<String>,
    /// Every named type found in this subtree.
    pub definitions: Definitions,
    /// Fields exposed to enclosing objects as dotted sibling properties.
    pub promoted: IndexMap<String, SchemaObject>,
}

impl SchemaNode {
    /// An anonymous inline schema.
    pub fn inline(inline: SchemaObject) -> Self {
        Self {
            inline,
            ..Self::default()
        }
    }

    /// A node rendered as a `$ref` to the named definition.
    pub fn reference(key: &str, serial_name: impl Into<String>, definition: SchemaObject) -> Self {
        let mut inline = SchemaObject::new();
        inline.insert("$ref".to_string(), Value::String(format!("{DEFS_PREFIX}{key}")));
        let mut definitions = Definitions::new();
        definitions.insert(key.to_string(), definition);
        Self {
            inline,
            serial_name: Some(serial_name.into()),
            definitions,
            promoted: IndexMap::new(),
        }
    }

    /// Union `definitions` into this node's definitions.
    pub fn with_definitions(mut self, definitions: Definitions) -> Self {
        merge_definitions(&mut self.definitions, definitions);
        self
    }

    pub fn with_promoted(mut self, promoted: IndexMap<String, SchemaObject>) -> Self {
        self.promoted = promoted;
        self
    }
}

/// Key-wise union. A key seen twice keeps its first position and takes
/// the later value; both are expected to describe the same type.
pub fn merge_definitions(into: &mut Definitions, from: Definitions) {
    into.extend(from);
}

/// A compiled schema: the root rendering plus all shared definitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDocument {
    #[serde(flatten)]
    pub root: SchemaObject,
    #[serde(rename = "$defs")]
    pub definitions: Definitions,
}

impl SchemaDocument {
    pub fn to_value(&self) -> Value {
        let mut object = self.root.clone();
        let defs = self
            .definitions
            .iter()
            .map(|(key, def)| (key.clone(), Value::Object(def.clone())))
            .collect();
        object.insert("$defs".to_string(), Value::Object(defs));
        Value::Object(object)
    }

    pub fn definition(&self, key: &str) -> Option<&SchemaObject> {
        self.definitions.get(key)
    }

    /// The definition a `$ref` schema points to, or the schema itself.
    pub fn resolve<'a>(&'a self, schema: &'a SchemaObject) -> Option<&'a SchemaObject> {
        match schema.get("$ref").and_then(Value::as_str) {
            Some(reference) => reference
                .strip_prefix(DEFS_PREFIX)
                .and_then(|key| self.definitions.get(key)),
            None => Some(schema),
        }
    }

    /// The root definition, following a root `$ref`.
    pub fn root_definition(&self) -> Option<&SchemaObject> {
        self.resolve(&self.root)
    }
}
