//! Abstract description of option types.
//!
//! A [`TypeDescription`] is what the schema compiler walks. It is produced
//! by [`Described`](super::Described) implementations or handed over as
//! JSON/YAML by an external introspection tool, and is never mutated by the
//! compiler.

use crate::error::{OptionError, Result};
use crate::source::yaml_to_json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object fragment merged into a schema node, e.g.
/// `{"description": "...", "default": false}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocFragment(pub Map<String, Value>);

impl DocFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a fragment from JSON text or a YAML flow mapping such as
    /// `{description: "Enable xyz", default: false}`.
    pub fn parse(text: &str) -> Result<Self> {
        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(_) => yaml_to_json(serde_yaml::from_str(text)?),
        };
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(OptionError::not_an_object("documentation fragment")),
        }
    }

    /// A fragment with a single `description` entry.
    pub fn description(text: impl Into<String>) -> Self {
        Self::new().with("description", Value::String(text.into()))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

/// Merge documentation fragments into a schema object. Later fragments
/// override earlier ones key by key.
pub fn apply_docs(target: &mut Map<String, Value>, docs: &[DocFragment]) {
    for doc in docs {
        for (key, value) in &doc.0 {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Width of a numeric primitive. All widths render as `number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl NumberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::I128 => "i128",
            NumberKind::Isize => "isize",
            NumberKind::U8 => "u8",
            NumberKind::U16 => "u16",
            NumberKind::U32 => "u32",
            NumberKind::U64 => "u64",
            NumberKind::U128 => "u128",
            NumberKind::Usize => "usize",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }
}

/// The shape of a described type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    Bool,
    Char,
    String,
    Number {
        width: NumberKind,
    },
    /// Free-form JSON object.
    OpaqueObject,
    /// Free-form JSON array.
    OpaqueArray,
    Nullable {
        inner: Box<TypeDescription>,
    },
    /// Lists and sets.
    List {
        element: Box<TypeDescription>,
    },
    /// String-keyed map.
    Map {
        value: Box<TypeDescription>,
    },
    Enum {
        variants: Vec<String>,
    },
    Object {
        fields: Vec<Field>,
    },
    /// Object with no fields (a singleton).
    Unit,
    /// Closed set of cases selected by a discriminator field.
    Union {
        cases: Vec<TypeDescription>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discriminator: Option<String>,
    },
    /// Thin wrapper around a single value.
    Wrapper {
        inner: Box<TypeDescription>,
    },
    /// Polymorphism without a closed case list.
    Open,
    /// Resolved only at runtime.
    Contextual,
}

/// A described type: its shape plus naming and documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescription {
    /// Serializable name; for union cases also the discriminator value.
    pub serial_name: String,
    #[serde(flatten)]
    pub shape: TypeShape,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<DocFragment>,
    /// Explicit definition name, overriding any derived one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl TypeDescription {
    pub fn new(serial_name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            serial_name: serial_name.into(),
            shape,
            docs: Vec::new(),
            reference: None,
        }
    }

    pub fn boolean() -> Self {
        Self::new("bool", TypeShape::Bool)
    }

    pub fn char() -> Self {
        Self::new("char", TypeShape::Char)
    }

    pub fn string() -> Self {
        Self::new("String", TypeShape::String)
    }

    pub fn number(width: NumberKind) -> Self {
        Self::new(width.as_str(), TypeShape::Number { width })
    }

    pub fn opaque_object() -> Self {
        Self::new("object", TypeShape::OpaqueObject)
    }

    pub fn opaque_array() -> Self {
        Self::new("array", TypeShape::OpaqueArray)
    }

    pub fn nullable(inner: TypeDescription) -> Self {
        let name = format!("{}?", inner.serial_name);
        Self::new(
            name,
            TypeShape::Nullable {
                inner: Box::new(inner),
            },
        )
    }

    pub fn list(element: TypeDescription) -> Self {
        let name = format!("List<{}>", element.serial_name);
        Self::new(
            name,
            TypeShape::List {
                element: Box::new(element),
            },
        )
    }

    pub fn map(value: TypeDescription) -> Self {
        let name = format!("Map<String, {}>", value.serial_name);
        Self::new(
            name,
            TypeShape::Map {
                value: Box::new(value),
            },
        )
    }

    pub fn enumeration<I, S>(serial_name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let variants = variants.into_iter().map(Into::into).collect();
        Self::new(serial_name, TypeShape::Enum { variants })
    }

    pub fn object(serial_name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(serial_name, TypeShape::Object { fields })
    }

    pub fn unit(serial_name: impl Into<String>) -> Self {
        Self::new(serial_name, TypeShape::Unit)
    }

    pub fn union(serial_name: impl Into<String>, cases: Vec<TypeDescription>) -> Self {
        Self::new(
            serial_name,
            TypeShape::Union {
                cases,
                discriminator: None,
            },
        )
    }

    pub fn wrapper(serial_name: impl Into<String>, inner: TypeDescription) -> Self {
        Self::new(
            serial_name,
            TypeShape::Wrapper {
                inner: Box::new(inner),
            },
        )
    }

    pub fn open(serial_name: impl Into<String>) -> Self {
        Self::new(serial_name, TypeShape::Open)
    }

    pub fn contextual(serial_name: impl Into<String>) -> Self {
        Self::new(serial_name, TypeShape::Contextual)
    }

    /// Attach a documentation fragment.
    pub fn with_doc(mut self, doc: DocFragment) -> Self {
        self.docs.push(doc);
        self
    }

    /// Set an explicit definition name.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Set the discriminator field of a union. Ignored for other shapes.
    pub fn with_discriminator(mut self, field: impl Into<String>) -> Self {
        if let TypeShape::Union { discriminator, .. } = &mut self.shape {
            *discriminator = Some(field.into());
        }
        self
    }

    /// Append a field to an object. Ignored for other shapes.
    pub fn with_field(mut self, field: Field) -> Self {
        if let TypeShape::Object { fields } = &mut self.shape {
            fields.push(field);
        }
        self
    }

    /// Deterministic textual form used for content hashing.
    pub fn canonical_form(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.serial_name.clone())
    }
}

/// A named member of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescription,
    /// The field has a default value and may be omitted.
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub docs: Vec<DocFragment>,
}

impl Field {
    /// A field without a default value.
    pub fn required(name: impl Into<String>, ty: TypeDescription) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            docs: Vec::new(),
        }
    }

    /// A field with a default value.
    pub fn optional(name: impl Into<String>, ty: TypeDescription) -> Self {
        Self {
            optional: true,
            ..Self::required(name, ty)
        }
    }

    pub fn with_doc(mut self, doc: DocFragment) -> Self {
        self.docs.push(doc);
        self
    }
}
