//! Recursive type description to JSON-Schema compiler.
//!
//! Every named type (enum, object, unit, union, wrapper) becomes one entry
//! under `$defs` and is referenced with `$ref` wherever it is used.
//! Definitions found in subtrees are returned by value and unioned by the
//! caller, so a type reached through several paths is defined once.
//!
//! Object fields whose type exposes fields of its own are also surfaced as
//! dotted sibling properties (`server.port` next to `server`), tagged with the
//! dot marker, so a schema can validate flat dotted-key sources directly.
//!
//! The description graph must be finite: a self-referential description
//! recurses without bound.

use super::identity::{IdentityResolver, NameResolver, SharedResolver, TypeIdentity};
use super::node::{Definitions, SchemaDocument, SchemaNode, SchemaObject, merge_definitions};
use super::types::{DocFragment, Field, TypeDescription, TypeShape, apply_docs};
use crate::error::{OptionError, Result};
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, trace};

/// Discriminator field used by unions that do not name one.
pub const DEFAULT_DISCRIMINATOR: &str = "type";

/// Extension keyword marking dotted sibling properties.
pub const DEFAULT_DOT_MARKER: &str = "x-dot-shortcut";

/// Compiles [`TypeDescription`]s into [`SchemaDocument`]s.
///
/// The compiler holds no per-call state and can be shared between threads.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    identity: IdentityResolver,
    default_discriminator: String,
    dot_marker: String,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCompiler {
    pub fn new() -> Self {
        Self {
            identity: IdentityResolver::default(),
            default_discriminator: DEFAULT_DISCRIMINATOR.to_string(),
            dot_marker: DEFAULT_DOT_MARKER.to_string(),
        }
    }

    /// Appends a name resolver to the identity chain.
    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: NameResolver + Send + Sync + 'static,
    {
        self.identity.push(Arc::new(resolver));
        self
    }

    /// Appends several shared resolvers, in order.
    pub fn with_resolvers<I>(mut self, resolvers: I) -> Self
    where
        I: IntoIterator<Item = SharedResolver>,
    {
        for resolver in resolvers {
            self.identity.push(resolver);
        }
        self
    }

    /// Replaces the identity chain.
    pub fn with_identity(mut self, identity: IdentityResolver) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_default_discriminator(mut self, field: impl Into<String>) -> Self {
        self.default_discriminator = field.into();
        self
    }

    pub fn with_dot_marker(mut self, marker: impl Into<String>) -> Self {
        self.dot_marker = marker.into();
        self
    }

    /// Compile a type into a schema document.
    pub fn compile(&self, desc: &TypeDescription) -> Result<SchemaDocument> {
        let node = self.derive(desc)?;
        debug!(
            root = %desc.serial_name,
            definitions = node.definitions.len(),
            "Compiled schema"
        );
        Ok(SchemaDocument {
            root: node.inline,
            definitions: node.definitions,
        })
    }

    /// Derive the schema node of a type.
    pub fn derive(&self, desc: &TypeDescription) -> Result<SchemaNode> {
        trace!(name = %desc.serial_name, "Deriving schema");
        match &desc.shape {
            TypeShape::Nullable { inner } => self.derive_nullable(inner),
            TypeShape::Bool => Ok(primitive("boolean")),
            TypeShape::Char | TypeShape::String => Ok(primitive("string")),
            TypeShape::Number { .. } => Ok(primitive("number")),
            TypeShape::OpaqueObject => Ok(primitive("object")),
            TypeShape::OpaqueArray => Ok(primitive("array")),
            TypeShape::Map { value } => {
                self.derive_container("object", "additionalProperties", value)
            }
            TypeShape::List { element } => self.derive_container("array", "items", element),
            TypeShape::Enum { variants } => Ok(self.derive_enum(desc, variants)),
            TypeShape::Unit => Ok(self.derive_unit(desc)),
            TypeShape::Wrapper { inner } => self.derive_wrapper(desc, inner),
            TypeShape::Object { fields } => self.derive_object(desc, fields),
            TypeShape::Union {
                cases,
                discriminator,
            } => self.derive_union(desc, cases, discriminator.as_deref()),
            TypeShape::Open | TypeShape::Contextual => {
                Err(OptionError::unsupported_shape(&desc.serial_name))
            }
        }
    }

    fn derive_nullable(&self, inner: &TypeDescription) -> Result<SchemaNode> {
        let sub = self.derive(inner)?;
        let mut inline = SchemaObject::new();
        inline.insert(
            "oneOf".to_string(),
            json!([Value::Object(sub.inline), {"type": "null"}]),
        );
        Ok(SchemaNode {
            inline,
            serial_name: None,
            definitions: sub.definitions,
            promoted: sub.promoted,
        })
    }

    fn derive_container(
        &self,
        ty: &str,
        keyword: &str,
        element: &TypeDescription,
    ) -> Result<SchemaNode> {
        let sub = self.derive(element)?;
        let mut inline = SchemaObject::new();
        inline.insert("type".to_string(), json!(ty));
        inline.insert(keyword.to_string(), Value::Object(sub.inline));
        Ok(SchemaNode::inline(inline).with_definitions(sub.definitions))
    }

    fn derive_enum(&self, desc: &TypeDescription, variants: &[String]) -> SchemaNode {
        let TypeIdentity { key, .. } = self.identity.identify(desc);
        let mut definition = SchemaObject::new();
        definition.insert("type".to_string(), json!("string"));
        definition.insert("enum".to_string(), json!(variants));
        SchemaNode::reference(&key, &desc.serial_name, definition)
    }

    fn derive_unit(&self, desc: &TypeDescription) -> SchemaNode {
        let TypeIdentity { key, title } = self.identity.identify(desc);
        let definition = object_header(&title, &desc.docs);
        SchemaNode::reference(&key, &desc.serial_name, definition)
    }

    fn derive_wrapper(
        &self,
        desc: &TypeDescription,
        inner: &TypeDescription,
    ) -> Result<SchemaNode> {
        let sub = self.derive(inner)?;
        let TypeIdentity { key, title } = self.identity.identify(desc);

        let mut definition = sub.inline;
        definition.insert("title".to_string(), json!(title));
        apply_docs(&mut definition, &desc.docs);

        Ok(SchemaNode::reference(&key, &desc.serial_name, definition)
            .with_definitions(sub.definitions)
            .with_promoted(sub.promoted))
    }

    fn derive_object(&self, desc: &TypeDescription, fields: &[Field]) -> Result<SchemaNode> {
        let TypeIdentity { key, title } = self.identity.identify(desc);

        let mut properties = SchemaObject::new();
        let mut required = Vec::new();
        let mut nested = Definitions::new();
        let mut promoted = IndexMap::new();

        for field in fields {
            let sub = self.derive(&field.ty)?;

            let mut schema = sub.inline;
            apply_docs(&mut schema, &field.docs);
            properties.insert(field.name.clone(), Value::Object(schema.clone()));
            if !field.optional {
                required.push(field.name.clone());
            }
            promoted.insert(field.name.clone(), schema);

            for (sub_key, sub_schema) in sub.promoted {
                let dotted = format!("{}.{}", field.name, sub_key);
                let mut marked = sub_schema.clone();
                marked.insert(self.dot_marker.clone(), Value::Bool(true));
                properties.insert(dotted.clone(), Value::Object(marked));
                promoted.insert(dotted, sub_schema);
            }

            merge_definitions(&mut nested, sub.definitions);
        }

        let mut definition = object_header(&title, &desc.docs);
        definition.insert("properties".to_string(), Value::Object(properties));
        definition.insert("required".to_string(), json!(required));

        Ok(SchemaNode::reference(&key, &desc.serial_name, definition)
            .with_definitions(nested)
            .with_promoted(promoted))
    }

    fn derive_union(
        &self,
        desc: &TypeDescription,
        cases: &[TypeDescription],
        discriminator: Option<&str>,
    ) -> Result<SchemaNode> {
        let TypeIdentity { key, title } = self.identity.identify(desc);
        let discriminator = discriminator.unwrap_or(&self.default_discriminator);

        let mut one_of = Vec::with_capacity(cases.len());
        let mut nested = Definitions::new();
        for case in cases {
            let sub = self.derive(case)?;
            let rendering = match sub.serial_name {
                Some(tag) => tagged_case(sub.inline, discriminator, &tag),
                None => Value::Object(sub.inline),
            };
            one_of.push(rendering);
            merge_definitions(&mut nested, sub.definitions);
        }

        let mut definition = SchemaObject::new();
        definition.insert("title".to_string(), json!(title));
        apply_docs(&mut definition, &desc.docs);
        definition.insert("oneOf".to_string(), Value::Array(one_of));

        Ok(SchemaNode::reference(&key, &desc.serial_name, definition).with_definitions(nested))
    }
}

fn primitive(ty: &str) -> SchemaNode {
    let mut inline = SchemaObject::new();
    inline.insert("type".to_string(), json!(ty));
    SchemaNode::inline(inline)
}

/// `{type: object, title, additionalProperties: false, <docs>}`
fn object_header(title: &str, docs: &[DocFragment]) -> SchemaObject {
    let mut definition = SchemaObject::new();
    definition.insert("type".to_string(), json!("object"));
    definition.insert("title".to_string(), json!(title));
    definition.insert("additionalProperties".to_string(), Value::Bool(false));
    apply_docs(&mut definition, docs);
    definition
}

/// `allOf: [case, {required: [d], properties: {d: {const: tag}}}]`
fn tagged_case(case: SchemaObject, discriminator: &str, tag: &str) -> Value {
    let mut constant = SchemaObject::new();
    constant.insert("const".to_string(), json!(tag));
    let mut properties = SchemaObject::new();
    properties.insert(discriminator.to_string(), Value::Object(constant));

    let mut selector = SchemaObject::new();
    selector.insert("required".to_string(), json!([discriminator]));
    selector.insert("properties".to_string(), Value::Object(properties));

    json!({"allOf": [Value::Object(case), Value::Object(selector)]})
}

/// Compile the schema of a [`Described`](super::Described) type with the
/// default compiler.
pub fn schema_for<T: super::Described>() -> Result<SchemaDocument> {
    SchemaCompiler::new().compile(&T::describe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NumberKind, RegisteredNames};

    fn options_type() -> TypeDescription {
        TypeDescription::object(
            "demo::Options",
            vec![
                Field::optional("enable", TypeDescription::boolean()),
                Field::required("amount", TypeDescription::number(NumberKind::I32)),
            ],
        )
    }

    #[test]
    fn test_primitives_inline() {
        let compiler = SchemaCompiler::new();
        for (desc, ty) in [
            (TypeDescription::boolean(), "boolean"),
            (TypeDescription::char(), "string"),
            (TypeDescription::string(), "string"),
            (TypeDescription::number(NumberKind::U8), "number"),
            (TypeDescription::number(NumberKind::F64), "number"),
            (TypeDescription::opaque_object(), "object"),
            (TypeDescription::opaque_array(), "array"),
        ] {
            let node = compiler.derive(&desc).unwrap();
            assert_eq!(Value::Object(node.inline), json!({"type": ty}));
            assert!(node.definitions.is_empty());
            assert!(node.serial_name.is_none());
        }
    }

    #[test]
    fn test_containers_propagate_definitions() {
        let compiler = SchemaCompiler::new();
        let list = TypeDescription::list(options_type());
        let node = compiler.derive(&list).unwrap();
        assert_eq!(
            Value::Object(node.inline),
            json!({"type": "array", "items": {"$ref": "#/$defs/Options"}})
        );
        assert!(node.definitions.contains_key("Options"));

        let map = TypeDescription::map(TypeDescription::string());
        let node = compiler.derive(&map).unwrap();
        assert_eq!(
            Value::Object(node.inline),
            json!({"type": "object", "additionalProperties": {"type": "string"}})
        );
    }

    #[test]
    fn test_enum_definition() {
        let mode = TypeDescription::enumeration("demo::Mode", ["fast", "safe"]);
        let document = SchemaCompiler::new().compile(&mode).unwrap();
        assert_eq!(
            document.to_value(),
            json!({
                "$ref": "#/$defs/Mode",
                "$defs": {"Mode": {"type": "string", "enum": ["fast", "safe"]}}
            })
        );
    }

    #[test]
    fn test_object_required_and_properties() {
        let document = SchemaCompiler::new().compile(&options_type()).unwrap();
        let def = document.definition("Options").unwrap();
        assert_eq!(def["required"], json!(["amount"]));
        assert_eq!(def["properties"]["enable"]["type"], json!("boolean"));
        assert_eq!(def["additionalProperties"], json!(false));
        assert_eq!(def["title"], json!("Options"));
    }

    #[test]
    fn test_field_docs_decorate_inline_schema() {
        let desc = TypeDescription::object(
            "demo::Options",
            vec![
                Field::optional("enable", TypeDescription::boolean()).with_doc(
                    DocFragment::description("Set to true to enable xyz").with("default", false),
                ),
            ],
        );
        let document = SchemaCompiler::new().compile(&desc).unwrap();
        let def = document.definition("Options").unwrap();
        assert_eq!(
            def["properties"]["enable"],
            json!({"type": "boolean", "description": "Set to true to enable xyz", "default": false})
        );
    }

    #[test]
    fn test_nested_object_fields_are_promoted() {
        let inner = TypeDescription::object(
            "demo::Inner",
            vec![Field::optional("ignore_abc", TypeDescription::boolean())],
        );
        let outer = TypeDescription::object(
            "demo::Outer",
            vec![Field::optional("other", inner)],
        );
        let document = SchemaCompiler::new().compile(&outer).unwrap();
        let props = &document.definition("Outer").unwrap()["properties"];
        assert_eq!(props["other"], json!({"$ref": "#/$defs/Inner"}));
        assert_eq!(
            props["other.ignore_abc"],
            json!({"type": "boolean", "x-dot-shortcut": true})
        );
        // promoted entries are only on the enclosing object
        let inner_props = &document.definition("Inner").unwrap()["properties"];
        assert_eq!(inner_props.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_promotion_is_transitive() {
        let leaf = TypeDescription::object(
            "demo::Leaf",
            vec![Field::required("d", TypeDescription::string())],
        );
        let middle = TypeDescription::object("demo::Middle", vec![Field::required("c", leaf)]);
        let top = TypeDescription::object("demo::Top", vec![Field::required("b", middle)]);

        let compiler = SchemaCompiler::new().with_dot_marker("x-dotted");
        let document = compiler.compile(&top).unwrap();
        let props = document.definition("Top").unwrap()["properties"]
            .as_object()
            .unwrap();
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "b.c", "b.c.d"]);
        assert_eq!(props["b.c.d"], json!({"type": "string", "x-dotted": true}));
    }

    #[test]
    fn test_wrapper_definition_and_passthrough() {
        let inner = TypeDescription::object(
            "demo::Inner",
            vec![Field::required("port", TypeDescription::number(NumberKind::U16))],
        );
        let wrapper = TypeDescription::wrapper("demo::Wrapped", inner)
            .with_doc(DocFragment::description("wrapped"));
        let node = SchemaCompiler::new().derive(&wrapper).unwrap();

        assert_eq!(Value::Object(node.inline), json!({"$ref": "#/$defs/Wrapped"}));
        assert_eq!(
            Value::Object(node.definitions["Wrapped"].clone()),
            json!({"$ref": "#/$defs/Inner", "title": "Wrapped", "description": "wrapped"})
        );
        assert!(node.definitions.contains_key("Inner"));
        assert!(node.promoted.contains_key("port"));

        let keys: Vec<&str> = node.definitions.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Wrapped", "Inner"]);
    }

    #[test]
    fn test_nullable_object() {
        let desc = TypeDescription::nullable(options_type());
        let document = SchemaCompiler::new().compile(&desc).unwrap();
        assert_eq!(
            Value::Object(document.root.clone()),
            json!({"oneOf": [{"$ref": "#/$defs/Options"}, {"type": "null"}]})
        );
        assert!(document.definition("Options").is_some());
    }

    #[test]
    fn test_union_with_anonymous_case() {
        let union = TypeDescription::union(
            "demo::Value",
            vec![TypeDescription::string(), TypeDescription::unit("demo::Nothing")],
        )
        .with_discriminator("kind");
        let document = SchemaCompiler::new().compile(&union).unwrap();
        let one_of = &document.definition("Value").unwrap()["oneOf"];
        assert_eq!(one_of[0], json!({"type": "string"}));
        assert_eq!(
            one_of[1]["allOf"][1],
            json!({"required": ["kind"], "properties": {"kind": {"const": "demo::Nothing"}}})
        );
    }

    #[test]
    fn test_unsupported_shapes_fail() {
        let compiler = SchemaCompiler::new();
        let open = TypeDescription::open("demo::Plugin");
        let err = compiler.compile(&open).unwrap_err();
        assert_eq!(err.to_string(), "cannot derive schema for type `demo::Plugin`");

        // no partial schema when a nested field fails
        let outer = TypeDescription::object(
            "demo::Outer",
            vec![Field::required("ctx", TypeDescription::contextual("demo::Ctx"))],
        );
        assert!(matches!(
            compiler.compile(&outer),
            Err(OptionError::UnsupportedShape { ref name }) if name == "demo::Ctx"
        ));
    }

    #[test]
    fn test_registered_resolver_names_dotted_types() {
        let mut names = RegisteredNames::new();
        names.insert("com.example.MyOptions");
        let desc = TypeDescription::unit("com.example.MyOptions");

        let plain = SchemaCompiler::new().compile(&desc).unwrap();
        let hashed_key = plain.definitions.keys().next().unwrap().clone();
        assert_ne!(hashed_key, "MyOptions");
        assert_eq!(
            plain.definitions[&hashed_key]["title"],
            json!("com.example.MyOptions")
        );

        let named = SchemaCompiler::new()
            .with_resolver(names)
            .compile(&desc)
            .unwrap();
        assert!(named.definition("MyOptions").is_some());
    }

    #[test]
    fn test_with_resolvers_appends_in_order() {
        let first: SharedResolver = Arc::new(|name: &str| {
            (name == "x.Config").then(|| "FirstConfig".to_string())
        });
        let second: SharedResolver = Arc::new(|name: &str| {
            name.strip_prefix("x.").map(|rest| format!("Second{rest}"))
        });
        let compiler = SchemaCompiler::new().with_resolvers([first, second]);

        let config = compiler.compile(&TypeDescription::unit("x.Config")).unwrap();
        assert!(config.definition("FirstConfig").is_some());
        let other = compiler.compile(&TypeDescription::unit("x.Other")).unwrap();
        assert!(other.definition("SecondOther").is_some());

        // the default path resolver still runs first
        let path = compiler.compile(&TypeDescription::unit("x::Path")).unwrap();
        assert!(path.definition("Path").is_some());
    }

    #[test]
    fn test_with_identity_replaces_chain() {
        let desc = TypeDescription::unit("demo::Thing");
        let compiler = SchemaCompiler::new().with_identity(IdentityResolver::empty());
        let document = compiler.compile(&desc).unwrap();

        let (key, definition) = document.definitions.first().unwrap();
        assert_ne!(key, "Thing");
        assert_eq!(key.len(), 22);
        assert_eq!(definition["title"], json!("demo::Thing"));

        let explicit = desc.with_reference("Named");
        let document = compiler.compile(&explicit).unwrap();
        assert!(document.definition("Named").is_some());
    }
}
