//! Integration tests for JSON-Schema compilation.

use optionset::OptionError;
use optionset::schema::{
    Described, DocFragment, Field, NumberKind, RegisteredNames, SchemaCompiler, TypeDescription,
    schema_for,
};
use serde_json::json;

/// `{enable: bool = false, amount: number}`
fn plain_options() -> TypeDescription {
    TypeDescription::object(
        "demo::PlainOptions",
        vec![
            Field::optional("enable", TypeDescription::boolean()).with_doc(
                DocFragment::description("Set to true to enable xyz").with("default", false),
            ),
            Field::required("amount", TypeDescription::number(NumberKind::I32)),
        ],
    )
}

#[test]
fn object_requires_fields_without_default() {
    let document = SchemaCompiler::new().compile(&plain_options()).unwrap();
    assert_eq!(
        document.root.get("$ref"),
        Some(&json!("#/$defs/PlainOptions"))
    );

    let definition = document.root_definition().expect("root definition");
    assert_eq!(definition["required"], json!(["amount"]));
    assert_eq!(definition["properties"]["enable"]["type"], json!("boolean"));
    assert_eq!(definition["properties"]["enable"]["default"], json!(false));
    assert_eq!(definition["properties"]["amount"], json!({"type": "number"}));
}

#[test]
fn nullable_object_is_one_of_ref_and_null() {
    let desc = TypeDescription::object(
        "demo::Holder",
        vec![Field::optional("inner", TypeDescription::nullable(plain_options()))],
    );
    let document = SchemaCompiler::new().compile(&desc).unwrap();
    let holder = document.definition("Holder").unwrap();
    assert_eq!(
        holder["properties"]["inner"],
        json!({"oneOf": [{"$ref": "#/$defs/PlainOptions"}, {"type": "null"}]})
    );
    assert!(document.definition("PlainOptions").is_some());
}

#[test]
fn tagged_union_cases_use_all_of_with_const() {
    let a = TypeDescription::object(
        "A",
        vec![Field::required("amount", TypeDescription::number(NumberKind::F64))],
    );
    let b = TypeDescription::unit("B");
    let union = TypeDescription::union("demo::Choice", vec![a, b]);

    let document = SchemaCompiler::new().compile(&union).unwrap();
    let choice = document.definition("Choice").unwrap();
    assert_eq!(
        choice["oneOf"],
        json!([
            {"allOf": [
                {"$ref": "#/$defs/A"},
                {"required": ["type"], "properties": {"type": {"const": "A"}}}
            ]},
            {"allOf": [
                {"$ref": "#/$defs/B"},
                {"required": ["type"], "properties": {"type": {"const": "B"}}}
            ]}
        ])
    );
    assert_eq!(
        document.to_value()["$defs"]["B"],
        json!({"type": "object", "title": "B", "additionalProperties": false})
    );
}

#[test]
fn default_discriminator_is_configurable() {
    let union = TypeDescription::union("demo::Choice", vec![TypeDescription::unit("B")]);
    let document = SchemaCompiler::new()
        .with_default_discriminator("kind")
        .compile(&union)
        .unwrap();
    let case = &document.definition("Choice").unwrap()["oneOf"][0]["allOf"][1];
    assert_eq!(case["required"], json!(["kind"]));

    // an explicit discriminator beats the compiler default
    let explicit = union.with_discriminator("variant");
    let document = SchemaCompiler::new()
        .with_default_discriminator("kind")
        .compile(&explicit)
        .unwrap();
    let case = &document.definition("Choice").unwrap()["oneOf"][0]["allOf"][1];
    assert_eq!(case["required"], json!(["variant"]));
}

#[test]
fn shared_type_is_defined_once() {
    let desc = TypeDescription::object(
        "demo::Pair",
        vec![
            Field::required("left", plain_options()),
            Field::required("right", plain_options()),
            Field::optional("many", TypeDescription::list(plain_options())),
            Field::optional(
                "by_name",
                TypeDescription::map(TypeDescription::nullable(plain_options())),
            ),
        ],
    );
    let document = SchemaCompiler::new().compile(&desc).unwrap();
    let keys: Vec<&str> = document.definitions.keys().map(String::as_str).collect();
    assert_eq!(keys, ["Pair", "PlainOptions"]);
}

#[test]
fn unsupported_shape_is_an_error() {
    let desc = TypeDescription::list(TypeDescription::open("demo::Plugin"));
    let err = SchemaCompiler::new().compile(&desc).unwrap_err();
    assert!(matches!(
        err,
        OptionError::UnsupportedShape { ref name } if name == "demo::Plugin"
    ));
}

#[test]
fn unresolvable_names_fall_back_to_hash() {
    let desc = TypeDescription::enumeration("option-mode", ["fast", "safe"]);
    let document = SchemaCompiler::new().compile(&desc).unwrap();
    let (key, definition) = document.definitions.first().unwrap();
    assert_eq!(key.len(), 22);
    assert_eq!(document.root["$ref"], json!(format!("#/$defs/{key}")));
    assert_eq!(definition["enum"], json!(["fast", "safe"]));

    let again = SchemaCompiler::new().compile(&desc).unwrap();
    assert_eq!(again, document);
}

#[test]
fn explicit_reference_and_resolvers() {
    let mut names = RegisteredNames::new();
    names.insert_nested("com.example.MyNestedOptions.OptionA", 1);

    let nested = TypeDescription::unit("com.example.MyNestedOptions.OptionA");
    let renamed = TypeDescription::unit("demo::Renamed").with_reference("CustomName");
    let desc = TypeDescription::object(
        "demo::Root",
        vec![
            Field::required("a", nested),
            Field::required("b", renamed),
        ],
    );

    let document = SchemaCompiler::new()
        .with_resolver(names)
        .compile(&desc)
        .unwrap();
    assert!(document.definition("MyNestedOptions.OptionA").is_some());
    assert_eq!(
        document.definition("CustomName").unwrap()["title"],
        json!("CustomName")
    );
}

#[test]
fn closure_resolver_is_consulted_after_reference() {
    let compiler = SchemaCompiler::new().with_resolver(|name: &str| {
        name.strip_prefix("acme.").map(str::to_uppercase)
    });
    let document = compiler.compile(&TypeDescription::unit("acme.widget")).unwrap();
    assert!(document.definition("WIDGET").is_some());
}

#[test]
fn dotted_shortcuts_for_nested_options() {
    let other = TypeDescription::object(
        "demo::OtherOptions",
        vec![
            Field::optional("ignore_abc", TypeDescription::boolean())
                .with_doc(DocFragment::description("Skip abc")),
        ],
    );
    let desc = TypeDescription::object("demo::MyOptions", vec![Field::optional("other", other)]);
    let document = SchemaCompiler::new().compile(&desc).unwrap();
    let properties = &document.definition("MyOptions").unwrap()["properties"];
    assert_eq!(
        properties["other.ignore_abc"],
        json!({"type": "boolean", "description": "Skip abc", "x-dot-shortcut": true})
    );
}

#[test]
fn description_from_yaml_compiles() {
    let yaml = r#"
serial_name: demo::Server
kind: object
docs:
  - description: Server options
fields:
  - name: host
    type: {serial_name: String, kind: string}
  - name: port
    optional: true
    type: {serial_name: u16, kind: number, width: u16}
  - name: mode
    type:
      serial_name: demo::Mode
      kind: enum
      variants: [plain, tls]
"#;
    let desc: TypeDescription = serde_yaml::from_str(yaml).unwrap();
    let document = SchemaCompiler::new().compile(&desc).unwrap();
    let server = document.definition("Server").unwrap();
    assert_eq!(server["description"], json!("Server options"));
    assert_eq!(server["required"], json!(["host", "mode"]));
    assert_eq!(server["properties"]["mode"], json!({"$ref": "#/$defs/Mode"}));
}

#[allow(dead_code)]
struct Limits {
    max: u32,
    labels: Vec<String>,
}

impl Described for Limits {
    fn describe() -> TypeDescription {
        TypeDescription::object(
            std::any::type_name::<Self>(),
            vec![
                Field::required("max", u32::describe()),
                Field::optional("labels", Vec::<String>::describe()),
            ],
        )
    }
}

#[test]
fn schema_for_described_type() {
    let document = schema_for::<Limits>().unwrap();
    let limits = document.definition("Limits").unwrap();
    assert_eq!(limits["title"], json!("Limits"));
    assert_eq!(
        limits["properties"]["labels"],
        json!({"type": "array", "items": {"type": "string"}})
    );
    assert_eq!(limits["required"], json!(["max"]));
}
