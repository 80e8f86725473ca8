//! Tests for schema compilation.

use avro_union::schema::{check_name, Name};
use avro_union::{compile_schema, BuilderStrategy, Codec, Compiler, SchemaError, Value};
use serde_json::Value as JsonValue;

// ============================================================================
// Primitive and Complex Types
// ============================================================================

#[test]
fn test_primitive_object_schemas() {
    assert_eq!(compile_schema(r#"{"type": "null"}"#).unwrap().type_name(), "null");
    assert_eq!(compile_schema(r#"{"type": "int"}"#).unwrap().type_name(), "int");
    assert_eq!(
        compile_schema(r#"{"type": "string"}"#).unwrap().type_name(),
        "string"
    );
}

#[test]
fn test_complex_type_names() {
    let array = compile_schema(r#"{"type":"array","items":"long"}"#).unwrap();
    assert_eq!(array.type_name(), "array");
    let map = compile_schema(r#"{"type":"map","values":"bytes"}"#).unwrap();
    assert_eq!(map.type_name(), "map");
    let union = compile_schema(r#"["null","int"]"#).unwrap();
    assert_eq!(union.type_name(), "union");
    assert!(union.as_union().is_some());
    assert!(array.as_union().is_none());
}

#[test]
fn test_nested_type_attribute() {
    let codec = compile_schema(r#"{"type": {"type": "array", "items": "int"}}"#).unwrap();
    assert_eq!(codec.type_name(), "array");
    let codec = compile_schema(r#"{"type": ["null", "int"]}"#).unwrap();
    assert_eq!(codec.type_name(), "union");
}

#[test]
fn test_error_is_a_record() {
    let codec = compile_schema(
        r#"{"type":"error","name":"Failure","fields":[{"name":"message","type":"string"}]}"#,
    )
    .unwrap();
    assert_eq!(codec.type_name(), "Failure");
}

#[test]
fn test_missing_attributes() {
    let cases = [
        r#"{}"#,
        r#"{"type":"record","fields":[]}"#,
        r#"{"type":"record","name":"R"}"#,
        r#"{"type":"record","name":"R","fields":[{"type":"int"}]}"#,
        r#"{"type":"record","name":"R","fields":[{"name":"a"}]}"#,
        r#"{"type":"enum","name":"E"}"#,
        r#"{"type":"fixed","name":"F"}"#,
        r#"{"type":"array"}"#,
        r#"{"type":"map"}"#,
    ];
    for schema in cases {
        assert!(
            matches!(compile_schema(schema), Err(SchemaError::InvalidSchema(_))),
            "{}",
            schema
        );
    }
}

#[test]
fn test_duplicate_record_field() {
    let result = compile_schema(
        r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":"int"},
            {"name":"a","type":"long"}
        ]}"#,
    );
    assert!(matches!(result, Err(SchemaError::InvalidSchema(_))));
}

#[test]
fn test_cannot_redefine_primitive() {
    assert!(compile_schema(r#"{"type":"fixed","name":"int","size":4}"#).is_err());
}

// ============================================================================
// Names and Namespaces
// ============================================================================

#[test]
fn test_references_resolve_in_enclosing_namespace() {
    let codec = compile_schema(
        r#"{"type":"record","name":"Pair","namespace":"com.example","fields":[
            {"name":"left","type":{"type":"fixed","name":"Half","size":2}},
            {"name":"right","type":"Half"},
            {"name":"full","type":"com.example.Half"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(codec.type_name(), "com.example.Pair");
    let value: Value = [
        ("left", Value::Bytes(vec![1, 2])),
        ("right", Value::Bytes(vec![3, 4])),
        ("full", Value::Bytes(vec![5, 6])),
    ]
    .into_iter()
    .collect();
    assert_eq!(codec.to_binary(&value).unwrap(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_null_namespace_fallback() {
    let codec = compile_schema(
        r#"["null",
            {"type":"enum","name":"Plain","symbols":["A"]},
            {"type":"record","name":"Outer","namespace":"ns","fields":[
                {"name":"p","type":"Plain"}
            ]}
        ]"#,
    )
    .unwrap();
    let table = codec.as_union().unwrap().table();
    assert_eq!(table.allowed_type_names(), &["null", "Plain", "ns.Outer"]);
}

#[test]
fn test_name_helpers() {
    assert_eq!(Name::new("a.b.C", None, None).fullname(), "a.b.C");
    assert_eq!(Name::new("C", None, Some("x")).fullname(), "x.C");
    assert!(check_name("C", "Record").is_none());
    assert!(check_name("9C", "Record").is_some());
}

#[test]
fn test_strict_name_validation() {
    let schema = r#"{"type":"record","name":"R","fields":[{"name":"bad name","type":"int"}]}"#;
    assert!(Compiler::new().compile_str(schema).is_ok());
    assert!(matches!(
        Compiler::new().with_strict(true).compile_str(schema),
        Err(SchemaError::InvalidSchema(_))
    ));
}

#[test]
fn test_registry_is_exposed() {
    let mut compiler = Compiler::new();
    compiler
        .compile_str(r#"["null",{"type":"enum","name":"a.E","symbols":["X"]}]"#)
        .unwrap();
    let codec = compiler.named_type("a.E").unwrap();
    assert_eq!(codec.type_name(), "a.E");
    assert!(compiler.named_type("E").is_none());
}

// ============================================================================
// Custom Strategies
// ============================================================================

/// Counts unions while building them the standard way.
#[derive(Debug, Default)]
struct CountingStrategy {
    unions: std::cell::Cell<usize>,
}

impl BuilderStrategy for CountingStrategy {
    fn build_from_union(
        &self,
        compiler: &mut Compiler<'_>,
        members: &[JsonValue],
    ) -> Result<Codec, SchemaError> {
        self.unions.set(self.unions.get() + 1);
        compiler.build_union(members, avro_union::TextDecoder::AvroJson)
    }
}

#[test]
fn test_custom_strategy_sees_every_union() {
    let strategy = CountingStrategy::default();
    Codec::from_schema_with(
        r#"{"type":"record","name":"R","fields":[
            {"name":"a","type":["null","int"]},
            {"name":"b","type":{"type":"array","items":["null","string"]}},
            {"name":"c","type":{"type":"map","values":["null","long"]}}
        ]}"#,
        &strategy,
    )
    .unwrap();
    assert_eq!(strategy.unions.get(), 3);
}

/// Rejects every reference to a type called `Forbidden`.
#[derive(Debug)]
struct ForbidNames;

impl BuilderStrategy for ForbidNames {
    fn build_from_name(&self, compiler: &mut Compiler<'_>, name: &str) -> Result<Codec, SchemaError> {
        if name == "Forbidden" {
            return Err(SchemaError::UnsupportedType(name.to_string()));
        }
        compiler.build_name(name)
    }
}

#[test]
fn test_custom_strategy_overrides_names_only() {
    let schema = r#"["null","string","Forbidden"]"#;
    match Codec::from_schema_with(schema, &ForbidNames) {
        Err(SchemaError::UnionMember { position, source }) => {
            assert_eq!(position, 3);
            assert!(matches!(*source, SchemaError::UnsupportedType(_)));
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(Codec::from_schema_with(r#"["null","string"]"#, &ForbidNames).is_ok());
}
