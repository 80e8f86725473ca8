//! Schema compiler: Avro schema JSON to [`Codec`].
//!
//! The compiler keeps a registry of named types (records, enums, fixed) so
//! later references resolve to the already compiled codec, and tracks the
//! enclosing namespace while it walks nested definitions.

use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use super::name::{check_name, is_primitive, Name};
use super::strategy::{AvroJsonStrategy, BuilderStrategy};
use crate::codec::{Codec, CodecKind, EnumCodec, FieldCodec, FixedCodec, RecordCodec};
use crate::error::SchemaError;
use crate::union::{TextDecoder, UnionCodec, UnionTable};

static AVRO_JSON: AvroJsonStrategy = AvroJsonStrategy;

/// Compile an Avro schema document with the standard strategy.
///
/// # Example
/// ```
/// use avro_union::compile_schema;
///
/// let codec = compile_schema(r#"["null", "string"]"#).unwrap();
/// assert_eq!(codec.type_name(), "union");
/// ```
pub fn compile_schema(json: &str) -> Result<Codec, SchemaError> {
    Compiler::new().compile_str(json)
}

/// Schema compiler with named type resolution context.
///
/// In strict mode:
/// - Unions cannot contain nested unions
/// - Names must follow Avro naming rules (start with letter/underscore, contain only alphanumeric/underscore)
///
/// In permissive mode (default), these violations are logged as warnings but
/// don't fail compilation.
#[derive(Debug)]
pub struct Compiler<'s> {
    /// Hooks every schema node is routed through
    strategy: &'s dyn BuilderStrategy,
    /// Registry of compiled named types by their fully qualified name
    named_types: HashMap<String, Codec>,
    /// Records whose fields are still being compiled, by full name
    defining: HashMap<String, Codec>,
    /// Current namespace for resolving unqualified names
    current_namespace: Option<String>,
    /// Whether to enforce strict schema validation
    strict_schema: bool,
}

impl Default for Compiler<'static> {
    fn default() -> Self {
        Compiler::with_strategy(&AVRO_JSON)
    }
}

impl Compiler<'static> {
    /// Create a compiler with the standard Avro-JSON strategy (permissive mode).
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'s> Compiler<'s> {
    /// Create a compiler that routes every node through `strategy`.
    pub fn with_strategy(strategy: &'s dyn BuilderStrategy) -> Self {
        Self {
            strategy,
            named_types: HashMap::new(),
            defining: HashMap::new(),
            current_namespace: None,
            strict_schema: false,
        }
    }

    /// Set whether to use strict schema validation.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    /// Set the namespace unqualified top-level names resolve against.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.current_namespace = Some(namespace.into()).filter(|ns| !ns.is_empty());
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_schema
    }

    /// The enclosing namespace at the current point of the walk.
    pub fn namespace(&self) -> Option<&str> {
        self.current_namespace.as_deref()
    }

    /// Parse and compile a schema document.
    pub fn compile_str(&mut self, json: &str) -> Result<Codec, SchemaError> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| SchemaError::ParseError(format!("Invalid JSON: {}", e)))?;
        let codec = self.compile(&value)?;
        debug!(
            type_name = codec.type_name(),
            named_types = self.named_types.len(),
            "compiled schema"
        );
        Ok(codec)
    }

    /// Compile one schema node through the strategy.
    pub fn compile(&mut self, schema: &JsonValue) -> Result<Codec, SchemaError> {
        let strategy = self.strategy;
        match schema {
            JsonValue::String(name) => strategy.build_from_name(self, name),
            JsonValue::Object(obj) => strategy.build_from_object(self, obj),
            JsonValue::Array(members) => strategy.build_from_union(self, members),
            _ => Err(SchemaError::InvalidSchema(format!(
                "Expected string, object, or array, found: {}",
                schema
            ))),
        }
    }

    // ========================================================================
    // Standard builders
    // ========================================================================

    /// Resolve a primitive type or named type reference.
    pub fn build_name(&self, name: &str) -> Result<Codec, SchemaError> {
        if let Some(codec) = Codec::primitive(name) {
            return Ok(codec);
        }
        let qualified = Name::new(name, None, self.namespace()).fullname();
        // unqualified names fall back to the null namespace
        for candidate in [qualified.as_str(), name] {
            if let Some(codec) = self.named_types.get(candidate) {
                return Ok(codec.clone());
            }
            if let Some(record) = self.defining.get(candidate) {
                return Ok(Codec::reference(record));
            }
        }
        Err(SchemaError::UnsupportedType(format!("Unknown type: {}", name)))
    }

    /// Compile a complex type from a JSON object.
    pub fn build_object(&mut self, schema: &Map<String, JsonValue>) -> Result<Codec, SchemaError> {
        let type_value = schema
            .get("type")
            .ok_or_else(|| SchemaError::InvalidSchema("Missing 'type' field".to_string()))?;

        let type_str = match type_value {
            JsonValue::String(s) => s.as_str(),
            // {"type": {...}} or {"type": [...]}
            nested => return self.compile(nested),
        };

        match type_str {
            "record" | "error" => self.build_record(schema),
            "enum" => self.build_enum(schema),
            "array" => self.build_array(schema),
            "map" => self.build_map(schema),
            "fixed" => self.build_fixed(schema),
            // Primitives may appear as objects; logicalType annotations are
            // ignored and the base type is used
            other => self.build_name(other),
        }
    }

    /// Compile a union from its member schemas.
    pub fn build_union(
        &mut self,
        members: &[JsonValue],
        text_decoder: TextDecoder,
    ) -> Result<Codec, SchemaError> {
        let table = UnionTable::build(self, members)?;
        Ok(Codec::new(
            "union",
            CodecKind::Union(UnionCodec::new(table, text_decoder)),
        ))
    }

    /// Get a compiled named type from the registry.
    pub fn named_type(&self, fullname: &str) -> Option<&Codec> {
        self.named_types.get(fullname)
    }

    /// Get all registered named types.
    pub fn named_types(&self) -> &HashMap<String, Codec> {
        &self.named_types
    }

    fn build_record(&mut self, schema: &Map<String, JsonValue>) -> Result<Codec, SchemaError> {
        let name = self.declare(schema, "Record")?;
        let fullname = name.fullname();

        let fields = schema
            .get("fields")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                SchemaError::InvalidSchema("Record missing 'fields' array".to_string())
            })?;

        // Fields may refer back to the record while it is being defined
        let record = Codec::new(fullname.clone(), CodecKind::Record(RecordCodec::pending()));
        self.defining.insert(fullname.clone(), record.clone());

        // Nested definitions inherit the record's namespace
        let prev_namespace = std::mem::replace(&mut self.current_namespace, name.namespace);
        let fields = self.build_fields(&fullname, fields);
        self.current_namespace = prev_namespace;
        self.defining.remove(&fullname);

        let fields = fields?;
        if !record.as_record().is_some_and(|r| r.complete(fields)) {
            return Err(SchemaError::InvalidSchema(format!(
                "Record {} was compiled twice",
                fullname
            )));
        }
        self.register(record)
    }

    fn build_fields(
        &mut self,
        record: &str,
        fields: &[JsonValue],
    ) -> Result<Vec<FieldCodec>, SchemaError> {
        let mut compiled: Vec<FieldCodec> = Vec::with_capacity(fields.len());
        for field in fields {
            let obj = field
                .as_object()
                .ok_or_else(|| SchemaError::InvalidSchema("Field must be an object".to_string()))?;

            let name = obj
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| SchemaError::InvalidSchema("Field missing 'name'".to_string()))?;
            self.validate_name(name, "Field")?;
            if compiled.iter().any(|f| f.name() == name) {
                return Err(SchemaError::InvalidSchema(format!(
                    "Record {} has duplicate field '{}'",
                    record, name
                )));
            }

            let type_value = obj
                .get("type")
                .ok_or_else(|| SchemaError::InvalidSchema("Field missing 'type'".to_string()))?;
            let codec = self.compile(type_value)?;

            let default = obj
                .get("default")
                .map(|default| {
                    codec.decode_default(default).map_err(|e| {
                        SchemaError::InvalidSchema(format!(
                            "Field '{}' of {} has an invalid default: {}",
                            name, record, e
                        ))
                    })
                })
                .transpose()?;

            compiled.push(FieldCodec::new(name.to_string(), codec, default));
        }
        Ok(compiled)
    }

    fn build_enum(&mut self, schema: &Map<String, JsonValue>) -> Result<Codec, SchemaError> {
        let name = self.declare(schema, "Enum")?;

        let symbols = schema
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SchemaError::InvalidSchema("Enum missing 'symbols' array".to_string()))?
            .iter()
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| {
                    SchemaError::InvalidSchema(format!("Enum symbol must be a string: {}", v))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if symbols.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "Enum must have at least one symbol".to_string(),
            ));
        }
        for (i, symbol) in symbols.iter().enumerate() {
            self.validate_name(symbol, "Enum symbol")?;
            if symbols[..i].contains(symbol) {
                return Err(SchemaError::InvalidSchema(format!(
                    "Enum {} has duplicate symbol '{}'",
                    name.fullname(),
                    symbol
                )));
            }
        }

        self.register(Codec::new(name.fullname(), CodecKind::Enum(EnumCodec::new(symbols))))
    }

    fn build_fixed(&mut self, schema: &Map<String, JsonValue>) -> Result<Codec, SchemaError> {
        let name = self.declare(schema, "Fixed")?;

        let size = schema
            .get("size")
            .and_then(|v| v.as_u64())
            .and_then(|size| usize::try_from(size).ok())
            .ok_or_else(|| SchemaError::InvalidSchema("Fixed missing 'size' field".to_string()))?;

        self.register(Codec::new(name.fullname(), CodecKind::Fixed(FixedCodec::new(size))))
    }

    fn build_array(&mut self, schema: &Map<String, JsonValue>) -> Result<Codec, SchemaError> {
        let items = schema
            .get("items")
            .ok_or_else(|| SchemaError::InvalidSchema("Array missing 'items' field".to_string()))?;
        let items = self.compile(items)?;
        Ok(Codec::new("array", CodecKind::Array(items)))
    }

    fn build_map(&mut self, schema: &Map<String, JsonValue>) -> Result<Codec, SchemaError> {
        let values = schema
            .get("values")
            .ok_or_else(|| SchemaError::InvalidSchema("Map missing 'values' field".to_string()))?;
        let values = self.compile(values)?;
        Ok(Codec::new("map", CodecKind::Map(values)))
    }

    /// Resolve and validate the name of a named type definition.
    fn declare(&self, schema: &Map<String, JsonValue>, context: &str) -> Result<Name, SchemaError> {
        let raw = schema
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema(format!("{} missing 'name' field", context)))?;
        let namespace = schema.get("namespace").and_then(|v| v.as_str());
        let name = Name::new(raw, namespace, self.namespace());

        self.validate_name(&name.name, context)?;
        if let Some(ns) = &name.namespace {
            for part in ns.split('.') {
                self.validate_name(part, "Namespace")?;
            }
        }

        let fullname = name.fullname();
        if is_primitive(&fullname) {
            return Err(SchemaError::InvalidSchema(format!(
                "{} cannot redefine primitive type '{}'",
                context, fullname
            )));
        }
        if self.named_types.contains_key(&fullname) || self.defining.contains_key(&fullname) {
            return Err(SchemaError::DuplicateName(fullname));
        }
        Ok(name)
    }

    fn register(&mut self, codec: Codec) -> Result<Codec, SchemaError> {
        debug!(name = codec.type_name(), "registered named type");
        self.named_types
            .insert(codec.type_name().to_string(), codec.clone());
        Ok(codec)
    }

    /// Validate that a name follows Avro naming rules.
    fn validate_name(&self, name: &str, context: &str) -> Result<(), SchemaError> {
        match check_name(name, context) {
            Some(msg) if self.strict_schema => Err(SchemaError::InvalidSchema(msg)),
            Some(msg) => {
                warn!("{}", msg);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_primitive_names() {
        for name in ["null", "boolean", "int", "long", "float", "double", "bytes", "string"] {
            let codec = compile_schema(&format!("\"{}\"", name)).unwrap();
            assert_eq!(codec.type_name(), name);
        }
    }

    #[test]
    fn test_primitive_object_with_logical_type() {
        let codec = compile_schema(r#"{"type":"long","logicalType":"timestamp-millis"}"#).unwrap();
        assert_eq!(codec.type_name(), "long");
        let codec = compile_schema(r#"{"type":"string","logicalType":"no-such-thing"}"#).unwrap();
        assert_eq!(codec.type_name(), "string");
    }

    #[test]
    fn test_nested_namespace_inheritance() {
        let mut compiler = Compiler::new();
        compiler
            .compile_str(
                r#"{"type":"record","name":"Outer","namespace":"com.example","fields":[
                    {"name":"inner","type":{"type":"enum","name":"Color","symbols":["RED"]}},
                    {"name":"again","type":"Color"}
                ]}"#,
            )
            .unwrap();
        assert!(compiler.named_type("com.example.Outer").is_some());
        assert!(compiler.named_type("com.example.Color").is_some());
        assert_eq!(compiler.named_types().len(), 2);
    }

    #[test]
    fn test_with_namespace() {
        let mut compiler = Compiler::new().with_namespace("com.example");
        let codec = compiler
            .compile_str(r#"{"type":"fixed","name":"Hash","size":16}"#)
            .unwrap();
        assert_eq!(codec.type_name(), "com.example.Hash");
        assert_eq!(compiler.namespace(), Some("com.example"));
    }

    #[test]
    fn test_redefinition_is_rejected() {
        let result = compile_schema(
            r#"{"type":"record","name":"R","fields":[
                {"name":"a","type":{"type":"fixed","name":"F","size":1}},
                {"name":"b","type":{"type":"fixed","name":"F","size":2}}
            ]}"#,
        );
        assert!(matches!(result, Err(SchemaError::DuplicateName(name)) if name == "F"));
    }

    const LONG_LIST: &str = r#"{"type":"record","name":"LongList","fields":[
        {"name":"next","type":["null","LongList"],"default":null}
    ]}"#;

    /// Three linked nodes, the last one without a successor.
    fn long_list(tail: impl Fn(Value) -> Value) -> Value {
        let node = |next: Value| -> Value { [("next", next)].into_iter().collect() };
        node(tail(node(tail(node(Value::Null)))))
    }

    #[test]
    fn test_recursive_record_binary() {
        let codec = compile_schema(LONG_LIST).unwrap();
        assert_eq!(codec.type_name(), "LongList");

        let value = long_list(|next| Value::named("LongList", next));
        let encoded = codec.to_binary(&value).unwrap();
        assert_eq!(encoded, vec![0x02, 0x02, 0x00]);

        let (decoded, rest) = codec.decode_binary(&encoded).unwrap();
        assert_eq!(decoded, value);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_recursive_record_textual() {
        let codec = compile_schema(LONG_LIST).unwrap();
        let text = br#"{"next":{"LongList":{"next":{"LongList":{"next":null}}}}}"#;

        let (decoded, _) = codec.decode_textual(text).unwrap();
        assert_eq!(decoded, long_list(|next| Value::tagged("LongList", next)));
        assert_eq!(codec.to_textual(&decoded).unwrap(), text.to_vec());
        assert_eq!(codec.to_binary(&decoded).unwrap(), vec![0x02, 0x02, 0x00]);

        // the default fills in a missing successor
        let (decoded, _) = codec.decode_textual(b"{}").unwrap();
        assert_eq!(decoded, [("next", Value::Null)].into_iter().collect::<Value>());
    }

    #[test]
    fn test_recursive_reference_outlives_compiler() {
        let codec = {
            let mut compiler = Compiler::new();
            compiler.compile_str(LONG_LIST).unwrap()
        };
        let value = long_list(|next| Value::named("LongList", next));
        let encoded = codec.to_binary(&value).unwrap();
        assert_eq!(codec.decode_binary(&encoded).unwrap().0, value);
    }

    #[test]
    fn test_self_typed_default_is_rejected() {
        let result = compile_schema(
            r#"{"type":"record","name":"Node","fields":[
                {"name":"next","type":["Node","null"],"default":{"next":null}}
            ]}"#,
        );
        assert!(matches!(result, Err(SchemaError::InvalidSchema(_))));
    }

    #[test]
    fn test_unknown_reference() {
        assert!(matches!(
            compile_schema(r#""com.example.Missing""#),
            Err(SchemaError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            compile_schema("{not json"),
            Err(SchemaError::ParseError(_))
        ));
        assert!(matches!(
            compile_schema("42"),
            Err(SchemaError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_strict_names() {
        let schema = r#"{"type":"enum","name":"bad-name","symbols":["A"]}"#;
        assert!(Compiler::new().compile_str(schema).is_ok());
        assert!(Compiler::new().with_strict(true).compile_str(schema).is_err());
    }

    #[test]
    fn test_strict_nested_union() {
        let schema = r#"["null", ["int", "string"]]"#;
        assert!(Compiler::new().compile_str(schema).is_ok());
        assert!(matches!(
            Compiler::new().with_strict(true).compile_str(schema),
            Err(SchemaError::UnionMember { position: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_default_is_rejected() {
        let result = compile_schema(
            r#"{"type":"record","name":"R","fields":[
                {"name":"a","type":"int","default":"three"}
            ]}"#,
        );
        assert!(matches!(result, Err(SchemaError::InvalidSchema(_))));
    }

    #[test]
    fn test_enum_validation() {
        assert!(compile_schema(r#"{"type":"enum","name":"E","symbols":[]}"#).is_err());
        assert!(compile_schema(r#"{"type":"enum","name":"E","symbols":["A","A"]}"#).is_err());
        assert!(compile_schema(r#"{"type":"enum","name":"E","symbols":["A",1]}"#).is_err());
    }
}
