//! Builder strategies: the compiler's pluggable construction hooks.
//!
//! The compiler hands every schema node to its strategy, which normally
//! delegates straight back to the compiler's standard builders. A strategy
//! overrides only the hook it changes; in practice that is how unions get
//! their textual decoder. The same strategy reference is used for every
//! nested node, so a union buried inside a record, array or map is built the
//! same way as a top-level one.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use super::Compiler;
use crate::codec::Codec;
use crate::error::SchemaError;
use crate::union::{CompositeOrder, TextDecoder};

/// Construction hooks for the three JSON shapes a schema node can take.
pub trait BuilderStrategy: fmt::Debug {
    /// A JSON string: primitive name or named type reference.
    fn build_from_name(&self, compiler: &mut Compiler<'_>, name: &str) -> Result<Codec, SchemaError> {
        compiler.build_name(name)
    }

    /// A JSON object: complex type definition.
    fn build_from_object(
        &self,
        compiler: &mut Compiler<'_>,
        schema: &Map<String, JsonValue>,
    ) -> Result<Codec, SchemaError> {
        compiler.build_object(schema)
    }

    /// A JSON array: union.
    fn build_from_union(
        &self,
        compiler: &mut Compiler<'_>,
        members: &[JsonValue],
    ) -> Result<Codec, SchemaError> {
        compiler.build_union(members, TextDecoder::AvroJson)
    }
}

/// Standard Avro-JSON unions: `null` or `{"type-name": payload}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvroJsonStrategy;

impl BuilderStrategy for AvroJsonStrategy {}

/// Unions that accept untagged plain JSON on textual decode.
///
/// Encoding is unchanged and still emits Avro-JSON tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJsonStrategy {
    pub composite_order: CompositeOrder,
}

impl PlainJsonStrategy {
    pub fn new(composite_order: CompositeOrder) -> Self {
        Self { composite_order }
    }
}

impl BuilderStrategy for PlainJsonStrategy {
    fn build_from_union(
        &self,
        compiler: &mut Compiler<'_>,
        members: &[JsonValue],
    ) -> Result<Codec, SchemaError> {
        compiler.build_union(members, TextDecoder::PlainJson(self.composite_order))
    }
}

/// Only optional values: every union must be `["null", T]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullableStrategy;

impl BuilderStrategy for NullableStrategy {
    fn build_from_union(
        &self,
        compiler: &mut Compiler<'_>,
        members: &[JsonValue],
    ) -> Result<Codec, SchemaError> {
        if members.len() != 2 {
            return Err(SchemaError::InvalidSchema(format!(
                "nullable union must have exactly 2 members; found {}",
                members.len()
            )));
        }
        if !is_null_schema(&members[0]) {
            return Err(SchemaError::InvalidSchema(
                "nullable union must declare \"null\" as its first member".to_string(),
            ));
        }
        compiler.build_union(members, TextDecoder::AvroJson)
    }
}

fn is_null_schema(schema: &JsonValue) -> bool {
    match schema {
        JsonValue::String(name) => name == "null",
        JsonValue::Object(obj) => obj.get("type").and_then(|t| t.as_str()) == Some("null"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_null_schema() {
        assert!(is_null_schema(&json!("null")));
        assert!(is_null_schema(&json!({"type": "null"})));
        assert!(!is_null_schema(&json!("int")));
        assert!(!is_null_schema(&json!(["null"])));
    }

    #[test]
    fn test_plain_json_default_order() {
        assert_eq!(
            PlainJsonStrategy::default().composite_order,
            CompositeOrder::MapFirst
        );
    }
}
