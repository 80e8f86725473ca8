//! Compiled Avro type codecs.
//!
//! A [`Codec`] is built once from a schema node and is immutable afterwards.
//! It is a cheap handle around shared state, so clones can be handed to any
//! number of threads. Every operation is a pure function from a buffer or a
//! value to a result.
//!
//! # Operations
//! - [`Codec::decode_binary`] / [`Codec::encode_binary`]: Avro binary encoding
//! - [`Codec::decode_textual`] / [`Codec::encode_textual`]: Avro-JSON encoding

mod complex;

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::binary;
use crate::error::{DecodeError, EncodeError, SchemaError};
use crate::numeric;
use crate::schema::{BuilderStrategy, Compiler};
use crate::text;
use crate::union::UnionCodec;
use crate::value::Value;

pub use complex::{EnumCodec, FieldCodec, FixedCodec, RecordCodec};

/// An immutable, compiled representation of one Avro type.
#[derive(Debug, Clone)]
pub struct Codec(Arc<CodecNode>);

#[derive(Debug)]
pub(crate) struct CodecNode {
    /// Canonical full type name
    type_name: String,
    kind: CodecKind,
}

/// Per-type encoding state.
#[derive(Debug)]
pub(crate) enum CodecKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array(Codec),
    Map(Codec),
    Record(RecordCodec),
    Enum(EnumCodec),
    Fixed(FixedCodec),
    Union(UnionCodec),
    /// Back-reference to a record from inside its own definition
    Reference(Weak<CodecNode>),
}

impl Codec {
    /// Compile a schema document with the strict Avro-JSON strategy.
    ///
    /// # Example
    /// ```
    /// use avro_union::{Codec, Value};
    ///
    /// let codec = Codec::from_schema(r#"["null","int"]"#).unwrap();
    /// assert_eq!(codec.to_binary(&Value::Int(3)).unwrap(), vec![0x02, 0x06]);
    /// ```
    pub fn from_schema(schema: &str) -> Result<Codec, SchemaError> {
        Compiler::new().compile_str(schema)
    }

    /// Compile a schema document with a caller-chosen builder strategy.
    pub fn from_schema_with(
        schema: &str,
        strategy: &dyn BuilderStrategy,
    ) -> Result<Codec, SchemaError> {
        Compiler::with_strategy(strategy).compile_str(schema)
    }

    pub(crate) fn new(type_name: impl Into<String>, kind: CodecKind) -> Codec {
        Codec(Arc::new(CodecNode {
            type_name: type_name.into(),
            kind,
        }))
    }

    /// Weak handle to a record that is still being compiled.
    pub(crate) fn reference(record: &Codec) -> Codec {
        Codec::new(
            record.type_name(),
            CodecKind::Reference(Arc::downgrade(&record.0)),
        )
    }

    /// Codec for a primitive type name, if it is one.
    pub(crate) fn primitive(name: &str) -> Option<Codec> {
        let kind = match name {
            "null" => CodecKind::Null,
            "boolean" => CodecKind::Boolean,
            "int" => CodecKind::Int,
            "long" => CodecKind::Long,
            "float" => CodecKind::Float,
            "double" => CodecKind::Double,
            "bytes" => CodecKind::Bytes,
            "string" => CodecKind::String,
            _ => return None,
        };
        Some(Codec::new(name, kind))
    }

    /// Canonical full type name (`"int"`, `"map"`, `"union"`, `"com.example.Rec"`, ...).
    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    /// The union state, if this codec is a union.
    pub fn as_union(&self) -> Option<&UnionCodec> {
        match &self.0.kind {
            CodecKind::Union(u) => Some(u),
            _ => None,
        }
    }

    pub(crate) fn is_union(&self) -> bool {
        matches!(self.0.kind, CodecKind::Union(_))
    }

    pub(crate) fn is_map(&self) -> bool {
        matches!(self.0.kind, CodecKind::Map(_))
    }

    pub(crate) fn is_record(&self) -> bool {
        matches!(self.0.kind, CodecKind::Record(_) | CodecKind::Reference(_))
    }

    /// The record state, if this codec defines a record.
    pub(crate) fn as_record(&self) -> Option<&RecordCodec> {
        match &self.0.kind {
            CodecKind::Record(record) => Some(record),
            _ => None,
        }
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    /// Decode one value from the front of `buf`, returning it with the unread rest.
    pub fn decode_binary<'a>(&self, buf: &'a [u8]) -> Result<(Value, &'a [u8]), DecodeError> {
        let mut cursor = buf;
        let value = self.read_binary(&mut cursor)?;
        Ok((value, cursor))
    }

    /// Append the binary encoding of `value` to `buf`.
    ///
    /// On failure `buf` is left exactly as it was.
    pub fn encode_binary(&self, buf: &mut Vec<u8>, value: &Value) -> Result<(), EncodeError> {
        let start = buf.len();
        self.write_binary(value, buf).map_err(|e| {
            buf.truncate(start);
            e
        })
    }

    /// Binary encoding of `value` in a fresh buffer.
    pub fn to_binary(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.write_binary(value, &mut out)?;
        Ok(out)
    }

    /// Decode one Avro-JSON value from the front of `buf`, returning it with the unread rest.
    pub fn decode_textual<'a>(&self, buf: &'a [u8]) -> Result<(Value, &'a [u8]), DecodeError> {
        if let CodecKind::Union(union) = &self.0.kind {
            return union.decode_text(buf);
        }
        let (json, rest) = text::read_value(buf)?;
        let value = self.decode_json(&json)?;
        Ok((value, rest))
    }

    /// Append the Avro-JSON encoding of `value` to `buf`.
    ///
    /// On failure `buf` is left exactly as it was.
    pub fn encode_textual(&self, buf: &mut Vec<u8>, value: &Value) -> Result<(), EncodeError> {
        let json = self.encode_json(value)?;
        serde_json::to_writer(&mut *buf, &json)
            .map_err(|e| EncodeError::InvalidValue(e.to_string()))
    }

    /// Avro-JSON encoding of `value` in a fresh buffer.
    pub fn to_textual(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.encode_textual(&mut out, value)?;
        Ok(out)
    }

    // ========================================================================
    // Binary
    // ========================================================================

    pub(crate) fn read_binary(&self, data: &mut &[u8]) -> Result<Value, DecodeError> {
        let value = match &self.0.kind {
            CodecKind::Null => Value::Null,
            CodecKind::Boolean => Value::Boolean(binary::decode_boolean(data)?),
            CodecKind::Int => Value::Int(binary::decode_int(data)?),
            CodecKind::Long => Value::Long(binary::decode_long(data)?),
            CodecKind::Float => Value::Float(binary::decode_float(data)?),
            CodecKind::Double => Value::Double(binary::decode_double(data)?),
            CodecKind::Bytes => Value::Bytes(binary::decode_bytes(data)?),
            CodecKind::String => Value::String(binary::decode_string(data)?),
            CodecKind::Array(items) => Value::Array(read_array(items, data)?),
            CodecKind::Map(values) => Value::Map(read_map(values, data)?),
            CodecKind::Record(record) => record.read_binary(&self.0.type_name, data)?,
            CodecKind::Enum(symbols) => symbols.read_binary(&self.0.type_name, data)?,
            CodecKind::Fixed(fixed) => fixed.read_binary(data)?,
            CodecKind::Union(union) => union.read_binary(data)?,
            CodecKind::Reference(record) => {
                self.referent(record, DecodeError::InvalidData)?.read_binary(data)?
            }
        };
        Ok(value)
    }

    pub(crate) fn write_binary(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let value = self.unwrap_named(value)?;
        match &self.0.kind {
            CodecKind::Null => match value {
                Value::Null => {}
                other => return Err(EncodeError::mismatch("null", other)),
            },
            CodecKind::Boolean => match value {
                Value::Boolean(b) => binary::write_boolean(out, *b),
                other => return Err(EncodeError::mismatch("boolean", other)),
            },
            CodecKind::Int => binary::write_long(out, numeric::coerce_int(value)?.into()),
            CodecKind::Long => binary::write_long(out, numeric::coerce_long(value)?),
            CodecKind::Float => binary::write_float(out, numeric::coerce_float(value)?),
            CodecKind::Double => binary::write_double(out, numeric::coerce_double(value)?),
            CodecKind::Bytes => match value {
                Value::Bytes(b) => binary::write_bytes(out, b),
                Value::String(s) => binary::write_bytes(out, s.as_bytes()),
                other => return Err(EncodeError::mismatch("bytes", other)),
            },
            CodecKind::String => match value {
                Value::String(s) => binary::write_bytes(out, s.as_bytes()),
                other => return Err(EncodeError::mismatch("string", other)),
            },
            CodecKind::Array(items) => match value {
                Value::Array(values) => write_array(items, values, out)?,
                other => return Err(EncodeError::mismatch("array", other)),
            },
            CodecKind::Map(values) => match value {
                Value::Map(entries) => write_map(values, entries, out)?,
                other => return Err(EncodeError::mismatch("map", other)),
            },
            CodecKind::Record(record) => record.write_binary(&self.0.type_name, value, out)?,
            CodecKind::Enum(symbols) => symbols.write_binary(&self.0.type_name, value, out)?,
            CodecKind::Fixed(fixed) => fixed.write_binary(&self.0.type_name, value, out)?,
            CodecKind::Union(union) => union.write_binary(value, out)?,
            CodecKind::Reference(record) => self
                .referent(record, EncodeError::InvalidValue)?
                .write_binary(value, out)?,
        }
        Ok(())
    }

    // ========================================================================
    // Avro-JSON
    // ========================================================================

    pub(crate) fn decode_json(&self, json: &JsonValue) -> Result<Value, DecodeError> {
        match &self.0.kind {
            CodecKind::Null => match json {
                JsonValue::Null => Ok(Value::Null),
                other => Err(text::mismatch("null", other)),
            },
            CodecKind::Boolean => json
                .as_bool()
                .map(Value::Boolean)
                .ok_or_else(|| text::mismatch("boolean", json)),
            CodecKind::Int => text::integer_from_json("int", json, i32::MIN.into(), i32::MAX.into())
                .map(|i| Value::Int(i as i32)),
            CodecKind::Long => {
                text::integer_from_json("long", json, i64::MIN, i64::MAX).map(Value::Long)
            }
            CodecKind::Float => text::float_from_json(json).map(Value::Float),
            CodecKind::Double => text::double_from_json(json).map(Value::Double),
            CodecKind::Bytes => text::bytes_from_json("bytes", json).map(Value::Bytes),
            CodecKind::String => match json {
                JsonValue::String(s) => Ok(Value::String(s.clone())),
                other => Err(text::mismatch("string", other)),
            },
            CodecKind::Array(items) => match json {
                JsonValue::Array(values) => values
                    .iter()
                    .map(|item| items.decode_json(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => Err(text::mismatch("array", other)),
            },
            CodecKind::Map(values) => match json {
                JsonValue::Object(entries) => entries
                    .iter()
                    .map(|(key, entry)| Ok((key.clone(), values.decode_json(entry)?)))
                    .collect::<Result<IndexMap<_, _>, DecodeError>>()
                    .map(Value::Map),
                other => Err(text::mismatch("map", other)),
            },
            CodecKind::Record(record) => record.decode_json(&self.0.type_name, json),
            CodecKind::Enum(symbols) => symbols.decode_json(&self.0.type_name, json),
            CodecKind::Fixed(fixed) => fixed.decode_json(&self.0.type_name, json),
            CodecKind::Union(union) => union.decode_json(json),
            CodecKind::Reference(record) => {
                self.referent(record, DecodeError::InvalidData)?.decode_json(json)
            }
        }
    }

    pub(crate) fn encode_json(&self, value: &Value) -> Result<JsonValue, EncodeError> {
        let value = self.unwrap_named(value)?;
        match &self.0.kind {
            CodecKind::Null => match value {
                Value::Null => Ok(JsonValue::Null),
                other => Err(EncodeError::mismatch("null", other)),
            },
            CodecKind::Boolean => match value {
                Value::Boolean(b) => Ok(JsonValue::Bool(*b)),
                other => Err(EncodeError::mismatch("boolean", other)),
            },
            CodecKind::Int => Ok(JsonValue::from(numeric::coerce_int(value)?)),
            CodecKind::Long => Ok(JsonValue::from(numeric::coerce_long(value)?)),
            CodecKind::Float => text::float_to_json(numeric::coerce_float(value)?),
            CodecKind::Double => text::double_to_json(numeric::coerce_double(value)?),
            CodecKind::Bytes => match value {
                Value::Bytes(b) => Ok(text::bytes_to_json(b)),
                Value::String(s) => Ok(text::bytes_to_json(s.as_bytes())),
                other => Err(EncodeError::mismatch("bytes", other)),
            },
            CodecKind::String => match value {
                Value::String(s) => Ok(JsonValue::String(s.clone())),
                other => Err(EncodeError::mismatch("string", other)),
            },
            CodecKind::Array(items) => match value {
                Value::Array(values) => values
                    .iter()
                    .map(|item| items.encode_json(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(JsonValue::Array),
                other => Err(EncodeError::mismatch("array", other)),
            },
            CodecKind::Map(values) => match value {
                Value::Map(entries) => entries
                    .iter()
                    .map(|(key, entry)| Ok((key.clone(), values.encode_json(entry)?)))
                    .collect::<Result<Map<_, _>, EncodeError>>()
                    .map(JsonValue::Object),
                other => Err(EncodeError::mismatch("map", other)),
            },
            CodecKind::Record(record) => record.encode_json(&self.0.type_name, value),
            CodecKind::Enum(symbols) => symbols.encode_json(&self.0.type_name, value),
            CodecKind::Fixed(fixed) => fixed.encode_json(&self.0.type_name, value),
            CodecKind::Union(union) => union.encode_json(value),
            CodecKind::Reference(record) => {
                self.referent(record, EncodeError::InvalidValue)?.encode_json(value)
            }
        }
    }

    /// Interpret a field default written in the schema.
    ///
    /// Union defaults belong to the union's first member.
    pub(crate) fn decode_default(&self, json: &JsonValue) -> Result<Value, DecodeError> {
        match &self.0.kind {
            CodecKind::Union(union) => union.decode_default(json),
            _ => self.decode_json(json),
        }
    }

    /// Follow a back-reference to its record.
    ///
    /// Fails only once every handle to the record itself has been dropped.
    fn referent<E>(
        &self,
        record: &Weak<CodecNode>,
        error: impl FnOnce(String) -> E,
    ) -> Result<Codec, E> {
        record.upgrade().map(Codec).ok_or_else(|| {
            error(format!(
                "record {} was dropped while a recursive reference to it is in use",
                self.0.type_name
            ))
        })
    }

    /// Strip a [`Value::Named`] wrapper carrying this codec's own name.
    ///
    /// Unions see any other wrapper untouched since it selects their branch.
    fn unwrap_named<'v>(&self, value: &'v Value) -> Result<&'v Value, EncodeError> {
        match value {
            Value::Named(name, inner) if *name == self.0.type_name => Ok(inner),
            Value::Named(..) if !self.is_union() => {
                Err(EncodeError::mismatch(&self.0.type_name, value))
            }
            _ => Ok(value),
        }
    }
}

/// Most items one array may decode without consuming input (nulls, empty
/// records). Every other item is bounded by the bytes left in the buffer.
pub const MAX_EMPTY_ITEMS: usize = 1 << 20;

/// Decode an array of values.
///
/// Avro arrays are encoded as a series of blocks, each an item count
/// followed by the items; a zero count ends the array.
fn read_array(items: &Codec, data: &mut &[u8]) -> Result<Vec<Value>, DecodeError> {
    let mut values = Vec::new();
    let mut empty_items = 0usize;
    loop {
        let count = binary::decode_block_count(data)?;
        if count == 0 {
            return Ok(values);
        }
        // a corrupt count must not trigger a huge allocation
        values.reserve(count.min(data.len()));
        for _ in 0..count {
            let remaining = data.len();
            values.push(items.read_binary(data)?);
            if data.len() == remaining {
                empty_items += 1;
                if empty_items > MAX_EMPTY_ITEMS {
                    return Err(DecodeError::InvalidData(format!(
                        "array of {} holds more than {} items without payload",
                        items.type_name(),
                        MAX_EMPTY_ITEMS
                    )));
                }
            }
        }
    }
}

/// Decode a map with string keys, block encoded like arrays.
///
/// Every entry consumes at least its key's length prefix.
fn read_map(values: &Codec, data: &mut &[u8]) -> Result<IndexMap<String, Value>, DecodeError> {
    let mut entries = IndexMap::new();
    loop {
        let count = binary::decode_block_count(data)?;
        if count == 0 {
            return Ok(entries);
        }
        entries.reserve(count.min(data.len()));
        for _ in 0..count {
            let key = binary::decode_string(data)?;
            let value = values.read_binary(data)?;
            entries.insert(key, value);
        }
    }
}

fn write_array(items: &Codec, values: &[Value], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    if !values.is_empty() {
        binary::write_long(out, values.len() as i64);
        for value in values {
            items.write_binary(value, out)?;
        }
    }
    binary::write_long(out, 0);
    Ok(())
}

fn write_map(
    values: &Codec,
    entries: &IndexMap<String, Value>,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    if !entries.is_empty() {
        binary::write_long(out, entries.len() as i64);
        for (key, value) in entries {
            binary::write_bytes(out, key.as_bytes());
            values.write_binary(value, out)?;
        }
    }
    binary::write_long(out, 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(schema: &str) -> Codec {
        Codec::from_schema(schema).unwrap()
    }

    #[test]
    fn test_codec_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codec>();
    }

    #[test]
    fn test_primitive_binary() {
        assert_eq!(codec(r#""int""#).to_binary(&Value::Int(3)).unwrap(), vec![0x06]);
        assert_eq!(codec(r#""long""#).to_binary(&Value::Int(-1)).unwrap(), vec![0x01]);
        assert_eq!(codec(r#""boolean""#).to_binary(&Value::Boolean(true)).unwrap(), vec![0x01]);
        assert!(codec(r#""null""#).to_binary(&Value::Null).unwrap().is_empty());
        assert_eq!(
            codec(r#""string""#).to_binary(&Value::from("He")).unwrap(),
            vec![0x04, b'H', b'e']
        );
    }

    #[test]
    fn test_primitive_type_mismatch() {
        assert!(matches!(
            codec(r#""boolean""#).to_binary(&Value::Int(1)),
            Err(EncodeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            codec(r#""string""#).to_binary(&Value::Null),
            Err(EncodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_encode_binary_failure_leaves_buffer() {
        let codec = codec(r#"{"type":"array","items":"int"}"#);
        let mut buf = vec![0xAA];
        let value = Value::Array(vec![Value::Int(1), Value::from("two")]);
        assert!(codec.encode_binary(&mut buf, &value).is_err());
        assert_eq!(buf, vec![0xAA]);
    }

    #[test]
    fn test_decode_binary_returns_remainder() {
        let codec = codec(r#""int""#);
        let (value, rest) = codec.decode_binary(&[0x06, 0xFF]).unwrap();
        assert_eq!(value, Value::Int(3));
        assert_eq!(rest, &[0xFF]);
    }

    #[test]
    fn test_array_and_map_blocks() {
        let array = codec(r#"{"type":"array","items":"int"}"#);
        let encoded = array
            .to_binary(&Value::Array(vec![Value::Int(1), Value::Int(2)]))
            .unwrap();
        assert_eq!(encoded, vec![0x04, 0x02, 0x04, 0x00]);
        assert_eq!(array.to_binary(&Value::Array(vec![])).unwrap(), vec![0x00]);

        let map = codec(r#"{"type":"map","values":"string"}"#);
        let value: Value = [("He", "Helium")].into_iter().collect();
        let encoded = map.to_binary(&value).unwrap();
        assert_eq!(encoded, b"\x02\x04He\x0cHelium\x00".to_vec());
        let (decoded, rest) = map.decode_binary(&encoded).unwrap();
        assert_eq!(decoded, value);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_named_wrapper_must_match() {
        let map = codec(r#"{"type":"map","values":"int"}"#);
        let inner: Value = [("a", 1)].into_iter().collect();
        assert!(map.to_binary(&Value::named("map", inner.clone())).is_ok());
        assert!(matches!(
            map.to_binary(&Value::named("record", inner)),
            Err(EncodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_textual_primitives() {
        assert_eq!(codec(r#""int""#).to_textual(&Value::Int(3)).unwrap(), b"3");
        assert_eq!(
            codec(r#""string""#).to_textual(&Value::from("some string 22")).unwrap(),
            br#""some string 22""#
        );
        assert_eq!(
            codec(r#""bytes""#).to_textual(&Value::Bytes(vec![0x41, 0xFF])).unwrap(),
            "\"A\u{FF}\"".as_bytes()
        );
        let (value, rest) = codec(r#""double""#).decode_textual(b"6.77 ").unwrap();
        assert_eq!(value, Value::Double(6.77));
        assert_eq!(rest, b" ");
    }

    #[test]
    fn test_corrupt_array_count_does_not_allocate() {
        let array = codec(r#"{"type":"array","items":"long"}"#);
        // huge positive block count followed by nothing
        let buf = [0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(matches!(
            array.decode_binary(&buf),
            Err(DecodeError::UnexpectedEof)
        ));
    }
}
