//! Named complex types: records, enums and fixed.

use std::sync::OnceLock;

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use super::Codec;
use crate::binary;
use crate::error::{DecodeError, EncodeError};
use crate::text;
use crate::value::Value;

/// One compiled record field.
#[derive(Debug)]
pub struct FieldCodec {
    name: String,
    codec: Codec,
    default: Option<Value>,
}

impl FieldCodec {
    pub(crate) fn new(name: String, codec: Codec, default: Option<Value>) -> Self {
        Self {
            name,
            codec,
            default,
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field type
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Decoded default, used when a value omits the field.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Record state: fields in declaration order.
///
/// Record values are [`Value::Map`]s keyed by field name. The fields are
/// filled in once after compilation so that they can refer back to the
/// record itself.
#[derive(Debug, Default)]
pub struct RecordCodec {
    fields: OnceLock<Vec<FieldCodec>>,
}

impl RecordCodec {
    /// A record whose fields are still being compiled.
    pub(crate) fn pending() -> Self {
        Self::default()
    }

    /// Install the compiled fields. Returns false if they were already set.
    pub(crate) fn complete(&self, fields: Vec<FieldCodec>) -> bool {
        self.fields.set(fields).is_ok()
    }

    /// Compiled fields; empty while the record is still being compiled.
    pub fn fields(&self) -> &[FieldCodec] {
        self.fields.get().map(Vec::as_slice).unwrap_or(&[])
    }

    fn compiled<E>(
        &self,
        record_name: &str,
        error: impl FnOnce(String) -> E,
    ) -> Result<&[FieldCodec], E> {
        self.fields.get().map(Vec::as_slice).ok_or_else(|| {
            error(format!(
                "record {} is used before its fields are compiled",
                record_name
            ))
        })
    }

    pub(crate) fn read_binary(
        &self,
        record_name: &str,
        data: &mut &[u8],
    ) -> Result<Value, DecodeError> {
        let fields = self.compiled(record_name, DecodeError::InvalidData)?;
        let mut record = IndexMap::with_capacity(fields.len());
        for field in fields {
            record.insert(field.name.clone(), field.codec.read_binary(data)?);
        }
        Ok(Value::Map(record))
    }

    pub(crate) fn write_binary(
        &self,
        record_name: &str,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let Value::Map(record) = value else {
            return Err(EncodeError::mismatch(record_name, value));
        };
        for field in self.compiled(record_name, EncodeError::InvalidValue)? {
            let field_value = field_value(record_name, field, record)?;
            field.codec.write_binary(field_value, out)?;
        }
        Ok(())
    }

    pub(crate) fn decode_json(
        &self,
        record_name: &str,
        json: &JsonValue,
    ) -> Result<Value, DecodeError> {
        let JsonValue::Object(object) = json else {
            return Err(text::mismatch(record_name, json));
        };
        let fields = self.compiled(record_name, DecodeError::InvalidData)?;
        if let Some(unknown) = object
            .keys()
            .find(|key| !fields.iter().any(|f| f.name == **key))
        {
            return Err(DecodeError::TypeMismatch(format!(
                "record {} has no field '{}'",
                record_name, unknown
            )));
        }

        let mut record = IndexMap::with_capacity(fields.len());
        for field in fields {
            let value = match (object.get(&field.name), &field.default) {
                (Some(json), _) => field.codec.decode_json(json)?,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(DecodeError::TypeMismatch(format!(
                        "record {} is missing field '{}'",
                        record_name, field.name
                    )))
                }
            };
            record.insert(field.name.clone(), value);
        }
        Ok(Value::Map(record))
    }

    pub(crate) fn encode_json(
        &self,
        record_name: &str,
        value: &Value,
    ) -> Result<JsonValue, EncodeError> {
        let Value::Map(record) = value else {
            return Err(EncodeError::mismatch(record_name, value));
        };
        let mut object = Map::new();
        for field in self.compiled(record_name, EncodeError::InvalidValue)? {
            let field_value = field_value(record_name, field, record)?;
            object.insert(field.name.clone(), field.codec.encode_json(field_value)?);
        }
        Ok(JsonValue::Object(object))
    }
}

/// Field value from the record, falling back to the field default.
fn field_value<'a>(
    record_name: &str,
    field: &'a FieldCodec,
    record: &'a IndexMap<String, Value>,
) -> Result<&'a Value, EncodeError> {
    record
        .get(&field.name)
        .or(field.default.as_ref())
        .ok_or_else(|| {
            EncodeError::InvalidValue(format!(
                "cannot encode record {}: missing field '{}' which has no default",
                record_name, field.name
            ))
        })
}

/// Enum state: the ordered symbol list.
#[derive(Debug)]
pub struct EnumCodec {
    symbols: Vec<String>,
}

impl EnumCodec {
    pub(crate) fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn position(&self, enum_name: &str, value: &Value) -> Result<usize, EncodeError> {
        let Value::String(symbol) = value else {
            return Err(EncodeError::mismatch(enum_name, value));
        };
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .ok_or_else(|| {
                EncodeError::InvalidValue(format!(
                    "cannot encode enum {}: value ought to be member of symbols: {:?}; {:?}",
                    enum_name, self.symbols, symbol
                ))
            })
    }

    pub(crate) fn read_binary(&self, enum_name: &str, data: &mut &[u8]) -> Result<Value, DecodeError> {
        let index = binary::decode_long(data)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.symbols.get(i))
            .map(|symbol| Value::String(symbol.clone()))
            .ok_or_else(|| {
                DecodeError::InvalidData(format!(
                    "cannot decode enum {}: index ought to be between 0 and {}; read index: {}",
                    enum_name,
                    self.symbols.len().saturating_sub(1),
                    index
                ))
            })
    }

    pub(crate) fn write_binary(
        &self,
        enum_name: &str,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        let index = self.position(enum_name, value)?;
        binary::write_long(out, index as i64);
        Ok(())
    }

    pub(crate) fn decode_json(&self, enum_name: &str, json: &JsonValue) -> Result<Value, DecodeError> {
        let JsonValue::String(symbol) = json else {
            return Err(text::mismatch(enum_name, json));
        };
        if !self.symbols.contains(symbol) {
            return Err(DecodeError::InvalidData(format!(
                "cannot decode enum {}: {:?} is not one of {:?}",
                enum_name, symbol, self.symbols
            )));
        }
        Ok(Value::String(symbol.clone()))
    }

    pub(crate) fn encode_json(&self, enum_name: &str, value: &Value) -> Result<JsonValue, EncodeError> {
        let index = self.position(enum_name, value)?;
        Ok(JsonValue::String(self.symbols[index].clone()))
    }
}

/// Fixed state: the byte count every value must have.
#[derive(Debug)]
pub struct FixedCodec {
    size: usize,
}

impl FixedCodec {
    pub(crate) fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn checked<'v>(&self, fixed_name: &str, value: &'v Value) -> Result<&'v [u8], EncodeError> {
        let Value::Bytes(bytes) = value else {
            return Err(EncodeError::mismatch(fixed_name, value));
        };
        if bytes.len() != self.size {
            return Err(EncodeError::InvalidValue(format!(
                "cannot encode fixed {}: expected {} bytes, received {}",
                fixed_name,
                self.size,
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    pub(crate) fn read_binary(&self, data: &mut &[u8]) -> Result<Value, DecodeError> {
        binary::decode_fixed(data, self.size).map(Value::Bytes)
    }

    pub(crate) fn write_binary(
        &self,
        fixed_name: &str,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        out.extend_from_slice(self.checked(fixed_name, value)?);
        Ok(())
    }

    pub(crate) fn decode_json(&self, fixed_name: &str, json: &JsonValue) -> Result<Value, DecodeError> {
        let bytes = text::bytes_from_json(fixed_name, json)?;
        if bytes.len() != self.size {
            return Err(DecodeError::InvalidData(format!(
                "cannot decode fixed {}: expected {} bytes, found {}",
                fixed_name,
                self.size,
                bytes.len()
            )));
        }
        Ok(Value::Bytes(bytes))
    }

    pub(crate) fn encode_json(&self, fixed_name: &str, value: &Value) -> Result<JsonValue, EncodeError> {
        Ok(text::bytes_to_json(self.checked(fixed_name, value)?))
    }
}
