//! Avro union codecs.
//!
//! A union compiles into a [`UnionTable`] of member codecs plus a choice of
//! textual decoder. Binary encoding and decoding, as well as textual
//! encoding, are the same for every union; only the way JSON text is mapped
//! back onto a member differs:
//!
//! - [`TextDecoder::AvroJson`]: strict, requires `null` or a single-key tag
//! - [`TextDecoder::PlainJson`]: heuristic, tries members in a shape-driven
//!   order and accepts untagged JSON

mod binary;
mod plain_json;
mod table;
mod textual;

use serde_json::Value as JsonValue;

use crate::error::{DecodeError, EncodeError};
use crate::text;
use crate::value::Value;

pub use plain_json::CompositeOrder;
pub use table::{Branch, UnionTable};

/// How Avro-JSON text is decoded onto a union member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoder {
    /// `null` or `{"type-name": payload}`
    AvroJson,
    /// Untagged plain JSON
    PlainJson(CompositeOrder),
}

/// Compiled union state.
#[derive(Debug)]
pub struct UnionCodec {
    table: UnionTable,
    text_decoder: TextDecoder,
}

impl UnionCodec {
    pub(crate) fn new(table: UnionTable, text_decoder: TextDecoder) -> Self {
        Self {
            table,
            text_decoder,
        }
    }

    pub fn table(&self) -> &UnionTable {
        &self.table
    }

    pub fn text_decoder(&self) -> TextDecoder {
        self.text_decoder
    }

    pub(crate) fn read_binary(&self, data: &mut &[u8]) -> Result<Value, DecodeError> {
        binary::decode(&self.table, data)
    }

    pub(crate) fn write_binary(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        binary::encode(&self.table, value, out)
    }

    /// Decode one union value from the front of a text buffer.
    ///
    /// The null branch is only taken when the buffer starts with the literal
    /// `null`; every other value goes through the JSON reader.
    pub(crate) fn decode_text<'a>(&self, buf: &'a [u8]) -> Result<(Value, &'a [u8]), DecodeError> {
        if let Some(rest) = buf.strip_prefix(b"null") {
            if self.table.null_index().is_some() {
                return Ok((Value::Null, rest));
            }
        }
        let (json, rest) = text::read_value(buf)?;
        if json.is_null() && self.table.null_index().is_some() {
            return Err(DecodeError::InvalidData(format!(
                "cannot decode textual union: null must start the buffer; found {:?}",
                String::from_utf8_lossy(&buf[..buf.len() - rest.len()])
            )));
        }
        let value = self.decode_json(&json)?;
        Ok((value, rest))
    }

    pub(crate) fn decode_json(&self, json: &JsonValue) -> Result<Value, DecodeError> {
        match self.text_decoder {
            TextDecoder::AvroJson => textual::decode(&self.table, json),
            TextDecoder::PlainJson(order) => plain_json::decode(&self.table, order, json),
        }
    }

    pub(crate) fn encode_json(&self, value: &Value) -> Result<JsonValue, EncodeError> {
        textual::encode(&self.table, value)
    }

    /// A field default for a union is a value of its first member.
    pub(crate) fn decode_default(&self, json: &JsonValue) -> Result<Value, DecodeError> {
        let first = self
            .table
            .member(0)
            .ok_or_else(|| DecodeError::InvalidData("union has no members".to_string()))?;
        let value = first.decode_json(json)?;
        if value.is_null() {
            Ok(value)
        } else {
            Ok(Value::tagged(first.type_name(), value))
        }
    }
}
