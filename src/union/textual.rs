//! Avro-JSON union encoding: `null`, or a single-key object naming the member.

use serde_json::{Map, Value as JsonValue};

use super::table::UnionTable;
use crate::error::{DecodeError, EncodeError};
use crate::text;
use crate::value::Value;

pub(crate) fn decode(table: &UnionTable, json: &JsonValue) -> Result<Value, DecodeError> {
    match json {
        JsonValue::Null if table.null_index().is_some() => Ok(Value::Null),
        JsonValue::Object(object) if object.len() == 1 => {
            let Some((name, payload)) = object.iter().next() else {
                return Err(shape_error(table, json));
            };
            let member = table.codec_named(name).ok_or_else(|| {
                DecodeError::UnknownUnionBranch(format!(
                    "tag '{}' names no member; allowed types: {:?}",
                    name,
                    table.allowed_type_names()
                ))
            })?;
            let value = member.decode_json(payload)?;
            Ok(Value::tagged(name.clone(), value))
        }
        other => Err(shape_error(table, other)),
    }
}

pub(crate) fn encode(table: &UnionTable, value: &Value) -> Result<JsonValue, EncodeError> {
    let branch = table.select_branch(value)?;
    let member = &table.members()[branch.index];
    let payload = member.encode_json(&branch.payload)?;
    if payload.is_null() && member.type_name() == "null" {
        return Ok(JsonValue::Null);
    }
    let mut tag = Map::with_capacity(1);
    tag.insert(member.type_name().to_string(), payload);
    Ok(JsonValue::Object(tag))
}

fn shape_error(table: &UnionTable, json: &JsonValue) -> DecodeError {
    DecodeError::UnknownUnionBranch(format!(
        "expected null or a single-key object naming one of {:?}; found JSON {}",
        table.allowed_type_names(),
        text::json_kind(json)
    ))
}
