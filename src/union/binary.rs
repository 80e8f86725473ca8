//! Avro binary union encoding: a zigzag discriminant followed by the
//! selected member's own encoding.

use super::table::UnionTable;
use crate::binary;
use crate::codec::Codec;
use crate::error::{DecodeError, EncodeError};
use crate::value::Value;

pub(crate) fn decode(table: &UnionTable, data: &mut &[u8]) -> Result<Value, DecodeError> {
    let index = binary::decode_long(data)?;
    let (position, member) = usize::try_from(index)
        .ok()
        .and_then(|i| table.member(i).map(|m| (i + 1, m)))
        .ok_or(DecodeError::UnionIndexOutOfRange {
            index,
            max: table.len() as i64 - 1,
        })?;

    let value = member
        .read_binary(data)
        .map_err(|e| DecodeError::UnionMember {
            position,
            source: Box::new(e),
        })?;
    Ok(present(member, value))
}

pub(crate) fn encode(table: &UnionTable, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let branch = table.select_branch(value)?;
    binary::write_long(out, branch.index as i64);
    table.members()[branch.index].write_binary(&branch.payload, out)
}

/// Shape a decoded member value for the caller.
///
/// Values whose own type name is the member's name come back bare; everything
/// else (records, enums, fixed, maps) is wrapped with the member's name so it
/// can be fed straight back to the encoder.
fn present(member: &Codec, value: Value) -> Value {
    if value.is_null() || value.type_name() == Some(member.type_name()) {
        value
    } else {
        Value::Named(member.type_name().to_string(), Box::new(value))
    }
}
