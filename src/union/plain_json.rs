//! Heuristic union decoding for plain JSON that carries no type tags.
//!
//! Candidate members are tried in an order chosen from the JSON token's shape;
//! the first member that accepts the token wins and the result is tagged with
//! that member's name, so it re-encodes unambiguously.

use serde_json::Value as JsonValue;
use tracing::trace;

use super::table::UnionTable;
use crate::error::DecodeError;
use crate::value::Value;

/// Tie-break between map and record members when the token is a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOrder {
    /// Try map members before records
    #[default]
    MapFirst,
    /// Try record members before maps
    RecordFirst,
}

/// Numbers favor the widest floating member first, then integers.
const NUMERIC_PRIORITY: [&str; 4] = ["double", "float", "long", "int"];

pub(crate) fn decode(
    table: &UnionTable,
    order: CompositeOrder,
    json: &JsonValue,
) -> Result<Value, DecodeError> {
    if json.is_null() {
        return match table.null_index() {
            Some(_) => Ok(Value::Null),
            None => Err(DecodeError::NoMatchingBranch {
                input: json.to_string(),
            }),
        };
    }

    for index in candidates(table, order, json) {
        let member = &table.members()[index];
        match member.decode_json(json) {
            Ok(value) => {
                trace!(member = member.type_name(), "plain JSON candidate accepted");
                return Ok(Value::tagged(member.type_name(), value));
            }
            Err(e) => {
                trace!(member = member.type_name(), error = %e, "plain JSON candidate rejected");
            }
        }
    }

    Err(DecodeError::NoMatchingBranch {
        input: json.to_string(),
    })
}

/// Member positions to try, in order.
fn candidates(table: &UnionTable, order: CompositeOrder, json: &JsonValue) -> Vec<usize> {
    let members = table.members();
    let non_null: Vec<usize> = (0..members.len())
        .filter(|&i| members[i].type_name() != "null")
        .collect();

    match json {
        JsonValue::Number(_) => {
            let mut ordered: Vec<usize> = NUMERIC_PRIORITY
                .iter()
                .filter_map(|name| table.index_of(name))
                .collect();
            let rest: Vec<usize> = non_null
                .into_iter()
                .filter(|i| !ordered.contains(i))
                .collect();
            ordered.extend(rest);
            ordered
        }
        JsonValue::Object(_) => {
            let (maps, others): (Vec<usize>, Vec<usize>) =
                non_null.into_iter().partition(|&i| members[i].is_map());
            let (records, rest): (Vec<usize>, Vec<usize>) =
                others.into_iter().partition(|&i| members[i].is_record());
            let (first, second) = match order {
                CompositeOrder::MapFirst => (maps, records),
                CompositeOrder::RecordFirst => (records, maps),
            };
            first.into_iter().chain(second).chain(rest).collect()
        }
        _ => non_null,
    }
}
