//! Avro-JSON text helpers.
//!
//! Textual decoding reads exactly one JSON value off the front of a buffer
//! with serde_json's streaming deserializer, which reports the byte offset at
//! which the value ended. The remainder of the buffer is handed back to the
//! caller untouched.

use serde_json::{Number, Value as JsonValue};

use crate::error::{DecodeError, EncodeError};

/// Read one JSON value from the front of `buf`.
///
/// Leading whitespace is skipped. On success returns the value and the bytes
/// that follow it.
pub fn read_value(buf: &[u8]) -> Result<(JsonValue, &[u8]), DecodeError> {
    let mut stream = serde_json::Deserializer::from_slice(buf).into_iter::<JsonValue>();
    match stream.next() {
        Some(Ok(value)) => {
            let offset = stream.byte_offset();
            Ok((value, &buf[offset..]))
        }
        Some(Err(e)) if e.is_eof() => Err(DecodeError::UnexpectedEof),
        Some(Err(e)) => Err(DecodeError::Json(e.to_string())),
        None => Err(DecodeError::UnexpectedEof),
    }
}

/// Name of a JSON token's shape, for error messages.
pub fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

pub(crate) fn mismatch(expected: &str, value: &JsonValue) -> DecodeError {
    DecodeError::TypeMismatch(format!(
        "expected {}, found JSON {}",
        expected,
        json_kind(value)
    ))
}

/// Decode an integral JSON number into `[min, max]`.
///
/// Fractional literals are rejected even when their fraction is zero.
pub fn integer_from_json(
    kind: &str,
    value: &JsonValue,
    min: i64,
    max: i64,
) -> Result<i64, DecodeError> {
    let JsonValue::Number(n) = value else {
        return Err(mismatch(kind, value));
    };
    let Some(i) = n.as_i64() else {
        return Err(DecodeError::TypeMismatch(format!(
            "expected {}, found non-integral or out of range number {}",
            kind, n
        )));
    };
    if i < min || i > max {
        return Err(DecodeError::InvalidData(format!(
            "{} does not fit in {}",
            i, kind
        )));
    }
    Ok(i)
}

/// Decode a JSON number as a double.
///
/// Integer literals must be exactly representable.
pub fn double_from_json(value: &JsonValue) -> Result<f64, DecodeError> {
    let JsonValue::Number(n) = value else {
        return Err(mismatch("double", value));
    };
    if let Some(wide) = integer_literal(n) {
        let narrowed = wide as f64;
        if narrowed as i128 != wide {
            return Err(lossy_literal("double", n));
        }
        return Ok(narrowed);
    }
    n.as_f64().ok_or_else(|| mismatch("double", value))
}

/// Decode a JSON number as a float.
///
/// Integer literals must be exactly representable; fractional literals are
/// rounded to the nearest float but must stay finite.
pub fn float_from_json(value: &JsonValue) -> Result<f32, DecodeError> {
    let JsonValue::Number(n) = value else {
        return Err(mismatch("float", value));
    };
    if let Some(wide) = integer_literal(n) {
        let narrowed = wide as f32;
        if narrowed as i128 != wide {
            return Err(lossy_literal("float", n));
        }
        return Ok(narrowed);
    }
    let double = n.as_f64().ok_or_else(|| mismatch("float", value))?;
    let narrowed = double as f32;
    if narrowed.is_infinite() && double.is_finite() {
        return Err(DecodeError::InvalidData(format!(
            "{} is out of range for float",
            n
        )));
    }
    Ok(narrowed)
}

fn integer_literal(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn lossy_literal(kind: &str, n: &Number) -> DecodeError {
    DecodeError::InvalidData(format!("{} would lose precision as {}", n, kind))
}

/// Avro-JSON bytes: each code point 0-255 is one byte.
pub fn bytes_from_json(kind: &str, value: &JsonValue) -> Result<Vec<u8>, DecodeError> {
    let JsonValue::String(s) = value else {
        return Err(mismatch(kind, value));
    };
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                DecodeError::InvalidData(format!(
                    "code point U+{:04X} is not a byte in {} text",
                    u32::from(c),
                    kind
                ))
            })
        })
        .collect()
}

/// Inverse of [`bytes_from_json`].
pub fn bytes_to_json(bytes: &[u8]) -> JsonValue {
    JsonValue::String(bytes.iter().map(|&b| char::from(b)).collect())
}

/// JSON number for a float, using its shortest decimal form.
pub fn float_to_json(value: f32) -> Result<JsonValue, EncodeError> {
    if !value.is_finite() {
        return Err(non_finite(value));
    }
    // 6.77f32 prints as "6.77"; widening the bits directly would print 6.769999980926514
    let shortest: f64 = value
        .to_string()
        .parse()
        .map_err(|_| non_finite(value))?;
    Number::from_f64(shortest)
        .map(JsonValue::Number)
        .ok_or_else(|| non_finite(value))
}

/// JSON number for a double.
pub fn double_to_json(value: f64) -> Result<JsonValue, EncodeError> {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .ok_or_else(|| non_finite(value))
}

fn non_finite(value: impl std::fmt::Display) -> EncodeError {
    EncodeError::InvalidValue(format!("{} has no JSON representation", value))
}
