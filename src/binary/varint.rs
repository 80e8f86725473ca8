//! Shared varint encoding and decoding utilities.
//!
//! Avro uses the same varint encoding as Protocol Buffers:
//! - Each byte has 7 bits of data and 1 continuation bit (MSB)
//! - The continuation bit indicates if more bytes follow
//! - Bytes are in little-endian order
//!
//! For signed integers, Avro uses zigzag encoding to map signed values to unsigned:
//! - 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, 2 -> 4, ...
//! - Encoding formula: (n << 1) ^ (n >> 63)
//! - Decoding formula: (n >> 1) ^ -(n & 1)
//!
//! Union discriminants, int, long, enum indices, and block counts all use
//! the zigzag form.

use crate::error::DecodeError;

// ============================================================================
// Decoding Functions
// ============================================================================

/// Decode an unsigned variable-length integer.
///
/// # Arguments
/// * `data` - The input byte slice (cursor is advanced past the varint)
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the varint exceeds 10 bytes or 64 bits
#[inline]
pub fn decode_varint(data: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
        *data = rest;

        // the tenth byte may only carry bit 63
        if shift == 63 && byte > 0x01 {
            return Err(DecodeError::InvalidVarint);
        }
        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Ok(result);
        }

        shift += 7;

        // max 10 bytes for 64-bit varint
        if shift >= 64 {
            return Err(DecodeError::InvalidVarint);
        }
    }
}

/// Decode a signed variable-length integer (zigzag encoded).
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input is truncated
/// - `DecodeError::InvalidVarint` if the varint exceeds 10 bytes
#[inline]
pub fn decode_zigzag(data: &mut &[u8]) -> Result<i64, DecodeError> {
    let unsigned = decode_varint(data)?;
    Ok(((unsigned >> 1) as i64) ^ (-((unsigned & 1) as i64)))
}

// ============================================================================
// Encoding Functions
// ============================================================================

/// Append an unsigned integer as a variable-length integer.
#[inline]
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Append a signed integer as a zigzag-encoded variable-length integer.
#[inline]
pub fn write_zigzag(out: &mut Vec<u8>, value: i64) {
    let zigzag = ((value << 1) ^ (value >> 63)) as u64;
    write_varint(out, zigzag);
}

/// Encode a signed integer as a zigzag varint into a fresh vector.
#[inline]
pub fn encode_zigzag(value: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    write_zigzag(&mut out, value);
    out
}
