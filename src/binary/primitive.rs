//! Avro binary encoding of primitive types.
//!
//! - Varints use zigzag encoding for signed integers
//! - Floats and doubles are little-endian IEEE 754
//! - Bytes and strings are length-prefixed

use super::varint::{decode_zigzag, write_zigzag};
use crate::error::DecodeError;

/// Decode a boolean value.
///
/// Avro booleans are encoded as a single byte: 0x00 for false, 0x01 for true.
#[inline]
pub fn decode_boolean(data: &mut &[u8]) -> Result<bool, DecodeError> {
    let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
    *data = rest;
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DecodeError::InvalidData(format!(
            "Invalid boolean value: {}, expected 0 or 1",
            byte
        ))),
    }
}

/// Decode a 32-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_int(data: &mut &[u8]) -> Result<i32, DecodeError> {
    let long = decode_long(data)?;
    i32::try_from(long).map_err(|_| {
        DecodeError::InvalidData(format!("Integer overflow: {} does not fit in i32", long))
    })
}

/// Decode a 64-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_long(data: &mut &[u8]) -> Result<i64, DecodeError> {
    decode_zigzag(data)
}

/// Decode a 32-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_float(data: &mut &[u8]) -> Result<f32, DecodeError> {
    let bytes = take(data, 4)?;
    Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Decode a 64-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_double(data: &mut &[u8]) -> Result<f64, DecodeError> {
    let bytes = take(data, 8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(f64::from_le_bytes(buf))
}

/// Decode a byte array (length-prefixed).
#[inline]
pub fn decode_bytes(data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = decode_long(data)?;
    if len < 0 {
        return Err(DecodeError::InvalidData(format!(
            "Negative bytes length: {}",
            len
        )));
    }
    Ok(take(data, len as usize)?.to_vec())
}

/// Decode a UTF-8 string (length-prefixed).
#[inline]
pub fn decode_string(data: &mut &[u8]) -> Result<String, DecodeError> {
    let bytes = decode_bytes(data)?;
    String::from_utf8(bytes).map_err(DecodeError::from)
}

/// Decode a fixed-size byte array.
#[inline]
pub fn decode_fixed(data: &mut &[u8], size: usize) -> Result<Vec<u8>, DecodeError> {
    Ok(take(data, size)?.to_vec())
}

/// Largest item count a single array or map block may declare.
pub const MAX_BLOCK_COUNT: u64 = i32::MAX as u64;

/// Largest byte size a single array or map block may declare.
pub const MAX_BLOCK_SIZE: i64 = i32::MAX as i64;

/// Decode the item count of an array or map block.
///
/// A negative count is followed by the block's byte size, which is read and
/// discarded. Returns 0 at the end of the sequence.
///
/// # Errors
/// - `DecodeError::InvalidData` if the count exceeds [`MAX_BLOCK_COUNT`] or
///   the byte size is negative or exceeds [`MAX_BLOCK_SIZE`]
pub fn decode_block_count(data: &mut &[u8]) -> Result<usize, DecodeError> {
    let count = decode_long(data)?;
    if count.unsigned_abs() > MAX_BLOCK_COUNT {
        return Err(DecodeError::InvalidData(format!(
            "Block count {} exceeds the limit of {}",
            count, MAX_BLOCK_COUNT
        )));
    }
    if count < 0 {
        let byte_size = decode_long(data)?;
        if !(0..=MAX_BLOCK_SIZE).contains(&byte_size) {
            return Err(DecodeError::InvalidData(format!(
                "Invalid block size: {}",
                byte_size
            )));
        }
    }
    Ok(count.unsigned_abs() as usize)
}

/// Split `n` bytes off the front of the cursor.
#[inline]
fn take<'a>(data: &mut &'a [u8], n: usize) -> Result<&'a [u8], DecodeError> {
    if data.len() < n {
        return Err(DecodeError::UnexpectedEof);
    }
    let (head, rest) = data.split_at(n);
    *data = rest;
    Ok(head)
}

/// Append a boolean.
#[inline]
pub fn write_boolean(out: &mut Vec<u8>, value: bool) {
    out.push(value as u8);
}

/// Append a zigzag varint long (also used for int).
#[inline]
pub fn write_long(out: &mut Vec<u8>, value: i64) {
    write_zigzag(out, value);
}

/// Append a little-endian float.
#[inline]
pub fn write_float(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Append a little-endian double.
#[inline]
pub fn write_double(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Append length-prefixed bytes.
#[inline]
pub fn write_bytes(out: &mut Vec<u8>, value: &[u8]) {
    write_zigzag(out, value.len() as i64);
    out.extend_from_slice(value);
}
