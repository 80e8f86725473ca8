//! Avro binary wire primitives.

pub mod primitive;
pub mod varint;

pub use primitive::{
    decode_block_count, decode_boolean, decode_bytes, decode_double, decode_fixed, decode_float,
    decode_int, decode_long, decode_string, write_boolean, write_bytes, write_double, write_float,
    write_long, MAX_BLOCK_COUNT, MAX_BLOCK_SIZE,
};
pub use varint::{decode_varint, decode_zigzag, encode_zigzag, write_varint, write_zigzag};
