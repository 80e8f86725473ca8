//! Schema-driven Avro codecs with full union support
//!
//! This library compiles Avro schemas into immutable [`Codec`]s that encode and
//! decode values in the Avro binary and Avro-JSON encodings. Unions are picked
//! apart at run time from the value's shape, with lossless numeric coercion, and
//! can optionally accept untagged plain JSON on textual decode.
//!
//! # Example
//! ```
//! use avro_union::{Codec, PlainJsonStrategy, Value};
//!
//! let codec = Codec::from_schema(r#"["null", "int", "float"]"#).unwrap();
//! assert_eq!(codec.to_binary(&Value::Null).unwrap(), vec![0x00]);
//! assert_eq!(codec.to_textual(&Value::Int(3)).unwrap(), br#"{"int":3}"#);
//!
//! let plain = Codec::from_schema_with(r#"["null", "int", "float"]"#, &PlainJsonStrategy::default())
//!     .unwrap();
//! let (value, _) = plain.decode_textual(b"6.77").unwrap();
//! assert_eq!(value, Value::tagged("float", 6.77f32));
//! ```

pub mod binary;
pub mod codec;
pub mod error;
pub mod numeric;
pub mod schema;
pub mod text;
pub mod union;
pub mod value;

// Re-export main types
pub use codec::{Codec, EnumCodec, FieldCodec, FixedCodec, RecordCodec};
pub use error::{DecodeError, EncodeError, SchemaError};
pub use numeric::NumericKind;
pub use schema::{
    compile_schema, AvroJsonStrategy, BuilderStrategy, Compiler, NullableStrategy,
    PlainJsonStrategy,
};
pub use union::{Branch, CompositeOrder, TextDecoder, UnionCodec, UnionTable};
pub use value::Value;
