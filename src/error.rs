//! Error types for Avro union encoding and decoding

use thiserror::Error;

/// Errors that can occur while compiling a schema into a codec
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Invalid schema format
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Unsupported schema type
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// Schema document is not valid JSON
    #[error("Parse error: {0}")]
    ParseError(String),
    /// A named type was defined more than once
    #[error("Named type '{0}' is already defined")]
    DuplicateName(String),
    /// A union member failed to compile
    #[error("Union member {position} is not a valid Avro type: {source}")]
    UnionMember {
        /// 1-based position of the member in the union declaration
        position: usize,
        /// Why the member was rejected
        source: Box<SchemaError>,
    },
    /// Two union members share the same canonical type name
    #[error("Union member {position} duplicates type '{name}' (union members must be unique)")]
    DuplicateUnionMember {
        /// 1-based position of the repeated member
        position: usize,
        /// The repeated canonical type name
        name: String,
    },
}

/// Errors that can occur during decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of buffer")]
    UnexpectedEof,
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Textual token does not have the shape the type requires
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Binary union discriminant outside the declared members
    #[error("cannot decode binary union: index ought to be between 0 and {max}; read index: {index}")]
    UnionIndexOutOfRange {
        /// The discriminant read from the buffer
        index: i64,
        /// Highest valid discriminant
        max: i64,
    },
    /// The selected union member failed to decode its payload
    #[error("cannot decode binary union member {position}: {source}")]
    UnionMember {
        /// 1-based position of the member
        position: usize,
        /// The member's decode failure
        source: Box<DecodeError>,
    },
    /// Avro-JSON union tag that names no member
    #[error("cannot decode textual union: {0}")]
    UnknownUnionBranch(String),
    /// No union member accepts a plain JSON token
    #[error("cannot decode plain JSON union: no member accepts input {input}")]
    NoMatchingBranch {
        /// The offending token as text
        input: String,
    },
    /// Malformed JSON text
    #[error("Invalid JSON: {0}")]
    Json(String),
}

/// Errors that can occur during encoding
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Value matches no union member
    #[error("cannot encode union: no member schema types support datum: allowed types: {allowed:?}; received: {received}")]
    NoMatchingBranch {
        /// Canonical member names in declaration order
        allowed: Vec<String>,
        /// Description of the value that was offered
        received: String,
    },
    /// Untagged keyed container whose branch cannot be decided
    #[error("cannot encode union: keyed value with {entries} entries is ambiguous; wrap it in a single-key tag naming one of {allowed:?}")]
    AmbiguousComposite {
        /// Canonical member names in declaration order
        allowed: Vec<String>,
        /// Number of entries in the offered container
        entries: usize,
    },
    /// Tag container with other than exactly one entry
    #[error("cannot encode union: tagged value ought to have exactly one key naming one of {allowed:?}; received {entries} entries")]
    InvalidTag {
        /// Canonical member names in declaration order
        allowed: Vec<String>,
        /// Number of entries in the offered container
        entries: usize,
    },
    /// Tag naming no member
    #[error("cannot encode union: tag '{tag}' names no member; allowed types: {allowed:?}")]
    UnknownTag {
        /// Canonical member names in declaration order
        allowed: Vec<String>,
        /// The tag that was offered
        tag: String,
    },
    /// Narrowing would drop bits
    #[error("cannot encode {kind}: provided value would lose precision: {value}")]
    PrecisionLoss {
        /// Target Avro type name
        kind: &'static str,
        /// The offending value
        value: String,
    },
    /// Integer outside the target range
    #[error("cannot encode {kind}: {value} would overflow")]
    Overflow {
        /// Target Avro type name
        kind: &'static str,
        /// The offending value
        value: String,
    },
    /// Value shape incompatible with the target type
    #[error("cannot encode {expected}: received {received}")]
    TypeMismatch {
        /// Canonical name of the target type
        expected: String,
        /// Description of the value that was offered
        received: String,
    },
    /// Value has the right shape but is not allowed (unknown symbol, wrong size, ...)
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl EncodeError {
    /// Shorthand for a [`EncodeError::TypeMismatch`].
    pub(crate) fn mismatch(expected: &str, value: &crate::value::Value) -> Self {
        EncodeError::TypeMismatch {
            expected: expected.to_string(),
            received: value.describe(),
        }
    }
}
