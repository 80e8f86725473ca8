//! Schema compilation.
//!
//! This module turns Avro schema JSON into compiled [`Codec`](crate::Codec)s:
//! name resolution, the named type registry, and the builder strategies that
//! decide how unions decode text.

mod compiler;
mod name;
mod strategy;

pub use compiler::{compile_schema, Compiler};
pub use name::{check_name, is_primitive, Name, PRIMITIVE_TYPES};
pub use strategy::{AvroJsonStrategy, BuilderStrategy, NullableStrategy, PlainJsonStrategy};
