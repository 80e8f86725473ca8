//! Numeric coercion between runtime values and Avro numeric types.
//!
//! Widening (int to long, float to double, ...) always succeeds when the value
//! is exactly representable in the target. Narrowing succeeds only when no
//! bits are lost; anything else is a hard error naming the value and the
//! target precision.

use crate::error::EncodeError;
use crate::value::Value;

/// The four Avro numeric wire kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit IEEE 754
    Float,
    /// 64-bit IEEE 754
    Double,
}

impl NumericKind {
    /// Avro type name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            NumericKind::Int => "int",
            NumericKind::Long => "long",
            NumericKind::Float => "float",
            NumericKind::Double => "double",
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(self, NumericKind::Int | NumericKind::Long)
    }

    /// Member preference order for a runtime numeric value, own kind first.
    ///
    /// Returns `None` for non-numeric values.
    pub fn preference(value: &Value) -> Option<&'static [NumericKind]> {
        use NumericKind::*;
        match value {
            Value::Int(_) => Some(&[Int, Long, Double, Float]),
            Value::Long(_) | Value::Unsigned(_) => Some(&[Long, Int, Double, Float]),
            Value::Float(_) => Some(&[Float, Double, Long, Int]),
            Value::Double(_) => Some(&[Double, Float, Long, Int]),
            _ => None,
        }
    }

    /// Coerce a runtime value into this kind.
    pub fn coerce(self, value: &Value) -> Result<Value, EncodeError> {
        match self {
            NumericKind::Int => coerce_int(value).map(Value::Int),
            NumericKind::Long => coerce_long(value).map(Value::Long),
            NumericKind::Float => coerce_float(value).map(Value::Float),
            NumericKind::Double => coerce_double(value).map(Value::Double),
        }
    }
}

const I32_LOWER: f64 = -2_147_483_648.0;
const I32_UPPER: f64 = 2_147_483_648.0;
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Coerce into a 32-bit int.
pub fn coerce_int(value: &Value) -> Result<i32, EncodeError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Long(l) => i32::try_from(*l).map_err(|_| overflow("int", l)),
        Value::Unsigned(u) => i32::try_from(*u).map_err(|_| overflow("int", u)),
        Value::Float(f) => float_to_integer("int", *f as f64, I32_LOWER, I32_UPPER).map(|i| i as i32),
        Value::Double(d) => float_to_integer("int", *d, I32_LOWER, I32_UPPER).map(|i| i as i32),
        other => Err(EncodeError::mismatch("int", other)),
    }
}

/// Coerce into a 64-bit long.
pub fn coerce_long(value: &Value) -> Result<i64, EncodeError> {
    match value {
        Value::Int(i) => Ok(*i as i64),
        Value::Long(l) => Ok(*l),
        Value::Unsigned(u) => i64::try_from(*u).map_err(|_| overflow("long", u)),
        Value::Float(f) => float_to_integer("long", *f as f64, I64_LOWER, I64_UPPER),
        Value::Double(d) => float_to_integer("long", *d, I64_LOWER, I64_UPPER),
        other => Err(EncodeError::mismatch("long", other)),
    }
}

/// Coerce into a 32-bit float.
pub fn coerce_float(value: &Value) -> Result<f32, EncodeError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Double(d) => {
            let narrowed = *d as f32;
            if narrowed as f64 == *d || d.is_nan() {
                Ok(narrowed)
            } else {
                Err(precision_loss("float", d))
            }
        }
        Value::Int(i) => integer_to_float(*i as i128, i).map(|f| f as f32),
        Value::Long(l) => integer_to_float(*l as i128, l).map(|f| f as f32),
        Value::Unsigned(u) => integer_to_float(*u as i128, u).map(|f| f as f32),
        other => Err(EncodeError::mismatch("float", other)),
    }
}

/// Coerce into a 64-bit double.
pub fn coerce_double(value: &Value) -> Result<f64, EncodeError> {
    match value {
        Value::Float(f) => Ok(*f as f64),
        Value::Double(d) => Ok(*d),
        Value::Int(i) => Ok(*i as f64),
        Value::Long(l) => integer_to_double(*l as i128, l),
        Value::Unsigned(u) => integer_to_double(*u as i128, u),
        other => Err(EncodeError::mismatch("double", other)),
    }
}

/// Whether an integer survives a round trip through f32.
fn integer_to_float(wide: i128, shown: &dyn std::fmt::Display) -> Result<f32, EncodeError> {
    let narrowed = wide as f32;
    if narrowed as i128 == wide {
        Ok(narrowed)
    } else {
        Err(precision_loss("float", shown))
    }
}

fn integer_to_double(wide: i128, shown: &dyn std::fmt::Display) -> Result<f64, EncodeError> {
    let narrowed = wide as f64;
    if narrowed as i128 == wide {
        Ok(narrowed)
    } else {
        Err(precision_loss("double", shown))
    }
}

fn float_to_integer(
    kind: &'static str,
    value: f64,
    lower: f64,
    upper: f64,
) -> Result<i64, EncodeError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(precision_loss(kind, &value));
    }
    if value < lower || value >= upper {
        return Err(overflow(kind, &value));
    }
    Ok(value as i64)
}

fn precision_loss(kind: &'static str, value: &dyn std::fmt::Display) -> EncodeError {
    EncodeError::PrecisionLoss {
        kind,
        value: value.to_string(),
    }
}

fn overflow(kind: &'static str, value: &dyn std::fmt::Display) -> EncodeError {
    EncodeError::Overflow {
        kind,
        value: value.to_string(),
    }
}
