//! Native values handed to and returned by codecs.
//!
//! A union member is chosen from the *shape* of a [`Value`]:
//! - [`Value::Null`] selects the `"null"` member.
//! - A [`Value::Map`] with exactly one entry is an explicit tag: the key names
//!   the member and the entry's value is the payload.
//! - A [`Value::Named`] carries its associated type name explicitly.
//! - Every other variant (except [`Value::Unsigned`]) carries an intrinsic
//!   type name (`"int"`, `"string"`, `"array"`, ...).

use indexmap::IndexMap;

/// A dynamically typed Avro value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// Unsigned runtime integer; has no Avro type of its own and is placed
    /// into a numeric member by coercion
    Unsigned(u64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Keyed container: Avro map, record fields, or a single-key union tag
    Map(IndexMap<String, Value>),
    /// Value with an associated type name (record, enum, fixed, map payloads
    /// returned from a union, or caller-supplied hints)
    Named(String, Box<Value>),
}

impl Value {
    /// Build an explicit union tag `{name: payload}`.
    pub fn tagged(name: impl Into<String>, payload: impl Into<Value>) -> Value {
        let mut map = IndexMap::with_capacity(1);
        map.insert(name.into(), payload.into());
        Value::Map(map)
    }

    /// Attach an associated type name to a payload.
    pub fn named(name: impl Into<String>, payload: impl Into<Value>) -> Value {
        Value::Named(name.into(), Box::new(payload.into()))
    }

    /// The intrinsic associated type name, if the value has one.
    ///
    /// Keyed containers and unsigned integers have none.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Null => Some("null"),
            Value::Boolean(_) => Some("boolean"),
            Value::Int(_) => Some("int"),
            Value::Long(_) => Some("long"),
            Value::Float(_) => Some("float"),
            Value::Double(_) => Some("double"),
            Value::Bytes(_) => Some("bytes"),
            Value::String(_) => Some("string"),
            Value::Array(_) => Some("array"),
            Value::Named(name, _) => Some(name),
            Value::Unsigned(_) | Value::Map(_) => None,
        }
    }

    /// View the value as a `(branch name, payload)` pair.
    ///
    /// Single-entry maps and named values qualify; everything else returns `None`.
    pub fn as_union_tag(&self) -> Option<(&str, &Value)> {
        match self {
            Value::Map(map) if map.len() == 1 => map.iter().next().map(|(k, v)| (k.as_str(), v)),
            Value::Named(name, payload) => Some((name.as_str(), payload.as_ref())),
            _ => None,
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => format!("boolean {}", b),
            Value::Int(i) => format!("int {}", i),
            Value::Long(l) => format!("long {}", l),
            Value::Unsigned(u) => format!("unsigned {}", u),
            Value::Float(f) => format!("float {}", f),
            Value::Double(d) => format!("double {}", d),
            Value::Bytes(b) => format!("bytes of length {}", b.len()),
            Value::String(_) => "string".to_string(),
            Value::Array(items) => format!("array of {} items", items.len()),
            Value::Map(map) => format!("map with {} entries", map.len()),
            Value::Named(name, _) => format!("value named '{}'", name),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Unsigned(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
