//! Union member table and branch selection.

use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::error::{EncodeError, SchemaError};
use crate::numeric::NumericKind;
use crate::schema::Compiler;
use crate::value::Value;

/// The compiled members of one union, shared by every union codec flavor.
///
/// Member positions are the binary discriminants; canonical names are the
/// Avro-JSON tags.
#[derive(Debug)]
pub struct UnionTable {
    members: Vec<Codec>,
    allowed_type_names: Vec<String>,
    index_by_name: HashMap<String, usize>,
    codec_by_name: HashMap<String, Codec>,
}

/// Outcome of choosing a member for a value.
#[derive(Debug)]
pub struct Branch<'v> {
    /// Position of the chosen member
    pub index: usize,
    /// What the member should encode: the tag payload, the value itself, or a
    /// numerically coerced copy
    pub payload: Cow<'v, Value>,
}

impl UnionTable {
    /// Compile each member schema in declaration order.
    ///
    /// Errors carry the 1-based position of the offending member.
    pub fn build(compiler: &mut Compiler<'_>, schemas: &[JsonValue]) -> Result<Self, SchemaError> {
        if schemas.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "Union schema cannot be empty".to_string(),
            ));
        }

        let mut members = Vec::with_capacity(schemas.len());
        let mut allowed_type_names = Vec::with_capacity(schemas.len());
        let mut index_by_name = HashMap::with_capacity(schemas.len());
        let mut codec_by_name = HashMap::with_capacity(schemas.len());

        for (i, schema) in schemas.iter().enumerate() {
            let position = i + 1;
            let codec = compiler.compile(schema).map_err(|e| match e {
                // a named type repeated inside the union is reported as a union duplicate
                SchemaError::DuplicateName(name) if index_by_name.contains_key(&name) => {
                    SchemaError::DuplicateUnionMember { position, name }
                }
                other => SchemaError::UnionMember {
                    position,
                    source: Box::new(other),
                },
            })?;

            if codec.is_union() {
                let msg = "unions may not immediately contain other unions".to_string();
                if compiler.is_strict() {
                    return Err(SchemaError::UnionMember {
                        position,
                        source: Box::new(SchemaError::InvalidSchema(msg)),
                    });
                }
                warn!(position, "{}", msg);
            }

            let name = codec.type_name().to_string();
            if index_by_name.contains_key(&name) {
                return Err(SchemaError::DuplicateUnionMember { position, name });
            }

            index_by_name.insert(name.clone(), i);
            codec_by_name.insert(name.clone(), codec.clone());
            allowed_type_names.push(name);
            members.push(codec);
        }

        debug!(members = ?allowed_type_names, "built union member table");

        Ok(Self {
            members,
            allowed_type_names,
            index_by_name,
            codec_by_name,
        })
    }

    /// Member codecs in declaration order.
    pub fn members(&self) -> &[Codec] {
        &self.members
    }

    /// Canonical member names in declaration order.
    pub fn allowed_type_names(&self) -> &[String] {
        &self.allowed_type_names
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Position of the member with the given canonical name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Member codec with the given canonical name.
    pub fn codec_named(&self, name: &str) -> Option<&Codec> {
        self.codec_by_name.get(name)
    }

    pub fn member(&self, index: usize) -> Option<&Codec> {
        self.members.get(index)
    }

    pub fn null_index(&self) -> Option<usize> {
        self.index_of("null")
    }

    /// Choose the member that encodes `value`.
    ///
    /// In order of precedence:
    /// 1. `Null` selects the `"null"` member.
    /// 2. A keyed container is a tag and must have exactly one entry whose
    ///    key names a member.
    /// 3. A value whose associated type name matches a member selects it.
    /// 4. Numbers try the numeric members in the value's preference order and
    ///    take the first lossless one.
    pub fn select_branch<'v>(&self, value: &'v Value) -> Result<Branch<'v>, EncodeError> {
        match value {
            Value::Null => self
                .null_index()
                .map(|index| Branch {
                    index,
                    payload: Cow::Borrowed(value),
                })
                .ok_or_else(|| self.no_match(value)),
            Value::Map(entries) => match entries.len() {
                1 => {
                    let Some((tag, payload)) = entries.iter().next() else {
                        return Err(self.invalid_tag(0));
                    };
                    let index = self.index_of(tag).ok_or_else(|| EncodeError::UnknownTag {
                        allowed: self.allowed_type_names.clone(),
                        tag: tag.clone(),
                    })?;
                    Ok(Branch {
                        index,
                        payload: Cow::Borrowed(payload),
                    })
                }
                0 => Err(self.invalid_tag(0)),
                n => Err(EncodeError::AmbiguousComposite {
                    allowed: self.allowed_type_names.clone(),
                    entries: n,
                }),
            },
            _ => {
                if let Some(index) = value.type_name().and_then(|name| self.index_of(name)) {
                    return Ok(Branch {
                        index,
                        payload: Cow::Borrowed(value),
                    });
                }
                self.coerce_numeric(value)
            }
        }
    }

    fn coerce_numeric<'v>(&self, value: &'v Value) -> Result<Branch<'v>, EncodeError> {
        let Some(kinds) = NumericKind::preference(value) else {
            return Err(self.no_match(value));
        };
        let mut first_error = None;
        for kind in kinds {
            let Some(index) = self.index_of(kind.name()) else {
                continue;
            };
            match kind.coerce(value) {
                Ok(coerced) => {
                    return Ok(Branch {
                        index,
                        payload: Cow::Owned(coerced),
                    })
                }
                // unsigned values never fall back from an integer member to a floating one
                Err(e) if kind.is_integral() && matches!(value, Value::Unsigned(_)) => {
                    return Err(e);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| self.no_match(value)))
    }

    fn no_match(&self, value: &Value) -> EncodeError {
        EncodeError::NoMatchingBranch {
            allowed: self.allowed_type_names.clone(),
            received: value.describe(),
        }
    }

    fn invalid_tag(&self, entries: usize) -> EncodeError {
        EncodeError::InvalidTag {
            allowed: self.allowed_type_names.clone(),
            entries,
        }
    }
}
