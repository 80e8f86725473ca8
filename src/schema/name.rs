//! Avro names and namespaces.

/// The eight primitive type names; these are never namespace-qualified.
pub const PRIMITIVE_TYPES: [&str; 8] = [
    "null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

/// A named type's short name and namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub name: String,
    pub namespace: Option<String>,
}

impl Name {
    /// Qualify a name per Avro rules.
    ///
    /// A dotted name is already full. Otherwise an explicit `namespace`
    /// attribute qualifies it, and failing that the enclosing namespace. An
    /// empty namespace string means the null namespace.
    pub fn new(name: &str, namespace: Option<&str>, enclosing: Option<&str>) -> Name {
        if let Some((ns, short)) = name.rsplit_once('.') {
            return Name {
                name: short.to_string(),
                namespace: non_empty(ns),
            };
        }
        let namespace = match namespace {
            Some(ns) => non_empty(ns),
            None => enclosing.and_then(non_empty),
        };
        Name {
            name: name.to_string(),
            namespace,
        }
    }

    /// Fully qualified name.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

fn non_empty(namespace: &str) -> Option<String> {
    (!namespace.is_empty()).then(|| namespace.to_string())
}

/// Check a simple name against `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Returns a description of the first violation.
pub fn check_name(name: &str, context: &str) -> Option<String> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Some(format!("{} name cannot be empty", context));
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return Some(format!(
            "{} name '{}' must start with a letter or underscore",
            context, name
        ));
    }
    chars
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_')
        .map(|ch| {
            format!(
                "{} name '{}' contains invalid character '{}' (only alphanumeric and underscore allowed)",
                context, name, ch
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_name_is_full() {
        let name = Name::new("com.example.colors", Some("ignored"), Some("outer"));
        assert_eq!(name.name, "colors");
        assert_eq!(name.namespace.as_deref(), Some("com.example"));
        assert_eq!(name.fullname(), "com.example.colors");
    }

    #[test]
    fn test_namespace_attribute_then_enclosing() {
        assert_eq!(Name::new("R", Some("a.b"), Some("c")).fullname(), "a.b.R");
        assert_eq!(Name::new("R", None, Some("c")).fullname(), "c.R");
        assert_eq!(Name::new("R", None, None).fullname(), "R");
        // explicit empty namespace resets to the null namespace
        assert_eq!(Name::new("R", Some(""), Some("c")).fullname(), "R");
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("field_1", "Field").is_none());
        assert!(check_name("_x", "Field").is_none());
        assert!(check_name("", "Field").is_some());
        assert!(check_name("1abc", "Record").is_some());
        assert!(check_name("a-b", "Record").unwrap().contains("'-'"));
    }

    #[test]
    fn test_primitives() {
        assert!(is_primitive("double"));
        assert!(!is_primitive("record"));
    }
}
