//! # Native Shapes
//!
//! Describes the kind of storage a native record field provides, so a
//! schema can check binding compatibility once, at construction, without
//! any runtime introspection.

use std::fmt;

/// One field of a native record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeField {
    /// Name the field answers to in the schema (after any override).
    pub name: String,
    /// The field's name in the native record.
    pub field: String,
    /// The field's storage kind.
    pub kind: NativeKind,
}

/// Storage kind of a native record field.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeKind {
    /// `bool`.
    Bool,
    /// Any signed or unsigned integer width.
    Int,
    /// `f32` or `f64`.
    Float,
    /// `String`.
    String,
    /// A UTC date-time.
    DateTime,
    /// An ordered collection.
    Sequence(Box<NativeKind>),
    /// A string-keyed collection.
    Map(Box<NativeKind>),
    /// A nested record with its own fields.
    Record(Vec<NativeField>),
    /// A field that may be absent.
    Optional(Box<NativeKind>),
    /// A field holding an untyped value; binds to any schema type.
    Dynamic,
}

impl NativeKind {
    /// This kind with any `Optional` wrappers removed.
    pub fn unwrap_optional(&self) -> &NativeKind {
        match self {
            NativeKind::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeKind::Bool => f.write_str("bool"),
            NativeKind::Int => f.write_str("int"),
            NativeKind::Float => f.write_str("float"),
            NativeKind::String => f.write_str("string"),
            NativeKind::DateTime => f.write_str("datetime"),
            NativeKind::Sequence(inner) => write!(f, "sequence<{inner}>"),
            NativeKind::Map(inner) => write!(f, "map<string, {inner}>"),
            NativeKind::Record(fields) => write!(f, "record({} fields)", fields.len()),
            NativeKind::Optional(inner) => write!(f, "optional<{inner}>"),
            NativeKind::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Location used in binding error messages, e.g. `Bottle.owner.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindContext {
    path: String,
}

impl BindContext {
    /// A context rooted at a record or schema name.
    pub fn new(root: impl Into<String>) -> Self {
        Self { path: root.into() }
    }

    /// A context one step deeper.
    pub fn child(&self, name: &str) -> Self {
        Self {
            path: format!("{}.{name}", self.path),
        }
    }

    /// A context for the elements or values of a collection.
    pub fn element(&self) -> Self {
        Self {
            path: format!("{}[]", self.path),
        }
    }

    /// The dotted path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for BindContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_paths() {
        let ctx = BindContext::new("Bottle").child("owner").element().child("name");
        assert_eq!(ctx.to_string(), "Bottle.owner[].name");
    }

    #[test]
    fn test_unwrap_optional() {
        let k = NativeKind::Optional(Box::new(NativeKind::Optional(Box::new(NativeKind::Int))));
        assert_eq!(k.unwrap_optional(), &NativeKind::Int);
    }
}
