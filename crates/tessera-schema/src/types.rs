//! # Types — The Closed Schema Union
//!
//! Every schema type is one variant of [`Type`]. Loading and binding are
//! matched exhaustively; there is no "unknown kind" at runtime.
//!
//! ```text
//! Type ─┬─ Primitive(null | boolean | integer | number | string | datetime)
//!       ├─ Object(properties → Attribute)
//!       ├─ Array(element Type)
//!       ├─ Map(value Type)          keys are always strings
//!       └─ Reference ─┬─ Schema(named Object, e.g. a Blueprint's)
//!                     └─ Media(MediaType)
//! ```

use std::fmt;
use std::sync::Arc;

use tessera_core::{BindContext, BindError, Kind, LoadError, NativeKind, Primitive, Value};

use crate::collection;
use crate::media::MediaType;
use crate::object::Object;

/// A reference to a shared, named composite.
#[derive(Debug, Clone)]
pub enum Reference {
    /// A named object schema, such as the schema of a blueprint.
    Schema {
        /// The schema's name.
        name: String,
        /// The shared object schema.
        object: Arc<Object>,
    },
    /// A media type.
    Media(Arc<MediaType>),
}

impl Reference {
    /// The referenced object schema.
    pub fn object(&self) -> &Object {
        match self {
            Reference::Schema { object, .. } => object,
            Reference::Media(media) => media.object(),
        }
    }

    /// The referenced name or media type identifier.
    pub fn name(&self) -> &str {
        match self {
            Reference::Schema { name, .. } => name,
            Reference::Media(media) => media.identifier().as_str(),
        }
    }

    /// The referenced media type, if this is a media reference.
    pub fn media(&self) -> Option<&Arc<MediaType>> {
        match self {
            Reference::Media(media) => Some(media),
            Reference::Schema { .. } => None,
        }
    }

    /// The kind of values the reference loads to. Collection media types
    /// load sequences.
    pub fn kind(&self) -> Kind {
        match self {
            Reference::Media(media) if media.is_collection() => Kind::Array,
            _ => Kind::Object,
        }
    }

    /// Coerce and validate `raw` through the referenced composite.
    pub fn load(&self, raw: &Value) -> Result<Value, LoadError> {
        match self {
            Reference::Schema { object, .. } => object.load(raw),
            Reference::Media(media) => media.load(raw),
        }
    }

    /// Check binding compatibility with a native field.
    pub fn can_bind(&self, native: &NativeKind, ctx: &BindContext) -> Result<(), BindError> {
        match self {
            Reference::Schema { object, .. } => object.can_bind(native, ctx),
            Reference::Media(media) => media.can_bind(native, ctx),
        }
    }
}

/// A schema type.
#[derive(Debug, Clone)]
pub enum Type {
    /// A primitive.
    Primitive(Primitive),
    /// An inline object schema.
    Object(Object),
    /// A sequence with a single element type.
    Array(Box<Type>),
    /// A string-keyed mapping with a single value type.
    Map(Box<Type>),
    /// A reference to a shared composite.
    Reference(Reference),
}

impl Type {
    /// An array of `element`.
    pub fn array_of(element: impl Into<Type>) -> Self {
        Type::Array(Box::new(element.into()))
    }

    /// A map of string keys to `value`.
    pub fn map_of(value: impl Into<Type>) -> Self {
        Type::Map(Box::new(value.into()))
    }

    /// A reference to a named object schema.
    pub fn named(name: impl Into<String>, object: Arc<Object>) -> Self {
        Type::Reference(Reference::Schema {
            name: name.into(),
            object,
        })
    }

    /// A reference to a media type.
    pub fn media(media: Arc<MediaType>) -> Self {
        Type::Reference(Reference::Media(media))
    }

    /// The kind of values this type loads to.
    pub fn kind(&self) -> Kind {
        match self {
            Type::Primitive(p) => p.kind(),
            Type::Object(_) => Kind::Object,
            Type::Reference(reference) => reference.kind(),
            Type::Array(_) => Kind::Array,
            Type::Map(_) => Kind::Map,
        }
    }

    /// The primitive, for primitive types.
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// The object schema for objects and references.
    pub fn object(&self) -> Option<&Object> {
        match self {
            Type::Object(object) => Some(object),
            Type::Reference(reference) => Some(reference.object()),
            _ => None,
        }
    }

    /// A short name used in messages, e.g. `array<integer>`.
    pub fn name(&self) -> String {
        match self {
            Type::Primitive(p) => p.name().to_string(),
            Type::Object(_) => "object".to_string(),
            Type::Array(element) => format!("array<{}>", element.name()),
            Type::Map(value) => format!("map<{}>", value.name()),
            Type::Reference(reference) => reference.name().to_string(),
        }
    }

    /// Coerce and validate `raw` through this type.
    pub fn load(&self, raw: &Value) -> Result<Value, LoadError> {
        match self {
            Type::Primitive(p) => p.load(raw),
            Type::Object(object) => object.load(raw),
            Type::Array(element) => collection::load_array(element, raw),
            Type::Map(value) => collection::load_map(value, raw),
            Type::Reference(reference) => reference.load(raw),
        }
    }

    /// Check that a native field of kind `native` can hold this type.
    pub fn can_bind(&self, native: &NativeKind, ctx: &BindContext) -> Result<(), BindError> {
        match (self, native) {
            (_, NativeKind::Dynamic) => Ok(()),
            (Type::Primitive(p), _) => p.can_bind(native, ctx),
            (_, NativeKind::Optional(inner)) => self.can_bind(inner, ctx),
            (Type::Object(object), _) => object.can_bind(native, ctx),
            (Type::Reference(reference), _) => reference.can_bind(native, ctx),
            (Type::Array(element), NativeKind::Sequence(inner)) => {
                element.can_bind(inner, &ctx.element())
            }
            (Type::Map(value), NativeKind::Map(inner)) => value.can_bind(inner, &ctx.element()),
            (Type::Array(_) | Type::Map(_), _) => Err(BindError::KindMismatch {
                context: ctx.to_string(),
                expected: self.name(),
                found: native.to_string(),
            }),
        }
    }
}

impl From<Primitive> for Type {
    fn from(p: Primitive) -> Self {
        Type::Primitive(p)
    }
}

impl From<Object> for Type {
    fn from(object: Object) -> Self {
        Type::Object(object)
    }
}

impl From<Reference> for Type {
    fn from(reference: Reference) -> Self {
        Type::Reference(reference)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
