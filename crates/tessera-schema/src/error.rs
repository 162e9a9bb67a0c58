//! # Schema, Binding, and Render Errors
//!
//! - [`SchemaError`] — a definition is malformed. Raised while compiling
//!   attributes, media types, catalogs, and descriptors; fatal at start-up.
//! - [`BlueprintError`] — loading into a native record failed, either on
//!   input ([`LoadError`]) or because a coerced value cannot be stored in
//!   the declared field (an internal inconsistency).
//! - [`RenderError`] — a projection failed. Always a server-side bug.
//! - [`CatalogError`] — a boundary call through the [`Catalog`](crate::Catalog).

use thiserror::Error;

use tessera_core::{Classification, Kind, LoadError};

/// A schema definition is malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// An attribute was built without a type.
    #[error("attribute has no type")]
    MissingType,

    /// A pattern is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A format name is not recognized.
    #[error("unknown format {0:?}")]
    UnknownFormat(String),

    /// A rule was declared on a type it cannot apply to.
    #[error("rule {rule} does not apply to type {type_name}")]
    RuleNotApplicable {
        /// The rule name.
        rule: &'static str,
        /// The attribute's type.
        type_name: String,
    },

    /// A lower bound exceeds its upper bound.
    #[error("invalid bounds for {rule}: {min} is greater than {max}")]
    InvalidBounds {
        /// `length` or `range`.
        rule: &'static str,
        /// The lower bound.
        min: f64,
        /// The upper bound.
        max: f64,
    },

    /// An allowed value does not load through the attribute's type.
    #[error("enum value {value} is invalid: {reason}")]
    InvalidEnum {
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A default value does not load or does not satisfy the rules.
    #[error("default value {value} is invalid: {reason}")]
    InvalidDefault {
        /// The offending default.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A media type identifier is malformed.
    #[error("invalid media type identifier {identifier:?}: {reason}")]
    InvalidIdentifier {
        /// The identifier as given.
        identifier: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Every media type must declare a `default` view.
    #[error("media type {media} does not declare the \"default\" view")]
    MissingDefaultView {
        /// The media type identifier.
        media: String,
    },

    /// A view refers to a view another media type does not declare.
    #[error("media type {media} has no view named {view:?}")]
    UnknownView {
        /// The media type identifier.
        media: String,
        /// The missing view.
        view: String,
    },

    /// A view lists a property the media type does not declare.
    #[error("view {view:?} of {media} names undeclared property {property:?}")]
    UnknownProperty {
        /// The media type identifier.
        media: String,
        /// The view name.
        view: String,
        /// The undeclared property.
        property: String,
    },

    /// A link definition is unusable.
    #[error("link {link:?} of view {view:?} in {media}: {reason}")]
    InvalidLink {
        /// The media type identifier.
        media: String,
        /// The view name.
        view: String,
        /// The link name.
        link: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A name was registered twice.
    #[error("duplicate definition {0:?}")]
    Duplicate(String),

    /// A type name does not resolve.
    #[error("unknown type {0:?}")]
    UnknownType(String),

    /// A named type refers back to itself.
    #[error("type {0:?} refers to itself")]
    Cycle(String),

    /// A descriptor document could not be read or parsed.
    #[error("cannot read descriptor {path}: {reason}")]
    Descriptor {
        /// Source path or `<inline>`.
        path: String,
        /// Reader or parser message.
        reason: String,
    },

    /// An error located inside a larger definition.
    #[error("{path}: {source}")]
    At {
        /// Dotted location of the failing definition.
        path: String,
        /// The underlying error.
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Locate this error under `path`, joining nested locations with dots.
    pub fn at(self, path: impl Into<String>) -> Self {
        let path = path.into();
        match self {
            SchemaError::At {
                path: inner,
                source,
            } => SchemaError::At {
                path: format!("{path}.{inner}"),
                source,
            },
            other => SchemaError::At {
                path,
                source: Box::new(other),
            },
        }
    }

    /// Definition errors are always server-side defects.
    pub fn classify(&self) -> Classification {
        Classification::Server
    }
}

/// Loading into a native record failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlueprintError {
    /// The raw input failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A coerced value cannot be stored in the declared field.
    #[error("internal inconsistency at {path}: {reason}")]
    Inconsistent {
        /// Attribute path of the failing assignment.
        path: String,
        /// What disagreed.
        reason: String,
    },
}

impl BlueprintError {
    /// Input failures are the client's; inconsistencies are the server's.
    pub fn classify(&self) -> Classification {
        match self {
            BlueprintError::Load(_) => Classification::Client,
            BlueprintError::Inconsistent { .. } => Classification::Server,
        }
    }
}

/// A projection through a view failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The requested view is not declared.
    #[error("media type {media} has no view named {view:?}")]
    ViewNotFound {
        /// The media type identifier.
        media: String,
        /// The requested view.
        view: String,
    },

    /// The value is not a record, mapping, or (for collections) sequence.
    #[error("media type {media} cannot render a value of kind {found}")]
    NotRenderable {
        /// The media type identifier.
        media: String,
        /// Kind of the rejected value.
        found: Kind,
    },

    /// The projection violates the media type's rules.
    #[error("rendering {media} through view {view:?} produced invalid output:\n{source}")]
    Invalid {
        /// The media type identifier.
        media: String,
        /// The view name.
        view: String,
        /// The violations.
        #[source]
        source: LoadError,
    },

    /// An element of a collection failed to render.
    #[error("element {index}: {source}")]
    Element {
        /// Position in the collection.
        index: usize,
        /// The element's failure.
        #[source]
        source: Box<RenderError>,
    },

    /// A nested property or link failed to render.
    #[error("{property}: {source}")]
    Nested {
        /// The property or link name.
        property: String,
        /// The nested failure.
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    /// Render failures are always server-side bugs.
    pub fn classify(&self) -> Classification {
        Classification::Server
    }
}

/// A boundary call through the catalog failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// No type or media type is registered under the name.
    #[error("no type or media type named {0:?}")]
    UnknownType(String),

    /// No media type is registered under the identifier.
    #[error("no media type with identifier {0:?}")]
    UnknownMediaType(String),

    /// The raw value failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The value failed to render.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl CatalogError {
    /// Only load failures are attributed to the client.
    pub fn classify(&self) -> Classification {
        match self {
            CatalogError::Load(_) => Classification::Client,
            _ => Classification::Server,
        }
    }
}
