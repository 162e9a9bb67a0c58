//! # Kinds
//!
//! The closed set of kinds a schema type can demand. Every `match` over
//! `Kind` is exhaustive; adding a kind forces every consumer to handle it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a value or type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// `null`.
    Null,
    /// `true` / `false`.
    Boolean,
    /// Whole numbers, canonical width `i64`.
    Integer,
    /// Double-precision numbers.
    Number,
    /// UTF-8 text.
    String,
    /// A composite with declared properties.
    Object,
    /// An ordered collection with a single element type.
    Array,
    /// A string-keyed collection with a single value type.
    Map,
}

impl Kind {
    /// All kinds, in declaration order.
    pub const ALL: [Kind; 8] = [
        Kind::Null,
        Kind::Boolean,
        Kind::Integer,
        Kind::Number,
        Kind::String,
        Kind::Object,
        Kind::Array,
        Kind::Map,
    ];

    /// The lowercase name used in error messages and descriptors.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::Map => "map",
        }
    }

    /// Whether values of this kind are composites that may arrive as
    /// encoded text (JSON) and must be decoded first.
    pub fn is_composite(&self) -> bool {
        matches!(self, Kind::Object | Kind::Array | Kind::Map)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
