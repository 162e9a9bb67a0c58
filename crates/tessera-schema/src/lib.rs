//! # tessera-schema — Schema-Typed Loading and Rendering
//!
//! Turns untyped, externally-sourced data into validated, strongly-typed
//! values, and turns internal records back into selectively-projected
//! output representations.
//!
//! ## Loading (`types`, `object`, `collection`, `attribute`, `validation`)
//!
//! [`Type`] is a closed tagged union over primitive, object, array, map,
//! and reference variants. [`Type::load`] coerces a raw [`Value`] through
//! the schema recursively, applies the validation rules of every
//! [`Attribute`] in a fixed order (enum, format, pattern, length, range),
//! rejects unknown keys, and reports every violation it finds.
//!
//! ## Binding (`blueprint`)
//!
//! A [`Blueprint`] pairs an [`Object`] schema with a native record shape
//! declared through [`RecordShape`]. The one-to-one correspondence between
//! properties and fields is checked once, at construction.
//!
//! ## Rendering (`media`)
//!
//! A [`MediaType`] adds an [`Identifier`], named [`View`]s and [`Link`]s.
//! [`MediaType::render`] projects a value or record through a view,
//! backfills defaults, and re-validates the projection.
//!
//! ## Compiled Catalog (`catalog`, `descriptor`)
//!
//! A [`Catalog`] holds every named type and media type, built once at
//! start-up (in code or from a YAML/JSON [`Descriptor`]) and shared
//! read-only.
//!
//! ## Crate Policy
//!
//! - Depends only on `tessera-core` internally.
//! - Everything compiled is immutable; per-call values are owned by the call.
//! - Bad definitions fail fast with [`SchemaError`] or
//!   [`BindError`](tessera_core::BindError). Bad input never panics.

pub mod attribute;
pub mod blueprint;
pub mod catalog;
pub mod collection;
pub mod descriptor;
pub mod error;
pub mod media;
pub mod object;
pub mod types;
pub mod validation;

pub use attribute::{Attribute, AttributeBuilder};
pub use blueprint::{Blueprint, Mismatch, NativeValue, RecordShape};
pub use catalog::{Catalog, CatalogBuilder};
pub use descriptor::{AttributeSpec, Descriptor, LinkSpec, MediaTypeSpec, ViewAttributeSpec, ViewSpec};
pub use error::{BlueprintError, CatalogError, RenderError, SchemaError};
pub use media::{
    Identifier, Link, MediaType, MediaTypeBuilder, View, ViewProperty, DEFAULT_VIEW, LINK_VIEW,
};
pub use object::Object;
pub use types::{Reference, Type};
pub use validation::{Format, Rules};

pub use tessera_core::{Kind, LoadError, Primitive, Value};
