//! # tessera-core — Values, Kinds, and Coercion
//!
//! The leaf crate of the Tessera workspace. It defines the closed value
//! model that flows through every `load` and `render` call, the kinds a
//! schema can demand, and the primitive coercion rules that turn untyped,
//! externally-sourced data into canonical typed values.
//!
//! ## Key Design Principles
//!
//! 1. **One closed value type.** [`Value`] is `Null | Bool | Int | Float |
//!    String | Sequence | Mapping`. Every raw input and every coerced output
//!    is a `Value`, so matching is exhaustive and compiler-checked.
//!
//! 2. **Canonical widths.** Integers are `i64`, numbers are `f64`. Raw
//!    integers of any Rust width convert into a `Value` and are normalized
//!    by [`Primitive::Integer`].
//!
//! 3. **Two error families.** Input errors ([`LoadError`], built from
//!    [`Violation`]s and [`ValidationError`]s) are always recoverable and
//!    client-facing. Construction errors ([`BindError`]) signal a mismatch
//!    between a schema and the code that uses it and are meant to fail
//!    start-up.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tessera-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests. Malformed input is always a
//!   value-level error.

pub mod coerce;
pub mod error;
pub mod kind;
pub mod native;
pub mod path;
pub mod temporal;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use coerce::{decode_encoded, Primitive};
pub use error::{
    BindError, Classification, LoadError, ValidationError, Violation, ViolationKind, Violations,
};
pub use kind::Kind;
pub use native::{BindContext, NativeField, NativeKind};
pub use path::{FieldPath, Segment};
pub use value::{Mapping, Value};
