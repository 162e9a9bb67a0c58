//! # Error Types — Input and Construction Families
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Input errors ([`LoadError`], [`ValidationError`]) are caused by
//!   externally-supplied data. They carry the offending path, the expected
//!   kind or rule, and the received value. Callers report them to the end
//!   user and keep serving.
//! - Construction errors ([`BindError`]) signal a mismatch between a schema
//!   and a native record shape. They surface at start-up, before traffic.
//! - [`Classification`] tells the transport layer which side is at fault
//!   without this crate choosing status codes.

use std::fmt;

use thiserror::Error;

use crate::path::{FieldPath, Segment};
use crate::value::Value;

/// Which party a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Externally-supplied data was malformed.
    Client,
    /// The schema, the record, or server-produced data is inconsistent.
    Server,
}

// ─── Validation rules ────────────────────────────────────────────────

/// A validation rule rejected an already-coerced value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The value is not a member of the allowed set.
    #[error("value {} is not one of the allowed values [{}]", .received.describe(), join(.allowed))]
    Enum {
        /// The allowed set.
        allowed: Vec<Value>,
        /// The rejected value.
        received: Value,
    },

    /// The value does not satisfy a named format.
    #[error("value {} does not match format {format}: {reason}", .received.describe())]
    Format {
        /// Format name (e.g. `email`).
        format: String,
        /// Why the value failed.
        reason: String,
        /// The rejected value.
        received: Value,
    },

    /// The string does not match a regular expression.
    #[error("value {} does not match pattern {pattern:?}", .received.describe())]
    Pattern {
        /// The regular expression source.
        pattern: String,
        /// The rejected value.
        received: Value,
    },

    /// Fewer characters or entries than allowed.
    #[error("length of {} is {actual}, less than the minimum length {min}", .received.describe())]
    MinLength {
        /// The declared lower bound.
        min: usize,
        /// The measured length.
        actual: usize,
        /// The rejected value.
        received: Value,
    },

    /// More characters or entries than allowed.
    #[error("length of {} is {actual}, greater than the maximum length {max}", .received.describe())]
    MaxLength {
        /// The declared upper bound.
        max: usize,
        /// The measured length.
        actual: usize,
        /// The rejected value.
        received: Value,
    },

    /// Numerically below the lower bound.
    #[error("value {} is less than the minimum {min}", .received.describe())]
    Minimum {
        /// The declared lower bound.
        min: f64,
        /// The rejected value.
        received: Value,
    },

    /// Numerically above the upper bound.
    #[error("value {} is greater than the maximum {max}", .received.describe())]
    Maximum {
        /// The declared upper bound.
        max: f64,
        /// The rejected value.
        received: Value,
    },
}

impl ValidationError {
    /// The rule name, as it appears in descriptors.
    pub fn rule(&self) -> &'static str {
        match self {
            ValidationError::Enum { .. } => "enum",
            ValidationError::Format { .. } => "format",
            ValidationError::Pattern { .. } => "pattern",
            ValidationError::MinLength { .. } => "min_length",
            ValidationError::MaxLength { .. } => "max_length",
            ValidationError::Minimum { .. } => "minimum",
            ValidationError::Maximum { .. } => "maximum",
        }
    }
}

fn join(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

// ─── Violations ──────────────────────────────────────────────────────

/// What went wrong at one path.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// The raw value could not be coerced to the expected kind.
    Coercion {
        /// Name of the expected kind or primitive.
        expected: String,
        /// The raw value as received.
        received: Value,
        /// Human-readable detail.
        detail: String,
    },
    /// A required attribute was absent.
    Missing,
    /// The input carried a key the schema does not declare.
    UnknownField,
    /// Text expected to hold an encoded composite failed to decode.
    Decode {
        /// Decoder message.
        reason: String,
    },
    /// A validation rule rejected the coerced value.
    Rule(ValidationError),
}

/// A single input violation with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Location of the violation, relative to the value being loaded.
    pub path: FieldPath,
    /// The failure.
    pub kind: ViolationKind,
}

impl Violation {
    /// A violation at the root path.
    pub fn new(kind: ViolationKind) -> Self {
        Self {
            path: FieldPath::root(),
            kind,
        }
    }

    /// A violation at `path`.
    pub fn at(path: FieldPath, kind: ViolationKind) -> Self {
        Self { path, kind }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = if self.path.is_root() {
            "(root)".to_string()
        } else {
            self.path.to_string()
        };
        match &self.kind {
            ViolationKind::Missing => write!(f, "missing required: {location}"),
            ViolationKind::UnknownField => write!(f, "unknown field: {location}"),
            ViolationKind::Coercion {
                expected,
                received,
                detail,
            } => write!(
                f,
                "{location}: expected {expected}, got {}: {detail}",
                received.describe()
            ),
            ViolationKind::Decode { reason } => {
                write!(f, "{location}: cannot decode encoded value: {reason}")
            }
            ViolationKind::Rule(rule) => write!(f, "{location}: {rule}"),
        }
    }
}

/// Collection of violations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Append one violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Append every violation of a nested load error.
    pub fn absorb(&mut self, error: LoadError) {
        self.violations.extend(error.violations.violations);
    }

    /// Turn the collection into a load error, or `Ok(())` when empty.
    pub fn into_result(self) -> Result<(), LoadError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(LoadError { violations: self })
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A raw value failed to load. Never empty.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{violations}")]
pub struct LoadError {
    violations: Violations,
}

impl LoadError {
    /// An error holding exactly one violation.
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: Violations {
                violations: vec![violation],
            },
        }
    }

    /// A root-level coercion failure.
    pub fn coercion(expected: impl Into<String>, received: &Value, detail: impl Into<String>) -> Self {
        Self::single(Violation::new(ViolationKind::Coercion {
            expected: expected.into(),
            received: received.clone(),
            detail: detail.into(),
        }))
    }

    /// A root-level decode failure.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::single(Violation::new(ViolationKind::Decode {
            reason: reason.into(),
        }))
    }

    /// A root-level rule failure.
    pub fn rule(rule: ValidationError) -> Self {
        Self::single(Violation::new(ViolationKind::Rule(rule)))
    }

    /// Relocate every violation under `segment`.
    pub fn within(mut self, segment: Segment) -> Self {
        for v in &mut self.violations.violations {
            v.path.prepend(segment.clone());
        }
        self
    }

    /// The first recorded violation.
    pub fn first(&self) -> Option<&Violation> {
        self.violations.violations.first()
    }

    /// All violations in recording order.
    pub fn violations(&self) -> &[Violation] {
        self.violations.violations()
    }

    /// Consumes self and returns the violations.
    pub fn into_violations(self) -> Violations {
        self.violations
    }

    /// Input errors are always the client's fault.
    pub fn classify(&self) -> Classification {
        Classification::Client
    }
}

// ─── Construction ────────────────────────────────────────────────────

/// A schema cannot be bound to a native record shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A schema property has no corresponding record field.
    #[error("{context}: schema property '{property}' has no corresponding record field")]
    MissingField {
        /// Where the mismatch was found.
        context: String,
        /// The unmatched property.
        property: String,
    },

    /// A record field has no corresponding schema property.
    #[error("{context}: record field '{field}' has no corresponding schema property")]
    UnmappedField {
        /// Where the mismatch was found.
        context: String,
        /// The unmatched field.
        field: String,
    },

    /// Two record fields claim the same schema name.
    #[error("{context}: more than one record field maps to '{name}'")]
    DuplicateField {
        /// Where the mismatch was found.
        context: String,
        /// The contested schema name.
        name: String,
    },

    /// Field and property kinds are incompatible.
    #[error("{context}: cannot bind {expected} to a record field of kind {found}")]
    KindMismatch {
        /// Where the mismatch was found.
        context: String,
        /// The schema type.
        expected: String,
        /// The native field kind.
        found: String,
    },
}

impl BindError {
    /// Binding failures are always server-side defects.
    pub fn classify(&self) -> Classification {
        Classification::Server
    }
}
