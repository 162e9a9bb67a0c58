//! # Primitive Coercion Engine
//!
//! Converts untyped raw values into the canonical representation demanded
//! by a primitive type. These rules are a public contract:
//!
//! | Primitive  | Accepted raw values                                             | Canonical output |
//! |------------|-----------------------------------------------------------------|------------------|
//! | `null`     | `null`                                                          | `Null`           |
//! | `boolean`  | booleans, `0`/`1`, `"true" "false" "1" "0" "t" "f"` (any case)  | `Bool`           |
//! | `integer`  | integers of any width, whole floats, base-10 integer text       | `Int` (`i64`)    |
//! | `number`   | integers, finite floats, float text                             | `Float` (`f64`)  |
//! | `string`   | strings only                                                    | `String`         |
//! | `datetime` | date-time text (layout-ordered), Unix epoch seconds             | RFC 3339 text    |
//!
//! A failure is always a [`LoadError`], never a panic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, LoadError};
use crate::kind::Kind;
use crate::native::{BindContext, NativeKind};
use crate::temporal;
use crate::value::Value;

/// Tokens accepted for booleans, compared case-insensitively.
const TRUE_TOKENS: &[&str] = &["true", "1", "t"];
const FALSE_TOKENS: &[&str] = &["false", "0", "f"];

/// A primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    /// Only `null`.
    Null,
    /// Booleans and boolean tokens.
    Boolean,
    /// Whole numbers in canonical `i64` width.
    Integer,
    /// Double-precision numbers.
    Number,
    /// Strings only.
    String,
    /// Instants, normalized to RFC 3339 UTC text.
    DateTime,
}

impl Primitive {
    /// The kind of the canonical output.
    ///
    /// Date-times are carried as normalized text, so they report
    /// [`Kind::String`].
    pub fn kind(&self) -> Kind {
        match self {
            Primitive::Null => Kind::Null,
            Primitive::Boolean => Kind::Boolean,
            Primitive::Integer => Kind::Integer,
            Primitive::Number => Kind::Number,
            Primitive::String | Primitive::DateTime => Kind::String,
        }
    }

    /// The name used in error messages and descriptors.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::DateTime => "datetime",
            other => other.kind().name(),
        }
    }

    /// Coerce `raw` to this primitive's canonical representation.
    pub fn load(&self, raw: &Value) -> Result<Value, LoadError> {
        match self {
            Primitive::Null => match raw {
                Value::Null => Ok(Value::Null),
                other => Err(LoadError::coercion("null", other, "only null is accepted")),
            },
            Primitive::Boolean => to_boolean(raw).map(Value::Bool),
            Primitive::Integer => to_integer(raw).map(Value::Int),
            Primitive::Number => to_number(raw).map(Value::Float),
            Primitive::String => to_string(raw).map(Value::String),
            Primitive::DateTime => to_datetime(raw).map(|dt| Value::String(temporal::to_text(&dt))),
        }
    }

    /// Check that a native field of kind `native` can hold this primitive.
    pub fn can_bind(&self, native: &NativeKind, ctx: &BindContext) -> Result<(), BindError> {
        let compatible = match (self, native) {
            (_, NativeKind::Dynamic) => true,
            (Primitive::Null, NativeKind::Optional(_)) => true,
            (_, NativeKind::Optional(inner)) => return self.can_bind(inner, ctx),
            (Primitive::Boolean, NativeKind::Bool) => true,
            (Primitive::Integer, NativeKind::Int) => true,
            (Primitive::Number, NativeKind::Float) => true,
            (Primitive::String, NativeKind::String) => true,
            (Primitive::DateTime, NativeKind::DateTime | NativeKind::String) => true,
            _ => false,
        };
        if compatible {
            Ok(())
        } else {
            Err(BindError::KindMismatch {
                context: ctx.to_string(),
                expected: self.name().to_string(),
                found: native.to_string(),
            })
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coerce to a boolean.
pub fn to_boolean(raw: &Value) -> Result<bool, LoadError> {
    let parsed = match raw {
        Value::Bool(b) => Some(*b),
        Value::Int(0) => Some(false),
        Value::Int(1) => Some(true),
        Value::String(s) => {
            let token = s.to_ascii_lowercase();
            if TRUE_TOKENS.contains(&token.as_str()) {
                Some(true)
            } else if FALSE_TOKENS.contains(&token.as_str()) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    };
    parsed.ok_or_else(|| {
        LoadError::coercion(
            "boolean",
            raw,
            "accepted values are true, false, 1, 0, t, f (case-insensitive) and the integers 0 and 1",
        )
    })
}

/// Coerce to a canonical `i64`.
pub fn to_integer(raw: &Value) -> Result<i64, LoadError> {
    match raw {
        Value::Int(i) => Ok(*i),
        Value::Float(f) => {
            if !f.is_finite() || f.fract() != 0.0 {
                Err(LoadError::coercion("integer", raw, "value has a fractional part"))
            } else if *f < -9.223_372_036_854_776e18 || *f >= 9.223_372_036_854_776e18 {
                Err(LoadError::coercion("integer", raw, "value is out of the 64-bit integer range"))
            } else {
                Ok(*f as i64)
            }
        }
        Value::String(s) => s.parse::<i64>().map_err(|e| {
            LoadError::coercion("integer", raw, format!("not a base-10 integer: {e}"))
        }),
        other => Err(LoadError::coercion(
            "integer",
            other,
            format!("cannot coerce {} to integer", other.kind()),
        )),
    }
}

/// Coerce to a finite `f64`.
pub fn to_number(raw: &Value) -> Result<f64, LoadError> {
    let parsed = match raw {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::String(s) => s.parse::<f64>().map_err(|e| {
            LoadError::coercion("number", raw, format!("not a number: {e}"))
        })?,
        other => {
            return Err(LoadError::coercion(
                "number",
                other,
                format!("cannot coerce {} to number", other.kind()),
            ))
        }
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(LoadError::coercion("number", raw, "value is not finite"))
    }
}

/// Accept only strings.
pub fn to_string(raw: &Value) -> Result<String, LoadError> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        other => Err(LoadError::coercion(
            "string",
            other,
            format!("cannot coerce {} to string", other.kind()),
        )),
    }
}

/// Coerce to a UTC instant.
pub fn to_datetime(raw: &Value) -> Result<chrono::DateTime<chrono::Utc>, LoadError> {
    match raw {
        Value::String(s) => {
            temporal::parse(s).map_err(|detail| LoadError::coercion("datetime", raw, detail))
        }
        Value::Int(secs) => temporal::from_epoch_secs(*secs)
            .map_err(|detail| LoadError::coercion("datetime", raw, detail)),
        other => Err(LoadError::coercion(
            "datetime",
            other,
            format!("cannot coerce {} to datetime", other.kind()),
        )),
    }
}

/// Decode text holding an encoded composite (JSON).
///
/// Used by composite types when a raw value arrives as a string, e.g. a
/// JSON object passed as a query parameter.
pub fn decode_encoded(text: &str) -> Result<Value, LoadError> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from)
        .map_err(|e| LoadError::decode(e.to_string()))
}
