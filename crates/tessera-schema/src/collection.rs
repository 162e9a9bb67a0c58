//! # Array and Map Loading
//!
//! Arrays keep element order. Maps always have string keys. Both accept
//! their natural raw shape or a string holding the encoded shape, and both
//! report every failing element under its index or key.

use std::borrow::Cow;

use tessera_core::{decode_encoded, LoadError, Mapping, Segment, Value, Violations};

use crate::types::Type;

/// Load a sequence through `element`, preserving order.
pub fn load_array(element: &Type, raw: &Value) -> Result<Value, LoadError> {
    let items: Cow<'_, [Value]> = match raw {
        Value::Sequence(items) => Cow::Borrowed(items.as_slice()),
        Value::String(text) => match decode_encoded(text)? {
            Value::Sequence(items) => Cow::Owned(items),
            other => {
                return Err(LoadError::coercion(
                    "array",
                    raw,
                    format!("encoded value is {}, not an array", other.kind()),
                ))
            }
        },
        other => {
            return Err(LoadError::coercion(
                "array",
                other,
                format!("cannot coerce {} to array", other.kind()),
            ))
        }
    };

    let mut out = Vec::with_capacity(items.len());
    let mut violations = Violations::default();
    for (index, item) in items.iter().enumerate() {
        match element.load(item) {
            Ok(value) => out.push(value),
            Err(e) => violations.absorb(e.within(Segment::Index(index))),
        }
    }
    violations.into_result()?;
    Ok(Value::Sequence(out))
}

/// Load a string-keyed mapping through `value`.
pub fn load_map(value: &Type, raw: &Value) -> Result<Value, LoadError> {
    let entries: Cow<'_, Mapping> = match raw {
        Value::Mapping(map) => Cow::Borrowed(map),
        Value::String(text) => match decode_encoded(text)? {
            Value::Mapping(map) => Cow::Owned(map),
            other => {
                return Err(LoadError::coercion(
                    "map",
                    raw,
                    format!("encoded value is {}, not a map", other.kind()),
                ))
            }
        },
        other => {
            return Err(LoadError::coercion(
                "map",
                other,
                format!("cannot coerce {} to map", other.kind()),
            ))
        }
    };

    let mut out = Mapping::new();
    let mut violations = Violations::default();
    for (key, item) in entries.iter() {
        match value.load(item) {
            Ok(v) => {
                out.insert(key.clone(), v);
            }
            Err(e) => violations.absorb(e.within(Segment::Key(key.clone()))),
        }
    }
    violations.into_result()?;
    Ok(Value::Mapping(out))
}
