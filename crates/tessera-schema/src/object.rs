//! # Object Schemas
//!
//! An object schema maps property names to [`Attribute`]s and may nest
//! arbitrarily.
//!
//! ## Loading
//!
//! The raw value must be a mapping, or a string holding an encoded (JSON)
//! mapping, which is decoded first. Then, for every declared attribute:
//!
//! 1. absent and required: a `missing required` violation naming it;
//! 2. absent with a default: the default is used as-is;
//! 3. present: loaded through the attribute's type, then validated
//!    (enum, format, pattern, length, range); failures are recorded under
//!    the attribute's name and loading continues with the next attribute.
//!
//! An explicit `null` counts as absent unless the attribute's type is
//! `null`. Keys the schema does not declare are rejected as unknown
//! fields. Every violation is collected and returned in one [`LoadError`].

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use tessera_core::{
    decode_encoded, BindContext, BindError, FieldPath, LoadError, Mapping, NativeKind, Segment,
    Value, Violation, ViolationKind, Violations,
};

use crate::attribute::Attribute;

/// An object schema.
#[derive(Debug, Clone, Default)]
pub struct Object {
    attributes: BTreeMap<String, Attribute>,
}

impl Object {
    /// An object with no properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property.
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Add or replace a property in place.
    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    /// Look up a property.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Whether a property is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Iterate properties in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared properties.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true when no property is declared.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Coerce and validate `raw` into a mapping of declared properties.
    pub fn load(&self, raw: &Value) -> Result<Value, LoadError> {
        let input = as_mapping(raw)?;
        let mut out = Mapping::new();
        let mut violations = Violations::default();

        for (name, attribute) in &self.attributes {
            let present = input
                .get(name)
                .filter(|v| !v.is_null() || attribute.accepts_null());
            match present {
                None if attribute.is_required() => {
                    violations.push(Violation::at(FieldPath::key(name), ViolationKind::Missing));
                }
                None => {
                    if let Some(default) = attribute.default_value() {
                        out.insert(name.clone(), default.clone());
                    }
                }
                Some(raw_value) => match attribute.load(raw_value) {
                    Ok(value) => {
                        tracing::trace!(attribute = %name, "attribute loaded");
                        out.insert(name.clone(), value);
                    }
                    Err(e) => violations.absorb(e.within(Segment::Key(name.clone()))),
                },
            }
        }

        for key in input.keys().filter(|k| !self.attributes.contains_key(*k)) {
            violations.push(Violation::at(FieldPath::key(key), ViolationKind::UnknownField));
        }

        violations.into_result()?;
        Ok(Value::Mapping(out))
    }

    /// Check an already-shaped mapping against presence and rule
    /// constraints, without coercion. Used on rendered output.
    pub fn validate(&self, mapping: &Mapping) -> Violations {
        let mut violations = Violations::default();
        for (name, attribute) in &self.attributes {
            match mapping.get(name) {
                None if attribute.is_required() => {
                    violations.push(Violation::at(FieldPath::key(name), ViolationKind::Missing));
                }
                None => {}
                Some(value) => {
                    for rule in attribute.rules().check(value) {
                        violations.push(Violation::at(
                            FieldPath::key(name),
                            ViolationKind::Rule(rule),
                        ));
                    }
                }
            }
        }
        violations
    }

    /// Check a one-to-one correspondence between properties and the fields
    /// of a native record, recursively, with compatible kinds.
    pub fn can_bind(&self, native: &NativeKind, ctx: &BindContext) -> Result<(), BindError> {
        let fields = match native.unwrap_optional() {
            NativeKind::Dynamic => return Ok(()),
            NativeKind::Record(fields) => fields,
            other => {
                return Err(BindError::KindMismatch {
                    context: ctx.to_string(),
                    expected: "object".to_string(),
                    found: other.to_string(),
                })
            }
        };

        let mut seen = BTreeSet::new();
        for field in fields {
            if !seen.insert(field.name.as_str()) {
                return Err(BindError::DuplicateField {
                    context: ctx.to_string(),
                    name: field.name.clone(),
                });
            }
        }

        for (name, attribute) in &self.attributes {
            let field = fields.iter().find(|f| f.name == *name).ok_or_else(|| {
                BindError::MissingField {
                    context: ctx.to_string(),
                    property: name.clone(),
                }
            })?;
            attribute.ty().can_bind(&field.kind, &ctx.child(name))?;
        }

        if let Some(extra) = fields.iter().find(|f| !self.attributes.contains_key(&f.name)) {
            return Err(BindError::UnmappedField {
                context: ctx.to_string(),
                field: extra.field.clone(),
            });
        }

        Ok(())
    }
}

/// Borrow a raw mapping, decoding encoded text first.
fn as_mapping(raw: &Value) -> Result<Cow<'_, Mapping>, LoadError> {
    match raw {
        Value::Mapping(map) => Ok(Cow::Borrowed(map)),
        Value::String(text) => match decode_encoded(text)? {
            Value::Mapping(map) => Ok(Cow::Owned(map)),
            other => Err(LoadError::coercion(
                "object",
                raw,
                format!("encoded value is {}, not an object", other.kind()),
            )),
        },
        other => Err(LoadError::coercion(
            "object",
            other,
            format!("cannot coerce {} to object", other.kind()),
        )),
    }
}
