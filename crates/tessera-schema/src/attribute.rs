//! # Attributes
//!
//! An attribute is a named slot of an object schema: a [`Type`], an
//! optional description and default, a required flag, and a rule set.
//!
//! Attributes are built once through [`AttributeBuilder`], which fails
//! fast when the definition is unusable: no type, an uncompilable pattern,
//! a rule that cannot apply to the type, inverted bounds, or an enum value
//! or default that does not itself load and validate.

use regex::Regex;

use tessera_core::{LoadError, Primitive, Value, Violation, ViolationKind, Violations};

use crate::error::SchemaError;
use crate::types::Type;
use crate::validation::{Format, Rules};

/// A typed, validated property of an object schema.
#[derive(Debug, Clone)]
pub struct Attribute {
    ty: Type,
    description: Option<String>,
    default: Option<Value>,
    required: bool,
    rules: Rules,
    view: Option<String>,
}

impl Attribute {
    /// An attribute with no rules, default, or description.
    pub fn new(ty: impl Into<Type>) -> Self {
        Self {
            ty: ty.into(),
            description: None,
            default: None,
            required: false,
            rules: Rules::default(),
            view: None,
        }
    }

    /// Start building an attribute.
    pub fn builder() -> AttributeBuilder {
        AttributeBuilder::default()
    }

    /// Start building an attribute of type `ty`.
    pub fn of(ty: impl Into<Type>) -> AttributeBuilder {
        AttributeBuilder::default().ty(ty)
    }

    /// The attribute's type.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The default used when the attribute is absent. Already coerced.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the attribute must be present.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The rule set.
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// View used when this attribute holds a media type and is rendered.
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Whether an explicit `null` is a value for this attribute rather
    /// than an absence.
    pub(crate) fn accepts_null(&self) -> bool {
        matches!(self.ty, Type::Primitive(Primitive::Null))
    }

    /// Coerce `raw` through the type, then apply every rule.
    pub fn load(&self, raw: &Value) -> Result<Value, LoadError> {
        let value = self.ty.load(raw)?;
        self.validate(&value)?;
        Ok(value)
    }

    /// Apply the rule set to an already-coerced value.
    pub fn validate(&self, value: &Value) -> Result<(), LoadError> {
        let mut violations = Violations::default();
        for rule in self.rules.check(value) {
            violations.push(Violation::new(ViolationKind::Rule(rule)));
        }
        violations.into_result()
    }
}

/// Builder for [`Attribute`].
#[derive(Debug, Clone, Default)]
pub struct AttributeBuilder {
    ty: Option<Type>,
    description: Option<String>,
    default: Option<Value>,
    required: bool,
    allowed: Option<Vec<Value>>,
    format: Option<Format>,
    pattern: Option<String>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    view: Option<String>,
}

impl AttributeBuilder {
    /// Set the type.
    pub fn ty(mut self, ty: impl Into<Type>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default value. It is coerced and validated by [`build`](Self::build).
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the attribute required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict values to an allowed set.
    pub fn allowed<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Require a named string format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Require strings to match a regular expression.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Minimum length in characters or entries.
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Maximum length in characters or entries.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Inclusive numeric lower bound.
    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    /// Inclusive numeric upper bound.
    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    /// View used when rendering a media-typed value held by this attribute.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Compile the attribute.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the type is missing, the pattern does
    /// not compile, a rule does not apply to the type, bounds are
    /// inverted, or an enum value or the default is invalid.
    pub fn build(self) -> Result<Attribute, SchemaError> {
        let ty = self.ty.ok_or(SchemaError::MissingType)?;
        let kind = ty.kind();
        let is_text = matches!(ty.primitive(), Some(Primitive::String | Primitive::DateTime));
        let is_numeric = matches!(ty.primitive(), Some(Primitive::Integer | Primitive::Number));
        let has_length = is_text || matches!(kind, tessera_core::Kind::Array | tessera_core::Kind::Map);

        let not_applicable = |rule: &'static str| SchemaError::RuleNotApplicable {
            rule,
            type_name: ty.name(),
        };
        if (self.pattern.is_some() || self.format.is_some()) && !is_text {
            let rule = if self.pattern.is_some() { "pattern" } else { "format" };
            return Err(not_applicable(rule));
        }
        if (self.min_length.is_some() || self.max_length.is_some()) && !has_length {
            return Err(not_applicable("length"));
        }
        if (self.minimum.is_some() || self.maximum.is_some()) && !is_numeric {
            return Err(not_applicable("range"));
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(SchemaError::InvalidBounds {
                    rule: "length",
                    min: min as f64,
                    max: max as f64,
                });
            }
        }
        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if min > max {
                return Err(SchemaError::InvalidBounds {
                    rule: "range",
                    min,
                    max,
                });
            }
        }

        let pattern = self
            .pattern
            .map(|source| {
                Regex::new(&source).map_err(|e| SchemaError::InvalidPattern {
                    pattern: source.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let allowed = self
            .allowed
            .map(|values| {
                values
                    .iter()
                    .map(|v| {
                        ty.load(v).map_err(|e| SchemaError::InvalidEnum {
                            value: v.describe(),
                            reason: e.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let mut attribute = Attribute {
            ty,
            description: self.description,
            default: None,
            required: self.required,
            rules: Rules {
                allowed,
                format: self.format,
                pattern,
                min_length: self.min_length,
                max_length: self.max_length,
                minimum: self.minimum,
                maximum: self.maximum,
            },
            view: self.view,
        };

        if let Some(raw) = self.default {
            let value = attribute
                .load(&raw)
                .map_err(|e| SchemaError::InvalidDefault {
                    value: raw.describe(),
                    reason: e.to_string(),
                })?;
            attribute.default = Some(value);
        }

        Ok(attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::ValidationError;

    #[test]
    fn test_missing_type_fails() {
        let err = Attribute::builder().required().build().unwrap_err();
        assert_eq!(err, SchemaError::MissingType);
    }

    #[test]
    fn test_minimum_scenario() {
        let attr = Attribute::of(Primitive::Integer).minimum(1.0).build().unwrap();
        let err = attr.load(&Value::Int(0)).unwrap_err();
        assert!(err.to_string().contains("minimum"), "{err}");
        assert_eq!(attr.load(&Value::from("5")).unwrap(), Value::Int(5));
        let err = attr.load(&Value::Float(5.7)).unwrap_err();
        assert!(matches!(
            err.first().unwrap().kind,
            ViolationKind::Coercion { .. }
        ));
    }

    #[test]
    fn test_enum_values_are_coerced_at_build() {
        let attr = Attribute::of(Primitive::Integer)
            .allowed(["1", "2"])
            .build()
            .unwrap();
        assert_eq!(attr.rules().allowed(), Some(&[Value::Int(1), Value::Int(2)][..]));
        assert_eq!(attr.load(&Value::Int(2)).unwrap(), Value::Int(2));
        let err = attr.load(&Value::Int(3)).unwrap_err();
        assert!(matches!(
            err.first().unwrap().kind,
            ViolationKind::Rule(ValidationError::Enum { .. })
        ));
    }

    #[test]
    fn test_invalid_enum_value_fails_build() {
        let err = Attribute::of(Primitive::Integer)
            .allowed(["one"])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidEnum { .. }));
    }

    #[test]
    fn test_default_must_satisfy_rules() {
        let err = Attribute::of(Primitive::String)
            .max_length(2)
            .default_value("too long")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));
    }

    #[test]
    fn test_default_is_coerced() {
        let attr = Attribute::of(Primitive::Number).default_value(3).build().unwrap();
        assert_eq!(attr.default_value(), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_rule_not_applicable() {
        let err = Attribute::of(Primitive::Boolean).pattern("^t").build().unwrap_err();
        assert!(matches!(err, SchemaError::RuleNotApplicable { rule: "pattern", .. }));
        let err = Attribute::of(Primitive::String).minimum(1.0).build().unwrap_err();
        assert!(matches!(err, SchemaError::RuleNotApplicable { rule: "range", .. }));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Attribute::of(Primitive::String).pattern("(").build().unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_inverted_bounds() {
        let err = Attribute::of(Primitive::Integer)
            .minimum(5.0)
            .maximum(1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidBounds { rule: "range", .. }));
    }

    #[test]
    fn test_all_rule_failures_reported() {
        let attr = Attribute::of(Primitive::String)
            .pattern("^[a-z]+$")
            .max_length(3)
            .build()
            .unwrap();
        let err = attr.load(&Value::from("ABCDE")).unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }
}
