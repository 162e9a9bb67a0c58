//! # Catalog — The Compiled Schema
//!
//! An immutable registry of named types and media types, built once at
//! start-up through [`CatalogBuilder`] and then shared read-only (behind an
//! `Arc`) by whatever owns request handling. There is no process-wide
//! registry.
//!
//! The catalog exposes the two boundary calls a transport layer needs:
//!
//! - [`Catalog::load`] — coerce and validate a raw value against a named
//!   type or media type. Failures are client errors.
//! - [`Catalog::render`] — project a value through a media type view.
//!   Failures are server errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use tessera_core::Value;

use crate::attribute::Attribute;
use crate::error::{CatalogError, SchemaError};
use crate::media::{Identifier, MediaType, DEFAULT_VIEW};
use crate::types::Type;

/// A compiled, immutable set of named types and media types.
///
/// Named types are stored as attributes so their rules (format, pattern,
/// bounds) apply when loading by name.
#[derive(Debug, Default)]
pub struct Catalog {
    types: BTreeMap<String, Attribute>,
    media_types: BTreeMap<Identifier, Arc<MediaType>>,
}

impl Catalog {
    /// Start building a catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Look up a named type.
    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.types.get(name).map(Attribute::ty)
    }

    /// Look up a named type with its rules.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.types.get(name)
    }

    /// Look up a media type by identifier. The identifier is normalized
    /// before lookup.
    pub fn media_type(&self, identifier: &str) -> Option<&Arc<MediaType>> {
        let identifier = Identifier::parse(identifier).ok()?;
        self.media_types.get(&identifier)
    }

    /// Registered type names.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Registered media type identifiers.
    pub fn media_type_identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.media_types.keys()
    }

    /// Coerce and validate `raw` against the named type, or against a media
    /// type when `name` is an identifier.
    pub fn load(&self, name: &str, raw: &Value) -> Result<Value, CatalogError> {
        tracing::debug!(target_type = name, "catalog load");
        if let Some(attribute) = self.types.get(name) {
            return Ok(attribute.load(raw)?);
        }
        match self.media_type(name) {
            Some(media) => Ok(media.load(raw)?),
            None => Err(CatalogError::UnknownType(name.to_string())),
        }
    }

    /// Render `value` through `view` of the media type `identifier`.
    pub fn render(&self, identifier: &str, value: &Value, view: &str) -> Result<Value, CatalogError> {
        let media = self
            .media_type(identifier)
            .ok_or_else(|| CatalogError::UnknownMediaType(identifier.to_string()))?;
        Ok(media.render(value, view)?)
    }

    /// Render through the `default` view.
    pub fn render_default(&self, identifier: &str, value: &Value) -> Result<Value, CatalogError> {
        self.render(identifier, value, DEFAULT_VIEW)
    }
}

/// Builder for [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    types: BTreeMap<String, Attribute>,
    media_types: BTreeMap<Identifier, Arc<MediaType>>,
}

impl CatalogBuilder {
    /// Register a named type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Duplicate`] when the name is taken.
    pub fn add_type(self, name: impl Into<String>, ty: impl Into<Type>) -> Result<Self, SchemaError> {
        self.add_attribute(name, Attribute::new(ty))
    }

    /// Register a named type together with its rules.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Duplicate`] when the name is taken.
    pub fn add_attribute(
        mut self,
        name: impl Into<String>,
        attribute: Attribute,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(SchemaError::Duplicate(name));
        }
        self.types.insert(name, attribute);
        Ok(self)
    }

    /// Register a media type under its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Duplicate`] when the identifier is taken.
    pub fn add_media_type(mut self, media: Arc<MediaType>) -> Result<Self, SchemaError> {
        let identifier = media.identifier().clone();
        if self.media_types.contains_key(&identifier) {
            return Err(SchemaError::Duplicate(identifier.to_string()));
        }
        self.media_types.insert(identifier, media);
        Ok(self)
    }

    /// Whether a media type identifier is already registered.
    pub fn has_media_type(&self, identifier: &Identifier) -> bool {
        self.media_types.contains_key(identifier)
    }

    /// Freeze the catalog.
    pub fn build(self) -> Catalog {
        tracing::debug!(
            types = self.types.len(),
            media_types = self.media_types.len(),
            "catalog compiled"
        );
        Catalog {
            types: self.types,
            media_types: self.media_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::View;
    use serde_json::json;
    use tessera_core::{Classification, Primitive};

    fn catalog() -> Catalog {
        let media = Arc::new(
            MediaType::builder("application/vnd.example.tag+json")
                .attribute("label", Attribute::of(Primitive::String).required().build().unwrap())
                .view(View::new("default").property("label"))
                .build()
                .unwrap(),
        );
        Catalog::builder()
            .add_type("Count", Primitive::Integer)
            .unwrap()
            .add_attribute(
                "Percent",
                Attribute::of(Primitive::Number).minimum(0.0).maximum(100.0).build().unwrap(),
            )
            .unwrap()
            .add_media_type(Arc::clone(&media))
            .unwrap()
            .add_media_type(Arc::new(MediaType::collection(media)))
            .unwrap()
            .build()
    }

    #[test]
    fn test_load_by_name_and_identifier() {
        let c = catalog();
        assert_eq!(c.load("Count", &Value::from("4")).unwrap(), Value::Int(4));
        let v = c
            .load("application/vnd.example.tag+json", &Value::from(json!({"label": "x"})))
            .unwrap();
        assert_eq!(v.get("label"), Some(&Value::from("x")));
    }

    #[test]
    fn test_named_rules_apply() {
        let c = catalog();
        assert_eq!(c.load("Percent", &Value::Int(50)).unwrap(), Value::Float(50.0));
        let err = c.load("Percent", &Value::Int(150)).unwrap_err();
        assert!(err.to_string().contains("maximum"));
        assert_eq!(c.type_of("Count").map(Type::name), Some("integer".to_string()));
    }

    #[test]
    fn test_unknown_names() {
        let c = catalog();
        let err = c.load("Nope", &Value::Null).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownType(_)));
        assert_eq!(err.classify(), Classification::Server);
        let err = c.render_default("text/nope", &Value::Null).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownMediaType(_)));
    }

    #[test]
    fn test_load_errors_are_client_side() {
        let err = catalog().load("Count", &Value::from("x")).unwrap_err();
        assert_eq!(err.classify(), Classification::Client);
    }

    #[test]
    fn test_render_collection_identifier() {
        let c = catalog();
        let out = c
            .render_default(
                "application/vnd.example.tag+json; type=collection",
                &Value::from(json!([{"label": "a"}, {"label": "b", "extra": 1}])),
            )
            .unwrap();
        assert_eq!(out, Value::from(json!([{"label": "a"}, {"label": "b"}])));
    }

    #[test]
    fn test_duplicates_rejected() {
        let err = Catalog::builder()
            .add_type("A", Primitive::String)
            .unwrap()
            .add_type("A", Primitive::Integer)
            .unwrap_err();
        assert_eq!(err, SchemaError::Duplicate("A".into()));
    }
}
