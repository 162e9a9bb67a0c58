//! # Schema Descriptors
//!
//! A descriptor is a YAML or JSON document declaring named types and media
//! types. It compiles into a [`Catalog`], failing fast with a
//! [`SchemaError`] that names the offending definition.
//!
//! ```yaml
//! types:
//!   Account:
//!     type: object
//!     properties:
//!       id:   { type: integer, required: true, minimum: 1 }
//!       name: { type: string, required: true, max_length: 64 }
//! media_types:
//!   - identifier: application/vnd.example.account+json
//!     name: Account
//!     collection: true
//!     views:
//!       default: { attributes: [id, name] }
//!       link:    { attributes: [id] }
//! ```
//!
//! ## Resolution
//!
//! An attribute's `type` is one of the primitive names, `object` (with
//! `properties`), `array` (with `items`), `map` (with `values`), a name
//! from `types`, or the identifier of a media type declared earlier in
//! `media_types`. Named types compile on first use. A named type used as
//! an attribute type carries its rules along; the attribute's own keys
//! take precedence. Named types may not refer to themselves, directly or
//! through other named types.
//!
//! Unknown keys anywhere in the document are rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tessera_core::{Primitive, Value};

use crate::attribute::{Attribute, AttributeBuilder};
use crate::catalog::{Catalog, CatalogBuilder};
use crate::error::SchemaError;
use crate::media::{Identifier, Link, MediaType, View, ViewProperty};
use crate::object::Object;
use crate::types::{Reference, Type};
use crate::validation::Format;

/// A descriptor document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    /// Named types.
    #[serde(default)]
    pub types: BTreeMap<String, AttributeSpec>,
    /// Media types, in declaration order.
    #[serde(default)]
    pub media_types: Vec<MediaTypeSpec>,
}

/// The declaration of one attribute or named type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    /// Type name.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the attribute must be present.
    #[serde(default)]
    pub required: bool,
    /// Default used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    /// Named string format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Regular expression strings must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Minimum length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Properties of an `object`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, AttributeSpec>,
    /// Element type of an `array`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<AttributeSpec>>,
    /// Value type of a `map`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Box<AttributeSpec>>,
    /// View used to render a media-typed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl AttributeSpec {
    /// An attribute of the given type and nothing else.
    pub fn of(ty: impl Into<String>) -> Self {
        Self {
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    fn has_constraints(&self) -> bool {
        self.required
            || self.default.is_some()
            || self.allowed.is_some()
            || self.format.is_some()
            || self.pattern.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
            || self.minimum.is_some()
            || self.maximum.is_some()
            || self.view.is_some()
    }

    /// `self` with every unset rule taken from `base`. `required` is never
    /// inherited.
    fn over(&self, base: &AttributeSpec) -> AttributeSpec {
        AttributeSpec {
            ty: self.ty.clone(),
            description: self.description.clone().or_else(|| base.description.clone()),
            required: self.required,
            default: self.default.clone().or_else(|| base.default.clone()),
            allowed: self.allowed.clone().or_else(|| base.allowed.clone()),
            format: self.format.clone().or_else(|| base.format.clone()),
            pattern: self.pattern.clone().or_else(|| base.pattern.clone()),
            min_length: self.min_length.or(base.min_length),
            max_length: self.max_length.or(base.max_length),
            minimum: self.minimum.or(base.minimum),
            maximum: self.maximum.or(base.maximum),
            properties: self.properties.clone(),
            items: self.items.clone(),
            values: self.values.clone(),
            view: self.view.clone().or_else(|| base.view.clone()),
        }
    }
}

/// The declaration of one media type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaTypeSpec {
    /// The media type identifier.
    pub identifier: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of an object type from `types` to use as the schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Inline schema, when `name` is not given.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeSpec>,
    /// Also register the collection media type.
    #[serde(default)]
    pub collection: bool,
    /// Named views.
    #[serde(default)]
    pub views: BTreeMap<String, ViewSpec>,
}

/// The declaration of one view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSpec {
    /// Listed properties.
    #[serde(default)]
    pub attributes: Vec<ViewAttributeSpec>,
    /// Links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkSpec>,
}

/// A property listed by a view: a bare name, or a name with overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewAttributeSpec {
    /// The property as declared.
    Name(String),
    /// The property with per-view overrides.
    Detailed {
        /// The property name.
        name: String,
        /// View for a nested media type.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view: Option<String>,
        /// Replacement attribute for this view.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribute: Option<AttributeSpec>,
    },
}

/// The declaration of one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSpec {
    /// The link name.
    pub name: String,
    /// The property rendered; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// The view the target renders through; defaults to `link`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl Descriptor {
    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(text).map_err(|e| SchemaError::Descriptor {
            path: "<inline>".to_string(),
            reason: format!("invalid YAML: {e}"),
        })
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::Descriptor {
            path: "<inline>".to_string(),
            reason: format!("invalid JSON: {e}"),
        })
    }

    /// Read a descriptor file. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let located = |reason: String| SchemaError::Descriptor {
            path: path.display().to_string(),
            reason,
        };
        let content =
            std::fs::read_to_string(path).map_err(|e| located(format!("cannot read file: {e}")))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        tracing::debug!(path = %path.display(), "reading descriptor");
        match ext {
            "json" => serde_json::from_str(&content)
                .map_err(|e| located(format!("invalid JSON: {e}"))),
            _ => serde_yaml::from_str(&content).map_err(|e| located(format!("invalid YAML: {e}"))),
        }
    }

    /// Compile every declaration into a catalog.
    pub fn compile(&self) -> Result<Catalog, SchemaError> {
        let mut compiler = Compiler {
            specs: &self.types,
            named: BTreeMap::new(),
            resolving: BTreeSet::new(),
            media: BTreeMap::new(),
        };
        let mut builder = CatalogBuilder::default();

        for spec in &self.media_types {
            let (element, collection) = compiler
                .media_type(spec)
                .map_err(|e| e.at(spec.identifier.as_str()))?;
            builder = builder.add_media_type(element)?;
            if let Some(collection) = collection {
                builder = builder.add_media_type(collection)?;
            }
        }

        for name in self.types.keys() {
            let (ty, effective) = compiler.named_type(name)?;
            let attribute = compiler
                .build(AttributeBuilder::default().ty(ty), &effective)
                .map_err(|e| e.at(name.as_str()))?;
            builder = builder.add_attribute(name.as_str(), attribute)?;
            tracing::trace!(name = %name, "named type registered");
        }

        Ok(builder.build())
    }
}

struct Compiler<'a> {
    specs: &'a BTreeMap<String, AttributeSpec>,
    named: BTreeMap<String, (Type, AttributeSpec)>,
    resolving: BTreeSet<String>,
    media: BTreeMap<Identifier, Arc<MediaType>>,
}

impl Compiler<'_> {
    /// Compile an attribute declaration.
    fn attribute(&mut self, spec: &AttributeSpec) -> Result<Attribute, SchemaError> {
        let (ty, inherited) = self.resolve(spec)?;
        let effective = match inherited {
            Some(base) => spec.over(&base),
            None => spec.clone(),
        };
        self.build(AttributeBuilder::default().ty(ty), &effective)
    }

    /// Apply the non-type keys of `spec` and build.
    fn build(&self, mut builder: AttributeBuilder, spec: &AttributeSpec) -> Result<Attribute, SchemaError> {
        if let Some(description) = &spec.description {
            builder = builder.description(description.as_str());
        }
        if spec.required {
            builder = builder.required();
        }
        if let Some(default) = &spec.default {
            builder = builder.default_value(default.clone());
        }
        if let Some(allowed) = &spec.allowed {
            builder = builder.allowed(allowed.iter().cloned());
        }
        if let Some(format) = &spec.format {
            builder = builder.format(format.parse::<Format>()?);
        }
        if let Some(pattern) = &spec.pattern {
            builder = builder.pattern(pattern.as_str());
        }
        if let Some(min) = spec.min_length {
            builder = builder.min_length(min);
        }
        if let Some(max) = spec.max_length {
            builder = builder.max_length(max);
        }
        if let Some(min) = spec.minimum {
            builder = builder.minimum(min);
        }
        if let Some(max) = spec.maximum {
            builder = builder.maximum(max);
        }
        if let Some(view) = &spec.view {
            builder = builder.view(view.as_str());
        }
        builder.build()
    }

    /// Resolve the type of a declaration, with the rules it inherits from
    /// a named type.
    fn resolve(&mut self, spec: &AttributeSpec) -> Result<(Type, Option<AttributeSpec>), SchemaError> {
        let name = spec.ty.as_deref().ok_or(SchemaError::MissingType)?;
        let misplaced = |key: &str, ty: &str| SchemaError::Descriptor {
            path: "<descriptor>".to_string(),
            reason: format!("{key:?} is only valid for type {ty}"),
        };
        if name != "object" && !spec.properties.is_empty() {
            return Err(misplaced("properties", "object"));
        }
        if name != "array" && spec.items.is_some() {
            return Err(misplaced("items", "array"));
        }
        if name != "map" && spec.values.is_some() {
            return Err(misplaced("values", "map"));
        }

        match name {
            "object" => Ok((Type::Object(self.object(&spec.properties)?), None)),
            "array" => {
                let items = spec.items.as_deref().ok_or_else(|| missing("items", "array"))?;
                let element = self.element(items).map_err(|e| e.at("items"))?;
                Ok((Type::array_of(element), None))
            }
            "map" => {
                let values = spec.values.as_deref().ok_or_else(|| missing("values", "map"))?;
                let value = self.element(values).map_err(|e| e.at("values"))?;
                Ok((Type::map_of(value), None))
            }
            other => match primitive(other) {
                Some(p) => Ok((Type::Primitive(p), None)),
                None => self.reference(other),
            },
        }
    }

    /// Resolve the element type of an array or map. Rules do not apply to
    /// elements.
    fn element(&mut self, spec: &AttributeSpec) -> Result<Type, SchemaError> {
        if spec.has_constraints() {
            return Err(SchemaError::Descriptor {
                path: "<descriptor>".to_string(),
                reason: "items and values accept only type keys".to_string(),
            });
        }
        self.resolve(spec).map(|(ty, _)| ty)
    }

    fn object(&mut self, properties: &BTreeMap<String, AttributeSpec>) -> Result<Object, SchemaError> {
        let mut object = Object::new();
        for (name, spec) in properties {
            let attribute = self.attribute(spec).map_err(|e| e.at(name.as_str()))?;
            object.insert(name.as_str(), attribute);
        }
        Ok(object)
    }

    /// Resolve a named type or an earlier media type identifier.
    fn reference(&mut self, name: &str) -> Result<(Type, Option<AttributeSpec>), SchemaError> {
        if self.specs.contains_key(name) {
            let (ty, effective) = self.named_type(name)?;
            return Ok((ty, Some(effective)));
        }
        let media = Identifier::parse(name)
            .ok()
            .and_then(|id| self.media.get(&id))
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        Ok((Type::media(Arc::clone(media)), None))
    }

    /// Compile a named type on first use. Object types become shared
    /// references.
    fn named_type(&mut self, name: &str) -> Result<(Type, AttributeSpec), SchemaError> {
        if let Some(compiled) = self.named.get(name) {
            return Ok(compiled.clone());
        }
        let spec = self
            .specs
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        if !self.resolving.insert(name.to_string()) {
            return Err(SchemaError::Cycle(name.to_string()));
        }
        let resolved = self.resolve(spec).map_err(|e| e.at(name));
        self.resolving.remove(name);
        let (ty, inherited) = resolved?;

        let ty = match ty {
            Type::Object(object) => Type::named(name, Arc::new(object)),
            other => other,
        };
        let effective = match inherited {
            Some(base) => spec.over(&base),
            None => spec.clone(),
        };
        self.named.insert(name.to_string(), (ty.clone(), effective.clone()));
        Ok((ty, effective))
    }

    /// Compile a media type and, when requested, its collection.
    fn media_type(
        &mut self,
        spec: &MediaTypeSpec,
    ) -> Result<(Arc<MediaType>, Option<Arc<MediaType>>), SchemaError> {
        let object = match (&spec.name, spec.attributes.is_empty()) {
            (Some(name), true) => match self.named_type(name)?.0 {
                Type::Reference(Reference::Schema { object, .. }) => (*object).clone(),
                other => {
                    return Err(SchemaError::Descriptor {
                        path: "<descriptor>".to_string(),
                        reason: format!("{name:?} is a {}, not an object type", other.name()),
                    })
                }
            },
            (None, _) => self.object(&spec.attributes)?,
            (Some(_), false) => {
                return Err(SchemaError::Descriptor {
                    path: "<descriptor>".to_string(),
                    reason: "a media type takes either name or attributes, not both".to_string(),
                })
            }
        };

        let mut builder = MediaType::builder(spec.identifier.as_str()).object(object);
        if let Some(description) = &spec.description {
            builder = builder.description(description.as_str());
        }
        for (view_name, view_spec) in &spec.views {
            let view = self.view(view_name, view_spec).map_err(|e| e.at(view_name.as_str()))?;
            builder = builder.view(view);
        }

        let media = Arc::new(builder.build()?);
        self.media.insert(media.identifier().clone(), Arc::clone(&media));
        let collection = if spec.collection {
            let collection = Arc::new(MediaType::collection(Arc::clone(&media)));
            self.media
                .insert(collection.identifier().clone(), Arc::clone(&collection));
            Some(collection)
        } else {
            None
        };
        Ok((media, collection))
    }

    fn view(&mut self, name: &str, spec: &ViewSpec) -> Result<View, SchemaError> {
        let mut view = View::new(name);
        for entry in &spec.attributes {
            view = match entry {
                ViewAttributeSpec::Name(property) => view.property(property.as_str()),
                ViewAttributeSpec::Detailed {
                    name,
                    view: nested,
                    attribute,
                } => {
                    let mut property = ViewProperty::new(name.as_str());
                    if let Some(nested) = nested {
                        property = property.view(nested.as_str());
                    }
                    if let Some(attribute) = attribute {
                        property = property
                            .attribute(self.attribute(attribute).map_err(|e| e.at(name.as_str()))?);
                    }
                    view.property_with(property)
                }
            };
        }
        for link in &spec.links {
            let mut built = Link::new(link.name.as_str());
            if let Some(attribute) = &link.attribute {
                built = built.attribute(attribute.as_str());
            }
            if let Some(target_view) = &link.view {
                built = built.view(target_view.as_str());
            }
            view = view.link(built);
        }
        Ok(view)
    }
}

fn primitive(name: &str) -> Option<Primitive> {
    match name {
        "null" => Some(Primitive::Null),
        "boolean" => Some(Primitive::Boolean),
        "integer" => Some(Primitive::Integer),
        "number" => Some(Primitive::Number),
        "string" => Some(Primitive::String),
        "datetime" => Some(Primitive::DateTime),
        _ => None,
    }
}

fn missing(key: &str, ty: &str) -> SchemaError {
    SchemaError::Descriptor {
        path: "<descriptor>".to_string(),
        reason: format!("type {ty} requires {key:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ACCOUNTS: &str = r#"
types:
  Email:
    type: string
    format: email
  Account:
    type: object
    properties:
      id:    { type: integer, required: true, minimum: 1 }
      name:  { type: string, required: true, max_length: 64 }
      email: { type: Email }
      tags:  { type: array, items: { type: string } }
media_types:
  - identifier: application/vnd.example.account+json
    name: Account
    collection: true
    views:
      default: { attributes: [id, name, email] }
      link:    { attributes: [id] }
  - identifier: application/vnd.example.team+json
    attributes:
      title: { type: string, required: true }
      lead:  { type: application/vnd.example.account+json }
      members: { type: "application/vnd.example.account+json; type=collection" }
    views:
      default:
        attributes:
          - title
          - { name: lead, view: link }
      summary:
        attributes: [title]
        links:
          - { name: lead }
"#;

    fn catalog() -> Catalog {
        Descriptor::from_yaml_str(ACCOUNTS).unwrap().compile().unwrap()
    }

    #[test]
    fn test_compiles_types_and_media() {
        let c = catalog();
        assert!(c.type_of("Account").is_some());
        assert!(c.media_type("application/vnd.example.account+json").is_some());
        assert!(c
            .media_type("application/vnd.example.account+json; type=collection")
            .is_some());
        assert!(c.media_type("application/vnd.example.team+json").is_some());
    }

    #[test]
    fn test_named_rules_carry_over() {
        let c = catalog();
        let err = c
            .load("Account", &Value::from(json!({"id": 1, "name": "a", "email": "nope"})))
            .unwrap_err();
        assert!(err.to_string().contains("format email"), "{err}");
        assert!(c.load("Email", &Value::from("a@example.com")).is_ok());
    }

    #[test]
    fn test_render_through_descriptor_views() {
        let c = catalog();
        let team = Value::from(json!({
            "title": "core",
            "lead": {"id": 7, "name": "Ada"},
            "members": [{"id": 7, "name": "Ada"}]
        }));
        assert_eq!(
            c.render_default("application/vnd.example.team+json", &team).unwrap(),
            Value::from(json!({"title": "core", "lead": {"id": 7}}))
        );
        assert_eq!(
            c.render("application/vnd.example.team+json", &team, "summary").unwrap(),
            Value::from(json!({"title": "core", "links": {"lead": {"id": 7}}}))
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = Descriptor::from_yaml_str("types:\n  A: { type: string, bogus: 1 }\n").unwrap_err();
        assert!(matches!(err, SchemaError::Descriptor { .. }));
    }

    #[test]
    fn test_unknown_type_named() {
        let d = Descriptor::from_yaml_str("types:\n  A:\n    type: object\n    properties:\n      b: { type: Ghost }\n")
            .unwrap();
        let err = d.compile().unwrap_err();
        assert_eq!(err.to_string(), "A.b: unknown type \"Ghost\"");
    }

    #[test]
    fn test_cycles_rejected() {
        let d = Descriptor::from_yaml_str("types:\n  A: { type: B }\n  B: { type: A }\n").unwrap();
        let err = d.compile().unwrap_err();
        assert!(err.to_string().contains("refers to itself"), "{err}");
    }

    #[test]
    fn test_items_take_only_types() {
        let d = Descriptor::from_yaml_str(
            "types:\n  A: { type: array, items: { type: string, min_length: 2 } }\n",
        )
        .unwrap();
        assert!(d.compile().is_err());
    }

    #[test]
    fn test_json_descriptor() {
        let d = Descriptor::from_json_str(
            r#"{"media_types":[{"identifier":"text/x-note","attributes":{"body":{"type":"string"}},"views":{"default":{"attributes":["body"]}}}]}"#,
        )
        .unwrap();
        let c = d.compile().unwrap();
        assert_eq!(
            c.render_default("text/x-note", &Value::from(json!({"body": "hi"}))).unwrap(),
            Value::from(json!({"body": "hi"}))
        );
    }

    #[test]
    fn test_from_path_selects_format() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("schema.yaml");
        std::fs::write(&yaml, ACCOUNTS).unwrap();
        assert_eq!(Descriptor::from_path(&yaml).unwrap().types.len(), 2);

        let json_path = dir.path().join("schema.json");
        std::fs::write(&json_path, r#"{"types":{"N":{"type":"number"}}}"#).unwrap();
        assert_eq!(Descriptor::from_path(&json_path).unwrap().types.len(), 1);

        let err = Descriptor::from_path(dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read file"));
    }
}
