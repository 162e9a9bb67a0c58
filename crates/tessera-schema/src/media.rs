//! # Media Types and the View Renderer
//!
//! A [`MediaType`] is an object schema with an [`Identifier`] and a set of
//! named [`View`]s. Rendering projects a record or mapping through one
//! view, backfills defaults, and re-validates the projection with the same
//! rule machinery used on input. Badly shaped server data is a bug.
//!
//! ## Rendering
//!
//! ```text
//! render(value, view)
//!   ├── unknown view               → RenderError::ViewNotFound (nothing rendered)
//!   ├── collection + sequence      → render each element through `view`
//!   ├── mapping / record           → project the view's properties
//!   │     ├── media-typed property → render it through its nested view
//!   │     └── absent + default     → backfill the default
//!   ├── re-validate projection     → RenderError::Invalid
//!   └── links                      → out["links"][name] = render(target, link.view)
//! ```
//!
//! Every media type must declare the `default` view. Views and links are
//! checked against the schema when the media type is built, so rendering
//! never meets an undeclared property.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tessera_core::{
    BindContext, BindError, FieldPath, LoadError, Mapping, NativeKind, Value, Violation,
    ViolationKind, Violations,
};

use crate::attribute::Attribute;
use crate::blueprint::Blueprint;
use crate::collection;
use crate::error::{RenderError, SchemaError};
use crate::object::Object;
use crate::types::{Reference, Type};

/// The view used when a caller does not name one.
pub const DEFAULT_VIEW: &str = "default";

/// The view links render through unless they name another.
pub const LINK_VIEW: &str = "link";

/// Output key reserved for rendered links.
pub const LINKS_KEY: &str = "links";

const COLLECTION_PARAM: &str = "type=collection";

// ─── Identifier ──────────────────────────────────────────────────────

/// A validated, lower-cased media type identifier:
/// `type/subtype[+suffix][; param=value]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Parse and normalize an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidIdentifier`] when the text is not of the
    /// form `type/subtype` optionally followed by `; key=value` parameters.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidIdentifier {
            identifier: text.to_string(),
            reason: reason.to_string(),
        };
        let lowered = text.trim().to_ascii_lowercase();
        let mut parts = lowered.split(';').map(str::trim);
        let range = parts.next().unwrap_or_default();
        let (top, sub) = range
            .split_once('/')
            .ok_or_else(|| invalid("expected type/subtype"))?;
        if !is_token(top) || !is_token(sub) {
            return Err(invalid("type and subtype must be non-empty tokens"));
        }

        let mut normalized = format!("{top}/{sub}");
        for param in parts {
            let (key, value) = param
                .split_once('=')
                .ok_or_else(|| invalid("parameters must be key=value"))?;
            let (key, value) = (key.trim(), value.trim());
            if !is_token(key) || value.is_empty() {
                return Err(invalid("parameters must be key=value"));
            }
            normalized.push_str(&format!("; {key}={value}"));
        }
        Ok(Self(normalized))
    }

    /// The normalized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `type/subtype` part, without parameters.
    pub fn base(&self) -> &str {
        self.0.split(';').next().unwrap_or_default()
    }

    /// The identifier of a collection of this media type.
    pub fn collection(&self) -> Identifier {
        Identifier(format!("{}; {COLLECTION_PARAM}", self.0))
    }

    /// Whether this identifies a collection.
    pub fn is_collection(&self) -> bool {
        self.0.split(';').skip(1).any(|p| p.trim() == COLLECTION_PARAM)
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$&^_.+-".contains(c))
}

impl FromStr for Identifier {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Views and links ─────────────────────────────────────────────────

/// One property listed by a view.
#[derive(Debug, Clone)]
pub struct ViewProperty {
    name: String,
    attribute: Option<Attribute>,
    view: Option<String>,
}

impl ViewProperty {
    /// List property `name` as declared on the media type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: None,
            view: None,
        }
    }

    /// Replace the property's attribute for this view only.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = Some(attribute);
        self
    }

    /// Render a media-typed property through `view`.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A shallow reference to another media type.
#[derive(Debug, Clone)]
pub struct Link {
    name: String,
    attribute: String,
    view: String,
}

impl Link {
    /// A link named after the property it renders, through the `link` view.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            attribute: name.clone(),
            name,
            view: LINK_VIEW.to_string(),
        }
    }

    /// Render a differently-named property.
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Render the target through `view`.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = view.into();
        self
    }

    /// The link name (its key under `links`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property it renders.
    pub fn target(&self) -> &str {
        &self.attribute
    }

    /// The view the target renders through.
    pub fn target_view(&self) -> &str {
        &self.view
    }
}

/// A named projection of a media type.
#[derive(Debug, Clone)]
pub struct View {
    name: String,
    properties: Vec<ViewProperty>,
    links: Vec<Link>,
}

impl View {
    /// An empty view.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            links: Vec::new(),
        }
    }

    /// List a property as declared.
    pub fn property(self, name: impl Into<String>) -> Self {
        self.property_with(ViewProperty::new(name))
    }

    /// List a property with per-view overrides.
    pub fn property_with(mut self, property: ViewProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a link.
    pub fn link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// The view name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Listed properties, in declaration order.
    pub fn properties(&self) -> &[ViewProperty] {
        &self.properties
    }

    /// Declared links.
    pub fn links(&self) -> &[Link] {
        &self.links
    }
}

// ─── Media type ──────────────────────────────────────────────────────

/// An output schema with an identifier and named views.
#[derive(Debug)]
pub struct MediaType {
    identifier: Identifier,
    description: Option<String>,
    object: Arc<Object>,
    views: BTreeMap<String, View>,
    element: Option<Arc<MediaType>>,
}

impl MediaType {
    /// Start building a media type.
    pub fn builder(identifier: impl Into<String>) -> MediaTypeBuilder {
        MediaTypeBuilder {
            identifier: identifier.into(),
            description: None,
            object: Object::new(),
            views: Vec::new(),
        }
    }

    /// A collection of `element`, identified as `<element>; type=collection`.
    /// It shares the element's views and links.
    pub fn collection(element: Arc<MediaType>) -> MediaType {
        MediaType {
            identifier: element.identifier.collection(),
            description: element.description.clone(),
            object: Arc::clone(&element.object),
            views: BTreeMap::new(),
            element: Some(element),
        }
    }

    /// The identifier.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The object schema (the element's, for collections).
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Whether this is a collection media type.
    pub fn is_collection(&self) -> bool {
        self.element.is_some()
    }

    /// The element media type of a collection.
    pub fn element(&self) -> Option<&Arc<MediaType>> {
        self.element.as_ref()
    }

    /// Look up a view.
    pub fn view(&self, name: &str) -> Option<&View> {
        match &self.element {
            Some(element) => element.view(name),
            None => self.views.get(name),
        }
    }

    /// Declared view names.
    pub fn view_names(&self) -> Vec<&str> {
        match &self.element {
            Some(element) => element.view_names(),
            None => self.views.keys().map(String::as_str).collect(),
        }
    }

    /// Coerce and validate `raw`: a mapping, or a sequence of mappings for
    /// collections.
    pub fn load(&self, raw: &Value) -> Result<Value, LoadError> {
        match &self.element {
            Some(element) => collection::load_array(&Type::media(Arc::clone(element)), raw),
            None => self.object.load(raw),
        }
    }

    /// Check binding compatibility with a native field.
    pub fn can_bind(&self, native: &NativeKind, ctx: &BindContext) -> Result<(), BindError> {
        match (&self.element, native.unwrap_optional()) {
            (None, _) => self.object.can_bind(native, ctx),
            (Some(_), NativeKind::Dynamic) => Ok(()),
            (Some(element), NativeKind::Sequence(inner)) => element.can_bind(inner, &ctx.element()),
            (Some(_), other) => Err(BindError::KindMismatch {
                context: ctx.to_string(),
                expected: self.identifier.to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// Render a mapping (or, for collections, a sequence of mappings)
    /// through the named view.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the view is not declared, the value is
    /// not renderable, or the projection violates the schema.
    pub fn render(&self, value: &Value, view: &str) -> Result<Value, RenderError> {
        let selected = self.require_view(view)?;
        tracing::debug!(media = %self.identifier, view, "rendering");
        match (&self.element, value) {
            (Some(element), Value::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    element.render(item, view).map_err(|e| RenderError::Element {
                        index,
                        source: Box::new(e),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            (_, Value::Mapping(map)) => self.project(selected, |name| map.get(name).cloned()),
            (_, other) => Err(RenderError::NotRenderable {
                media: self.identifier.to_string(),
                found: other.kind(),
            }),
        }
    }

    /// Render a native record bound by `blueprint`, reading only the
    /// fields the view lists.
    pub fn render_record<R>(
        &self,
        blueprint: &Blueprint<R>,
        record: &R,
        view: &str,
    ) -> Result<Value, RenderError> {
        let selected = self.require_view(view)?;
        tracing::debug!(media = %self.identifier, view, record = blueprint.name(), "rendering record");
        self.project(selected, |name| blueprint.read(record, name))
    }

    /// Render a sequence of native records, element by element.
    pub fn render_records<R>(
        &self,
        blueprint: &Blueprint<R>,
        records: &[R],
        view: &str,
    ) -> Result<Value, RenderError> {
        self.require_view(view)?;
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                self.render_record(blueprint, record, view)
                    .map_err(|e| RenderError::Element {
                        index,
                        source: Box::new(e),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence)
    }

    fn require_view(&self, view: &str) -> Result<&View, RenderError> {
        self.view(view).ok_or_else(|| RenderError::ViewNotFound {
            media: self.identifier.to_string(),
            view: view.to_string(),
        })
    }

    fn effective<'a>(&'a self, property: &'a ViewProperty) -> Option<&'a Attribute> {
        property
            .attribute
            .as_ref()
            .or_else(|| self.object.get(&property.name))
    }

    fn project<F>(&self, view: &View, lookup: F) -> Result<Value, RenderError>
    where
        F: Fn(&str) -> Option<Value>,
    {
        let mut out = Mapping::new();
        let mut violations = Violations::default();

        for property in &view.properties {
            let Some(attribute) = self.effective(property) else {
                continue;
            };
            match lookup(&property.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let nested_view = property
                        .view
                        .as_deref()
                        .or(attribute.view())
                        .unwrap_or(DEFAULT_VIEW);
                    let rendered = render_nested(attribute.ty(), &value, nested_view).map_err(
                        |e| RenderError::Nested {
                            property: property.name.clone(),
                            source: Box::new(e),
                        },
                    )?;
                    for rule in attribute.rules().check(&rendered) {
                        violations.push(Violation::at(
                            FieldPath::key(&property.name),
                            ViolationKind::Rule(rule),
                        ));
                    }
                    out.insert(property.name.clone(), rendered);
                }
                None => match attribute.default_value() {
                    Some(default) => {
                        out.insert(property.name.clone(), default.clone());
                    }
                    None if attribute.is_required() => violations.push(Violation::at(
                        FieldPath::key(&property.name),
                        ViolationKind::Missing,
                    )),
                    None => {}
                },
            }
        }

        if let Err(source) = violations.into_result() {
            tracing::warn!(media = %self.identifier, view = %view.name, error = %source, "rendered output is invalid");
            return Err(RenderError::Invalid {
                media: self.identifier.to_string(),
                view: view.name.clone(),
                source,
            });
        }

        if !view.links.is_empty() {
            let mut links = Mapping::new();
            for link in &view.links {
                let Some(attribute) = self.object.get(&link.attribute) else {
                    continue;
                };
                if let Some(value) = lookup(&link.attribute).filter(|v| !v.is_null()) {
                    let rendered = render_nested(attribute.ty(), &value, &link.view).map_err(
                        |e| RenderError::Nested {
                            property: format!("{LINKS_KEY}.{}", link.name),
                            source: Box::new(e),
                        },
                    )?;
                    links.insert(link.name.clone(), rendered);
                }
            }
            out.insert(LINKS_KEY.to_string(), Value::Mapping(links));
        }

        Ok(Value::Mapping(out))
    }
}

/// Render a property value according to its type: media types through
/// `view`, arrays of media types element by element, anything else as-is.
fn render_nested(ty: &Type, value: &Value, view: &str) -> Result<Value, RenderError> {
    match (ty, value) {
        (Type::Reference(Reference::Media(media)), _) => media.render(value, view),
        (Type::Array(element), Value::Sequence(items)) if target_media(ty).is_some() => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                render_nested(element, item, view).map_err(|e| RenderError::Element {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        (Type::Map(inner), Value::Mapping(entries)) if target_media(ty).is_some() => entries
            .iter()
            .map(|(key, item)| {
                render_nested(inner, item, view)
                    .map(|rendered| (key.clone(), rendered))
                    .map_err(|e| RenderError::Nested {
                        property: key.clone(),
                        source: Box::new(e),
                    })
            })
            .collect::<Result<Mapping, _>>()
            .map(Value::Mapping),
        _ => Ok(value.clone()),
    }
}

/// The media type a property renders through, looking inside arrays and
/// maps.
fn target_media(ty: &Type) -> Option<&Arc<MediaType>> {
    match ty {
        Type::Reference(Reference::Media(media)) => Some(media),
        Type::Array(element) | Type::Map(element) => target_media(element),
        _ => None,
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Builder for [`MediaType`].
#[derive(Debug)]
pub struct MediaTypeBuilder {
    identifier: String,
    description: Option<String>,
    object: Object,
    views: Vec<View>,
}

impl MediaTypeBuilder {
    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Use `object` as the schema.
    pub fn object(mut self, object: Object) -> Self {
        self.object = object;
        self
    }

    /// Add one property to the schema.
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.object.insert(name, attribute);
        self
    }

    /// Declare a view.
    pub fn view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    /// Compile the media type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the identifier is malformed, the
    /// `default` view is missing, a view is declared twice, a view lists an
    /// undeclared property, a nested view does not exist on its target, or
    /// a link is unusable.
    pub fn build(self) -> Result<MediaType, SchemaError> {
        let identifier = Identifier::parse(&self.identifier)?;
        let media = identifier.to_string();

        for (name, attribute) in self.object.attributes() {
            if let Some(view) = attribute.view() {
                check_nested_view(&media, DEFAULT_VIEW, attribute.ty(), view)
                    .map_err(|e| e.at(name))?;
            }
        }

        let mut views = BTreeMap::new();
        for view in self.views {
            check_view(&media, &self.object, &view)?;
            let name = view.name.clone();
            if views.insert(name.clone(), view).is_some() {
                return Err(SchemaError::Duplicate(format!("view {name:?} of {media}")));
            }
        }
        if !views.contains_key(DEFAULT_VIEW) {
            return Err(SchemaError::MissingDefaultView { media });
        }

        tracing::debug!(media = %identifier, views = views.len(), "media type compiled");
        Ok(MediaType {
            identifier,
            description: self.description,
            object: Arc::new(self.object),
            views,
            element: None,
        })
    }
}

fn check_view(media: &str, object: &Object, view: &View) -> Result<(), SchemaError> {
    let mut seen = BTreeSet::new();
    for property in &view.properties {
        let declared = object
            .get(&property.name)
            .ok_or_else(|| SchemaError::UnknownProperty {
                media: media.to_string(),
                view: view.name.clone(),
                property: property.name.clone(),
            })?;
        if !seen.insert(property.name.as_str()) {
            return Err(SchemaError::Duplicate(format!(
                "property {:?} in view {:?} of {media}",
                property.name, view.name
            )));
        }
        let attribute = property.attribute.as_ref().unwrap_or(declared);
        if let Some(nested) = property.view.as_deref().or(attribute.view()) {
            check_nested_view(media, &view.name, attribute.ty(), nested)
                .map_err(|e| e.at(property.name.as_str()))?;
        }
    }

    let mut names = BTreeSet::new();
    for link in &view.links {
        let invalid = |reason: String| SchemaError::InvalidLink {
            media: media.to_string(),
            view: view.name.clone(),
            link: link.name.clone(),
            reason,
        };
        if !names.insert(link.name.as_str()) {
            return Err(invalid("declared twice".to_string()));
        }
        let attribute = object
            .get(&link.attribute)
            .ok_or_else(|| invalid(format!("undeclared property {:?}", link.attribute)))?;
        let target = target_media(attribute.ty())
            .ok_or_else(|| invalid(format!("property {:?} is not a media type", link.attribute)))?;
        if target.view(&link.view).is_none() {
            return Err(invalid(format!(
                "{} has no view named {:?}",
                target.identifier(),
                link.view
            )));
        }
    }
    if !view.links.is_empty() && seen.contains(LINKS_KEY) {
        return Err(SchemaError::InvalidLink {
            media: media.to_string(),
            view: view.name.clone(),
            link: LINKS_KEY.to_string(),
            reason: format!("property {LINKS_KEY:?} collides with the rendered links"),
        });
    }
    Ok(())
}

fn check_nested_view(media: &str, view: &str, ty: &Type, nested: &str) -> Result<(), SchemaError> {
    let target = target_media(ty).ok_or_else(|| SchemaError::UnknownView {
        media: media.to_string(),
        view: format!("{view} (nested view {nested:?} on a non-media property)"),
    })?;
    if target.view(nested).is_none() {
        return Err(SchemaError::UnknownView {
            media: target.identifier().to_string(),
            view: nested.to_string(),
        });
    }
    Ok(())
}
