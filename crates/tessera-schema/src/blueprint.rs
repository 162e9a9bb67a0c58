//! # Blueprint Binder
//!
//! A [`Blueprint`] pairs an object schema with a native Rust record and a
//! precomputed table from dotted attribute paths to record field paths.
//!
//! ## Design
//!
//! The correspondence between schema properties and record fields is
//! declared in code through a [`RecordShape`]: each entry names the schema
//! property, the record field, and a pair of accessor functions. Nothing is
//! discovered by introspection.
//!
//! ```text
//! RecordShape<Bottle>
//!   ├── "name"   → Bottle.name        (String)
//!   ├── "year"   → Bottle.vintage     (i32, renamed)
//!   └── "owner"  → Bottle.owner       (RecordShape<Owner>)
//!                    └── "name" → Owner.name
//! ```
//!
//! Construction runs [`Object::can_bind`] against the shape's
//! [`NativeKind`]: every property must map to exactly one field and every
//! field to one property, recursively, with compatible kinds. A blueprint
//! that constructs is "compiled" and is then immutable.
//!
//! Loading runs the schema's `load`, then assigns the validated mapping
//! into a fresh `R::default()`. A coerced value the declared field cannot
//! hold is an internal inconsistency, distinct from an input error.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use tessera_core::{
    temporal, BindContext, BindError, FieldPath, Kind, LoadError, Mapping, NativeField,
    NativeKind, Value, Violation, ViolationKind,
};

use crate::error::BlueprintError;
use crate::object::Object;
use crate::types::Type;

// ─── Native values ───────────────────────────────────────────────────

/// Why a coerced value could not be stored in a native field.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// The value's kind is not what the field stores.
    Kind {
        /// What the field stores.
        expected: &'static str,
        /// What arrived.
        found: Kind,
    },
    /// The value has the right kind but does not fit the field's width.
    Range {
        /// Human-readable detail.
        detail: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Kind { expected, found } => write!(f, "field stores {expected}, got {found}"),
            Mismatch::Range { detail } => f.write_str(detail),
        }
    }
}

fn kind_mismatch(expected: &'static str, value: &Value) -> Mismatch {
    Mismatch::Kind {
        expected,
        found: value.kind(),
    }
}

/// A Rust type that can be stored in a blueprint field.
pub trait NativeValue: Sized {
    /// The storage kind used for binding checks.
    fn native_kind() -> NativeKind;

    /// Convert a coerced value into the native representation.
    fn from_value(value: &Value) -> Result<Self, Mismatch>;

    /// Convert the native representation back into a value.
    fn to_value(&self) -> Value;
}

impl NativeValue for bool {
    fn native_kind() -> NativeKind {
        NativeKind::Bool
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value.as_bool().ok_or_else(|| kind_mismatch("bool", value))
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! native_int {
    ($($t:ty),*) => {
        $(
            impl NativeValue for $t {
                fn native_kind() -> NativeKind {
                    NativeKind::Int
                }

                fn from_value(value: &Value) -> Result<Self, Mismatch> {
                    let n = value.as_i64().ok_or_else(|| kind_mismatch("int", value))?;
                    <$t>::try_from(n).map_err(|_| Mismatch::Range {
                        detail: format!("{n} does not fit in {}", stringify!($t)),
                    })
                }

                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

native_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl NativeValue for f64 {
    fn native_kind() -> NativeKind {
        NativeKind::Float
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value.as_f64().ok_or_else(|| kind_mismatch("float", value))
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl NativeValue for f32 {
    fn native_kind() -> NativeKind {
        NativeKind::Float
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        let n = value.as_f64().ok_or_else(|| kind_mismatch("float", value))?;
        if n.abs() > f64::from(f32::MAX) {
            return Err(Mismatch::Range {
                detail: format!("{n} does not fit in f32"),
            });
        }
        Ok(n as f32)
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl NativeValue for String {
    fn native_kind() -> NativeKind {
        NativeKind::String
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| kind_mismatch("string", value))
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl NativeValue for DateTime<Utc> {
    fn native_kind() -> NativeKind {
        NativeKind::DateTime
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        let text = value.as_str().ok_or_else(|| kind_mismatch("datetime", value))?;
        temporal::parse(text).map_err(|detail| Mismatch::Range { detail })
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl NativeValue for Value {
    fn native_kind() -> NativeKind {
        NativeKind::Dynamic
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        Ok(value.clone())
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: NativeValue> NativeValue for Option<T> {
    fn native_kind() -> NativeKind {
        NativeKind::Optional(Box::new(T::native_kind()))
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, T::to_value)
    }
}

impl<T: NativeValue> NativeValue for Vec<T> {
    fn native_kind() -> NativeKind {
        NativeKind::Sequence(Box::new(T::native_kind()))
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value
            .as_sequence()
            .ok_or_else(|| kind_mismatch("sequence", value))?
            .iter()
            .map(T::from_value)
            .collect()
    }

    fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(T::to_value).collect())
    }
}

impl<T: NativeValue> NativeValue for BTreeMap<String, T> {
    fn native_kind() -> NativeKind {
        NativeKind::Map(Box::new(T::native_kind()))
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value
            .as_mapping()
            .ok_or_else(|| kind_mismatch("map", value))?
            .iter()
            .map(|(k, v)| T::from_value(v).map(|t| (k.clone(), t)))
            .collect()
    }

    fn to_value(&self) -> Value {
        Value::Mapping(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }
}

impl<T: NativeValue> NativeValue for HashMap<String, T> {
    fn native_kind() -> NativeKind {
        NativeKind::Map(Box::new(T::native_kind()))
    }

    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value
            .as_mapping()
            .ok_or_else(|| kind_mismatch("map", value))?
            .iter()
            .map(|(k, v)| T::from_value(v).map(|t| (k.clone(), t)))
            .collect()
    }

    fn to_value(&self) -> Value {
        Value::Mapping(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }
}

// ─── Field accessors ─────────────────────────────────────────────────

/// One declared property ↔ field correspondence of a [`RecordShape`].
trait FieldAccess<R>: Send + Sync {
    /// The schema property name.
    fn name(&self) -> &str;

    /// The binding descriptor of this field.
    fn native_field(&self) -> NativeField;

    /// Store a coerced value into the record.
    fn assign(&self, record: &mut R, value: &Value, path: &FieldPath)
        -> Result<(), BlueprintError>;

    /// Read the field back as a value.
    fn read(&self, record: &R) -> Value;

    /// Record `attribute path → field path` entries for this field.
    fn paths(&self, attribute: &str, field: &str, out: &mut BTreeMap<String, String>);
}

struct ScalarField<R, T> {
    name: String,
    field: String,
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R, T: NativeValue> FieldAccess<R> for ScalarField<R, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn native_field(&self) -> NativeField {
        NativeField {
            name: self.name.clone(),
            field: self.field.clone(),
            kind: T::native_kind(),
        }
    }

    fn assign(
        &self,
        record: &mut R,
        value: &Value,
        path: &FieldPath,
    ) -> Result<(), BlueprintError> {
        *(self.get_mut)(record) = convert::<T>(value, path)?;
        Ok(())
    }

    fn read(&self, record: &R) -> Value {
        (self.get)(record).to_value()
    }

    fn paths(&self, attribute: &str, field: &str, out: &mut BTreeMap<String, String>) {
        out.insert(join(attribute, &self.name), join(field, &self.field));
    }
}

struct NestedField<R, S> {
    name: String,
    field: String,
    get: fn(&R) -> &S,
    get_mut: fn(&mut R) -> &mut S,
    shape: RecordShape<S>,
}

impl<R, S> FieldAccess<R> for NestedField<R, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn native_field(&self) -> NativeField {
        NativeField {
            name: self.name.clone(),
            field: self.field.clone(),
            kind: self.shape.native_kind(),
        }
    }

    fn assign(
        &self,
        record: &mut R,
        value: &Value,
        path: &FieldPath,
    ) -> Result<(), BlueprintError> {
        let map = value.as_mapping().ok_or_else(|| {
            inconsistent(path, kind_mismatch("record", value).to_string())
        })?;
        self.shape.assign_mapping((self.get_mut)(record), map, path)
    }

    fn read(&self, record: &R) -> Value {
        Value::Mapping(self.shape.read_all((self.get)(record)))
    }

    fn paths(&self, attribute: &str, field: &str, out: &mut BTreeMap<String, String>) {
        let attribute = join(attribute, &self.name);
        let field = join(field, &self.field);
        out.insert(attribute.clone(), field.clone());
        self.shape.collect_paths(&attribute, &field, out);
    }
}

struct OptionalNestedField<R, S> {
    name: String,
    field: String,
    get: fn(&R) -> &Option<S>,
    get_mut: fn(&mut R) -> &mut Option<S>,
    shape: RecordShape<S>,
}

impl<R, S: Default> FieldAccess<R> for OptionalNestedField<R, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn native_field(&self) -> NativeField {
        NativeField {
            name: self.name.clone(),
            field: self.field.clone(),
            kind: NativeKind::Optional(Box::new(self.shape.native_kind())),
        }
    }

    fn assign(
        &self,
        record: &mut R,
        value: &Value,
        path: &FieldPath,
    ) -> Result<(), BlueprintError> {
        if value.is_null() {
            *(self.get_mut)(record) = None;
            return Ok(());
        }
        let map = value.as_mapping().ok_or_else(|| {
            inconsistent(path, kind_mismatch("record", value).to_string())
        })?;
        let mut nested = S::default();
        self.shape.assign_mapping(&mut nested, map, path)?;
        *(self.get_mut)(record) = Some(nested);
        Ok(())
    }

    fn read(&self, record: &R) -> Value {
        match (self.get)(record) {
            Some(nested) => Value::Mapping(self.shape.read_all(nested)),
            None => Value::Null,
        }
    }

    fn paths(&self, attribute: &str, field: &str, out: &mut BTreeMap<String, String>) {
        let attribute = join(attribute, &self.name);
        let field = join(field, &self.field);
        out.insert(attribute.clone(), field.clone());
        self.shape.collect_paths(&attribute, &field, out);
    }
}

struct RecordsField<R, S> {
    name: String,
    field: String,
    get: fn(&R) -> &Vec<S>,
    get_mut: fn(&mut R) -> &mut Vec<S>,
    shape: RecordShape<S>,
}

impl<R, S: Default> FieldAccess<R> for RecordsField<R, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn native_field(&self) -> NativeField {
        NativeField {
            name: self.name.clone(),
            field: self.field.clone(),
            kind: NativeKind::Sequence(Box::new(self.shape.native_kind())),
        }
    }

    fn assign(
        &self,
        record: &mut R,
        value: &Value,
        path: &FieldPath,
    ) -> Result<(), BlueprintError> {
        let items = value.as_sequence().ok_or_else(|| {
            inconsistent(path, kind_mismatch("sequence", value).to_string())
        })?;
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let element_path = path.element(index);
            let map = item.as_mapping().ok_or_else(|| {
                inconsistent(&element_path, kind_mismatch("record", item).to_string())
            })?;
            let mut element = S::default();
            self.shape.assign_mapping(&mut element, map, &element_path)?;
            out.push(element);
        }
        *(self.get_mut)(record) = out;
        Ok(())
    }

    fn read(&self, record: &R) -> Value {
        Value::Sequence(
            (self.get)(record)
                .iter()
                .map(|element| Value::Mapping(self.shape.read_all(element)))
                .collect(),
        )
    }

    fn paths(&self, attribute: &str, field: &str, out: &mut BTreeMap<String, String>) {
        let attribute = join(attribute, &self.name);
        let field = join(field, &self.field);
        out.insert(attribute.clone(), field.clone());
        self.shape
            .collect_paths(&format!("{attribute}[]"), &format!("{field}[]"), out);
    }
}

fn convert<T: NativeValue>(value: &Value, path: &FieldPath) -> Result<T, BlueprintError> {
    T::from_value(value).map_err(|mismatch| match mismatch {
        Mismatch::Range { detail } => BlueprintError::Load(LoadError::single(Violation::at(
            path.clone(),
            ViolationKind::Coercion {
                expected: T::native_kind().to_string(),
                received: value.clone(),
                detail,
            },
        ))),
        kind @ Mismatch::Kind { .. } => inconsistent(path, kind.to_string()),
    })
}

fn inconsistent(path: &FieldPath, reason: String) -> BlueprintError {
    tracing::warn!(path = %path, reason = %reason, "blueprint assignment inconsistent with schema");
    BlueprintError::Inconsistent {
        path: path.to_string(),
        reason,
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

// ─── Record shapes ───────────────────────────────────────────────────

/// The declared field layout of a native record type `R`.
pub struct RecordShape<R> {
    name: String,
    fields: Vec<Box<dyn FieldAccess<R>>>,
}

impl<R: 'static> RecordShape<R> {
    /// An empty shape for the record named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a scalar or collection field whose schema name equals its
    /// field name.
    pub fn field<T>(self, name: &str, get: fn(&R) -> &T, get_mut: fn(&mut R) -> &mut T) -> Self
    where
        T: NativeValue + 'static,
    {
        self.field_as(name, name, get, get_mut)
    }

    /// Declare a field exposed under a different schema name.
    pub fn field_as<T>(
        mut self,
        name: &str,
        field: &str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self
    where
        T: NativeValue + 'static,
    {
        self.fields.push(Box::new(ScalarField {
            name: name.to_string(),
            field: field.to_string(),
            get,
            get_mut,
        }));
        self
    }

    /// Declare a nested record field.
    pub fn nested<S: 'static>(
        self,
        name: &str,
        get: fn(&R) -> &S,
        get_mut: fn(&mut R) -> &mut S,
        shape: RecordShape<S>,
    ) -> Self {
        self.nested_as(name, name, get, get_mut, shape)
    }

    /// Declare a nested record field exposed under a different schema name.
    pub fn nested_as<S: 'static>(
        mut self,
        name: &str,
        field: &str,
        get: fn(&R) -> &S,
        get_mut: fn(&mut R) -> &mut S,
        shape: RecordShape<S>,
    ) -> Self {
        self.fields.push(Box::new(NestedField {
            name: name.to_string(),
            field: field.to_string(),
            get,
            get_mut,
            shape,
        }));
        self
    }

    /// Declare a nested record field that may be absent. An omitted or
    /// null property leaves the field `None`.
    pub fn nested_optional<S: Default + 'static>(
        self,
        name: &str,
        get: fn(&R) -> &Option<S>,
        get_mut: fn(&mut R) -> &mut Option<S>,
        shape: RecordShape<S>,
    ) -> Self {
        self.nested_optional_as(name, name, get, get_mut, shape)
    }

    /// Declare an optional nested record field exposed under a different
    /// schema name.
    pub fn nested_optional_as<S: Default + 'static>(
        mut self,
        name: &str,
        field: &str,
        get: fn(&R) -> &Option<S>,
        get_mut: fn(&mut R) -> &mut Option<S>,
        shape: RecordShape<S>,
    ) -> Self {
        self.fields.push(Box::new(OptionalNestedField {
            name: name.to_string(),
            field: field.to_string(),
            get,
            get_mut,
            shape,
        }));
        self
    }

    /// Declare a field holding a sequence of nested records.
    pub fn records<S: Default + 'static>(
        self,
        name: &str,
        get: fn(&R) -> &Vec<S>,
        get_mut: fn(&mut R) -> &mut Vec<S>,
        shape: RecordShape<S>,
    ) -> Self {
        self.records_as(name, name, get, get_mut, shape)
    }

    /// Declare a sequence-of-records field exposed under a different
    /// schema name.
    pub fn records_as<S: Default + 'static>(
        mut self,
        name: &str,
        field: &str,
        get: fn(&R) -> &Vec<S>,
        get_mut: fn(&mut R) -> &mut Vec<S>,
        shape: RecordShape<S>,
    ) -> Self {
        self.fields.push(Box::new(RecordsField {
            name: name.to_string(),
            field: field.to_string(),
            get,
            get_mut,
            shape,
        }));
        self
    }
}

impl<R> RecordShape<R> {
    /// The record's name, used as the binding context root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The binding descriptor of the whole record.
    pub fn native_kind(&self) -> NativeKind {
        NativeKind::Record(self.fields.iter().map(|f| f.native_field()).collect())
    }

    /// Assign every present property of `map` into `record`.
    fn assign_mapping(
        &self,
        record: &mut R,
        map: &Mapping,
        path: &FieldPath,
    ) -> Result<(), BlueprintError> {
        for field in &self.fields {
            if let Some(value) = map.get(field.name()) {
                tracing::trace!(field = field.name(), "assigning field");
                field.assign(record, value, &path.child(field.name()))?;
            }
        }
        Ok(())
    }

    /// Read every field into a mapping keyed by schema name. Absent
    /// optional fields are omitted.
    fn read_all(&self, record: &R) -> Mapping {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), f.read(record)))
            .filter(|(_, v)| !v.is_null())
            .collect()
    }

    fn read_one(&self, record: &R, name: &str) -> Option<Value> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .map(|f| f.read(record))
            .filter(|v| !v.is_null())
    }

    fn collect_paths(&self, attribute: &str, field: &str, out: &mut BTreeMap<String, String>) {
        for f in &self.fields {
            f.paths(attribute, field, out);
        }
    }
}

impl<R> fmt::Debug for RecordShape<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordShape")
            .field("name", &self.name)
            .field("fields", &self.fields.iter().map(|x| x.name()).collect::<Vec<_>>())
            .finish()
    }
}

// ─── Blueprint ───────────────────────────────────────────────────────

/// A compiled pairing of an object schema with a native record type.
#[derive(Debug)]
pub struct Blueprint<R> {
    object: Arc<Object>,
    shape: RecordShape<R>,
    paths: BTreeMap<String, String>,
}

impl<R: Default + 'static> Blueprint<R> {
    /// Bind `object` to `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] when properties and fields do not correspond
    /// one-to-one, recursively, or when a field cannot hold its property.
    pub fn new(object: impl Into<Arc<Object>>, shape: RecordShape<R>) -> Result<Self, BindError> {
        let object = object.into();
        object.can_bind(&shape.native_kind(), &BindContext::new(shape.name()))?;
        let mut paths = BTreeMap::new();
        shape.collect_paths("", "", &mut paths);
        tracing::debug!(blueprint = shape.name(), fields = paths.len(), "blueprint compiled");
        Ok(Self {
            object,
            shape,
            paths,
        })
    }

    /// Load `raw` through the schema and populate a fresh record.
    pub fn load(&self, raw: &Value) -> Result<R, BlueprintError> {
        tracing::debug!(blueprint = self.name(), "loading record");
        let loaded = self.object.load(raw)?;
        let map = loaded.as_mapping().ok_or_else(|| {
            inconsistent(&FieldPath::root(), kind_mismatch("record", &loaded).to_string())
        })?;
        let mut record = R::default();
        self.shape.assign_mapping(&mut record, map, &FieldPath::root())?;
        Ok(record)
    }
}

impl<R> Blueprint<R> {
    /// The record's name.
    pub fn name(&self) -> &str {
        self.shape.name()
    }

    /// The bound object schema.
    pub fn object(&self) -> &Arc<Object> {
        &self.object
    }

    /// A type referring to this blueprint's schema, for use as an
    /// attribute type elsewhere.
    pub fn reference(&self) -> Type {
        Type::named(self.name(), Arc::clone(&self.object))
    }

    /// The record field path for a dotted attribute path.
    pub fn field_path(&self, attribute: &str) -> Option<&str> {
        self.paths.get(attribute).map(String::as_str)
    }

    /// Every `attribute path → field path` entry.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths.iter().map(|(a, f)| (a.as_str(), f.as_str()))
    }

    /// Read one top-level property from a record. `None` when the field
    /// holds nothing or the property is not declared.
    pub fn read(&self, record: &R, property: &str) -> Option<Value> {
        self.shape.read_one(record, property)
    }

    /// Read every property of a record into a mapping keyed by schema name.
    pub fn dump(&self, record: &R) -> Value {
        Value::Mapping(self.shape.read_all(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use serde_json::json;
    use tessera_core::{Classification, Primitive};

    #[derive(Debug, Default, PartialEq)]
    struct Owner {
        name: String,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Bottle {
        name: String,
        vintage: i32,
        rating: Option<f64>,
        tags: Vec<String>,
        owner: Owner,
    }

    fn owner_schema() -> Object {
        Object::new().attribute(
            "name",
            Attribute::of(Primitive::String).required().build().unwrap(),
        )
    }

    fn bottle_schema() -> Object {
        Object::new()
            .attribute("name", Attribute::of(Primitive::String).required().build().unwrap())
            .attribute(
                "year",
                Attribute::of(Primitive::Integer).minimum(1900.0).build().unwrap(),
            )
            .attribute("rating", Attribute::new(Primitive::Number))
            .attribute("tags", Attribute::new(Type::array_of(Primitive::String)))
            .attribute("owner", Attribute::new(owner_schema()))
    }

    fn owner_shape() -> RecordShape<Owner> {
        RecordShape::new("Owner").field("name", |o: &Owner| &o.name, |o: &mut Owner| &mut o.name)
    }

    fn bottle_shape() -> RecordShape<Bottle> {
        RecordShape::new("Bottle")
            .field("name", |b: &Bottle| &b.name, |b: &mut Bottle| &mut b.name)
            .field_as("year", "vintage", |b: &Bottle| &b.vintage, |b: &mut Bottle| &mut b.vintage)
            .field("rating", |b: &Bottle| &b.rating, |b: &mut Bottle| &mut b.rating)
            .field("tags", |b: &Bottle| &b.tags, |b: &mut Bottle| &mut b.tags)
            .nested("owner", |b: &Bottle| &b.owner, |b: &mut Bottle| &mut b.owner, owner_shape())
    }

    #[test]
    fn test_load_populates_record() {
        let bp = Blueprint::new(bottle_schema(), bottle_shape()).unwrap();
        let raw = Value::from(json!({
            "name": "Merlot",
            "year": "2015",
            "tags": ["red"],
            "owner": {"name": "Ada"}
        }));
        let bottle = bp.load(&raw).unwrap();
        assert_eq!(
            bottle,
            Bottle {
                name: "Merlot".into(),
                vintage: 2015,
                rating: None,
                tags: vec!["red".into()],
                owner: Owner { name: "Ada".into() },
            }
        );
    }

    #[test]
    fn test_paths_table() {
        let bp = Blueprint::new(bottle_schema(), bottle_shape()).unwrap();
        assert_eq!(bp.field_path("year"), Some("vintage"));
        assert_eq!(bp.field_path("owner.name"), Some("owner.name"));
        assert_eq!(bp.field_path("missing"), None);
    }

    #[test]
    fn test_input_errors_are_client_side() {
        let bp = Blueprint::new(bottle_schema(), bottle_shape()).unwrap();
        let err = bp.load(&Value::from(json!({"year": 1800}))).unwrap_err();
        assert_eq!(err.classify(), Classification::Client);
        assert!(err.to_string().contains("missing required: name"));
    }

    #[test]
    fn test_width_overflow_is_input_error() {
        #[derive(Debug, Default)]
        struct Small {
            n: u8,
        }
        let schema = Object::new().attribute("n", Attribute::new(Primitive::Integer));
        let bp = Blueprint::new(
            schema,
            RecordShape::new("Small").field("n", |s: &Small| &s.n, |s: &mut Small| &mut s.n),
        )
        .unwrap();
        assert_eq!(bp.load(&Value::from(json!({"n": 200}))).unwrap().n, 200);
        let err = bp.load(&Value::from(json!({"n": 300}))).unwrap_err();
        assert!(matches!(err, BlueprintError::Load(_)));
        assert!(err.to_string().contains("does not fit in u8"));
    }

    #[test]
    fn test_construction_rejects_unmapped_field() {
        let schema = bottle_schema();
        let shape = bottle_shape().field("name2", |b: &Bottle| &b.name, |b: &mut Bottle| &mut b.name);
        let err = Blueprint::new(schema, shape).unwrap_err();
        assert!(matches!(err, BindError::UnmappedField { .. }));
    }

    #[test]
    fn test_construction_rejects_kind_mismatch() {
        #[derive(Debug, Default)]
        struct Wrong {
            name: i64,
        }
        let schema = Object::new().attribute("name", Attribute::new(Primitive::String));
        let shape = RecordShape::new("Wrong").field("name", |w: &Wrong| &w.name, |w: &mut Wrong| &mut w.name);
        let err = Blueprint::new(schema, shape).unwrap_err();
        assert!(matches!(err, BindError::KindMismatch { .. }));
        assert!(err.to_string().starts_with("Wrong.name"));
    }

    #[test]
    fn test_records_field() {
        #[derive(Debug, Default)]
        struct Cellar {
            owners: Vec<Owner>,
        }
        let schema = Object::new().attribute("owners", Attribute::new(Type::array_of(owner_schema())));
        let shape = RecordShape::new("Cellar").records(
            "owners",
            |c: &Cellar| &c.owners,
            |c: &mut Cellar| &mut c.owners,
            owner_shape(),
        );
        let bp = Blueprint::new(schema, shape).unwrap();
        let cellar = bp
            .load(&Value::from(json!({"owners": [{"name": "a"}, {"name": "b"}]})))
            .unwrap();
        assert_eq!(cellar.owners.len(), 2);
        assert_eq!(cellar.owners[1].name, "b");
        assert_eq!(bp.field_path("owners[].name"), Some("owners[].name"));
        assert_eq!(bp.dump(&cellar), Value::from(json!({"owners": [{"name": "a"}, {"name": "b"}]})));
    }

    #[test]
    fn test_read_and_dump() {
        let bp = Blueprint::new(bottle_schema(), bottle_shape()).unwrap();
        let bottle = Bottle {
            name: "Syrah".into(),
            vintage: 2020,
            rating: None,
            tags: vec![],
            owner: Owner { name: "Lin".into() },
        };
        assert_eq!(bp.read(&bottle, "year"), Some(Value::Int(2020)));
        assert_eq!(bp.read(&bottle, "rating"), None);
        let dumped = bp.dump(&bottle);
        assert_eq!(dumped.get("owner"), Some(&Value::from(json!({"name": "Lin"}))));
        assert!(dumped.get("rating").is_none());
    }

    #[test]
    fn test_optional_nested_record_absent() {
        use crate::media::{MediaType, View};

        #[derive(Debug, Default, PartialEq)]
        struct Account {
            id: i64,
            owner: Option<Owner>,
        }

        let owner_media = Arc::new(
            MediaType::builder("application/vnd.example.owner+json")
                .attribute(
                    "name",
                    Attribute::of(Primitive::String).required().min_length(1).build().unwrap(),
                )
                .view(View::new("default").property("name"))
                .build()
                .unwrap(),
        );
        let account_media = MediaType::builder("application/vnd.example.account+json")
            .attribute("id", Attribute::of(Primitive::Integer).required().build().unwrap())
            .attribute("owner", Attribute::new(Type::media(owner_media)))
            .view(View::new("default").property("id").property("owner"))
            .build()
            .unwrap();
        let shape = RecordShape::new("Account")
            .field("id", |a: &Account| &a.id, |a: &mut Account| &mut a.id)
            .nested_optional(
                "owner",
                |a: &Account| &a.owner,
                |a: &mut Account| &mut a.owner,
                owner_shape(),
            );
        let bp = Blueprint::new(account_media.object().clone(), shape).unwrap();

        let account = bp.load(&Value::from(json!({"id": 1}))).unwrap();
        assert_eq!(account, Account { id: 1, owner: None });
        assert_eq!(bp.dump(&account), Value::from(json!({"id": 1})));
        assert_eq!(
            account_media.render_record(&bp, &account, "default").unwrap(),
            Value::from(json!({"id": 1}))
        );

        let account = bp
            .load(&Value::from(json!({"id": 2, "owner": {"name": "Ada"}})))
            .unwrap();
        assert_eq!(account.owner, Some(Owner { name: "Ada".into() }));
        assert_eq!(bp.field_path("owner.name"), Some("owner.name"));
        assert_eq!(
            account_media.render_record(&bp, &account, "default").unwrap(),
            Value::from(json!({"id": 2, "owner": {"name": "Ada"}}))
        );
    }

    #[test]
    fn test_wrong_kind_assignment_is_inconsistent() {
        let field = ScalarField::<Owner, String> {
            name: "name".into(),
            field: "name".into(),
            get: |o: &Owner| &o.name,
            get_mut: |o: &mut Owner| &mut o.name,
        };
        let mut owner = Owner::default();
        let err = field
            .assign(&mut owner, &Value::Int(7), &FieldPath::key("name"))
            .unwrap_err();
        assert!(matches!(err, BlueprintError::Inconsistent { ref path, .. } if path == "name"));
        assert_eq!(err.classify(), Classification::Server);

        let mut map = Mapping::new();
        map.insert("owner".to_string(), Value::from("not a record"));
        let err = bottle_shape()
            .assign_mapping(&mut Bottle::default(), &map, &FieldPath::root())
            .unwrap_err();
        assert!(matches!(err, BlueprintError::Inconsistent { ref path, .. } if path == "owner"));
        assert_eq!(err.classify(), Classification::Server);
    }

    #[test]
    fn test_records_field_alias() {
        #[derive(Debug, Default)]
        struct Cellar {
            keepers: Vec<Owner>,
        }
        let schema = Object::new().attribute("owners", Attribute::new(Type::array_of(owner_schema())));
        let shape = RecordShape::new("Cellar").records_as(
            "owners",
            "keepers",
            |c: &Cellar| &c.keepers,
            |c: &mut Cellar| &mut c.keepers,
            owner_shape(),
        );
        let bp = Blueprint::new(schema, shape).unwrap();
        let cellar = bp.load(&Value::from(json!({"owners": [{"name": "a"}]}))).unwrap();
        assert_eq!(cellar.keepers, vec![Owner { name: "a".into() }]);
        assert_eq!(bp.field_path("owners"), Some("keepers"));
        assert_eq!(bp.field_path("owners[].name"), Some("keepers[].name"));
    }

    #[test]
    fn test_reference_type_loads_like_schema() {
        let bp = Blueprint::new(owner_schema(), owner_shape()).unwrap();
        let ty = bp.reference();
        assert_eq!(ty.name(), "Owner");
        assert!(ty.load(&Value::from(json!({}))).is_err());
    }
}
