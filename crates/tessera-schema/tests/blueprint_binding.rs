//! # Blueprint Binding Tests
//!
//! A descriptor-compiled schema bound to native records: construction
//! checks, loading into records, and rendering records back through views.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use tessera_core::{BindError, Classification};
use tessera_schema::{Blueprint, BlueprintError, Descriptor, RecordShape, Value};

const DESCRIPTOR: &str = r#"
types:
  Bottle:
    type: object
    properties:
      id:        { type: integer, required: true, minimum: 1 }
      name:      { type: string, required: true, max_length: 32 }
      vintage:   { type: integer }
      bottled:   { type: datetime }
      labels:    { type: map, values: { type: string } }
media_types:
  - identifier: application/vnd.example.bottle+json
    name: Bottle
    views:
      default: { attributes: [id, name, vintage, bottled] }
      link:    { attributes: [id] }
"#;

#[derive(Debug, Default, PartialEq)]
struct Bottle {
    id: u32,
    name: String,
    year: Option<i32>,
    bottled: Option<DateTime<Utc>>,
    labels: std::collections::BTreeMap<String, String>,
}

fn shape() -> RecordShape<Bottle> {
    RecordShape::new("Bottle")
        .field("id", |b: &Bottle| &b.id, |b: &mut Bottle| &mut b.id)
        .field("name", |b: &Bottle| &b.name, |b: &mut Bottle| &mut b.name)
        .field_as("vintage", "year", |b: &Bottle| &b.year, |b: &mut Bottle| &mut b.year)
        .field("bottled", |b: &Bottle| &b.bottled, |b: &mut Bottle| &mut b.bottled)
        .field("labels", |b: &Bottle| &b.labels, |b: &mut Bottle| &mut b.labels)
}

fn blueprint() -> (tessera_schema::Catalog, Blueprint<Bottle>) {
    let catalog = Descriptor::from_yaml_str(DESCRIPTOR).unwrap().compile().unwrap();
    let object = catalog.type_of("Bottle").unwrap().object().unwrap().clone();
    let blueprint = Blueprint::new(Arc::new(object), shape()).unwrap();
    (catalog, blueprint)
}

#[test]
fn loads_raw_input_into_record() {
    let (_, bp) = blueprint();
    let bottle = bp
        .load(&Value::from(json!({
            "id": "3",
            "name": "Cabernet",
            "vintage": 2019.0,
            "bottled": "2021-06-01T00:00:00Z",
            "labels": {"region": "Napa"}
        })))
        .unwrap();
    assert_eq!(bottle.id, 3);
    assert_eq!(bottle.year, Some(2019));
    assert_eq!(bottle.bottled, Some(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()));
    assert_eq!(bottle.labels.get("region").map(String::as_str), Some("Napa"));
    assert_eq!(bp.field_path("vintage"), Some("year"));
}

#[test]
fn input_errors_are_reported_together() {
    let (_, bp) = blueprint();
    let err = bp
        .load(&Value::from(json!({"id": 0, "vintage": "old", "color": "red"})))
        .unwrap_err();
    assert_eq!(err.classify(), Classification::Client);
    let BlueprintError::Load(load) = err else {
        panic!("expected a load error");
    };
    let paths: Vec<String> = load.violations().iter().map(|v| v.path.to_string()).collect();
    assert_eq!(paths, vec!["id", "name", "vintage", "color"]);
}

#[test]
fn renders_records_through_views() {
    let (catalog, bp) = blueprint();
    let media = catalog.media_type("application/vnd.example.bottle+json").unwrap();
    let bottle = Bottle {
        id: 9,
        name: "Rioja".into(),
        year: None,
        bottled: None,
        labels: Default::default(),
    };
    assert_eq!(
        media.render_record(&bp, &bottle, "default").unwrap(),
        Value::from(json!({"id": 9, "name": "Rioja"}))
    );
    assert_eq!(
        media.render_record(&bp, &bottle, "link").unwrap(),
        Value::from(json!({"id": 9}))
    );
    assert!(media.render_record(&bp, &bottle, "full").is_err());
}

#[test]
fn construction_requires_a_bijection() {
    let catalog = Descriptor::from_yaml_str(DESCRIPTOR).unwrap().compile().unwrap();
    let object = catalog.type_of("Bottle").unwrap().object().unwrap().clone();

    let missing_labels = RecordShape::new("Bottle")
        .field("id", |b: &Bottle| &b.id, |b: &mut Bottle| &mut b.id)
        .field("name", |b: &Bottle| &b.name, |b: &mut Bottle| &mut b.name)
        .field_as("vintage", "year", |b: &Bottle| &b.year, |b: &mut Bottle| &mut b.year)
        .field("bottled", |b: &Bottle| &b.bottled, |b: &mut Bottle| &mut b.bottled);
    let err = Blueprint::new(Arc::new(object.clone()), missing_labels).unwrap_err();
    assert!(matches!(err, BindError::MissingField { ref property, .. } if property == "labels"));
    assert_eq!(err.classify(), Classification::Server);

    let doubled = shape().field("id", |b: &Bottle| &b.id, |b: &mut Bottle| &mut b.id);
    let err = Blueprint::new(Arc::new(object), doubled).unwrap_err();
    assert!(matches!(err, BindError::DuplicateField { .. }));
}
