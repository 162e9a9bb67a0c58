//! # Load and Render Contract Tests
//!
//! Exercises the public surface end to end: attribute and object loading,
//! array order, idempotence of re-loading coerced output, default backfill
//! on render, and view lookup failures.
//!
//! The three concrete scenarios are the behavioral contract transport
//! layers rely on:
//!
//! - **A**: `integer` with `minimum: 1`.
//! - **B**: object with a required, length-bounded `title`.
//! - **C**: array of integers.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use tessera_core::{Classification, ViolationKind};
use tessera_schema::{
    Attribute, Catalog, MediaType, Object, Primitive, RenderError, Type, Value, View,
};

fn raw(v: serde_json::Value) -> Value {
    Value::from(v)
}

// ─── Scenario A ──────────────────────────────────────────────────────

#[test]
fn scenario_a_integer_with_minimum() {
    let attr = Attribute::of(Primitive::Integer).minimum(1.0).build().unwrap();

    let err = attr.load(&Value::Int(0)).unwrap_err();
    assert!(err.to_string().contains("minimum"), "{err}");

    assert_eq!(attr.load(&Value::from("5")).unwrap(), Value::Int(5));

    let err = attr.load(&Value::Float(5.7)).unwrap_err();
    assert!(matches!(
        err.first().unwrap().kind,
        ViolationKind::Coercion { ref expected, .. } if expected == "integer"
    ));
}

// ─── Scenario B ──────────────────────────────────────────────────────

fn scenario_b() -> Object {
    Object::new().attribute(
        "title",
        Attribute::of(Primitive::String)
            .required()
            .max_length(10)
            .build()
            .unwrap(),
    )
}

#[test]
fn scenario_b_required_bounded_title() {
    let object = scenario_b();

    let err = object.load(&raw(json!({}))).unwrap_err();
    assert_eq!(err.to_string(), "missing required: title");

    let err = object
        .load(&raw(json!({"title": "a very long title"})))
        .unwrap_err();
    assert!(err.to_string().contains("maximum length"), "{err}");

    assert_eq!(
        object.load(&raw(json!({"title": "ok"}))).unwrap(),
        raw(json!({"title": "ok"}))
    );
}

// ─── Scenario C ──────────────────────────────────────────────────────

#[test]
fn scenario_c_array_of_integers() {
    let ty = Type::array_of(Primitive::Integer);

    let err = ty.load(&raw(json!(["1", "2", "x"]))).unwrap_err();
    let first = err.first().unwrap();
    assert!(first.path.contains_index(2));
    assert!(err.to_string().starts_with("[2]:"), "{err}");

    assert_eq!(ty.load(&raw(json!(["1", "2", "3"]))).unwrap(), raw(json!([1, 2, 3])));
}

// ─── Properties ──────────────────────────────────────────────────────

#[test]
fn required_attributes_are_named_when_absent() {
    let object = Object::new()
        .attribute("a", Attribute::of(Primitive::String).required().build().unwrap())
        .attribute("b", Attribute::of(Primitive::Integer).required().build().unwrap());
    let err = object.load(&raw(json!({}))).unwrap_err();
    assert_eq!(err.to_string(), "missing required: a\nmissing required: b");
    assert_eq!(err.classify(), Classification::Client);
}

#[test]
fn enum_members_load_unchanged() {
    let attr = Attribute::of(Primitive::String)
        .allowed(["red", "green"])
        .build()
        .unwrap();
    assert_eq!(attr.load(&Value::from("green")).unwrap(), Value::from("green"));
    assert!(attr.load(&Value::from("blue")).is_err());
}

#[test]
fn nested_errors_carry_full_paths() {
    let line = Object::new().attribute(
        "qty",
        Attribute::of(Primitive::Integer).minimum(1.0).build().unwrap(),
    );
    let order = Object::new().attribute("lines", Attribute::new(Type::array_of(line)));
    let err = order
        .load(&raw(json!({"lines": [{"qty": 2}, {"qty": 0}]})))
        .unwrap_err();
    assert_eq!(err.first().unwrap().path.to_string(), "lines[1].qty");
}

#[test]
fn render_backfills_defaults() {
    let media = MediaType::builder("application/vnd.example.widget+json")
        .attribute("id", Attribute::of(Primitive::Integer).required().build().unwrap())
        .attribute(
            "size",
            Attribute::of(Primitive::String).default_value("medium").build().unwrap(),
        )
        .view(View::new("default").property("id").property("size"))
        .build()
        .unwrap();
    assert_eq!(
        media.render(&raw(json!({"id": 1})), "default").unwrap(),
        raw(json!({"id": 1, "size": "medium"}))
    );
}

#[test]
fn unknown_view_never_renders() {
    let media = Arc::new(
        MediaType::builder("application/vnd.example.widget+json")
            .attribute("id", Attribute::new(Primitive::Integer))
            .view(View::new("default").property("id"))
            .build()
            .unwrap(),
    );
    let catalog = Catalog::builder()
        .add_media_type(Arc::clone(&media))
        .unwrap()
        .build();
    let err = media.render(&raw(json!({"id": 1})), "nonexistent").unwrap_err();
    assert!(matches!(err, RenderError::ViewNotFound { .. }));
    let err = catalog
        .render("application/vnd.example.widget+json", &raw(json!({"id": 1})), "nonexistent")
        .unwrap_err();
    assert_eq!(err.classify(), Classification::Server);
}

// ─── Property tests ──────────────────────────────────────────────────

fn int_repr() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<i32>().prop_map(|n| Value::from(n.to_string())),
        any::<u32>().prop_map(Value::from),
        (-1_000_000i64..1_000_000).prop_map(|n| Value::Float(n as f64)),
    ]
}

proptest! {
    #[test]
    fn array_load_preserves_order(items in proptest::collection::vec(int_repr(), 0..20)) {
        let ty = Type::array_of(Primitive::Integer);
        let loaded = ty.load(&Value::Sequence(items.clone())).unwrap();
        let expected: Vec<Value> = items
            .iter()
            .map(|item| Type::from(Primitive::Integer).load(item).unwrap())
            .collect();
        prop_assert_eq!(loaded, Value::Sequence(expected));
    }

    #[test]
    fn reloading_coerced_output_is_idempotent(
        id in int_repr(),
        name in "[a-z]{1,12}",
        score in proptest::option::of(0.0f64..100.0),
    ) {
        let object = Object::new()
            .attribute("id", Attribute::of(Primitive::Integer).required().build().unwrap())
            .attribute("name", Attribute::of(Primitive::String).max_length(12).build().unwrap())
            .attribute(
                "score",
                Attribute::of(Primitive::Number).minimum(0.0).maximum(100.0).default_value(50).build().unwrap(),
            );
        let mut input = tessera_core::Mapping::new();
        input.insert("id".to_string(), id);
        input.insert("name".to_string(), Value::from(name));
        if let Some(score) = score {
            input.insert("score".to_string(), Value::Float(score));
        }
        let once = object.load(&Value::Mapping(input)).unwrap();
        let twice = object.load(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn fractional_floats_never_load_as_integers(whole in -1_000_000i64..1_000_000, frac in 0.01f64..0.99) {
        let attr = Attribute::new(Primitive::Integer);
        prop_assert!(attr.load(&Value::Float(whole as f64 + frac)).is_err());
    }
}
