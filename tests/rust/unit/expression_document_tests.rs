use pathquery::expression::factory::{
    all_conditions_apply, property_between_values_inclusive, property_has_string_starting_with,
    property_has_value,
};
use pathquery::expression::{Condition, Expression};
use pathquery::property_path::PropertyPath;
use pathquery::value::Value;

fn path(dotted: &str) -> PropertyPath {
    PropertyPath::parse(dotted).unwrap()
}

#[test]
fn test_condition_document_matches_factory() {
    let document = r#"
type: all_true
children:
  - type: between
    min: { type: constant, value: 1800 }
    max: { type: constant, value: 1900 }
    target: { type: property, path: birth.year }
  - type: all_equal
    children:
      - { type: property, path: name }
      - { type: constant, value: King }
"#;
    let parsed: Condition = serde_yaml::from_str(document).unwrap();
    let built = all_conditions_apply(vec![
        property_between_values_inclusive(1800, 1900, path("birth.year")),
        property_has_value("King", path("name")),
    ]);
    assert_eq!(parsed, built);
}

#[test]
fn test_case_sensitivity_defaults_to_sensitive() {
    let parsed: Condition = serde_json::from_str(
        r#"{"type": "string_starts_with",
            "haystack": {"type": "property", "path": "name"},
            "needle": {"type": "constant", "value": "Ki"}}"#,
    )
    .unwrap();
    assert_eq!(parsed, property_has_string_starting_with("Ki", path("name"), false));
}

#[test]
fn test_invalid_path_in_document_is_rejected() {
    let result = serde_json::from_str::<Condition>(
        r#"{"type": "is_null", "child": {"type": "property", "path": "books..title"}}"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_relocating_conditions_under_a_relationship() {
    let condition = property_has_value("It", path("title"));
    let relocated = condition.with_prefix(&["books"]).unwrap();

    assert_eq!(relocated.property_paths(), vec![&path("books.title")]);
    assert_eq!(relocated.values(), vec![&Value::from("It")]);
    assert!(matches!(relocated, Expression::AllEqual { .. }));
}
