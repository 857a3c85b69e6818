//! The same conditions evaluated in memory and compiled to DQL.

use pathquery::expression::factory::*;
use pathquery::expression::sort::{property_ascending, property_descending};
use pathquery::expression::Condition;
use pathquery::in_memory::{ConditionEvaluator, JsonAccessor, Sorter};
use pathquery::property_path::PropertyPath;
use pathquery::relational::{
    join_alias, EntityCatalog, PrepareError, QueryPreparer, QueryRequest, SliceError, ToDql,
};
use pathquery::value::Value;
use serde_json::{json, Value as JsonValue};

const CATALOG: &str = r#"
entities:
  - name: Author
    table: author
    fields: [name, pseudonym]
    associations:
      - { name: birth, target: Birth }
      - { name: books, target: Book, to_many: true }
  - name: Birth
    table: birth
    fields: [year]
  - name: Book
    table: book
    fields: [title]
"#;

fn path(dotted: &str) -> PropertyPath {
    PropertyPath::parse(dotted).unwrap()
}

fn authors() -> Vec<JsonValue> {
    vec![
        json!({
            "name": "King",
            "pseudonym": "Bachman",
            "birth": { "year": 1947 },
            "books": [{ "title": "It" }, { "title": "Carrie" }]
        }),
        json!({
            "name": "Tolkien",
            "pseudonym": null,
            "birth": { "year": 1892 },
            "books": [{ "title": "The Hobbit" }]
        }),
    ]
}

fn matching_names(objects: &[JsonValue], conditions: &[Condition]) -> Vec<String> {
    ConditionEvaluator::new(JsonAccessor)
        .filter(objects, conditions)
        .unwrap()
        .into_iter()
        .map(|o| o["name"].as_str().unwrap().to_string())
        .collect()
}

fn compile(conditions: Vec<Condition>) -> pathquery::relational::PreparedQuery {
    let catalog = EntityCatalog::from_yaml_str(CATALOG).unwrap();
    let request = QueryRequest {
        conditions,
        ..QueryRequest::new("Author")
    };
    QueryPreparer::new(&catalog).prepare(&request).unwrap()
}

#[test]
fn test_is_null_selects_tolkien_in_both_modes() {
    let conditions = vec![property_is_null(path("pseudonym"))];

    assert_eq!(matching_names(&authors(), &conditions), ["Tolkien"]);

    let query = compile(conditions);
    assert_eq!(
        query.to_dql(),
        "SELECT t FROM Author t WHERE t.pseudonym IS NULL"
    );
}

#[test]
fn test_not_equal_excludes_null_in_both_modes() {
    // NOT (NULL = 'Bachman') is unknown, so Tolkien is excluded as well.
    let conditions = vec![property_has_not_value("Bachman", path("pseudonym"))];

    assert!(matching_names(&authors(), &conditions).is_empty());
    assert_eq!(
        compile(conditions).where_dql().as_deref(),
        Some("NOT (t.pseudonym = ?0)")
    );
}

#[test]
fn test_negated_empty_any_of_selects_everyone_in_both_modes() {
    // No candidates is false even for Tolkien's null pseudonym, so NOT holds for both.
    let conditions = vec![condition_not_applies(property_has_any_of_values(
        Vec::<&str>::new(),
        path("pseudonym"),
    ))];

    assert_eq!(matching_names(&authors(), &conditions), ["King", "Tolkien"]);
    assert_eq!(
        compile(conditions).where_dql().as_deref(),
        Some("NOT (1 = 0)")
    );
}

#[test]
fn test_between_birth_years() {
    let objects: Vec<JsonValue> = [("a", 1892), ("b", 1954), ("c", 1812)]
        .iter()
        .map(|(name, year)| json!({ "name": name, "birth": { "year": year } }))
        .collect();
    let conditions = vec![property_between_values_inclusive(
        1800,
        1900,
        path("birth.year"),
    )];

    assert_eq!(matching_names(&objects, &conditions), ["a", "c"]);

    let query = compile(conditions);
    let alias = join_alias("", &["birth"], "birth", 8);
    assert_eq!(
        query.where_dql().unwrap(),
        format!("{}.year BETWEEN ?0 AND ?1", alias)
    );
    assert_eq!(query.parameters, vec![Value::Int(1800), Value::Int(1900)]);
}

#[test]
fn test_shared_join_means_same_book() {
    // Both predicates refer to the same book, in memory and through one join.
    let same_book = vec![
        property_has_value("It", path("books.title")),
        property_has_string_starting_with("Car", path("books.title"), false),
    ];
    assert!(matching_names(&authors(), &same_book).is_empty());
    assert_eq!(compile(same_book).joins.len(), 1);

    // A salt makes the second predicate range over books independently.
    let any_books = vec![
        property_has_value("It", path("books.title")),
        property_has_string_starting_with(
            "Car",
            path("books.title").with_salt("1").unwrap(),
            false,
        ),
    ];
    assert_eq!(matching_names(&authors(), &any_books), ["King"]);
    assert_eq!(compile(any_books).joins.len(), 2);
}

#[test]
fn test_size_and_membership_agree() {
    let conditions = vec![property_has_size(1, path("books"))];
    assert_eq!(matching_names(&authors(), &conditions), ["Tolkien"]);
    assert_eq!(
        compile(conditions).where_dql().as_deref(),
        Some("SIZE(t.books) = ?0")
    );
}

#[test]
fn test_case_insensitive_contains() {
    let conditions = vec![property_has_string_containing_case_insensitive_value(
        "HOBB",
        path("books.title"),
    )];
    assert_eq!(matching_names(&authors(), &conditions), ["Tolkien"]);

    let query = compile(conditions);
    assert_eq!(query.parameters, vec![Value::from("%hobb%")]);
}

#[test]
fn test_sort_order_matches_order_by() {
    let objects = authors();
    let methods = vec![
        property_descending(path("birth.year")),
        property_ascending(path("name")),
    ];

    let sorted = Sorter::new(JsonAccessor).sort(&objects, &methods).unwrap();
    assert_eq!(sorted[0]["name"], "King");

    let catalog = EntityCatalog::from_yaml_str(CATALOG).unwrap();
    let query = QueryPreparer::new(&catalog)
        .prepare(&QueryRequest {
            sort: methods,
            ..QueryRequest::new("Author")
        })
        .unwrap();
    let alias = join_alias("", &["birth"], "birth", 8);
    assert_eq!(
        query.order_by_dql().unwrap(),
        format!("{}.year DESC, t.name ASC", alias)
    );
}

#[test]
fn test_negative_offset_rejected_by_both_modes() {
    let request = QueryRequest {
        offset: Some(-5),
        ..QueryRequest::new("Author")
    };
    assert_eq!(
        request.slice().validate(),
        Err(SliceError::NegativeOffset { offset: -5 })
    );

    let catalog = EntityCatalog::from_yaml_str(CATALOG).unwrap();
    assert!(matches!(
        QueryPreparer::new(&catalog).prepare(&request),
        Err(PrepareError::Slice(SliceError::NegativeOffset { .. }))
    ));
}
