use pathquery::in_memory::{Item, JsonAccessor, TableJoiner};
use pathquery::property_path::PropertyPath;
use pathquery::value::Value;
use serde_json::{json, Value as JsonValue};
use test_case::test_case;

fn path(dotted: &str) -> PropertyPath {
    PropertyPath::parse(dotted).unwrap()
}

fn shelf(books: usize, awards: usize) -> JsonValue {
    json!({
        "books": (0..books).map(|i| json!({ "title": format!("book {}", i) })).collect::<Vec<_>>(),
        "awards": (0..awards).map(|i| json!({ "year": 2000 + i })).collect::<Vec<_>>(),
    })
}

fn scalar<'a>(item: &'a Item<'_, JsonValue>) -> &'a Value {
    item.as_value().expect("scalar item")
}

#[test_case(1, 1 ; "one by one")]
#[test_case(3, 2 ; "three by two")]
#[test_case(2, 5 ; "two by five")]
fn test_sibling_collections_form_cartesian_product(books: usize, awards: usize) {
    let object = shelf(books, awards);
    let (titles, years) = (path("books.title"), path("awards.year"));

    let rows = TableJoiner::new(JsonAccessor)
        .get_value_rows(&object, &[&titles, &years])
        .unwrap();
    assert_eq!(rows.len(), books * awards);
}

#[test]
fn test_first_path_is_outermost_loop() {
    let object = shelf(2, 2);
    let (titles, years) = (path("books.title"), path("awards.year"));

    let rows = TableJoiner::new(JsonAccessor)
        .get_value_rows(&object, &[&titles, &years])
        .unwrap();
    let pairs: Vec<(Value, Value)> = rows
        .iter()
        .map(|row| (scalar(&row[0]).clone(), scalar(&row[1]).clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (Value::from("book 0"), Value::Int(2000)),
            (Value::from("book 0"), Value::Int(2001)),
            (Value::from("book 1"), Value::Int(2000)),
            (Value::from("book 1"), Value::Int(2001)),
        ]
    );
}

#[test]
fn test_empty_collection_yields_null_row() {
    let object = shelf(0, 3);
    let titles = path("books.title");

    let rows = TableJoiner::new(JsonAccessor)
        .get_value_rows(&object, &[&titles])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0][0].is_null());
}
