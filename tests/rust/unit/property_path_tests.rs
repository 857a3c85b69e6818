use pathquery::property_path::{AccessDepth, PathError, PropertyPath};
use test_case::test_case;

#[test_case("" ; "empty string")]
#[test_case("books..title" ; "empty middle segment")]
#[test_case("books." ; "trailing dot")]
fn test_malformed_dotted_paths_are_rejected(dotted: &str) {
    assert!(matches!(
        PropertyPath::parse(dotted),
        Err(PathError::EmptyPart { .. })
    ));
}

#[test]
fn test_no_segments_is_empty_error() {
    assert_eq!(
        PropertyPath::from_segments(Vec::<&str>::new()),
        Err(PathError::Empty)
    );
}

#[test]
fn test_salt_must_be_identifier_safe() {
    let path = PropertyPath::parse("books").unwrap();
    assert!(path.with_salt("2").is_ok());
    assert!(matches!(
        path.with_salt("a b"),
        Err(PathError::InvalidSalt { .. })
    ));
}

#[test]
fn test_prefix_keeps_salt_and_depth() {
    let path = PropertyPath::new("1", AccessDepth::Direct, ["tags"]).unwrap();
    let prefixed = path.with_prefix(&["books"]).unwrap();

    assert_eq!(prefixed.dotted(), "books.tags");
    assert_eq!(prefixed.salt(), "1");
    assert_eq!(prefixed.access_depth(), AccessDepth::Direct);
}

#[test]
fn test_deserialize_short_and_full_forms() {
    let short: PropertyPath = serde_json::from_str(r#""birth.year""#).unwrap();
    assert_eq!(short, PropertyPath::parse("birth.year").unwrap());

    let full: PropertyPath =
        serde_json::from_str(r#"{"path": "books", "salt": "2", "access_depth": "direct"}"#)
            .unwrap();
    assert_eq!(full.salt(), "2");
    assert_eq!(full.access_depth(), AccessDepth::Direct);

    assert!(serde_json::from_str::<PropertyPath>(r#""""#).is_err());
}
