//! Sorter
//!
//! Stable multi-key sort over objects. Sort methods are applied in order until one
//! of them tells two objects apart.
//!
//! Null handling: `null` is smaller than every non-null value before the direction is
//! applied. Ascending therefore puts nulls first and descending puts them last.
//!
//! Keys are read and validated for every object before anything is reordered, so a
//! failing sort never returns a partial order.

use std::cmp::Ordering;

use super::accessor::{Item, PropertyAccessor};
use super::errors::SortError;
use super::table_joiner::TableJoiner;
use crate::config::EngineConfig;
use crate::expression::SortMethod;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Sorter<A> {
    joiner: TableJoiner<A>,
}

/// Sort key of one object for one sort method.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Value(Value),
    /// Objects and collections: they have no order.
    Opaque(&'static str),
}

impl SortKey {
    fn is_null(&self) -> bool {
        matches!(self, SortKey::Value(Value::Null))
    }

    fn type_name(&self) -> &'static str {
        match self {
            SortKey::Value(v) => v.type_name(),
            SortKey::Opaque(name) => name,
        }
    }

    fn comparable_with(&self, other: &SortKey) -> bool {
        match (self, other) {
            (SortKey::Value(a), SortKey::Value(b)) => a.is_comparable_with(b),
            _ => false,
        }
    }
}

/// Base ordering with null as the smallest value.
fn compare_keys(left: &SortKey, right: &SortKey) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => match (left, right) {
            (SortKey::Value(a), SortKey::Value(b)) => a.compare(b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

impl<A> Sorter<A> {
    pub fn new(accessor: A) -> Self {
        Sorter {
            joiner: TableJoiner::new(accessor),
        }
    }

    pub fn with_config(accessor: A, config: &EngineConfig) -> Self {
        Sorter {
            joiner: TableJoiner::with_config(accessor, config),
        }
    }

    /// Return `objects` ordered by `sort_methods`; equal objects keep their input order.
    pub fn sort<'o, T, I>(&self, objects: I, sort_methods: &[SortMethod]) -> Result<Vec<&'o T>, SortError>
    where
        T: ?Sized + 'o,
        I: IntoIterator<Item = &'o T>,
        A: PropertyAccessor<T>,
    {
        let objects: Vec<&'o T> = objects.into_iter().collect();
        if sort_methods.is_empty() {
            return Ok(objects);
        }

        let keys = objects
            .iter()
            .map(|object| self.keys_for(*object, sort_methods))
            .collect::<Result<Vec<_>, _>>()?;
        validate_key_columns(&keys, sort_methods)?;

        let mut order: Vec<usize> = (0..objects.len()).collect();
        order.sort_by(|&a, &b| {
            sort_methods
                .iter()
                .enumerate()
                .map(|(i, method)| method.direction.apply(compare_keys(&keys[a][i], &keys[b][i])))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        log::debug!(
            "Sorter: ordered {} object(s) by {} key(s)",
            objects.len(),
            sort_methods.len()
        );
        Ok(order.into_iter().map(|index| objects[index]).collect())
    }

    fn keys_for<T>(&self, object: &T, sort_methods: &[SortMethod]) -> Result<Vec<SortKey>, SortError>
    where
        T: ?Sized,
        A: PropertyAccessor<T>,
    {
        sort_methods
            .iter()
            .map(|method| {
                let mut rows = self.joiner.get_value_rows(object, &[&method.path])?;
                if rows.len() > 1 {
                    return Err(SortError::MultipleValues {
                        path: method.path.dotted(),
                        count: rows.len(),
                    });
                }
                let item = rows.pop().and_then(|mut row| row.pop()).unwrap_or_else(Item::null);
                Ok(match item {
                    Item::Scalar(value) => SortKey::Value(value),
                    other => SortKey::Opaque(other.type_name()),
                })
            })
            .collect()
    }
}

/// Every pair of non-null keys within one column must be comparable.
fn validate_key_columns(keys: &[Vec<SortKey>], sort_methods: &[SortMethod]) -> Result<(), SortError> {
    for (column, method) in sort_methods.iter().enumerate() {
        let mut non_null = keys.iter().map(|k| &k[column]).filter(|k| !k.is_null());
        let Some(reference) = non_null.next() else {
            continue;
        };
        for key in non_null {
            if !reference.comparable_with(key) {
                return Err(SortError::UnsupportedTypeCombination {
                    path: method.path.dotted(),
                    left: reference.type_name().to_string(),
                    right: key.type_name().to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::sort::{property_ascending, property_descending};
    use crate::in_memory::accessor::JsonAccessor;
    use crate::property_path::PropertyPath;
    use serde_json::{json, Value as JsonValue};

    fn path(dotted: &str) -> PropertyPath {
        PropertyPath::parse(dotted).unwrap()
    }

    fn names(sorted: &[&JsonValue]) -> Vec<String> {
        sorted
            .iter()
            .map(|o| o["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn authors() -> Vec<JsonValue> {
        vec![
            json!({ "name": "King", "pseudonym": "Bachman", "birth": { "year": 1947 } }),
            json!({ "name": "Tolkien", "pseudonym": null, "birth": { "year": 1892 } }),
            json!({ "name": "Austen", "pseudonym": "A Lady", "birth": { "year": 1775 } }),
        ]
    }

    #[test]
    fn test_ascending_and_descending() {
        let authors = authors();
        let sorter = Sorter::new(JsonAccessor);

        let asc = sorter.sort(&authors, &[property_ascending(path("birth.year"))]).unwrap();
        assert_eq!(names(&asc), ["Austen", "Tolkien", "King"]);

        let desc = sorter.sort(&authors, &[property_descending(path("name"))]).unwrap();
        assert_eq!(names(&desc), ["Tolkien", "King", "Austen"]);
    }

    #[test]
    fn test_null_first_ascending_last_descending() {
        let authors = authors();
        let sorter = Sorter::new(JsonAccessor);

        let asc = sorter.sort(&authors, &[property_ascending(path("pseudonym"))]).unwrap();
        assert_eq!(names(&asc)[0], "Tolkien");

        let desc = sorter.sort(&authors, &[property_descending(path("pseudonym"))]).unwrap();
        assert_eq!(names(&desc)[2], "Tolkien");
    }

    #[test]
    fn test_secondary_key_and_stability() {
        let objects = vec![
            json!({ "name": "b", "group": 1 }),
            json!({ "name": "a", "group": 2 }),
            json!({ "name": "c", "group": 1 }),
            json!({ "name": "d", "group": 1 }),
        ];
        let sorter = Sorter::new(JsonAccessor);

        let by_group = sorter.sort(&objects, &[property_ascending(path("group"))]).unwrap();
        assert_eq!(names(&by_group), ["b", "c", "d", "a"]);

        let by_group_then_name = sorter
            .sort(
                &objects,
                &[property_descending(path("group")), property_descending(path("name"))],
            )
            .unwrap();
        assert_eq!(names(&by_group_then_name), ["a", "d", "c", "b"]);
    }

    #[test]
    fn test_multi_valued_key_fails() {
        let objects = vec![
            json!({ "name": "x", "books": [{ "title": "A" }, { "title": "B" }] }),
            json!({ "name": "y", "books": [] }),
        ];
        let err = Sorter::new(JsonAccessor)
            .sort(&objects, &[property_ascending(path("books.title"))])
            .unwrap_err();
        assert_eq!(
            err,
            SortError::MultipleValues {
                path: "books.title".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_multi_valued_key_fails_for_single_object() {
        let objects = vec![json!({ "books": [{ "title": "A" }, { "title": "B" }] })];
        let err = Sorter::new(JsonAccessor)
            .sort(&objects, &[property_ascending(path("books.title"))])
            .unwrap_err();
        assert!(matches!(err, SortError::MultipleValues { count: 2, .. }));
    }

    #[test]
    fn test_mixed_types_fail() {
        let objects = vec![
            json!({ "name": "x", "rank": 3 }),
            json!({ "name": "y", "rank": "high" }),
            json!({ "name": "z", "rank": { "level": 1 } }),
        ];
        let err = Sorter::new(JsonAccessor)
            .sort(&objects, &[property_ascending(path("rank"))])
            .unwrap_err();
        assert!(matches!(err, SortError::UnsupportedTypeCombination { .. }));
    }

    #[test]
    fn test_int_and_float_sort_together() {
        let objects = vec![
            json!({ "name": "x", "score": 2.5 }),
            json!({ "name": "y", "score": 2 }),
            json!({ "name": "z", "score": 3 }),
        ];
        let sorted = Sorter::new(JsonAccessor)
            .sort(&objects, &[property_ascending(path("score"))])
            .unwrap();
        assert_eq!(names(&sorted), ["y", "x", "z"]);
    }
}
