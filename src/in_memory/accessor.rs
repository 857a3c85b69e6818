//! Object/property access for in-memory evaluation.
//!
//! The engine never inspects objects itself. Every read goes through a
//! [`PropertyAccessor`], which maps `(object, property name)` to an [`Item`]: a scalar,
//! a single related object, or a collection of either.

use std::fmt;

use serde_json::Value as JsonValue;

use super::errors::AccessError;
use crate::value::Value;

/// Result of reading one property.
pub enum Item<'a, T: ?Sized> {
    Scalar(Value),
    Entity(&'a T),
    Collection(Vec<Item<'a, T>>),
}

impl<T: ?Sized> Clone for Item<'_, T> {
    fn clone(&self) -> Self {
        match self {
            Item::Scalar(v) => Item::Scalar(v.clone()),
            Item::Entity(e) => Item::Entity(*e),
            Item::Collection(items) => Item::Collection(items.clone()),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Item<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Item::Entity(e) => f.debug_tuple("Entity").field(e).finish(),
            Item::Collection(items) => f.debug_tuple("Collection").field(items).finish(),
        }
    }
}

impl<'a, T: ?Sized> Item<'a, T> {
    pub fn null() -> Self {
        Item::Scalar(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Item::Scalar(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Scalar(v) => v.type_name(),
            Item::Entity(_) => "object",
            Item::Collection(_) => "collection",
        }
    }

    /// SQL-style equality: `None` (unknown) if either side is null.
    ///
    /// Objects are equal only if they are the same object.
    pub fn sql_eq(&self, other: &Item<'a, T>) -> Option<bool> {
        match (self, other) {
            (Item::Scalar(a), Item::Scalar(b)) => a.sql_eq(b),
            (a, b) if a.is_null() || b.is_null() => None,
            (Item::Entity(a), Item::Entity(b)) => Some(std::ptr::eq(*a, *b)),
            (Item::Collection(a), Item::Collection(b)) => {
                if a.len() != b.len() {
                    return Some(false);
                }
                let mut unknown = false;
                for (x, y) in a.iter().zip(b) {
                    match x.sql_eq(y) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(true)
                }
            }
            _ => Some(false),
        }
    }

    /// Flatten nested collections into one level.
    pub fn flatten(items: Vec<Item<'a, T>>) -> Vec<Item<'a, T>> {
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Item::Collection(inner) => flat.extend(Item::flatten(inner)),
                other => flat.push(other),
            }
        }
        flat
    }
}

impl<T: ?Sized> From<Value> for Item<'_, T> {
    fn from(value: Value) -> Self {
        Item::Scalar(value)
    }
}

/// Read/write access to the properties of objects of type `T`.
pub trait PropertyAccessor<T: ?Sized> {
    fn get<'a>(&self, object: &'a T, property: &str) -> Result<Item<'a, T>, AccessError>;

    fn set(&self, object: &mut T, property: &str, value: Value) -> Result<(), AccessError>;
}

impl<T: ?Sized, A: PropertyAccessor<T> + ?Sized> PropertyAccessor<T> for &A {
    fn get<'a>(&self, object: &'a T, property: &str) -> Result<Item<'a, T>, AccessError> {
        (**self).get(object, property)
    }

    fn set(&self, object: &mut T, property: &str, value: Value) -> Result<(), AccessError> {
        (**self).set(object, property, value)
    }
}

/// Accessor over `serde_json::Value` graphs.
///
/// JSON objects are entities, arrays are collections, everything else is a scalar.
/// Reading a key that is absent fails with [`AccessError::UnknownProperty`]; an
/// explicit `null` reads as null.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAccessor;

impl JsonAccessor {
    fn to_item(value: &JsonValue) -> Item<'_, JsonValue> {
        match value {
            JsonValue::Null => Item::null(),
            JsonValue::Bool(b) => Item::Scalar(Value::Bool(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Item::Scalar(Value::Int(i)),
                None => Item::Scalar(n.as_f64().map_or(Value::Null, Value::Float)),
            },
            JsonValue::String(s) => Item::Scalar(Value::String(s.clone())),
            JsonValue::Array(elements) => {
                Item::Collection(elements.iter().map(Self::to_item).collect())
            }
            JsonValue::Object(_) => Item::Entity(value),
        }
    }

    fn kind(value: &JsonValue) -> &'static str {
        match value {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "bool",
            JsonValue::Number(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }
}

impl PropertyAccessor<JsonValue> for JsonAccessor {
    fn get<'a>(
        &self,
        object: &'a JsonValue,
        property: &str,
    ) -> Result<Item<'a, JsonValue>, AccessError> {
        let map = object
            .as_object()
            .ok_or_else(|| AccessError::NotTraversable {
                property: property.to_string(),
                found: Self::kind(object).to_string(),
            })?;
        map.get(property)
            .map(Self::to_item)
            .ok_or_else(|| AccessError::UnknownProperty {
                property: property.to_string(),
            })
    }

    fn set(&self, object: &mut JsonValue, property: &str, value: Value) -> Result<(), AccessError> {
        let found = Self::kind(object);
        let map = object
            .as_object_mut()
            .ok_or_else(|| AccessError::NotAnEntity {
                property: property.to_string(),
                found: found.to_string(),
            })?;
        let json = serde_json::to_value(&value).map_err(|e| AccessError::UnsupportedValue {
            property: property.to_string(),
            reason: e.to_string(),
        })?;
        map.insert(property.to_string(), json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_get_kinds() {
        let author = json!({
            "name": "King",
            "age": 76,
            "books": [{ "title": "It" }],
            "pseudonym": null
        });

        let accessor = JsonAccessor;
        assert_eq!(
            accessor.get(&author, "name").unwrap().as_value(),
            Some(&Value::from("King"))
        );
        assert!(accessor.get(&author, "pseudonym").unwrap().is_null());
        assert!(matches!(
            accessor.get(&author, "books").unwrap(),
            Item::Collection(ref books) if books.len() == 1
        ));
        assert_eq!(
            accessor.get(&author, "missing").unwrap_err(),
            AccessError::UnknownProperty {
                property: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_json_get_on_scalar_fails() {
        let scalar = json!(3);
        assert!(matches!(
            JsonAccessor.get(&scalar, "x"),
            Err(AccessError::NotTraversable { .. })
        ));
    }

    #[test]
    fn test_json_set() {
        let mut author = json!({ "name": "King" });
        JsonAccessor
            .set(&mut author, "pseudonym", Value::from("Bachman"))
            .unwrap();
        assert_eq!(author["pseudonym"], json!("Bachman"));

        let mut list = json!([]);
        assert!(matches!(
            JsonAccessor.set(&mut list, "x", Value::Null),
            Err(AccessError::NotAnEntity { .. })
        ));
    }

    #[test]
    fn test_entity_equality_is_identity() {
        let a = json!({ "id": 1 });
        let b = json!({ "id": 1 });
        let left: Item<'_, JsonValue> = Item::Entity(&a);
        assert_eq!(left.sql_eq(&Item::Entity(&a)), Some(true));
        assert_eq!(left.sql_eq(&Item::Entity(&b)), Some(false));
        assert_eq!(left.sql_eq(&Item::null()), None);
    }
}
