//! Condition factory.
//!
//! The construction entry points callers use to build condition trees. Each function
//! returns a plain [`Condition`]; nothing here touches schema or storage.

use super::{ComparisonOp, Condition, Expression};
use crate::property_path::{AccessDepth, PropertyPath};
use crate::value::Value;

fn prop(path: PropertyPath) -> Box<Expression> {
    Box::new(Expression::Property { path })
}

fn lit(value: impl Into<Value>) -> Box<Expression> {
    Box::new(Expression::constant(value))
}

pub fn true_condition() -> Condition {
    Expression::AllTrue {
        children: Vec::new(),
    }
}

pub fn false_condition() -> Condition {
    Expression::AnyTrue {
        children: Vec::new(),
    }
}

pub fn all_conditions_apply(conditions: Vec<Condition>) -> Condition {
    Expression::AllTrue {
        children: conditions,
    }
}

pub fn any_condition_applies(conditions: Vec<Condition>) -> Condition {
    Expression::AnyTrue {
        children: conditions,
    }
}

pub fn condition_not_applies(condition: Condition) -> Condition {
    Expression::Not {
        child: Box::new(condition),
    }
}

/// `path = value`.
///
/// A `null` value never matches through equality (unknown, as in SQL), so this
/// returns [`property_is_null`] instead.
pub fn property_has_value(value: impl Into<Value>, path: PropertyPath) -> Condition {
    let value = value.into();
    if value.is_null() {
        return property_is_null(path);
    }
    Expression::AllEqual {
        children: vec![Expression::Property { path }, Expression::Constant { value }],
    }
}

pub fn property_has_not_value(value: impl Into<Value>, path: PropertyPath) -> Condition {
    let value = value.into();
    if value.is_null() {
        return property_is_not_null(path);
    }
    condition_not_applies(property_has_value(value, path))
}

pub fn property_is_null(path: PropertyPath) -> Condition {
    Expression::IsNull { child: prop(path) }
}

pub fn property_is_not_null(path: PropertyPath) -> Condition {
    condition_not_applies(property_is_null(path))
}

pub fn property_has_any_of_values<I, V>(values: I, path: PropertyPath) -> Condition
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Expression::OneOf {
        target: prop(path),
        values: values.into_iter().map(Expression::constant).collect(),
    }
}

pub fn property_between_values_inclusive(
    min: impl Into<Value>,
    max: impl Into<Value>,
    path: PropertyPath,
) -> Condition {
    Expression::Between {
        min: lit(min),
        max: lit(max),
        target: prop(path),
    }
}

fn compare(op: ComparisonOp, value: Value, path: PropertyPath) -> Condition {
    Expression::Compare {
        op,
        left: prop(path),
        right: Box::new(Expression::Constant { value }),
    }
}

/// `path > value`
pub fn value_greater_than(value: impl Into<Value>, path: PropertyPath) -> Condition {
    compare(ComparisonOp::Greater, value.into(), path)
}

/// `path >= value`
pub fn value_greater_equals_than(value: impl Into<Value>, path: PropertyPath) -> Condition {
    compare(ComparisonOp::GreaterEquals, value.into(), path)
}

/// `path < value`
pub fn value_smaller_than(value: impl Into<Value>, path: PropertyPath) -> Condition {
    compare(ComparisonOp::Less, value.into(), path)
}

/// `path <= value`
pub fn value_smaller_equals_than(value: impl Into<Value>, path: PropertyPath) -> Condition {
    compare(ComparisonOp::LessEquals, value.into(), path)
}

pub fn property_has_string_containing_case_insensitive_value(
    value: impl Into<String>,
    path: PropertyPath,
) -> Condition {
    Expression::StringContains {
        haystack: prop(path),
        needle: lit(value.into()),
        case_insensitive: true,
    }
}

pub fn property_has_string_starting_with(
    value: impl Into<String>,
    path: PropertyPath,
    case_insensitive: bool,
) -> Condition {
    Expression::StringStartsWith {
        haystack: prop(path),
        needle: lit(value.into()),
        case_insensitive,
    }
}

pub fn property_has_string_ending_with(
    value: impl Into<String>,
    path: PropertyPath,
    case_insensitive: bool,
) -> Condition {
    Expression::StringEndsWith {
        haystack: prop(path),
        needle: lit(value.into()),
        case_insensitive,
    }
}

/// Collection at `path` has exactly `size` elements.
///
/// The path is switched to [`AccessDepth::Direct`]: the relationship is counted, not
/// joined.
pub fn property_has_size(size: i64, path: PropertyPath) -> Condition {
    Expression::AllEqual {
        children: vec![
            Expression::Size {
                target: prop(path.with_access_depth(AccessDepth::Direct)),
            },
            Expression::constant(size),
        ],
    }
}

pub fn property_has_not_size(size: i64, path: PropertyPath) -> Condition {
    condition_not_applies(property_has_size(size, path))
}

/// Collection at `path` contains `value`. The path is used with direct access.
pub fn property_has_member(value: impl Into<Value>, path: PropertyPath) -> Condition {
    Expression::IsMemberOf {
        collection: prop(path.with_access_depth(AccessDepth::Direct)),
        value: lit(value),
    }
}

/// Both paths resolve to equal values within the same row.
pub fn properties_equal(left: PropertyPath, right: PropertyPath) -> Condition {
    Expression::AllEqual {
        children: vec![
            Expression::Property { path: left },
            Expression::Property { path: right },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(dotted: &str) -> PropertyPath {
        PropertyPath::parse(dotted).unwrap()
    }

    #[test]
    fn test_has_value_with_null_becomes_is_null() {
        assert_eq!(
            property_has_value(Value::Null, path("pseudonym")),
            property_is_null(path("pseudonym"))
        );
        assert_eq!(
            property_has_not_value(Option::<i64>::None, path("pseudonym")),
            property_is_not_null(path("pseudonym"))
        );
    }

    #[test]
    fn test_size_and_member_use_direct_access() {
        let size = property_has_size(2, path("books"));
        assert_eq!(
            size.property_paths()[0].access_depth(),
            AccessDepth::Direct
        );

        let member = property_has_member("fantasy", path("tags"));
        assert_eq!(
            member.property_paths()[0].access_depth(),
            AccessDepth::Direct
        );
    }

    #[test]
    fn test_any_of_values_keeps_order() {
        let condition = property_has_any_of_values(["a", "b", "c"], path("name"));
        assert_eq!(
            condition.values(),
            vec![&Value::from("a"), &Value::from("b"), &Value::from("c")]
        );
    }
}
