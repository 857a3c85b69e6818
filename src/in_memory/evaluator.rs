//! Condition Evaluator
//!
//! Applies condition trees to objects. For one object the evaluator:
//!
//! 1. collects every path the condition references (canonical order)
//! 2. asks the [`TableJoiner`] for the value rows of those paths
//! 3. applies the whole tree to each row, consuming row items left to right
//!
//! The object matches if any row yields `true`. Values of one node are always taken
//! from the same row, so `properties_equal(books.title, books.subtitle)` compares the
//! title and subtitle of the same book.
//!
//! Logic is three-valued like SQL: comparisons involving `null` are unknown, `NOT
//! unknown` stays unknown, and only `true` matches. `AND` stops at the first `false`,
//! `OR` at the first `true`.

use super::accessor::{Item, PropertyAccessor};
use super::errors::EvaluationError;
use super::table_joiner::TableJoiner;
use crate::config::EngineConfig;
use crate::expression::{ComparisonOp, Condition, Expression};
use crate::property_path::PropertyPath;
use crate::value::Value;

use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct ConditionEvaluator<A> {
    joiner: TableJoiner<A>,
}

impl<A> ConditionEvaluator<A> {
    pub fn new(accessor: A) -> Self {
        ConditionEvaluator {
            joiner: TableJoiner::new(accessor),
        }
    }

    pub fn with_config(accessor: A, config: &EngineConfig) -> Self {
        ConditionEvaluator {
            joiner: TableJoiner::with_config(accessor, config),
        }
    }

    pub fn joiner(&self) -> &TableJoiner<A> {
        &self.joiner
    }

    /// Whether `object` matches `condition`.
    pub fn evaluate<T>(&self, condition: &Condition, object: &T) -> Result<bool, EvaluationError>
    where
        T: ?Sized,
        A: PropertyAccessor<T>,
    {
        self.evaluate_all(std::slice::from_ref(condition), object)
    }

    /// Whether `object` matches all `conditions`.
    ///
    /// The conditions are evaluated as one conjunction over one shared row set, the
    /// same way `WHERE c1 AND c2` is evaluated over one set of joined rows.
    pub fn evaluate_all<T>(
        &self,
        conditions: &[Condition],
        object: &T,
    ) -> Result<bool, EvaluationError>
    where
        T: ?Sized,
        A: PropertyAccessor<T>,
    {
        let paths: Vec<&PropertyPath> = conditions
            .iter()
            .flat_map(|condition| condition.property_paths())
            .collect();
        let rows = self.joiner.get_value_rows(object, &paths)?;

        for row in &rows {
            let mut cursor = 0;
            if conjunction(conditions, row, &mut cursor)? == Some(true) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The objects matching all `conditions`, in input order.
    pub fn filter<'o, T, I>(
        &self,
        objects: I,
        conditions: &[Condition],
    ) -> Result<Vec<&'o T>, EvaluationError>
    where
        T: ?Sized + 'o,
        I: IntoIterator<Item = &'o T>,
        A: PropertyAccessor<T>,
    {
        let mut matching = Vec::new();
        let mut total = 0usize;
        for object in objects {
            total += 1;
            if self.evaluate_all(conditions, object)? {
                matching.push(object);
            }
        }
        log::debug!(
            "ConditionEvaluator: {} of {} object(s) matched {} condition(s)",
            matching.len(),
            total,
            conditions.len()
        );
        Ok(matching)
    }
}

type Truth = Option<bool>;

fn truth<T: ?Sized>(item: &Item<'_, T>, function: &'static str) -> Result<Truth, EvaluationError> {
    match item {
        Item::Scalar(Value::Bool(b)) => Ok(Some(*b)),
        Item::Scalar(Value::Null) => Ok(None),
        other => Err(EvaluationError::type_mismatch(function, other.type_name())),
    }
}

fn truth_item<'a, T: ?Sized>(truth: Truth) -> Item<'a, T> {
    Item::Scalar(truth.map_or(Value::Null, Value::Bool))
}

fn skip(rest: &[Expression], cursor: &mut usize) {
    *cursor += rest.iter().map(Expression::path_count).sum::<usize>();
}

fn conjunction<'a, T: ?Sized>(
    children: &[Expression],
    row: &[Item<'a, T>],
    cursor: &mut usize,
) -> Result<Truth, EvaluationError> {
    let mut unknown = false;
    for (index, child) in children.iter().enumerate() {
        match truth(&apply(child, row, cursor)?, "AND")? {
            Some(false) => {
                skip(&children[index + 1..], cursor);
                return Ok(Some(false));
            }
            None => unknown = true,
            Some(true) => {}
        }
    }
    Ok(if unknown { None } else { Some(true) })
}

fn disjunction<'a, T: ?Sized>(
    children: &[Expression],
    row: &[Item<'a, T>],
    cursor: &mut usize,
) -> Result<Truth, EvaluationError> {
    let mut unknown = false;
    for (index, child) in children.iter().enumerate() {
        match truth(&apply(child, row, cursor)?, "OR")? {
            Some(true) => {
                skip(&children[index + 1..], cursor);
                return Ok(Some(true));
            }
            None => unknown = true,
            Some(false) => {}
        }
    }
    Ok(if unknown { None } else { Some(false) })
}

fn all_equal<T: ?Sized>(items: &[Item<'_, T>]) -> Truth {
    let Some((first, rest)) = items.split_first() else {
        return Some(true);
    };
    let mut unknown = false;
    for item in rest {
        match first.sql_eq(item) {
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

/// Non-null scalar operands of an ordering function, or `None` if any is null.
fn ordered_operands<'i, T: ?Sized>(
    items: &'i [Item<'_, T>],
    function: &'static str,
) -> Result<Option<Vec<&'i Value>>, EvaluationError> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Item::Scalar(Value::Null) => return Ok(None),
            Item::Scalar(value) => values.push(value),
            other => return Err(EvaluationError::type_mismatch(function, other.type_name())),
        }
    }
    Ok(Some(values))
}

fn order(left: &Value, right: &Value, function: &'static str) -> Result<Ordering, EvaluationError> {
    left.compare(right).ok_or_else(|| {
        EvaluationError::type_mismatch(
            function,
            format!("{} and {}", left.type_name(), right.type_name()),
        )
    })
}

/// Both operands of a string predicate, or `None` if either is null.
fn string_operands<T: ?Sized>(
    haystack: &Item<'_, T>,
    needle: &Item<'_, T>,
    case_insensitive: bool,
    function: &'static str,
) -> Result<Option<(String, String)>, EvaluationError> {
    let as_string = |item: &Item<'_, T>| -> Result<Option<String>, EvaluationError> {
        match item {
            Item::Scalar(Value::Null) => Ok(None),
            Item::Scalar(Value::String(s)) if case_insensitive => Ok(Some(s.to_lowercase())),
            Item::Scalar(Value::String(s)) => Ok(Some(s.clone())),
            other => Err(EvaluationError::type_mismatch(function, other.type_name())),
        }
    };
    Ok(match (as_string(haystack)?, as_string(needle)?) {
        (Some(h), Some(n)) => Some((h, n)),
        _ => None,
    })
}

fn map_string<'a, T: ?Sized>(
    item: Item<'a, T>,
    function: &'static str,
    f: impl Fn(&str) -> String,
) -> Result<Item<'a, T>, EvaluationError> {
    match item {
        Item::Scalar(Value::String(s)) => Ok(Item::Scalar(Value::String(f(&s)))),
        Item::Scalar(Value::Null) => Ok(Item::null()),
        other => Err(EvaluationError::type_mismatch(function, other.type_name())),
    }
}

/// Apply `expression` to one row, consuming one row item per property reference.
fn apply<'a, T: ?Sized>(
    expression: &Expression,
    row: &[Item<'a, T>],
    cursor: &mut usize,
) -> Result<Item<'a, T>, EvaluationError> {
    let eval_all = |children: &[&Expression], cursor: &mut usize| {
        children
            .iter()
            .map(|child| apply(child, row, cursor))
            .collect::<Result<Vec<_>, _>>()
    };

    match expression {
        Expression::Constant { value } => Ok(Item::Scalar(value.clone())),
        Expression::Property { .. } => {
            let item = row[*cursor].clone();
            *cursor += 1;
            Ok(item)
        }
        Expression::AllEqual { children } => {
            let items = eval_all(&children.iter().collect::<Vec<_>>(), cursor)?;
            Ok(truth_item(all_equal(&items)))
        }
        Expression::AllTrue { children } => Ok(truth_item(conjunction(children, row, cursor)?)),
        Expression::AnyTrue { children } => Ok(truth_item(disjunction(children, row, cursor)?)),
        Expression::Not { child } => {
            let inner = truth(&apply(child, row, cursor)?, "NOT")?;
            Ok(truth_item(inner.map(|b| !b)))
        }
        Expression::IsNull { child } => {
            let item = apply(child, row, cursor)?;
            Ok(Item::Scalar(Value::Bool(item.is_null())))
        }
        Expression::Between { .. } => {
            let items = eval_all(&expression.children(), cursor)?;
            let Some(values) = ordered_operands(&items, "BETWEEN")? else {
                return Ok(Item::null());
            };
            let (min, max, target) = (values[0], values[1], values[2]);
            let inside = order(target, min, "BETWEEN")? != Ordering::Less
                && order(target, max, "BETWEEN")? != Ordering::Greater;
            Ok(Item::Scalar(Value::Bool(inside)))
        }
        Expression::Compare { op, .. } => {
            let items = eval_all(&expression.children(), cursor)?;
            let Some(values) = ordered_operands(&items, op.symbol())? else {
                return Ok(Item::null());
            };
            let ordering = order(values[0], values[1], op.symbol())?;
            let result = match op {
                ComparisonOp::Less => ordering == Ordering::Less,
                ComparisonOp::LessEquals => ordering != Ordering::Greater,
                ComparisonOp::Greater => ordering == Ordering::Greater,
                ComparisonOp::GreaterEquals => ordering != Ordering::Less,
            };
            Ok(Item::Scalar(Value::Bool(result)))
        }
        Expression::OneOf { .. } => {
            let items = eval_all(&expression.children(), cursor)?;
            let (target, candidates) = (&items[0], &items[1..]);
            // No candidates is plain false, even for a null target (`1 = 0` relationally).
            if candidates.is_empty() {
                return Ok(Item::Scalar(Value::Bool(false)));
            }
            let mut unknown = target.is_null();
            for candidate in candidates {
                match target.sql_eq(candidate) {
                    Some(true) => return Ok(Item::Scalar(Value::Bool(true))),
                    None => unknown = true,
                    Some(false) => {}
                }
            }
            Ok(truth_item(if unknown { None } else { Some(false) }))
        }
        Expression::Size { target } => match apply(target, row, cursor)? {
            Item::Collection(items) => Ok(Item::Scalar(Value::Int(items.len() as i64))),
            Item::Scalar(Value::Null) => Ok(Item::null()),
            other => Err(EvaluationError::type_mismatch("SIZE", other.type_name())),
        },
        Expression::StringContains {
            case_insensitive, ..
        }
        | Expression::StringStartsWith {
            case_insensitive, ..
        }
        | Expression::StringEndsWith {
            case_insensitive, ..
        } => {
            let items = eval_all(&expression.children(), cursor)?;
            let function = match expression {
                Expression::StringContains { .. } => "CONTAINS",
                Expression::StringStartsWith { .. } => "STARTS WITH",
                _ => "ENDS WITH",
            };
            let Some((haystack, needle)) =
                string_operands(&items[0], &items[1], *case_insensitive, function)?
            else {
                return Ok(Item::null());
            };
            let result = match expression {
                Expression::StringContains { .. } => haystack.contains(&needle),
                Expression::StringStartsWith { .. } => haystack.starts_with(&needle),
                _ => haystack.ends_with(&needle),
            };
            Ok(Item::Scalar(Value::Bool(result)))
        }
        Expression::IsMemberOf { .. } => {
            let items = eval_all(&expression.children(), cursor)?;
            let (collection, value) = (&items[0], &items[1]);
            let members = match collection {
                Item::Collection(members) => members,
                Item::Scalar(Value::Null) => return Ok(Item::null()),
                other => {
                    return Err(EvaluationError::type_mismatch(
                        "MEMBER OF",
                        other.type_name(),
                    ))
                }
            };
            if value.is_null() {
                return Ok(Item::null());
            }
            let found = members
                .iter()
                .any(|member| member.sql_eq(value) == Some(true));
            Ok(Item::Scalar(Value::Bool(found)))
        }
        Expression::LowerCase { child } => {
            map_string(apply(child, row, cursor)?, "LOWER", str::to_lowercase)
        }
        Expression::UpperCase { child } => {
            map_string(apply(child, row, cursor)?, "UPPER", str::to_uppercase)
        }
    }
}
