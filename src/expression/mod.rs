//! Expression Trees
//!
//! Conditions and value functions form one closed sum type, [`Expression`]. Both
//! consumers walk the same tree:
//!
//! - `in_memory::evaluator` applies it to value rows of an object graph
//! - `relational::query_preparer` compiles it into DQL with joins and parameters
//!
//! Every node exposes the property paths and literal values it references through
//! [`Expression::property_paths`] and [`Expression::values`]. Both lists follow one
//! canonical child order (see [`Expression::children`]), depth first, left to right.
//! Row columns in memory and parameter positions in DQL are assigned in that order.
//!
//! Build trees through [`factory`]; sort keys through [`sort`].

pub mod factory;
pub mod sort;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::property_path::{PathError, PropertyPath};
use crate::value::Value;

pub use sort::{SortDirection, SortMethod};

/// A boolean-valued expression.
pub type Condition = Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Less => "<",
            ComparisonOp::LessEquals => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterEquals => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    Constant {
        value: Value,
    },
    Property {
        path: PropertyPath,
    },
    /// All children evaluate to the same value.
    AllEqual {
        children: Vec<Expression>,
    },
    /// Conjunction.
    AllTrue {
        children: Vec<Expression>,
    },
    /// Disjunction.
    AnyTrue {
        children: Vec<Expression>,
    },
    Not {
        child: Box<Expression>,
    },
    IsNull {
        child: Box<Expression>,
    },
    /// `min <= target <= max`
    Between {
        min: Box<Expression>,
        max: Box<Expression>,
        target: Box<Expression>,
    },
    Compare {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    OneOf {
        target: Box<Expression>,
        values: Vec<Expression>,
    },
    /// Number of elements of a collection.
    Size {
        target: Box<Expression>,
    },
    StringContains {
        haystack: Box<Expression>,
        needle: Box<Expression>,
        #[serde(default)]
        case_insensitive: bool,
    },
    StringStartsWith {
        haystack: Box<Expression>,
        needle: Box<Expression>,
        #[serde(default)]
        case_insensitive: bool,
    },
    StringEndsWith {
        haystack: Box<Expression>,
        needle: Box<Expression>,
        #[serde(default)]
        case_insensitive: bool,
    },
    IsMemberOf {
        collection: Box<Expression>,
        value: Box<Expression>,
    },
    LowerCase {
        child: Box<Expression>,
    },
    UpperCase {
        child: Box<Expression>,
    },
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant {
            value: value.into(),
        }
    }

    pub fn property(path: PropertyPath) -> Self {
        Expression::Property { path }
    }

    /// Direct children in canonical order.
    ///
    /// `Between` is `[min, max, target]`, `OneOf` is `[target, values..]`, string
    /// predicates are `[haystack, needle]`, `IsMemberOf` is `[collection, value]`.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Constant { .. } | Expression::Property { .. } => Vec::new(),
            Expression::AllEqual { children }
            | Expression::AllTrue { children }
            | Expression::AnyTrue { children } => children.iter().collect(),
            Expression::Not { child }
            | Expression::IsNull { child }
            | Expression::LowerCase { child }
            | Expression::UpperCase { child } => vec![child.as_ref()],
            Expression::Between { min, max, target } => {
                vec![min.as_ref(), max.as_ref(), target.as_ref()]
            }
            Expression::Compare { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::OneOf { target, values } => {
                let mut children = vec![target.as_ref()];
                children.extend(values.iter());
                children
            }
            Expression::Size { target } => vec![target.as_ref()],
            Expression::StringContains {
                haystack, needle, ..
            }
            | Expression::StringStartsWith {
                haystack, needle, ..
            }
            | Expression::StringEndsWith {
                haystack, needle, ..
            } => vec![haystack.as_ref(), needle.as_ref()],
            Expression::IsMemberOf { collection, value } => {
                vec![collection.as_ref(), value.as_ref()]
            }
        }
    }

    /// All property paths referenced by this tree, in canonical order.
    ///
    /// A path referenced twice is reported twice; each occurrence gets its own column.
    pub fn property_paths(&self) -> Vec<&PropertyPath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a PropertyPath>) {
        if let Expression::Property { path } = self {
            out.push(path);
            return;
        }
        for child in self.children() {
            child.collect_paths(out);
        }
    }

    /// Number of property references in this tree.
    pub fn path_count(&self) -> usize {
        match self {
            Expression::Property { .. } => 1,
            _ => self.children().iter().map(|c| c.path_count()).sum(),
        }
    }

    /// All literal values of this tree, in canonical order.
    pub fn values(&self) -> Vec<&Value> {
        let mut values = Vec::new();
        self.collect_values(&mut values);
        values
    }

    fn collect_values<'a>(&'a self, out: &mut Vec<&'a Value>) {
        if let Expression::Constant { value } = self {
            out.push(value);
            return;
        }
        for child in self.children() {
            child.collect_values(out);
        }
    }

    /// Relocate every path of this tree under `prefix`.
    pub fn with_prefix<S: AsRef<str>>(&self, prefix: &[S]) -> Result<Expression, PathError> {
        self.map_paths(&mut |path| path.with_prefix(prefix))
    }

    /// Rebuild this tree with every path replaced by `f(path)`.
    pub fn map_paths<F>(&self, f: &mut F) -> Result<Expression, PathError>
    where
        F: FnMut(&PropertyPath) -> Result<PropertyPath, PathError>,
    {
        let boxed = |e: &Expression, f: &mut F| -> Result<Box<Expression>, PathError> {
            Ok(Box::new(e.map_paths(f)?))
        };
        let list = |es: &[Expression], f: &mut F| -> Result<Vec<Expression>, PathError> {
            es.iter().map(|e| e.map_paths(f)).collect()
        };

        Ok(match self {
            Expression::Constant { value } => Expression::Constant {
                value: value.clone(),
            },
            Expression::Property { path } => Expression::Property { path: f(path)? },
            Expression::AllEqual { children } => Expression::AllEqual {
                children: list(children, f)?,
            },
            Expression::AllTrue { children } => Expression::AllTrue {
                children: list(children, f)?,
            },
            Expression::AnyTrue { children } => Expression::AnyTrue {
                children: list(children, f)?,
            },
            Expression::Not { child } => Expression::Not {
                child: boxed(child, f)?,
            },
            Expression::IsNull { child } => Expression::IsNull {
                child: boxed(child, f)?,
            },
            Expression::Between { min, max, target } => Expression::Between {
                min: boxed(min, f)?,
                max: boxed(max, f)?,
                target: boxed(target, f)?,
            },
            Expression::Compare { op, left, right } => Expression::Compare {
                op: *op,
                left: boxed(left, f)?,
                right: boxed(right, f)?,
            },
            Expression::OneOf { target, values } => Expression::OneOf {
                target: boxed(target, f)?,
                values: list(values, f)?,
            },
            Expression::Size { target } => Expression::Size {
                target: boxed(target, f)?,
            },
            Expression::StringContains {
                haystack,
                needle,
                case_insensitive,
            } => Expression::StringContains {
                haystack: boxed(haystack, f)?,
                needle: boxed(needle, f)?,
                case_insensitive: *case_insensitive,
            },
            Expression::StringStartsWith {
                haystack,
                needle,
                case_insensitive,
            } => Expression::StringStartsWith {
                haystack: boxed(haystack, f)?,
                needle: boxed(needle, f)?,
                case_insensitive: *case_insensitive,
            },
            Expression::StringEndsWith {
                haystack,
                needle,
                case_insensitive,
            } => Expression::StringEndsWith {
                haystack: boxed(haystack, f)?,
                needle: boxed(needle, f)?,
                case_insensitive: *case_insensitive,
            },
            Expression::IsMemberOf { collection, value } => Expression::IsMemberOf {
                collection: boxed(collection, f)?,
                value: boxed(value, f)?,
            },
            Expression::LowerCase { child } => Expression::LowerCase {
                child: boxed(child, f)?,
            },
            Expression::UpperCase { child } => Expression::UpperCase {
                child: boxed(child, f)?,
            },
        })
    }
}

fn join_display(children: &[Expression], separator: &str) -> String {
    children
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant { value } => write!(f, "{}", value),
            Expression::Property { path } => write!(f, "{}", path),
            Expression::AllEqual { children } => {
                write!(f, "({})", join_display(children, " = "))
            }
            Expression::AllTrue { children } => {
                write!(f, "({})", join_display(children, " AND "))
            }
            Expression::AnyTrue { children } => {
                write!(f, "({})", join_display(children, " OR "))
            }
            Expression::Not { child } => write!(f, "NOT {}", child),
            Expression::IsNull { child } => write!(f, "{} IS NULL", child),
            Expression::Between { min, max, target } => {
                write!(f, "{} BETWEEN {} AND {}", target, min, max)
            }
            Expression::Compare { op, left, right } => {
                write!(f, "{} {} {}", left, op.symbol(), right)
            }
            Expression::OneOf { target, values } => {
                write!(f, "{} IN ({})", target, join_display(values, ", "))
            }
            Expression::Size { target } => write!(f, "SIZE({})", target),
            Expression::StringContains {
                haystack, needle, ..
            } => write!(f, "{} CONTAINS {}", haystack, needle),
            Expression::StringStartsWith {
                haystack, needle, ..
            } => write!(f, "{} STARTS WITH {}", haystack, needle),
            Expression::StringEndsWith {
                haystack, needle, ..
            } => write!(f, "{} ENDS WITH {}", haystack, needle),
            Expression::IsMemberOf { collection, value } => {
                write!(f, "{} MEMBER OF {}", value, collection)
            }
            Expression::LowerCase { child } => write!(f, "LOWER({})", child),
            Expression::UpperCase { child } => write!(f, "UPPER({})", child),
        }
    }
}
