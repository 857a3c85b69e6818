//! DQL rendering.
//!
//! The preparer lowers conditions into [`DqlExpr`] trees; [`ToDql`] turns those trees,
//! joins and whole prepared queries into text. Placeholders are already rendered when
//! a parameter node is created, so rendering needs no context.

use serde::{Deserialize, Serialize};

use super::join_finder::{ColumnRef, Join, JoinType};
use super::query::{OrderByItem, PreparedQuery};

pub trait ToDql {
    fn to_dql(&self) -> String;
}

/// Placeholder syntax for bound parameters.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStyle {
    /// `?0`, `?1`, ...
    #[default]
    Positional,
    /// `:p0`, `:p1`, ...
    Named,
}

impl ParameterStyle {
    pub fn placeholder(self, index: usize) -> String {
        match self {
            ParameterStyle::Positional => format!("?{}", index),
            ParameterStyle::Named => format!(":p{}", index),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    Equal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    And,
    Or,
    Not,
    IsNull,
    /// Operands are `[target, min, max]`.
    Between,
    /// Operands are `[target, candidates..]`.
    In,
    /// `escaped` appends `ESCAPE '\'`.
    Like { escaped: bool },
    /// Operands are `[value, collection]`.
    MemberOf,
}

impl Operator {
    fn symbol(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
            Operator::IsNull => "IS NULL",
            Operator::Between => "BETWEEN",
            Operator::In => "IN",
            Operator::Like { .. } => "LIKE",
            Operator::MemberOf => "MEMBER OF",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct OperatorApplication {
    pub operator: Operator,
    pub operands: Vec<DqlExpr>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum DqlExpr {
    /// Rendered placeholder, e.g. `?3`
    Parameter(String),
    Column(ColumnRef),
    StringLiteral(String),
    /// Constant truth, `1 = 1` or `1 = 0`
    Truth(bool),
    FunctionCall { name: &'static str, args: Vec<DqlExpr> },
    OperatorApplication(OperatorApplication),
}

impl DqlExpr {
    pub fn apply(operator: Operator, operands: Vec<DqlExpr>) -> Self {
        DqlExpr::OperatorApplication(OperatorApplication { operator, operands })
    }

    pub fn call(name: &'static str, args: Vec<DqlExpr>) -> Self {
        DqlExpr::FunctionCall { name, args }
    }

    /// Fold `operands` with AND (OR), collapsing the empty and single-operand cases.
    pub fn junction(operator: Operator, mut operands: Vec<DqlExpr>) -> Self {
        match operands.len() {
            0 => DqlExpr::Truth(operator == Operator::And),
            1 => operands.remove(0),
            _ => DqlExpr::apply(operator, operands),
        }
    }

    /// Rendered form when used as an operand of another operator.
    fn operand_dql(&self) -> String {
        match self {
            DqlExpr::OperatorApplication(_) | DqlExpr::Truth(_) => format!("({})", self.to_dql()),
            _ => self.to_dql(),
        }
    }
}

/// Escape LIKE wildcards so a needle matches literally under `ESCAPE '\'`.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl ToDql for DqlExpr {
    fn to_dql(&self) -> String {
        match self {
            DqlExpr::Parameter(placeholder) => placeholder.clone(),
            DqlExpr::Column(column) => column.to_string(),
            DqlExpr::StringLiteral(s) => format!("'{}'", s.replace('\'', "''")),
            DqlExpr::Truth(true) => "1 = 1".to_string(),
            DqlExpr::Truth(false) => "1 = 0".to_string(),
            DqlExpr::FunctionCall { name, args } => {
                let args: Vec<String> = args.iter().map(ToDql::to_dql).collect();
                format!("{}({})", name, args.join(", "))
            }
            DqlExpr::OperatorApplication(application) => application.to_dql(),
        }
    }
}

impl ToDql for OperatorApplication {
    fn to_dql(&self) -> String {
        let operands: Vec<String> = self.operands.iter().map(DqlExpr::operand_dql).collect();
        match (self.operator, operands.as_slice()) {
            (Operator::And | Operator::Or, _) => {
                operands.join(&format!(" {} ", self.operator.symbol()))
            }
            (Operator::Not, [operand]) => format!("NOT {}", operand),
            (Operator::IsNull, [operand]) => format!("{} IS NULL", operand),
            (Operator::Between, [target, min, max]) => {
                format!("{} BETWEEN {} AND {}", target, min, max)
            }
            (Operator::In, [target, candidates @ ..]) => {
                format!("{} IN ({})", target, candidates.join(", "))
            }
            (Operator::Like { escaped }, [haystack, pattern]) => {
                let escape = if escaped { " ESCAPE '\\'" } else { "" };
                format!("{} LIKE {}{}", haystack, pattern, escape)
            }
            (operator, [left, right]) => format!("{} {} {}", left, operator.symbol(), right),
            (operator, _) => format!("{}({})", operator.symbol(), operands.join(", ")),
        }
    }
}

impl ToDql for JoinType {
    fn to_dql(&self) -> String {
        match self {
            JoinType::Left => "LEFT JOIN",
            JoinType::Inner => "INNER JOIN",
        }
        .to_string()
    }
}

impl ToDql for Join {
    fn to_dql(&self) -> String {
        format!("{} {} {}", self.join_type.to_dql(), self.source, self.table_alias)
    }
}

impl ToDql for OrderByItem {
    fn to_dql(&self) -> String {
        format!("{} {}", self.expression.to_dql(), self.direction.keyword())
    }
}

impl ToDql for PreparedQuery {
    fn to_dql(&self) -> String {
        let mut dql = format!("SELECT {0} FROM {1} {0}", self.root_alias, self.entity);
        for join in &self.joins {
            dql.push(' ');
            dql.push_str(&join.to_dql());
        }
        if let Some(filter) = self.where_dql() {
            dql.push_str(" WHERE ");
            dql.push_str(&filter);
        }
        if let Some(order_by) = self.order_by_dql() {
            dql.push_str(" ORDER BY ");
            dql.push_str(&order_by);
        }
        dql
    }
}
