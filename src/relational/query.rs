//! Query documents in, prepared queries out.

use serde::{Deserialize, Serialize};

use super::errors::SliceError;
use super::join_finder::Join;
use super::to_dql::{DqlExpr, ToDql};
use crate::expression::{Condition, SortDirection, SortMethod};
use crate::value::Value;

/// A complete request: which entity, which conditions, which order, which page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub entity: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub sort: Vec<SortMethod>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl QueryRequest {
    pub fn new(entity: impl Into<String>) -> Self {
        QueryRequest {
            entity: entity.into(),
            conditions: Vec::new(),
            sort: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn slice(&self) -> Slice {
        Slice {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Unvalidated offset and limit as they arrive from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slice {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Offset and limit that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ValidSlice {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Slice {
    pub fn validate(self) -> Result<ValidSlice, SliceError> {
        let offset = match self.offset {
            Some(offset) if offset < 0 => return Err(SliceError::NegativeOffset { offset }),
            Some(offset) => offset as usize,
            None => 0,
        };
        let limit = match self.limit {
            Some(limit) if limit < 0 => return Err(SliceError::NegativeLimit { limit }),
            Some(limit) => Some(limit as usize),
            None => None,
        };
        Ok(ValidSlice { offset, limit })
    }
}

impl ValidSlice {
    /// Skip `offset` items and keep at most `limit` of the rest.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let rest = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => rest.take(limit).collect(),
            None => rest.collect(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct OrderByItem {
    pub expression: DqlExpr,
    pub direction: SortDirection,
}

/// Immutable result of preparing one request.
#[derive(Debug, PartialEq, Clone)]
pub struct PreparedQuery {
    pub entity: String,
    pub root_alias: String,
    /// Deduplicated by alias, in first-use order
    pub joins: Vec<Join>,
    pub filter: Option<DqlExpr>,
    pub order_by: Vec<OrderByItem>,
    /// Bound values, index `i` belongs to placeholder `i`
    pub parameters: Vec<Value>,
    pub slice: ValidSlice,
}

impl PreparedQuery {
    pub fn where_dql(&self) -> Option<String> {
        self.filter.as_ref().map(ToDql::to_dql)
    }

    pub fn order_by_dql(&self) -> Option<String> {
        if self.order_by.is_empty() {
            return None;
        }
        let items: Vec<String> = self.order_by.iter().map(ToDql::to_dql).collect();
        Some(items.join(", "))
    }
}
