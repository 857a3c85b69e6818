//! Sort methods: one property path plus a direction.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::property_path::{PathError, PropertyPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Orient a base ordering for this direction.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortMethod {
    pub path: PropertyPath,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortMethod {
    pub fn new(path: PropertyPath, direction: SortDirection) -> Self {
        SortMethod { path, direction }
    }

    pub fn with_prefix<S: AsRef<str>>(&self, prefix: &[S]) -> Result<Self, PathError> {
        Ok(SortMethod {
            path: self.path.with_prefix(prefix)?,
            direction: self.direction,
        })
    }
}

impl fmt::Display for SortMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.direction.keyword())
    }
}

pub fn property_ascending(path: PropertyPath) -> SortMethod {
    SortMethod::new(path, SortDirection::Ascending)
}

pub fn property_descending(path: PropertyPath) -> SortMethod {
    SortMethod::new(path, SortDirection::Descending)
}
