use thiserror::Error;

/// Failure of the object/property accessor while walking a path.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccessError {
    #[error("Unknown property '{property}'")]
    UnknownProperty { property: String },

    #[error("Cannot access '{property}' on a {found} value (expected a single object or a collection of objects)")]
    NotTraversable { property: String, found: String },

    #[error("Cannot set '{property}': target is a {found} value, not an object")]
    NotAnEntity { property: String, found: String },

    #[error("Cannot store value for '{property}': {reason}")]
    UnsupportedValue { property: String, reason: String },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("{function} cannot be applied to {found}")]
    TypeMismatch {
        function: &'static str,
        found: String,
    },

    #[error("Value row expansion exceeded the limit of {limit} rows")]
    RowLimitExceeded { limit: usize },
}

impl EvaluationError {
    pub fn type_mismatch(function: &'static str, found: impl Into<String>) -> Self {
        EvaluationError::TypeMismatch {
            function,
            found: found.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SortError {
    #[error("Sort path '{path}' resolves to {count} values for one object; sorting by a multi-valued key is undefined")]
    MultipleValues { path: String, count: usize },

    #[error("Sort path '{path}' yields incomparable values: {left} vs {right}")]
    UnsupportedTypeCombination {
        path: String,
        left: String,
        right: String,
    },

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl From<AccessError> for SortError {
    fn from(value: AccessError) -> Self {
        SortError::Evaluation(value.into())
    }
}
