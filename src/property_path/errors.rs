use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Property path must contain at least one segment")]
    Empty,

    #[error("Property path segment {index} is empty")]
    EmptyPart { index: usize },

    #[error("Invalid path salt '{salt}' (only ASCII letters, digits and '_' are allowed)")]
    InvalidSalt { salt: String },
}
