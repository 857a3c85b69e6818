//! # Relational Compilation Errors
//!
//! - **MappingError**: a path does not fit the schema (unknown entity or property, a
//!   path continuing past a plain field, an access depth joins cannot express, two
//!   associations whose shortened join aliases collide)
//! - **SliceError**: negative offset or limit, rejected before anything is compiled
//! - **PrepareError**: everything `QueryPreparer::prepare` can return
//! - **CatalogError**: loading and validating YAML entity catalogs

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MappingError {
    #[error("No schema found for entity `{entity}`")]
    UnknownEntity { entity: String },

    #[error("Property `{property}` is not available on entity `{entity}`")]
    RelationshipUnavailable { entity: String, property: String },

    #[error("Path `{path}` continues past `{entity}.{property}`, which is not an association")]
    NotAnAssociation {
        entity: String,
        property: String,
        path: String,
    },

    #[error("Path `{path}` uses recursive access on an association, which joins cannot express")]
    UnsupportedAccessDepth { path: String },

    #[error("Path `{path}` must end in a to-many relationship accessed directly")]
    NotACollection { path: String },

    #[error("Join alias `{alias}` is used for both `{first}` and `{second}`; raise alias_hash_length")]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SliceError {
    #[error("Offset must not be negative, got {offset}")]
    NegativeOffset { offset: i64 },

    #[error("Limit must not be negative, got {limit}")]
    NegativeLimit { limit: i64 },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PrepareError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Slice(#[from] SliceError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {error}")]
    ConfigReadError { error: String },

    #[error("Failed to parse catalog: {error}")]
    ConfigParseError { error: String },

    #[error("Invalid catalog: {message}")]
    InvalidConfig { message: String },
}
