//! Resolve property paths to joins and a terminal column.
//!
//! Every association segment of a path becomes one join whose alias is derived from
//! the path's salt and the segments walked so far (see [`join_alias`]). Two paths with
//! the same salt and a common prefix therefore produce identical joins for that prefix,
//! which is what lets the preparer deduplicate them by alias.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::alias::join_alias;
use super::errors::MappingError;
use super::schema::{FieldKind, SchemaProvider};
use crate::property_path::{AccessDepth, PropertyPath};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Left,
    Inner,
}

/// `alias.field`, or a bare alias when the path ends on a joined entity.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table_alias: String,
    pub field: Option<String>,
}

impl ColumnRef {
    pub fn field(table_alias: impl Into<String>, field: impl Into<String>) -> Self {
        ColumnRef {
            table_alias: table_alias.into(),
            field: Some(field.into()),
        }
    }

    pub fn alias(table_alias: impl Into<String>) -> Self {
        ColumnRef {
            table_alias: table_alias.into(),
            field: None,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{}", self.table_alias, field),
            None => write!(f, "{}", self.table_alias),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Join {
    pub join_type: JoinType,
    /// Association being joined, e.g. `t.books`
    pub source: ColumnRef,
    pub table_alias: String,
    pub entity: String,
}

/// What the terminal column reference points at.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Terminal {
    Field,
    JoinedEntity,
    /// An association referenced without joining it.
    Relationship { to_many: bool },
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ResolvedPath {
    pub joins: Vec<Join>,
    pub column: ColumnRef,
    pub terminal: Terminal,
}

pub struct JoinFinder<'s, S: ?Sized> {
    schema: &'s S,
    hash_length: usize,
    join_type: JoinType,
}

impl<'s, S: SchemaProvider + ?Sized> JoinFinder<'s, S> {
    pub fn new(schema: &'s S, hash_length: usize, join_type: JoinType) -> Self {
        JoinFinder {
            schema,
            hash_length,
            join_type,
        }
    }

    /// Walk `path` from `root_entity` (aliased `root_alias`) through the schema.
    pub fn find_joins(
        &self,
        root_entity: &str,
        root_alias: &str,
        path: &PropertyPath,
    ) -> Result<ResolvedPath, MappingError> {
        if self.schema.table_name(root_entity).is_none() {
            return Err(MappingError::UnknownEntity {
                entity: root_entity.to_string(),
            });
        }

        let segments = path.segments();
        let mut entity = root_entity.to_string();
        let mut alias = root_alias.to_string();
        let mut joins = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            let is_last = index + 1 == segments.len();
            let field = self.schema.field(&entity, segment).ok_or_else(|| {
                MappingError::RelationshipUnavailable {
                    entity: entity.clone(),
                    property: segment.clone(),
                }
            })?;

            let (target_entity, to_many) = match field {
                FieldKind::Column if is_last => {
                    return Ok(ResolvedPath {
                        joins,
                        column: ColumnRef::field(alias, segment.as_str()),
                        terminal: Terminal::Field,
                    });
                }
                FieldKind::Column => {
                    return Err(MappingError::NotAnAssociation {
                        entity,
                        property: segment.clone(),
                        path: path.dotted(),
                    });
                }
                FieldKind::Association {
                    target_entity,
                    to_many,
                } => (target_entity, to_many),
            };

            if is_last {
                match path.access_depth() {
                    AccessDepth::Direct => {
                        return Ok(ResolvedPath {
                            joins,
                            column: ColumnRef::field(alias, segment.as_str()),
                            terminal: Terminal::Relationship { to_many },
                        });
                    }
                    AccessDepth::UnpackRecursive => {
                        return Err(MappingError::UnsupportedAccessDepth { path: path.dotted() });
                    }
                    AccessDepth::Unpack => {}
                }
            }

            let table = self
                .schema
                .table_name(&target_entity)
                .ok_or_else(|| MappingError::UnknownEntity {
                    entity: target_entity.clone(),
                })?;
            let table_alias = join_alias(path.salt(), &segments[..=index], &table, self.hash_length);
            log::trace!(
                "JoinFinder: {}.{} -> {} ({})",
                alias,
                segment,
                table_alias,
                target_entity
            );

            joins.push(Join {
                join_type: self.join_type,
                source: ColumnRef::field(alias, segment.as_str()),
                table_alias: table_alias.clone(),
                entity: target_entity.clone(),
            });
            alias = table_alias;
            entity = target_entity;
        }

        Ok(ResolvedPath {
            joins,
            column: ColumnRef::alias(alias),
            terminal: Terminal::JoinedEntity,
        })
    }
}
