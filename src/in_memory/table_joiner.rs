//! Table Joiner
//!
//! Walks a set of property paths over one root object and produces the value rows an
//! expression is evaluated against. This is the in-memory counterpart of the joins the
//! relational side generates:
//!
//! - a to-many relationship on the way fans out into one branch per element
//!   (cartesian product across all paths)
//! - fan-out points are keyed by (salt, path prefix), exactly like join aliases, so two
//!   paths sharing a key see the *same* element in every row
//! - an empty collection contributes `null` instead of removing rows (LEFT JOIN)
//! - a `null` on the way makes the rest of the path `null`
//!
//! ## Row order
//!
//! The first path is the outermost loop. Within one path, earlier segments vary slower
//! than later ones. For `[books.title, awards.year]` with books `[A, B]` and awards
//! `[x, y]` the rows are `(A,x) (A,y) (B,x) (B,y)`.

use std::collections::HashMap;

use super::accessor::{Item, PropertyAccessor};
use super::errors::{AccessError, EvaluationError};
use crate::config::EngineConfig;
use crate::property_path::{AccessDepth, PrefixKey, PropertyPath};

/// One value per path.
pub type ValueRow<'a, T> = Vec<Item<'a, T>>;

#[derive(Debug, Clone)]
pub struct TableJoiner<A> {
    accessor: A,
    max_rows: usize,
}

impl<A> TableJoiner<A> {
    pub fn new(accessor: A) -> Self {
        Self::with_config(accessor, &EngineConfig::default())
    }

    pub fn with_config(accessor: A, config: &EngineConfig) -> Self {
        TableJoiner {
            accessor,
            max_rows: config.max_value_rows,
        }
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// Produce all value rows for `paths` evaluated together against `root`.
    ///
    /// Without paths the result is a single empty row.
    pub fn get_value_rows<'a, T>(
        &self,
        root: &'a T,
        paths: &[&PropertyPath],
    ) -> Result<Vec<ValueRow<'a, T>>, EvaluationError>
    where
        T: ?Sized,
        A: PropertyAccessor<T>,
    {
        let mut builder = RowBuilder {
            accessor: &self.accessor,
            paths,
            root,
            max_rows: self.max_rows,
            bindings: HashMap::new(),
            row: Vec::with_capacity(paths.len()),
            rows: Vec::new(),
        };
        builder.next_path(0)?;

        log::trace!(
            "TableJoiner: {} path(s) expanded into {} row(s)",
            paths.len(),
            builder.rows.len()
        );
        Ok(builder.rows)
    }
}

struct RowBuilder<'s, 'a, T: ?Sized, A> {
    accessor: &'s A,
    paths: &'s [&'s PropertyPath],
    root: &'a T,
    max_rows: usize,
    /// Element currently chosen at each fan-out point.
    bindings: HashMap<PrefixKey, Item<'a, T>>,
    row: ValueRow<'a, T>,
    rows: Vec<ValueRow<'a, T>>,
}

impl<'a, T, A> RowBuilder<'_, 'a, T, A>
where
    T: ?Sized,
    A: PropertyAccessor<T>,
{
    fn next_path(&mut self, path_index: usize) -> Result<(), EvaluationError> {
        if path_index == self.paths.len() {
            if self.rows.len() >= self.max_rows {
                return Err(EvaluationError::RowLimitExceeded {
                    limit: self.max_rows,
                });
            }
            self.rows.push(self.row.clone());
            return Ok(());
        }
        self.walk(path_index, 0, Item::Entity(self.root))
    }

    fn walk(
        &mut self,
        path_index: usize,
        segment_index: usize,
        current: Item<'a, T>,
    ) -> Result<(), EvaluationError> {
        let path = self.paths[path_index];
        if segment_index == path.len() {
            self.row.push(current);
            let result = self.next_path(path_index + 1);
            self.row.pop();
            return result;
        }

        let is_last = segment_index + 1 == path.len();
        let direct = is_last && path.access_depth() == AccessDepth::Direct;
        let key = path.prefix_key(segment_index + 1);
        // A directly accessed relationship is the whole collection, never one element.
        if !direct {
            if let Some(bound) = self.bindings.get(&key) {
                let bound = bound.clone();
                return self.walk(path_index, segment_index + 1, bound);
            }
        }

        let property = &path.segments()[segment_index];
        let entity = match current {
            Item::Entity(entity) => entity,
            Item::Scalar(ref value) if value.is_null() => {
                return self.walk(path_index, segment_index + 1, Item::null());
            }
            other => {
                return Err(AccessError::NotTraversable {
                    property: property.clone(),
                    found: other.type_name().to_string(),
                }
                .into());
            }
        };

        let value = self.accessor.get(entity, property)?;
        match value {
            Item::Collection(elements) if !direct => {
                let elements = if is_last && path.access_depth() == AccessDepth::UnpackRecursive {
                    Item::flatten(elements)
                } else {
                    elements
                };
                self.fan_out(path_index, segment_index, key, elements)
            }
            other => self.walk(path_index, segment_index + 1, other),
        }
    }

    fn fan_out(
        &mut self,
        path_index: usize,
        segment_index: usize,
        key: PrefixKey,
        elements: Vec<Item<'a, T>>,
    ) -> Result<(), EvaluationError> {
        let branches = if elements.is_empty() {
            vec![Item::null()]
        } else {
            elements
        };

        for element in branches {
            self.bindings.insert(key.clone(), element.clone());
            self.walk(path_index, segment_index + 1, element)?;
        }
        self.bindings.remove(&key);
        Ok(())
    }
}
