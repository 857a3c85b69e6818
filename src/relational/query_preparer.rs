//! # Query Preparation
//!
//! Lowers a [`QueryRequest`] into a [`PreparedQuery`]:
//!
//! 1. offset and limit are validated before anything else,
//! 2. every property path is resolved through [`JoinFinder`] and its joins are merged
//!    by alias, in first-use order,
//! 3. every constant becomes a bound parameter, numbered in the order constants are
//!    met during a depth-first walk of the conditions,
//! 4. the WHERE tree mirrors the condition tree, the condition list being combined
//!    with AND,
//! 5. sort methods become ORDER BY items in order.
//!
//! [`QueryPreparer`] only holds the schema and the configuration. Joins and parameters
//! are collected in an [`Accumulator`] that lives for one `prepare` call and is
//! consumed when the query is finalized, so preparing twice never leaks state.

use std::collections::HashMap;

use super::errors::{MappingError, PrepareError};
use super::join_finder::{ColumnRef, Join, JoinFinder, ResolvedPath, Terminal};
use super::query::{OrderByItem, PreparedQuery, QueryRequest, Slice, ValidSlice};
use super::schema::SchemaProvider;
use super::to_dql::{escape_like, DqlExpr, Operator, ParameterStyle};
use crate::config::EngineConfig;
use crate::expression::{ComparisonOp, Condition, Expression, SortMethod};
use crate::property_path::PropertyPath;
use crate::value::Value;

pub struct QueryPreparer<'s, S: ?Sized> {
    schema: &'s S,
    config: EngineConfig,
}

impl<'s, S: SchemaProvider + ?Sized> QueryPreparer<'s, S> {
    pub fn new(schema: &'s S) -> Self {
        Self::with_config(schema, EngineConfig::default())
    }

    pub fn with_config(schema: &'s S, config: EngineConfig) -> Self {
        QueryPreparer { schema, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn prepare(&self, request: &QueryRequest) -> Result<PreparedQuery, PrepareError> {
        self.prepare_parts(
            &request.entity,
            &request.conditions,
            &request.sort,
            request.slice(),
        )
    }

    pub fn prepare_parts(
        &self,
        entity: &str,
        conditions: &[Condition],
        sort_methods: &[SortMethod],
        slice: Slice,
    ) -> Result<PreparedQuery, PrepareError> {
        let slice = slice
            .validate()
            .inspect_err(|e| log::warn!("QueryPreparer: rejected slice for {}: {}", entity, e))?;

        self.accumulate(entity, conditions, sort_methods, slice)
            .inspect_err(|e| log::warn!("QueryPreparer: cannot map query on {}: {}", entity, e))
            .map_err(PrepareError::from)
    }

    fn accumulate(
        &self,
        entity: &str,
        conditions: &[Condition],
        sort_methods: &[SortMethod],
        slice: ValidSlice,
    ) -> Result<PreparedQuery, MappingError> {
        let mut accumulator = Accumulator::new(self, entity)?;

        let filter = if conditions.is_empty() {
            None
        } else {
            let compiled = conditions
                .iter()
                .map(|condition| accumulator.compile(condition))
                .collect::<Result<Vec<_>, _>>()?;
            Some(DqlExpr::junction(Operator::And, compiled))
        };
        let order_by = sort_methods
            .iter()
            .map(|method| accumulator.order_by_item(method))
            .collect::<Result<Vec<_>, _>>()?;

        let query = accumulator.finalize(filter, order_by, slice);
        log::debug!(
            "QueryPreparer: {} with {} join(s), {} parameter(s), {} sort key(s)",
            query.entity,
            query.joins.len(),
            query.parameters.len(),
            query.order_by.len()
        );
        Ok(query)
    }
}

/// Per-call state of one preparation.
struct Accumulator<'s, S: ?Sized> {
    finder: JoinFinder<'s, S>,
    entity: String,
    root_alias: String,
    style: ParameterStyle,
    joins: Vec<Join>,
    /// Source association of every join taken so far, by alias.
    aliases: HashMap<String, ColumnRef>,
    parameters: Vec<Value>,
}

impl<'s, S: SchemaProvider + ?Sized> Accumulator<'s, S> {
    fn new(preparer: &QueryPreparer<'s, S>, entity: &str) -> Result<Self, MappingError> {
        if preparer.schema.table_name(entity).is_none() {
            return Err(MappingError::UnknownEntity {
                entity: entity.to_string(),
            });
        }
        let config = &preparer.config;
        Ok(Accumulator {
            finder: JoinFinder::new(
                preparer.schema,
                config.alias_hash_length,
                config.default_join_type,
            ),
            entity: entity.to_string(),
            root_alias: config.root_alias.clone(),
            style: config.parameter_style,
            joins: Vec::new(),
            aliases: HashMap::new(),
            parameters: Vec::new(),
        })
    }

    fn finalize(
        self,
        filter: Option<DqlExpr>,
        order_by: Vec<OrderByItem>,
        slice: ValidSlice,
    ) -> PreparedQuery {
        PreparedQuery {
            entity: self.entity,
            root_alias: self.root_alias,
            joins: self.joins,
            filter,
            order_by,
            parameters: self.parameters,
            slice,
        }
    }

    fn bind(&mut self, value: Value) -> DqlExpr {
        let placeholder = self.style.placeholder(self.parameters.len());
        self.parameters.push(value);
        DqlExpr::Parameter(placeholder)
    }

    fn resolve(&mut self, path: &PropertyPath) -> Result<ResolvedPath, MappingError> {
        let resolved = self.finder.find_joins(&self.entity, &self.root_alias, path)?;
        for join in &resolved.joins {
            self.merge_join(join)?;
        }
        Ok(resolved)
    }

    /// Joins with equal aliases are one join. An alias already taken by a different
    /// association means the shortened path hashes collided.
    fn merge_join(&mut self, join: &Join) -> Result<(), MappingError> {
        match self.aliases.get(&join.table_alias) {
            Some(source) if *source == join.source => {
                log::trace!("QueryPreparer: reusing join {}", join.table_alias);
                Ok(())
            }
            Some(source) => Err(MappingError::AliasCollision {
                alias: join.table_alias.clone(),
                first: source.to_string(),
                second: join.source.to_string(),
            }),
            None => {
                self.aliases
                    .insert(join.table_alias.clone(), join.source.clone());
                self.joins.push(join.clone());
                Ok(())
            }
        }
    }

    fn order_by_item(&mut self, method: &SortMethod) -> Result<OrderByItem, MappingError> {
        let resolved = self.resolve(&method.path)?;
        Ok(OrderByItem {
            expression: DqlExpr::Column(resolved.column),
            direction: method.direction,
        })
    }

    fn compile_all(&mut self, children: &[Expression]) -> Result<Vec<DqlExpr>, MappingError> {
        children.iter().map(|child| self.compile(child)).collect()
    }

    /// A path ending in a directly referenced to-many relationship.
    fn collection(&mut self, expression: &Expression) -> Result<DqlExpr, MappingError> {
        let Expression::Property { path } = expression else {
            return Err(MappingError::NotACollection {
                path: expression.to_string(),
            });
        };
        let resolved = self.resolve(path)?;
        match resolved.terminal {
            Terminal::Relationship { to_many: true } => Ok(DqlExpr::Column(resolved.column)),
            _ => Err(MappingError::NotACollection { path: path.dotted() }),
        }
    }

    /// LIKE pattern for a needle; constant strings are escaped and bound whole.
    fn like_pattern(
        &mut self,
        needle: &Expression,
        case_insensitive: bool,
        leading: bool,
        trailing: bool,
    ) -> Result<(DqlExpr, bool), MappingError> {
        let wildcard = |on: bool| if on { "%" } else { "" };

        if let Expression::Constant {
            value: Value::String(s),
        } = needle
        {
            let s = if case_insensitive { s.to_lowercase() } else { s.clone() };
            let pattern = format!("{}{}{}", wildcard(leading), escape_like(&s), wildcard(trailing));
            return Ok((self.bind(Value::String(pattern)), true));
        }

        let mut needle = self.compile(needle)?;
        if case_insensitive {
            needle = DqlExpr::call("LOWER", vec![needle]);
        }
        // Same escaping as `escape_like`, done by the backend. Backslash goes first.
        for special in ["\\", "%", "_"] {
            needle = DqlExpr::call(
                "REPLACE",
                vec![
                    needle,
                    DqlExpr::StringLiteral(special.to_string()),
                    DqlExpr::StringLiteral(format!("\\{}", special)),
                ],
            );
        }
        let mut parts = Vec::with_capacity(3);
        if leading {
            parts.push(DqlExpr::StringLiteral("%".to_string()));
        }
        parts.push(needle);
        if trailing {
            parts.push(DqlExpr::StringLiteral("%".to_string()));
        }
        Ok((DqlExpr::call("CONCAT", parts), true))
    }

    fn string_match(
        &mut self,
        haystack: &Expression,
        needle: &Expression,
        case_insensitive: bool,
        leading: bool,
        trailing: bool,
    ) -> Result<DqlExpr, MappingError> {
        let mut haystack = self.compile(haystack)?;
        if case_insensitive {
            haystack = DqlExpr::call("LOWER", vec![haystack]);
        }
        let (pattern, escaped) = self.like_pattern(needle, case_insensitive, leading, trailing)?;
        Ok(DqlExpr::apply(Operator::Like { escaped }, vec![haystack, pattern]))
    }

    fn compile(&mut self, expression: &Expression) -> Result<DqlExpr, MappingError> {
        match expression {
            Expression::Constant { value } => Ok(self.bind(value.clone())),
            Expression::Property { path } => Ok(DqlExpr::Column(self.resolve(path)?.column)),
            Expression::AllEqual { children } => {
                // Fewer than two operands are trivially equal.
                if children.len() < 2 {
                    return Ok(DqlExpr::Truth(true));
                }
                let operands = self.compile_all(children)?;
                let (first, rest) = operands.split_at(1);
                let equalities = rest
                    .iter()
                    .map(|other| DqlExpr::apply(Operator::Equal, vec![first[0].clone(), other.clone()]))
                    .collect();
                Ok(DqlExpr::junction(Operator::And, equalities))
            }
            Expression::AllTrue { children } => {
                let operands = self.compile_all(children)?;
                Ok(DqlExpr::junction(Operator::And, operands))
            }
            Expression::AnyTrue { children } => {
                let operands = self.compile_all(children)?;
                Ok(DqlExpr::junction(Operator::Or, operands))
            }
            Expression::Not { child } => {
                let operand = self.compile(child)?;
                Ok(DqlExpr::apply(Operator::Not, vec![operand]))
            }
            Expression::IsNull { child } => {
                let operand = self.compile(child)?;
                Ok(DqlExpr::apply(Operator::IsNull, vec![operand]))
            }
            Expression::Between { min, max, target } => {
                let min = self.compile(min)?;
                let max = self.compile(max)?;
                let target = self.compile(target)?;
                Ok(DqlExpr::apply(Operator::Between, vec![target, min, max]))
            }
            Expression::Compare { op, left, right } => {
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                let operator = match op {
                    ComparisonOp::Less => Operator::LessThan,
                    ComparisonOp::LessEquals => Operator::LessThanEqual,
                    ComparisonOp::Greater => Operator::GreaterThan,
                    ComparisonOp::GreaterEquals => Operator::GreaterThanEqual,
                };
                Ok(DqlExpr::apply(operator, vec![left, right]))
            }
            Expression::OneOf { target, values } => {
                let target = self.compile(target)?;
                if values.is_empty() {
                    return Ok(DqlExpr::Truth(false));
                }
                let mut operands = vec![target];
                operands.extend(self.compile_all(values)?);
                Ok(DqlExpr::apply(Operator::In, operands))
            }
            Expression::Size { target } => {
                let collection = self.collection(target)?;
                Ok(DqlExpr::call("SIZE", vec![collection]))
            }
            Expression::StringContains {
                haystack,
                needle,
                case_insensitive,
            } => self.string_match(haystack, needle, *case_insensitive, true, true),
            Expression::StringStartsWith {
                haystack,
                needle,
                case_insensitive,
            } => self.string_match(haystack, needle, *case_insensitive, false, true),
            Expression::StringEndsWith {
                haystack,
                needle,
                case_insensitive,
            } => self.string_match(haystack, needle, *case_insensitive, true, false),
            Expression::IsMemberOf { collection, value } => {
                let collection = self.collection(collection)?;
                let value = self.compile(value)?;
                Ok(DqlExpr::apply(Operator::MemberOf, vec![value, collection]))
            }
            Expression::LowerCase { child } => {
                let operand = self.compile(child)?;
                Ok(DqlExpr::call("LOWER", vec![operand]))
            }
            Expression::UpperCase { child } => {
                let operand = self.compile(child)?;
                Ok(DqlExpr::call("UPPER", vec![operand]))
            }
        }
    }
}
