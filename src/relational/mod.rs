//! Compilation of conditions and sort methods into relational (DQL) queries.
//!
//! The pipeline is `QueryRequest -> QueryPreparer -> PreparedQuery -> ToDql`. Paths are
//! mapped onto the schema by [`JoinFinder`], which names each join after the path's
//! salt and prefix so identical prefixes share a join.

pub mod alias;
pub mod errors;
pub mod join_finder;
pub mod query;
pub mod query_preparer;
pub mod schema;
pub mod to_dql;

pub use alias::join_alias;
pub use errors::{CatalogError, MappingError, PrepareError, SliceError};
pub use join_finder::{ColumnRef, Join, JoinFinder, JoinType, ResolvedPath, Terminal};
pub use query::{OrderByItem, PreparedQuery, QueryRequest, Slice, ValidSlice};
pub use query_preparer::QueryPreparer;
pub use schema::{EntityCatalog, EntityCatalogConfig, FieldKind, SchemaProvider};
pub use to_dql::{DqlExpr, ParameterStyle, ToDql};
