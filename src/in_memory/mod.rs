//! In-memory evaluation of conditions and sort methods against object graphs.

pub mod accessor;
pub mod errors;
pub mod evaluator;
pub mod sorter;
pub mod table_joiner;

pub use accessor::{Item, JsonAccessor, PropertyAccessor};
pub use errors::{AccessError, EvaluationError, SortError};
pub use evaluator::ConditionEvaluator;
pub use sorter::Sorter;
pub use table_joiner::{TableJoiner, ValueRow};
