//! pathquery - conditions and sort orders over property paths
//!
//! One condition tree, two evaluation modes:
//! - in memory, by walking object graphs through a property accessor
//!   ([`in_memory::ConditionEvaluator`], [`in_memory::Sorter`])
//! - relationally, by compiling to a DQL query with joins and bound parameters
//!   ([`relational::QueryPreparer`])
//!
//! Both modes agree on null handling (three-valued logic) and on how to-many
//! relationships fan out, so a condition selects the same objects either way.

pub mod config;
pub mod expression;
pub mod in_memory;
pub mod property_path;
pub mod relational;
pub mod value;
