//! Unit tests - public API behaviour of single components, no files involved

mod expression_document_tests;
mod property_path_tests;
mod table_joiner_tests;
