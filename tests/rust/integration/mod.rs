//! Integration tests - conditions evaluated in memory and compiled against a catalog
//!
//! These tests check that both evaluation modes select the same objects and that
//! catalogs and configuration load from files.

mod compile_from_files_tests;
mod mode_parity_tests;
