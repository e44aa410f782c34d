//! memdb - an embeddable, in-memory SQL-dialect engine
//!
//! This crate provides:
//! - SQL parsing (lexer, parser, AST) for an upper-cased dialect
//! - Normalisation and planning of continuation commands
//! - Execution over a catalog of column-oriented tables
//! - File and line-stream drivers

pub mod driver;
pub mod error;
pub mod sql;

pub use error::{Error, Result};
pub use sql::{
    engine::{Catalog, Engine, Evaluation, MemoryCatalog},
    executor::ResultSet,
    parser::parse,
};
