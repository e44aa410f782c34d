//! SQL processing module
//!
//! This module provides:
//! - `parser`: lexer, parser and AST of the dialect
//! - `types`: column types and values
//! - `schema`: column-oriented table storage
//! - `plan`: normalisation and execution plan generation
//! - `executor`: query and mutation execution
//! - `engine`: catalog abstraction and the engine owning it

pub mod engine;
pub mod executor;
pub mod parser;
pub mod plan;
pub mod schema;
pub mod types;
