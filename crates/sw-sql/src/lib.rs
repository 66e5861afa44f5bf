//! sw-sql - SQL layer for Stepwise
//!
//! This crate splits migration files into statements with the sqlparser-rs
//! tokenizer, classifies those statements, and parses the block structure of
//! manual migrations.

pub mod dialect;
pub mod error;
pub mod script;
pub mod splitter;

pub use dialect::{DuckDbDialect, PostgresDialect, SqlDialect};
pub use error::SqlError;
pub use script::{Block, BlockKind, Script, ScriptOptions};
pub use splitter::{
    verify_round_trip, SqlStatement, StatementKind, StatementSplitter,
    TokenSplitter,
};
