//! sw-db - Database layer for Stepwise
//!
//! This crate provides the `Database` trait used by the script runner, its
//! DuckDB implementation, and the ledger that records applied migrations.

pub mod duckdb;
pub mod error;
pub mod ledger;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::DbError;
pub use ledger::{quote_identifier, AppliedRecord, DuckDbLedger, Ledger, LedgerTable, MigrationStatus};
pub use traits::Database;
