//! sw-migrate - Migration engine for Stepwise
//!
//! This crate runs migration scripts against a [`sw_db::Database`] and
//! drives a whole migration: initial schema load, faked history, the
//! migration plan and its ledger records.

pub mod error;
pub mod migrator;
pub mod reporter;
pub mod runner;

pub use error::MigrateError;
pub use migrator::{MigrateSummary, MigrationReport, Migrator, ReportEntry, VersionReport};
pub use reporter::{NoopReporter, Reporter};
pub use runner::{PreparedBlock, PreparedScript, RunSummary, ScriptRunner};
