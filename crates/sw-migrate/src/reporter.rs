//! Progress events of a migration run.

use crate::error::MigrateError;
use crate::runner::RunSummary;
use sw_core::Version;

/// Receives progress events. Every method defaults to doing nothing.
pub trait Reporter: Send + Sync {
    /// A new phase starts ("Loading schema", "Applying migrations", ...)
    fn title(&self, _text: &str) {}

    /// Migrations of `version` follow
    fn version(&self, _version: &Version) {}

    /// A script is about to run
    fn migration_started(&self, _label: &str) {}

    /// A script ran to completion
    fn migration_applied(&self, _label: &str, _summary: &RunSummary) {}

    /// A migration is already in the ledger
    fn migration_skipped(&self, _label: &str) {}

    /// A script failed
    fn migration_failed(&self, _label: &str, _error: &MigrateError) {}

    /// A migration was recorded without running
    fn migration_faked(&self, _version: &Version, _name: &str) {}
}

/// Reporter that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {}
