//! CLI command implementations

pub(crate) mod fake;
pub(crate) mod migrate;
pub(crate) mod show_migrations;
