//! sw-core - Core library for Stepwise
//!
//! This crate provides the version model, strongly typed settings, the
//! migration file catalog and the pure migration plan builder shared by all
//! Stepwise components.

pub mod catalog;
pub mod config;
pub mod error;
pub mod plan;
pub mod version;

pub use catalog::{is_manual_migration, Catalog, MigrationFile};
pub use config::{log_level, render_template, Dialect, PartialSettings, Settings};
pub use error::CoreError;
pub use plan::{build_migration_plan, closest_version, Operation, PlanEntry, PlanInput};
pub use version::Version;
