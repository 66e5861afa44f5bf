//! Migrate command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::context::RuntimeContext;

/// Execute the migrate command
pub async fn execute(_args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let migrator = ctx.migrator();

    let summary = migrator.migrate().await.context("Migration failed")?;

    if !global.quiet {
        if let Some(version) = &summary.schema_version {
            println!("\nSchema {} loaded", version);
        }
        println!(
            "\nMigrations complete: {} applied, {} already applied, {} rows affected",
            summary.applied, summary.skipped, summary.affected_rows
        );
    }
    Ok(())
}
