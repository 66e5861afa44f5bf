//! Show-migrations command implementation

use anyhow::{Context, Result};
use std::fmt::Write;
use sw_migrate::MigrationReport;

use crate::cli::{GlobalArgs, OutputFormat, ShowMigrationsArgs};
use crate::context::RuntimeContext;

/// Execute the show-migrations command
pub async fn execute(args: &ShowMigrationsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let report = load_report(&ctx).await?;

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize migration report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", render_text(&report)),
    }
    Ok(())
}

/// Read the migration state without touching the database schema
async fn load_report(ctx: &RuntimeContext) -> Result<MigrationReport> {
    ctx.migrator()
        .describe()
        .await
        .context("Failed to read migration state")
}

/// Text rendering of a migration report, one checkbox line per migration
fn render_text(report: &MigrationReport) -> String {
    let mut out = String::new();

    match &report.current_version {
        Some(v) => {
            let _ = writeln!(out, "Current version is {}", v);
        }
        None => {
            let _ = writeln!(out, "No migration applied yet");
        }
    }
    match &report.target_version {
        Some(v) => {
            let _ = writeln!(out, "Target version is {}", v);
        }
        None => {
            let _ = writeln!(out, "No migration available");
        }
    }

    for version in &report.versions {
        let _ = writeln!(out, "\nVersion {}", version.version);
        for entry in &version.migrations {
            let checkbox = if entry.applied { "[X]" } else { "[ ]" };
            let mut line = format!("  {} {}", checkbox, entry.name);
            if entry.is_manual {
                line.push_str(" (manual)");
            }
            if entry.partial {
                line.push_str(" (partially applied)");
            }
            let _ = writeln!(out, "{}", line);
        }
    }
    out
}

#[cfg(test)]
#[path = "show_migrations_test.rs"]
mod tests;
