//! Fake command implementation

use anyhow::{Context, Result};
use sw_core::Version;

use crate::cli::{FakeArgs, GlobalArgs};
use crate::context::RuntimeContext;

/// Execute the fake command
pub async fn execute(args: &FakeArgs, global: &GlobalArgs) -> Result<()> {
    let version = Version::from_string(&args.version)
        .with_context(|| format!("Invalid version '{}'", args.version))?;

    let ctx = RuntimeContext::new(global)?;
    let migrator = ctx.migrator();

    migrator
        .prepare_ledger()
        .await
        .context("Failed to prepare migration table")?;
    let faked = migrator
        .create_fake_entries(&version)
        .await
        .with_context(|| format!("Failed to fake migrations up to {}", version))?;

    if !global.quiet {
        println!("\nFaked {} migration(s) up to version {}", faked, version);
    }
    Ok(())
}
