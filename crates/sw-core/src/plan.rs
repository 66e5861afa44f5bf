//! Migration plan computation.
//!
//! Merges what the catalog knows (files on disk) with what the ledger knows
//! (applied migrations) into an ordered, per-version list of operations.
//! Nothing in here touches the disk or the database.

use crate::catalog::VersionMigrations;
use crate::config::render_template;
use crate::error::{CoreError, CoreResult};
use crate::version::Version;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

/// One migration file of a plan entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// Migration file name
    pub name: String,
    /// Whether the ledger already records it
    pub applied: bool,
    /// Path of the file to run
    pub path: PathBuf,
    /// Whether it runs as a manual, block-structured script
    pub is_manual: bool,
}

/// All operations of one version, sorted by file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub version: Version,
    pub operations: Vec<Operation>,
}

impl PlanEntry {
    /// Operations not yet recorded in the ledger
    pub fn pending(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| !op.applied)
    }
}

/// Everything the plan builder needs, already loaded
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    /// Known versions, ascending
    pub known_versions: &'a [Version],
    /// Migration files per version
    pub migrations: &'a BTreeMap<Version, VersionMigrations>,
    /// Applied migration names per version
    pub applied: &'a HashMap<Version, HashSet<String>>,
    /// Last version to include, `None` for the latest known one
    pub target: Option<&'a Version>,
    /// Baseline version, excluded from the plan
    pub start: Option<&'a Version>,
}

/// Known versions up to and including `target`.
///
/// Fails when `target` is not a known version.
pub fn versions_until<'a>(known: &'a [Version], target: &Version) -> CoreResult<&'a [Version]> {
    match known.iter().position(|v| v == target) {
        Some(index) => Ok(&known[..=index]),
        None => Err(CoreError::configuration(format!(
            "target_version: version {} not found",
            target
        ))),
    }
}

/// Known versions in `(start, target]`, ascending.
pub fn versions_to_apply(
    known: &[Version],
    start: Option<&Version>,
    target: Option<&Version>,
) -> CoreResult<Vec<Version>> {
    let until = match target {
        Some(target) => versions_until(known, target)?,
        None => known,
    };

    Ok(until
        .iter()
        .filter(|v| start.map_or(true, |start| *v > start))
        .cloned()
        .collect())
}

/// Build the migration plan. Yields one entry per version, even when the
/// version has no migration files.
pub fn build_migration_plan(input: &PlanInput<'_>) -> CoreResult<Vec<PlanEntry>> {
    let versions = versions_to_apply(input.known_versions, input.start, input.target)?;
    let no_applied = HashSet::new();

    let plan = versions
        .into_iter()
        .map(|version| {
            let applied = input.applied.get(&version).unwrap_or(&no_applied);
            // BTreeMap iteration is sorted by file name
            let operations = input
                .migrations
                .get(&version)
                .map(|files| {
                    files
                        .values()
                        .map(|file| Operation {
                            name: file.name.clone(),
                            applied: applied.contains(&file.name),
                            path: file.path.clone(),
                            is_manual: file.is_manual,
                        })
                        .collect()
                })
                .unwrap_or_default();
            PlanEntry {
                version,
                operations,
            }
        })
        .collect();

    Ok(plan)
}

/// Pick the version of a schema or fixtures file to initialize a database.
///
/// Walks the known versions at or below `target`, newest first, and returns
/// the first one whose rendered `template` appears in `existing_files`. A
/// `forced` version short-circuits the search: it must not be newer than
/// `target`, and it is returned only when its file exists.
pub fn closest_version(
    known: &[Version],
    target: &Version,
    template: &str,
    existing_files: &[String],
    forced: Option<&Version>,
) -> CoreResult<Option<Version>> {
    let previous = versions_until(known, target)?;
    let exists = |version: &Version| {
        let file = render_template(template, version);
        existing_files.iter().any(|f| *f == file)
    };

    if let Some(forced) = forced {
        let Some(forced) = previous.iter().find(|v| *v == forced) else {
            return Err(CoreError::configuration(format!(
                "schema_version {} is more recent than target_version {} or unknown",
                forced, target
            )));
        };
        return Ok(exists(forced).then(|| forced.clone()));
    }

    Ok(previous.iter().rev().find(|v| exists(*v)).cloned())
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
