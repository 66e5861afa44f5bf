//! Discovery of versions and migration files under the migrations root.

use crate::config::Settings;
use crate::error::{CoreError, CoreResult};
use crate::version::Version;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the per-version folder holding manual migrations
pub const MANUAL_DIR: &str = "manual";

const MIGRATION_SUFFIXES: &[&str] = &["ddl.sql", "dml.sql"];

/// A migration file found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFile {
    /// Version directory the file belongs to
    pub version: Version,
    /// File name, used as the migration name in the ledger
    pub name: String,
    /// Path to the file
    pub path: PathBuf,
    /// Whether the file runs as block-structured manual migration
    pub is_manual: bool,
}

/// Migration files of one version, keyed (and therefore sorted) by name
pub type VersionMigrations = BTreeMap<String, MigrationFile>;

/// Snapshot of the migration tree
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    versions: Vec<Version>,
    migrations: BTreeMap<Version, VersionMigrations>,
}

impl Catalog {
    /// Scan the migrations root described by `settings`.
    pub fn scan(settings: &Settings) -> CoreResult<Self> {
        let root = settings.migrations_root.clone();
        let versions = known_versions(&root)?;

        let mut migrations = BTreeMap::new();
        for version in &versions {
            let files = migrations_for_version(
                &root,
                version,
                &settings.block_marker,
                settings.ignore_symlinks,
            )?;
            migrations.insert(version.clone(), files);
        }

        log::debug!(
            "Catalog at {}: {} versions",
            root.display(),
            versions.len()
        );

        Ok(Self {
            root,
            versions,
            migrations,
        })
    }

    /// Build a catalog from already known data.
    pub fn from_parts(root: PathBuf, migrations: BTreeMap<Version, VersionMigrations>) -> Self {
        let versions = migrations.keys().cloned().collect();
        Self {
            root,
            versions,
            migrations,
        }
    }

    /// Root of the migration tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Known versions, ascending
    pub fn known_versions(&self) -> &[Version] {
        &self.versions
    }

    /// Whether `version` has a directory in the tree
    pub fn contains(&self, version: &Version) -> bool {
        self.migrations.contains_key(version)
    }

    /// Last known version
    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// Migrations of a single version
    pub fn migrations(&self, version: &Version) -> Option<&VersionMigrations> {
        self.migrations.get(version)
    }

    /// Migrations of every version
    pub fn all_migrations(&self) -> &BTreeMap<Version, VersionMigrations> {
        &self.migrations
    }

    /// File names in `schemas/`. The folder is required.
    pub fn known_schemas(&self) -> CoreResult<Vec<String>> {
        let dir = self.root.join("schemas");
        list_files(&dir).map_err(|e| {
            CoreError::configuration(format!(
                "cannot list schemas folder {}: {}",
                dir.display(),
                e
            ))
        })
    }

    /// File names in `fixtures/`. A missing folder means no fixtures.
    pub fn known_fixtures(&self) -> Vec<String> {
        list_files(&self.root.join("fixtures")).unwrap_or_default()
    }
}

/// Directory names under `root` that parse as versions, ascending.
///
/// Symlinked directories and non-version folders (`schemas`, `fixtures`, ...)
/// are skipped.
fn known_versions(root: &Path) -> CoreResult<Vec<Version>> {
    let entries = std::fs::read_dir(root).map_err(|e| {
        CoreError::configuration(format!(
            "migrations_root {} cannot be read: {}",
            root.display(),
            e
        ))
    })?;

    let mut versions: Vec<Version> = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() || file_type.is_symlink() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        match Version::from_string(name) {
            Ok(version) => {
                if let Some(existing) = versions.iter().find(|v| **v == version) {
                    return Err(CoreError::configuration(format!(
                        "directories '{}' and '{}' name the same version",
                        existing, version
                    )));
                }
                versions.push(version);
            }
            Err(_) => log::debug!("Skipping {}: not a version directory", name),
        }
    }

    versions.sort();
    Ok(versions)
}

fn is_migration_name(name: &str) -> bool {
    MIGRATION_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Migration files for a version, including its `manual/` folder.
///
/// A manual file shadows an automatic file with the same name.
fn migrations_for_version(
    root: &Path,
    version: &Version,
    marker: &str,
    ignore_symlinks: bool,
) -> CoreResult<VersionMigrations> {
    let version_root = root.join(version.as_str());
    let auto = list_migration_files(&version_root, ignore_symlinks).map_err(|e| {
        CoreError::configuration(format!(
            "no sql folder found for version {}: {}",
            version, e
        ))
    })?;
    let manual =
        list_migration_files(&version_root.join(MANUAL_DIR), ignore_symlinks).unwrap_or_default();

    let mut migrations = BTreeMap::new();
    let files = auto
        .into_iter()
        .map(|path| (path, false))
        .chain(manual.into_iter().map(|path| (path, true)));
    for (path, from_manual_dir) in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };
        let is_manual = from_manual_dir || is_manual_migration(&path, marker)?;
        migrations.insert(
            name.clone(),
            MigrationFile {
                version: version.clone(),
                name,
                path,
                is_manual,
            },
        );
    }
    Ok(migrations)
}

fn list_migration_files(dir: &Path, ignore_symlinks: bool) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if ignore_symlinks && entry.file_type().is_ok_and(|t| t.is_symlink()) {
            log::debug!("Ignoring symlinked migration {}", path.display());
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_migration_name)
        {
            files.push(path);
        }
    }
    Ok(files)
}

fn list_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)?.flatten() {
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Whether a migration must run as a manual, block-structured script.
///
/// Files directly inside a `manual/` folder always are. Elsewhere, only
/// `*dml.sql` files are, and only when a line carries the `<marker>:` control
/// prefix.
pub fn is_manual_migration(path: &Path, marker: &str) -> CoreResult<bool> {
    let in_manual_dir = path
        .parent()
        .and_then(|parent| parent.file_name())
        .is_some_and(|name| name == MANUAL_DIR);
    if in_manual_dir {
        return Ok(true);
    }

    let is_dml = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("dml.sql"));
    if !is_dml {
        return Ok(false);
    }

    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(contains_marker(&content, marker))
}

/// Whether any line of `content` holds a `<marker>:` control prefix
pub fn contains_marker(content: &str, marker: &str) -> bool {
    let needle = format!("{}:", marker);
    content.lines().any(|line| line.contains(&needle))
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
