//! Orchestration of a migration run.
//!
//! An empty ledger is first initialized from the closest schema file, with
//! every older migration recorded as applied. The plan from the baseline up to
//! the target version is then executed in order, recording each migration
//! only once its script succeeded.

use crate::error::MigrateResult;
use crate::reporter::{NoopReporter, Reporter};
use crate::runner::ScriptRunner;
use serde::Serialize;
use std::path::{Path, PathBuf};
use sw_core::plan::versions_until;
use sw_core::{
    build_migration_plan, closest_version, is_manual_migration, Catalog, CoreError, Operation,
    PlanEntry, PlanInput, Settings, Version,
};
use sw_db::{Database, Ledger, MigrationStatus};
use sw_sql::StatementSplitter;

static NOOP_REPORTER: NoopReporter = NoopReporter;

/// Outcome of [`Migrator::migrate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateSummary {
    /// Schema version loaded when the ledger was empty
    pub schema_version: Option<Version>,
    /// Migrations run and recorded
    pub applied: usize,
    /// Migrations already in the ledger
    pub skipped: usize,
    /// Rows affected by the migrations run
    pub affected_rows: usize,
}

/// State of the migrations up to the target version
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub current_version: Option<Version>,
    pub target_version: Option<Version>,
    pub versions: Vec<VersionReport>,
}

/// Migrations of one version
#[derive(Debug, Clone, Serialize)]
pub struct VersionReport {
    pub version: Version,
    pub migrations: Vec<ReportEntry>,
}

/// One migration file and its ledger state
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub applied: bool,
    /// A previous run failed after committing part of the file
    pub partial: bool,
    pub is_manual: bool,
    pub path: PathBuf,
}

/// Drives migrations against one database and its ledger
pub struct Migrator<'a> {
    settings: &'a Settings,
    catalog: &'a Catalog,
    db: &'a dyn Database,
    ledger: &'a dyn Ledger,
    runner: ScriptRunner<'a>,
    reporter: &'a dyn Reporter,
}

impl<'a> Migrator<'a> {
    pub fn new(
        settings: &'a Settings,
        catalog: &'a Catalog,
        db: &'a dyn Database,
        ledger: &'a dyn Ledger,
        splitter: &'a dyn StatementSplitter,
    ) -> Self {
        Self {
            settings,
            catalog,
            db,
            ledger,
            runner: ScriptRunner::new(splitter, settings),
            reporter: &NOOP_REPORTER,
        }
    }

    /// Send progress events to `reporter`
    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Configured target version, or the latest known one
    pub fn target_version(&self) -> Option<&'a Version> {
        self.settings
            .target_version
            .as_ref()
            .or_else(|| self.catalog.latest())
    }

    /// Version of the schema file used to initialize an empty database.
    pub fn best_schema_version(&self) -> MigrateResult<Version> {
        let not_found = || CoreError::configuration("Cannot find a schema to init the DB.");
        let target = self.target_version().ok_or_else(not_found)?;
        let schemas = self.catalog.known_schemas()?;
        let version = closest_version(
            self.catalog.known_versions(),
            target,
            &self.settings.schema_template,
            &schemas,
            self.settings.schema_version.as_ref(),
        )?;
        Ok(version.ok_or_else(not_found)?)
    }

    /// Create the ledger table when configured to
    pub async fn prepare_ledger(&self) -> MigrateResult<()> {
        if self.settings.create_table {
            self.ledger.create_table().await?;
        }
        Ok(())
    }

    /// Bring the database to the target version.
    pub async fn migrate(&self) -> MigrateResult<MigrateSummary> {
        log::info!("Starting migrations");
        self.prepare_ledger().await?;

        let mut summary = MigrateSummary::default();
        let baseline = if self.ledger.is_initialized().await? {
            self.baseline().await?
        } else {
            log::info!("Migration table is empty, loading a schema");
            let version = self.best_schema_version()?;
            self.init_schema(&version).await?;
            summary.schema_version = Some(version.clone());
            Some(version)
        };

        let plan = self.plan(baseline.as_ref()).await?;
        self.reporter.title("Applying migrations");

        for entry in &plan {
            log::info!("Processing version {}", entry.version);
            self.reporter.version(&entry.version);

            for operation in &entry.operations {
                log::debug!(
                    "Processing migration {}, applied: {}, path: {}, manual: {}",
                    operation.name,
                    operation.applied,
                    operation.path.display(),
                    operation.is_manual
                );
                let label = operation_label(operation);
                if operation.applied {
                    self.reporter.migration_skipped(&label);
                    summary.skipped += 1;
                    continue;
                }

                self.reporter.migration_started(&label);
                let run = match self
                    .runner
                    .run_file(self.db, &operation.path, operation.is_manual)
                    .await
                {
                    Ok(run) => run,
                    Err(e) => {
                        self.reporter.migration_failed(&label, &e);
                        if e.is_partially_applied() {
                            self.record_partial(&entry.version, &operation.name).await;
                        }
                        return Err(e);
                    }
                };

                log::info!("Saving operation in the database");
                self.ledger
                    .record(&entry.version, &operation.name, MigrationStatus::Applied)
                    .await?;
                self.reporter.migration_applied(&label, &run);
                summary.applied += 1;
                summary.affected_rows += run.affected_rows;
            }
        }

        log::info!(
            "Applied {} migration(s), {} already applied",
            summary.applied,
            summary.skipped
        );
        Ok(summary)
    }

    /// Highest applied version, or the known version before it when some of
    /// its migrations are still pending.
    async fn baseline(&self) -> MigrateResult<Option<Version>> {
        let Some(current) = self.ledger.current_version().await? else {
            return Ok(None);
        };
        let applied = self.ledger.applied_migrations(&current).await?;
        let pending = self
            .catalog
            .migrations(&current)
            .is_some_and(|files| files.keys().any(|name| !applied.contains(name)));
        if !pending {
            return Ok(Some(current));
        }

        log::info!("Version {} is not fully applied, resuming it", current);
        Ok(self
            .catalog
            .known_versions()
            .iter()
            .rev()
            .find(|v| **v < current)
            .cloned())
    }

    async fn record_partial(&self, version: &Version, name: &str) {
        log::warn!("Migration {} was partially applied", name);
        if let Err(e) = self
            .ledger
            .record(version, name, MigrationStatus::Partial)
            .await
        {
            log::error!("Cannot record partial migration {}: {}", name, e);
        }
    }

    /// Plan from `start` (excluded) to the target version
    pub async fn plan(&self, start: Option<&Version>) -> MigrateResult<Vec<PlanEntry>> {
        let applied = self.ledger.all_applied().await?;
        let plan = build_migration_plan(&PlanInput {
            known_versions: self.catalog.known_versions(),
            migrations: self.catalog.all_migrations(),
            applied: &applied,
            target: self.settings.target_version.as_ref(),
            start,
        })?;
        Ok(plan)
    }

    /// Load the schema of `version` into an empty database: before-schema
    /// files, additional files, the schema file itself, faked history,
    /// after-schema files and finally the closest fixtures.
    pub async fn init_schema(&self, version: &Version) -> MigrateResult<()> {
        log::info!("Looking for additional files to run");
        self.reporter.title("Loading schema");

        for file_name in &self.settings.before_schema_files {
            self.run_schema_file(file_name).await?;
        }

        if !self.settings.additional_schema_files.is_empty() {
            log::warn!(
                "additional_schema_files is deprecated, use before_schema_files instead"
            );
        }
        for file_name in &self.settings.additional_schema_files {
            self.run_schema_file(file_name).await?;
        }

        let schema_file = self.settings.schema_file_name(version);
        self.run_schema_file(&schema_file).await?;

        self.create_fake_entries(version).await?;

        for file_name in &self.settings.after_schema_files {
            self.run_schema_file(file_name).await?;
        }

        self.load_fixtures(version).await?;
        Ok(())
    }

    async fn run_schema_file(&self, file_name: &str) -> MigrateResult<()> {
        if file_name.is_empty() {
            return Ok(());
        }
        let path = self.settings.schemas_dir().join(file_name);
        log::info!("Loading {}", path.display());
        self.run_labelled(&path, file_name).await
    }

    async fn run_labelled(&self, path: &Path, label: &str) -> MigrateResult<()> {
        let is_manual = is_manual_migration(path, &self.settings.block_marker)?;
        self.reporter.migration_started(label);
        match self.runner.run_file(self.db, path, is_manual).await {
            Ok(run) => {
                self.reporter.migration_applied(label, &run);
                Ok(())
            }
            Err(e) => {
                self.reporter.migration_failed(label, &e);
                Err(e)
            }
        }
    }

    /// Run the fixtures closest to `version`, if any. Missing fixtures are
    /// not an error.
    pub async fn load_fixtures(&self, version: &Version) -> MigrateResult<Option<Version>> {
        let fixtures = self.catalog.known_fixtures();
        let found = closest_version(
            self.catalog.known_versions(),
            version,
            &self.settings.fixtures_template,
            &fixtures,
            None,
        )?;

        let Some(fixtures_version) = found else {
            log::info!("Not applying fixtures: Cannot find fixtures to init the DB.");
            return Ok(None);
        };

        self.reporter.title("Loading fixtures");
        let file_name = self.settings.fixtures_file_name(&fixtures_version);
        let path = self.settings.fixtures_dir().join(&file_name);
        log::info!(
            "Applying fixture {} (file {})",
            fixtures_version,
            path.display()
        );
        self.run_labelled(&path, &file_name).await?;
        Ok(Some(fixtures_version))
    }

    /// Record every migration of every known version up to and including
    /// `version` as applied, without running anything. Migrations already
    /// applied are left alone. Returns the number of records written.
    pub async fn create_fake_entries(&self, version: &Version) -> MigrateResult<usize> {
        let versions = versions_until(self.catalog.known_versions(), version)?;
        log::info!(
            "Will now fake all migrations up to version {} (included)",
            version
        );
        self.reporter.title("Faking migrations");

        let mut faked = 0;
        for version in versions {
            log::info!("Faking migrations from version {}", version);
            let applied = self.ledger.applied_migrations(version).await?;
            let Some(files) = self.catalog.migrations(version) else {
                continue;
            };
            for name in files.keys().filter(|name| !applied.contains(*name)) {
                log::info!("Faking {}", name);
                self.ledger
                    .record(version, name, MigrationStatus::Applied)
                    .await?;
                self.reporter.migration_faked(version, name);
                faked += 1;
            }
        }
        Ok(faked)
    }

    /// Current and target versions with the state of every migration up to
    /// the target.
    pub async fn describe(&self) -> MigrateResult<MigrationReport> {
        let current_version = self.ledger.current_version().await?;
        let partial = self.ledger.partial_migrations().await?;
        let plan = self.plan(None).await?;

        let versions = plan
            .into_iter()
            .map(|entry| {
                let partial = partial.get(&entry.version);
                let migrations = entry
                    .operations
                    .into_iter()
                    .map(|op| ReportEntry {
                        partial: !op.applied && partial.is_some_and(|p| p.contains(&op.name)),
                        name: op.name,
                        applied: op.applied,
                        is_manual: op.is_manual,
                        path: op.path,
                    })
                    .collect();
                VersionReport {
                    version: entry.version,
                    migrations,
                }
            })
            .collect();

        Ok(MigrationReport {
            current_version,
            target_version: self.target_version().cloned(),
            versions,
        })
    }
}

/// Display label of an operation
fn operation_label(operation: &Operation) -> String {
    if operation.is_manual {
        format!("{} (manual)", operation.name)
    } else {
        operation.name.clone()
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
