//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::sync::Arc;
use sw_core::{log_level, Catalog, Dialect, PartialSettings, Settings};
use sw_db::{DuckDbBackend, DuckDbLedger, LedgerTable};
use sw_migrate::{Migrator, NoopReporter, Reporter};
use sw_sql::TokenSplitter;

use crate::cli::GlobalArgs;
use crate::reporter::ConsoleReporter;

/// Install the logger. `verbosity` applies until the settings are loaded.
pub(crate) fn init_logging(verbosity: u8) {
    // The logger lets everything through; `log::set_max_level` does the
    // filtering so the config file can still change it.
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
    log::set_max_level(log_level(verbosity));
}

/// Resolve settings: defaults, then the config file, then flags and
/// environment variables.
pub(crate) fn load_settings(args: &GlobalArgs) -> Result<Settings> {
    let mut layers = Vec::new();

    let config_file = PartialSettings::discover(args.config_file.as_deref())
        .context("Failed to locate configuration file")?;
    if let Some(path) = config_file {
        let layer = PartialSettings::load(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
        layers.push(layer);
    }
    layers.push(args.settings_layer());

    let settings = Settings::from_layers(layers).context("Invalid configuration")?;
    log::set_max_level(log_level(settings.verbosity));
    Ok(settings)
}

/// Everything a command needs: settings, migration catalog, database,
/// ledger and splitter
pub(crate) struct RuntimeContext {
    pub settings: Settings,
    pub catalog: Catalog,
    pub backend: Arc<DuckDbBackend>,
    pub ledger: DuckDbLedger,
    pub splitter: TokenSplitter,
    reporter: Box<dyn Reporter>,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let settings = load_settings(args)?;
        Self::from_settings(settings, args.quiet)
    }

    /// Create a runtime context from resolved settings
    pub fn from_settings(settings: Settings, quiet: bool) -> Result<Self> {
        let catalog = Catalog::scan(&settings).with_context(|| {
            format!(
                "Failed to scan migrations in {}",
                settings.migrations_root.display()
            )
        })?;

        let backend = Arc::new(
            DuckDbBackend::new(&settings.database)
                .with_context(|| format!("Failed to connect to database {}", settings.database))?,
        );
        let ledger = DuckDbLedger::new(Arc::clone(&backend), LedgerTable::from_settings(&settings));

        let splitter = match settings.dialect {
            Dialect::DuckDb => TokenSplitter::duckdb(),
            Dialect::Postgres => TokenSplitter::postgres(),
        };

        let reporter: Box<dyn Reporter> = if quiet {
            Box::new(NoopReporter)
        } else {
            Box::new(ConsoleReporter::new())
        };

        Ok(Self {
            settings,
            catalog,
            backend,
            ledger,
            splitter,
            reporter,
        })
    }

    /// Migrator over this context's database and ledger
    pub fn migrator(&self) -> Migrator<'_> {
        Migrator::new(
            &self.settings,
            &self.catalog,
            self.backend.as_ref(),
            &self.ledger,
            &self.splitter,
        )
        .with_reporter(self.reporter.as_ref())
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
