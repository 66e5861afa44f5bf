//! CLI argument definitions using clap derive API

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use sw_core::{Dialect, PartialSettings};

/// Stepwise - apply versioned SQL migrations in order, once
#[derive(Parser, Debug)]
#[command(name = "stepwise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands.
///
/// Every setting can also come from a `STEPWISE_*` environment variable or
/// from the config file; flags win over both.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Raise log verbosity (-v warnings, -vv info, -vvv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Do not print progress
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: first of ./stepwise.yml, ./stepwise.yaml,
    /// ~/.config/stepwise.yml, /etc/stepwise.yml)
    #[arg(long, global = true, env = "STEPWISE_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// DuckDB database file (`:memory:` for a throwaway database)
    #[arg(long, global = true, env = "STEPWISE_DATABASE")]
    pub database: Option<String>,

    /// Ledger table, optionally schema-qualified
    #[arg(long, global = true, env = "STEPWISE_TABLE")]
    pub table: Option<String>,

    /// Ledger column holding the version
    #[arg(long, global = true, env = "STEPWISE_VERSION_COLUMN")]
    pub version_column: Option<String>,

    /// Ledger column holding the migration name
    #[arg(long, global = true, env = "STEPWISE_NAME_COLUMN")]
    pub name_column: Option<String>,

    /// Ledger column holding the application time
    #[arg(long, global = true, env = "STEPWISE_APPLIED_AT_COLUMN")]
    pub applied_at_column: Option<String>,

    /// Ledger column holding the migration status
    #[arg(long, global = true, env = "STEPWISE_STATUS_COLUMN")]
    pub status_column: Option<String>,

    /// Folder holding the version folders, schemas and fixtures
    #[arg(long, global = true, env = "STEPWISE_MIGRATIONS_ROOT")]
    pub migrations_root: Option<PathBuf>,

    /// Last version to apply, or `latest`
    #[arg(long, global = true, env = "STEPWISE_TARGET_VERSION")]
    pub target_version: Option<String>,

    /// Schema version used to initialize an empty database, or `latest`
    #[arg(long, global = true, env = "STEPWISE_SCHEMA_VERSION")]
    pub schema_version: Option<String>,

    /// Schema file name template (`{}` or `{version}` placeholder)
    #[arg(long, global = true, env = "STEPWISE_SCHEMA_TEMPLATE")]
    pub schema_template: Option<String>,

    /// Fixtures file name template (`{}` or `{version}` placeholder)
    #[arg(long, global = true, env = "STEPWISE_FIXTURES_TEMPLATE")]
    pub fixtures_template: Option<String>,

    /// Keyword forcing a file to run outside a transaction (repeatable)
    #[arg(
        long = "non-transactional-keyword",
        global = true,
        env = "STEPWISE_NON_TRANSACTIONAL_KEYWORDS",
        value_delimiter = ','
    )]
    pub non_transactional_keywords: Vec<String>,

    /// File of the schemas folder run before the schema (repeatable)
    #[arg(
        long = "before-schema-file",
        global = true,
        env = "STEPWISE_BEFORE_SCHEMA_FILES",
        value_delimiter = ','
    )]
    pub before_schema_files: Vec<String>,

    /// File of the schemas folder run after the schema (repeatable)
    #[arg(
        long = "after-schema-file",
        global = true,
        env = "STEPWISE_AFTER_SCHEMA_FILES",
        value_delimiter = ','
    )]
    pub after_schema_files: Vec<String>,

    /// Deprecated, use --before-schema-file
    #[arg(
        long = "additional-schema-file",
        global = true,
        env = "STEPWISE_ADDITIONAL_SCHEMA_FILES",
        value_delimiter = ','
    )]
    pub additional_schema_files: Vec<String>,

    /// Skip symlinked migration files
    #[arg(long, global = true, env = "STEPWISE_IGNORE_SYMLINKS")]
    pub ignore_symlinks: bool,

    /// Do not create the ledger table when it is missing
    #[arg(long, global = true, env = "STEPWISE_NO_CREATE_TABLE")]
    pub no_create_table: bool,

    /// SQL dialect used to split migration files
    #[arg(long, global = true, value_enum, env = "STEPWISE_DIALECT")]
    pub dialect: Option<DialectArg>,

    /// Prefix of block control lines in manual migrations
    #[arg(long, global = true, env = "STEPWISE_BLOCK_MARKER", allow_hyphen_values = true)]
    pub block_marker: Option<String>,
}

impl GlobalArgs {
    /// Settings layer made of the flags (and environment variables) given
    pub fn settings_layer(&self) -> PartialSettings {
        fn non_empty(values: &[String]) -> Option<Vec<String>> {
            (!values.is_empty()).then(|| values.to_vec())
        }

        PartialSettings {
            database: self.database.clone(),
            table: self.table.clone(),
            version_column: self.version_column.clone(),
            name_column: self.name_column.clone(),
            applied_at_column: self.applied_at_column.clone(),
            status_column: self.status_column.clone(),
            migrations_root: self.migrations_root.clone(),
            target_version: self.target_version.clone(),
            schema_version: self.schema_version.clone(),
            schema_template: self.schema_template.clone(),
            fixtures_template: self.fixtures_template.clone(),
            non_transactional_keywords: non_empty(&self.non_transactional_keywords),
            before_schema_files: non_empty(&self.before_schema_files),
            after_schema_files: non_empty(&self.after_schema_files),
            additional_schema_files: non_empty(&self.additional_schema_files),
            ignore_symlinks: self.ignore_symlinks.then_some(true),
            create_table: self.no_create_table.then_some(false),
            dialect: self.dialect.map(Dialect::from),
            block_marker: self.block_marker.clone(),
            verbosity: (self.verbose > 0).then_some(self.verbose),
        }
    }
}

/// SQL dialects accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectArg {
    /// DuckDB
    Duckdb,
    /// PostgreSQL
    Postgres,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Duckdb => Dialect::DuckDb,
            DialectArg::Postgres => Dialect::Postgres,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations up to the target version
    Migrate(MigrateArgs),

    /// Show applied and pending migrations
    ShowMigrations(ShowMigrationsArgs),

    /// Record migrations as applied without running them
    Fake(FakeArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

/// Arguments for the show-migrations command
#[derive(Args, Debug)]
pub struct ShowMigrationsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable checklist
    Text,
    /// JSON output
    Json,
}

/// Arguments for the fake command
#[derive(Args, Debug)]
pub struct FakeArgs {
    /// Every migration up to and including this version is recorded
    pub version: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
