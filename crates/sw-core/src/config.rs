//! Settings for a Stepwise run and their YAML/CLI layers.
//!
//! Values are resolved in layers: built-in defaults, then a `stepwise.yml`
//! file, then environment variables and command line flags. Every layer is a
//! [`PartialSettings`]; the merged result is a fully typed [`Settings`] that is
//! checked through [`Settings::validate`].

use crate::error::{CoreError, CoreResult};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder accepted in schema/fixtures templates besides `{}`.
const VERSION_PLACEHOLDER: &str = "{version}";

/// Value meaning "no explicit version" for target and schema versions.
pub const LATEST_VERSION: &str = "latest";

/// Config files searched, in order, when no `--config-file` is given.
/// `~` is expanded from `$HOME`.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "./stepwise.yml",
    "./stepwise.yaml",
    "~/.config/stepwise.yml",
    "/etc/stepwise.yml",
];

const DEFAULT_DATABASE: &str = "stepwise.duckdb";
const DEFAULT_TABLE: &str = "stepwise_migrations";
const DEFAULT_SCHEMA_TEMPLATE: &str = "schema_{}.sql";
const DEFAULT_FIXTURES_TEMPLATE: &str = "fixtures_{}.sql";
const DEFAULT_BLOCK_MARKER: &str = "--meta-psql";
const DEFAULT_NON_TRANSACTIONAL_KEYWORDS: &[&str] = &["CONCURRENTLY", "ALTER TYPE", "VACUUM"];

/// SQL dialect used to tokenize migration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// DuckDB SQL dialect
    #[default]
    DuckDb,
    /// PostgreSQL SQL dialect
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Database path (DuckDB file or `:memory:`)
    pub database: String,

    /// Ledger table, optionally schema-qualified
    pub table: String,

    /// Ledger column holding the migration version
    pub version_column: String,

    /// Ledger column holding the migration file name
    pub name_column: String,

    /// Ledger column holding the application timestamp
    pub applied_at_column: String,

    /// Ledger column holding the record status (`applied` or `partial`)
    pub status_column: String,

    /// Root of the migration tree
    pub migrations_root: PathBuf,

    /// Desired final version, `None` means the latest known version
    pub target_version: Option<Version>,

    /// Forced version of the initial schema, `None` picks the closest one
    pub schema_version: Option<Version>,

    /// File name template for schema files
    pub schema_template: String,

    /// File name template for fixtures files
    pub fixtures_template: String,

    /// Words that make a file run outside of a transaction
    pub non_transactional_keywords: Vec<String>,

    /// Files under `schemas/` run before the main schema
    pub before_schema_files: Vec<String>,

    /// Files under `schemas/` run after the main schema
    pub after_schema_files: Vec<String>,

    /// Deprecated alias of `before_schema_files`
    pub additional_schema_files: Vec<String>,

    /// Skip migration files that are symlinks
    pub ignore_symlinks: bool,

    /// Create the ledger table when it does not exist
    pub create_table: bool,

    /// Dialect used by the statement splitter
    pub dialect: Dialect,

    /// Prefix of block control lines in manual migrations
    pub block_marker: String,

    /// Verbosity level (number of `-v` flags)
    pub verbosity: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            version_column: "version".to_string(),
            name_column: "name".to_string(),
            applied_at_column: "applied_at".to_string(),
            status_column: "status".to_string(),
            migrations_root: PathBuf::from("."),
            target_version: None,
            schema_version: None,
            schema_template: DEFAULT_SCHEMA_TEMPLATE.to_string(),
            fixtures_template: DEFAULT_FIXTURES_TEMPLATE.to_string(),
            non_transactional_keywords: DEFAULT_NON_TRANSACTIONAL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            before_schema_files: Vec::new(),
            after_schema_files: Vec::new(),
            additional_schema_files: Vec::new(),
            ignore_symlinks: false,
            create_table: true,
            dialect: Dialect::default(),
            block_marker: DEFAULT_BLOCK_MARKER.to_string(),
            verbosity: 0,
        }
    }
}

/// One layer of settings: every field is optional.
///
/// Deserialized from `stepwise.yml`, and built by the CLI from flags and
/// environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialSettings {
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub version_column: Option<String>,
    #[serde(default)]
    pub name_column: Option<String>,
    #[serde(default)]
    pub applied_at_column: Option<String>,
    #[serde(default)]
    pub status_column: Option<String>,
    #[serde(default)]
    pub migrations_root: Option<PathBuf>,
    /// Version string or `latest`
    #[serde(default)]
    pub target_version: Option<String>,
    /// Version string or `latest`
    #[serde(default)]
    pub schema_version: Option<String>,
    #[serde(default)]
    pub schema_template: Option<String>,
    #[serde(default)]
    pub fixtures_template: Option<String>,
    #[serde(default)]
    pub non_transactional_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub before_schema_files: Option<Vec<String>>,
    #[serde(default)]
    pub after_schema_files: Option<Vec<String>>,
    #[serde(default)]
    pub additional_schema_files: Option<Vec<String>>,
    #[serde(default)]
    pub ignore_symlinks: Option<bool>,
    #[serde(default)]
    pub create_table: Option<bool>,
    #[serde(default)]
    pub dialect: Option<Dialect>,
    #[serde(default)]
    pub block_marker: Option<String>,
    #[serde(default)]
    pub verbosity: Option<u8>,
}

impl PartialSettings {
    /// Load a settings layer from a YAML file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        log::info!("Reading configuration from {}", path.display());
        Self::parse(&content, path)
    }

    /// Parse a settings layer from YAML text. `path` is only used in errors.
    pub fn parse(content: &str, path: &Path) -> CoreResult<Self> {
        // An empty file is a valid, empty layer
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Locate the config file to use.
    ///
    /// An explicit path must exist. Otherwise the first existing file of
    /// [`DEFAULT_CONFIG_FILES`] is returned, or `None` when there is none.
    pub fn discover(explicit: Option<&Path>) -> CoreResult<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CoreError::ConfigNotFound {
                    path: path.display().to_string(),
                });
            }
            return Ok(Some(path.to_path_buf()));
        }

        for candidate in DEFAULT_CONFIG_FILES {
            let Some(path) = expand_home(candidate) else {
                continue;
            };
            if path.is_file() {
                return Ok(Some(path));
            }
            log::info!("Configuration not found at {}", path.display());
        }

        log::info!("No configuration file found");
        Ok(None)
    }
}

fn expand_home(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => std::env::var_os("HOME").map(|home| PathBuf::from(home).join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

/// Parse a version setting where `latest` means "none".
fn parse_optional_version(field: &'static str, raw: &str) -> CoreResult<Option<Version>> {
    if raw == LATEST_VERSION {
        return Ok(None);
    }
    Version::from_string(raw)
        .map(Some)
        .map_err(|e| CoreError::InvalidSetting {
            field,
            message: e.to_string(),
        })
}

type Validator = fn(&Settings) -> CoreResult<()>;

/// Field name -> validator. Every field with constraints is listed here.
const VALIDATORS: &[(&str, Validator)] = &[
    ("database", validate_database),
    ("table", validate_table),
    ("version_column", validate_version_column),
    ("name_column", validate_name_column),
    ("applied_at_column", validate_applied_at_column),
    ("status_column", validate_status_column),
    ("migrations_root", validate_migrations_root),
    ("schema_version", validate_schema_version),
    ("schema_template", validate_schema_template),
    ("fixtures_template", validate_fixtures_template),
    ("non_transactional_keywords", validate_keywords),
    ("block_marker", validate_block_marker),
];

impl Settings {
    /// Apply a layer on top of the current values. Unset fields are kept.
    pub fn merge(&mut self, layer: PartialSettings) -> CoreResult<()> {
        if let Some(v) = layer.database {
            self.database = v;
        }
        if let Some(v) = layer.table {
            self.table = v;
        }
        if let Some(v) = layer.version_column {
            self.version_column = v;
        }
        if let Some(v) = layer.name_column {
            self.name_column = v;
        }
        if let Some(v) = layer.applied_at_column {
            self.applied_at_column = v;
        }
        if let Some(v) = layer.status_column {
            self.status_column = v;
        }
        if let Some(v) = layer.migrations_root {
            self.migrations_root = v;
        }
        if let Some(v) = layer.target_version {
            self.target_version = parse_optional_version("target_version", &v)?;
        }
        if let Some(v) = layer.schema_version {
            self.schema_version = parse_optional_version("schema_version", &v)?;
        }
        if let Some(v) = layer.schema_template {
            self.schema_template = v;
        }
        if let Some(v) = layer.fixtures_template {
            self.fixtures_template = v;
        }
        if let Some(v) = layer.non_transactional_keywords {
            self.non_transactional_keywords = v;
        }
        if let Some(v) = layer.before_schema_files {
            self.before_schema_files = v;
        }
        if let Some(v) = layer.after_schema_files {
            self.after_schema_files = v;
        }
        if let Some(v) = layer.additional_schema_files {
            self.additional_schema_files = v;
        }
        if let Some(v) = layer.ignore_symlinks {
            self.ignore_symlinks = v;
        }
        if let Some(v) = layer.create_table {
            self.create_table = v;
        }
        if let Some(v) = layer.dialect {
            self.dialect = v;
        }
        if let Some(v) = layer.block_marker {
            self.block_marker = v;
        }
        if let Some(v) = layer.verbosity {
            self.verbosity = v;
        }
        Ok(())
    }

    /// Build settings from defaults and the given layers, lowest precedence first.
    pub fn from_layers(layers: impl IntoIterator<Item = PartialSettings>) -> CoreResult<Self> {
        let mut settings = Self::default();
        for layer in layers {
            settings.merge(layer)?;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Run every validator of the field table.
    pub fn validate(&self) -> CoreResult<()> {
        for (field, validator) in VALIDATORS {
            log::debug!("Validating setting {}", field);
            validator(self)?;
        }
        Ok(())
    }

    /// Path of the `schemas/` folder
    pub fn schemas_dir(&self) -> PathBuf {
        self.migrations_root.join("schemas")
    }

    /// Path of the `fixtures/` folder
    pub fn fixtures_dir(&self) -> PathBuf {
        self.migrations_root.join("fixtures")
    }

    /// Render the schema file name for a version
    pub fn schema_file_name(&self, version: &Version) -> String {
        render_template(&self.schema_template, version)
    }

    /// Render the fixtures file name for a version
    pub fn fixtures_file_name(&self, version: &Version) -> String {
        render_template(&self.fixtures_template, version)
    }
}

/// Substitute the version's original string into a file name template.
pub fn render_template(template: &str, version: &Version) -> String {
    template
        .replace(VERSION_PLACEHOLDER, version.as_str())
        .replace("{}", version.as_str())
}

fn invalid(field: &'static str, message: impl Into<String>) -> CoreError {
    CoreError::InvalidSetting {
        field,
        message: message.into(),
    }
}

fn check_identifier(field: &'static str, value: &str) -> CoreResult<()> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("'{}' is not a valid SQL identifier", value),
        ))
    }
}

fn check_template(field: &'static str, value: &str) -> CoreResult<()> {
    if value.contains("{}") || value.contains(VERSION_PLACEHOLDER) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!(
                "'{}' must contain a '{{}}' or '{}' placeholder",
                value, VERSION_PLACEHOLDER
            ),
        ))
    }
}

fn validate_database(s: &Settings) -> CoreResult<()> {
    if s.database.trim().is_empty() {
        return Err(invalid("database", "database path cannot be empty"));
    }
    Ok(())
}

fn validate_table(s: &Settings) -> CoreResult<()> {
    // Accept `schema.table`
    for part in s.table.splitn(2, '.') {
        check_identifier("table", part)?;
    }
    Ok(())
}

fn validate_version_column(s: &Settings) -> CoreResult<()> {
    check_identifier("version_column", &s.version_column)
}

fn validate_name_column(s: &Settings) -> CoreResult<()> {
    check_identifier("name_column", &s.name_column)
}

fn validate_applied_at_column(s: &Settings) -> CoreResult<()> {
    check_identifier("applied_at_column", &s.applied_at_column)
}

fn validate_status_column(s: &Settings) -> CoreResult<()> {
    check_identifier("status_column", &s.status_column)
}

fn validate_migrations_root(s: &Settings) -> CoreResult<()> {
    if s.migrations_root.as_os_str().is_empty() {
        return Err(invalid("migrations_root", "path cannot be empty"));
    }
    Ok(())
}

fn validate_schema_version(s: &Settings) -> CoreResult<()> {
    if let (Some(schema), Some(target)) = (&s.schema_version, &s.target_version) {
        if schema > target {
            return Err(invalid(
                "schema_version",
                format!(
                    "schema version {} is more recent than target version {}",
                    schema, target
                ),
            ));
        }
    }
    Ok(())
}

fn validate_schema_template(s: &Settings) -> CoreResult<()> {
    check_template("schema_template", &s.schema_template)
}

fn validate_fixtures_template(s: &Settings) -> CoreResult<()> {
    check_template("fixtures_template", &s.fixtures_template)
}

fn validate_keywords(s: &Settings) -> CoreResult<()> {
    if s.non_transactional_keywords
        .iter()
        .any(|k| k.trim().is_empty())
    {
        return Err(invalid(
            "non_transactional_keywords",
            "keywords cannot be empty",
        ));
    }
    Ok(())
}

fn validate_block_marker(s: &Settings) -> CoreResult<()> {
    if s.block_marker.trim().is_empty() {
        return Err(invalid("block_marker", "marker cannot be empty"));
    }
    if s.block_marker.contains(':') {
        return Err(invalid(
            "block_marker",
            "marker must not contain ':' (it separates the command)",
        ));
    }
    Ok(())
}

/// Map a `-v` count to a log level.
///
/// | verbosity | level |
/// |-----------|-------|
/// | 0         | error |
/// | 1         | warn  |
/// | 2         | info  |
/// | 3+        | debug |
pub fn log_level(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
