//! Ledger of applied migrations.
//!
//! One row per migration run: version, file name, timestamp and status. A
//! migration counts as applied only through a row with status `applied`;
//! `partial` rows record a failure after statements were already committed
//! outside a transaction, so the next run retries the file.

use crate::duckdb::DuckDbBackend;
use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use sw_core::{Settings, Version};

/// Format of timestamps read back from DuckDB (fraction optional)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Outcome recorded for a migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    /// Ran to completion
    Applied,
    /// Failed after some statements were committed
    Partial,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Applied => "applied",
            MigrationStatus::Partial => "partial",
        }
    }
}

impl std::str::FromStr for MigrationStatus {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(MigrationStatus::Applied),
            "partial" => Ok(MigrationStatus::Partial),
            other => Err(DbError::InvalidRecord(format!(
                "unknown migration status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRecord {
    pub version: Version,
    pub name: String,
    pub applied_at: DateTime<Utc>,
    pub status: MigrationStatus,
}

/// Persistent record of which migrations have run
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Create the ledger table if it does not exist
    async fn create_table(&self) -> DbResult<()>;

    /// Whether at least one migration is recorded as applied.
    /// A missing table means not initialized.
    async fn is_initialized(&self) -> DbResult<bool>;

    /// Every row, oldest first. A missing table has no rows.
    async fn records(&self) -> DbResult<Vec<AppliedRecord>>;

    /// Insert one record stamped with the current time
    async fn record(&self, version: &Version, name: &str, status: MigrationStatus)
        -> DbResult<()>;

    /// Distinct versions with at least one applied migration, ascending
    async fn applied_versions(&self) -> DbResult<Vec<Version>> {
        let mut versions: Vec<Version> = self
            .records()
            .await?
            .into_iter()
            .filter(|r| r.status == MigrationStatus::Applied)
            .map(|r| r.version)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        versions.sort();
        Ok(versions)
    }

    /// Names of the applied migrations of `version`
    async fn applied_migrations(&self, version: &Version) -> DbResult<HashSet<String>> {
        Ok(self
            .all_applied()
            .await?
            .remove(version)
            .unwrap_or_default())
    }

    /// Applied migration names for every version
    async fn all_applied(&self) -> DbResult<HashMap<Version, HashSet<String>>> {
        Ok(group_by_status(&self.records().await?, MigrationStatus::Applied))
    }

    /// Migrations left partially applied and not applied since
    async fn partial_migrations(&self) -> DbResult<HashMap<Version, HashSet<String>>> {
        let records = self.records().await?;
        let applied = group_by_status(&records, MigrationStatus::Applied);
        let mut partial = group_by_status(&records, MigrationStatus::Partial);
        for (version, names) in partial.iter_mut() {
            if let Some(done) = applied.get(version) {
                names.retain(|name| !done.contains(name));
            }
        }
        partial.retain(|_, names| !names.is_empty());
        Ok(partial)
    }

    /// Highest applied version
    async fn current_version(&self) -> DbResult<Option<Version>> {
        Ok(self.applied_versions().await?.pop())
    }
}

fn group_by_status(
    records: &[AppliedRecord],
    status: MigrationStatus,
) -> HashMap<Version, HashSet<String>> {
    let mut grouped: HashMap<Version, HashSet<String>> = HashMap::new();
    for record in records.iter().filter(|r| r.status == status) {
        grouped
            .entry(record.version.clone())
            .or_default()
            .insert(record.name.clone());
    }
    grouped
}

/// Quote a possibly schema-qualified identifier (`schema.table`).
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Table and column names of the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTable {
    pub table: String,
    pub version_column: String,
    pub name_column: String,
    pub applied_at_column: String,
    pub status_column: String,
}

impl LedgerTable {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            table: settings.table.clone(),
            version_column: settings.version_column.clone(),
            name_column: settings.name_column.clone(),
            applied_at_column: settings.applied_at_column.clone(),
            status_column: settings.status_column.clone(),
        }
    }

    fn create_sql(&self) -> String {
        let schema = match self.table.rfind('.') {
            Some(pos) => format!(
                "CREATE SCHEMA IF NOT EXISTS {};\n",
                quote_identifier(&self.table[..pos])
            ),
            None => String::new(),
        };
        format!(
            "{}CREATE TABLE IF NOT EXISTS {} (\n    {} TEXT NOT NULL,\n    {} TEXT NOT NULL,\n    {} TIMESTAMP NOT NULL DEFAULT current_timestamp,\n    {} TEXT NOT NULL DEFAULT 'applied'\n)",
            schema,
            quote_identifier(&self.table),
            quote_identifier(&self.version_column),
            quote_identifier(&self.name_column),
            quote_identifier(&self.applied_at_column),
            quote_identifier(&self.status_column),
        )
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT {v}, {n}, CAST({a} AS VARCHAR), {s} FROM {t} ORDER BY {a}",
            v = quote_identifier(&self.version_column),
            n = quote_identifier(&self.name_column),
            a = quote_identifier(&self.applied_at_column),
            s = quote_identifier(&self.status_column),
            t = quote_identifier(&self.table),
        )
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, CAST(? AS TIMESTAMP), ?)",
            quote_identifier(&self.table),
            quote_identifier(&self.version_column),
            quote_identifier(&self.name_column),
            quote_identifier(&self.applied_at_column),
            quote_identifier(&self.status_column),
        )
    }
}

/// Ledger stored in a DuckDB table, sharing the connection the migrations
/// run on
pub struct DuckDbLedger {
    backend: Arc<DuckDbBackend>,
    table: LedgerTable,
}

impl DuckDbLedger {
    pub fn new(backend: Arc<DuckDbBackend>, table: LedgerTable) -> Self {
        Self { backend, table }
    }

    pub fn table(&self) -> &LedgerTable {
        &self.table
    }

    fn table_exists(&self) -> DbResult<bool> {
        self.backend.relation_exists(&self.table.table)
    }
}

#[async_trait]
impl Ledger for DuckDbLedger {
    async fn create_table(&self) -> DbResult<()> {
        let sql = self.table.create_sql();
        log::debug!("Creating ledger table {}", self.table.table);
        self.backend.execute_batch(&sql)
    }

    async fn is_initialized(&self) -> DbResult<bool> {
        if !self.table_exists()? {
            return Ok(false);
        }
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = '{}'",
            quote_identifier(&self.table.table),
            quote_identifier(&self.table.status_column),
            MigrationStatus::Applied.as_str(),
        );
        Ok(self.backend.query_count(&sql)? > 0)
    }

    async fn records(&self) -> DbResult<Vec<AppliedRecord>> {
        if !self.table_exists()? {
            return Ok(Vec::new());
        }
        let sql = self.table.select_sql();
        let rows: Vec<(String, String, String, String)> =
            self.backend.with_connection(|conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })?;

        rows.into_iter()
            .map(|(version, name, applied_at, status)| {
                let version = Version::from_string(&version)
                    .map_err(|e| DbError::InvalidRecord(e.to_string()))?;
                let applied_at = NaiveDateTime::parse_from_str(&applied_at, TIMESTAMP_FORMAT)
                    .map_err(|e| {
                        DbError::InvalidRecord(format!("bad timestamp '{}': {}", applied_at, e))
                    })?
                    .and_utc();
                Ok(AppliedRecord {
                    version,
                    name,
                    applied_at,
                    status: status.parse()?,
                })
            })
            .collect()
    }

    async fn record(
        &self,
        version: &Version,
        name: &str,
        status: MigrationStatus,
    ) -> DbResult<()> {
        let sql = self.table.insert_sql();
        let applied_at = Utc::now().naive_utc().format(TIMESTAMP_WRITE_FORMAT).to_string();
        log::debug!("Recording {} {} as {}", version, name, status);
        self.backend.with_connection(|conn| {
            conn.execute(
                &sql,
                duckdb::params![version.as_str(), name, applied_at, status.as_str()],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
