//! Error types for sw-migrate

use sw_core::CoreError;
use sw_db::DbError;
use sw_sql::SqlError;
use thiserror::Error;

/// Migration errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// M001: Core error propagation
    #[error("[M001] {0}")]
    Core(#[from] CoreError),

    /// M002: Invalid block structure in a manual script
    #[error("[M002] Script structure error in {path}: {source}")]
    ScriptStructure { path: String, source: SqlError },

    /// M003: Statement splitting failed or did not round-trip
    #[error("[M003] Cannot split {path} into statements: {source}")]
    StatementSplit { path: String, source: SqlError },

    /// M004: The database rejected a statement
    #[error("[M004] Error during migration {path}: {message}")]
    Execution {
        path: String,
        message: String,
        /// Statements were committed outside a transaction before the failure
        partially_applied: bool,
    },

    /// M005: Ledger or connection error
    #[error("[M005] {0}")]
    Database(#[from] DbError),

    /// M006: Migration file cannot be read
    #[error("[M006] Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl MigrateError {
    /// Whether a failed script left committed statements behind
    pub fn is_partially_applied(&self) -> bool {
        matches!(
            self,
            MigrateError::Execution {
                partially_applied: true,
                ..
            }
        )
    }

    pub(crate) fn from_sql(path: &str, source: SqlError) -> Self {
        if source.is_script_structure() {
            MigrateError::ScriptStructure {
                path: path.to_string(),
                source,
            }
        } else {
            MigrateError::StatementSplit {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
