//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;
use std::sync::Mutex;

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", e, path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Run `f` with the locked connection.
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> DbResult<T>,
    ) -> DbResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        f(&conn)
    }

    /// Execute several statements at once
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.with_connection(|conn| {
            conn.execute_batch(sql)
                .map_err(|e| DbError::ExecutionError(e.to_string()))
        })
    }

    /// Number of rows returned by `sql`
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.with_connection(|conn| {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                    row.get(0)
                })
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
            Ok(count as usize)
        })
    }

    /// Whether a table or view exists, `name` optionally schema-qualified
    pub fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };

        self.with_connection(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
                    duckdb::params![schema, table],
                    |row| row.get(0),
                )
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
            Ok(count > 0)
        })
    }

    fn transaction_sync(&self, command: &str) -> DbResult<()> {
        self.with_connection(|conn| {
            conn.execute_batch(command)
                .map_err(|e| DbError::TransactionError(format!("{} failed: {}", command, e)))
        })
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.with_connection(|conn| {
            conn.execute(sql, [])
                .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql.trim())))
        })
    }

    async fn begin(&self) -> DbResult<()> {
        self.transaction_sync("BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_sync("COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_sync("ROLLBACK")
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
