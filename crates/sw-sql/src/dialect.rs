//! SQL dialect abstraction

use sqlparser::dialect::{
    Dialect, DuckDbDialect as SqlParserDuckDb, PostgreSqlDialect as SqlParserPostgres,
};

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Get the dialect name
    fn name(&self) -> &'static str;
}

/// Create a dialect from its configuration name
pub fn dialect_from_name(name: &str) -> SqlResult<Box<dyn SqlDialect>> {
    match name.to_lowercase().as_str() {
        "duckdb" => Ok(Box::new(DuckDbDialect::new())),
        "postgres" | "postgresql" => Ok(Box::new(PostgresDialect::new())),
        _ => Err(SqlError::UnknownDialect(name.to_string())),
    }
}

/// DuckDB SQL dialect
pub struct DuckDbDialect {
    dialect: SqlParserDuckDb,
}

impl DuckDbDialect {
    /// Create a new DuckDB dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserDuckDb {},
        }
    }
}

impl Default for DuckDbDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for DuckDbDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn name(&self) -> &'static str {
        "duckdb"
    }
}

/// PostgreSQL SQL dialect
pub struct PostgresDialect {
    dialect: SqlParserPostgres,
}

impl PostgresDialect {
    /// Create a new PostgreSQL dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserPostgres {},
        }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for PostgresDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
