//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Database abstraction used to run migration scripts
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a single statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Open a transaction
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;
}
