//! Execution of one migration script.
//!
//! A script is prepared first: the block structure is parsed and every block
//! is split into statements whose texts must rebuild the block exactly. Only
//! a fully prepared script reaches the database, so structure and split
//! errors never leave a file half-run.

use crate::error::{MigrateError, MigrateResult};
use std::path::Path;
use sw_core::Settings;
use sw_db::Database;
use sw_sql::{
    verify_round_trip, BlockKind, Script, ScriptOptions, SqlStatement, StatementSplitter,
};

/// Statements of one block, ready to run
#[derive(Debug, Clone)]
pub struct PreparedBlock {
    pub kind: BlockKind,
    pub statements: Vec<SqlStatement>,
}

/// A script whose blocks are all split and verified
#[derive(Debug, Clone)]
pub struct PreparedScript {
    pub blocks: Vec<PreparedBlock>,
    pub transactional: bool,
}

impl PreparedScript {
    /// Number of statements that reach the database per pass
    pub fn statement_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| b.statements.iter())
            .filter(|s| !s.blank)
            .count()
    }
}

/// Outcome of a script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Statements executed, loop passes included
    pub statements: usize,
    /// Rows reported by the database across all statements
    pub affected_rows: usize,
    /// Passes made by batched loop blocks
    pub passes: usize,
}

/// Runs migration scripts with a statement splitter
pub struct ScriptRunner<'a> {
    splitter: &'a dyn StatementSplitter,
    marker: &'a str,
    keywords: &'a [String],
}

/// Failure inside a script run, before the path is known
struct RunFailure {
    message: String,
    committed: bool,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(splitter: &'a dyn StatementSplitter, settings: &'a Settings) -> Self {
        Self {
            splitter,
            marker: &settings.block_marker,
            keywords: &settings.non_transactional_keywords,
        }
    }

    /// Parse blocks and split them into statements. Nothing is executed.
    pub fn prepare(
        &self,
        content: &str,
        is_manual: bool,
        path: &str,
    ) -> MigrateResult<PreparedScript> {
        let script = Script::parse(
            content,
            &ScriptOptions {
                is_manual,
                marker: self.marker,
                non_transactional_keywords: self.keywords,
            },
        )
        .map_err(|e| MigrateError::from_sql(path, e))?;

        let blocks = script
            .blocks()
            .iter()
            .map(|block| -> MigrateResult<PreparedBlock> {
                let statements = self
                    .splitter
                    .split(block.content())
                    .and_then(|statements| {
                        verify_round_trip(block.content(), &statements)?;
                        Ok(statements)
                    })
                    .map_err(|e| MigrateError::from_sql(path, e))?;
                Ok(PreparedBlock {
                    kind: block.kind(),
                    statements,
                })
            })
            .collect::<MigrateResult<Vec<_>>>()?;

        Ok(PreparedScript {
            blocks,
            transactional: script.is_transactional(),
        })
    }

    /// Read, prepare and run the file at `path`.
    pub async fn run_file(
        &self,
        db: &dyn Database,
        path: &Path,
        is_manual: bool,
    ) -> MigrateResult<RunSummary> {
        let display = path.display().to_string();
        log::info!("Running SQL file {}", display);
        let content = std::fs::read_to_string(path).map_err(|e| MigrateError::Io {
            path: display.clone(),
            source: e,
        })?;
        let prepared = self.prepare(&content, is_manual, &display)?;
        self.run(db, &prepared, &display).await
    }

    /// Run a prepared script.
    ///
    /// Transactional scripts run between BEGIN and COMMIT and are rolled back
    /// on failure. Other scripts run statement by statement; a failure after
    /// at least one executed statement is reported as partially applied.
    pub async fn run(
        &self,
        db: &dyn Database,
        script: &PreparedScript,
        path: &str,
    ) -> MigrateResult<RunSummary> {
        let mut summary = RunSummary::default();

        let result = if script.transactional {
            run_in_transaction(db, script, &mut summary).await
        } else {
            run_blocks(db, script, &mut summary).await
        };

        match result {
            Ok(()) => {
                log::debug!(
                    "{}: {} statement(s), {} row(s) affected",
                    path,
                    summary.statements,
                    summary.affected_rows
                );
                Ok(summary)
            }
            Err(failure) => Err(MigrateError::Execution {
                path: path.to_string(),
                message: failure.message,
                partially_applied: failure.committed,
            }),
        }
    }
}

async fn run_in_transaction(
    db: &dyn Database,
    script: &PreparedScript,
    summary: &mut RunSummary,
) -> Result<(), RunFailure> {
    db.begin().await.map_err(|e| RunFailure {
        message: e.to_string(),
        committed: false,
    })?;

    if let Err(failure) = run_blocks(db, script, summary).await {
        if let Err(e) = db.rollback().await {
            log::warn!("Rollback failed: {}", e);
        }
        return Err(RunFailure {
            committed: false,
            ..failure
        });
    }

    db.commit().await.map_err(|e| RunFailure {
        message: e.to_string(),
        committed: false,
    })
}

async fn run_blocks(
    db: &dyn Database,
    script: &PreparedScript,
    summary: &mut RunSummary,
) -> Result<(), RunFailure> {
    for block in &script.blocks {
        match block.kind {
            BlockKind::Plain => {
                run_pass(db, &block.statements, summary).await?;
            }
            BlockKind::Loop => {
                log::debug!("Running one block in a loop");
                loop {
                    summary.passes += 1;
                    let written = run_pass(db, &block.statements, summary).await?;
                    log::debug!("Batch delta done : {}", written);
                    if written == 0 {
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Run every statement once. Returns the rows written by INSERT, UPDATE and
/// DELETE statements.
async fn run_pass(
    db: &dyn Database,
    statements: &[SqlStatement],
    summary: &mut RunSummary,
) -> Result<usize, RunFailure> {
    let mut written = 0;
    for statement in statements.iter().filter(|s| !s.blank) {
        log::debug!("Running one statement... <<{}>>", statement.sql.trim());
        let rows = db.execute(&statement.sql).await.map_err(|e| RunFailure {
            message: e.to_string(),
            committed: summary.statements > 0,
        })?;
        log::debug!("Affected {} rows", rows);
        summary.statements += 1;
        summary.affected_rows += rows;
        if statement.kind.is_write() {
            written += rows;
        }
    }
    Ok(written)
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
