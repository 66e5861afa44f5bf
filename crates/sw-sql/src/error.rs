//! Error types for sw-sql

use thiserror::Error;

/// SQL splitting and script structure errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// SQL tokenize error (S001)
    #[error("[S001] SQL tokenize error at line {line}, column {column}: {message}")]
    TokenizeError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Unknown dialect name (S002)
    #[error("[S002] Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    /// Unrecognized block control command (S003)
    #[error("[S003] Unknown block command '{command}' at line {line}, expected 'done' or 'do-until-0'")]
    UnknownBlockCommand { command: String, line: usize },

    /// Append to, or close of, an already closed block (S004)
    #[error("[S004] Block is already closed: {0}")]
    BlockClosed(String),

    /// Rejoined statements differ from the original text (S005)
    #[error("[S005] Statement split does not reproduce the original SQL ({expected} bytes expected, {actual} bytes rebuilt); refusing to execute")]
    RoundTrip { expected: usize, actual: usize },

    /// A split point does not fall on a statement terminator (S006)
    #[error("[S006] Statement split point at byte {offset} is not a ';'")]
    SplitPoint { offset: usize },
}

impl SqlError {
    /// Whether the error comes from the block structure of a manual script
    pub fn is_script_structure(&self) -> bool {
        matches!(
            self,
            SqlError::UnknownBlockCommand { .. } | SqlError::BlockClosed(_)
        )
    }
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
