//! Tokenizer-based statement splitter.
//!
//! Statements are cut at top-level `;` tokens found by the sqlparser-rs
//! tokenizer, so terminators inside string literals, quoted identifiers,
//! dollar-quoted bodies and comments are left alone. Every piece is a slice
//! of the input: concatenating the pieces gives back the input byte for byte,
//! which [`verify_round_trip`] checks before anything is executed.

use crate::dialect::{dialect_from_name, DuckDbDialect, PostgresDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Location, Token, Tokenizer, Whitespace};
use std::collections::HashSet;

/// What a statement does, as far as row counting is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    /// DDL, SELECT and everything else
    Other,
}

impl StatementKind {
    /// INSERT, UPDATE and DELETE are tracked by batched loops
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete
        )
    }
}

/// One statement cut out of a SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// Exact slice of the input, terminator and surrounding whitespace included
    pub text: String,
    /// Text sent to the database (meta-commands and comment lines removed)
    pub sql: String,
    /// Leading verb classification
    pub kind: StatementKind,
    /// Only whitespace, comments or terminators
    pub blank: bool,
}

/// Splits SQL text into statements
pub trait StatementSplitter: Send + Sync {
    /// Split `sql` into statements whose texts concatenate back to `sql`
    fn split(&self, sql: &str) -> SqlResult<Vec<SqlStatement>>;
}

/// Check that the statements rebuild `original` exactly.
pub fn verify_round_trip(original: &str, statements: &[SqlStatement]) -> SqlResult<()> {
    let rebuilt: String = statements.iter().map(|s| s.text.as_str()).collect();
    if rebuilt != original {
        return Err(SqlError::RoundTrip {
            expected: original.len(),
            actual: rebuilt.len(),
        });
    }
    Ok(())
}

/// Splitter backed by the sqlparser-rs tokenizer
pub struct TokenSplitter {
    dialect: Box<dyn SqlDialect>,
}

impl TokenSplitter {
    /// Splitter using the DuckDB dialect
    pub fn duckdb() -> Self {
        Self {
            dialect: Box::new(DuckDbDialect::new()),
        }
    }

    /// Splitter using the PostgreSQL dialect
    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgresDialect::new()),
        }
    }

    /// Splitter from a dialect name (`duckdb`, `postgres`)
    pub fn from_dialect_name(name: &str) -> SqlResult<Self> {
        Ok(Self {
            dialect: dialect_from_name(name)?,
        })
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }

    fn tokenize(&self, sql: &str) -> SqlResult<Vec<(Token, Location)>> {
        let tokens = Tokenizer::new(self.dialect.parser_dialect(), sql)
            .tokenize_with_location()
            .map_err(|e| SqlError::TokenizeError {
                message: e.message.clone(),
                line: e.location.line as usize,
                column: e.location.column as usize,
            })?;
        Ok(tokens
            .into_iter()
            .map(|t| (t.token, t.span.start))
            .collect())
    }

    /// Remove psql meta-command lines (`\timing`, `\set ...`) and whole-line
    /// `--` comments, keeping everything else byte for byte.
    ///
    /// A line is only dropped when its first non-blank character starts a
    /// token, so lines inside string literals, dollar-quoted bodies and block
    /// comments are kept.
    pub fn clean_sql(&self, sql: &str) -> SqlResult<String> {
        let tokens = self.tokenize(sql)?;
        Ok(strip_lines(sql, &tokens))
    }

    fn statement(&self, text: &str) -> SqlResult<SqlStatement> {
        let sql = self.clean_sql(text)?;
        let tokens = self.tokenize(&sql)?;
        let blank = tokens
            .iter()
            .all(|(t, _)| matches!(t, Token::Whitespace(_) | Token::SemiColon | Token::EOF));
        Ok(SqlStatement {
            text: text.to_string(),
            kind: classify(tokens.iter().map(|(t, _)| t)),
            sql,
            blank,
        })
    }
}

impl Default for TokenSplitter {
    fn default() -> Self {
        Self::duckdb()
    }
}

impl StatementSplitter for TokenSplitter {
    fn split(&self, sql: &str) -> SqlResult<Vec<SqlStatement>> {
        let tokens = self.tokenize(sql)?;
        let index = LineIndex::new(sql);

        let mut pieces = Vec::new();
        let mut start = 0;
        for (token, location) in &tokens {
            if !matches!(token, Token::SemiColon) {
                continue;
            }
            let offset = index
                .offset(*location)
                .ok_or(SqlError::SplitPoint { offset: start })?;
            if sql.as_bytes().get(offset) != Some(&b';') {
                return Err(SqlError::SplitPoint { offset });
            }
            pieces.push(&sql[start..=offset]);
            start = offset + 1;
        }
        if start < sql.len() {
            pieces.push(&sql[start..]);
        }

        pieces.into_iter().map(|p| self.statement(p)).collect()
    }
}

/// Drop the lines of `sql` that open with a `--` comment or a `\` token.
fn strip_lines(sql: &str, tokens: &[(Token, Location)]) -> String {
    let index = LineIndex::new(sql);
    let droppable: HashSet<usize> = tokens
        .iter()
        .filter(|(token, _)| match token {
            Token::Backslash => true,
            Token::Whitespace(Whitespace::SingleLineComment { prefix, .. }) => prefix == "--",
            _ => false,
        })
        .filter_map(|(_, location)| index.offset(*location))
        .collect();

    let mut out = String::with_capacity(sql.len());
    let mut line_start = 0;
    for line in sql.split_inclusive('\n') {
        if line.trim().is_empty() {
            out.push_str(line);
            line_start += line.len();
            continue;
        }
        let first = line_start + (line.len() - line.trim_start().len());
        if !droppable.contains(&first) {
            out.push_str(line);
        }
        line_start += line.len();
    }
    out
}

/// Classify a statement from its leading verb, looking past a `WITH` clause.
fn classify<'a>(tokens: impl Iterator<Item = &'a Token>) -> StatementKind {
    let mut depth = 0usize;
    let mut in_with = false;
    let mut first = true;

    for token in tokens {
        match token {
            Token::Whitespace(_) => continue,
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Word(word) if depth == 0 => match word.keyword {
                Keyword::WITH if first => in_with = true,
                Keyword::INSERT => return StatementKind::Insert,
                Keyword::UPDATE => return StatementKind::Update,
                Keyword::DELETE => return StatementKind::Delete,
                Keyword::SELECT if in_with => return StatementKind::Other,
                _ if !in_with => return StatementKind::Other,
                _ => {}
            },
            _ if depth == 0 && !in_with => return StatementKind::Other,
            _ => {}
        }
        first = false;
    }
    StatementKind::Other
}

/// Maps tokenizer locations (1-based line, 1-based column in chars) to byte
/// offsets.
struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    fn offset(&self, location: Location) -> Option<usize> {
        let line = usize::try_from(location.line).ok()?.checked_sub(1)?;
        let column = usize::try_from(location.column).ok()?.checked_sub(1)?;
        let start = *self.line_starts.get(line)?;
        self.text[start..]
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
    }
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod tests;
