//! Block structure of a migration file
//!
//! A file runs either as one block inside a transaction, or as a sequence of
//! blocks executed outside any implicit transaction. Manual migrations mark
//! block boundaries with control lines such as `--meta-psql:do-until-0`.

use crate::error::{SqlError, SqlResult};

/// Execution policy of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Statements run once, in order
    Plain,
    /// Statements re-run until a pass writes no rows
    Loop,
}

impl BlockKind {
    /// Control command that opens a plain block
    pub const DONE: &'static str = "done";
    /// Control command that opens a batched loop block
    pub const DO_UNTIL_0: &'static str = "do-until-0";

    /// Resolve a control command found on `line` (1-based). Commands are
    /// case-sensitive.
    pub fn from_command(command: &str, line: usize) -> SqlResult<Self> {
        match command {
            Self::DONE => Ok(BlockKind::Plain),
            Self::DO_UNTIL_0 => Ok(BlockKind::Loop),
            other => Err(SqlError::UnknownBlockCommand {
                command: other.to_string(),
                line,
            }),
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::Plain => write!(f, "plain"),
            BlockKind::Loop => write!(f, "loop"),
        }
    }
}

/// Contiguous SQL text with an open/closed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: BlockKind,
    content: String,
    closed: bool,
}

impl Block {
    /// Create an empty, open block
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            content: String::new(),
            closed: false,
        }
    }

    /// Append a line verbatim (line terminator included, if any).
    pub fn append_line(&mut self, line: &str) -> SqlResult<()> {
        if self.closed {
            return Err(SqlError::BlockClosed(format!(
                "cannot append to a closed {} block",
                self.kind
            )));
        }
        self.content.push_str(line);
        Ok(())
    }

    /// Close the block. Closing twice is an error.
    pub fn close(&mut self) -> SqlResult<()> {
        if self.closed {
            return Err(SqlError::BlockClosed(format!(
                "{} block closed twice",
                self.kind
            )));
        }
        self.closed = true;
        Ok(())
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Inputs that decide how a file is cut into blocks
#[derive(Debug, Clone, Copy)]
pub struct ScriptOptions<'a> {
    /// The file is a manual migration
    pub is_manual: bool,
    /// Control line prefix, without the trailing `:`
    pub marker: &'a str,
    /// Keywords that force non-transactional execution (matched ignoring case)
    pub non_transactional_keywords: &'a [String],
}

/// Ordered, immutable sequence of blocks built from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    blocks: Vec<Block>,
    transactional: bool,
}

impl Script {
    /// Build the script for `content`.
    ///
    /// Manual files are cut at control lines; the control lines themselves
    /// belong to no block. Any other file becomes a single plain block. The
    /// script runs in one transaction unless the file is manual or one of
    /// its lines contains a non-transactional keyword.
    pub fn parse(content: &str, options: &ScriptOptions<'_>) -> SqlResult<Self> {
        let keyword = find_keyword(content, options.non_transactional_keywords);
        if let Some(keyword) = keyword {
            log::debug!("Found non-transactional keyword '{}'", keyword);
        }
        let transactional = !options.is_manual && keyword.is_none();

        let blocks = if options.is_manual {
            parse_blocks(content, options.marker)?
        } else {
            let mut block = Block::new(BlockKind::Plain);
            block.append_line(content)?;
            block.close()?;
            vec![block]
        };

        log::debug!(
            "Script has {} block(s), transactional: {}",
            blocks.len(),
            transactional
        );
        Ok(Self {
            blocks,
            transactional,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Whether the whole script runs inside a single transaction
    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Whether any block is a batched loop
    pub fn has_loop(&self) -> bool {
        self.blocks.iter().any(|b| b.kind() == BlockKind::Loop)
    }
}

fn find_keyword<'k>(content: &str, keywords: &'k [String]) -> Option<&'k str> {
    let upper = content.to_uppercase();
    keywords
        .iter()
        .find(|k| !k.is_empty() && upper.contains(&k.to_uppercase()))
        .map(String::as_str)
}

fn parse_blocks(content: &str, marker: &str) -> SqlResult<Vec<Block>> {
    let prefix = format!("{}:", marker);
    let mut blocks = Vec::new();
    let mut current = Block::new(BlockKind::Plain);

    for (index, line) in content.split_inclusive('\n').enumerate() {
        let trimmed = line.trim();
        match trimmed.strip_prefix(prefix.as_str()) {
            Some(command) => {
                let kind = BlockKind::from_command(command.trim(), index + 1)?;
                current.close()?;
                blocks.push(std::mem::replace(&mut current, Block::new(kind)));
            }
            None => current.append_line(line)?,
        }
    }
    current.close()?;
    blocks.push(current);
    Ok(blocks)
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
