use crate::regex::RegexError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// # Summary
///
/// `Error` is an enum that contains all the possible errors
/// that `sprout` might encounter while setting up a lexer or a checker.
///
/// Lexing itself never fails: a prefix without any tokenization simply
/// has no lexing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed pattern /{pattern}/: {source}")]
    Regex { pattern: String, source: RegexError },
    #[error("token kind {kind} is defined more than once")]
    DuplicateKind { kind: String },
    #[error("malformed grammar at position {position}: {message}")]
    Grammar { position: usize, message: String },
    #[error("a grammar is required to check realizability")]
    MissingGrammar,
    #[error("could not read {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn err<T>(self) -> Result<T> {
        Err(self)
    }
}
