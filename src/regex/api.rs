use super::matching::{self, Program, Status, Threads};
use super::parsing::compile;
use crate::error::{Error, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;


struct Compiled {
    source: Box<str>,
    program: Program,
    start: Threads,
}

/// # Summary
///
/// `Pattern` is a compiled regular expression that can report, for any text,
/// whether it is a complete match, a prefix of a complete match, or neither.
/// Matches are always anchored at the beginning of the text.
///
/// Patterns are cheap to clone, and two patterns compare equal when they were
/// built from the same source.
#[derive(Clone)]
pub struct Pattern {
    inner: Arc<Compiled>,
}

impl Pattern {
    /// Compile `source`. Fails if `source` is malformed or uses a construct
    /// without meaning for a growing prefix, such as anchors.
    pub fn new(source: &str) -> Result<Self> {
        let program = compile(source).map_err(|error| Error::Regex {
            pattern: source.to_string(),
            source: error,
        })?;
        let start = matching::start(&program);
        Ok(Self {
            inner: Arc::new(Compiled {
                source: source.into(),
                program,
                start,
            }),
        })
    }

    /// The pattern matching only the empty string.
    pub fn empty() -> Self {
        let mut program = Program::new();
        program.push(matching::Instruction::Match);
        let start = matching::start(&program);
        Self {
            inner: Arc::new(Compiled {
                source: "".into(),
                program,
                start,
            }),
        }
    }

    pub fn source(&self) -> &str {
        &self.inner.source
    }

    /// A matcher that has not read anything yet.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            program: &self.inner.program,
            threads: self.inner.start.clone(),
        }
    }

    /// Read `text` entirely, stopping early once the match is dead.
    pub fn status(&self, text: &str) -> Status {
        let mut cursor = self.cursor();
        for chr in text.chars() {
            cursor.advance(chr);
            if cursor.status() == Status::Dead {
                break;
            }
        }
        cursor.status()
    }

    /// Whether `text` by itself is a complete match.
    pub fn fullmatch(&self, text: &str) -> bool {
        self.status(text) == Status::Accepting
    }

    /// Whether `text` can be extended into a complete match (possibly by nothing).
    pub fn viable(&self, text: &str) -> bool {
        self.status(text) != Status::Dead
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source().hash(state);
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source()).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source())
    }
}

/// An in-progress match of a [`Pattern`], fed one character at a time.
/// Cloning a cursor forks the match.
#[derive(Clone, Debug)]
pub struct Cursor<'pattern> {
    program: &'pattern Program,
    threads: Threads,
}

impl Cursor<'_> {
    pub fn status(&self) -> Status {
        self.threads.status()
    }

    pub fn advance(&mut self, chr: char) {
        self.threads = matching::step(self.program, &self.threads, chr);
    }

    /// The cursor one character further, leaving `self` untouched.
    pub fn advanced(&self, chr: char) -> Self {
        Self {
            program: self.program,
            threads: matching::step(self.program, &self.threads, chr),
        }
    }
}
