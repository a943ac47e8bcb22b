//! # Config
//!
//! JSON descriptions of lexers and checkers.
//!
//! ```json
//! {
//!   "tokens": [
//!     { "kind": "var", "pattern": "[a-z]+" },
//!     { "kind": "dot", "pattern": "\\." }
//!   ],
//!   "ignore": "\\s+",
//!   "grammar": "var (dot var)*",
//!   "forbid": ["dot"],
//!   "cache": 128
//! }
//! ```
//!
//! Only `tokens` is required. `grammar` is needed to build a checker, whose constraint drops
//! every completion using a kind of `forbid`. `cache` enables the memoization of lexings.

use crate::derivative::{KindGrammar, Lang};
use crate::error::{Error, Result};
use crate::lexer::LexerSpec;
use crate::realizability::RealizabilityChecker;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};


#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    pub kind: String,
    pub pattern: String,
}

/// # Summary
///
/// `Config` is the deserialized form of a configuration file. Nothing is
/// compiled until [`Config::lexer`] or [`Config::checker`] is called.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub tokens: Vec<TokenConfig>,
    #[serde(default)]
    pub ignore: Option<String>,
    #[serde(default)]
    pub grammar: Option<String>,
    #[serde(default)]
    pub forbid: Vec<String>,
    #[serde(default)]
    pub cache: Option<usize>,
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "read config");
        source.parse()
    }

    pub fn lexer(&self) -> Result<LexerSpec<String>> {
        let builder = self
            .tokens
            .iter()
            .fold(LexerSpec::builder(), |builder, token| {
                builder.with_token(token.kind.clone(), token.pattern.as_str())
            });
        let builder = match &self.ignore {
            Some(ignore) => builder.with_ignore(ignore.as_str()),
            None => builder,
        };
        builder.build()
    }

    pub fn grammar(&self) -> Result<Lang<String>> {
        match &self.grammar {
            Some(source) => Lang::parse(source),
            None => Error::MissingGrammar.err(),
        }
    }

    /// A checker for the grammar, which rejects any completion using a forbidden kind.
    pub fn checker(&self) -> Result<RealizabilityChecker<Lang<String>>> {
        let lexer = self.lexer()?;
        let grammar = self.grammar()?;
        for kind in &self.forbid {
            if !self.tokens.iter().any(|token| &token.kind == kind) {
                warn!(kind = %kind, "forbidden kind is not a token kind");
            }
        }
        let forbid = self.forbid.clone();
        let checker = RealizabilityChecker::new(
            move |grammar: KindGrammar<String>| {
                Ok(forbid
                    .iter()
                    .fold(grammar, |grammar, kind| grammar.without(kind)))
            },
            grammar,
            lexer,
        );
        Ok(match self.cache {
            Some(capacity) => checker.with_cache(capacity),
            None => checker,
        })
    }
}
