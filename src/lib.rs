//! # Sprout
//!
//! Sprout checks whether a growing prefix of some input can still be completed into an input
//! accepted by a grammar.
//!
//! Lexing a prefix is ambiguous: the last token may still grow, and several token kinds may match
//! the same text. A [`LexerSpec`] therefore returns every plausible tokenization of a prefix, and a
//! [`RealizabilityChecker`] feeds all of them to a derivative-based grammar engine, such as
//! [`Lang`], before testing the remaining grammar for emptiness.

pub mod cache;
pub mod config;
pub mod derivative;
pub mod error;
pub mod lexer;
pub mod realizability;
pub mod regex;

pub use derivative::{KindGrammar, Lang};
pub use error::{Error, Result};
pub use lexer::{LexerSpec, LexerSpecBuilder, Lexing, Lexings, Token, TokenKind};
pub use realizability::{DerivativeParser, RealizabilityChecker, TreeGrammar};
pub use regex::{Pattern, Status};
