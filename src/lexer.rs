//! # Lexer
//!
//! This module contains the types needed to tokenize a prefix of some input, without resolving ambiguities:
//!  - [`LexerSpec`] holds the token definitions and the pattern of ignored content. Lexing a prefix gives
//!    back the set of all its [`Lexing`]s.
//!  - [`LexerSpecBuilder`] is the builder struct for [`LexerSpec`]; it compiles the patterns.
//!  - [`Token`] is a single lexical match. Only the last token of a lexing may be incomplete, because the
//!    prefix may still grow.

mod spec;
mod token;

pub use spec::{LexerSpec, LexerSpecBuilder, Lexing, Lexings};
pub use token::{Token, TokenKind};
