//! # Regex
//!
//! A small regex engine with partial-match semantics. A plain match/no-match
//! answer is not enough to lex a prefix that is still being written: the lexer
//! needs to know, for any text, whether it is already a complete instance of a
//! pattern ([`Status::Accepting`]), whether it may still become one
//! ([`Status::Viable`]), or whether no continuation can ever match
//! ([`Status::Dead`]).
//!
//! Patterns are compiled to a program for a Pike VM, which is simulated one
//! character at a time by a [`Cursor`].

mod api;
mod matching;
mod parsing;

pub use api::{Cursor, Pattern};
pub use matching::Status;
pub use parsing::RegexError;
