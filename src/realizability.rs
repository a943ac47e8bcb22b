//! # Realizability
//!
//! Deciding whether a prefix can still be completed into an input that both the grammar and an
//! additional constraint accept.
//!
//! The grammar engine is abstracted by [`DerivativeParser`]: a parser state can be narrowed by a
//! token, several states can be merged, and a state can be projected to an inspectable
//! [`TreeGrammar`]. [`RealizabilityChecker`] glues such an engine to a [`LexerSpec`]: since the
//! tokenization of a prefix is ambiguous, every lexing is fed to the engine and the resulting
//! states are merged.

use crate::cache::LruCache;
use crate::lexer::{LexerSpec, Lexings, Token, TokenKind};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;


/// A declarative representation of a set of completions, which can be tested for emptiness.
pub trait TreeGrammar {
    fn is_empty(&self) -> bool;
}

/// # Summary
///
/// `DerivativeParser` is a parser state of a derivative-based grammar engine. A
/// state stands for the set of token sequences that may still follow what has
/// been read so far. All operations are pure.
///
/// # Methods
///
/// `derive`: narrow the state to what may follow `token`
/// `union`: merge states; the union of no state is the empty state
/// `finalize`: restrict the state to what is acceptable without further input
/// `project`: turn the state into an inspectable grammar
pub trait DerivativeParser: Clone {
    type Kind: TokenKind;
    type Grammar: TreeGrammar + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn derive(&self, token: &Token<Self::Kind>) -> Result<Self, Self::Error>;
    fn union(states: Vec<Self>) -> Result<Self, Self::Error>;
    fn finalize(&self) -> Result<Self, Self::Error>;
    fn project(&self) -> Result<Self::Grammar, Self::Error>;
}

/// A side-effect-free restriction of a grammar.
pub type Constraint<P> = Arc<
    dyn Fn(
            <P as DerivativeParser>::Grammar,
        ) -> Result<<P as DerivativeParser>::Grammar, <P as DerivativeParser>::Error>
        + Send
        + Sync,
>;

type LexingCache<K> = Mutex<LruCache<(String, bool), Arc<Lexings<K>>>>;

/// # Summary
///
/// `RealizabilityChecker` decides whether a prefix has at least one completion
/// accepted by both the grammar of `parser` and the constraint.
///
/// A checker can be shared between threads: the only mutable state is the
/// optional lexing cache, which is locked around each access.
pub struct RealizabilityChecker<P: DerivativeParser> {
    constraint: Constraint<P>,
    parser: P,
    lexer: Arc<LexerSpec<P::Kind>>,
    cache: Option<LexingCache<P::Kind>>,
}

impl<P: DerivativeParser> RealizabilityChecker<P> {
    /// Build a checker from a constraint, the initial parser state, and a lexer.
    pub fn new<F>(constraint: F, parser: P, lexer: impl Into<Arc<LexerSpec<P::Kind>>>) -> Self
    where
        F: Fn(P::Grammar) -> Result<P::Grammar, P::Error> + Send + Sync + 'static,
    {
        Self {
            constraint: Arc::new(constraint),
            parser,
            lexer: lexer.into(),
            cache: None,
        }
    }

    /// A checker whose constraint accepts the whole grammar.
    pub fn unconstrained(parser: P, lexer: impl Into<Arc<LexerSpec<P::Kind>>>) -> Self {
        Self::new(Ok, parser, lexer)
    }

    /// Memoize the lexings of the last `capacity` prefixes.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(Mutex::new(LruCache::new(capacity)));
        self
    }

    pub fn lexer(&self) -> &LexerSpec<P::Kind> {
        &self.lexer
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Whether `prefix` can be completed into an accepted input. When `is_final`, `prefix`
    /// must itself be that input.
    ///
    /// A prefix that cannot be lexed is not realizable. Errors of the engine or of the
    /// constraint are returned as is.
    pub fn realizable(&self, prefix: &str, is_final: bool) -> Result<bool, P::Error> {
        let lexings = self.lexings(prefix, is_final);
        let states = lexings
            .iter()
            .map(|lexing| {
                lexing
                    .iter()
                    .try_fold(self.parser.clone(), |state, token| state.derive(token))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut state = P::union(states)?;
        if is_final {
            state = state.finalize()?;
        }
        let grammar = (self.constraint)(state.project()?)?;
        let realizable = !grammar.is_empty();
        debug!(
            length = prefix.len(),
            is_final,
            lexings = lexings.len(),
            realizable,
            "checked prefix"
        );
        Ok(realizable)
    }

    fn lexings(&self, prefix: &str, is_final: bool) -> Arc<Lexings<P::Kind>> {
        let Some(cache) = &self.cache else {
            return Arc::new(self.lexer.lex_with(prefix, is_final));
        };
        let key = (prefix.to_string(), is_final);
        if let Some(lexings) = cache.lock().get(&key) {
            debug!(length = prefix.len(), is_final, "lexing cache hit");
            return Arc::clone(lexings);
        }
        let lexings = Arc::new(self.lexer.lex_with(prefix, is_final));
        cache.lock().put(key, Arc::clone(&lexings));
        lexings
    }
}
