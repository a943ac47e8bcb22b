//! # Derivative
//!
//! A reference grammar engine for [`RealizabilityChecker`]: regular languages over token kinds,
//! narrowed by Brzozowski derivatives.
//!
//! A [`Lang`] is both the parser state and, once projected, the inspectable grammar
//! ([`KindGrammar`]) handed to constraints. Kind expressions can be read from text with
//! [`Lang::parse`]:
//!
//! ```text
//! print lpar (var (dot (var | caps))*)? rpar
//! ```
//!
//! [`RealizabilityChecker`]: crate::realizability::RealizabilityChecker

use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};
use crate::realizability::{DerivativeParser, TreeGrammar};
use std::collections::{BTreeSet, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexerSpec;
    use crate::realizability::RealizabilityChecker;

    fn parse(source: &str) -> Lang<String> {
        Lang::parse(source).unwrap()
    }

    fn kind(name: &str) -> String {
        name.to_string()
    }

    #[test]
    fn smart_constructors() {
        let a = Lang::kind(kind("a"));
        assert_eq!(Lang::seq(Lang::Epsilon, a.clone()), a);
        assert_eq!(Lang::seq(a.clone(), Lang::Empty), Lang::Empty);
        assert_eq!(Lang::alt(Lang::Empty, a.clone()), a);
        assert_eq!(Lang::alt(a.clone(), a.clone()), a);
        assert_eq!(Lang::star(Lang::star(a.clone())), Lang::star(a));
        assert_eq!(Lang::<String>::star(Lang::Empty), Lang::Epsilon);
    }

    #[test]
    fn derive() {
        let lang = parse("var (dot var)*");
        assert!(!lang.nullable());
        let var = lang.derive_kind(&kind("var"));
        assert!(var.nullable());
        let dot = var.derive_kind(&kind("dot"));
        assert!(!dot.nullable());
        assert!(!dot.is_empty());
        assert!(dot.derive_kind(&kind("var")).nullable());
        assert!(dot.derive_kind(&kind("dot")).is_empty());
        assert!(lang.derive_kind(&kind("dot")).is_empty());
    }

    #[test]
    fn alternatives_are_normalized() {
        let (a, b, c) = (parse("a"), parse("b"), parse("c"));
        let left = Lang::alt(Lang::alt(a.clone(), b.clone()), c.clone());
        let right = Lang::alt(c.clone(), Lang::alt(b.clone(), a.clone()));
        assert_eq!(left, right);
        assert_eq!(Lang::alt(left.clone(), a), left);
        assert_eq!(Lang::alt_all(vec![Lang::Empty, b.clone(), Lang::Empty]), b);
        assert_eq!(Lang::<String>::alt_all(Vec::new()), Lang::Empty);
    }

    #[test]
    fn derivatives_stay_bounded() {
        let mut lang = parse("(a | a a)*");
        let mut states = HashSet::new();
        for _ in 0..50 {
            lang = lang.derive_kind(&kind("a"));
            assert!(lang.nullable());
            assert!(lang.to_string().len() < 64, "{}", lang);
            states.insert(lang.clone());
        }
        assert!(states.len() <= 4);
    }

    #[test]
    fn many_tokens_realizable() {
        let lexer = LexerSpec::builder()
            .with_token(kind("a"), "a")
            .with_ignore(r"\s+")
            .build()
            .unwrap();
        let checker = RealizabilityChecker::unconstrained(parse("(a | a a)*"), lexer);
        let prefix = "a ".repeat(200);
        assert!(checker.realizable(&prefix, false).unwrap());
        assert!(checker.realizable(&prefix, true).unwrap());
    }

    #[test]
    fn delta() {
        assert_eq!(parse("a*").delta(), Lang::Epsilon);
        assert_eq!(parse("a+").delta(), Lang::Empty);
        assert_eq!(parse("a?").delta(), Lang::Epsilon);
    }

    #[test]
    fn without() {
        let lang = parse("a (b | c) d*");
        assert!(!lang.without(&kind("b")).is_empty());
        assert!(lang.without(&kind("b")).without(&kind("c")).is_empty());
        assert!(!lang.without(&kind("d")).is_empty());
        assert!(lang.without(&kind("a")).is_empty());
    }

    #[test]
    fn first_kinds() {
        let lang = parse("a? (b | c) d");
        let expected: HashSet<_> = ["a", "b", "c"].into_iter().map(kind).collect();
        assert_eq!(lang.first_kinds(), expected);
        assert!(parse("()").first_kinds().is_empty());
        assert!(Lang::seq(parse("a"), Lang::Empty).first_kinds().is_empty());
    }

    #[test]
    fn parsing() {
        assert_eq!(parse("()"), Lang::Epsilon);
        assert_eq!(parse("a"), Lang::kind(kind("a")));
        assert_eq!(
            parse("a b | c"),
            Lang::alt(
                Lang::seq(Lang::kind(kind("a")), Lang::kind(kind("b"))),
                Lang::kind(kind("c"))
            )
        );
        assert_eq!(parse("a+"), parse("a a*"));
        assert_eq!(parse("(a)?"), Lang::alt(parse("a"), Lang::Epsilon));
        assert_eq!(parse("  a_1  "), Lang::kind(kind("a_1")));
    }

    #[test]
    fn parsing_errors() {
        for (source, position) in [("(a", 2), ("a)", 1), ("a & b", 2), ("*", 0)] {
            match Lang::parse(source) {
                Err(Error::Grammar { position: at, .. }) => assert_eq!(at, position, "{}", source),
                other => panic!("unexpected {:?} for {}", other, source),
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(parse("a (b | c)* d?").to_string(), "a (b | c)* (() | d)");
        assert_eq!(parse("a | ()").to_string(), "() | a");
        assert_eq!(parse("a b | c").to_string(), "c | a b");
    }

    fn checker(forbid: &'static [&'static str]) -> RealizabilityChecker<Lang<String>> {
        let lexer = LexerSpec::builder()
            .with_token(kind("print"), r"print\$")
            .with_token(kind("lpar"), r"\(")
            .with_token(kind("rpar"), r"\)")
            .with_token(kind("var"), "[a-z]+")
            .with_token(kind("dot"), r"\.")
            .with_token(kind("caps"), "tocaps")
            .with_ignore(r"\s+")
            .build()
            .unwrap();
        let grammar = parse("print lpar (var (dot (var | caps))*)? rpar");
        RealizabilityChecker::new(
            move |grammar: KindGrammar<String>| {
                Ok(forbid
                    .iter()
                    .fold(grammar, |grammar, name| grammar.without(&kind(name))))
            },
            grammar,
            lexer,
        )
    }

    #[test]
    fn realizable() {
        let checker = checker(&[]);
        assert!(checker.realizable("", false).unwrap());
        assert!(checker.realizable("print$( foo.tocap", false).unwrap());
        assert!(!checker.realizable("print$( foo.tocap", true).unwrap());
        assert!(checker.realizable("print$( foo.tocaps )", true).unwrap());
        assert!(!checker.realizable("print$( foo..", false).unwrap());
        assert!(!checker.realizable("print$( 42", false).unwrap());
        assert!(!checker.realizable("", true).unwrap());
    }

    #[test]
    fn realizable_constrained() {
        let without_caps = checker(&["caps"]);
        assert!(without_caps.realizable("print$( foo.tocaps", false).unwrap());
        assert!(without_caps.realizable("print$( foo.tocaps )", true).unwrap());
        let without_rpar = checker(&["rpar"]);
        assert!(!without_rpar.realizable("", false).unwrap());
        assert!(!without_rpar.realizable("print$( foo", false).unwrap());
    }
}

/// # Summary
///
/// `Lang` is a regular expression over token kinds, denoting a set of token
/// sequences. Building through [`Lang::seq`], [`Lang::alt`] and [`Lang::star`]
/// keeps expressions simplified, so that an empty language is always
/// syntactically [`Lang::Empty`] or built from it.
///
/// Alternatives are kept as a flat ordered set, so that two alternations of the
/// same operands are equal whatever their nesting, order or repetitions. This
/// bounds the number of distinct derivatives of an expression.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang<K> {
    /// No sequence at all.
    Empty,
    /// Only the empty sequence.
    Epsilon,
    Kind(K),
    Seq(Arc<Lang<K>>, Arc<Lang<K>>),
    /// At least two alternatives, none of them `Empty` or itself an `Alt`.
    Alt(Arc<BTreeSet<Lang<K>>>),
    Star(Arc<Lang<K>>),
}

impl<K: TokenKind + Ord> Lang<K> {
    pub fn kind(kind: K) -> Self {
        Self::Kind(kind)
    }

    pub fn seq(left: Self, right: Self) -> Self {
        match (left, right) {
            (Self::Empty, _) | (_, Self::Empty) => Self::Empty,
            (Self::Epsilon, other) | (other, Self::Epsilon) => other,
            (left, right) => Self::Seq(Arc::new(left), Arc::new(right)),
        }
    }

    pub fn alt(left: Self, right: Self) -> Self {
        Self::alt_all([left, right])
    }

    /// The alternation of every language of `langs`. Nested alternations are flattened.
    pub fn alt_all(langs: impl IntoIterator<Item = Self>) -> Self {
        let mut alternatives = BTreeSet::new();
        for lang in langs {
            match lang {
                Self::Empty => {}
                Self::Alt(inner) => alternatives.extend(inner.iter().cloned()),
                lang => {
                    alternatives.insert(lang);
                }
            }
        }
        if alternatives.len() > 1 {
            Self::Alt(Arc::new(alternatives))
        } else {
            alternatives.pop_first().unwrap_or(Self::Empty)
        }
    }

    pub fn star(inner: Self) -> Self {
        match inner {
            Self::Empty | Self::Epsilon => Self::Epsilon,
            star @ Self::Star(_) => star,
            inner => Self::Star(Arc::new(inner)),
        }
    }

    /// One or more repetitions.
    pub fn plus(inner: Self) -> Self {
        Self::seq(inner.clone(), Self::star(inner))
    }

    pub fn optional(inner: Self) -> Self {
        Self::alt(inner, Self::Epsilon)
    }

    /// Whether the empty sequence belongs to the language.
    pub fn nullable(&self) -> bool {
        match self {
            Self::Empty | Self::Kind(_) => false,
            Self::Epsilon | Self::Star(_) => true,
            Self::Seq(left, right) => left.nullable() && right.nullable(),
            Self::Alt(alternatives) => alternatives.iter().any(Self::nullable),
        }
    }

    /// Whether the language has no sequence.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Epsilon | Self::Kind(_) | Self::Star(_) => false,
            Self::Seq(left, right) => left.is_empty() || right.is_empty(),
            Self::Alt(alternatives) => alternatives.iter().all(Self::is_empty),
        }
    }

    /// The sequences that, once prefixed by `kind`, belong to the language.
    pub fn derive_kind(&self, kind: &K) -> Self {
        match self {
            Self::Empty | Self::Epsilon => Self::Empty,
            Self::Kind(own) if own == kind => Self::Epsilon,
            Self::Kind(_) => Self::Empty,
            Self::Seq(left, right) => {
                let first = Self::seq(left.derive_kind(kind), (**right).clone());
                if left.nullable() {
                    Self::alt(first, right.derive_kind(kind))
                } else {
                    first
                }
            }
            Self::Alt(alternatives) => {
                Self::alt_all(alternatives.iter().map(|lang| lang.derive_kind(kind)))
            }
            Self::Star(inner) => Self::seq(inner.derive_kind(kind), self.clone()),
        }
    }

    /// The empty sequence if it belongs to the language, nothing otherwise.
    pub fn delta(&self) -> Self {
        if self.nullable() {
            Self::Epsilon
        } else {
            Self::Empty
        }
    }

    /// The sequences of the language that never use `kind`.
    pub fn without(&self, kind: &K) -> Self {
        match self {
            Self::Kind(own) if own == kind => Self::Empty,
            Self::Empty | Self::Epsilon | Self::Kind(_) => self.clone(),
            Self::Seq(left, right) => Self::seq(left.without(kind), right.without(kind)),
            Self::Alt(alternatives) => {
                Self::alt_all(alternatives.iter().map(|lang| lang.without(kind)))
            }
            Self::Star(inner) => Self::star(inner.without(kind)),
        }
    }

    /// The kinds a non-empty sequence of the language may start with.
    pub fn first_kinds(&self) -> HashSet<K> {
        let mut kinds = HashSet::new();
        self.collect_first(&mut kinds);
        kinds
    }

    fn collect_first(&self, kinds: &mut HashSet<K>) {
        match self {
            Self::Empty | Self::Epsilon => {}
            Self::Kind(kind) => {
                kinds.insert(kind.clone());
            }
            Self::Seq(left, right) => {
                if left.is_empty() || right.is_empty() {
                    return;
                }
                left.collect_first(kinds);
                if left.nullable() {
                    right.collect_first(kinds);
                }
            }
            Self::Alt(alternatives) => {
                for lang in alternatives.iter() {
                    lang.collect_first(kinds);
                }
            }
            Self::Star(inner) => inner.collect_first(kinds),
        }
    }
}

impl Lang<String> {
    /// Read a kind expression. Kinds are identifiers; they are combined by
    /// juxtaposition, `|`, and the postfix operators `*`, `+` and `?`. `()` is
    /// the empty sequence.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = KindParser {
            source,
            position: 0,
        };
        let lang = parser.alternative()?;
        parser.skip_whitespace();
        match parser.peek() {
            None => Ok(lang),
            Some(chr) => parser.error(format!("unexpected {:?}", chr)),
        }
    }
}

struct KindParser<'a> {
    source: &'a str,
    position: usize,
}

impl KindParser<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(chr) = self.peek() {
            self.position += chr.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn error<T>(&self, message: String) -> Result<T> {
        Error::Grammar {
            position: self.position,
            message,
        }
        .err()
    }

    fn alternative(&mut self) -> Result<Lang<String>> {
        let mut lang = self.sequence()?;
        loop {
            self.skip_whitespace();
            if self.peek() != Some('|') {
                return Ok(lang);
            }
            self.bump();
            lang = Lang::alt(lang, self.sequence()?);
        }
    }

    fn sequence(&mut self) -> Result<Lang<String>> {
        let mut lang = Lang::Epsilon;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None | Some('|') | Some(')') => return Ok(lang),
                Some(_) => lang = Lang::seq(lang, self.postfix()?),
            }
        }
    }

    fn postfix(&mut self) -> Result<Lang<String>> {
        let mut lang = self.atom()?;
        loop {
            lang = match self.peek() {
                Some('*') => Lang::star(lang),
                Some('+') => Lang::plus(lang),
                Some('?') => Lang::optional(lang),
                _ => return Ok(lang),
            };
            self.bump();
        }
    }

    fn atom(&mut self) -> Result<Lang<String>> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let lang = self.alternative()?;
                self.skip_whitespace();
                if self.peek() != Some(')') {
                    return self.error("expected ')'".to_string());
                }
                self.bump();
                Ok(lang)
            }
            Some(chr) if is_kind_char(chr) => {
                let start = self.position;
                while self.peek().map_or(false, is_kind_char) {
                    self.bump();
                }
                Ok(Lang::kind(self.source[start..self.position].to_string()))
            }
            Some(chr) => self.error(format!("unexpected {:?}", chr)),
            None => self.error("unexpected end of grammar".to_string()),
        }
    }
}

fn is_kind_char(chr: char) -> bool {
    chr.is_alphanumeric() || chr == '_' || chr == '-'
}

impl<K: fmt::Display> Lang<K> {
    fn fmt_with(&self, f: &mut fmt::Formatter<'_>, precedence: u8) -> fmt::Result {
        let own = match self {
            Self::Alt(..) => 0,
            Self::Seq(..) => 1,
            _ => 2,
        };
        if own < precedence {
            write!(f, "(")?;
        }
        match self {
            Self::Empty => write!(f, "!")?,
            Self::Epsilon => write!(f, "()")?,
            Self::Kind(kind) => write!(f, "{}", kind)?,
            Self::Seq(left, right) => {
                left.fmt_with(f, 1)?;
                write!(f, " ")?;
                right.fmt_with(f, 1)?;
            }
            Self::Alt(alternatives) => {
                for (i, lang) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    lang.fmt_with(f, 1)?;
                }
            }
            Self::Star(inner) => {
                inner.fmt_with(f, 3)?;
                write!(f, "*")?;
            }
        }
        if own < precedence {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl<K: fmt::Display> fmt::Display for Lang<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with(f, 0)
    }
}

impl<K: TokenKind + Ord + 'static> DerivativeParser for Lang<K> {
    type Kind = K;
    type Grammar = KindGrammar<K>;
    type Error = Infallible;

    fn derive(&self, token: &Token<K>) -> std::result::Result<Self, Infallible> {
        Ok(self.derive_kind(token.kind()))
    }

    fn union(states: Vec<Self>) -> std::result::Result<Self, Infallible> {
        Ok(Self::alt_all(states))
    }

    fn finalize(&self) -> std::result::Result<Self, Infallible> {
        Ok(self.delta())
    }

    fn project(&self) -> std::result::Result<KindGrammar<K>, Infallible> {
        Ok(KindGrammar(self.clone()))
    }
}

/// The grammar of the completions left by a [`Lang`] state, handed to constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindGrammar<K>(Lang<K>);

impl<K: TokenKind + Ord> KindGrammar<K> {
    pub fn lang(&self) -> &Lang<K> {
        &self.0
    }

    /// Drop every completion that uses `kind`.
    pub fn without(self, kind: &K) -> Self {
        Self(self.0.without(kind))
    }

    /// Whether nothing more is needed.
    pub fn nullable(&self) -> bool {
        self.0.nullable()
    }

    pub fn first_kinds(&self) -> HashSet<K> {
        self.0.first_kinds()
    }
}

impl<K: TokenKind + Ord> TreeGrammar for KindGrammar<K> {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
