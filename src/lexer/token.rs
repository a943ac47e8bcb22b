use crate::regex::Pattern;
use std::fmt;
use std::hash::Hash;

#[cfg(test)]
mod tests {
    use super::*;

    fn var() -> Token<&'static str> {
        Token::new("var", Pattern::new("[a-z]+").unwrap())
    }

    #[test]
    fn token() {
        let token = var();
        assert_eq!(*token.kind(), "var");
        assert_eq!(token.text(), "");
        assert!(!token.is_complete());
        assert!(token.viable());
        assert!(!token.nullable());
    }

    #[test]
    fn extend() {
        let token = var().extend("fo");
        let longer = token.extend("o");
        assert_eq!(token.text(), "fo");
        assert_eq!(longer.text(), "foo");
        assert!(longer.nullable());
        assert!(!longer.is_complete());
        assert!(!var().extend("f0").viable());
    }

    #[test]
    fn mark_complete() {
        let token = var().extend("foo").mark_complete();
        assert!(token.is_complete());
        assert_eq!(token.text(), "foo");
        assert_eq!(token.extend("d").text(), "food");
        assert!(!token.extend("d").is_complete());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn mark_complete_not_nullable() {
        Token::new("print", Pattern::new("print").unwrap())
            .extend("pri")
            .mark_complete();
    }

    #[test]
    fn merge() {
        let old = var().extend("fo");
        let new = var().extend("foo");
        assert_eq!(old.merge(&new), Some(new.clone()));
        let print = Token::new("print", Pattern::new("print").unwrap()).extend("p");
        assert_eq!(old.merge(&print), None);
    }

    #[test]
    fn display() {
        assert_eq!(var().extend("foo").to_string(), "(\"var\", \"foo\")…");
        assert_eq!(
            var().extend("foo").mark_complete().to_string(),
            "(\"var\", \"foo\")"
        );
    }
}

/// Anything that can tell token categories apart.
pub trait TokenKind: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> TokenKind for T {}

/// # Summary
///
/// `Token` is one lexical match, complete or still growing. It contains
///  - `kind`: the category of the token;
///  - `pattern`: the regex every instance of `kind` matches;
///  - `text`: the substring matched so far;
///  - `complete`: whether the match is over. A complete token is always
///    nullable, an incomplete one is always viable.
///
/// Tokens are values: every operation returns a new token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token<K> {
    kind: K,
    pattern: Pattern,
    text: String,
    complete: bool,
}

impl<K: TokenKind> Token<K> {
    /// An incomplete token of `kind` that has not matched anything yet.
    pub fn new(kind: K, pattern: Pattern) -> Self {
        Self {
            kind,
            pattern,
            text: String::new(),
            complete: false,
        }
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether the text is by itself a complete instance of the pattern.
    pub fn nullable(&self) -> bool {
        self.pattern.fullmatch(&self.text)
    }

    /// Whether the text can still grow into an instance of the pattern.
    pub fn viable(&self) -> bool {
        self.pattern.viable(&self.text)
    }

    /// The incomplete token with `text` appended. The pattern is not checked,
    /// callers only extend with characters they know keep the match viable.
    pub fn extend(&self, text: &str) -> Self {
        let mut extended = String::with_capacity(self.text.len() + text.len());
        extended.push_str(&self.text);
        extended.push_str(text);
        Self {
            kind: self.kind.clone(),
            pattern: self.pattern.clone(),
            text: extended,
            complete: false,
        }
    }

    /// The same token, marked complete. Its text must be nullable.
    pub fn mark_complete(&self) -> Self {
        debug_assert!(
            self.nullable(),
            "token {:?} marked complete but {:?} does not match {}",
            self.kind,
            self.text,
            self.pattern
        );
        Self {
            complete: true,
            ..self.clone()
        }
    }

    /// Replace a previously recorded token with a newer observation of the
    /// same kind. There is no merge across kinds.
    pub fn merge(&self, other: &Self) -> Option<Self> {
        (self.kind == other.kind).then(|| other.clone())
    }
}

impl<K: fmt::Debug> fmt::Display for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.kind, self.text)?;
        if !self.complete {
            write!(f, "…")?;
        }
        Ok(())
    }
}
