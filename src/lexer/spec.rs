use super::token::{Token, TokenKind};
use crate::error::{Error, Result};
use crate::regex::{Pattern, Status};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace};

#[cfg(test)]
mod tests {
    use super::*;

    type Kind = &'static str;

    fn token(kind: Kind, pattern: &str, text: &str, complete: bool) -> Token<Kind> {
        let token = Token::new(kind, Pattern::new(pattern).unwrap()).extend(text);
        if complete {
            token.mark_complete()
        } else {
            token
        }
    }

    fn lexings(all: Vec<Vec<Token<Kind>>>) -> Lexings<Kind> {
        all.into_iter().collect()
    }

    fn empty() -> Lexings<Kind> {
        lexings(vec![vec![]])
    }

    fn abc(ignore: &str) -> LexerSpec<Kind> {
        LexerSpec::builder()
            .with_token("a", "a")
            .with_token("b", "b")
            .with_token("c", "c")
            .with_ignore(ignore)
            .build()
            .unwrap()
    }

    fn program() -> LexerSpec<Kind> {
        LexerSpec::builder()
            .with_token("print", r"print\$")
            .with_token("lpar", r"\(")
            .with_token("rpar", r"\)")
            .with_token("var", "[a-z]+")
            .with_token("dot", r"\.")
            .with_token("caps", "tocaps")
            .with_ignore(r"\s+")
            .build()
            .unwrap()
    }

    #[test]
    fn partial_lex_abc() {
        let spec = abc("");
        assert_eq!(
            spec.partial_lex("abc"),
            lexings(vec![vec![
                token("a", "a", "a", true),
                token("b", "b", "b", true),
                token("c", "c", "c", false),
            ]])
        );
        assert_eq!(spec.partial_lex(""), empty());
        assert_eq!(spec.partial_lex("d"), Lexings::new());
        assert_eq!(spec.partial_lex("abdc"), Lexings::new());
    }

    #[test]
    fn partial_lex_ignore() {
        let spec = abc(r"\s+");
        assert_eq!(
            spec.partial_lex("a b   c"),
            lexings(vec![vec![
                token("a", "a", "a", true),
                token("b", "b", "b", true),
                token("c", "c", "c", false),
            ]])
        );
        assert_eq!(spec.partial_lex("    "), empty());
        assert_eq!(spec.lex("    "), empty());
        assert_eq!(
            spec.partial_lex(" a "),
            lexings(vec![vec![token("a", "a", "a", true)]])
        );
    }

    #[test]
    fn partial_lex_disjoint() {
        let spec = LexerSpec::builder()
            .with_token("a", "a+")
            .with_token("b", "b+")
            .build()
            .unwrap();
        assert_eq!(
            spec.partial_lex("aaaa"),
            lexings(vec![vec![token("a", "a+", "aaaa", false)]])
        );
        assert_eq!(
            spec.partial_lex("aaabaabb"),
            lexings(vec![vec![
                token("a", "a+", "aaa", true),
                token("b", "b+", "b", true),
                token("a", "a+", "aa", true),
                token("b", "b+", "bb", false),
            ]])
        );
        assert_eq!(
            spec.lex("aaabaabb"),
            lexings(vec![vec![
                token("a", "a+", "aaa", true),
                token("b", "b+", "b", true),
                token("a", "a+", "aa", true),
                token("b", "b+", "bb", true),
            ]])
        );
        assert_eq!(spec.partial_lex(""), empty());
    }

    #[test]
    fn partial_lex_nonsingleton() {
        let spec = program();
        let head = vec![
            token("print", r"print\$", "print$", true),
            token("lpar", r"\(", "(", true),
            token("var", "[a-z]+", "foo", true),
            token("dot", r"\.", ".", true),
        ];
        let with = |last: Token<Kind>| {
            let mut lexing = head.clone();
            lexing.push(last);
            lexing
        };
        assert_eq!(
            spec.partial_lex("print$( foo.tocap"),
            lexings(vec![
                with(token("caps", "tocaps", "tocap", false)),
                with(token("var", "[a-z]+", "tocap", false)),
            ])
        );

        let head = vec![
            token("rpar", r"\)", ")", true),
            token("rpar", r"\)", ")", true),
            token("lpar", r"\(", "(", true),
            token("var", "[a-z]+", "zip", true),
        ];
        let with = |last: Token<Kind>| {
            let mut lexing = head.clone();
            lexing.push(last);
            lexing
        };
        assert_eq!(
            spec.partial_lex("  ))( zip prin"),
            lexings(vec![
                with(token("print", r"print\$", "prin", false)),
                with(token("var", "[a-z]+", "prin", false)),
            ])
        );
        assert_eq!(
            spec.partial_lex("  ))( zip prin "),
            lexings(vec![with(token("var", "[a-z]+", "prin", true))])
        );
    }

    #[test]
    fn partial_lex_finalize() {
        let spec = LexerSpec::builder()
            .with_token("print", "print")
            .with_token("var", "[a-z]+")
            .with_ignore(r"\s+")
            .build()
            .unwrap();
        assert_eq!(
            spec.partial_lex("a p"),
            lexings(vec![
                vec![
                    token("var", "[a-z]+", "a", true),
                    token("var", "[a-z]+", "p", false),
                ],
                vec![
                    token("var", "[a-z]+", "a", true),
                    token("print", "print", "p", false),
                ],
            ])
        );
        assert_eq!(
            spec.lex("a p"),
            lexings(vec![vec![
                token("var", "[a-z]+", "a", true),
                token("var", "[a-z]+", "p", true),
            ]])
        );
        assert_eq!(
            spec.lex("print"),
            lexings(vec![
                vec![token("var", "[a-z]+", "print", true)],
                vec![token("print", "print", "print", true)],
            ])
        );
    }

    #[test]
    fn lex_discards_unreachable_completion() {
        let spec = program();
        assert_eq!(spec.partial_lex("print$( foo.tocap").len(), 2);
        let lexings = spec.lex("print$( foo.tocap");
        assert_eq!(lexings.len(), 1);
        let lexing = lexings.into_iter().next().unwrap();
        assert!(lexing.iter().all(Token::is_complete));
        assert_eq!(*lexing[4].kind(), "var");
    }

    #[test]
    fn maximal_munch_without_cut() {
        let spec = LexerSpec::builder()
            .with_token("long", "ab|abcd")
            .build()
            .unwrap();
        assert_eq!(spec.partial_lex("abcx"), Lexings::new());
        assert_eq!(spec.partial_lex("abc").len(), 1);
        assert_eq!(spec.lex("abc"), Lexings::new());
        assert_eq!(spec.lex("ab").len(), 1);
    }

    #[test]
    fn ignore_and_token_both_viable() {
        let spec = LexerSpec::builder()
            .with_token("slash", "/")
            .with_token("star", r"\*")
            .with_token("var", "[a-z]+")
            .with_ignore(r"/\*([^*]|\*+[^*/])*\*+/|\s+")
            .build()
            .unwrap();
        assert_eq!(
            spec.partial_lex("/"),
            lexings(vec![vec![], vec![token("slash", "/", "/", false)]])
        );
        assert_eq!(
            spec.partial_lex("/*a"),
            lexings(vec![
                vec![],
                vec![
                    token("slash", "/", "/", true),
                    token("star", r"\*", "*", true),
                    token("var", "[a-z]+", "a", false),
                ],
            ])
        );
        assert_eq!(
            spec.lex("/*a"),
            lexings(vec![vec![
                token("slash", "/", "/", true),
                token("star", r"\*", "*", true),
                token("var", "[a-z]+", "a", true),
            ]])
        );
        assert_eq!(spec.lex("/*a*/ b").len(), 2);
        assert!(spec.lex("/*a*/ b").contains(&vec![token("var", "[a-z]+", "b", true)]));
    }

    #[test]
    fn unicode() {
        let spec = LexerSpec::builder()
            .with_token("word", r"\w+")
            .with_ignore(r"\s+")
            .build()
            .unwrap();
        assert_eq!(
            spec.partial_lex("héllo wörld"),
            lexings(vec![vec![
                token("word", r"\w+", "héllo", true),
                token("word", r"\w+", "wörld", false),
            ]])
        );
    }

    #[test]
    fn deterministic() {
        let spec = program();
        let input = "print$( foo.tocaps ) zip";
        assert_eq!(spec.partial_lex(input), spec.partial_lex(input));
        assert_eq!(spec.lex(input), spec.lex(input));
    }

    #[test]
    fn long_input() {
        let spec = abc(r"\s+");
        let input = "a b c ".repeat(5000);
        let lexings = spec.partial_lex(&input);
        assert_eq!(lexings.len(), 1);
        assert_eq!(lexings.into_iter().next().unwrap().len(), 15000);
    }

    #[test]
    fn duplicate_kind() {
        let result = LexerSpec::builder()
            .with_token("a", "a")
            .with_token("a", "b")
            .build();
        assert!(matches!(result, Err(Error::DuplicateKind { .. })));
    }

    #[test]
    fn malformed_pattern() {
        let result = LexerSpec::<Kind>::builder().with_ignore("(").build();
        assert!(matches!(result, Err(Error::Regex { .. })));
    }
}

/// One interpretation of a prefix: every token but the last one is complete.
pub type Lexing<K> = Vec<Token<K>>;

/// Every interpretation of a prefix.
pub type Lexings<K> = HashSet<Lexing<K>>;

/// How far a pattern could be matched from a given position.
enum Munch {
    /// Nothing can be matched there.
    Dead,
    /// The longest viable match ends at this offset, and is accepted.
    Cut(usize),
    /// The input ran out while the match was still alive.
    Exhausted { accepting: bool },
}

/// Match `pattern` greedily from `start`, extending for as long as the text stays viable.
/// `start` must be strictly before the end of `input`.
fn munch(pattern: &Pattern, input: &str, start: usize) -> Munch {
    let mut cursor = pattern.cursor();
    let mut end = start;
    for (offset, chr) in input[start..].char_indices() {
        let next = cursor.advanced(chr);
        if next.status() == Status::Dead {
            return if end > start && cursor.status() == Status::Accepting {
                Munch::Cut(end)
            } else {
                Munch::Dead
            };
        }
        cursor = next;
        end = start + offset + chr.len_utf8();
    }
    Munch::Exhausted {
        accepting: cursor.status() == Status::Accepting,
    }
}

#[derive(Clone, Copy)]
enum Target {
    Position(usize),
    End,
}

/// A step of the scan: an optional token (none for ignored content), and where scanning resumes.
struct Edge<K> {
    token: Option<Token<K>>,
    target: Target,
}

/// # Summary
///
/// `LexerSpec` holds the token definitions of a lexer, and the pattern of the
/// content to discard between tokens.
///
/// Token patterns may overlap: lexing never resolves an ambiguity, it returns
/// every plausible interpretation instead.
///
/// # Methods
///
/// `partial_lex`: lex a prefix that may still grow
/// `lex`: lex a prefix that is the whole input
#[derive(Debug, Clone)]
pub struct LexerSpec<K> {
    tokens: Vec<Token<K>>,
    ignore: Pattern,
}

impl<K: TokenKind> LexerSpec<K> {
    /// Build a lexer spec. Kinds must be unique.
    pub fn new(tokens: impl IntoIterator<Item = (K, Pattern)>, ignore: Pattern) -> Result<Self> {
        let mut kinds = HashSet::new();
        let mut prototypes = Vec::new();
        for (kind, pattern) in tokens {
            if !kinds.insert(kind.clone()) {
                return Error::DuplicateKind {
                    kind: format!("{:?}", kind),
                }
                .err();
            }
            prototypes.push(Token::new(kind, pattern));
        }
        Ok(Self {
            tokens: prototypes,
            ignore,
        })
    }

    pub fn builder() -> LexerSpecBuilder<K> {
        LexerSpecBuilder::new()
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&K, &Pattern)> + '_ {
        self.tokens.iter().map(|token| (token.kind(), token.pattern()))
    }

    pub fn ignore(&self) -> &Pattern {
        &self.ignore
    }

    /// Every plausible lexing of `prefix`, assuming more characters may follow.
    /// The last token of a lexing may be incomplete.
    pub fn partial_lex(&self, prefix: &str) -> Lexings<K> {
        self.lex_with(prefix, false)
    }

    /// Every lexing of `prefix`, taken as the whole input. All tokens are complete.
    pub fn lex(&self, prefix: &str) -> Lexings<K> {
        self.lex_with(prefix, true)
    }

    /// Lex `prefix`. When `is_final`, no more characters will follow, so trailing
    /// matches that are not accepted yet are dropped instead of left open.
    pub fn lex_with(&self, prefix: &str, is_final: bool) -> Lexings<K> {
        if prefix.is_empty() {
            return std::iter::once(Vec::new()).collect();
        }

        let mut edges: BTreeMap<usize, Vec<Edge<K>>> = BTreeMap::new();
        let mut pending = vec![0];
        while let Some(start) = pending.pop() {
            if edges.contains_key(&start) {
                continue;
            }
            let out = self.edges(prefix, start, is_final);
            for edge in &out {
                if let Target::Position(end) = edge.target {
                    if !edges.contains_key(&end) {
                        pending.push(end);
                    }
                }
            }
            edges.insert(start, out);
        }

        // Lexings of every suffix, built backwards and sharing their tails: a lexing is the
        // index of its first link in `links`, `None` being the empty lexing.
        let mut links: Vec<(&Token<K>, Option<usize>)> = Vec::new();
        let mut suffixes: HashMap<usize, Vec<Option<usize>>> = HashMap::new();
        for (&start, out) in edges.iter().rev() {
            let mut heads = Vec::new();
            for edge in out {
                let tails: &[Option<usize>] = match edge.target {
                    Target::End => &[None],
                    Target::Position(end) => suffixes.get(&end).map_or(&[][..], Vec::as_slice),
                };
                for &tail in tails {
                    match &edge.token {
                        Some(token) => {
                            links.push((token, tail));
                            heads.push(Some(links.len() - 1));
                        }
                        None => heads.push(tail),
                    }
                }
            }
            suffixes.insert(start, heads);
        }

        let lexings: Lexings<K> = suffixes
            .remove(&0)
            .unwrap_or_default()
            .into_iter()
            .map(|mut link| {
                let mut lexing = Vec::new();
                while let Some(index) = link {
                    let (token, next) = links[index];
                    lexing.push(token.clone());
                    link = next;
                }
                lexing
            })
            .collect();
        debug!(
            length = prefix.len(),
            is_final,
            positions = edges.len(),
            lexings = lexings.len(),
            "lexed prefix"
        );
        lexings
    }

    /// Every way to start a token, or skip ignored content, at `start`.
    fn edges(&self, input: &str, start: usize, is_final: bool) -> Vec<Edge<K>> {
        let mut edges = Vec::new();
        for prototype in &self.tokens {
            let edge = match munch(prototype.pattern(), input, start) {
                Munch::Dead => continue,
                Munch::Cut(end) => Edge {
                    token: Some(prototype.extend(&input[start..end]).mark_complete()),
                    target: Target::Position(end),
                },
                Munch::Exhausted { accepting } => {
                    let token = prototype.extend(&input[start..]);
                    let token = match (is_final, accepting) {
                        (false, _) => token,
                        (true, true) => token.mark_complete(),
                        (true, false) => continue,
                    };
                    Edge {
                        token: Some(token),
                        target: Target::End,
                    }
                }
            };
            if let Some(token) = &edge.token {
                trace!(start, kind = ?token.kind(), text = token.text(), complete = token.is_complete(), "token edge");
            }
            edges.push(edge);
        }
        match munch(&self.ignore, input, start) {
            Munch::Dead => {}
            Munch::Cut(end) => {
                trace!(start, end, "ignore edge");
                edges.push(Edge {
                    token: None,
                    target: Target::Position(end),
                });
            }
            Munch::Exhausted { accepting } => {
                if !is_final || accepting {
                    trace!(start, "trailing ignore edge");
                    edges.push(Edge {
                        token: None,
                        target: Target::End,
                    });
                }
            }
        }
        edges
    }
}

/// A builder for a `LexerSpec`. Patterns are compiled when the spec is built.
#[derive(Debug)]
pub struct LexerSpecBuilder<K> {
    tokens: Vec<(K, String)>,
    ignore: Option<String>,
}

impl<K: TokenKind> LexerSpecBuilder<K> {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            ignore: None,
        }
    }

    /// Add a token kind, matching `pattern`.
    pub fn with_token(mut self, kind: K, pattern: impl Into<String>) -> Self {
        self.tokens.push((kind, pattern.into()));
        self
    }

    /// Specify the content to discard between tokens. Defaults to nothing.
    pub fn with_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore = Some(pattern.into());
        self
    }

    pub fn build(self) -> Result<LexerSpec<K>> {
        let ignore = match self.ignore {
            Some(source) => Pattern::new(&source)?,
            None => Pattern::empty(),
        };
        let tokens = self
            .tokens
            .into_iter()
            .map(|(kind, source)| Ok((kind, Pattern::new(&source)?)))
            .collect::<Result<Vec<_>>>()?;
        LexerSpec::new(tokens, ignore)
    }
}

impl<K: TokenKind> Default for LexerSpecBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}
