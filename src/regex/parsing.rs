use super::matching::{CharClass, Instruction, InstructionPointer, Program};
use std::mem;
use std::ops::Bound::{self, Included};
use std::{iter::Enumerate, str::Chars};
use thiserror::Error;
use unbounded_interval_tree::interval_tree::IntervalTree;


/// # Summary
///
/// `Regex` represents any successfully parsed regex.
#[derive(Debug, Default, PartialEq)]
pub enum Regex {
    Char(char),
    Alternative(Box<Regex>, Box<Regex>),
    Optional(Box<Regex>),
    Repetition(Box<Regex>),
    KleeneStar(Box<Regex>),
    Concat(Box<Regex>, Box<Regex>),
    Group(Box<Regex>),
    CharacterClass(CharClass),
    WordChar,
    Digit,
    Whitespace,
    Any,
    #[default]
    Empty,
}

/// A malformed regex. `position` counts characters from the start
/// of the regex source, `message` describes what went wrong there.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("{message} (at position {position})")]
pub struct RegexError {
    pub position: usize,
    pub message: String,
}

impl RegexError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

impl From<(Regex, Option<Regex>)> for Regex {
    fn from(t: (Regex, Option<Regex>)) -> Self {
        match t {
            (r, Some(r2)) => Regex::Alternative(Box::new(r2), Box::new(r)),
            (r, None) => r,
        }
    }
}

/// Parse `regex` and compile it into a program ending with `Match`.
pub fn compile(regex: &str) -> Result<Program, RegexError> {
    let mut program = Program::new();
    build(read(regex)?, &mut program);
    program.push(Instruction::Match);
    Ok(program)
}

/// Take a `Regex`, and a reference to a `Program` and
/// appends the implementation of the `Regex` at the
/// end of the `Program`.
///
/// **Warning**: this function is recursive, and a malicious input
/// may lead to a stack overflow. Patterns are expected to come from
/// the configuration of the lexer, not from the text being lexed.
pub fn build(regex: Regex, program: &mut Program) {
    match regex {
        Regex::Char(c) => {
            program.push(Instruction::Char(c));
        }
        Regex::Alternative(r1, r2) => {
            let split_pos = program.len_ip();
            program.push(Instruction::Split(
                InstructionPointer(0),
                InstructionPointer(0),
            ));
            build(*r1, program);
            let jmp_pos = program.len_ip();
            program.push(Instruction::Jump(InstructionPointer(0)));
            build(*r2, program);
            program[split_pos] = Instruction::Split(split_pos.incr(), jmp_pos.incr());
            program[jmp_pos] = Instruction::Jump(program.len_ip());
        }
        Regex::Concat(r1, r2) => {
            build(*r1, program);
            build(*r2, program);
        }
        Regex::Optional(r) => {
            let split_pos = program.len_ip();
            program.push(Instruction::Split(
                InstructionPointer(0),
                InstructionPointer(0),
            ));
            build(*r, program);
            program[split_pos] = Instruction::Split(split_pos.incr(), program.len_ip());
        }
        Regex::KleeneStar(r) => {
            let split_pos = program.len_ip();
            program.push(Instruction::Split(
                InstructionPointer(0),
                InstructionPointer(0),
            ));
            build(*r, program);
            program.push(Instruction::Jump(split_pos));
            program[split_pos] = Instruction::Split(split_pos.incr(), program.len_ip());
        }
        Regex::Repetition(r) => {
            let init_pos = program.len_ip();
            build(*r, program);
            program.push(Instruction::Split(init_pos, program.len_ip().incr()));
        }
        Regex::Group(r) => build(*r, program),
        Regex::Any => program.push(Instruction::Any),
        Regex::WordChar => program.push(Instruction::WordChar),
        Regex::Digit => program.push(Instruction::Digit),
        Regex::Whitespace => program.push(Instruction::Whitespace),
        Regex::CharacterClass(class) => program.push(Instruction::CharacterClass(class)),
        Regex::Empty => {}
    };
}

/// Accumulates the ranges of a character class, and the overlaps between them.
#[derive(Default)]
struct ClassBuilder {
    tree: IntervalTree<char>,
    ranges: Vec<(char, char)>,
    overlaps: Vec<Vec<(char, char)>>,
}

impl ClassBuilder {
    fn insert(&mut self, low: char, high: char) {
        fn bounds(range: &(Bound<char>, Bound<char>)) -> Option<(char, char)> {
            match range {
                (Included(low), Included(high)) => Some((*low, *high)),
                _ => None,
            }
        }
        let interval = (Included(low), Included(high));
        let overlapping: Vec<_> = self
            .tree
            .get_interval_overlaps(&interval)
            .into_iter()
            .filter_map(bounds)
            .collect();
        if !overlapping.is_empty() {
            self.overlaps.push(
                overlapping
                    .into_iter()
                    .chain(std::iter::once((low, high)))
                    .collect(),
            );
        }
        self.tree.insert(interval);
        self.ranges.push((low, high));
    }

    fn finish(self, negated: bool, start: usize, end: usize) -> Result<Regex, RegexError> {
        if !self.overlaps.is_empty() {
            let overlaps: Vec<String> = self
                .overlaps
                .iter()
                .map(|overlap| {
                    let ranges: Vec<String> = overlap
                        .iter()
                        .map(|(s, e)| format!("{}-{}", s, e))
                        .collect();
                    format!("({})", ranges.join(","))
                })
                .collect();
            return Err(RegexError::new(
                end + 1,
                format!(
                    "Found {} overlaps in character class from position {} to position {}: {}",
                    self.overlaps.len(),
                    start,
                    end + 1,
                    overlaps.join(", ")
                ),
            ));
        }
        if self.ranges.is_empty() && !negated {
            return Err(RegexError::new(
                end,
                "Empty character class can never match. Try /\\[\\]/ if you meant the characters.",
            ));
        }
        Ok(Regex::CharacterClass(CharClass::new(self.ranges, negated)))
    }
}

/// Parse a character class, whose opening bracket is at position `start`.
fn read_char_class(
    input: &mut Enumerate<Chars<'_>>,
    size: usize,
    start: usize,
) -> Result<Regex, RegexError> {
    fn read_escaped_char(input: &mut Enumerate<Chars<'_>>, pos: usize) -> Result<char, RegexError> {
        match input.next() {
            Some((_, c @ (']' | '[' | '^' | '-' | '\\'))) => Ok(c),
            Some((_, 't')) => Ok('\t'),
            Some((_, 'n')) => Ok('\n'),
            Some((_, 'r')) => Ok('\r'),
            Some((pos, c)) => Err(RegexError::new(
                pos,
                format!(
                    "Cannot escape character inside character class {}, try replacing /\\{}/ with /{}/",
                    c, c, c
                ),
            )),
            None => Err(RegexError::new(
                pos,
                "Expected something after '\\', but found EOF instead",
            )),
        }
    }

    let mut class = ClassBuilder::default();
    let mut last = None;
    let mut negated = false;

    while let Some((pos, chr)) = input.next() {
        match chr {
            '\\' => {
                if let Some(c) = last {
                    class.insert(c, c);
                }
                last = Some(read_escaped_char(input, pos)?);
            }
            '^' if pos == start + 1 => {
                negated = true;
            }
            '-' => {
                let Some(low) = last.take() else {
                    class.insert('-', '-');
                    continue;
                };
                match input.next() {
                    Some((end, ']')) => {
                        class.insert(low, low);
                        class.insert('-', '-');
                        return class.finish(negated, start, end);
                    }
                    Some((end, c)) => {
                        let high = if c == '\\' {
                            read_escaped_char(input, end)?
                        } else {
                            c
                        };
                        if high < low {
                            return Err(RegexError::new(
                                pos,
                                format!("Range {}-{} is out of order", low, high),
                            ));
                        }
                        class.insert(low, high);
                    }
                    None => {
                        return Err(RegexError::new(
                            pos,
                            "Expected something after '-', but found EOF instead",
                        ))
                    }
                }
            }
            ']' => {
                if let Some(c) = last {
                    class.insert(c, c);
                }
                return class.finish(negated, start, pos);
            }
            c => {
                if let Some(cr) = last {
                    class.insert(cr, cr);
                }
                last = Some(c);
            }
        }
    }
    Err(RegexError::new(
        size,
        format!(
            "Expected end of character class, but found EOF. Try adding ']' if you really meant to have a character class, or adding '\\' at position {} if you didn't want a character class",
            start
        ),
    ))
}

fn concat(left: Regex, right: Regex) -> Regex {
    if let Regex::Empty = left {
        right
    } else {
        Regex::Concat(Box::new(left), Box::new(right))
    }
}

/// Which postfix operator is being applied.
#[derive(Clone, Copy)]
enum Quantifier {
    KleeneStar,
    Repetition,
    Optional,
}

impl Quantifier {
    fn name(self) -> &'static str {
        match self {
            Quantifier::KleeneStar => "kleene star",
            Quantifier::Repetition => "repetition",
            Quantifier::Optional => "optional",
        }
    }

    /// Apply the quantifier to the last atom of `exp`.
    fn apply(self, exp: Regex, pos: usize) -> Result<Regex, RegexError> {
        match exp {
            Regex::Concat(r1, r2) => Ok(Regex::Concat(r1, Box::new(self.apply(*r2, pos)?))),
            Regex::Alternative(r1, r2) => {
                Ok(Regex::Alternative(r1, Box::new(self.apply(*r2, pos)?)))
            }
            Regex::Empty => Err(RegexError::new(
                pos,
                format!("Cannot apply {} to empty regex.", self.name()),
            )),
            Regex::KleeneStar(..) | Regex::Optional(..) | Regex::Repetition(..) => {
                let message = match self {
                    Quantifier::Optional => String::from("Non-greedy quantifiers are not supported."),
                    _ => format!("Cannot apply {} to a quantified expression.", self.name()),
                };
                Err(RegexError::new(pos, message))
            }
            r => Ok(match self {
                Quantifier::KleeneStar => Regex::KleeneStar(Box::new(r)),
                Quantifier::Repetition => Regex::Repetition(Box::new(r)),
                Quantifier::Optional => Regex::Optional(Box::new(r)),
            }),
        }
    }
}

fn read_escaped(chrs: &mut Enumerate<Chars<'_>>, pos: usize) -> Result<Regex, RegexError> {
    let Some((pos, chr)) = chrs.next() else {
        return Err(RegexError::new(
            pos,
            "Expected something after character '\\', but found EOF instead",
        ));
    };
    match chr {
        '\\' | '.' | '(' | ')' | '?' | '+' | '*' | '|' | '$' | '^' | '[' | ']' | '{' | '}'
        | '-' | '/' => Ok(Regex::Char(chr)),
        'd' => Ok(Regex::Digit),
        's' => Ok(Regex::Whitespace),
        'w' => Ok(Regex::WordChar),
        'n' => Ok(Regex::Char('\n')),
        'r' => Ok(Regex::Char('\r')),
        't' => Ok(Regex::Char('\t')),
        'A' | 'z' | 'Z' => Err(RegexError::new(
            pos,
            format!("Anchor /\\{}/ is not supported. Tokens may always keep growing.", chr),
        )),
        'b' => Err(RegexError::new(
            pos,
            "Word boundary /\\b/ is not supported. It would need to look past the end of the token.",
        )),
        'l' => Err(RegexError::new(
            pos,
            "Lowercase shorthand /\\l/ is not supported. Try /[a-z]/ instead.",
        )),
        'u' => Err(RegexError::new(
            pos,
            "Uppercase shorthand /\\u/ is not supported. Try /[A-Z]/ instead.",
        )),
        'x' => Err(RegexError::new(
            pos,
            "Hexadecimal escape /\\xFF/ is not supported.",
        )),
        _ => Err(RegexError::new(
            pos,
            format!(
                "Cannot escape character {}, try replacing /\\{}/ with /{}/",
                chr, chr, chr
            ),
        )),
    }
}

/// Parse a regex. The parsing technique is quite efficient,
/// essentially linear time.
pub fn read(regex: &str) -> Result<Regex, RegexError> {
    // The expression being read, and the alternatives already closed by a `|`.
    let mut current: (Regex, Option<Regex>) = (Regex::Empty, None);
    let mut outer = Vec::new();
    let mut chrs = regex.chars().enumerate();
    let size = regex.chars().count();
    while let Some((pos, chr)) = chrs.next() {
        match chr {
            '(' => outer.push(mem::take(&mut current)),
            ')' => {
                let Some(enclosing) = outer.pop() else {
                    return Err(RegexError::new(
                        pos,
                        "Closing parenthesis doesn't match any previously opened.",
                    ));
                };
                let inner = mem::replace(&mut current, enclosing);
                let group = Regex::Group(Box::new(inner.into()));
                current.0 = concat(mem::take(&mut current.0), group);
            }
            '?' | '*' | '+' => {
                let quantifier = match chr {
                    '?' => Quantifier::Optional,
                    '*' => Quantifier::KleeneStar,
                    _ => Quantifier::Repetition,
                };
                current.0 = quantifier.apply(mem::take(&mut current.0), pos)?;
            }
            '|' => {
                let alternative = mem::take(&mut current).into();
                current = (Regex::Empty, Some(alternative));
            }
            '$' => {
                return Err(RegexError::new(
                    pos,
                    "End-of-line /$/ is not supported. Tokens may always keep growing. Try /\\$/ for the character.",
                ))
            }
            '^' => {
                return Err(RegexError::new(
                    pos,
                    "Start-of-line /^/ is not supported. Matches are anchored anyways.",
                ))
            }
            '{' => {
                return Err(RegexError::new(
                    pos,
                    "Counted repetition /{m,n}/ is not supported. Try /\\{/ for the character.",
                ))
            }
            '.' => current.0 = concat(mem::take(&mut current.0), Regex::Any),
            '\\' => {
                let escaped = read_escaped(&mut chrs, pos)?;
                current.0 = concat(mem::take(&mut current.0), escaped);
            }
            '[' => {
                let class = read_char_class(&mut chrs, size, pos)?;
                current.0 = concat(mem::take(&mut current.0), class);
            }
            c => current.0 = concat(mem::take(&mut current.0), Regex::Char(c)),
        }
    }
    if !outer.is_empty() {
        return Err(RegexError::new(
            size,
            format!("Expected {} closing parenthesis, found EOF", outer.len()),
        ));
    }
    Ok(current.into())
}
