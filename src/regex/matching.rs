use fixedbitset::FixedBitSet;
use newty::newty;
use std::cmp::Ordering;
use std::ops::{Index, IndexMut};


newty! {
    pub id InstructionPointer
}

impl InstructionPointer {
    pub fn incr(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A set of character ranges, possibly negated.
///
/// Ranges are kept sorted and never overlap, the parser refuses overlapping
/// ranges, so membership is a binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    ranges: Vec<(char, char)>,
    negated: bool,
}

impl CharClass {
    pub fn new(mut ranges: Vec<(char, char)>, negated: bool) -> Self {
        ranges.sort_unstable();
        Self { ranges, negated }
    }

    pub fn contains(&self, chr: char) -> bool {
        let found = self
            .ranges
            .binary_search_by(|&(low, high)| {
                if high < chr {
                    Ordering::Less
                } else if low > chr {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok();
        found ^ self.negated
    }
}

/// # Summary
///
/// `Instruction` represents an instruction of the VM.
///
/// # Variants
///
/// `Split(ip1, ip2)`: fork the current thread, and set the instruction pointer
///                    of both threads respectively to `ip1` and `ip2`
/// `Char(chr)`: match `chr` at the current location, or stop the thread if it doesn't match
/// `Jump(ip)`: set the instruction pointer of the current thread to `ip`
/// `Match`: stop the thread and record that the input read so far is accepted
/// `WordChar`: match /[A-Za-z0-9_]/ at the current location
/// `Digit`: match /[0-9]/ at the current location
/// `Whitespace`: match any whitespace at the current location
/// `CharacterClass(class)`: match any character inside `class`
/// `Any`: match any character but a line feed at the current location
#[derive(PartialEq, Debug)]
pub enum Instruction {
    Split(InstructionPointer, InstructionPointer),
    Char(char),
    Jump(InstructionPointer),
    Match,
    WordChar,
    Digit,
    Whitespace,
    CharacterClass(CharClass),
    Any,
}

impl Instruction {
    /// Whether a thread waiting on this instruction survives reading `chr`.
    fn accepts(&self, chr: char) -> bool {
        match self {
            Instruction::Char(expected) => *expected == chr,
            Instruction::Any => chr != '\n',
            Instruction::WordChar => chr.is_alphanumeric() || chr == '_',
            Instruction::Digit => chr.is_ascii_digit(),
            Instruction::Whitespace => chr.is_whitespace(),
            Instruction::CharacterClass(class) => class.contains(chr),
            Instruction::Split(..) | Instruction::Jump(..) | Instruction::Match => false,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Program(Vec<Instruction>);

impl Program {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.0.push(instruction);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len_ip(&self) -> InstructionPointer {
        InstructionPointer(self.len())
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self(instructions)
    }
}

impl Index<InstructionPointer> for Program {
    type Output = Instruction;

    fn index(&self, ip: InstructionPointer) -> &Self::Output {
        &self.0[ip.0]
    }
}

impl IndexMut<InstructionPointer> for Program {
    fn index_mut(&mut self, ip: InstructionPointer) -> &mut Self::Output {
        &mut self.0[ip.0]
    }
}

/// What a partial match can still become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// No extension of the input read so far can be accepted.
    Dead,
    /// The input read so far is a strict prefix of some accepted input.
    Viable,
    /// The input read so far is accepted. It may or may not be extensible.
    Accepting,
}

/// `ThreadList` is a `Thread` stack that doesn't accept twice the same `Thread`.
/// Since captures are not tracked, a thread is nothing more than its instruction pointer.
struct ThreadList {
    done: FixedBitSet,
    threads: Vec<InstructionPointer>,
}

impl ThreadList {
    fn new(size: usize) -> Self {
        Self {
            done: FixedBitSet::with_capacity(size),
            threads: Vec::new(),
        }
    }

    /// Insert a new thread. Doesn't do anything if it has already been added once.
    fn add(&mut self, thread: InstructionPointer) {
        if !self.done.put(thread.0) {
            self.threads.push(thread);
        }
    }

    fn get(&mut self) -> Option<InstructionPointer> {
        self.threads.pop()
    }
}

/// The live threads of a simulation, each one blocked on an instruction
/// that consumes a character, plus whether some thread reached `Match`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Threads {
    pending: Vec<InstructionPointer>,
    accepting: bool,
}

impl Threads {
    pub fn status(&self) -> Status {
        if self.accepting {
            Status::Accepting
        } else if self.pending.is_empty() {
            Status::Dead
        } else {
            Status::Viable
        }
    }
}

/// Run every thread of `list` until it either blocks on a consuming instruction or matches.
fn settle(prog: &Program, mut list: ThreadList) -> Threads {
    let mut pending = Vec::new();
    let mut accepting = false;
    while let Some(thread) = list.get() {
        match &prog[thread] {
            Instruction::Split(first, second) => {
                list.add(*second);
                list.add(*first);
            }
            Instruction::Jump(target) => list.add(*target),
            Instruction::Match => accepting = true,
            _ => pending.push(thread),
        }
    }
    pending.sort_unstable_by_key(|ip| ip.0);
    Threads { pending, accepting }
}

/// The threads of `prog` before any character has been read.
pub fn start(prog: &Program) -> Threads {
    let mut list = ThreadList::new(prog.len());
    if !prog.is_empty() {
        list.add(InstructionPointer(0));
    }
    settle(prog, list)
}

/// Advance every thread of `threads` over `chr`.
pub fn step(prog: &Program, threads: &Threads, chr: char) -> Threads {
    let mut list = ThreadList::new(prog.len());
    for &thread in &threads.pending {
        if prog[thread].accepts(chr) {
            list.add(thread.incr());
        }
    }
    settle(prog, list)
}
