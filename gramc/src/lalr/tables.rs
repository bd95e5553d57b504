use super::conflict::ShiftReduce;
use std::fmt;

/// One ACTION table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserAction {
    Error,
    /// Push the terminal and go to the state.
    Shift(usize),
    /// Reduce by the rule.
    Reduce(usize),
    /// The input is complete.
    Accept,
}

/// How a conflicting table entry was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConflictKind {
    ShiftReduce(ShiftReduce),
    /// Several rules reduce on the same lookahead; the first declared wins.
    ReduceReduce,
}

/// A conflict that needed a default resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: usize,
    pub lookahead: usize,
    pub kind: ConflictKind,
    /// Rules involved, ascending; the winner of a reduce/reduce conflict is
    /// the first one.
    pub rules: Vec<usize>,
}

/// Output of [`LalrBuilder`](super::LalrBuilder).
///
/// `action` is a row-major `states x terminals` table and `goto` a row-major
/// `states x nonterminals` table; nonterminal `n` is symbol `terminals + n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserTables {
    pub terminals: usize,
    pub nonterminals: usize,
    pub states: usize,
    pub action: Vec<ParserAction>,
    pub goto: Vec<Option<usize>>,
    /// Rule to reduce by without consulting the lookahead.
    pub default_reduce: Vec<Option<usize>>,
    pub rule_left: Vec<usize>,
    pub rule_len: Vec<usize>,
    /// Start state of each input.
    pub start_states: Vec<usize>,
    /// State in which each input is recognized.
    pub final_states: Vec<usize>,
    pub conflicts: Vec<Conflict>,
    pub debug: Option<String>,
}

impl ParserTables {
    #[inline]
    pub fn action(&self, state: usize, terminal: usize) -> ParserAction {
        self.action[state * self.terminals + terminal]
    }

    /// GOTO on a nonterminal, given by its symbol index.
    #[inline]
    pub fn goto(&self, state: usize, symbol: usize) -> Option<usize> {
        self.goto[state * self.nonterminals + symbol - self.terminals]
    }

    pub fn rules(&self) -> usize {
        self.rule_left.len()
    }
}

impl fmt::Display for ParserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserAction::Error => f.write_str("-"),
            ParserAction::Shift(s) => write!(f, "s{}", s),
            ParserAction::Reduce(r) => write!(f, "r{}", r),
            ParserAction::Accept => f.write_str("acc"),
        }
    }
}
