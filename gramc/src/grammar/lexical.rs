use crate::diag::SourceAnchor;
use crate::regex::Regex;
use smartstring::alias::String;
use std::fmt;

/// Handle of a lexer state, stamped with the builder that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId {
    pub(crate) builder: u32,
    pub(crate) index: usize,
}

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternId {
    pub(crate) builder: u32,
    pub(crate) index: usize,
}

impl PatternId {
    #[inline]
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LexemId {
    pub(crate) builder: u32,
    pub(crate) index: usize,
}

impl LexemId {
    #[inline]
    pub fn index(self) -> usize {
        self.index
    }
}

/// The closed set of lexical rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexemKind {
    Normal,
    /// Produces a soft terminal.
    Soft,
    /// Matches a whole class of words; other rules may refine it with instances.
    Class,
}

impl LexemKind {
    pub fn name(self) -> &'static str {
        match self {
            LexemKind::Normal => "normal",
            LexemKind::Soft => "soft",
            LexemKind::Class => "class",
        }
    }
}

impl fmt::Display for LexemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerState {
    pub index: usize,
    pub name: String,
    pub origin: Option<SourceAnchor>,
}

/// A regex fragment referenced as `{name}`.
#[derive(Debug, Clone)]
pub struct NamedPattern {
    pub index: usize,
    pub name: String,
    pub regex: Regex,
    pub origin: Option<SourceAnchor>,
}

/// A lexical rule binding a regex to a terminal.
///
/// `symbol` is a symbol index in the frozen grammar (a creation index inside
/// the builder). `states` are lexer state indices.
#[derive(Debug, Clone)]
pub struct LexicalRule {
    pub index: usize,
    pub kind: LexemKind,
    pub symbol: usize,
    pub regex: Regex,
    pub states: Vec<usize>,
    pub priority: i32,
    pub class_rule: Option<usize>,
    pub origin: Option<SourceAnchor>,
}
