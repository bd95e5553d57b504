use crate::diag::SourceAnchor;
use smartstring::alias::String;

/// Handle of a grammar rule (its creation index, which is also its final index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrioId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputId(pub(crate) usize);

/// One element of a right-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRef {
    pub target: usize,
    pub alias: Option<String>,
    pub origin: Option<SourceAnchor>,
}

/// A production `left ::= right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub index: usize,
    pub alias: Option<String>,
    pub left: usize,
    pub right: Vec<SymbolRef>,
    /// Explicit precedence terminal.
    pub precedence: Option<usize>,
    pub origin: Option<SourceAnchor>,
}

impl Rule {
    #[inline]
    pub fn len(&self) -> usize {
        self.right.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right.is_empty()
    }
}

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// A priority declaration such as `%left '+' '-'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prio {
    pub assoc: Assoc,
    pub symbols: Vec<usize>,
    pub origin: Option<SourceAnchor>,
}

/// A start nonterminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRef {
    pub target: usize,
    /// Whether the input must be followed by end of input.
    pub has_eoi: bool,
    pub origin: Option<SourceAnchor>,
}
