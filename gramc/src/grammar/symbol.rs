use crate::diag::SourceAnchor;
use smartstring::alias::String;
use std::fmt;

/// Handle of a symbol registered in a [`GrammarBuilder`](super::GrammarBuilder).
///
/// A handle is the creation-order position of the symbol, stamped with the
/// builder that issued it; every other builder rejects it. After `create()`
/// it is translated to a symbol index with
/// [`Grammar::index_of`](super::Grammar::index_of).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId {
    pub(crate) builder: u32,
    pub(crate) index: usize,
}

impl SymbolId {
    #[inline]
    pub fn creation_index(self) -> usize {
        self.index
    }
}

/// The closed set of symbol kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    /// A terminal whose text is also matched by a class terminal (soft keyword).
    SoftTerminal,
    Nonterminal,
    /// A terminal the parser never sees (whitespace, comments).
    Layout,
}

impl SymbolKind {
    /// Position of this kind in the frozen symbol table.
    #[inline]
    pub(crate) fn sort_class(self) -> u8 {
        match self {
            SymbolKind::Terminal | SymbolKind::SoftTerminal => 0,
            SymbolKind::Nonterminal => 1,
            SymbolKind::Layout => 2,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, SymbolKind::Terminal | SymbolKind::SoftTerminal)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Terminal => "terminal",
            SymbolKind::SoftTerminal => "soft terminal",
            SymbolKind::Nonterminal => "nonterminal",
            SymbolKind::Layout => "layout",
        })
    }
}

/// A grammar symbol.
///
/// `index` is the creation position while the symbol lives in a builder and
/// its final table index once the grammar is frozen. The same holds for
/// `soft_class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub index: usize,
    pub name: String,
    pub kind: SymbolKind,
    pub type_tag: Option<String>,
    pub soft_class: Option<usize>,
    pub origin: Option<SourceAnchor>,
}

impl Symbol {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
