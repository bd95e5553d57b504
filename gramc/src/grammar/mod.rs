//! In-memory grammar model.
//!
//! A [`GrammarBuilder`] collects symbols, lexical rules, grammar rules,
//! priorities and inputs, validating every operation. [`GrammarBuilder::create`]
//! freezes the result into a [`Grammar`], an immutable arena in which every
//! entity refers to others by integer index.

mod builder;
mod lexical;
mod rule;
mod symbol;

pub use builder::{EOI, ERROR, GrammarBuilder, RuleBuilder};
pub use lexical::{LexemId, LexemKind, LexerState, LexicalRule, NamedPattern, PatternId, StateId};
pub use rule::{Assoc, InputId, InputRef, Prio, PrioId, Rule, RuleId, SymbolRef};
pub use symbol::{Symbol, SymbolId, SymbolKind};

/// A frozen grammar.
///
/// Symbols are sorted: terminals first (EOI at index 0, soft terminals folded
/// in), then nonterminals, then layout symbols. `terminals()` and
/// `grammar_symbols()` are the two boundaries.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Stamp of the builder this grammar was created from.
    builder: u32,
    symbols: Vec<Symbol>,
    terminals: usize,
    grammar_symbols: usize,
    rules: Option<Vec<Rule>>,
    priorities: Option<Vec<Prio>>,
    inputs: Option<Vec<InputRef>>,
    lexical_rules: Vec<LexicalRule>,
    patterns: Vec<NamedPattern>,
    states: Vec<LexerState>,
    error: Option<usize>,
    /// Creation index to symbol index.
    positions: Vec<usize>,
}

impl Grammar {
    #[inline]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    #[inline]
    pub fn symbol(&self, index: usize) -> &Symbol {
        &self.symbols[index]
    }

    /// Number of terminals; they occupy indices `0..terminals()`.
    #[inline]
    pub fn terminals(&self) -> usize {
        self.terminals
    }

    /// Number of terminals and nonterminals; layout symbols follow.
    #[inline]
    pub fn grammar_symbols(&self) -> usize {
        self.grammar_symbols
    }

    #[inline]
    pub fn nonterminals(&self) -> usize {
        self.grammar_symbols - self.terminals
    }

    /// `None` for a lexer-only grammar.
    pub fn rules(&self) -> Option<&[Rule]> {
        self.rules.as_deref()
    }

    pub fn priorities(&self) -> Option<&[Prio]> {
        self.priorities.as_deref()
    }

    pub fn inputs(&self) -> Option<&[InputRef]> {
        self.inputs.as_deref()
    }

    pub fn lexical_rules(&self) -> &[LexicalRule] {
        &self.lexical_rules
    }

    pub fn patterns(&self) -> &[NamedPattern] {
        &self.patterns
    }

    pub fn lexer_states(&self) -> &[LexerState] {
        &self.states
    }

    #[inline]
    pub fn eoi(&self) -> &Symbol {
        &self.symbols[0]
    }

    pub fn error(&self) -> Option<&Symbol> {
        self.error.map(|i| &self.symbols[i])
    }

    /// Symbol index of a builder handle, or `None` if `id` was not issued
    /// by the builder this grammar was created from.
    #[inline]
    pub fn index_of(&self, id: SymbolId) -> Option<usize> {
        if id.builder != self.builder {
            return None;
        }
        self.positions.get(id.index).copied()
    }

    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name.as_str() == name)
    }

    pub fn is_lexer_only(&self) -> bool {
        self.rules.is_none()
    }

    /// Renders a rule as `left ::= a b c`.
    pub fn rule_text(&self, rule: &Rule) -> String {
        let mut text = format!("{} ::=", self.symbols[rule.left].name);
        if rule.right.is_empty() {
            text.push_str(" %empty");
        }
        for sref in &rule.right {
            text.push(' ');
            text.push_str(&self.symbols[sref.target].name);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_only_grammar() {
        let mut b = GrammarBuilder::new();
        b.add_terminal("a", None, None).unwrap();
        b.add_terminal("b", None, None).unwrap();
        let g = b.create();
        assert_eq!(g.symbols().len(), 3);
        assert_eq!(g.terminals(), 3);
        assert_eq!(g.grammar_symbols(), 3);
        assert_eq!(g.eoi().name.as_str(), EOI);
        assert!(g.is_lexer_only());
        assert!(g.rules().is_none());
        assert!(g.priorities().is_none());
        assert!(g.inputs().is_none());
        assert!(g.error().is_none());
    }

    #[test]
    fn rule_text_renders_empty_rules() {
        let mut b = GrammarBuilder::new();
        let e = b.add_nonterminal("list", None, None).unwrap();
        let x = b.add_terminal("x", None, None).unwrap();
        b.add_rule(e, &[]).unwrap();
        b.add_rule(e, &[e, x]).unwrap();
        let g = b.create();
        let rules = g.rules().unwrap();
        assert_eq!(g.rule_text(&rules[0]), "list ::= %empty");
        assert_eq!(g.rule_text(&rules[1]), "list ::= list x");
        assert_eq!(g.symbol_by_name("x").map(|s| s.index), Some(1));
    }
}
