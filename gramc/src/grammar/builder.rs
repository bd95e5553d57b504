use super::Grammar;
use super::lexical::{LexemId, LexemKind, LexerState, LexicalRule, NamedPattern, PatternId, StateId};
use super::rule::{Assoc, InputId, InputRef, Prio, PrioId, Rule, RuleId, SymbolRef};
use super::symbol::{Symbol, SymbolId, SymbolKind};
use crate::diag::{Reporter, SourceAnchor};
use crate::error::{GrammarError, Namespace};
use crate::regex::Regex;
use indexmap::IndexMap;
use indexmap::map::Entry;
use smartstring::alias::String;
use std::sync::atomic::{AtomicU32, Ordering};

/// Name of the end-of-input terminal.
pub const EOI: &str = "eoi";
/// Name of the error-recovery terminal.
pub const ERROR: &str = "error";

/// Source of the stamps that tie handles to the builder issuing them.
static NEXT_BUILDER: AtomicU32 = AtomicU32::new(0);

/// Validating, single-use builder of a [`Grammar`].
///
/// Every `add_*` operation checks its arguments and returns a
/// [`GrammarError`] without registering anything when they are wrong.
/// Handles issued by another builder are rejected as
/// [`GrammarError::UnknownEntity`]. [`create`](GrammarBuilder::create)
/// consumes the builder.
///
/// # Examples
///
/// ```rust
/// # use gramc::grammar::GrammarBuilder;
/// let mut b = GrammarBuilder::new();
/// let num = b.add_terminal("NUM", None, None).unwrap();
/// assert!(b.add_terminal("NUM", None, None).is_err());
/// let g = b.create();
/// assert_eq!(g.symbols().len(), 2);
/// assert_eq!(g.terminals(), 2);
/// assert!(g.rules().is_none());
/// assert_eq!(g.index_of(num), Some(1));
/// ```
///
/// A builder cannot be cloned, so each handle names entities of exactly one
/// builder:
///
/// ```compile_fail
/// # use gramc::grammar::GrammarBuilder;
/// let b = GrammarBuilder::new();
/// let copy: GrammarBuilder = b.clone();
/// ```
#[derive(Debug)]
pub struct GrammarBuilder {
    tag: u32,
    symbols: IndexMap<String, Symbol>,
    patterns: IndexMap<String, NamedPattern>,
    states: IndexMap<String, LexerState>,
    lexems: Vec<LexicalRule>,
    rules: Vec<Rule>,
    priorities: Vec<Prio>,
    inputs: Vec<InputRef>,
    eoi: SymbolId,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarBuilder {
    /// Creates a builder holding only the end-of-input terminal.
    pub fn new() -> Self {
        let tag = NEXT_BUILDER.fetch_add(1, Ordering::Relaxed);
        let mut symbols = IndexMap::new();
        symbols.insert(
            EOI.into(),
            Symbol {
                index: 0,
                name: EOI.into(),
                kind: SymbolKind::Terminal,
                type_tag: None,
                soft_class: None,
                origin: None,
            },
        );
        Self {
            tag,
            symbols,
            patterns: IndexMap::new(),
            states: IndexMap::new(),
            lexems: Vec::new(),
            rules: Vec::new(),
            priorities: Vec::new(),
            inputs: Vec::new(),
            eoi: SymbolId {
                builder: tag,
                index: 0,
            },
        }
    }

    /// The end-of-input terminal.
    #[inline]
    pub fn eoi(&self) -> SymbolId {
        self.eoi
    }

    /// Looks up a symbol by name.
    pub fn symbol(&self, name: &str) -> Option<SymbolId> {
        let builder = self.tag;
        self.symbols
            .get_index_of(name)
            .map(|index| SymbolId { builder, index })
    }

    pub fn state(&self, name: &str) -> Option<StateId> {
        let builder = self.tag;
        self.states
            .get_index_of(name)
            .map(|index| StateId { builder, index })
    }

    pub fn pattern(&self, name: &str) -> Option<PatternId> {
        let builder = self.tag;
        self.patterns
            .get_index_of(name)
            .map(|index| PatternId { builder, index })
    }

    pub fn add_terminal(
        &mut self,
        name: &str,
        type_tag: Option<&str>,
        origin: Option<SourceAnchor>,
    ) -> Result<SymbolId, GrammarError> {
        self.add_symbol(name, SymbolKind::Terminal, type_tag.map(Into::into), None, origin)
    }

    pub fn add_nonterminal(
        &mut self,
        name: &str,
        type_tag: Option<&str>,
        origin: Option<SourceAnchor>,
    ) -> Result<SymbolId, GrammarError> {
        self.add_symbol(name, SymbolKind::Nonterminal, type_tag.map(Into::into), None, origin)
    }

    pub fn add_layout(
        &mut self,
        name: &str,
        type_tag: Option<&str>,
        origin: Option<SourceAnchor>,
    ) -> Result<SymbolId, GrammarError> {
        self.add_symbol(name, SymbolKind::Layout, type_tag.map(Into::into), None, origin)
    }

    /// Registers a soft terminal refining `soft_class`, whose type it inherits.
    pub fn add_soft_terminal(
        &mut self,
        name: &str,
        soft_class: SymbolId,
        origin: Option<SourceAnchor>,
    ) -> Result<SymbolId, GrammarError> {
        let class = self.resolve(soft_class)?;
        if class.kind != SymbolKind::Terminal || soft_class == self.eoi {
            return Err(GrammarError::NotTerminal {
                name: class.name.clone(),
            });
        }
        let type_tag = class.type_tag.clone();
        self.add_symbol(
            name,
            SymbolKind::SoftTerminal,
            type_tag,
            Some(soft_class.index),
            origin,
        )
    }

    fn add_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        type_tag: Option<String>,
        soft_class: Option<usize>,
        origin: Option<SourceAnchor>,
    ) -> Result<SymbolId, GrammarError> {
        match self.symbols.entry(name.into()) {
            Entry::Occupied(_) => Err(GrammarError::DuplicateName {
                namespace: Namespace::Symbol,
                name: name.into(),
            }),
            Entry::Vacant(slot) => {
                let index = slot.index();
                slot.insert(Symbol {
                    index,
                    name: name.into(),
                    kind,
                    type_tag,
                    soft_class,
                    origin,
                });
                log::trace!("symbol #{} `{}' ({})", index, name, kind);
                Ok(SymbolId {
                    builder: self.tag,
                    index,
                })
            }
        }
    }

    pub fn add_pattern(
        &mut self,
        name: &str,
        regex: Regex,
        origin: Option<SourceAnchor>,
    ) -> Result<PatternId, GrammarError> {
        match self.patterns.entry(name.into()) {
            Entry::Occupied(_) => Err(GrammarError::DuplicateName {
                namespace: Namespace::Pattern,
                name: name.into(),
            }),
            Entry::Vacant(slot) => {
                let index = slot.index();
                slot.insert(NamedPattern {
                    index,
                    name: name.into(),
                    regex,
                    origin,
                });
                Ok(PatternId {
                    builder: self.tag,
                    index,
                })
            }
        }
    }

    pub fn add_state(
        &mut self,
        name: &str,
        origin: Option<SourceAnchor>,
    ) -> Result<StateId, GrammarError> {
        match self.states.entry(name.into()) {
            Entry::Occupied(_) => Err(GrammarError::DuplicateName {
                namespace: Namespace::LexerState,
                name: name.into(),
            }),
            Entry::Vacant(slot) => {
                let index = slot.index();
                slot.insert(LexerState {
                    index,
                    name: name.into(),
                    origin,
                });
                Ok(StateId {
                    builder: self.tag,
                    index,
                })
            }
        }
    }

    /// Parses `text` as a regex; errors go to `reporter`.
    pub fn parse_regex(
        &self,
        text: &str,
        origin: Option<&SourceAnchor>,
        reporter: &mut dyn Reporter,
    ) -> Regex {
        Regex::parse(text, origin, reporter)
    }

    /// Registers a lexical rule.
    ///
    /// `Soft` rules must bind a soft terminal; `Normal` and `Class` rules bind
    /// a terminal or a layout symbol. `class_rule`, when given, must be a rule
    /// of kind `Class`.
    ///
    /// # Parameters
    /// - `kind`: How the rule takes part in scanning.
    /// - `symbol`: The terminal, soft terminal or layout symbol produced.
    /// - `regex`: The rule's pattern; an invalid regex is accepted here and
    ///   skipped by the lexer builder.
    /// - `states`: Lexer states the rule is active in; duplicates are merged.
    /// - `priority`: Higher values win among matches of equal length.
    /// - `class_rule`: For `Soft` rules, the `Class` rule whose matches they
    ///   refine.
    /// - `origin`: Source anchor used in diagnostics.
    ///
    /// # Returns
    /// The handle of the new rule; rules are indexed in registration order.
    ///
    /// # Errors
    /// - [`GrammarError::UnknownEntity`] if `symbol`, a state or
    ///   `class_rule` was not issued by this builder,
    /// - [`GrammarError::KindMismatch`] if `kind` cannot produce `symbol`,
    /// - [`GrammarError::NoStates`] if `states` is empty,
    /// - [`GrammarError::NotClassRule`] if `class_rule` is not a `Class` rule.
    #[allow(clippy::too_many_arguments)]
    pub fn add_lexem(
        &mut self,
        kind: LexemKind,
        symbol: SymbolId,
        regex: Regex,
        states: &[StateId],
        priority: i32,
        class_rule: Option<LexemId>,
        origin: Option<SourceAnchor>,
    ) -> Result<LexemId, GrammarError> {
        let sym = self.resolve(symbol)?;
        let compatible = match kind {
            LexemKind::Soft => sym.kind == SymbolKind::SoftTerminal,
            LexemKind::Normal | LexemKind::Class => {
                matches!(sym.kind, SymbolKind::Terminal | SymbolKind::Layout) && symbol != self.eoi
            }
        };
        if !compatible {
            return Err(GrammarError::KindMismatch {
                kind: kind.name(),
                symbol: sym.name.clone(),
            });
        }
        if states.is_empty() {
            return Err(GrammarError::NoStates {
                symbol: sym.name.clone(),
            });
        }
        for &state in states {
            if state.builder != self.tag || state.index >= self.states.len() {
                return Err(GrammarError::UnknownEntity {
                    namespace: Namespace::LexerState,
                    index: state.index,
                });
            }
        }
        if let Some(class) = class_rule {
            let rule = (class.builder == self.tag)
                .then(|| self.lexems.get(class.index))
                .flatten()
                .ok_or(GrammarError::UnknownEntity {
                    namespace: Namespace::LexicalRule,
                    index: class.index,
                })?;
            if rule.kind != LexemKind::Class {
                return Err(GrammarError::NotClassRule { index: class.index });
            }
        }

        let mut state_indices: Vec<usize> = states.iter().map(|s| s.index).collect();
        state_indices.sort_unstable();
        state_indices.dedup();

        let index = self.lexems.len();
        self.lexems.push(LexicalRule {
            index,
            kind,
            symbol: symbol.index,
            regex,
            states: state_indices,
            priority,
            class_rule: class_rule.map(|c| c.index),
            origin,
        });
        Ok(LexemId {
            builder: self.tag,
            index,
        })
    }

    /// Declares a precedence level; later declarations bind tighter.
    pub fn add_prio(
        &mut self,
        assoc: Assoc,
        symbols: &[SymbolId],
        origin: Option<SourceAnchor>,
    ) -> Result<PrioId, GrammarError> {
        let mut members = Vec::with_capacity(symbols.len());
        for &s in symbols {
            let sym = self.resolve(s)?;
            if !sym.kind.is_terminal() {
                return Err(GrammarError::NotTerminal {
                    name: sym.name.clone(),
                });
            }
            members.push(s.index);
        }
        self.priorities.push(Prio {
            assoc,
            symbols: members,
            origin,
        });
        Ok(PrioId(self.priorities.len() - 1))
    }

    pub fn add_input(
        &mut self,
        nonterminal: SymbolId,
        has_eoi: bool,
        origin: Option<SourceAnchor>,
    ) -> Result<InputId, GrammarError> {
        self.expect_nonterminal(nonterminal)?;
        self.inputs.push(InputRef {
            target: nonterminal.index,
            has_eoi,
            origin,
        });
        Ok(InputId(self.inputs.len() - 1))
    }

    /// Starts a rule for `left`; nothing is registered until
    /// [`RuleBuilder::commit`].
    pub fn rule(
        &mut self,
        alias: Option<&str>,
        left: SymbolId,
        origin: Option<SourceAnchor>,
    ) -> Result<RuleBuilder<'_>, GrammarError> {
        self.expect_nonterminal(left)?;
        Ok(RuleBuilder {
            builder: self,
            alias: alias.map(Into::into),
            left: left.index,
            right: Vec::new(),
            precedence: None,
            origin,
        })
    }

    /// Convenience for a rule without aliases or anchors.
    pub fn add_rule(&mut self, left: SymbolId, right: &[SymbolId]) -> Result<RuleId, GrammarError> {
        let mut rule = self.rule(None, left, None)?;
        for &s in right {
            rule = rule.symbol(s, None, None)?;
        }
        Ok(rule.commit())
    }

    fn resolve(&self, id: SymbolId) -> Result<&Symbol, GrammarError> {
        (id.builder == self.tag)
            .then(|| self.symbols.get_index(id.index))
            .flatten()
            .map(|(_, s)| s)
            .ok_or(GrammarError::UnknownEntity {
                namespace: Namespace::Symbol,
                index: id.index,
            })
    }

    fn expect_nonterminal(&self, id: SymbolId) -> Result<(), GrammarError> {
        let sym = self.resolve(id)?;
        if sym.kind != SymbolKind::Nonterminal {
            return Err(GrammarError::NotNonterminal {
                name: sym.name.clone(),
            });
        }
        Ok(())
    }

    /// Freezes the grammar.
    ///
    /// Symbols are stably partitioned into terminals (soft terminals folded
    /// in, EOI first), nonterminals and layout symbols, then indexed.
    pub fn create(self) -> Grammar {
        let n = self.symbols.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| self.symbols[i].kind.sort_class());

        let mut position = vec![0; n];
        for (index, &old) in order.iter().enumerate() {
            position[old] = index;
        }

        let mut pool: Vec<Option<Symbol>> = self.symbols.into_values().map(Some).collect();
        let symbols: Vec<Symbol> = order
            .iter()
            .enumerate()
            .filter_map(|(index, &old)| {
                let mut sym = pool[old].take()?;
                sym.index = index;
                sym.soft_class = sym.soft_class.map(|c| position[c]);
                Some(sym)
            })
            .collect();

        let terminals = symbols.iter().filter(|s| s.is_terminal()).count();
        let grammar_symbols = symbols
            .iter()
            .filter(|s| s.kind != SymbolKind::Layout)
            .count();
        let error = symbols.iter().position(|s| s.name.as_str() == ERROR);

        let lexical_rules: Vec<LexicalRule> = self
            .lexems
            .into_iter()
            .map(|mut l| {
                l.symbol = position[l.symbol];
                l
            })
            .collect();

        let (rules, priorities, inputs) = if self.rules.is_empty() {
            (None, None, None)
        } else {
            let rules = self
                .rules
                .into_iter()
                .map(|mut r| {
                    r.left = position[r.left];
                    r.precedence = r.precedence.map(|p| position[p]);
                    for sref in &mut r.right {
                        sref.target = position[sref.target];
                    }
                    r
                })
                .collect();
            let priorities = self
                .priorities
                .into_iter()
                .map(|mut p| {
                    for s in &mut p.symbols {
                        *s = position[*s];
                    }
                    p
                })
                .collect();
            let inputs = self
                .inputs
                .into_iter()
                .map(|mut i| {
                    i.target = position[i.target];
                    i
                })
                .collect();
            (Some(rules), Some(priorities), Some(inputs))
        };

        log::debug!(
            "grammar created: {} symbols ({} terminals, {} grammar symbols), {} lexical rules",
            symbols.len(),
            terminals,
            grammar_symbols,
            lexical_rules.len()
        );

        Grammar {
            builder: self.tag,
            symbols,
            terminals,
            grammar_symbols,
            rules,
            priorities,
            inputs,
            lexical_rules,
            patterns: self.patterns.into_values().collect(),
            states: self.states.into_values().collect(),
            error,
            positions: position,
        }
    }
}

/// Accumulates the right-hand side of a rule.
///
/// ```rust
/// # use gramc::grammar::GrammarBuilder;
/// let mut b = GrammarBuilder::new();
/// let e = b.add_nonterminal("expr", None, None).unwrap();
/// let n = b.add_terminal("NUM", None, None).unwrap();
/// let r = b.rule(None, e, None).unwrap().symbol(n, None, None).unwrap().commit();
/// assert_eq!(r.index(), 0);
/// ```
#[derive(Debug)]
pub struct RuleBuilder<'b> {
    builder: &'b mut GrammarBuilder,
    alias: Option<String>,
    left: usize,
    right: Vec<SymbolRef>,
    precedence: Option<usize>,
    origin: Option<SourceAnchor>,
}

impl RuleBuilder<'_> {
    /// Appends a reference to a terminal or nonterminal.
    pub fn symbol(
        mut self,
        symbol: SymbolId,
        alias: Option<&str>,
        origin: Option<SourceAnchor>,
    ) -> Result<Self, GrammarError> {
        let eoi = self.builder.eoi;
        let sym = self.builder.resolve(symbol)?;
        if sym.kind == SymbolKind::Layout || symbol == eoi {
            return Err(GrammarError::NotRuleSymbol {
                name: sym.name.clone(),
            });
        }
        self.right.push(SymbolRef {
            target: symbol.index,
            alias: alias.map(Into::into),
            origin,
        });
        Ok(self)
    }

    /// Sets the terminal whose precedence this rule takes.
    pub fn precedence(mut self, symbol: SymbolId) -> Result<Self, GrammarError> {
        let sym = self.builder.resolve(symbol)?;
        if !sym.kind.is_terminal() {
            return Err(GrammarError::NotTerminal {
                name: sym.name.clone(),
            });
        }
        self.precedence = Some(symbol.index);
        Ok(self)
    }

    /// Registers the rule.
    pub fn commit(self) -> RuleId {
        let index = self.builder.rules.len();
        self.builder.rules.push(Rule {
            index,
            alias: self.alias,
            left: self.left,
            right: self.right,
            precedence: self.precedence,
            origin: self.origin,
        });
        RuleId(index)
    }
}
