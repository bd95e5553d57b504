//! Lexer table construction.
//!
//! For every lexer state the applicable lexical rules are compiled into one
//! Thompson NFA, which is determinized by subset construction. Accepting
//! states resolve competing rules by priority, then declaration order. Cells
//! leaving an accepting state whose continuation may fail carry a
//! backtracking entry so the scanner can fall back to the longest accepted
//! prefix. Finally, character classes that behave identically in every state
//! are merged.
//!
//! ```rust
//! # use gramc::diag::Diagnostics;
//! # use gramc::grammar::{GrammarBuilder, LexemKind};
//! # use gramc::lexgen::LexerBuilder;
//! # use gramc::regex::Regex;
//! let mut b = GrammarBuilder::new();
//! let initial = b.add_state("initial", None).unwrap();
//! let num = b.add_terminal("NUM", None, None).unwrap();
//! let mut sink = Diagnostics::new();
//! let re = Regex::parse("[0-9]+", None, &mut sink);
//! b.add_lexem(LexemKind::Normal, num, re, &[initial], 0, None, None).unwrap();
//! let tables = LexerBuilder::new(&b.create()).build(&mut sink).unwrap();
//! assert_eq!(tables.state_map.len(), 1);
//! assert!(sink.is_empty());
//! ```

mod dfa;
mod nfa;
mod partition;
mod tables;

pub use tables::{Cell, ClassInstances, EOI_CLASS, INVALID, LexerTables};

use crate::diag::{Diagnostic, DiagnosticKind, Reporter, SourceAnchor, emit};
use crate::error::BuildError;
use crate::grammar::{Grammar, LexemKind, LexicalRule};
use crate::options::BuildOptions;
use crate::regex::TextRange;
use crate::regex::charset::{CharSet, EOI};
use dfa::{ClassNfa, Dfa};
use nfa::{CompiledRule, NfaCompiler};
use partition::Partition;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write;

/// Builds [`LexerTables`] from a frozen grammar.
pub struct LexerBuilder<'g> {
    grammar: &'g Grammar,
    options: BuildOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Raw {
    Goto(usize),
    Backtrack(usize),
    Accept(usize),
    Invalid,
}

impl Raw {
    fn encode(self, first_rule: i32) -> i32 {
        match self {
            Raw::Goto(state) => state as i32,
            Raw::Backtrack(entry) => -2 - entry as i32,
            Raw::Accept(action) => first_rule - action as i32,
            Raw::Invalid => INVALID,
        }
    }
}

impl<'g> LexerBuilder<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_options(grammar, BuildOptions::default())
    }

    pub fn with_options(grammar: &'g Grammar, options: BuildOptions) -> Self {
        Self { grammar, options }
    }

    fn name(&self, rule: &LexicalRule) -> &str {
        &self.grammar.symbol(rule.symbol).name
    }

    /// Compiles every lexical rule of the grammar into one set of tables.
    ///
    /// Rules with invalid or cyclic patterns are skipped; the others still
    /// produce tables. Empty matches, conflicts between rules, rules that can
    /// never win and class instances that do not fit their class rule are
    /// reported, never fatal.
    ///
    /// # Parameters
    /// - `reporter`: Receives every diagnostic raised while building.
    ///
    /// # Returns
    /// The lexer tables, with one start state per lexer state.
    ///
    /// # Errors
    /// [`BuildError::TooManyStates`] if the automaton does not fit the
    /// table encoding.
    pub fn build(&self, reporter: &mut dyn Reporter) -> Result<LexerTables, BuildError> {
        let g = self.grammar;
        let rules = g.lexical_rules();
        log::debug!(
            "building lexer: {} rules, {} patterns, {} lexer states",
            rules.len(),
            g.patterns().len(),
            g.lexer_states().len()
        );

        let mut unusable: HashSet<&str> = g
            .patterns()
            .iter()
            .filter(|p| !p.regex.is_valid())
            .map(|p| p.name.as_str())
            .collect();
        for p in nfa::cyclic_patterns(g.patterns()) {
            let pattern = &g.patterns()[p];
            emit(
                reporter,
                Diagnostic::error(
                    DiagnosticKind::Structural,
                    format!("pattern `{}' references itself", pattern.name),
                )
                .at(pattern.origin.as_ref()),
            );
            unusable.insert(pattern.name.as_str());
        }
        let mut compiler = NfaCompiler::new(g.patterns(), unusable, self.options.max_repeat);

        let mut compiled: Vec<Option<CompiledRule>> = vec![None; rules.len()];
        let mut instances: Vec<(usize, String)> = Vec::new();
        for rule in rules {
            if !rule.regex.is_valid() {
                log::debug!("lexical rule `{}' dropped: regex has errors", self.name(rule));
                continue;
            }
            if rule.kind == LexemKind::Soft && rule.class_rule.is_none() {
                self.error(
                    reporter,
                    rule,
                    format!("soft lexical rule `{}' must refine a class rule", self.name(rule)),
                );
                continue;
            }
            if let Some(class) = rule.class_rule {
                match rule.regex.constant() {
                    Some(text) => instances.push((rule.index, text)),
                    None => self.error(
                        reporter,
                        rule,
                        format!(
                            "`{}' refines class rule `{}' but does not match a constant text",
                            self.name(rule),
                            self.name(&rules[class])
                        ),
                    ),
                }
                continue;
            }
            match compiler.compile_rule(&rule.regex) {
                Ok(c) => compiled[rule.index] = Some(c),
                Err(e) => {
                    let anchor = narrow(rule.origin.as_ref(), rule.regex.text(), e.range);
                    emit(
                        reporter,
                        Diagnostic::error(
                            DiagnosticKind::Structural,
                            format!("lexical rule `{}': {}", self.name(rule), e.message),
                        )
                        .at(anchor.as_ref()),
                    );
                }
            }
        }

        let lexer_states = g.lexer_states().len();
        let mut starts = Vec::with_capacity(lexer_states);
        for ls in 0..lexer_states {
            let start = compiler.nfa.add_state();
            for rule in rules {
                if let Some(c) = &compiled[rule.index] {
                    if rule.states.binary_search(&ls).is_ok() {
                        compiler.nfa.add_eps(start, c.fragment.start);
                    }
                }
            }
            starts.push(start);
        }
        let nfa = compiler.nfa;

        let mut sets: Vec<&CharSet> = nfa.sets.iter().collect();
        sets.extend(compiled.iter().flatten().filter_map(|c| c.lookahead.as_ref()));
        let partition = Partition::new(&sets);
        let classes = partition.classes();

        let set_classes: Vec<Vec<usize>> =
            nfa.sets.iter().map(|s| partition.classes_of(s)).collect();
        let mut accept = vec![None; nfa.states.len()];
        for (r, c) in compiled.iter().enumerate() {
            if let Some(c) = c {
                accept[c.fragment.end] = Some(r);
            }
        }
        let class_nfa = ClassNfa {
            eps: nfa.states.iter().map(|s| s.eps.clone()).collect(),
            moves: nfa
                .states
                .iter()
                .map(|s| {
                    s.edges
                        .iter()
                        .flat_map(|&(set, t)| set_classes[set].iter().map(move |&c| (c, t)))
                        .collect()
                })
                .collect(),
            accept,
        };
        let excluded: Vec<Vec<bool>> = compiled
            .iter()
            .map(|c| {
                let mut row = vec![false; classes];
                if let Some(la) = c.as_ref().and_then(|c| c.lookahead.as_ref()) {
                    for class in partition.classes_of(la) {
                        row[class] = true;
                    }
                }
                row
            })
            .collect();

        let mut dfa = dfa::build(&class_nfa, &starts, classes, |r| Reverse(rules[r].priority));
        let n = dfa.states.len();
        if n >= i32::MAX as usize {
            return Err(BuildError::TooManyStates { states: n });
        }

        let mut warned = BTreeSet::new();
        for &s in &dfa.starts {
            for r in std::mem::take(&mut dfa.states[s].accepts) {
                if warned.insert(r) {
                    emit(
                        reporter,
                        Diagnostic::warning(
                            DiagnosticKind::EmptyMatch,
                            format!(
                                "lexical rule `{}' accepts empty text, the empty match is ignored",
                                self.name(&rules[r])
                            ),
                        )
                        .at(rules[r].origin.as_ref()),
                    );
                }
            }
        }

        let accept_at = |s: usize, c: usize| -> Option<usize> {
            dfa.states[s]
                .accepts
                .iter()
                .copied()
                .find(|&r| !excluded[r][c])
        };

        let fails = may_fail(&dfa, classes, &accept_at);

        let mut backtracking: Vec<(usize, usize)> = Vec::new();
        let mut entries: HashMap<(usize, usize), usize> = HashMap::new();
        let mut winners = vec![false; rules.len()];
        let mut raw = Vec::with_capacity(n * classes);
        for s in 0..n {
            for c in 0..classes {
                let cell = match (dfa.states[s].next[c], accept_at(s, c)) {
                    (Some(t), Some(r)) if fails[t] => {
                        winners[r] = true;
                        let key = (r + 1, t);
                        let entry = *entries.entry(key).or_insert_with(|| {
                            backtracking.push(key);
                            backtracking.len() - 1
                        });
                        Raw::Backtrack(entry)
                    }
                    (Some(t), _) => Raw::Goto(t),
                    (None, Some(r)) => {
                        winners[r] = true;
                        Raw::Accept(r + 1)
                    }
                    (None, None) if c == EOI_CLASS && dfa.states[s].start_of.is_some() => {
                        Raw::Accept(0)
                    }
                    (None, None) => Raw::Invalid,
                };
                raw.push(cell);
            }
        }
        let first_rule = -2 - backtracking.len() as i32;
        let encoded: Vec<i32> = raw.iter().map(|c| c.encode(first_rule)).collect();

        self.report_conflicts(reporter, &dfa, &compiled, &winners);

        // merge classes with identical columns; EOI stays alone
        let mut remap = vec![EOI_CLASS; classes];
        let mut representatives = vec![EOI_CLASS];
        let mut columns: HashMap<Vec<i32>, usize> = HashMap::new();
        for (c, slot) in remap.iter_mut().enumerate().skip(1) {
            let column: Vec<i32> = (0..n).map(|s| encoded[s * classes + c]).collect();
            *slot = *columns.entry(column).or_insert_with(|| {
                representatives.push(c);
                representatives.len() - 1
            });
        }
        let final_classes = representatives.len();
        let mut transitions = Vec::with_capacity(n * final_classes);
        for s in 0..n {
            transitions.extend(representatives.iter().map(|&c| encoded[s * classes + c]));
        }

        let mut ascii_classes = vec![0u32; 128];
        let mut class_ranges: Vec<(u32, u32, u32)> = Vec::new();
        for (lo, hi, pre) in partition.intervals() {
            if lo == EOI {
                continue;
            }
            let class = remap[pre] as u32;
            for cp in lo..=hi.min(127) {
                ascii_classes[cp as usize] = class;
            }
            let lo = lo.max(128);
            if lo > hi {
                continue;
            }
            match class_ranges.last_mut() {
                Some(last) if last.2 == class && last.1 + 1 == lo => last.1 = hi,
                _ => class_ranges.push((lo, hi, class)),
            }
        }

        let instances = self.instances(reporter, &dfa, &partition, &compiled, instances);

        let mut tables = LexerTables {
            classes: final_classes,
            ascii_classes,
            class_ranges,
            states: n,
            transitions,
            state_map: dfa.starts.clone(),
            backtracking,
            first_rule,
            action_symbol: std::iter::once(g.eoi().index)
                .chain(rules.iter().map(|r| r.symbol))
                .collect(),
            action_rule: std::iter::once(None)
                .chain(rules.iter().map(|r| Some(r.index)))
                .collect(),
            instances,
            debug: None,
        };
        log::debug!(
            "lexer: {} states, {} classes ({} before merging), {} backtracking entries",
            tables.states,
            tables.classes,
            classes,
            tables.backtracking.len()
        );
        if self.options.debug {
            tables.debug = self.dump(&dfa, &tables).ok();
        }
        Ok(tables)
    }

    fn error(&self, reporter: &mut dyn Reporter, rule: &LexicalRule, message: String) {
        emit(
            reporter,
            Diagnostic::error(DiagnosticKind::Structural, message).at(rule.origin.as_ref()),
        );
    }

    /// Reports equal-priority overlaps and rules that never win.
    fn report_conflicts(
        &self,
        reporter: &mut dyn Reporter,
        dfa: &Dfa,
        compiled: &[Option<CompiledRule>],
        winners: &[bool],
    ) {
        let rules = self.grammar.lexical_rules();
        let mut shadowed_by: BTreeMap<usize, usize> = BTreeMap::new();
        let mut ambiguous: BTreeSet<(usize, usize)> = BTreeSet::new();
        for state in &dfa.states {
            if let Some((&best, rest)) = state.accepts.split_first() {
                for &r in rest {
                    shadowed_by.entry(r).or_insert(best);
                    if rules[r].priority == rules[best].priority {
                        ambiguous.insert((best, r));
                    }
                }
            }
        }

        for (a, b) in ambiguous {
            emit(
                reporter,
                Diagnostic::warning(
                    DiagnosticKind::LexicalAmbiguity,
                    format!(
                        "`{}' and `{}' accept the same text with equal priority, `{}' wins",
                        self.name(&rules[a]),
                        self.name(&rules[b]),
                        self.name(&rules[a])
                    ),
                )
                .at(rules[a].origin.as_ref())
                .at(rules[b].origin.as_ref()),
            );
        }

        for (r, c) in compiled.iter().enumerate() {
            if c.is_none() || winners[r] {
                continue;
            }
            let message = match shadowed_by.get(&r) {
                Some(&by) => format!(
                    "lexical rule `{}' is never matched, `{}' always wins",
                    self.name(&rules[r]),
                    self.name(&rules[by])
                ),
                None => format!("lexical rule `{}' is never matched", self.name(&rules[r])),
            };
            emit(
                reporter,
                Diagnostic::warning(DiagnosticKind::UnreachableRule, message)
                    .at(rules[r].origin.as_ref()),
            );
        }
    }

    /// Validates class instances against the DFA and groups them by class rule.
    fn instances(
        &self,
        reporter: &mut dyn Reporter,
        dfa: &Dfa,
        partition: &Partition,
        compiled: &[Option<CompiledRule>],
        instances: Vec<(usize, String)>,
    ) -> Vec<ClassInstances> {
        let rules = self.grammar.lexical_rules();
        let mut groups: BTreeMap<usize, BTreeMap<String, usize>> = BTreeMap::new();
        for (r, text) in instances {
            let rule = &rules[r];
            let Some(class) = rule.class_rule else {
                continue;
            };
            if compiled[class].is_none() {
                self.error(
                    reporter,
                    rule,
                    format!(
                        "`{}' refines class rule `{}', which was dropped",
                        self.name(rule),
                        self.name(&rules[class])
                    ),
                );
                continue;
            }
            let matched = rule.states.iter().all(|&ls| {
                let mut s = dfa.starts[ls];
                for ch in text.chars() {
                    match dfa.states[s].next[partition.class_of(ch as u32)] {
                        Some(t) => s = t,
                        None => return false,
                    }
                }
                dfa.states[s].accepts.first() == Some(&class)
            });
            if !matched {
                self.error(
                    reporter,
                    rule,
                    format!(
                        "`{}' is not matched by class rule `{}'",
                        text,
                        self.name(&rules[class])
                    ),
                );
                continue;
            }
            let entries = groups.entry(class + 1).or_default();
            if let Some(&first) = entries.get(&text) {
                emit(
                    reporter,
                    Diagnostic::warning(
                        DiagnosticKind::LexicalAmbiguity,
                        format!(
                            "`{}' is declared as both `{}' and `{}', `{}' wins",
                            text,
                            self.name(&rules[first - 1]),
                            self.name(rule),
                            self.name(&rules[first - 1])
                        ),
                    )
                    .at(rule.origin.as_ref()),
                );
                continue;
            }
            entries.insert(text, r + 1);
        }
        groups
            .into_iter()
            .map(|(class_action, entries)| ClassInstances {
                class_action,
                entries: entries
                    .into_iter()
                    .map(|(text, action)| (text.as_str().into(), action))
                    .collect(),
            })
            .collect()
    }

    fn dump(&self, dfa: &Dfa, tables: &LexerTables) -> Result<String, std::fmt::Error> {
        let g = self.grammar;
        let rules = g.lexical_rules();
        let mut out = String::new();
        writeln!(
            out,
            "# lexer: {} states, {} classes, {} backtracking entries",
            tables.states,
            tables.classes,
            tables.backtracking.len()
        )?;
        for (ls, state) in g.lexer_states().iter().enumerate() {
            writeln!(out, "start {} = {}", state.name, tables.state_map[ls])?;
        }
        for (s, state) in dfa.states.iter().enumerate() {
            let accepts: Vec<&str> = state.accepts.iter().map(|&r| self.name(&rules[r])).collect();
            write!(out, "{}: [{}]", s, accepts.join(", "))?;
            for c in 0..tables.classes {
                write!(out, " {}", tables.cell(s, c))?;
            }
            writeln!(out)?;
        }
        for (b, (action, state)) in tables.backtracking.iter().enumerate() {
            writeln!(out, "backtrack {}: action {} then {}", b, action, state)?;
        }
        Ok(out)
    }
}

fn narrow(origin: Option<&SourceAnchor>, text: &str, range: TextRange) -> Option<SourceAnchor> {
    origin.map(|o| o.narrow(text, range.start, range.end))
}

/// States from which scanning can end in an invalid cell before any rule
/// accepts again.
fn may_fail(dfa: &Dfa, classes: usize, accept_at: &impl Fn(usize, usize) -> Option<usize>) -> Vec<bool> {
    let n = dfa.states.len();
    let mut fails = vec![false; n];
    loop {
        let mut changed = false;
        for s in 0..n {
            if fails[s] {
                continue;
            }
            let state = &dfa.states[s];
            let may = (0..classes).any(|c| {
                if accept_at(s, c).is_some() {
                    return false;
                }
                match state.next[c] {
                    Some(t) => fails[t],
                    None => !(c == EOI_CLASS && state.start_of.is_some()),
                }
            });
            if may {
                fails[s] = true;
                changed = true;
            }
        }
        if !changed {
            return fails;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Diagnostics;
    use crate::grammar::{GrammarBuilder, StateId, SymbolId};
    use crate::regex::Regex;

    struct Fixture {
        b: GrammarBuilder,
        initial: StateId,
        sink: Diagnostics,
    }

    impl Fixture {
        fn new() -> Self {
            let mut b = GrammarBuilder::new();
            let initial = b.add_state("initial", None).unwrap();
            Self {
                b,
                initial,
                sink: Diagnostics::new(),
            }
        }

        fn rule(&mut self, name: &str, regex: &str, priority: i32) -> SymbolId {
            let sym = match self.b.symbol(name) {
                Some(sym) => sym,
                None => self.b.add_terminal(name, None, None).unwrap(),
            };
            let re = Regex::parse(regex, None, &mut self.sink);
            self.b
                .add_lexem(LexemKind::Normal, sym, re, &[self.initial], priority, None, None)
                .unwrap();
            sym
        }

        fn build(self) -> (Grammar, LexerTables, Diagnostics) {
            let mut sink = self.sink;
            let g = self.b.create();
            let t = LexerBuilder::with_options(&g, BuildOptions::default().with_debug(true))
                .build(&mut sink)
                .unwrap();
            (g, t, sink)
        }
    }

    /// Longest-match scan returning `(action, text)` pairs, `None` on failure.
    fn scan(t: &LexerTables, input: &str) -> Vec<Option<(usize, std::string::String)>> {
        let chars: Vec<char> = input.chars().collect();
        let mut out = Vec::new();
        let mut pos = 0;
        loop {
            let start = pos;
            let mut state = t.state_map[0];
            let mut backup = None;
            let mut i = pos;
            let result = loop {
                let class = chars.get(i).map_or(EOI_CLASS, |&c| t.class_of(c));
                match t.cell(state, class) {
                    Cell::Goto(next) => {
                        state = next;
                        i += 1;
                    }
                    Cell::Backtrack { action, state: next } => {
                        backup = Some((action, i));
                        state = next;
                        i += 1;
                    }
                    Cell::Accept(action) => break Some((action, i)),
                    Cell::Invalid => break backup,
                }
            };
            match result {
                Some((0, _)) => return out,
                Some((action, end)) => {
                    out.push(Some((action, chars[start..end].iter().collect())));
                    pos = end;
                }
                None => {
                    out.push(None);
                    return out;
                }
            }
        }
    }

    #[test]
    fn longest_match_with_backtracking() {
        let mut f = Fixture::new();
        f.rule("a", "a", 0);
        f.rule("abc", "abc", 0);
        let (_, t, sink) = f.build();
        assert!(sink.is_empty(), "{:?}", sink);
        assert!(!t.backtracking.is_empty());
        assert_eq!(
            scan(&t, "abca"),
            vec![Some((2, "abc".into())), Some((1, "a".into()))]
        );
        assert_eq!(scan(&t, "abd"), vec![Some((1, "a".into())), None]);
    }

    #[test]
    fn no_backtracking_when_continuation_cannot_fail() {
        let mut f = Fixture::new();
        f.rule("a", "a", 0);
        f.rule("ab", "ab", 0);
        let (_, t, _) = f.build();
        assert!(t.backtracking.is_empty());
        assert_eq!(scan(&t, "ac"), vec![Some((1, "a".into())), None]);
        assert_eq!(scan(&t, "aba"), vec![Some((2, "ab".into())), Some((1, "a".into()))]);
    }

    #[test]
    fn priority_beats_declaration_order() {
        let mut f = Fixture::new();
        f.rule("id", "[a-z]+", 0);
        f.rule("kw", "return", 1);
        let (_, t, sink) = f.build();
        assert_eq!(sink.of_kind(DiagnosticKind::LexicalAmbiguity).count(), 0);
        assert_eq!(scan(&t, "return"), vec![Some((2, "return".into()))]);
        assert_eq!(scan(&t, "returns"), vec![Some((1, "returns".into()))]);
    }

    #[test]
    fn shadowed_rule_is_reported() {
        let mut f = Fixture::new();
        f.rule("id", "[a-z]+", 0);
        f.rule("kw", "return", 0);
        let (_, _, sink) = f.build();
        let unreachable: Vec<_> = sink.of_kind(DiagnosticKind::UnreachableRule).collect();
        assert_eq!(unreachable.len(), 1);
        assert!(unreachable[0].message.contains("`kw'"));
        assert_eq!(sink.of_kind(DiagnosticKind::LexicalAmbiguity).count(), 1);
    }

    #[test]
    fn empty_match_is_ignored() {
        let mut f = Fixture::new();
        f.rule("ws", "[ ]*", 0);
        let (_, t, sink) = f.build();
        assert_eq!(sink.of_kind(DiagnosticKind::EmptyMatch).count(), 1);
        assert_eq!(scan(&t, "  "), vec![Some((1, "  ".into()))]);
        assert_eq!(scan(&t, ""), vec![]);
    }

    #[test]
    fn lookahead_excludes_following_class() {
        let mut f = Fixture::new();
        f.rule("int", "[0-9]+(?![a-z])", 0);
        f.rule("word", "[0-9a-z]+", 0);
        let (_, t, _) = f.build();
        assert_eq!(scan(&t, "42"), vec![Some((1, "42".into()))]);
        assert_eq!(scan(&t, "42x"), vec![Some((2, "42x".into()))]);
    }

    #[test]
    fn eoi_rule() {
        let mut f = Fixture::new();
        f.rule("last", "x{eoi}", 0);
        f.rule("x", "x", 0);
        let (_, t, _) = f.build();
        let start = t.state_map[0];
        let Cell::Goto(after_x) = t.cell(start, t.class_of('x')) else {
            panic!("expected goto")
        };
        assert!(matches!(t.cell(after_x, EOI_CLASS), Cell::Goto(_)));
        assert_eq!(t.cell(after_x, t.class_of('y')), Cell::Accept(2));
    }

    #[test]
    fn classes_are_merged() {
        let mut f = Fixture::new();
        f.rule("id", "[a-z][a-z0-9]*", 0);
        f.rule("num", "[0-9]+", 0);
        f.rule("x", "[xyz]", 1);
        let (_, t, _) = f.build();
        // EOI, other, digits, a-w, x-z
        assert_eq!(t.classes, 5);
        assert_eq!(t.class_of('a'), t.class_of('w'));
        assert_ne!(t.class_of('a'), t.class_of('x'));
        assert_eq!(t.class_of('x'), t.class_of('z'));
        assert_eq!(t.class_of('%'), t.class_of('λ'));
        assert!(t.debug.as_deref().unwrap_or("").starts_with("# lexer:"));
    }

    #[test]
    fn broken_rules_are_dropped() {
        let mut f = Fixture::new();
        f.b.add_pattern("a", Regex::parse("x{b}", None, &mut f.sink), None)
            .unwrap();
        f.b.add_pattern("b", Regex::parse("y{a}", None, &mut f.sink), None)
            .unwrap();
        f.rule("loop", "{a}", 0);
        f.rule("bad", "(", 0);
        f.rule("ok", "ok", 0);
        let (_, t, sink) = f.build();
        let errors: Vec<_> = sink.errors().map(|d| d.kind).collect();
        assert_eq!(
            errors,
            vec![
                DiagnosticKind::RegexSyntax,
                DiagnosticKind::Structural,
                DiagnosticKind::Structural,
                DiagnosticKind::Structural,
            ]
        );
        assert_eq!(scan(&t, "ok"), vec![Some((3, "ok".into()))]);
    }

    #[test]
    fn class_instances() {
        let mut f = Fixture::new();
        let id = f.b.add_terminal("id", None, None).unwrap();
        let kw = f.b.add_soft_terminal("kw_if", id, None).unwrap();
        let other = f.b.add_soft_terminal("kw_bad", id, None).unwrap();
        let re = Regex::parse("[a-z]+", None, &mut f.sink);
        let class = f
            .b
            .add_lexem(LexemKind::Class, id, re, &[f.initial], 0, None, None)
            .unwrap();
        f.b.add_lexem(LexemKind::Soft, kw, Regex::literal("if"), &[f.initial], 0, Some(class), None)
            .unwrap();
        f.b.add_lexem(LexemKind::Soft, other, Regex::literal("IF"), &[f.initial], 0, Some(class), None)
            .unwrap();
        let (_, t, sink) = f.build();
        assert_eq!(sink.errors().count(), 1);
        assert_eq!(t.instance(1, "if"), Some(2));
        assert_eq!(t.instance(1, "IF"), None);
        assert_eq!(scan(&t, "if"), vec![Some((1, "if".into()))]);
    }

    #[test]
    fn deterministic() {
        let build = || {
            let mut f = Fixture::new();
            f.rule("id", "[a-zA-Z_][a-zA-Z_0-9]*", 0);
            f.rule("num", "[0-9]+(\\.[0-9]+)?", 0);
            f.rule("op", "[-+*/]|==|<=|>=", 0);
            f.rule("ws", "[ \\t\\n]+", 0);
            f.build().1
        };
        assert_eq!(build(), build());
    }
}
