//! LALR(1) table construction.
//!
//! The rule set is augmented with one start rule per input. A single LR(0)
//! automaton is built from all start items, so states are shared between
//! inputs. Lookaheads are computed by spontaneous generation and
//! propagation, then ACTION and GOTO are filled in. Conflicts are settled by
//! the policies in [`conflict`] and reported as
//! [`DiagnosticKind::GrammarConflict`]; the tables are always total.
//!
//! ```rust
//! # use gramc::diag::Diagnostics;
//! # use gramc::grammar::{Assoc, GrammarBuilder};
//! # use gramc::lalr::{LalrBuilder, ParserAction};
//! let mut b = GrammarBuilder::new();
//! let plus = b.add_terminal("+", None, None).unwrap();
//! let num = b.add_terminal("NUM", None, None).unwrap();
//! let expr = b.add_nonterminal("expr", None, None).unwrap();
//! b.add_rule(expr, &[expr, plus, expr]).unwrap();
//! b.add_rule(expr, &[num]).unwrap();
//! b.add_prio(Assoc::Left, &[plus], None).unwrap();
//! b.add_input(expr, true, None).unwrap();
//! let g = b.create();
//!
//! let mut sink = Diagnostics::new();
//! let tables = LalrBuilder::new(&g).build(&mut sink).unwrap();
//! assert!(sink.is_empty());
//! let fin = tables.final_states[0];
//! assert_eq!(tables.action(fin, g.eoi().index), ParserAction::Accept);
//! ```

pub mod conflict;
mod dump;
mod lookahead;
mod lr0;
mod sets;
mod tables;

pub use conflict::{Precedence, ShiftReduce, resolve_reduce_reduce, resolve_shift_reduce};
pub use tables::{Conflict, ConflictKind, ParserAction, ParserTables};

use crate::diag::{Diagnostic, DiagnosticKind, Reporter, emit};
use crate::error::BuildError;
use crate::grammar::{Grammar, InputRef, Rule};
use crate::options::BuildOptions;
use conflict::PrecedenceTable;
use sets::{FirstSets, Prods};
use std::collections::BTreeMap;

/// Builds [`ParserTables`] from a frozen grammar.
pub struct LalrBuilder<'g> {
    grammar: &'g Grammar,
    options: BuildOptions,
}

impl<'g> LalrBuilder<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_options(grammar, BuildOptions::default())
    }

    pub fn with_options(grammar: &'g Grammar, options: BuildOptions) -> Self {
        Self { grammar, options }
    }

    /// Builds the LALR(1) tables for every declared input.
    ///
    /// Conflicts are resolved by precedence where possible and recorded in
    /// [`ParserTables::conflicts`]; each is also reported as a diagnostic.
    ///
    /// # Parameters
    /// - `reporter`: Receives symbol checks and conflict diagnostics.
    ///
    /// # Returns
    /// The action and goto tables, with one start state per input.
    ///
    /// # Errors
    /// - [`BuildError::NoRules`] for a lexer-only grammar,
    /// - [`BuildError::NoInputs`] if no input is declared.
    pub fn build(&self, reporter: &mut dyn Reporter) -> Result<ParserTables, BuildError> {
        let g = self.grammar;
        let rules = g.rules().ok_or(BuildError::NoRules)?;
        let inputs = g.inputs().unwrap_or(&[]);
        if inputs.is_empty() {
            return Err(BuildError::NoInputs);
        }
        log::debug!(
            "building LALR(1) tables: {} rules, {} inputs, {} terminals, {} nonterminals",
            rules.len(),
            inputs.len(),
            g.terminals(),
            g.nonterminals()
        );

        self.check_symbols(reporter, rules, inputs);

        let prods = Prods::new(g);
        let sets = FirstSets::compute(&prods);
        let lr0 = lr0::build(&prods);
        let reductions = lookahead::compute(&lr0, &prods, &sets, inputs);
        let precedence = PrecedenceTable::new(g);

        let terminals = g.terminals();
        let nonterminals = g.nonterminals();
        let states = lr0.states.len();
        let mut action = vec![ParserAction::Error; states * terminals];
        let mut goto = vec![None; states * nonterminals];
        let mut conflicts = Vec::new();

        for (s, state) in lr0.states.iter().enumerate() {
            let row = &mut action[s * terminals..(s + 1) * terminals];
            for (&x, &t) in &state.goto {
                if x < terminals {
                    row[x] = ParserAction::Shift(t);
                } else {
                    goto[s * nonterminals + x - terminals] = Some(t);
                }
            }

            let mut candidates: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for (rule, la) in &reductions[s] {
                for &a in la {
                    candidates.entry(a).or_default().push(*rule);
                }
            }
            for (a, mut rs) in candidates {
                rs.sort_unstable();
                let Some(winner) = resolve_reduce_reduce(&rs) else {
                    continue;
                };
                if rs.len() > 1 {
                    conflicts.push(Conflict {
                        state: s,
                        lookahead: a,
                        kind: ConflictKind::ReduceReduce,
                        rules: rs,
                    });
                }
                let reduce = if prods.is_augmented(winner) {
                    ParserAction::Accept
                } else {
                    ParserAction::Reduce(winner)
                };
                let ParserAction::Shift(_) = row[a] else {
                    row[a] = reduce;
                    continue;
                };
                if prods.is_augmented(winner) {
                    // an input without eoi stops only where it cannot go on
                    continue;
                }
                let outcome =
                    resolve_shift_reduce(precedence.rule(&rules[winner]), precedence.terminal(a));
                match outcome {
                    ShiftReduce::Shift => {}
                    ShiftReduce::Reduce => row[a] = reduce,
                    ShiftReduce::NonAssoc => {
                        row[a] = reduce;
                        conflicts.push(Conflict {
                            state: s,
                            lookahead: a,
                            kind: ConflictKind::ShiftReduce(outcome),
                            rules: vec![winner],
                        });
                    }
                    ShiftReduce::ShiftByDefault => conflicts.push(Conflict {
                        state: s,
                        lookahead: a,
                        kind: ConflictKind::ShiftReduce(outcome),
                        rules: vec![winner],
                    }),
                }
            }
        }

        let default_reduce = (0..states)
            .map(|s| {
                if !self.options.default_reductions {
                    return None;
                }
                let row = &action[s * terminals..(s + 1) * terminals];
                let mut only = None;
                for &a in row {
                    match a {
                        ParserAction::Error => {}
                        ParserAction::Reduce(r) if only.is_none() || only == Some(r) => {
                            only = Some(r)
                        }
                        _ => return None,
                    }
                }
                only
            })
            .collect();

        self.report_conflicts(reporter, &prods, &conflicts);

        let mut tables = ParserTables {
            terminals,
            nonterminals,
            states,
            action,
            goto,
            default_reduce,
            rule_left: rules.iter().map(|r| r.left).collect(),
            rule_len: rules.iter().map(Rule::len).collect(),
            start_states: lr0.starts.clone(),
            final_states: lr0.finals.clone(),
            conflicts,
            debug: None,
        };
        log::debug!(
            "lalr: {} states, {} conflicts",
            tables.states,
            tables.conflicts.len()
        );
        if self.options.debug {
            tables.debug = dump::dump(g, &prods, &sets, &lr0, &reductions, &tables).ok();
        }
        Ok(tables)
    }

    /// Reports nonterminals without rules, nonterminals no input reaches and
    /// terminals no rule uses.
    fn check_symbols(&self, reporter: &mut dyn Reporter, rules: &[Rule], inputs: &[InputRef]) {
        let g = self.grammar;
        let terminals = g.terminals();
        let symbols = g.grammar_symbols();
        let mut by_left: Vec<Vec<&Rule>> = vec![Vec::new(); symbols];
        let mut used = vec![false; symbols];
        for rule in rules {
            by_left[rule.left].push(rule);
            for sref in &rule.right {
                used[sref.target] = true;
            }
        }

        for nt in terminals..symbols {
            if by_left[nt].is_empty() {
                let sym = g.symbol(nt);
                emit(
                    reporter,
                    Diagnostic::error(
                        DiagnosticKind::UndefinedNonterminal,
                        format!("nonterminal `{}' has no rules", sym.name),
                    )
                    .at(sym.origin.as_ref()),
                );
            }
        }

        let mut reachable = vec![false; symbols];
        let mut stack: Vec<usize> = inputs.iter().map(|i| i.target).collect();
        while let Some(x) = stack.pop() {
            if reachable[x] {
                continue;
            }
            reachable[x] = true;
            for rule in &by_left[x] {
                stack.extend(
                    rule.right
                        .iter()
                        .map(|s| s.target)
                        .filter(|&s| s >= terminals && !reachable[s]),
                );
            }
        }
        for nt in terminals..symbols {
            if !reachable[nt] {
                let sym = g.symbol(nt);
                emit(
                    reporter,
                    Diagnostic::warning(
                        DiagnosticKind::UnreachableNonterminal,
                        format!("nonterminal `{}' is not reachable from any input", sym.name),
                    )
                    .at(sym.origin.as_ref()),
                );
            }
        }

        let error = g.error().map(|s| s.index);
        for t in 1..terminals {
            if !used[t] && Some(t) != error {
                let sym = g.symbol(t);
                emit(
                    reporter,
                    Diagnostic::warning(
                        DiagnosticKind::UnusedTerminal,
                        format!("terminal `{}' is not used in any rule", sym.name),
                    )
                    .at(sym.origin.as_ref()),
                );
            }
        }
    }

    fn rule_text(&self, prods: &Prods, rule: usize) -> String {
        match self.grammar.rules() {
            Some(rules) if rule < rules.len() => self.grammar.rule_text(&rules[rule]),
            _ => format!(
                "${} ::= {}",
                rule - prods.rules,
                self.grammar.symbol(prods.right[rule][0]).name
            ),
        }
    }

    /// One diagnostic per state, kind and rule set, listing every lookahead.
    fn report_conflicts(&self, reporter: &mut dyn Reporter, prods: &Prods, conflicts: &[Conflict]) {
        let g = self.grammar;
        let rules = g.rules().unwrap_or(&[]);
        let mut groups: BTreeMap<(usize, ConflictKind, &[usize]), Vec<usize>> = BTreeMap::new();
        for c in conflicts {
            groups
                .entry((c.state, c.kind, c.rules.as_slice()))
                .or_default()
                .push(c.lookahead);
        }

        for ((state, kind, rs), lookaheads) in groups {
            let las = lookaheads
                .iter()
                .map(|&t| format!("`{}'", g.symbol(t).name))
                .collect::<Vec<_>>()
                .join(", ");
            let texts: Vec<String> = rs.iter().map(|&r| self.rule_text(prods, r)).collect();
            let diagnostic = match kind {
                ConflictKind::ShiftReduce(ShiftReduce::NonAssoc) => Diagnostic::error(
                    DiagnosticKind::GrammarConflict,
                    format!(
                        "{} is non-associative in state {}, reducing `{}'",
                        las, state, texts[0]
                    ),
                ),
                ConflictKind::ShiftReduce(_) => Diagnostic::warning(
                    DiagnosticKind::GrammarConflict,
                    format!(
                        "shift/reduce conflict on {} in state {}, shifting instead of reducing `{}'",
                        las, state, texts[0]
                    ),
                ),
                ConflictKind::ReduceReduce => Diagnostic::warning(
                    DiagnosticKind::GrammarConflict,
                    format!(
                        "reduce/reduce conflict on {} in state {}, `{}' wins over `{}'",
                        las,
                        state,
                        texts[0],
                        texts[1..].join("', `")
                    ),
                ),
            };
            emit(
                reporter,
                diagnostic.at_all(rs.iter().filter_map(|&r| rules.get(r)?.origin.as_ref())),
            );
        }
    }
}
