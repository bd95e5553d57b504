//! Conflict resolution policies.
//!
//! Both policies are plain functions so that the tie-break order is explicit
//! and testable on its own:
//!
//! - [`resolve_shift_reduce`] compares the precedence of the reduced rule
//!   with that of the lookahead terminal;
//! - [`resolve_reduce_reduce`] picks the rule declared first.

use crate::grammar::{Assoc, Grammar, Rule};

/// Precedence of a terminal, or of a rule through one of its terminals.
///
/// Levels start at 1; later priority declarations bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence {
    pub level: usize,
    pub assoc: Assoc,
}

/// Outcome of a shift/reduce conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShiftReduce {
    /// The lookahead binds tighter, or is right-associative.
    Shift,
    /// The rule binds tighter, or the lookahead is left-associative.
    Reduce,
    /// Equal non-associative precedence. The table reduces and the conflict
    /// is reported as an error.
    NonAssoc,
    /// Precedence is missing on at least one side. The table shifts and the
    /// conflict is reported as a warning.
    ShiftByDefault,
}

pub fn resolve_shift_reduce(rule: Option<Precedence>, lookahead: Option<Precedence>) -> ShiftReduce {
    match (rule, lookahead) {
        (Some(r), Some(l)) if r.level > l.level => ShiftReduce::Reduce,
        (Some(r), Some(l)) if r.level < l.level => ShiftReduce::Shift,
        (Some(_), Some(l)) => match l.assoc {
            Assoc::Left => ShiftReduce::Reduce,
            Assoc::Right => ShiftReduce::Shift,
            Assoc::NonAssoc => ShiftReduce::NonAssoc,
        },
        _ => ShiftReduce::ShiftByDefault,
    }
}

/// Picks the winner among rules reducible on the same lookahead.
pub fn resolve_reduce_reduce(rules: &[usize]) -> Option<usize> {
    rules.iter().copied().min()
}

/// Precedence of every terminal, taken from the grammar's priority
/// declarations. A terminal listed twice takes its last level.
#[derive(Debug, Clone)]
pub(crate) struct PrecedenceTable {
    terminals: Vec<Option<Precedence>>,
}

impl PrecedenceTable {
    pub fn new(grammar: &Grammar) -> Self {
        let mut terminals = vec![None; grammar.terminals()];
        for (i, prio) in grammar.priorities().unwrap_or(&[]).iter().enumerate() {
            for &t in &prio.symbols {
                if let Some(slot) = terminals.get_mut(t) {
                    *slot = Some(Precedence {
                        level: i + 1,
                        assoc: prio.assoc,
                    });
                }
            }
        }
        Self { terminals }
    }

    pub fn terminal(&self, t: usize) -> Option<Precedence> {
        self.terminals.get(t).copied().flatten()
    }

    /// The explicit precedence terminal of `rule`, else its rightmost
    /// terminal.
    pub fn rule(&self, rule: &Rule) -> Option<Precedence> {
        let t = rule.precedence.or_else(|| {
            rule.right
                .iter()
                .rev()
                .map(|s| s.target)
                .find(|&s| s < self.terminals.len())
        })?;
        self.terminal(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    fn p(level: usize, assoc: Assoc) -> Option<Precedence> {
        Some(Precedence { level, assoc })
    }

    #[test]
    fn shift_reduce_policy() {
        use ShiftReduce::*;
        assert_eq!(resolve_shift_reduce(p(2, Assoc::Left), p(1, Assoc::Right)), Reduce);
        assert_eq!(resolve_shift_reduce(p(1, Assoc::Left), p(2, Assoc::Left)), Shift);
        assert_eq!(resolve_shift_reduce(p(1, Assoc::Left), p(1, Assoc::Left)), Reduce);
        assert_eq!(resolve_shift_reduce(p(1, Assoc::Right), p(1, Assoc::Right)), Shift);
        assert_eq!(
            resolve_shift_reduce(p(1, Assoc::NonAssoc), p(1, Assoc::NonAssoc)),
            NonAssoc
        );
        assert_eq!(resolve_shift_reduce(None, p(1, Assoc::Left)), ShiftByDefault);
        assert_eq!(resolve_shift_reduce(p(1, Assoc::Left), None), ShiftByDefault);
        assert_eq!(resolve_shift_reduce(None, None), ShiftByDefault);
    }

    #[test]
    fn reduce_reduce_policy() {
        assert_eq!(resolve_reduce_reduce(&[7, 3, 5]), Some(3));
        assert_eq!(resolve_reduce_reduce(&[4]), Some(4));
        assert_eq!(resolve_reduce_reduce(&[]), None);
    }

    #[test]
    fn rule_precedence() {
        let mut b = GrammarBuilder::new();
        let plus = b.add_terminal("+", None, None).unwrap();
        let minus = b.add_terminal("-", None, None).unwrap();
        let star = b.add_terminal("*", None, None).unwrap();
        let num = b.add_terminal("NUM", None, None).unwrap();
        let e = b.add_nonterminal("E", None, None).unwrap();
        b.add_rule(e, &[e, plus, e]).unwrap();
        b.add_rule(e, &[e, star, e, num]).unwrap();
        b.rule(None, e, None)
            .unwrap()
            .symbol(minus, None, None)
            .unwrap()
            .symbol(e, None, None)
            .unwrap()
            .precedence(star)
            .unwrap()
            .commit();
        b.add_rule(e, &[num]).unwrap();
        b.add_prio(Assoc::Left, &[plus, minus], None).unwrap();
        b.add_prio(Assoc::Left, &[star], None).unwrap();
        let g = b.create();
        let table = PrecedenceTable::new(&g);
        let rules = g.rules().unwrap();
        assert_eq!(table.rule(&rules[0]), p(1, Assoc::Left));
        // rightmost terminal is NUM, which has no precedence
        assert_eq!(table.rule(&rules[1]), None);
        assert_eq!(table.rule(&rules[2]), p(2, Assoc::Left));
        assert_eq!(table.terminal(g.index_of(minus).unwrap()), p(1, Assoc::Left));
    }
}
