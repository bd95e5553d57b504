//! Integer view of the rule set, nullability and FIRST sets.

use crate::grammar::Grammar;
use std::collections::BTreeSet;

/// Rules as symbol index vectors, augmented with one start rule per input.
///
/// Augmented rule `rules + i` is `$input_i ::= target_i`, where the pseudo
/// nonterminal `$input_i` has index `symbols + i`.
#[derive(Debug, Clone)]
pub(crate) struct Prods {
    pub left: Vec<usize>,
    pub right: Vec<Vec<usize>>,
    /// Rules of each nonterminal, pseudo nonterminals included.
    pub by_left: Vec<Vec<usize>>,
    pub terminals: usize,
    pub symbols: usize,
    /// Number of grammar rules; augmented rules follow.
    pub rules: usize,
}

impl Prods {
    pub fn new(grammar: &Grammar) -> Prods {
        let symbols = grammar.grammar_symbols();
        let rules = grammar.rules().unwrap_or(&[]);
        let inputs = grammar.inputs().unwrap_or(&[]);
        let mut left = Vec::with_capacity(rules.len() + inputs.len());
        let mut right = Vec::with_capacity(rules.len() + inputs.len());
        for rule in rules {
            left.push(rule.left);
            right.push(rule.right.iter().map(|s| s.target).collect());
        }
        for (i, input) in inputs.iter().enumerate() {
            left.push(symbols + i);
            right.push(vec![input.target]);
        }
        let mut by_left = vec![Vec::new(); symbols + inputs.len()];
        for (r, &l) in left.iter().enumerate() {
            by_left[l].push(r);
        }
        Prods {
            left,
            right,
            by_left,
            terminals: grammar.terminals(),
            symbols,
            rules: rules.len(),
        }
    }

    #[inline]
    pub fn is_nonterminal(&self, symbol: usize) -> bool {
        symbol >= self.terminals
    }

    #[inline]
    pub fn is_augmented(&self, rule: usize) -> bool {
        rule >= self.rules
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.left.len()
    }
}

/// Nullability and FIRST set of every grammar symbol.
#[derive(Debug, Clone)]
pub(crate) struct FirstSets {
    pub first: Vec<BTreeSet<usize>>,
    pub nullable: Vec<bool>,
}

impl FirstSets {
    pub fn compute(prods: &Prods) -> FirstSets {
        let n = prods.by_left.len();
        let mut first: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        let mut nullable = vec![false; n];
        for (t, set) in first.iter_mut().enumerate().take(prods.terminals) {
            set.insert(t);
        }
        let mut changed = true;
        while changed {
            changed = false;
            for (lhs, rhs) in prods.left.iter().zip(&prods.right) {
                let mut all_nullable = true;
                for &sym in rhs {
                    if sym != *lhs {
                        let first_sym = first[sym].clone();
                        for f in first_sym {
                            changed |= first[*lhs].insert(f);
                        }
                    }
                    if !nullable[sym] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[*lhs] {
                    nullable[*lhs] = true;
                    changed = true;
                }
            }
        }
        FirstSets { first, nullable }
    }

    /// FIRST of a symbol sequence and whether the sequence is nullable.
    pub fn of_seq(&self, seq: &[usize]) -> (BTreeSet<usize>, bool) {
        let mut out = BTreeSet::new();
        for &sym in seq {
            out.extend(self.first[sym].iter().copied());
            if !self.nullable[sym] {
                return (out, false);
            }
        }
        (out, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    #[test]
    fn nullable_and_first() {
        // list ::= %empty | list item ; item ::= a | b opt ; opt ::= %empty | c
        let mut b = GrammarBuilder::new();
        let a = b.add_terminal("a", None, None).unwrap();
        let bt = b.add_terminal("b", None, None).unwrap();
        let c = b.add_terminal("c", None, None).unwrap();
        let list = b.add_nonterminal("list", None, None).unwrap();
        let item = b.add_nonterminal("item", None, None).unwrap();
        let opt = b.add_nonterminal("opt", None, None).unwrap();
        b.add_rule(list, &[]).unwrap();
        b.add_rule(list, &[list, item]).unwrap();
        b.add_rule(item, &[a]).unwrap();
        b.add_rule(item, &[bt, opt]).unwrap();
        b.add_rule(opt, &[]).unwrap();
        b.add_rule(opt, &[c]).unwrap();
        b.add_input(list, true, None).unwrap();
        let g = b.create();

        let prods = Prods::new(&g);
        assert_eq!(prods.len(), 7);
        assert!(prods.is_augmented(6));
        assert_eq!(prods.left[6], g.grammar_symbols());

        let sets = FirstSets::compute(&prods);
        let [a, bt, c, list, item, opt] =
            [a, bt, c, list, item, opt].map(|s| g.index_of(s).unwrap());
        assert!(sets.nullable[list] && sets.nullable[opt] && !sets.nullable[item]);
        assert_eq!(sets.first[list], BTreeSet::from([a, bt]));
        assert_eq!(sets.first[opt], BTreeSet::from([c]));
        assert_eq!(sets.first[g.grammar_symbols()], BTreeSet::from([a, bt]));
        assert_eq!(sets.of_seq(&[opt, item]), (BTreeSet::from([a, bt, c]), false));
        assert_eq!(sets.of_seq(&[opt]), (BTreeSet::from([c]), true));
    }
}
