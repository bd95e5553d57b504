//! LALR(1) lookaheads by spontaneous generation and propagation.
//!
//! Each kernel item is closed under LR(1) rules with a placeholder
//! lookahead. Real lookaheads found in the closure are generated
//! spontaneously for the item they advance to; the placeholder means the
//! kernel item's own lookaheads propagate there. Propagation then runs to a
//! fixpoint over the shared LR(0) automaton.

use super::lr0::{Item, Lr0};
use super::sets::{FirstSets, Prods};
use crate::grammar::InputRef;
use std::collections::{BTreeMap, BTreeSet};

/// Lookahead standing for "whatever follows the kernel item".
const PROPAGATE: usize = usize::MAX;

/// Completed rules of one state with their lookahead terminals.
pub(crate) type Reductions = Vec<(usize, BTreeSet<usize>)>;

#[derive(Default)]
struct Completion {
    spontaneous: BTreeSet<usize>,
    /// Kernel items whose lookaheads flow into the reduction.
    from: BTreeSet<usize>,
}

fn closure1(item: Item, prods: &Prods, sets: &FirstSets) -> BTreeSet<(Item, usize)> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![(item, PROPAGATE)];
    while let Some((it, la)) = stack.pop() {
        if !seen.insert((it, la)) {
            continue;
        }
        let Some(b) = it.next(prods) else {
            continue;
        };
        if !prods.is_nonterminal(b) {
            continue;
        }
        let (mut follow, nullable) = sets.of_seq(&prods.right[it.rule][it.dot + 1..]);
        if nullable {
            follow.insert(la);
        }
        for &rule in &prods.by_left[b] {
            for &l in &follow {
                stack.push((Item { rule, dot: 0 }, l));
            }
        }
    }
    seen
}

/// Lookaheads of every kernel item, then of every reduction, per state.
pub(crate) fn compute(
    lr0: &Lr0,
    prods: &Prods,
    sets: &FirstSets,
    inputs: &[InputRef],
) -> Vec<Reductions> {
    let mut la: Vec<Vec<BTreeSet<usize>>> = lr0
        .states
        .iter()
        .map(|s| vec![BTreeSet::new(); s.kernel.len()])
        .collect();
    let mut links: Vec<Vec<Vec<(usize, usize)>>> = lr0
        .states
        .iter()
        .map(|s| vec![Vec::new(); s.kernel.len()])
        .collect();
    let mut completions: Vec<BTreeMap<usize, Completion>> =
        (0..lr0.states.len()).map(|_| BTreeMap::new()).collect();

    for (i, input) in inputs.iter().enumerate() {
        let start = lr0.starts[i];
        la[start][0] = if input.has_eoi {
            BTreeSet::from([0])
        } else {
            (0..prods.terminals).collect()
        };
    }

    for (s, state) in lr0.states.iter().enumerate() {
        for (k, &kernel) in state.kernel.iter().enumerate() {
            for (item, a) in closure1(kernel, prods, sets) {
                match item.next(prods) {
                    Some(x) => {
                        let t = state.goto[&x];
                        let Ok(j) = lr0.states[t].kernel.binary_search(&item.advance()) else {
                            continue;
                        };
                        if a == PROPAGATE {
                            links[s][k].push((t, j));
                        } else {
                            la[t][j].insert(a);
                        }
                    }
                    None => {
                        let c = completions[s].entry(item.rule).or_default();
                        if a == PROPAGATE {
                            c.from.insert(k);
                        } else {
                            c.spontaneous.insert(a);
                        }
                    }
                }
            }
        }
    }

    let mut rounds = 0;
    let mut changed = true;
    while changed {
        changed = false;
        rounds += 1;
        for s in 0..links.len() {
            for k in 0..links[s].len() {
                for &(t, j) in &links[s][k] {
                    if (t, j) == (s, k) {
                        continue;
                    }
                    let src = la[s][k].clone();
                    for x in src {
                        changed |= la[t][j].insert(x);
                    }
                }
            }
        }
    }
    log::trace!("lookaheads propagated in {} rounds", rounds);

    completions
        .into_iter()
        .enumerate()
        .map(|(s, reductions)| {
            reductions
                .into_iter()
                .map(|(rule, c)| {
                    let mut set = c.spontaneous;
                    for k in c.from {
                        set.extend(la[s][k].iter().copied());
                    }
                    (rule, set)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, GrammarBuilder};
    use crate::lalr::lr0;

    fn reductions(g: &Grammar) -> (Prods, Vec<Reductions>) {
        let prods = Prods::new(g);
        let sets = FirstSets::compute(&prods);
        let lr0 = lr0::build(&prods);
        let red = compute(&lr0, &prods, &sets, g.inputs().unwrap());
        (prods, red)
    }

    #[test]
    fn lalr_resolves_what_slr_cannot() {
        // S ::= L = R | R ; L ::= * R | id ; R ::= L
        let mut b = GrammarBuilder::new();
        let eq = b.add_terminal("=", None, None).unwrap();
        let star = b.add_terminal("*", None, None).unwrap();
        let id = b.add_terminal("id", None, None).unwrap();
        let s = b.add_nonterminal("S", None, None).unwrap();
        let l = b.add_nonterminal("L", None, None).unwrap();
        let r = b.add_nonterminal("R", None, None).unwrap();
        b.add_rule(s, &[l, eq, r]).unwrap();
        b.add_rule(s, &[r]).unwrap();
        b.add_rule(l, &[star, r]).unwrap();
        b.add_rule(l, &[id]).unwrap();
        b.add_rule(r, &[l]).unwrap();
        b.add_input(s, true, None).unwrap();
        let g = b.create();
        let eq = g.index_of(eq).unwrap();
        let (_, red) = reductions(&g);

        // next to the shift on `=`, `R ::= L` reduces on eoi only
        let r_after_l: Vec<_> = red
            .iter()
            .flatten()
            .filter(|(rule, _)| *rule == 4)
            .map(|(_, la)| la.clone())
            .collect();
        assert!(r_after_l.contains(&BTreeSet::from([0])));
        assert!(r_after_l.contains(&BTreeSet::from([0, eq])));
    }

    #[test]
    fn empty_rules_get_lookaheads() {
        // list ::= %empty | list x
        let mut b = GrammarBuilder::new();
        let x = b.add_terminal("x", None, None).unwrap();
        let list = b.add_nonterminal("list", None, None).unwrap();
        b.add_rule(list, &[]).unwrap();
        b.add_rule(list, &[list, x]).unwrap();
        b.add_input(list, true, None).unwrap();
        let g = b.create();
        let x = g.index_of(x).unwrap();
        let (_, red) = reductions(&g);
        assert_eq!(red[0], vec![(0, BTreeSet::from([0, x]))]);
    }

    #[test]
    fn input_without_eoi_accepts_on_any_terminal() {
        let mut b = GrammarBuilder::new();
        let x = b.add_terminal("x", None, None).unwrap();
        let y = b.add_terminal("y", None, None).unwrap();
        let a = b.add_nonterminal("a", None, None).unwrap();
        b.add_rule(a, &[x]).unwrap();
        b.add_input(a, false, None).unwrap();
        let g = b.create();
        let (prods, red) = reductions(&g);
        let all: BTreeSet<usize> = [0, g.index_of(x).unwrap(), g.index_of(y).unwrap()].into();
        let accept: Vec<_> = red
            .iter()
            .flatten()
            .filter(|(rule, _)| prods.is_augmented(*rule))
            .collect();
        assert_eq!(accept, vec![&(1, all.clone())]);
        let reduce: Vec<_> = red.iter().flatten().filter(|(rule, _)| *rule == 0).collect();
        assert_eq!(reduce, vec![&(0, all)]);
    }
}
