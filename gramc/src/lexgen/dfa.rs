//! Subset construction over a class-labelled NFA.

use std::collections::{BTreeMap, HashMap};

/// NFA with edges expressed as character classes.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClassNfa {
    pub eps: Vec<Vec<usize>>,
    /// `(class, target)` for each state.
    pub moves: Vec<Vec<(usize, usize)>>,
    /// Rule accepted in each state.
    pub accept: Vec<Option<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DfaState {
    pub nfa: Vec<usize>,
    pub next: Vec<Option<usize>>,
    /// Accepted rules, best first.
    pub accepts: Vec<usize>,
    /// Lexer state this is the start state of.
    pub start_of: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Dfa {
    pub states: Vec<DfaState>,
    /// Start state of each lexer state.
    pub starts: Vec<usize>,
}

impl ClassNfa {
    fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut seen = vec![false; self.eps.len()];
        let mut stack: Vec<usize> = seeds.into_iter().collect();
        let mut out = Vec::new();
        while let Some(s) = stack.pop() {
            if seen[s] {
                continue;
            }
            seen[s] = true;
            out.push(s);
            stack.extend(self.eps[s].iter().copied().filter(|&t| !seen[t]));
        }
        out.sort_unstable();
        out
    }
}

/// Builds the DFA for all lexer states at once.
///
/// `starts[i]` is the NFA start state of lexer state `i`. `rank` orders
/// accepted rules: the rule with the smallest key wins.
pub(crate) fn build<K: Ord>(
    nfa: &ClassNfa,
    starts: &[usize],
    classes: usize,
    rank: impl Fn(usize) -> K,
) -> Dfa {
    let mut dfa = Dfa::default();
    let mut index: HashMap<Vec<usize>, usize> = HashMap::new();

    let mut intern = |set: Vec<usize>, dfa: &mut Dfa, start_of: Option<usize>| -> usize {
        if let Some(&s) = index.get(&set) {
            return s;
        }
        let mut accepts: Vec<usize> = set.iter().filter_map(|&s| nfa.accept[s]).collect();
        accepts.sort_by_key(|&r| (rank(r), r));
        accepts.dedup();
        dfa.states.push(DfaState {
            nfa: set.clone(),
            next: vec![None; classes],
            accepts,
            start_of,
        });
        index.insert(set, dfa.states.len() - 1);
        dfa.states.len() - 1
    };

    for (ls, &start) in starts.iter().enumerate() {
        let set = nfa.closure([start]);
        let s = intern(set, &mut dfa, Some(ls));
        dfa.starts.push(s);
    }

    let mut i = 0;
    while i < dfa.states.len() {
        let mut targets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &s in &dfa.states[i].nfa {
            for &(class, t) in &nfa.moves[s] {
                targets.entry(class).or_default().push(t);
            }
        }
        for (class, seeds) in targets {
            let set = nfa.closure(seeds);
            let t = intern(set, &mut dfa, None);
            dfa.states[i].next[class] = Some(t);
        }
        i += 1;
    }

    log::debug!(
        "dfa: {} states for {} lexer states, {} classes",
        dfa.states.len(),
        starts.len(),
        classes
    );
    dfa
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_construction_merges_common_prefixes() {
        // rule 0: class 1 then class 2; rule 1: class 1 then class 3
        let nfa = ClassNfa {
            eps: vec![vec![1, 4], vec![], vec![], vec![], vec![], vec![], vec![]],
            moves: vec![
                vec![],
                vec![(1, 2)],
                vec![(2, 3)],
                vec![],
                vec![(1, 5)],
                vec![(3, 6)],
                vec![],
            ],
            accept: vec![None, None, None, Some(0), None, None, Some(1)],
        };
        let dfa = build(&nfa, &[0], 4, |r| r);
        assert_eq!(dfa.starts, vec![0]);
        assert_eq!(dfa.states.len(), 4);
        let after = dfa.states[0].next[1].unwrap();
        assert_eq!(dfa.states[after].nfa, vec![2, 5]);
        let a = dfa.states[after].next[2].unwrap();
        let b = dfa.states[after].next[3].unwrap();
        assert_eq!(dfa.states[a].accepts, vec![0]);
        assert_eq!(dfa.states[b].accepts, vec![1]);
        assert_eq!(dfa.states[0].start_of, Some(0));
    }

    #[test]
    fn accepts_are_ranked() {
        let nfa = ClassNfa {
            eps: vec![vec![1, 3], vec![], vec![], vec![], vec![]],
            moves: vec![vec![], vec![(1, 2)], vec![], vec![(1, 4)], vec![]],
            accept: vec![None, None, Some(0), None, Some(1)],
        };
        // rule 1 has the better key
        let dfa = build(&nfa, &[0], 2, |r| if r == 1 { 0 } else { 1 });
        let s = dfa.states[0].next[1].unwrap();
        assert_eq!(dfa.states[s].accepts, vec![1, 0]);
    }
}
