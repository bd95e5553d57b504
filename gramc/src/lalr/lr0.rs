//! LR(0) items and the canonical item automaton.

use super::sets::Prods;
use std::collections::{BTreeMap, HashMap};

/// A rule with a dot marking how much of its right-hand side was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Item {
    pub rule: usize,
    pub dot: usize,
}

impl Item {
    /// Symbol after the dot, if any.
    #[inline]
    pub fn next(self, prods: &Prods) -> Option<usize> {
        prods.right[self.rule].get(self.dot).copied()
    }

    #[inline]
    pub fn advance(self) -> Item {
        Item {
            rule: self.rule,
            dot: self.dot + 1,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Lr0State {
    /// Sorted kernel items; they identify the state.
    pub kernel: Vec<Item>,
    /// Kernel followed by the closure items.
    pub items: Vec<Item>,
    /// Transitions on terminals and nonterminals, ascending by symbol.
    pub goto: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Lr0 {
    pub states: Vec<Lr0State>,
    /// Start state of each input.
    pub starts: Vec<usize>,
    /// State holding the completed augmented item of each input.
    pub finals: Vec<usize>,
}

/// Adds `B ::= . gamma` for every nonterminal `B` right after a dot.
pub(crate) fn closure(kernel: &[Item], prods: &Prods) -> Vec<Item> {
    let mut items = kernel.to_vec();
    let mut added = vec![false; prods.by_left.len()];
    let mut i = 0;
    while i < items.len() {
        if let Some(x) = items[i].next(prods) {
            if prods.is_nonterminal(x) && !added[x] {
                added[x] = true;
                items.extend(prods.by_left[x].iter().map(|&rule| Item { rule, dot: 0 }));
            }
        }
        i += 1;
    }
    items
}

/// Builds the automaton for all inputs at once; states reachable from
/// several start states are shared.
pub(crate) fn build(prods: &Prods) -> Lr0 {
    let mut lr0 = Lr0::default();
    let mut index: HashMap<Vec<Item>, usize> = HashMap::new();

    let mut intern = |kernel: Vec<Item>, lr0: &mut Lr0| -> usize {
        if let Some(&s) = index.get(&kernel) {
            return s;
        }
        let items = closure(&kernel, prods);
        lr0.states.push(Lr0State {
            kernel: kernel.clone(),
            items,
            goto: BTreeMap::new(),
        });
        index.insert(kernel, lr0.states.len() - 1);
        lr0.states.len() - 1
    };

    for rule in prods.rules..prods.len() {
        let s = intern(vec![Item { rule, dot: 0 }], &mut lr0);
        lr0.starts.push(s);
    }

    let mut i = 0;
    while i < lr0.states.len() {
        let mut moved: BTreeMap<usize, Vec<Item>> = BTreeMap::new();
        for &item in &lr0.states[i].items {
            if let Some(x) = item.next(prods) {
                moved.entry(x).or_default().push(item.advance());
            }
        }
        for (x, mut kernel) in moved {
            kernel.sort_unstable();
            kernel.dedup();
            let t = intern(kernel, &mut lr0);
            lr0.states[i].goto.insert(x, t);
        }
        i += 1;
    }

    lr0.finals = vec![0; lr0.starts.len()];
    for (s, state) in lr0.states.iter().enumerate() {
        for item in &state.kernel {
            if prods.is_augmented(item.rule) && item.dot == 1 {
                lr0.finals[item.rule - prods.rules] = s;
            }
        }
    }

    log::debug!(
        "lr0: {} states for {} inputs, {} rules",
        lr0.states.len(),
        lr0.starts.len(),
        prods.rules
    );
    lr0
}
