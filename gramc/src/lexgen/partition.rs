//! Partition of the code point alphabet into character classes.
//!
//! Every boundary of every input set splits the range `0..=EOI` into
//! elementary intervals. Intervals that belong to exactly the same input sets
//! are indistinguishable for the automaton and share a class. The interval
//! holding the EOI pseudo code point always gets class 0.

use crate::regex::charset::{CharSet, EOI};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Partition {
    /// First code point of each elementary interval, ascending.
    starts: Vec<u32>,
    /// Class of each elementary interval.
    interval_class: Vec<usize>,
    classes: usize,
}

impl Partition {
    pub fn new(sets: &[&CharSet]) -> Partition {
        let mut bounds = BTreeSet::from([0, EOI, EOI + 1]);
        for set in sets {
            for &(lo, hi) in set.ranges() {
                bounds.insert(lo);
                bounds.insert(hi + 1);
            }
        }
        let starts: Vec<u32> = bounds.into_iter().filter(|&b| b <= EOI).collect();

        let mut signature: Vec<Vec<usize>> = vec![Vec::new(); starts.len()];
        for (id, set) in sets.iter().enumerate() {
            for &(lo, hi) in set.ranges() {
                let mut k = interval_at(&starts, lo);
                while k < starts.len() && starts[k] <= hi {
                    signature[k].push(id);
                    k += 1;
                }
            }
        }

        let mut by_signature: HashMap<&[usize], usize> = HashMap::new();
        let mut interval_class = Vec::with_capacity(starts.len());
        let mut classes = 1;
        for (k, sig) in signature.iter().enumerate() {
            if starts[k] == EOI {
                interval_class.push(0);
                continue;
            }
            let class = *by_signature.entry(sig.as_slice()).or_insert_with(|| {
                classes += 1;
                classes - 1
            });
            interval_class.push(class);
        }

        log::trace!(
            "alphabet: {} intervals, {} classes from {} sets",
            starts.len(),
            classes,
            sets.len()
        );
        Partition {
            starts,
            interval_class,
            classes,
        }
    }

    /// Number of classes, including the EOI class.
    #[inline]
    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn class_of(&self, c: u32) -> usize {
        self.interval_class[interval_at(&self.starts, c)]
    }

    /// Sorted classes covered by `set`.
    pub fn classes_of(&self, set: &CharSet) -> Vec<usize> {
        let mut out = BTreeSet::new();
        for &(lo, hi) in set.ranges() {
            let mut k = interval_at(&self.starts, lo);
            while k < self.starts.len() && self.starts[k] <= hi {
                out.insert(self.interval_class[k]);
                k += 1;
            }
        }
        out.into_iter().collect()
    }

    /// `(first, last, class)` for every elementary interval, EOI included.
    pub fn intervals(&self) -> impl Iterator<Item = (u32, u32, usize)> + '_ {
        self.starts.iter().enumerate().map(move |(k, &lo)| {
            let hi = self.starts.get(k + 1).map_or(EOI, |next| next - 1);
            (lo, hi, self.interval_class[k])
        })
    }
}

fn interval_at(starts: &[u32], c: u32) -> usize {
    starts.partition_point(|&s| s <= c).saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::charset::MAX_CODEPOINT;

    #[test]
    fn splits_on_boundaries() {
        let az = CharSet::range('a' as u32, 'z' as u32);
        let x = CharSet::single('x' as u32);
        let p = Partition::new(&[&az, &x]);
        // [0,a) (a..x) x (y..z] (z..MAX] EOI; both outer gaps share a class
        assert_eq!(p.classes(), 4);
        assert_eq!(p.class_of(EOI), 0);
        assert_eq!(p.class_of('a' as u32), p.class_of('w' as u32));
        assert_eq!(p.class_of('a' as u32), p.class_of('z' as u32));
        assert_ne!(p.class_of('x' as u32), p.class_of('y' as u32));
        assert_eq!(p.class_of('0' as u32), p.class_of(MAX_CODEPOINT));
        assert_eq!(p.classes_of(&az).len(), 2);
        assert_eq!(p.classes_of(&x), vec![p.class_of('x' as u32)]);
    }

    #[test]
    fn eoi_set_maps_to_class_zero() {
        let eoi = CharSet::single(EOI);
        let p = Partition::new(&[&eoi]);
        assert_eq!(p.classes_of(&eoi), vec![0]);
        assert_eq!(p.classes(), 2);
        let last = p.intervals().last().unwrap();
        assert_eq!(last, (EOI, EOI, 0));
    }
}
