//! Sets of code points as sorted inclusive ranges.

use once_cell::sync::Lazy;
use std::fmt;

/// Largest Unicode scalar value.
pub const MAX_CODEPOINT: u32 = 0x10FFFF;
/// Pseudo code point standing for end of input. Never part of a complement.
pub const EOI: u32 = MAX_CODEPOINT + 1;

/// A set of code points.
///
/// Ranges are inclusive, sorted, non-overlapping and non-adjacent, so equal
/// sets have equal representations.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
}

pub(crate) static WORD: Lazy<CharSet> =
    Lazy::new(|| CharSet::from_ranges([(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)]));
pub(crate) static SPACE: Lazy<CharSet> =
    Lazy::new(|| CharSet::from_ranges([(0x09, 0x0D), (0x20, 0x20)]));
pub(crate) static DIGIT: Lazy<CharSet> = Lazy::new(|| CharSet::range(0x30, 0x39));
/// What `.` matches without the `s` flag.
pub(crate) static ANY_BUT_NEWLINE: Lazy<CharSet> =
    Lazy::new(|| CharSet::from_ranges([(0, 0x09), (0x0B, MAX_CODEPOINT)]));
pub(crate) static ANY: Lazy<CharSet> = Lazy::new(|| CharSet::range(0, MAX_CODEPOINT));

impl CharSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(c: u32) -> Self {
        Self {
            ranges: vec![(c, c)],
        }
    }

    pub fn range(lo: u32, hi: u32) -> Self {
        if lo > hi {
            return Self::new();
        }
        Self {
            ranges: vec![(lo, hi)],
        }
    }

    /// Builds a set from arbitrary, possibly overlapping ranges.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut v: Vec<(u32, u32)> = ranges.into_iter().filter(|(lo, hi)| lo <= hi).collect();
        v.sort_unstable();
        let mut out: Vec<(u32, u32)> = Vec::with_capacity(v.len());
        for (lo, hi) in v {
            match out.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => out.push((lo, hi)),
            }
        }
        Self { ranges: out }
    }

    #[inline]
    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, c: u32) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < c {
                    std::cmp::Ordering::Less
                } else if lo > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Number of code points in the set.
    pub fn len(&self) -> u64 {
        self.ranges.iter().map(|&(lo, hi)| u64::from(hi - lo) + 1).sum()
    }

    /// The only member, if there is exactly one.
    pub fn single_char(&self) -> Option<u32> {
        match self.ranges.as_slice() {
            [(lo, hi)] if lo == hi => Some(*lo),
            _ => None,
        }
    }

    pub fn union(&self, other: &CharSet) -> CharSet {
        CharSet::from_ranges(self.ranges.iter().chain(&other.ranges).copied())
    }

    pub fn intersect(&self, other: &CharSet) -> CharSet {
        let (mut i, mut j) = (0, 0);
        let mut out = Vec::new();
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a_lo, a_hi) = self.ranges[i];
            let (b_lo, b_hi) = other.ranges[j];
            let lo = a_lo.max(b_lo);
            let hi = a_hi.min(b_hi);
            if lo <= hi {
                out.push((lo, hi));
            }
            if a_hi < b_hi {
                i += 1;
            } else {
                j += 1;
            }
        }
        CharSet { ranges: out }
    }

    /// Code points of the Unicode range not in `self`. EOI is never included.
    pub fn complement(&self) -> CharSet {
        let mut out = Vec::new();
        let mut next = 0u32;
        for &(lo, hi) in &self.ranges {
            if lo > MAX_CODEPOINT {
                break;
            }
            if lo > next {
                out.push((next, lo - 1));
            }
            next = hi.saturating_add(1);
        }
        if next <= MAX_CODEPOINT {
            out.push((next, MAX_CODEPOINT));
        }
        CharSet { ranges: out }
    }

    pub fn subtract(&self, other: &CharSet) -> CharSet {
        let mut rest = other.complement();
        if self.contains(EOI) && !other.contains(EOI) {
            rest = rest.union(&CharSet::single(EOI));
        }
        self.intersect(&rest)
    }

    /// Adds the simple upper and lower case variants of every member.
    pub fn case_fold(&self) -> CharSet {
        let mut extra = Vec::new();
        for &(lo, hi) in &self.ranges {
            for c in lo..=hi.min(MAX_CODEPOINT) {
                let Some(ch) = char::from_u32(c) else {
                    continue;
                };
                if !ch.is_alphabetic() {
                    continue;
                }
                for variant in [single(ch.to_lowercase()), single(ch.to_uppercase())]
                    .into_iter()
                    .flatten()
                {
                    if variant != c {
                        extra.push((variant, variant));
                    }
                }
            }
        }
        if extra.is_empty() {
            return self.clone();
        }
        CharSet::from_ranges(self.ranges.iter().copied().chain(extra))
    }
}

/// The mapping result if it is a single character.
fn single(mut it: impl Iterator<Item = char>) -> Option<u32> {
    let first = it.next()?;
    match it.next() {
        None => Some(first as u32),
        Some(_) => None,
    }
}

impl fmt::Debug for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for &(lo, hi) in &self.ranges {
            write_char(f, lo)?;
            if hi != lo {
                f.write_str("-")?;
                write_char(f, hi)?;
            }
        }
        f.write_str("]")
    }
}

fn write_char(f: &mut fmt::Formatter<'_>, c: u32) -> fmt::Result {
    match char::from_u32(c) {
        Some(ch) if ch.is_ascii_graphic() => write!(f, "{}", ch),
        _ if c == EOI => f.write_str("{eoi}"),
        _ => write!(f, "\\u{{{:x}}}", c),
    }
}
