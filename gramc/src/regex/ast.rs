use super::charset::CharSet;
use smartstring::alias::String;

/// Byte range of a node inside the regex text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn cover(self, other: TextRange) -> TextRange {
        TextRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Flags changed by an inline-flag group `(?is-s:...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagChange {
    pub case_insensitive: Option<bool>,
    pub dot_all: Option<bool>,
}

/// A character class as written: `members`, plus the complement of each
/// set in `excluded`, the whole complemented when `negated`.
///
/// Negations stay unresolved so that case folding, which depends on the
/// flags in effect where the class is used, applies to the positive sets
/// before they are complemented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassSet {
    pub members: CharSet,
    pub excluded: Vec<CharSet>,
    pub negated: bool,
}

impl ClassSet {
    pub fn of(set: CharSet) -> Self {
        Self {
            members: set,
            ..Self::default()
        }
    }

    /// Every character not in `set`, as `\W` or `\P{..}` denote.
    pub fn not(set: CharSet) -> Self {
        Self {
            members: set,
            excluded: Vec::new(),
            negated: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.excluded.is_empty() && !self.negated
    }

    /// Adds a class item such as `a`, `\w` or `\D`.
    pub fn add(&mut self, item: ClassSet) {
        match item {
            ClassSet {
                members,
                excluded,
                negated: false,
            } if excluded.is_empty() => self.members = self.members.union(&members),
            ClassSet {
                members,
                excluded,
                negated: true,
            } if excluded.is_empty() => self.excluded.push(members),
            other => {
                let set = other.resolve(CharSet::clone);
                self.members = self.members.union(&set);
            }
        }
    }

    /// The characters matched, with `fold` applied to each positive set
    /// before any complement is taken.
    pub fn resolve(&self, fold: impl Fn(&CharSet) -> CharSet) -> CharSet {
        let mut set = fold(&self.members);
        for excluded in &self.excluded {
            set = set.union(&fold(excluded).complement());
        }
        if self.negated { set.complement() } else { set }
    }

    pub fn contains(&self, c: u32) -> bool {
        self.resolve(CharSet::clone).contains(c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Difference,
    Union,
    Intersection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexKind {
    /// Matches the empty string.
    Empty,
    Char(u32),
    /// A bracket expression, a predefined class or a Unicode property.
    Set(ClassSet),
    /// `.`
    Any,
    /// `{eoi}`
    Eoi,
    /// `{name}`
    Expand(String),
    Seq(Vec<RegexNode>),
    Alt(Vec<RegexNode>),
    Group {
        flags: Option<FlagChange>,
        inner: Box<RegexNode>,
    },
    /// `(?!...)`
    NotFollowedBy(Box<RegexNode>),
    Repeat {
        inner: Box<RegexNode>,
        min: u32,
        max: Option<u32>,
    },
    SetAlgebra {
        op: SetOp,
        left: Box<RegexNode>,
        right: Box<RegexNode>,
    },
    /// Stands in for a part that failed to parse.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexNode {
    pub kind: RegexKind,
    pub range: TextRange,
}

impl RegexNode {
    #[inline]
    pub fn new(kind: RegexKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    /// The text this node always matches, if it is made of plain characters.
    pub fn constant(&self) -> Option<std::string::String> {
        let mut out = std::string::String::new();
        self.collect_constant(&mut out).then_some(out)
    }

    fn collect_constant(&self, out: &mut std::string::String) -> bool {
        match &self.kind {
            RegexKind::Empty => true,
            RegexKind::Char(c) => match char::from_u32(*c) {
                Some(ch) => {
                    out.push(ch);
                    true
                }
                None => false,
            },
            RegexKind::Seq(items) => items.iter().all(|item| item.collect_constant(out)),
            RegexKind::Group { flags: None, inner } => inner.collect_constant(out),
            _ => false,
        }
    }

    /// Visits this node and all descendants, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a RegexNode)) {
        f(self);
        match &self.kind {
            RegexKind::Seq(items) | RegexKind::Alt(items) => {
                for item in items {
                    item.walk(f);
                }
            }
            RegexKind::Group { inner, .. }
            | RegexKind::NotFollowedBy(inner)
            | RegexKind::Repeat { inner, .. } => inner.walk(f),
            RegexKind::SetAlgebra { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            RegexKind::Empty
            | RegexKind::Char(_)
            | RegexKind::Set(_)
            | RegexKind::Any
            | RegexKind::Eoi
            | RegexKind::Expand(_)
            | RegexKind::Placeholder => {}
        }
    }

    /// Names of the patterns this node expands.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |node| {
            if let RegexKind::Expand(name) = &node.kind {
                names.push(name.as_str());
            }
        });
        names
    }
}
