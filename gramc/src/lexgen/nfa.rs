//! Thompson construction of a nondeterministic automaton from regex trees.

use crate::grammar::NamedPattern;
use crate::regex::charset::{ANY, ANY_BUT_NEWLINE, CharSet, EOI};
use crate::regex::{ClassSet, FlagChange, Regex, RegexKind, RegexNode, SetOp, TextRange};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub(crate) struct NfaState {
    pub eps: Vec<usize>,
    /// `(set id, target)`
    pub edges: Vec<(usize, usize)>,
}

/// An automaton whose edges are labelled with interned character sets.
#[derive(Debug, Clone, Default)]
pub(crate) struct Nfa {
    pub states: Vec<NfaState>,
    pub sets: Vec<CharSet>,
    set_ids: HashMap<CharSet, usize>,
}

impl Nfa {
    pub fn add_state(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    pub fn add_eps(&mut self, from: usize, to: usize) {
        self.states[from].eps.push(to);
    }

    pub fn add_edge(&mut self, from: usize, set: CharSet, to: usize) {
        let id = match self.set_ids.get(&set) {
            Some(&id) => id,
            None => {
                self.sets.push(set.clone());
                self.set_ids.insert(set, self.sets.len() - 1);
                self.sets.len() - 1
            }
        };
        self.states[from].edges.push((id, to));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fragment {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    case_insensitive: bool,
    dot_all: bool,
}

impl Flags {
    fn apply(self, change: &FlagChange) -> Flags {
        Flags {
            case_insensitive: change.case_insensitive.unwrap_or(self.case_insensitive),
            dot_all: change.dot_all.unwrap_or(self.dot_all),
        }
    }
}

/// Why a rule could not be compiled, with the range in the rule's own text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompileError {
    pub message: String,
    pub range: TextRange,
}

type Compiled<T> = Result<T, CompileError>;

fn fail<T>(message: impl Into<String>, range: TextRange) -> Compiled<T> {
    Err(CompileError {
        message: message.into(),
        range,
    })
}

/// A compiled lexical rule: its fragment and the optional set it must not be
/// followed by.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub fragment: Fragment,
    pub lookahead: Option<CharSet>,
}

pub(crate) struct NfaCompiler<'g> {
    pub nfa: Nfa,
    patterns: HashMap<&'g str, &'g NamedPattern>,
    unusable: HashSet<&'g str>,
    max_repeat: u32,
}

impl<'g> NfaCompiler<'g> {
    pub fn new(patterns: &'g [NamedPattern], unusable: HashSet<&'g str>, max_repeat: u32) -> Self {
        Self {
            nfa: Nfa::default(),
            patterns: patterns.iter().map(|p| (p.name.as_str(), p)).collect(),
            unusable,
            max_repeat,
        }
    }

    /// Compiles the regex of a lexical rule.
    ///
    /// A trailing `(?!set)` becomes the rule's lookahead; anywhere else it is
    /// an error.
    pub fn compile_rule(&mut self, regex: &Regex) -> Compiled<CompiledRule> {
        let root = regex.root();
        let flags = Flags::default();
        let (body, lookahead): (&[RegexNode], Option<&RegexNode>) = match &root.kind {
            RegexKind::NotFollowedBy(_) => {
                return fail("lexical rule cannot consist of a lookahead only", root.range);
            }
            RegexKind::Seq(items) => match items.split_last() {
                Some((last, rest)) if matches!(last.kind, RegexKind::NotFollowedBy(_)) => {
                    (rest, Some(last))
                }
                _ => (items.as_slice(), None),
            },
            _ => (std::slice::from_ref(root), None),
        };

        let lookahead = match lookahead {
            Some(RegexNode {
                kind: RegexKind::NotFollowedBy(inner),
                range,
            }) => match self.eval_set(inner, flags) {
                Ok(set) => Some(set),
                Err(_) => return fail("lookahead must be a character set", *range),
            },
            _ => None,
        };
        let fragment = self.compile_seq(body, flags)?;
        Ok(CompiledRule {
            fragment,
            lookahead,
        })
    }

    fn compile_seq(&mut self, items: &[RegexNode], flags: Flags) -> Compiled<Fragment> {
        let start = self.nfa.add_state();
        let mut end = start;
        for item in items {
            let f = self.compile(item, flags)?;
            self.nfa.add_eps(end, f.start);
            end = f.end;
        }
        Ok(Fragment { start, end })
    }

    fn single_edge(&mut self, set: CharSet) -> Fragment {
        let start = self.nfa.add_state();
        let end = self.nfa.add_state();
        self.nfa.add_edge(start, set, end);
        Fragment { start, end }
    }

    fn fold(set: CharSet, flags: Flags) -> CharSet {
        if flags.case_insensitive {
            set.case_fold()
        } else {
            set
        }
    }

    /// Folds the positive parts of `class` before resolving its negations,
    /// so `(?i:[^a])` excludes both cases of `a`.
    fn fold_class(class: &ClassSet, flags: Flags) -> CharSet {
        class.resolve(|set| Self::fold(set.clone(), flags))
    }

    fn pattern(&self, name: &str, range: TextRange) -> Compiled<&'g NamedPattern> {
        if self.unusable.contains(name) {
            return fail(format!("pattern `{}' cannot be used", name), range);
        }
        match self.patterns.get(name) {
            Some(p) => Ok(*p),
            None => fail(format!("unknown pattern `{}'", name), range),
        }
    }

    fn compile(&mut self, node: &RegexNode, flags: Flags) -> Compiled<Fragment> {
        match &node.kind {
            RegexKind::Empty => self.compile_seq(&[], flags),
            RegexKind::Char(c) => {
                let set = Self::fold(CharSet::single(*c), flags);
                Ok(self.single_edge(set))
            }
            RegexKind::Set(class) => {
                let set = Self::fold_class(class, flags);
                Ok(self.single_edge(set))
            }
            RegexKind::Any => {
                let set = if flags.dot_all {
                    ANY.clone()
                } else {
                    ANY_BUT_NEWLINE.clone()
                };
                Ok(self.single_edge(set))
            }
            RegexKind::Eoi => Ok(self.single_edge(CharSet::single(EOI))),
            RegexKind::Expand(name) => {
                let pattern = self.pattern(name, node.range)?;
                // errors inside the pattern point at the reference
                self.compile(pattern.regex.root(), flags)
                    .map_err(|e| CompileError {
                        message: format!("in pattern `{}': {}", name, e.message),
                        range: node.range,
                    })
            }
            RegexKind::Seq(items) => self.compile_seq(items, flags),
            RegexKind::Alt(alternatives) => {
                let start = self.nfa.add_state();
                let end = self.nfa.add_state();
                for alt in alternatives {
                    let f = self.compile(alt, flags)?;
                    self.nfa.add_eps(start, f.start);
                    self.nfa.add_eps(f.end, end);
                }
                Ok(Fragment { start, end })
            }
            RegexKind::Group { flags: change, inner } => {
                let flags = change.as_ref().map_or(flags, |c| flags.apply(c));
                self.compile(inner, flags)
            }
            RegexKind::NotFollowedBy(_) => fail(
                "negative lookahead is only allowed at the end of a lexical rule",
                node.range,
            ),
            RegexKind::Repeat { inner, min, max } => {
                self.compile_repeat(inner, *min, *max, node.range, flags)
            }
            RegexKind::SetAlgebra { .. } => {
                let set = self.eval_set(node, flags)?;
                Ok(self.single_edge(set))
            }
            RegexKind::Placeholder => fail("regex has syntax errors", node.range),
        }
    }

    fn compile_repeat(
        &mut self,
        inner: &RegexNode,
        min: u32,
        max: Option<u32>,
        range: TextRange,
        flags: Flags,
    ) -> Compiled<Fragment> {
        if min.max(max.unwrap_or(0)) > self.max_repeat {
            return fail(
                format!("repetition count exceeds {}", self.max_repeat),
                range,
            );
        }
        let start = self.nfa.add_state();
        let mut cur = start;
        for _ in 0..min {
            let f = self.compile(inner, flags)?;
            self.nfa.add_eps(cur, f.start);
            cur = f.end;
        }
        match max {
            None => {
                let f = self.compile(inner, flags)?;
                let hub = self.nfa.add_state();
                self.nfa.add_eps(cur, hub);
                self.nfa.add_eps(hub, f.start);
                self.nfa.add_eps(f.end, hub);
                cur = hub;
            }
            Some(max) => {
                let end = self.nfa.add_state();
                self.nfa.add_eps(cur, end);
                for _ in min..max {
                    let f = self.compile(inner, flags)?;
                    self.nfa.add_eps(cur, f.start);
                    cur = f.end;
                    self.nfa.add_eps(cur, end);
                }
                cur = end;
            }
        }
        Ok(Fragment { start, end: cur })
    }

    /// Evaluates a node that must denote a set of single characters.
    fn eval_set(&self, node: &RegexNode, flags: Flags) -> Compiled<CharSet> {
        match &node.kind {
            RegexKind::Char(c) => Ok(Self::fold(CharSet::single(*c), flags)),
            RegexKind::Set(class) => Ok(Self::fold_class(class, flags)),
            RegexKind::Any if flags.dot_all => Ok(ANY.clone()),
            RegexKind::Any => Ok(ANY_BUT_NEWLINE.clone()),
            RegexKind::Expand(name) => {
                let pattern = self.pattern(name, node.range)?;
                self.eval_set(pattern.regex.root(), flags)
                    .map_err(|e| CompileError {
                        message: e.message,
                        range: node.range,
                    })
            }
            RegexKind::Group { flags: change, inner } => {
                let flags = change.as_ref().map_or(flags, |c| flags.apply(c));
                self.eval_set(inner, flags)
            }
            RegexKind::Alt(alternatives) => {
                let mut set = CharSet::new();
                for alt in alternatives {
                    set = set.union(&self.eval_set(alt, flags)?);
                }
                Ok(set)
            }
            RegexKind::SetAlgebra { op, left, right } => {
                let l = self.eval_set(left, flags)?;
                let r = self.eval_set(right, flags)?;
                Ok(match op {
                    SetOp::Difference => l.subtract(&r),
                    SetOp::Union => l.union(&r),
                    SetOp::Intersection => l.intersect(&r),
                })
            }
            _ => fail("set operator requires character sets", node.range),
        }
    }
}

/// Patterns taking part in a reference cycle, in declaration order.
pub(crate) fn cyclic_patterns(patterns: &[NamedPattern]) -> Vec<usize> {
    let index: HashMap<&str, usize> = patterns
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();
    let edges: Vec<Vec<usize>> = patterns
        .iter()
        .map(|p| {
            p.regex
                .root()
                .references()
                .into_iter()
                .filter_map(|name| index.get(name).copied())
                .collect()
        })
        .collect();

    (0..patterns.len())
        .filter(|&p| {
            let mut seen = vec![false; patterns.len()];
            let mut stack = edges[p].clone();
            while let Some(q) = stack.pop() {
                if q == p {
                    return true;
                }
                if !seen[q] {
                    seen[q] = true;
                    stack.extend(&edges[q]);
                }
            }
            false
        })
        .collect()
}
