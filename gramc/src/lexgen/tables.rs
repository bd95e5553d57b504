use smartstring::alias::String;
use std::fmt;

/// Transition cell value for "no transition, no acceptance".
pub const INVALID: i32 = -1;

/// Decoded transition table cell.
///
/// Actions are numbered from 0: action 0 produces the EOI token, action
/// `r + 1` is lexical rule `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Consume the character and go to the state.
    Goto(usize),
    /// Consume the character and go to `state`, remembering that `action`
    /// accepts the text scanned so far.
    Backtrack { action: usize, state: usize },
    /// Stop before the character; `action` accepts the text scanned so far.
    Accept(usize),
    Invalid,
}

/// Soft keywords refining one class rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInstances {
    /// Action of the class rule.
    pub class_action: usize,
    /// `(text, action)` sorted by text.
    pub entries: Vec<(String, usize)>,
}

/// Output of [`LexerBuilder`](super::LexerBuilder).
///
/// `transitions` is a row-major `states x classes` table of encoded cells:
///
/// - `v >= 0`: goto state `v`;
/// - `v == -1`: invalid;
/// - `first_rule < v <= -2`: backtracking entry `-2 - v`;
/// - `v <= first_rule`: accept action `first_rule - v`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerTables {
    pub classes: usize,
    /// Class of each ASCII code point.
    pub ascii_classes: Vec<u32>,
    /// Classes of the remaining code points as sorted `(first, last, class)`.
    pub class_ranges: Vec<(u32, u32, u32)>,
    pub states: usize,
    pub transitions: Vec<i32>,
    /// Start state of each lexer state.
    pub state_map: Vec<usize>,
    /// `(fallback action, next state)`
    pub backtracking: Vec<(usize, usize)>,
    pub first_rule: i32,
    /// Symbol index produced by each action.
    pub action_symbol: Vec<usize>,
    /// Lexical rule of each action; `None` for EOI.
    pub action_rule: Vec<Option<usize>>,
    pub instances: Vec<ClassInstances>,
    pub debug: Option<std::string::String>,
}

/// Class of the end-of-input pseudo character.
pub const EOI_CLASS: usize = 0;

impl LexerTables {
    pub fn class_of(&self, c: char) -> usize {
        let c = c as u32;
        if let Some(&class) = self.ascii_classes.get(c as usize) {
            return class as usize;
        }
        let k = self.class_ranges.partition_point(|&(first, _, _)| first <= c);
        match k.checked_sub(1).map(|k| self.class_ranges[k]) {
            Some((_, last, class)) if c <= last => class as usize,
            // code points outside every range share the class of the last one
            _ => self.class_ranges.last().map_or(1, |&(_, _, class)| class as usize),
        }
    }

    pub fn cell(&self, state: usize, class: usize) -> Cell {
        let v = self.transitions[state * self.classes + class];
        if v >= 0 {
            Cell::Goto(v as usize)
        } else if v == INVALID {
            Cell::Invalid
        } else if v > self.first_rule {
            let (action, state) = self.backtracking[(-2 - v) as usize];
            Cell::Backtrack { action, state }
        } else {
            Cell::Accept((self.first_rule - v) as usize)
        }
    }

    /// Action of the instance of `class_action` spelled `text`, if any.
    pub fn instance(&self, class_action: usize, text: &str) -> Option<usize> {
        let group = self
            .instances
            .iter()
            .find(|g| g.class_action == class_action)?;
        group
            .entries
            .binary_search_by(|(t, _)| t.as_str().cmp(text))
            .ok()
            .map(|k| group.entries[k].1)
    }

    #[inline]
    pub fn actions(&self) -> usize {
        self.action_symbol.len()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Goto(s) => write!(f, "{}", s),
            Cell::Backtrack { action, state } => write!(f, "{}?{}", state, action),
            Cell::Accept(a) => write!(f, "a{}", a),
            Cell::Invalid => f.write_str("-"),
        }
    }
}
