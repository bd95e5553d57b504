//! Regex compiler for lexical rules and named patterns.
//!
//! [`Regex::parse`] turns regex text into a [`RegexNode`] tree. Syntax errors
//! are reported as [`DiagnosticKind::RegexSyntax`] diagnostics anchored at the
//! offending range; the regex is then flagged invalid and the lexer builder
//! ignores it.

pub mod ast;
pub mod charset;
mod lexer;
mod parser;

pub use ast::{ClassSet, FlagChange, RegexKind, RegexNode, SetOp, TextRange};
pub use charset::CharSet;

use crate::diag::{Diagnostic, DiagnosticKind, Reporter, SourceAnchor, emit};

/// A parsed regular expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regex {
    text: String,
    root: RegexNode,
    errors: usize,
}

impl Regex {
    /// Parses `text`. `origin`, when given, is where `text` starts in its
    /// resource; error anchors are computed relative to it.
    pub fn parse(text: &str, origin: Option<&SourceAnchor>, reporter: &mut dyn Reporter) -> Regex {
        let (root, issues) = parser::parse(text);
        let base = origin.cloned().unwrap_or_default();
        for (message, range) in &issues {
            let anchor = base.narrow(text, range.start, range.end);
            emit(
                reporter,
                Diagnostic::error(
                    DiagnosticKind::RegexSyntax,
                    format!("{} in `{}'", message, text),
                )
                .at(Some(&anchor)),
            );
        }
        Regex {
            text: text.to_string(),
            root,
            errors: issues.len(),
        }
    }

    /// A regex matching exactly `text`.
    pub fn literal(text: &str) -> Regex {
        let mut items: Vec<RegexNode> = text
            .char_indices()
            .map(|(i, c)| {
                RegexNode::new(
                    RegexKind::Char(c as u32),
                    TextRange::new(i, i + c.len_utf8()),
                )
            })
            .collect();
        let range = TextRange::new(0, text.len());
        let root = match items.len() {
            0 => RegexNode::new(RegexKind::Empty, range),
            1 => items.remove(0),
            _ => RegexNode::new(RegexKind::Seq(items), range),
        };
        Regex {
            text: text.to_string(),
            root,
            errors: 0,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }

    #[inline]
    pub fn error_count(&self) -> usize {
        self.errors
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn root(&self) -> &RegexNode {
        &self.root
    }

    /// The only text this regex matches, if it is a plain string.
    pub fn constant(&self) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        self.root.constant()
    }
}
