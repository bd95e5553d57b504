//! Diagnostics channel shared by every build phase.
//!
//! Builders never print. Everything they discover (structural problems in a
//! regex, shadowed lexical rules, LALR conflicts, ...) is turned into a
//! [`Diagnostic`] and handed to a [`Reporter`] in discovery order. Callers
//! either collect them with [`Diagnostics`] or pass a closure.
//!
//! # Examples
//!
//! ```rust
//! # use gramc::diag::{Diagnostic, DiagnosticKind, Diagnostics, Reporter};
//! let mut sink = Diagnostics::new();
//! sink.report(Diagnostic::warning(DiagnosticKind::UnusedTerminal, "`x' is never used"));
//! assert!(!sink.has_errors());
//!
//! let mut seen = 0;
//! let mut count = |_: Diagnostic| seen += 1;
//! count.report(Diagnostic::error(DiagnosticKind::Structural, "boom"));
//! assert_eq!(seen, 1);
//! ```

use std::fmt;

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A grammar entity that could not be registered or resolved.
    Structural,
    /// Malformed regular expression.
    RegexSyntax,
    /// Two rules with the same priority accept the same text.
    LexicalAmbiguity,
    /// A lexical rule that never wins.
    UnreachableRule,
    /// A lexical rule that accepts the empty string.
    EmptyMatch,
    /// A terminal that appears in no grammar rule.
    UnusedTerminal,
    /// A nonterminal not derivable from any input.
    UnreachableNonterminal,
    /// A nonterminal without rules.
    UndefinedNonterminal,
    /// A shift/reduce or reduce/reduce conflict.
    GrammarConflict,
    /// A precondition of a table-building phase does not hold.
    BuildPrecondition,
}

/// A source range that a diagnostic points at.
///
/// Offsets are byte offsets into the resource, `end_offset` is exclusive and
/// `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceAnchor {
    pub resource: String,
    pub offset: usize,
    pub end_offset: usize,
    pub line: usize,
}

impl Default for SourceAnchor {
    fn default() -> Self {
        Self {
            resource: String::new(),
            offset: 0,
            end_offset: 0,
            line: 1,
        }
    }
}

impl SourceAnchor {
    /// Creates a new anchor.
    #[inline]
    pub fn new(resource: impl Into<String>, offset: usize, end_offset: usize, line: usize) -> Self {
        Self {
            resource: resource.into(),
            offset,
            end_offset,
            line,
        }
    }

    /// Narrows this anchor to `start..end` of `text`, the text it covers.
    ///
    /// The resulting line accounts for newlines in `text` before `start`.
    pub fn narrow(&self, text: &str, start: usize, end: usize) -> Self {
        let start = start.min(text.len());
        let end = end.clamp(start, text.len());
        let newlines = text.as_bytes()[..start].iter().filter(|&&b| b == b'\n').count();
        Self {
            resource: self.resource.clone(),
            offset: self.offset + start,
            end_offset: self.offset + end,
            line: self.line + newlines,
        }
    }
}

impl fmt::Display for SourceAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.resource.is_empty() {
            write!(f, "{}:{}..{}", self.line, self.offset, self.end_offset)
        } else {
            write!(
                f,
                "{}:{}:{}..{}",
                self.resource, self.line, self.offset, self.end_offset
            )
        }
    }
}

/// A single finding of a build phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub anchors: Vec<SourceAnchor>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            anchors: Vec::new(),
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            anchors: Vec::new(),
        }
    }

    /// Attaches an anchor if there is one.
    pub fn at(mut self, anchor: Option<&SourceAnchor>) -> Self {
        if let Some(anchor) = anchor {
            self.anchors.push(anchor.clone());
        }
        self
    }

    /// Attaches every anchor of `anchors`.
    pub fn at_all<'a>(mut self, anchors: impl IntoIterator<Item = &'a SourceAnchor>) -> Self {
        self.anchors.extend(anchors.into_iter().cloned());
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(anchor) = self.anchors.first() {
            write!(f, "{}: ", anchor)?;
        }
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Receiver of diagnostics.
pub trait Reporter {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<F> Reporter for F
where
    F: FnMut(Diagnostic),
{
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// A [`Reporter`] that keeps everything it receives, in order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl Reporter for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Logs `diagnostic` and forwards it to `reporter`.
pub(crate) fn emit(reporter: &mut dyn Reporter, diagnostic: Diagnostic) {
    match diagnostic.severity {
        Severity::Error => log::debug!("{}", diagnostic),
        Severity::Warning => log::trace!("{}", diagnostic),
    }
    reporter.report(diagnostic);
}
