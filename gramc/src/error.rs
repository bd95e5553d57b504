//! Error types returned by the grammar builder and the table builders.

use crate::diag::{Diagnostic, DiagnosticKind, SourceAnchor};
use smartstring::alias::String;
use std::fmt;
use thiserror::Error;

/// Name spaces of the grammar builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Symbol,
    Pattern,
    LexerState,
    LexicalRule,
    Rule,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Namespace::Symbol => "symbol",
            Namespace::Pattern => "pattern",
            Namespace::LexerState => "lexer state",
            Namespace::LexicalRule => "lexical rule",
            Namespace::Rule => "rule",
        })
    }
}

/// A rejected builder operation.
///
/// The entity that caused it is not registered; the builder stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("{namespace} `{name}' already exists")]
    DuplicateName { namespace: Namespace, name: String },

    #[error("{namespace} #{index} does not belong to this grammar")]
    UnknownEntity { namespace: Namespace, index: usize },

    #[error("{kind} lexical rule cannot be bound to `{symbol}'")]
    KindMismatch { kind: &'static str, symbol: String },

    #[error("lexical rule for `{symbol}' has no lexer states")]
    NoStates { symbol: String },

    #[error("`{name}' should be a nonterminal")]
    NotNonterminal { name: String },

    #[error("`{name}' should be a terminal")]
    NotTerminal { name: String },

    #[error("`{name}' cannot appear on the right-hand side of a rule")]
    NotRuleSymbol { name: String },

    #[error("lexical rule #{index} is not a class rule")]
    NotClassRule { index: usize },
}

impl GrammarError {
    /// Turns this error into a structural diagnostic.
    pub fn to_diagnostic(&self, origin: Option<&SourceAnchor>) -> Diagnostic {
        Diagnostic::error(DiagnosticKind::Structural, self.to_string()).at(origin)
    }
}

/// A precondition of a table-building phase that does not hold.
///
/// Only the phase that returned it is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("grammar has no rules (lexer-only grammar)")]
    NoRules,

    #[error("grammar has rules but no input declarations")]
    NoInputs,

    #[error("lexer automaton is too large: {states} states")]
    TooManyStates { states: usize },
}

impl BuildError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(DiagnosticKind::BuildPrecondition, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e = GrammarError::DuplicateName {
            namespace: Namespace::Symbol,
            name: "id".into(),
        };
        assert_eq!(e.to_string(), "symbol `id' already exists");
        let d = e.to_diagnostic(None);
        assert_eq!(d.kind, DiagnosticKind::Structural);
        assert!(d.is_error());
        assert_eq!(
            BuildError::NoInputs.to_diagnostic().kind,
            DiagnosticKind::BuildPrecondition
        );
    }
}
