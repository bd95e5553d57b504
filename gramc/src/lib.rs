//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Grammar compilation engine.
//!
//! `gramc` turns a grammar description into tables for a scanner and a
//! parser:
//!  * **`grammar`**: a validating [`GrammarBuilder`] and the frozen [`Grammar`]
//!  * **`regex`**: the regex compiler used by lexical rules and patterns
//!  * **`lexgen`**: regex to NFA to DFA lexer tables with backtracking entries
//!  * **`lalr`**: LALR(1) tables with precedence-based conflict resolution
//!
//! Builders never print or fail on recoverable problems; findings go to a
//! [`diag::Reporter`].
//!
//! # Example
//!
//! ```rust
//! use gramc::diag::Diagnostics;
//! use gramc::grammar::{GrammarBuilder, LexemKind};
//! use gramc::lalr::LalrBuilder;
//! use gramc::lexgen::LexerBuilder;
//!
//! let mut sink = Diagnostics::new();
//! let mut b = GrammarBuilder::new();
//! let initial = b.add_state("initial", None).unwrap();
//! let id = b.add_terminal("id", None, None).unwrap();
//! let list = b.add_nonterminal("list", None, None).unwrap();
//! let re = b.parse_regex("[a-z]+", None, &mut sink);
//! b.add_lexem(LexemKind::Normal, id, re, &[initial], 0, None, None).unwrap();
//! b.add_rule(list, &[id]).unwrap();
//! b.add_rule(list, &[list, id]).unwrap();
//! b.add_input(list, true, None).unwrap();
//! let g = b.create();
//!
//! let lexer = LexerBuilder::new(&g).build(&mut sink).unwrap();
//! let parser = LalrBuilder::new(&g).build(&mut sink).unwrap();
//! assert!(!sink.has_errors());
//! assert_eq!(lexer.actions(), 2);
//! assert_eq!(parser.rules(), 2);
//! ```

pub mod diag;
pub mod error;
pub mod grammar;
pub mod lalr;
pub mod lexgen;
pub mod options;
pub mod regex;

pub use diag::{Diagnostic, DiagnosticKind, Diagnostics, Reporter, Severity, SourceAnchor};
pub use error::{BuildError, GrammarError};
pub use grammar::{Grammar, GrammarBuilder};
pub use lalr::{LalrBuilder, ParserAction, ParserTables};
pub use lexgen::{LexerBuilder, LexerTables};
pub use options::BuildOptions;
