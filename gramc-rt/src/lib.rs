//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Interpreters for the tables built by [`gramc`].
//!
//! A [`Scanner`] runs [`LexerTables`](gramc::LexerTables) over a string with
//! longest-match and backtracking semantics; a [`Parser`] drives
//! [`ParserTables`](gramc::ParserTables) over the scanner's tokens and
//! returns the derivation tree.
//!
//! # Example
//!
//! ```rust
//! use gramc::diag::Diagnostics;
//! use gramc::grammar::{Assoc, GrammarBuilder, LexemKind};
//! use gramc::{LalrBuilder, LexerBuilder};
//! use gramc_rt::{Parser, Scanner};
//!
//! let mut sink = Diagnostics::new();
//! let mut b = GrammarBuilder::new();
//! let initial = b.add_state("initial", None).unwrap();
//! let num = b.add_terminal("NUM", None, None).unwrap();
//! let plus = b.add_terminal("'+'", None, None).unwrap();
//! let expr = b.add_nonterminal("expr", None, None).unwrap();
//! let re = b.parse_regex("[0-9]+", None, &mut sink);
//! b.add_lexem(LexemKind::Normal, num, re, &[initial], 0, None, None).unwrap();
//! let re = b.parse_regex("\\+", None, &mut sink);
//! b.add_lexem(LexemKind::Normal, plus, re, &[initial], 0, None, None).unwrap();
//! b.add_prio(Assoc::Left, &[plus], None).unwrap();
//! b.add_rule(expr, &[expr, plus, expr]).unwrap();
//! b.add_rule(expr, &[num]).unwrap();
//! b.add_input(expr, true, None).unwrap();
//! let g = b.create();
//!
//! let lexer = LexerBuilder::new(&g).build(&mut sink).unwrap();
//! let tables = LalrBuilder::new(&g).build(&mut sink).unwrap();
//! assert!(!sink.has_errors());
//!
//! let mut scanner = Scanner::new(&lexer, "1+2+3");
//! let tree = Parser::new(&tables).parse(&mut scanner, 0).unwrap();
//! assert_eq!(tree.bracketed(), "((1+2)+3)");
//! ```

pub mod error;
pub mod parser;
pub mod scanner;

pub use error::{Position, ScanError, Span};
pub use parser::{Node, Parser, ParserStats};
pub use scanner::{Scanner, ScannerStats, Token};
