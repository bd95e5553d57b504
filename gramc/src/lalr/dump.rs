//! Human-readable dump of the LALR(1) construction.
//!
//! The output is line oriented with a record tag in front of every line:
//!
//! ```text
//! PS,<number of rules>
//! P,<rule>,<left> -> <right symbols>
//! FIRST,<symbol>,{`empty', <terminals>, }
//! CS,<number of states>
//! C,<state>,<left> -> <symbols with a dot> [<lookaheads>]
//! A,<state>,<terminal>=<action> ...
//! ```

use super::lookahead::Reductions;
use super::lr0::Lr0;
use super::sets::{FirstSets, Prods};
use super::tables::ParserTables;
use crate::grammar::Grammar;
use std::fmt::{self, Write};

/// Symbol names, pseudo input nonterminals included.
fn names(grammar: &Grammar, prods: &Prods) -> Vec<String> {
    let mut names: Vec<String> = grammar.symbols()[..prods.symbols]
        .iter()
        .map(|s| s.name.to_string())
        .collect();
    names.extend((prods.symbols..prods.by_left.len()).map(|i| format!("${}", i - prods.symbols)));
    names
}

pub(crate) fn write_prods<W: Write>(out: &mut W, prods: &Prods, names: &[String]) -> fmt::Result {
    writeln!(out, "PS,{}", prods.len())?;
    for (i, (left, right)) in prods.left.iter().zip(&prods.right).enumerate() {
        write!(out, "P,{},{} ->", i, names[*left])?;
        for &sym in right {
            write!(out, " {}", names[sym])?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub(crate) fn write_first<W: Write>(
    out: &mut W,
    prods: &Prods,
    sets: &FirstSets,
    names: &[String],
) -> fmt::Result {
    for sym in prods.terminals..prods.symbols {
        write!(out, "FIRST,{},{{", names[sym])?;
        if sets.nullable[sym] {
            write!(out, "`empty', ")?;
        }
        for &t in &sets.first[sym] {
            write!(out, "{}, ", names[t])?;
        }
        writeln!(out, "}}")?;
    }
    Ok(())
}

pub(crate) fn write_states<W: Write>(
    out: &mut W,
    lr0: &Lr0,
    reductions: &[Reductions],
    prods: &Prods,
    names: &[String],
) -> fmt::Result {
    writeln!(out, "CS,{}", lr0.states.len())?;
    for (s, state) in lr0.states.iter().enumerate() {
        for item in &state.items {
            write!(out, "C,{},{} ->", s, names[prods.left[item.rule]])?;
            let right = &prods.right[item.rule];
            for (j, &sym) in right.iter().enumerate() {
                if j == item.dot {
                    write!(out, " .")?;
                }
                write!(out, " {}", names[sym])?;
            }
            if item.dot == right.len() {
                write!(out, " .")?;
                if let Some((_, la)) = reductions[s].iter().find(|(r, _)| *r == item.rule) {
                    let la: Vec<&str> = la.iter().map(|&t| names[t].as_str()).collect();
                    write!(out, " [{}]", la.join(" "))?;
                }
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

pub(crate) fn write_actions<W: Write>(out: &mut W, tables: &ParserTables, names: &[String]) -> fmt::Result {
    for s in 0..tables.states {
        write!(out, "A,{},", s)?;
        for t in 0..tables.terminals {
            let action = tables.action(s, t);
            if action != super::ParserAction::Error {
                write!(out, " {}={}", names[t], action)?;
            }
        }
        if let Some(r) = tables.default_reduce[s] {
            write!(out, " default=r{}", r)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub(crate) fn dump(
    grammar: &Grammar,
    prods: &Prods,
    sets: &FirstSets,
    lr0: &Lr0,
    reductions: &[Reductions],
    tables: &ParserTables,
) -> Result<String, fmt::Error> {
    let names = names(grammar, prods);
    let mut out = String::new();
    write_prods(&mut out, prods, &names)?;
    writeln!(out)?;
    write_first(&mut out, prods, sets, &names)?;
    writeln!(out)?;
    write_states(&mut out, lr0, reductions, prods, &names)?;
    writeln!(out)?;
    write_actions(&mut out, tables, &names)?;
    Ok(out)
}
