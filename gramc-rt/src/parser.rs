use crate::error::Span;
use crate::scanner::{Scanner, Token};
use anyhow::{Result, anyhow, bail};
use gramc::lalr::{ParserAction, ParserTables};
use std::fmt::Write;

/// Derivation tree produced by [`Parser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Token),
    Branch {
        rule: usize,
        /// Nonterminal symbol index.
        symbol: usize,
        span: Span,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn symbol(&self) -> usize {
        match self {
            Node::Leaf(t) => t.symbol,
            Node::Branch { symbol, .. } => *symbol,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Leaf(t) => t.span,
            Node::Branch { span, .. } => *span,
        }
    }

    /// Token texts with every branch of two or more children in parentheses,
    /// e.g. `((1+2)+3)`.
    pub fn bracketed(&self) -> String {
        let mut out = String::new();
        self.write_bracketed(&mut out);
        out
    }

    fn write_bracketed(&self, out: &mut String) {
        match self {
            Node::Leaf(t) => out.push_str(&t.text),
            Node::Branch { children, .. } if children.len() == 1 => {
                children[0].write_bracketed(out)
            }
            Node::Branch { children, .. } => {
                out.push('(');
                for child in children {
                    child.write_bracketed(out);
                }
                out.push(')');
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    /// Reductions taken without reading a lookahead.
    pub default_reductions: usize,
    /// Layout tokens dropped before reaching the parser.
    pub layout: usize,
}

/// Table-driven LR parser.
///
/// Tokens whose symbol is not a terminal of the tables (layout) are dropped.
/// A lookahead read but not consumed when an input is accepted is kept for
/// the next [`parse`](Parser::parse) call.
pub struct Parser<'t> {
    tables: &'t ParserTables,
    lookahead: Option<Token>,
    pub stats: ParserStats,
}

impl<'t> Parser<'t> {
    pub fn new(tables: &'t ParserTables) -> Self {
        Self {
            tables,
            lookahead: None,
            stats: ParserStats::default(),
        }
    }

    fn peek(&mut self, scanner: &mut Scanner<'_, '_>) -> Result<&Token> {
        if self.lookahead.is_none() {
            let token = loop {
                let Some(token) = scanner.try_next()? else {
                    bail!("unexpected end of stream");
                };
                self.stats.tokens += 1;
                if token.symbol < self.tables.terminals {
                    break token;
                }
                log::trace!("Layout {:?}", token.text);
                self.stats.layout += 1;
            };
            self.lookahead = Some(token);
        }
        self.lookahead
            .as_ref()
            .ok_or_else(|| anyhow!("no lookahead"))
    }

    /// Parses one instance of input `input` from `scanner`.
    pub fn parse(&mut self, scanner: &mut Scanner<'_, '_>, input: usize) -> Result<Node> {
        let Some(&start) = self.tables.start_states.get(input) else {
            bail!("unknown input {}", input);
        };
        let mut states = vec![start];
        let mut nodes: Vec<Node> = Vec::new();
        loop {
            Self::dump_state(&states, &nodes);
            let state = states[states.len() - 1];
            if let Some(rule) = self.tables.default_reduce[state] {
                log::trace!("Reduce {} (default)", rule);
                self.reduce(rule, &mut states, &mut nodes)?;
                self.stats.default_reductions += 1;
                continue;
            }
            let symbol = self.peek(scanner)?.symbol;
            match self.tables.action(state, symbol) {
                ParserAction::Shift(next) => {
                    log::trace!("Shift {}", next);
                    let token = self
                        .lookahead
                        .take()
                        .ok_or_else(|| anyhow!("no lookahead"))?;
                    nodes.push(Node::Leaf(token));
                    states.push(next);
                    self.stats.shifts += 1;
                }
                ParserAction::Reduce(rule) => {
                    log::trace!("Reduce {}", rule);
                    self.reduce(rule, &mut states, &mut nodes)?;
                }
                ParserAction::Accept => {
                    log::trace!("Accept");
                    if self.lookahead.as_ref().is_some_and(Token::is_eoi) {
                        self.lookahead = None;
                    }
                    let root = nodes.pop().ok_or_else(|| anyhow!("stack underflow"))?;
                    if !nodes.is_empty() {
                        bail!("{} symbols left on the stack", nodes.len());
                    }
                    return Ok(root);
                }
                ParserAction::Error => {
                    let token = self.lookahead.take().ok_or_else(|| anyhow!("no lookahead"))?;
                    if token.is_eoi() {
                        bail!("unexpected end of input at {}", token.span.start);
                    }
                    bail!("unexpected `{}' at {}", token.text, token.span);
                }
            }
        }
    }

    fn reduce(&mut self, rule: usize, states: &mut Vec<usize>, nodes: &mut Vec<Node>) -> Result<()> {
        let len = self.tables.rule_len[rule];
        if nodes.len() < len {
            bail!("stack underflow reducing rule {}", rule);
        }
        let children = nodes.split_off(nodes.len() - len);
        states.truncate(states.len() - len);
        let left = self.tables.rule_left[rule];
        let top = states[states.len() - 1];
        let Some(next) = self.tables.goto(top, left) else {
            bail!("no goto from state {} on symbol {}", top, left);
        };
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => first.span().merge(&last.span()),
            _ => {
                let at = self
                    .lookahead
                    .as_ref()
                    .map_or_else(Default::default, |t| t.span.start);
                Span::new(at, at)
            }
        };
        nodes.push(Node::Branch {
            rule,
            symbol: left,
            span,
            children,
        });
        states.push(next);
        self.stats.reductions += 1;
        Ok(())
    }

    fn dump_state(states: &[usize], nodes: &[Node]) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        let mut output = String::new();
        for (state, node) in states.iter().zip(nodes) {
            let _ = write!(output, "<{}> {} ", state, node.symbol());
        }
        if let Some(state) = states.last() {
            let _ = write!(output, "<{}>", state);
        }
        log::trace!("{}", output);
    }
}
