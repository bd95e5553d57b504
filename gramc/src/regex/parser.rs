//! Recursive-descent parser over [`RegexLexer`] tokens.
//!
//! ```text
//! regex   := alt
//! alt     := seq ('|' seq)*
//! seq     := term*
//! term    := setexpr quantifier*
//! setexpr := primary (setop primary)*
//! primary := char | class | '.' | '{name}' | '{eoi}' | group | '[' items ']'
//! ```
//!
//! Errors never stop the parse: the offending part is replaced with a
//! [`RegexKind::Placeholder`] and parsing resumes, so a single pass reports
//! every problem it can find.

use super::ast::{ClassSet, RegexKind, RegexNode, TextRange};
use super::charset::CharSet;
use super::lexer::{Lexeme, RegexLexer, Token};

pub(crate) type ParseIssue = (std::string::String, TextRange);

struct Parser<'s> {
    lexer: RegexLexer<'s>,
    peeked: Option<Lexeme>,
    len: usize,
    issues: Vec<ParseIssue>,
}

/// Parses `text`, returning the tree and every problem found.
pub(crate) fn parse(text: &str) -> (RegexNode, Vec<ParseIssue>) {
    let mut parser = Parser {
        lexer: RegexLexer::new(text),
        peeked: None,
        len: text.len(),
        issues: Vec::new(),
    };
    let mut root = parser.parse_alt();
    while let Some(lexeme) = parser.bump() {
        parser.error("unbalanced `)'", lexeme.range);
        let rest = parser.parse_alt();
        let range = root.range.cover(rest.range);
        root = RegexNode::new(RegexKind::Seq(vec![root, rest]), range);
    }
    (root, parser.issues)
}

impl Parser<'_> {
    fn peek(&mut self) -> Option<&Token> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_lexeme();
        }
        self.peeked.as_ref().map(|l| &l.token)
    }

    fn bump(&mut self) -> Option<Lexeme> {
        match self.peeked.take() {
            Some(l) => Some(l),
            None => self.lexer.next_lexeme(),
        }
    }

    fn offset(&mut self) -> usize {
        self.peek();
        self.peeked.as_ref().map_or(self.len, |l| l.range.start)
    }

    fn error(&mut self, message: impl Into<std::string::String>, range: TextRange) {
        self.issues.push((message.into(), range));
    }

    fn placeholder(&mut self, message: impl Into<std::string::String>, range: TextRange) -> RegexNode {
        self.error(message, range);
        RegexNode::new(RegexKind::Placeholder, range)
    }

    fn parse_alt(&mut self) -> RegexNode {
        let mut alternatives = vec![self.parse_seq()];
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            alternatives.push(self.parse_seq());
        }
        if alternatives.len() == 1 {
            return alternatives.remove(0);
        }
        let range = cover_all(&alternatives);
        RegexNode::new(RegexKind::Alt(alternatives), range)
    }

    fn parse_seq(&mut self) -> RegexNode {
        let mut items = Vec::new();
        while !matches!(self.peek(), None | Some(Token::Or) | Some(Token::RParen)) {
            items.push(self.parse_term());
        }
        match items.len() {
            0 => {
                let at = self.offset();
                RegexNode::new(RegexKind::Empty, TextRange::new(at, at))
            }
            1 => items.remove(0),
            _ => {
                let range = cover_all(&items);
                RegexNode::new(RegexKind::Seq(items), range)
            }
        }
    }

    fn parse_term(&mut self) -> RegexNode {
        let mut node = self.parse_set_expr();
        loop {
            let (min, max) = match self.peek() {
                Some(Token::Star) => (0, None),
                Some(Token::Plus) => (1, None),
                Some(Token::Quest) => (0, Some(1)),
                Some(Token::Repeat { min, max }) => (*min, *max),
                _ => break,
            };
            let Some(lexeme) = self.bump() else { break };
            let range = node.range.cover(lexeme.range);
            let (min, max) = match max {
                Some(max) if max < min => {
                    self.error(
                        format!("bad repetition bounds {{{},{}}}", min, max),
                        lexeme.range,
                    );
                    (min, Some(min))
                }
                _ => (min, max),
            };
            node = RegexNode::new(
                RegexKind::Repeat {
                    inner: Box::new(node),
                    min,
                    max,
                },
                range,
            );
        }
        node
    }

    fn parse_set_expr(&mut self) -> RegexNode {
        let mut left = self.parse_primary();
        while let Some(Token::SetOp(op)) = self.peek() {
            let op = *op;
            self.bump();
            let right = if matches!(self.peek(), None | Some(Token::Or) | Some(Token::RParen)) {
                let at = self.offset();
                self.placeholder("missing right operand of set operator", TextRange::new(at, at))
            } else {
                self.parse_primary()
            };
            let range = left.range.cover(right.range);
            left = RegexNode::new(
                RegexKind::SetAlgebra {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range,
            );
        }
        left
    }

    fn parse_primary(&mut self) -> RegexNode {
        let Some(Lexeme { token, range }) = self.bump() else {
            let at = self.len;
            return self.placeholder("unexpected end of regex", TextRange::new(at, at));
        };
        match token {
            Token::Char(c) => RegexNode::new(RegexKind::Char(c), range),
            Token::Set(set) => RegexNode::new(RegexKind::Set(set), range),
            Token::Any => RegexNode::new(RegexKind::Any, range),
            Token::Eoi => RegexNode::new(RegexKind::Eoi, range),
            Token::Expand(name) => RegexNode::new(RegexKind::Expand(name), range),
            Token::LParen => self.parse_group(range, |inner| RegexKind::Group { flags: None, inner }),
            Token::LParenFlags(flags) => self.parse_group(range, move |inner| RegexKind::Group {
                flags: Some(flags),
                inner,
            }),
            Token::LParenNot => self.parse_group(range, RegexKind::NotFollowedBy),
            Token::LBrack { negated } => self.parse_class(range, negated),
            Token::Star | Token::Plus | Token::Quest | Token::Repeat { .. } => {
                self.placeholder("quantifier without operand", range)
            }
            Token::SetOp(_) => self.placeholder("set operator without left operand", range),
            Token::Invalid(message) => self.placeholder(message, range),
            Token::Or | Token::RParen | Token::RBrack | Token::RangeDash => {
                self.placeholder("unexpected token", range)
            }
        }
    }

    fn parse_group(
        &mut self,
        open: TextRange,
        make: impl FnOnce(Box<RegexNode>) -> RegexKind,
    ) -> RegexNode {
        let inner = self.parse_alt();
        let end = match self.peek() {
            Some(Token::RParen) => self.bump().map_or(self.len, |l| l.range.end),
            _ => {
                self.error("unterminated group", TextRange::new(open.start, self.len));
                self.len
            }
        };
        RegexNode::new(make(Box::new(inner)), TextRange::new(open.start, end))
    }

    fn parse_class(&mut self, open: TextRange, negated: bool) -> RegexNode {
        let mut class = ClassSet::default();
        let mut end = None;
        let mut prev: Option<u32> = None;
        while let Some(Lexeme { token, range }) = self.bump() {
            match token {
                Token::RBrack => {
                    end = Some(range.end);
                    break;
                }
                Token::Char(c) => {
                    class.add(ClassSet::of(CharSet::single(c)));
                    prev = Some(c);
                    continue;
                }
                Token::Set(item) => class.add(item),
                Token::RangeDash => match (prev, self.peek()) {
                    (Some(lo), Some(Token::Char(hi))) => {
                        let hi = *hi;
                        let hi_range = self.bump().map_or(range, |l| l.range);
                        if lo > hi {
                            self.error("invalid character range", range.cover(hi_range));
                        } else {
                            class.add(ClassSet::of(CharSet::range(lo, hi)));
                        }
                    }
                    (Some(_), Some(Token::Set(_))) => {
                        let bad = self.bump().map_or(range, |l| l.range);
                        self.error("character class cannot end a range", range.cover(bad));
                    }
                    _ => class.add(ClassSet::of(CharSet::single('-' as u32))),
                },
                Token::Invalid(message) => self.error(message, range),
                other => self.error(format!("unexpected {:?} in character class", other), range),
            }
            prev = None;
        }
        let Some(end) = end else {
            self.error(
                "unterminated character class",
                TextRange::new(open.start, self.len),
            );
            return RegexNode::new(RegexKind::Placeholder, TextRange::new(open.start, self.len));
        };
        let range = TextRange::new(open.start, end);
        if class.is_empty() && !negated {
            self.error("empty character class", range);
        }
        class.negated = negated;
        RegexNode::new(RegexKind::Set(class), range)
    }
}

fn cover_all(nodes: &[RegexNode]) -> TextRange {
    nodes
        .iter()
        .map(|n| n.range)
        .reduce(TextRange::cover)
        .unwrap_or_default()
}
