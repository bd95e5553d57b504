//! Tokenizer for lexical-rule regexes.
//!
//! Two [`logos`] token sets share one source: [`Outer`] for the regex body and
//! [`InSet`] inside a bracket expression. [`RegexLexer`] morphs between them
//! when it sees `[` or `]` and also tracks whether the previous token ended an
//! atom, since `*`, `+` and `?` only quantify something that precedes them.
//!
//! # Example
//!
//! ```text
//! a*[x-z]{ident}
//! ```
//!
//! produces `Char('a') Star LBrack Char('x') RangeDash Char('z') RBrack Expand("ident")`.

use super::ast::{ClassSet, FlagChange, SetOp, TextRange};
use super::charset::{CharSet, DIGIT, SPACE, WORD};
use logos::Logos;
use regex_syntax::hir::{Class, HirKind};
use smartstring::alias::String;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Outer {
    #[regex(r"[^()\[\]\.|\\*?+]")]
    Char,

    #[regex(r"\\[^\r\n\t0-9a-zA-Z]")]
    #[regex(r"\\[abfnrtv]")]
    #[regex(r"\\[0-7][0-7][0-7]")]
    #[regex(r"\\x[0-9a-fA-F][0-9a-fA-F]")]
    #[regex(r"\\u[0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F]")]
    #[regex(r"\\U[0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F]")]
    #[regex(r"\\[wWsSdD]")]
    #[regex(r"\\[pP]\{[A-Za-z0-9_=]+\}")]
    Escape,

    #[regex(r"\\(.|\n)?", priority = 1)]
    BadEscape,

    #[token(".")]
    Dot,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("?")]
    Quest,
    #[regex(r"\{[0-9]+(,[0-9]*)?\}")]
    Repeat,

    #[token("{-}")]
    Difference,
    #[token("{+}")]
    Union,
    #[token("{&&}")]
    Intersection,

    #[regex(r"\{[A-Za-z_][A-Za-z_0-9\-]*\}")]
    Expand,

    #[token("(")]
    LParen,
    #[regex(r"\(\?[is\-]+:")]
    LParenFlags,
    #[token("(?!")]
    LParenNot,
    #[token("|")]
    Or,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("[^")]
    LBrackNeg,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum InSet {
    #[regex(r"[^\]\\\-]")]
    Char,

    #[regex(r"\\[^\r\n\t0-9a-zA-Z]")]
    #[regex(r"\\[abfnrtv]")]
    #[regex(r"\\[0-7][0-7][0-7]")]
    #[regex(r"\\x[0-9a-fA-F][0-9a-fA-F]")]
    #[regex(r"\\u[0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F]")]
    #[regex(r"\\U[0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F]")]
    #[regex(r"\\[wWsSdD]")]
    #[regex(r"\\[pP]\{[A-Za-z0-9_=]+\}")]
    Escape,

    #[regex(r"\\(.|\n)?", priority = 1)]
    BadEscape,

    #[token("-")]
    Dash,
    #[token("]")]
    RBrack,
}

/// Tokens seen by the regex parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Char(u32),
    Set(ClassSet),
    Any,
    Star,
    Plus,
    Quest,
    Repeat { min: u32, max: Option<u32> },
    SetOp(SetOp),
    Expand(String),
    Eoi,
    LParen,
    LParenFlags(FlagChange),
    LParenNot,
    Or,
    RParen,
    LBrack { negated: bool },
    RBrack,
    RangeDash,
    Invalid(std::string::String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub token: Token,
    pub range: TextRange,
}

enum Mode<'s> {
    Outer(logos::Lexer<'s, Outer>),
    InSet(logos::Lexer<'s, InSet>),
    Switching,
}

pub(crate) struct RegexLexer<'s> {
    mode: Mode<'s>,
    after_atom: bool,
}

impl<'s> RegexLexer<'s> {
    pub fn new(text: &'s str) -> Self {
        Self {
            mode: Mode::Outer(Outer::lexer(text)),
            after_atom: false,
        }
    }

    fn switch_mode(&mut self) {
        self.mode = match std::mem::replace(&mut self.mode, Mode::Switching) {
            Mode::Outer(lex) => Mode::InSet(lex.morph()),
            Mode::InSet(lex) => Mode::Outer(lex.morph()),
            Mode::Switching => Mode::Switching,
        };
    }

    pub fn next_lexeme(&mut self) -> Option<Lexeme> {
        let (token, range) = match &mut self.mode {
            Mode::Outer(lex) => {
                let tok = lex.next()?;
                let span = lex.span();
                (outer_token(tok, lex.slice()), TextRange::new(span.start, span.end))
            }
            Mode::InSet(lex) => {
                let tok = lex.next()?;
                let span = lex.span();
                (set_token(tok, lex.slice()), TextRange::new(span.start, span.end))
            }
            Mode::Switching => return None,
        };

        let token = match token {
            Token::Star if !self.after_atom => Token::Char('*' as u32),
            Token::Plus if !self.after_atom => Token::Char('+' as u32),
            Token::Quest if !self.after_atom => Token::Char('?' as u32),
            other => other,
        };

        match &token {
            Token::LBrack { .. } => {
                self.switch_mode();
                self.after_atom = false;
            }
            Token::RBrack => {
                self.switch_mode();
                self.after_atom = true;
            }
            Token::Char(_)
            | Token::Set(_)
            | Token::Any
            | Token::Expand(_)
            | Token::RParen
            | Token::Invalid(_) => self.after_atom = true,
            Token::Star
            | Token::Plus
            | Token::Quest
            | Token::Repeat { .. }
            | Token::SetOp(_)
            | Token::Eoi
            | Token::LParen
            | Token::LParenFlags(_)
            | Token::LParenNot
            | Token::Or
            | Token::RangeDash => self.after_atom = false,
        }

        log::trace!("regex token {:?} at {}..{}", token, range.start, range.end);
        Some(Lexeme { token, range })
    }
}

impl Iterator for RegexLexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        self.next_lexeme()
    }
}

fn outer_token(tok: Result<Outer, ()>, slice: &str) -> Token {
    let Ok(tok) = tok else {
        return Token::Invalid(format!("unexpected `{}'", slice));
    };
    match tok {
        Outer::Char => first_char(slice),
        Outer::Escape => decode_escape(slice),
        Outer::BadEscape => bad_escape(slice),
        Outer::Dot => Token::Any,
        Outer::Star => Token::Star,
        Outer::Plus => Token::Plus,
        Outer::Quest => Token::Quest,
        Outer::Repeat => decode_repeat(slice),
        Outer::Difference => Token::SetOp(SetOp::Difference),
        Outer::Union => Token::SetOp(SetOp::Union),
        Outer::Intersection => Token::SetOp(SetOp::Intersection),
        Outer::Expand => {
            let name = &slice[1..slice.len() - 1];
            if name == "eoi" {
                Token::Eoi
            } else {
                Token::Expand(name.into())
            }
        }
        Outer::LParen => Token::LParen,
        Outer::LParenFlags => Token::LParenFlags(decode_flags(slice)),
        Outer::LParenNot => Token::LParenNot,
        Outer::Or => Token::Or,
        Outer::RParen => Token::RParen,
        Outer::LBrack => Token::LBrack { negated: false },
        Outer::LBrackNeg => Token::LBrack { negated: true },
    }
}

fn set_token(tok: Result<InSet, ()>, slice: &str) -> Token {
    let Ok(tok) = tok else {
        return Token::Invalid(format!("unexpected `{}'", slice));
    };
    match tok {
        InSet::Char => first_char(slice),
        InSet::Escape => decode_escape(slice),
        InSet::BadEscape => bad_escape(slice),
        InSet::Dash => Token::RangeDash,
        InSet::RBrack => Token::RBrack,
    }
}

fn first_char(slice: &str) -> Token {
    match slice.chars().next() {
        Some(c) => Token::Char(c as u32),
        None => Token::Invalid("empty token".into()),
    }
}

fn bad_escape(slice: &str) -> Token {
    if slice.len() <= 1 {
        Token::Invalid("trailing backslash".into())
    } else {
        Token::Invalid(format!("invalid escape sequence `{}'", slice))
    }
}

fn decode_escape(slice: &str) -> Token {
    let body = &slice[1..];
    let Some(c) = body.chars().next() else {
        return bad_escape(slice);
    };
    let rest = &body[c.len_utf8()..];
    match c {
        'a' => Token::Char(0x07),
        'b' => Token::Char(0x08),
        'f' => Token::Char(0x0C),
        'n' => Token::Char(0x0A),
        'r' => Token::Char(0x0D),
        't' => Token::Char(0x09),
        'v' => Token::Char(0x0B),
        '0'..='7' => match u32::from_str_radix(body, 8) {
            Ok(v) => Token::Char(v),
            Err(_) => bad_escape(slice),
        },
        'x' | 'u' | 'U' => match u32::from_str_radix(rest, 16) {
            Ok(v) if char::from_u32(v).is_some() => Token::Char(v),
            _ => Token::Invalid(format!("unicode code point is out of range: {}", slice)),
        },
        'w' => Token::Set(ClassSet::of(WORD.clone())),
        'W' => Token::Set(ClassSet::not(WORD.clone())),
        's' => Token::Set(ClassSet::of(SPACE.clone())),
        'S' => Token::Set(ClassSet::not(SPACE.clone())),
        'd' => Token::Set(ClassSet::of(DIGIT.clone())),
        'D' => Token::Set(ClassSet::not(DIGIT.clone())),
        'p' | 'P' => {
            let name = rest.trim_start_matches('{').trim_end_matches('}');
            match unicode_property(name) {
                Some(set) if c == 'P' => Token::Set(ClassSet::not(set)),
                Some(set) => Token::Set(ClassSet::of(set)),
                None => Token::Invalid(format!("unsupported Unicode property `{}'", name)),
            }
        }
        other => Token::Char(other as u32),
    }
}

fn decode_repeat(slice: &str) -> Token {
    let body = &slice[1..slice.len() - 1];
    let (min, max) = match body.split_once(',') {
        None => (body, Some(body)),
        Some((min, "")) => (min, None),
        Some((min, max)) => (min, Some(max)),
    };
    let Ok(min) = min.parse::<u32>() else {
        return Token::Invalid(format!("repetition count is too large: {}", slice));
    };
    let max = match max.map(str::parse::<u32>) {
        None => None,
        Some(Ok(max)) => Some(max),
        Some(Err(_)) => {
            return Token::Invalid(format!("repetition count is too large: {}", slice));
        }
    };
    Token::Repeat { min, max }
}

fn decode_flags(slice: &str) -> FlagChange {
    let mut change = FlagChange::default();
    let mut on = true;
    for c in slice[2..slice.len() - 1].chars() {
        match c {
            '-' => on = false,
            'i' => change.case_insensitive = Some(on),
            's' => change.dot_all = Some(on),
            _ => {}
        }
    }
    change
}

/// Resolves `\p{name}` through `regex-syntax`'s Unicode tables.
pub(crate) fn unicode_property(name: &str) -> Option<CharSet> {
    let hir = regex_syntax::parse(&format!(r"\p{{{}}}", name)).ok()?;
    match hir.kind() {
        HirKind::Class(Class::Unicode(class)) => Some(CharSet::from_ranges(
            class
                .ranges()
                .iter()
                .map(|r| (r.start() as u32, r.end() as u32)),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token> {
        RegexLexer::new(text).map(|l| l.token).collect()
    }

    fn ch(c: char) -> Token {
        Token::Char(c as u32)
    }

    #[test]
    fn quantifiers_need_an_atom() {
        assert_eq!(tokens("a*"), vec![ch('a'), Token::Star]);
        assert_eq!(tokens("*a"), vec![ch('*'), ch('a')]);
        assert_eq!(tokens("a+?"), vec![ch('a'), Token::Plus, ch('?')]);
        assert_eq!(tokens("(?"), vec![Token::LParen, ch('?')]);
        assert_eq!(
            tokens("x{2,}"),
            vec![ch('x'), Token::Repeat { min: 2, max: None }]
        );
    }

    #[test]
    fn sets_switch_modes() {
        assert_eq!(
            tokens("[a-z]-"),
            vec![
                Token::LBrack { negated: false },
                ch('a'),
                Token::RangeDash,
                ch('z'),
                Token::RBrack,
                ch('-'),
            ]
        );
        assert_eq!(
            tokens("[^.*]+"),
            vec![
                Token::LBrack { negated: true },
                ch('.'),
                ch('*'),
                Token::RBrack,
                Token::Plus,
            ]
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(tokens(r"\n\x41\u00e9\101\."), vec![
            ch('\n'),
            ch('A'),
            ch('é'),
            ch('A'),
            ch('.'),
        ]);
        assert_eq!(tokens(r"\d"), vec![Token::Set(ClassSet::of(DIGIT.clone()))]);
        assert_eq!(tokens(r"\D"), vec![Token::Set(ClassSet::not(DIGIT.clone()))]);
        assert!(matches!(tokens(r"\q")[0], Token::Invalid(_)));
        assert!(matches!(tokens(r"\UFFFFFFFF")[0], Token::Invalid(_)));
        assert!(matches!(tokens("\\")[0], Token::Invalid(_)));
    }

    #[test]
    fn braces() {
        assert_eq!(
            tokens("{id}{eoi}{-}{&&}{+}"),
            vec![
                Token::Expand("id".into()),
                Token::Eoi,
                Token::SetOp(SetOp::Difference),
                Token::SetOp(SetOp::Intersection),
                Token::SetOp(SetOp::Union),
            ]
        );
        assert_eq!(tokens("{"), vec![ch('{')]);
    }

    #[test]
    fn flags() {
        assert_eq!(
            tokens("(?i-s:"),
            vec![Token::LParenFlags(FlagChange {
                case_insensitive: Some(true),
                dot_all: Some(false),
            })]
        );
    }

    #[test]
    fn unicode_properties() {
        let greek = unicode_property("Greek").unwrap();
        assert!(greek.contains('λ' as u32));
        assert!(!greek.contains('a' as u32));
        assert!(unicode_property("NoSuchProperty").is_none());
        match &tokens(r"\P{Greek}")[0] {
            Token::Set(s) => assert!(s.contains('a' as u32)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
