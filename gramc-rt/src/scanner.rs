use crate::error::{Position, ScanError, Span};
use gramc::lexgen::{Cell, EOI_CLASS, LexerTables};
use smartstring::alias::String;

/// A scanned token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Symbol index in the grammar the tables were built from.
    pub symbol: usize,
    /// Table action that produced the token; 0 is end of input.
    pub action: usize,
    pub text: String,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn is_eoi(&self) -> bool {
        self.action == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScannerStats {
    pub tokens: usize,
    /// Tokens that ended at a remembered backtracking point.
    pub backtracks: usize,
    /// Characters skipped after invalid input.
    pub skipped: usize,
}

/// Longest-match scanner driven by [`LexerTables`].
///
/// Yields tokens until the end-of-input token, which is produced exactly
/// once; every later call returns `Ok(None)`. On invalid input the scanner
/// skips at least one character and reports [`ScanError::InvalidToken`],
/// after which scanning may continue.
pub struct Scanner<'t, 's> {
    tables: &'t LexerTables,
    input: &'s str,
    pos: Position,
    state: usize,
    /// The last token's match ended on the end-of-input transition.
    at_eoi: bool,
    done: bool,
    pub stats: ScannerStats,
}

impl<'t, 's> Scanner<'t, 's> {
    pub fn new(tables: &'t LexerTables, input: &'s str) -> Self {
        Self {
            tables,
            input,
            pos: Position::START,
            state: 0,
            at_eoi: false,
            done: false,
            stats: ScannerStats::default(),
        }
    }

    /// Current lexer state.
    #[inline]
    pub fn state(&self) -> usize {
        self.state
    }

    /// Switches the lexer state used for the next token.
    pub fn set_state(&mut self, state: usize) -> Result<(), ScanError> {
        if state >= self.tables.state_map.len() {
            return Err(ScanError::UnknownState {
                state,
                states: self.tables.state_map.len(),
            });
        }
        log::trace!("state {} -> {}", self.state, state);
        self.state = state;
        Ok(())
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Text not scanned yet.
    #[inline]
    pub fn rest(&self) -> &'s str {
        &self.input[self.pos.offset..]
    }

    /// Scans the next token from the current position.
    ///
    /// The longest match wins; when the automaton dies past an accepting
    /// point the scanner falls back to the last backtracking entry it
    /// passed. A match that ends on the end-of-input transition is followed
    /// by the end-of-input token on the next call.
    ///
    /// # Returns
    /// - `Ok(Some(token))` for a token, including the single end-of-input
    ///   token,
    /// - `Ok(None)` once the end-of-input token has been returned.
    ///
    /// # Errors
    /// [`ScanError::InvalidToken`] when no rule matches at the current
    /// position. The offending character has been skipped by then, so
    /// calling again resumes after it.
    pub fn try_next(&mut self) -> Result<Option<Token>, ScanError> {
        if self.done {
            return Ok(None);
        }
        if self.at_eoi {
            return Ok(Some(self.eoi_token()));
        }
        let tables = self.tables;
        let rest = self.rest();
        let mut state = tables.state_map[self.state];
        log::trace!("START: lexer state={}, s={}, at {}", self.state, state, self.pos);

        // (action, byte length, ends on end of input)
        let mut backup: Option<(usize, usize, bool)> = None;
        let mut len = 0;
        let mut eoi_consumed = false;
        let matched = loop {
            let c = rest[len..].chars().next();
            let class = c.map_or(EOI_CLASS, |c| tables.class_of(c));
            let cell = match tables.cell(state, class) {
                // past the end there is nothing more to consume
                Cell::Goto(_) if eoi_consumed => Cell::Invalid,
                Cell::Backtrack { action, .. } if eoi_consumed => Cell::Accept(action),
                cell => cell,
            };
            match cell {
                Cell::Goto(next) => state = next,
                Cell::Backtrack { action, state: next } => {
                    log::trace!("MARK: i={}, action={}, s={}", len, action, state);
                    backup = Some((action, len, false));
                    state = next;
                }
                Cell::Accept(action) => break Some((action, len, eoi_consumed)),
                Cell::Invalid => {
                    if backup.is_some() {
                        self.stats.backtracks += 1;
                    }
                    break backup;
                }
            }
            match c {
                Some(c) => len += c.len_utf8(),
                None => eoi_consumed = true,
            }
        };

        match matched {
            Some((0, _, _)) => Ok(Some(self.eoi_token())),
            Some((action, len, ends_at_eoi)) => {
                let text = &rest[..len];
                let action = tables.instance(action, text).unwrap_or(action);
                let span = self.consume(len);
                self.at_eoi = ends_at_eoi;
                self.stats.tokens += 1;
                log::trace!("MATCHED: action={}, text={:?}, span={}", action, text, span);
                Ok(Some(Token {
                    symbol: tables.action_symbol[action],
                    action,
                    text: text.into(),
                    span,
                }))
            }
            None => {
                let Some(c) = rest.chars().next() else {
                    self.done = true;
                    return Err(ScanError::InvalidToken {
                        text: String::new(),
                        span: Span::new(self.pos, self.pos),
                    });
                };
                let span = self.consume(c.len_utf8());
                self.stats.skipped += 1;
                log::trace!("INVALID: {:?} at {}", c, span);
                Err(ScanError::InvalidToken {
                    text: rest[..c.len_utf8()].into(),
                    span,
                })
            }
        }
    }

    fn eoi_token(&mut self) -> Token {
        self.done = true;
        self.stats.tokens += 1;
        log::trace!("EOI at {}", self.pos);
        Token {
            symbol: self.tables.action_symbol[0],
            action: 0,
            text: String::new(),
            span: Span::new(self.pos, self.pos),
        }
    }

    fn consume(&mut self, len: usize) -> Span {
        let start = self.pos;
        let end = self.rest()[..len].chars().fold(start, Position::advance);
        self.pos = end;
        Span::new(start, end)
    }
}

impl Iterator for Scanner<'_, '_> {
    type Item = Result<Token, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().transpose()
    }
}
