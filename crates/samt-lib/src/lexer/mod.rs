//! Hand-rolled lexer for the SAMT interface-definition language.
//!
//! [`Lexer`] is a pull-based iterator: consuming it drives incremental reads
//! over the source text, and the stream is terminated by exactly one
//! [`TokenKind::End`]. Malformed-but-recoverable constructs produce a
//! best-effort token (overflowed integer → 0, unknown escape → dropped
//! character, missing fraction → 0) and keep scanning; only a genuinely
//! unrecognized character is fatal.
//!
//! Disambiguation that needs lookahead:
//! - `1..2` vs `1.2`: a decimal point is consumed only when it is not
//!   immediately followed by a second `.`
//! - `record` vs `^record`: the escape caret forces identifier interpretation
//! - `/` alone vs `//` and `/*`: comments are recognized before punctuation

mod token;


pub use token::{Token, TokenKind};

use std::sync::Arc;

use samt_core::{DiagnosticContext, DiagnosticError, FileOffset, Location, SourceFile};

pub struct Lexer<'a> {
    source: Arc<SourceFile>,
    ctx: &'a mut DiagnosticContext,
    pos: usize,
    row: usize,
    col: usize,
    /// Start of the token currently being read.
    token_start: FileOffset,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: Arc<SourceFile>, ctx: &'a mut DiagnosticContext) -> Self {
        debug_assert_eq!(source.id(), ctx.source_id());
        Self {
            source,
            ctx,
            pos: 0,
            row: 0,
            col: 0,
            token_start: FileOffset::new(0, 0, 0),
            finished: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.content()[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source.content()[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.row += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn offset(&self) -> FileOffset {
        FileOffset::new(self.pos, self.row, self.col)
    }

    fn window(&self) -> Location {
        Location::new(self.source.id(), self.token_start, self.offset())
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.window())
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.advance();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => self.skip_block_comment(),
                _ => return,
            }
        }
    }

    /// Block comments nest. Openers are tracked so an unterminated comment
    /// can report every unmatched `/*`.
    fn skip_block_comment(&mut self) {
        let mut openers: Vec<Location> = Vec::new();

        let start = self.offset();
        self.advance();
        self.advance();
        openers.push(Location::new(self.source.id(), start, self.offset()));

        while let Some(ch) = self.peek() {
            if ch == '*' && self.peek_second() == Some('/') {
                self.advance();
                self.advance();
                openers.pop();
                if openers.is_empty() {
                    return;
                }
            } else if ch == '/' && self.peek_second() == Some('*') {
                let start = self.offset();
                self.advance();
                self.advance();
                openers.push(Location::new(self.source.id(), start, self.offset()));
            } else {
                self.advance();
            }
        }

        // EOF with unmatched openers, reported innermost last.
        let mut builder = self.ctx.error("block comment is never closed");
        for opener in openers {
            builder = builder.highlight_msg("comment opened here", opener);
        }
        builder.emit();
    }

    fn read_token(&mut self) -> Result<Token, DiagnosticError> {
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(self.token(TokenKind::End)),
        };

        if let Some(kind) = punctuation(ch) {
            self.advance();
            if kind == TokenKind::Period && self.peek() == Some('.') {
                self.advance();
                return Ok(self.token(TokenKind::DoublePeriod));
            }
            return Ok(self.token(kind));
        }

        match ch {
            '0'..='9' => Ok(self.read_number(false)),
            '-' => {
                self.advance();
                if matches!(self.peek(), Some('0'..='9' | '.')) {
                    Ok(self.read_number(true))
                } else {
                    self.unrecognized('-')
                }
            }
            '"' => Ok(self.read_string()),
            ch if ch.is_ascii_alphabetic() => Ok(self.read_identifier_or_keyword()),
            '^' => Ok(self.read_escaped_identifier()),
            other => self.unrecognized(other),
        }
    }

    fn unrecognized(&mut self, ch: char) -> Result<Token, DiagnosticError> {
        self.advance();
        let window = self.window();
        Err(self
            .ctx
            .error(format!(
                "unrecognized character '{ch}' (0x{:X})",
                ch as u32
            ))
            .highlight(window)
            .fatal())
    }

    fn read_digits(&mut self, into: &mut String) {
        while let Some(ch @ '0'..='9') = self.peek() {
            into.push(ch);
            self.advance();
        }
    }

    fn read_number(&mut self, negative: bool) -> Token {
        let mut whole = String::new();
        if negative {
            whole.push('-');
        }
        self.read_digits(&mut whole);

        let missing_whole = whole.trim_start_matches('-').is_empty();
        if missing_whole {
            whole.push('0');
        }

        // A second period means the range operator, not a decimal point.
        let is_float = self.peek() == Some('.') && self.peek_second() != Some('.');
        if !is_float {
            let window = self.window();
            if missing_whole {
                // Unreachable through normal dispatch, kept for the `-.` case.
                self.ctx
                    .error("number is missing a whole part, assuming 0")
                    .highlight(window)
                    .emit();
            }
            let value = whole.parse::<i64>().unwrap_or_else(|_| {
                self.ctx
                    .error("integer literal does not fit into a 64-bit signed integer, assuming 0")
                    .highlight(window)
                    .emit();
                0
            });
            return self.token(TokenKind::Integer(value));
        }

        self.advance();
        let mut fraction = String::new();
        self.read_digits(&mut fraction);

        let window = self.window();
        if missing_whole {
            self.ctx
                .error("number is missing a whole part, assuming 0")
                .highlight(window)
                .emit();
        }
        if fraction.is_empty() {
            fraction.push('0');
            self.ctx
                .error("number is missing a fraction part, assuming 0")
                .highlight(window)
                .emit();
        }

        let text = format!("{whole}.{fraction}");
        let value = text.parse::<f64>().unwrap_or_else(|_| {
            self.ctx
                .error("malformed floating point literal, assuming 0")
                .highlight(window)
                .emit();
            0.0
        });
        self.token(TokenKind::Float(value))
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let word = self.read_word();
        match TokenKind::keyword(&word) {
            Some(keyword) => self.token(keyword),
            None => self.token(TokenKind::Identifier(word)),
        }
    }

    /// `^word` always lexes as an identifier. Escaping a word that is not a
    /// keyword is pointless and gets a warning.
    fn read_escaped_identifier(&mut self) -> Token {
        self.advance();
        if !matches!(self.peek(), Some(ch) if ch.is_ascii_alphabetic()) {
            let window = self.window();
            self.ctx
                .error("expected an identifier after the escape caret")
                .highlight(window)
                .emit();
            return self.token(TokenKind::Identifier(String::new()));
        }

        let word = self.read_word();
        if TokenKind::keyword(&word).is_none() {
            let window = self.window();
            self.ctx
                .warn(format!("identifier '{word}' is unnecessarily escaped"))
                .highlight(window)
                .suggest(word.clone())
                .emit();
        }
        self.token(TokenKind::Identifier(word))
    }

    fn read_string(&mut self) -> Token {
        self.advance();
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    let window = self.window();
                    self.ctx
                        .error("string literal is never closed")
                        .highlight(window)
                        .emit();
                    return self.token(TokenKind::String(value));
                }
                Some('"') => {
                    self.advance();
                    return self.token(TokenKind::String(value));
                }
                Some('\\') => {
                    let escape_start = self.offset();
                    self.advance();
                    match self.advance() {
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('n') => value.push('\n'),
                        Some('b') => value.push('\u{0008}'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some(other) => {
                            // The escaped character is dropped.
                            let escape =
                                Location::new(self.source.id(), escape_start, self.offset());
                            self.ctx
                                .error(format!("invalid escape sequence '\\{other}'"))
                                .highlight(escape)
                                .emit();
                        }
                        None => {}
                    }
                }
                Some(other) => {
                    value.push(other);
                    self.advance();
                }
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, DiagnosticError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.skip_trivia();
        self.token_start = self.offset();

        let item = self.read_token();
        match &item {
            Ok(token) if token.kind == TokenKind::End => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(item)
    }
}

fn punctuation(ch: char) -> Option<TokenKind> {
    Some(match ch {
        '{' => TokenKind::OpenBrace,
        '}' => TokenKind::CloseBrace,
        '[' => TokenKind::OpenBracket,
        ']' => TokenKind::CloseBracket,
        '(' => TokenKind::OpenParen,
        ')' => TokenKind::CloseParen,
        ',' => TokenKind::Comma,
        ':' => TokenKind::Colon,
        '.' => TokenKind::Period,
        '*' => TokenKind::Asterisk,
        '@' => TokenKind::AtSign,
        '=' => TokenKind::Equals,
        '<' => TokenKind::LessThan,
        '>' => TokenKind::GreaterThan,
        '?' => TokenKind::QuestionMark,
        '/' => TokenKind::ForwardSlash,
        _ => return None,
    })
}
