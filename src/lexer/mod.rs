mod error;
mod token;

pub use error::{LexicalError, LexicalErrorKind};
pub use token::{Token, KEYWORD_HASHMAP};

use compact_str::CompactString;

/// Number of spaces per indentation level.
const INDENT_STEP: usize = 2;

static EOF_TOKEN: Token = Token::Eof;

/// The fully materialized token sequence of one source text, together with a
/// cursor for the parser.
///
/// The sequence always ends with exactly one [`Token::Eof`]. Every
/// [`Token::Indent`] is balanced by a later [`Token::Dedent`], and the last
/// content token of the input is followed by a [`Token::Newline`] even when
/// the text does not end with one.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenStream {
    /// Tokenizes `source` in full, failing on the first malformed byte.
    pub fn lex(source: &str) -> Result<Self, LexicalError> {
        let tokens = Scanner::new(source).run()?;
        Ok(Self { tokens, cursor: 0 })
    }

    /// The token under the cursor, or `Eof` once the sequence is exhausted.
    pub fn current(&self) -> &Token {
        self.tokens.get(self.cursor).unwrap_or(&EOF_TOKEN)
    }

    /// Moves the cursor forward and returns the new current token.
    pub fn advance(&mut self) -> &Token {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        self.current()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Rewinds the cursor to a position previously obtained from
    /// [`TokenStream::position`].
    pub fn rewind(&mut self, position: usize) {
        self.cursor = position;
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Byte-level scanner producing the token sequence line by line.
#[derive(Debug)]
struct Scanner<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: u32,
    /// Indentation of the current logical block, in spaces.
    indent: usize,
    tokens: Vec<Token>,
}

impl<'src> Scanner<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            indent: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexicalError> {
        while self.begin_line()? {
            self.lex_line()?;
        }
        // Close the last logical line and every open block before `Eof`.
        if self.tokens.last().is_some_and(|last| *last != Token::Newline) {
            self.tokens.push(Token::Newline);
        }
        for _ in 0..self.indent / INDENT_STEP {
            self.tokens.push(Token::Dedent);
        }
        self.tokens.push(Token::Eof);
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, kind: LexicalErrorKind) -> LexicalError {
        LexicalError {
            kind,
            line: self.line,
            offset: self.pos,
        }
    }

    /// Positions the scanner at the first content byte of the next
    /// non-empty line and emits the indent/dedent run for it. Blank lines
    /// and comment-only lines produce no tokens at all. Returns `false`
    /// once the input is exhausted.
    fn begin_line(&mut self) -> Result<bool, LexicalError> {
        loop {
            let mut spaces = 0;
            while self.peek() == Some(b' ') {
                self.pos += 1;
                spaces += 1;
            }
            match self.peek() {
                Option::None => return Ok(false),
                Some(b'\n') => self.consume_newline(),
                Some(b'#') => {
                    self.skip_comment();
                    if self.peek() == Some(b'\n') {
                        self.consume_newline();
                    }
                }
                Some(_) => {
                    self.emit_indent(spaces)?;
                    return Ok(true);
                }
            }
        }
    }

    fn consume_newline(&mut self) {
        self.pos += 1;
        self.line += 1;
    }

    fn skip_comment(&mut self) {
        while self.peek().is_some_and(|byte| byte != b'\n') {
            self.pos += 1;
        }
    }

    fn emit_indent(&mut self, spaces: usize) -> Result<(), LexicalError> {
        let delta = spaces as isize - self.indent as isize;
        if delta % INDENT_STEP as isize != 0 {
            return Err(self.error(LexicalErrorKind::UnevenIndent { delta }));
        }
        let token = if delta > 0 { Token::Indent } else { Token::Dedent };
        for _ in 0..delta.unsigned_abs() / INDENT_STEP {
            self.tokens.push(token.clone());
        }
        self.indent = spaces;
        Ok(())
    }

    /// Lexes tokens until the terminating `Newline` has been emitted or the
    /// input ends mid-line.
    fn lex_line(&mut self) -> Result<(), LexicalError> {
        loop {
            while self.peek() == Some(b' ') {
                self.pos += 1;
            }
            let Some(byte) = self.peek() else {
                return Ok(());
            };
            match byte {
                b'\n' => {
                    self.consume_newline();
                    self.tokens.push(Token::Newline);
                    return Ok(());
                }
                b'#' => self.skip_comment(),
                b'\'' | b'"' => self.lex_string(byte)?,
                b'0'..=b'9' => self.lex_number()?,
                _ if is_special_sign(byte) => self.lex_sign(byte),
                _ if byte.is_ascii_alphabetic() || byte == b'_' => self.lex_word(),
                _ => {
                    let c = self.source[self.pos..]
                        .chars()
                        .next()
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Err(self.error(LexicalErrorKind::Unrecognized(c)));
                }
            }
        }
    }

    /// Copies the literal's bytes verbatim; there is no escape processing.
    /// The closing quote must appear on the same physical line.
    fn lex_string(&mut self, quote: u8) -> Result<(), LexicalError> {
        let opening = self.pos;
        self.pos += 1;
        let begin = self.pos;
        while let Some(byte) = self.peek() {
            if byte == quote {
                let value = CompactString::from(&self.source[begin..self.pos]);
                self.pos += 1;
                self.tokens.push(Token::String(value));
                return Ok(());
            }
            if byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
        Err(LexicalError {
            kind: LexicalErrorKind::UnclosedString,
            line: self.line,
            offset: opening,
        })
    }

    fn lex_number(&mut self) -> Result<(), LexicalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let digits = &self.source[start..self.pos];
        let value: i32 = digits.parse().map_err(|_| LexicalError {
            kind: LexicalErrorKind::NumberOutOfRange(digits.into()),
            line: self.line,
            offset: start,
        })?;
        self.tokens.push(Token::Number(value));
        Ok(())
    }

    /// A punctuation byte, possibly fused with a following `=` into one of
    /// the two-character operators.
    fn lex_sign(&mut self, byte: u8) {
        self.pos += 1;
        if self.peek() == Some(b'=') {
            let operator = match byte {
                b'=' => Some(Token::Eq),
                b'!' => Some(Token::NotEq),
                b'<' => Some(Token::LessOrEq),
                b'>' => Some(Token::GreaterOrEq),
                _ => Option::None,
            };
            if let Some(operator) = operator {
                self.pos += 1;
                self.tokens.push(operator);
                return;
            }
        }
        self.tokens.push(Token::Char(byte as char));
    }

    fn lex_word(&mut self) {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
        {
            self.pos += 1;
        }
        let word = &self.source[start..self.pos];
        match KEYWORD_HASHMAP.get(word) {
            Some(keyword) => self.tokens.push(keyword.clone()),
            Option::None => self.tokens.push(Token::Id(word.into())),
        }
    }
}

fn is_special_sign(byte: u8) -> bool {
    matches!(
        byte,
        b':' | b'(' | b')' | b',' | b'.' | b'+' | b'-' | b'*' | b'/' | b'!' | b'>' | b'<' | b'='
    )
}
