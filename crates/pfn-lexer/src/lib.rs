//! Pfn lexer -- tokenizer for the Pfn programming language.
//!
//! Converts UTF-8 source text into a token stream terminated by `Eof`.
//! Whitespace and `--` line comments are skipped; everything else becomes
//! a token carrying its span. The first lexical error aborts the scan.

mod cursor;

use cursor::Cursor;
use pfn_common::error::{LexError, LexErrorKind};
use pfn_common::span::Span;
use pfn_common::token::{keyword_from_str, Token, TokenKind, TokenValue};

/// Tokenize an entire source string.
///
/// The returned vector ends with the `Eof` token, whose span is the empty
/// range at end of input. Tokens appear in source order and every span
/// satisfies `start <= end`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

/// Start-of-token bookmark: byte offset plus line/column.
#[derive(Clone, Copy)]
struct Mark {
    pos: u32,
    line: u32,
    column: u32,
}

/// The Pfn lexer. Wraps a [`Cursor`] for character iteration and
/// accumulates tokens until end of input.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
        }
    }

    /// Run the lexer to completion.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while !self.cursor.is_eof() {
            self.scan_token()?;
        }
        let eof_span = Span::empty(self.cursor.pos(), self.cursor.line(), self.cursor.column());
        self.tokens
            .push(Token::new(TokenKind::Eof, TokenValue::None, eof_span));
        Ok(self.tokens)
    }

    // ── Helpers ────────────────────────────────────────────────────────

    fn mark(&self) -> Mark {
        Mark {
            pos: self.cursor.pos(),
            line: self.cursor.line(),
            column: self.cursor.column(),
        }
    }

    fn span_from(&self, mark: Mark) -> Span {
        Span::new(mark.pos, self.cursor.pos(), mark.line, mark.column)
    }

    fn push(&mut self, kind: TokenKind, value: TokenValue, mark: Mark) {
        let span = self.span_from(mark);
        self.tokens.push(Token::new(kind, value, span));
    }

    /// Push an operator/punctuation token with no payload.
    fn push_op(&mut self, kind: TokenKind, mark: Mark) {
        self.push(kind, TokenValue::None, mark);
    }

    // ── Dispatch ───────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Result<(), LexError> {
        let mark = self.mark();
        let c = self
            .cursor
            .advance()
            .expect("scan_token called at end of input");

        match c {
            // Whitespace (newlines are not significant in Pfn).
            ' ' | '\t' | '\r' | '\n' => Ok(()),

            // `--` line comment; a lone `-` falls through to the operator arm.
            '-' if self.cursor.peek() == Some('-') => {
                self.cursor.eat_while(|c| c != '\n');
                Ok(())
            }

            '0'..='9' => self.scan_number(mark, c),
            '"' => self.scan_string(mark),
            '\'' => self.scan_char(mark),

            c if is_ident_start(c) => {
                // A bare `_` not followed by an identifier character is the
                // wildcard token; `_foo` is an ordinary identifier.
                if c == '_' && !self.cursor.peek().is_some_and(is_ident_continue) {
                    self.push(
                        TokenKind::Underscore,
                        TokenValue::Str("_".to_string()),
                        mark,
                    );
                    return Ok(());
                }
                self.scan_ident(mark);
                Ok(())
            }

            '+' => {
                let kind = if self.cursor.eat('+') {
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '-' => {
                let kind = if self.cursor.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '*' => {
                self.push_op(TokenKind::Star, mark);
                Ok(())
            }
            '/' => {
                self.push_op(TokenKind::Slash, mark);
                Ok(())
            }
            '%' => {
                self.push_op(TokenKind::Percent, mark);
                Ok(())
            }
            ':' => {
                let kind = if self.cursor.eat(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '=' => {
                let kind = if self.cursor.eat('>') {
                    TokenKind::FatArrow
                } else if self.cursor.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Equals
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '!' => {
                let kind = if self.cursor.eat('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '<' => {
                let kind = if self.cursor.eat('=') {
                    TokenKind::LtEq
                } else if self.cursor.eat('-') {
                    TokenKind::LeftArrow
                } else {
                    TokenKind::Lt
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '>' => {
                let kind = if self.cursor.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '|' => {
                let kind = if self.cursor.eat('|') {
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '&' => {
                let kind = if self.cursor.eat('&') {
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Amp
                };
                self.push_op(kind, mark);
                Ok(())
            }
            '@' => {
                self.push_op(TokenKind::At, mark);
                Ok(())
            }
            '\\' => {
                self.push_op(TokenKind::Backslash, mark);
                Ok(())
            }
            '(' => {
                self.push_op(TokenKind::LParen, mark);
                Ok(())
            }
            ')' => {
                self.push_op(TokenKind::RParen, mark);
                Ok(())
            }
            '[' => {
                self.push_op(TokenKind::LBracket, mark);
                Ok(())
            }
            ']' => {
                self.push_op(TokenKind::RBracket, mark);
                Ok(())
            }
            '{' => {
                self.push_op(TokenKind::LBrace, mark);
                Ok(())
            }
            '}' => {
                self.push_op(TokenKind::RBrace, mark);
                Ok(())
            }
            ',' => {
                self.push_op(TokenKind::Comma, mark);
                Ok(())
            }
            '.' => {
                self.push_op(TokenKind::Dot, mark);
                Ok(())
            }
            ';' => {
                self.push_op(TokenKind::Semicolon, mark);
                Ok(())
            }
            '`' => {
                self.push_op(TokenKind::Backtick, mark);
                Ok(())
            }

            other => Err(LexError::new(
                LexErrorKind::UnexpectedCharacter(other),
                self.span_from(mark),
            )),
        }
    }

    // ── Number literals ───────────────────────────────────────────────

    /// Lex a number literal. `_` digit separators are allowed and dropped
    /// from the value. A `.` makes it a float only when a digit follows,
    /// and a float may carry an `[eE][+-]?digits` exponent.
    fn scan_number(&mut self, mark: Mark, first: char) -> Result<(), LexError> {
        let mut digits = String::new();
        digits.push(first);

        while let Some(c) = self.cursor.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.cursor.advance();
            } else if c == '_' {
                self.cursor.advance();
            } else {
                break;
            }
        }

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            digits.push('.');
            self.cursor.advance();
            while let Some(c) = self.cursor.peek() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    self.cursor.advance();
                } else if c == '_' {
                    self.cursor.advance();
                } else {
                    break;
                }
            }

            if matches!(self.cursor.peek(), Some('e' | 'E')) {
                digits.push(self.cursor.advance().unwrap());
                if matches!(self.cursor.peek(), Some('+' | '-')) {
                    digits.push(self.cursor.advance().unwrap());
                }
                while self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                    digits.push(self.cursor.advance().unwrap());
                }
            }

            let value: f64 = digits.parse().expect("scanned float digits must parse");
            self.push(TokenKind::Float, TokenValue::Float(value), mark);
        } else {
            // Out-of-range literals saturate rather than abort the scan.
            let value: i64 = digits.parse().unwrap_or(i64::MAX);
            self.push(TokenKind::Int, TokenValue::Int(value), mark);
        }
        Ok(())
    }

    // ── String literals ───────────────────────────────────────────────

    /// Lex the body of a string literal after the opening `"`.
    ///
    /// Recognised escapes: `\n \t \r \\ \" \'`; any other escaped
    /// character stands for itself. A raw newline inside the string is an
    /// error, as is running off the end of input.
    fn scan_string(&mut self, mark: Mark) -> Result<(), LexError> {
        let mut chars = String::new();

        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        self.span_from(mark),
                    ))
                }
                Some('"') => break,
                Some('\n') => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        self.span_from(mark),
                    ))
                }
                Some('\\') => {
                    self.cursor.advance();
                    let escaped = self.cursor.advance().ok_or_else(|| {
                        LexError::new(LexErrorKind::UnterminatedEscape, self.span_from(mark))
                    })?;
                    chars.push(unescape(escaped));
                }
                Some(_) => {
                    chars.push(self.cursor.advance().unwrap());
                }
            }
        }

        self.cursor.advance(); // closing '"'
        self.push(TokenKind::Str, TokenValue::Str(chars), mark);
        Ok(())
    }

    // ── Character literals ────────────────────────────────────────────

    /// Lex a character literal after the opening `'`: `'c'` or `'\c'`.
    fn scan_char(&mut self, mark: Mark) -> Result<(), LexError> {
        let value = match self.cursor.peek() {
            None => {
                return Err(LexError::new(
                    LexErrorKind::UnterminatedCharLiteral,
                    self.span_from(mark),
                ))
            }
            Some('\'') => {
                return Err(LexError::new(
                    LexErrorKind::EmptyCharLiteral,
                    self.span_from(mark),
                ))
            }
            Some('\\') => {
                self.cursor.advance();
                let escaped = self.cursor.advance().ok_or_else(|| {
                    LexError::new(LexErrorKind::UnterminatedEscape, self.span_from(mark))
                })?;
                unescape(escaped)
            }
            Some(_) => self.cursor.advance().unwrap(),
        };

        if !self.cursor.eat('\'') {
            return Err(LexError::new(
                LexErrorKind::UnterminatedCharLiteral,
                self.span_from(mark),
            ));
        }
        self.push(TokenKind::Char, TokenValue::Char(value), mark);
        Ok(())
    }

    // ── Identifiers and keywords ──────────────────────────────────────

    /// Lex an identifier or keyword. The text is looked up in the keyword
    /// table after collection; keywords still carry their spelling as a
    /// `Str` value so the parser can reuse them as identifiers.
    fn scan_ident(&mut self, mark: Mark) {
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(mark.pos, self.cursor.pos());

        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        self.push(kind, TokenValue::Str(text.to_string()), mark);
    }
}

/// Decode a string/char escape. Unrecognised escapes stand for themselves.
fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

/// Whether a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Whether a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_simple_definition() {
        assert_eq!(
            kinds("def add x y = x + y"),
            vec![
                TokenKind::Def,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Equals,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_int_with_separators() {
        let tokens = tokenize("1_000_000").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].value, TokenValue::Int(1_000_000));
    }

    #[test]
    fn lex_float_with_exponent() {
        let tokens = tokenize("3.14e-2").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].value, TokenValue::Float(3.14e-2));
    }

    #[test]
    fn dot_without_digit_is_not_a_float() {
        // `1.foo` lexes as Int, Dot, Ident (field access on a literal).
        assert_eq!(
            kinds("1.foo"),
            vec![
                TokenKind::Int,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_string_with_escapes() {
        let tokens = tokenize(r#""a\nb\"c""#).unwrap();
        assert_eq!(tokens[0].value, TokenValue::Str("a\nb\"c".to_string()));
    }

    #[test]
    fn lex_char_literals() {
        let tokens = tokenize(r"'a' '\n'").unwrap();
        assert_eq!(tokens[0].value, TokenValue::Char('a'));
        assert_eq!(tokens[1].value, TokenValue::Char('\n'));
    }

    #[test]
    fn underscore_alone_vs_prefixed() {
        assert_eq!(
            kinds("_ _foo"),
            vec![TokenKind::Underscore, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn maximal_munch_operators() {
        assert_eq!(
            kinds("= == => < <= <- - -> : :: + ++ | || & &&"),
            vec![
                TokenKind::Equals,
                TokenKind::EqEq,
                TokenKind::FatArrow,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::LeftArrow,
                TokenKind::Minus,
                TokenKind::Arrow,
                TokenKind::Colon,
                TokenKind::ColonColon,
                TokenKind::Plus,
                TokenKind::PlusPlus,
                TokenKind::Pipe,
                TokenKind::PipePipe,
                TokenKind::Amp,
                TokenKind::AmpAmp,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(
            kinds("1 -- comment to end of line\n2"),
            vec![TokenKind::Int, TokenKind::Int, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("\"abc").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn newline_in_string_is_an_error() {
        let err = tokenize("\"ab\ncd\"").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn empty_char_literal_is_an_error() {
        let err = tokenize("''").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::EmptyCharLiteral);
    }

    #[test]
    fn eof_span_is_empty_at_end() {
        let tokens = tokenize("ab").unwrap();
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.span.start, 2);
        assert_eq!(eof.span.end, 2);
    }
}
