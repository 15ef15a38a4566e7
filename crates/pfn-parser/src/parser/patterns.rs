//! Pattern parsing.
//!
//! Patterns mirror expression atoms plus constructor application. `::` is
//! right-associative, as in expressions. A capitalised identifier
//! followed by pattern atoms is a constructor pattern; lower-case
//! identifiers bind variables.

use pfn_common::token::TokenKind;

use crate::ast::{Pattern, PatternKind};
use crate::error::ParseError;

use super::Parser;

impl Parser {
    pub(crate) fn parse_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.parse_cons_pattern()
    }

    /// Whether the current token can begin a pattern.
    pub(crate) fn at_pattern_start(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::Char
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Underscore
                | TokenKind::LBracket
                | TokenKind::LParen
                | TokenKind::LBrace
                | TokenKind::Ident
        )
    }

    fn parse_cons_pattern(&mut self) -> Result<Pattern, ParseError> {
        let left = self.parse_constructor_pattern()?;
        if self.eat(TokenKind::ColonColon) {
            let right = self.parse_cons_pattern()?;
            let span = left.span.merge(right.span);
            return Ok(Pattern::new(
                PatternKind::Cons {
                    head: Box::new(left),
                    tail: Box::new(right),
                },
                span,
            ));
        }
        Ok(left)
    }

    /// A constructor application `Ctor p1 ... pN`, or a single atom.
    fn parse_constructor_pattern(&mut self) -> Result<Pattern, ParseError> {
        if let Some(text) = self.ident_text() {
            if text.chars().next().is_some_and(char::is_uppercase) {
                let start = self.current().span;
                let name = text.to_string();
                self.bump();
                let mut args = Vec::new();
                while self.at_pattern_start() {
                    args.push(self.parse_atom_pattern()?);
                }
                let span = start.merge(self.prev_span());
                return Ok(Pattern::new(PatternKind::Constructor { name, args }, span));
            }
        }
        self.parse_atom_pattern()
    }

    fn parse_atom_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.current().span;

        match self.kind() {
            TokenKind::Int => {
                let token = self.bump();
                Ok(Pattern::new(PatternKind::Int(Self::token_int(&token)), start))
            }
            TokenKind::Float => {
                let token = self.bump();
                Ok(Pattern::new(
                    PatternKind::Float(Self::token_float(&token)),
                    start,
                ))
            }
            TokenKind::Str => {
                let token = self.bump();
                Ok(Pattern::new(
                    PatternKind::Str(Self::token_str(&token)),
                    start,
                ))
            }
            TokenKind::Char => {
                let token = self.bump();
                Ok(Pattern::new(
                    PatternKind::Char(Self::token_char(&token)),
                    start,
                ))
            }
            TokenKind::True => {
                self.bump();
                Ok(Pattern::new(PatternKind::Bool(true), start))
            }
            TokenKind::False => {
                self.bump();
                Ok(Pattern::new(PatternKind::Bool(false), start))
            }
            TokenKind::Underscore => {
                self.bump();
                Ok(Pattern::new(PatternKind::Wildcard, start))
            }
            TokenKind::LBracket => self.parse_list_pattern(),
            TokenKind::LParen => self.parse_paren_pattern(),
            TokenKind::LBrace => self.parse_record_pattern(),
            TokenKind::Ident => {
                let text = self.ident_text().unwrap_or_default().to_string();
                if text.chars().next().is_some_and(char::is_uppercase) {
                    // Nullary constructor in atom position (e.g. inside
                    // another constructor's argument list).
                    self.bump();
                    return Ok(Pattern::new(
                        PatternKind::Constructor {
                            name: text,
                            args: Vec::new(),
                        },
                        start,
                    ));
                }
                self.bump();
                Ok(Pattern::new(PatternKind::Var(text), start))
            }
            _ => Err(self.error(format!("Expected pattern, got {:?}", self.kind()))),
        }
    }

    /// `[]`, `[p1, ..., pN]`, or `[p1, ..., pN | rest]`.
    fn parse_list_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.current().span;
        self.bump(); // '['

        if self.eat(TokenKind::RBracket) {
            return Ok(Pattern::new(
                PatternKind::List {
                    elements: Vec::new(),
                    rest: None,
                },
                start.merge(self.prev_span()),
            ));
        }

        let mut elements = vec![self.parse_pattern()?];
        while self.eat(TokenKind::Comma) {
            elements.push(self.parse_pattern()?);
        }

        let rest = if self.eat(TokenKind::Pipe) {
            Some(Box::new(self.parse_pattern()?))
        } else {
            None
        };

        self.expect(TokenKind::RBracket, "Expected ']'")?;
        Ok(Pattern::new(
            PatternKind::List { elements, rest },
            start.merge(self.prev_span()),
        ))
    }

    /// `()` (unit), a parenthesised pattern, or a tuple pattern.
    fn parse_paren_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.current().span;
        self.bump(); // '('

        if self.eat(TokenKind::RParen) {
            return Ok(Pattern::new(
                PatternKind::Tuple(Vec::new()),
                start.merge(self.prev_span()),
            ));
        }

        let first = self.parse_pattern()?;
        if self.eat(TokenKind::Comma) {
            let mut elements = vec![first];
            while !self.check(TokenKind::RParen) {
                elements.push(self.parse_pattern()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "Expected ')'")?;
            return Ok(Pattern::new(
                PatternKind::Tuple(elements),
                start.merge(self.prev_span()),
            ));
        }
        self.expect(TokenKind::RParen, "Expected ')'")?;
        Ok(first)
    }

    /// `{ field: p, ... }`.
    fn parse_record_pattern(&mut self) -> Result<Pattern, ParseError> {
        let start = self.current().span;
        self.bump(); // '{'

        let mut fields = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let (name, _) = self.expect_identifier("Expected field name")?;
                self.expect(TokenKind::Colon, "Expected ':' after field name")?;
                let pattern = self.parse_pattern()?;
                fields.push((name, pattern));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "Expected '}'")?;
        Ok(Pattern::new(
            PatternKind::Record(fields),
            start.merge(self.prev_span()),
        ))
    }
}
