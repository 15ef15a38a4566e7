//! Core parser state and lookahead helpers.
//!
//! Submodules hold the grammar productions: [`items`] for declarations,
//! [`expressions`] for the expression ladder, [`patterns`] for patterns,
//! and [`types`] for surface type references.

mod expressions;
mod items;
mod patterns;
mod types;

use pfn_common::span::Span;
use pfn_common::token::{keyword_text, Token, TokenKind, TokenValue};

use crate::ast::{Expr, Module};
use crate::error::ParseError;

/// The Pfn parser: a token cursor over the lexer's output.
///
/// `pos` always points at the next unconsumed token. The token vector is
/// guaranteed non-empty (the lexer appends `Eof`), and lookahead past the
/// end clamps to the final `Eof` token.
pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            tokens.last().is_some_and(|t| t.kind == TokenKind::Eof),
            "token stream must end with Eof"
        );
        Self { tokens, pos: 0 }
    }

    /// Parse a whole module: optional `module` header, then declarations
    /// until end of input.
    pub(crate) fn parse_module(&mut self) -> Result<Module, ParseError> {
        let name = self.parse_module_header()?;

        let mut declarations = Vec::new();
        while !self.check(TokenKind::Eof) {
            declarations.push(self.parse_declaration()?);
        }
        Ok(Module { name, declarations })
    }

    /// Parse a single expression, requiring it to consume all input.
    pub(crate) fn parse_standalone_expr(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        if !self.check(TokenKind::Eof) {
            return Err(self.error("Expected end of input after expression"));
        }
        Ok(expr)
    }

    fn parse_module_header(&mut self) -> Result<Option<String>, ParseError> {
        if !self.eat(TokenKind::Module) {
            return Ok(None);
        }
        let mut parts = vec![self.expect_identifier("Expected module name")?.0];
        while self.eat(TokenKind::Dot) {
            parts.push(self.expect_identifier("Expected module name part")?.0);
        }
        Ok(Some(parts.join(".")))
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// The current (next unconsumed) token.
    pub(crate) fn current(&self) -> &Token {
        self.nth(0)
    }

    /// The token `n` positions ahead, clamped to the final Eof.
    pub(crate) fn nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Kind of the current token.
    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Whether the current token has the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Span of the most recently consumed token. Defined only after at
    /// least one `bump`; callers pair it with a preceding consume.
    pub(crate) fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    // ── Consuming ──────────────────────────────────────────────────────

    /// Consume and return the current token.
    pub(crate) fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with `message`.
    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.bump())
        } else {
            Err(self.error(message))
        }
    }

    /// Build a parse error pointing at the current token.
    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current().clone())
    }

    // ── Backtracking ───────────────────────────────────────────────────

    /// Save the current position for later [`restore`](Self::restore).
    pub(crate) fn checkpoint(&self) -> usize {
        self.pos
    }

    /// Rewind to a previously saved position.
    pub(crate) fn restore(&mut self, checkpoint: usize) {
        self.pos = checkpoint;
    }

    // ── Keywords as identifiers ────────────────────────────────────────

    /// The spelling of a token usable in an identifier position, if any.
    ///
    /// This is the single audit point for the "keyword as identifier"
    /// rule: ordinary identifiers always qualify, and the soft keywords
    /// below may appear wherever a name or parameter is expected because
    /// ordinary programs reuse them (`data`, `handle`, ...). Hard
    /// structural keywords (`def`, `let`, `if`, ...) never do.
    pub(crate) fn token_as_identifier(token: &Token) -> Option<String> {
        match token.kind {
            TokenKind::Ident => token.value.as_str().map(str::to_string),
            TokenKind::Handler
            | TokenKind::Handle
            | TokenKind::Data
            | TokenKind::Family
            | TokenKind::Forall
            | TokenKind::Exists
            | TokenKind::Effect
            | TokenKind::Module
            | TokenKind::Export
            | TokenKind::As
            | TokenKind::Where => keyword_text(token.kind).map(str::to_string),
            _ => None,
        }
    }

    /// Whether the current token can serve as an identifier.
    pub(crate) fn at_identifier(&self) -> bool {
        Self::token_as_identifier(self.current()).is_some()
    }

    /// Consume an identifier-position token, returning its spelling and
    /// span.
    pub(crate) fn expect_identifier(
        &mut self,
        message: &str,
    ) -> Result<(String, Span), ParseError> {
        match Self::token_as_identifier(self.current()) {
            Some(name) => {
                let token = self.bump();
                Ok((name, token.span))
            }
            None => Err(self.error(message)),
        }
    }

    /// The text of the current token when it is a plain `Ident`.
    pub(crate) fn ident_text(&self) -> Option<&str> {
        if self.check(TokenKind::Ident) {
            self.current().value.as_str()
        } else {
            None
        }
    }

    /// Whether the current token is a plain `Ident` with the given text.
    pub(crate) fn at_ident_text(&self, text: &str) -> bool {
        self.ident_text() == Some(text)
    }

    /// Integer payload of a just-consumed literal token.
    pub(crate) fn token_int(token: &Token) -> i64 {
        match token.value {
            TokenValue::Int(v) => v,
            _ => unreachable!("Int token without integer value"),
        }
    }

    /// Float payload of a just-consumed literal token.
    pub(crate) fn token_float(token: &Token) -> f64 {
        match token.value {
            TokenValue::Float(v) => v,
            _ => unreachable!("Float token without float value"),
        }
    }

    /// String payload of a just-consumed literal token.
    pub(crate) fn token_str(token: &Token) -> String {
        match &token.value {
            TokenValue::Str(s) => s.clone(),
            _ => unreachable!("Str token without string value"),
        }
    }

    /// Char payload of a just-consumed literal token.
    pub(crate) fn token_char(token: &Token) -> char {
        match token.value {
            TokenValue::Char(c) => c,
            _ => unreachable!("Char token without char value"),
        }
    }
}
