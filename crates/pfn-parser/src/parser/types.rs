//! Surface type reference parsing.
//!
//! `T1 -> T2` is right-associative; application (`List a`, `Result e a`)
//! binds tighter than the arrow; atoms are names, `[T]` list sugar,
//! parenthesised/tuple types and `{field: T}` record types.

use pfn_common::token::TokenKind;

use crate::ast::{TypeRef, TypeRefKind};
use crate::error::ParseError;

use super::Parser;

impl Parser {
    pub(crate) fn parse_type_ref(&mut self) -> Result<TypeRef, ParseError> {
        self.parse_type_arrow()
    }

    fn parse_type_arrow(&mut self) -> Result<TypeRef, ParseError> {
        let left = self.parse_type_app()?;
        if self.eat(TokenKind::Arrow) {
            let right = self.parse_type_arrow()?;
            let span = left.span.merge(right.span);
            return Ok(TypeRef::new(
                TypeRefKind::Fun {
                    param: Box::new(left),
                    result: Box::new(right),
                },
                span,
            ));
        }
        Ok(left)
    }

    fn parse_type_app(&mut self) -> Result<TypeRef, ParseError> {
        let base = self.parse_type_atom()?;

        let mut args = Vec::new();
        while self.at_type_atom_start() {
            args.push(self.parse_type_atom()?);
        }

        if args.is_empty() {
            return Ok(base);
        }
        // Only a named head can be applied; anything else keeps its args
        // unconsumed-equivalent by reconstruction as written.
        match base.kind {
            TypeRefKind::Simple { name, .. } => {
                let span = args
                    .last()
                    .map(|a| base.span.merge(a.span))
                    .unwrap_or(base.span);
                Ok(TypeRef::new(TypeRefKind::Simple { name, args }, span))
            }
            _ => Err(ParseError::new(
                "Type arguments applied to a non-named type",
                self.current().clone(),
            )),
        }
    }

    /// Whether the current token can begin a type atom in application
    /// position.
    fn at_type_atom_start(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Ident | TokenKind::LBracket | TokenKind::LParen | TokenKind::LBrace
        )
    }

    pub(crate) fn parse_type_atom(&mut self) -> Result<TypeRef, ParseError> {
        let start = self.current().span;

        if self.eat(TokenKind::LParen) {
            // `()` is the unit type, spelled as the empty tuple.
            if self.eat(TokenKind::RParen) {
                return Ok(TypeRef::new(
                    TypeRefKind::Tuple(Vec::new()),
                    start.merge(self.prev_span()),
                ));
            }
            let inner = self.parse_type_ref()?;
            if self.eat(TokenKind::Comma) {
                let mut elements = vec![inner];
                while !self.check(TokenKind::RParen) {
                    elements.push(self.parse_type_ref()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen, "Expected ')' after tuple type")?;
                return Ok(TypeRef::new(
                    TypeRefKind::Tuple(elements),
                    start.merge(self.prev_span()),
                ));
            }
            self.expect(TokenKind::RParen, "Expected ')'")?;
            return Ok(inner);
        }

        if self.eat(TokenKind::LBracket) {
            let element = self.parse_type_ref()?;
            self.expect(TokenKind::RBracket, "Expected ']' after list type")?;
            let span = start.merge(self.prev_span());
            return Ok(TypeRef::new(
                TypeRefKind::Simple {
                    name: "List".to_string(),
                    args: vec![element],
                },
                span,
            ));
        }

        if self.eat(TokenKind::LBrace) {
            let mut fields = Vec::new();
            if !self.check(TokenKind::RBrace) {
                loop {
                    let (name, _) = self.expect_identifier("Expected field name")?;
                    self.expect(TokenKind::Colon, "Expected ':' after field name")?;
                    let field_ty = self.parse_type_ref()?;
                    fields.push((name, field_ty));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBrace, "Expected '}' after record type")?;
            let span = start.merge(self.prev_span());
            return Ok(TypeRef::new(TypeRefKind::Record(fields), span));
        }

        let (name, span) = self.expect_identifier("Expected type name")?;
        Ok(TypeRef::new(
            TypeRefKind::Simple {
                name,
                args: Vec::new(),
            },
            span,
        ))
    }
}
