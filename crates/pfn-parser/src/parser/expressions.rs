//! Expression parsing: the precedence ladder.
//!
//! From lowest to highest: let/do bindings, if, match/handle, `||`, `&&`,
//! comparisons, `::` (right-assoc), `++`, additive, multiplicative, unary,
//! application, postfix access, atoms. Application is normalised to
//! curried single-argument nodes at parse time.

use pfn_common::span::Span;
use pfn_common::token::TokenKind;

use crate::ast::{
    BinOpKind, DoBinding, Expr, ExprKind, HandlerCase, MatchCase, Param, RecordField, UnaryOpKind,
};
use crate::error::ParseError;

use super::Parser;

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_let()
    }

    // ── Bindings ───────────────────────────────────────────────────────

    fn parse_let(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::Let) {
            let start = self.current().span;
            self.bump();
            return self.parse_let_body(start);
        }
        if self.check(TokenKind::Do) {
            let start = self.current().span;
            self.bump();
            return self.parse_do(start);
        }
        self.parse_if()
    }

    /// Everything after the `let` keyword.
    ///
    /// A lower-case name starts an ordinary binder (`let x = ...` or the
    /// function sugar `let f x = ...`); anything else is a pattern binder
    /// (`let (a, b) = ...`). `in` is optional -- when absent the binding's
    /// body is simply whatever expression follows.
    fn parse_let_body(&mut self, start: Span) -> Result<Expr, ParseError> {
        let binder_name = Self::token_as_identifier(self.current())
            .filter(|name| !name.chars().next().is_some_and(char::is_uppercase));

        if let Some(name) = binder_name {
            self.bump();
            let mut params = Vec::new();
            loop {
                if self.at_identifier() {
                    params.push(self.parse_bare_param()?);
                } else if self.check(TokenKind::LParen) {
                    self.bump();
                    params.push(self.parse_param()?);
                    self.expect(TokenKind::RParen, "Expected ')'")?;
                } else {
                    break;
                }
            }

            self.expect(TokenKind::Equals, "Expected '=' after let binding")?;
            let value = self.parse_expr()?;
            self.eat(TokenKind::In);
            let body = self.parse_expr()?;
            let span = start.merge(body.span);

            if params.is_empty() {
                return Ok(Expr::new(
                    ExprKind::Let {
                        name,
                        value: Box::new(value),
                        body: Box::new(body),
                    },
                    span,
                ));
            }
            return Ok(Expr::new(
                ExprKind::LetFunc {
                    name,
                    params,
                    value: Box::new(value),
                    body: Box::new(body),
                },
                span,
            ));
        }

        let pattern = self.parse_pattern()?;
        self.expect(TokenKind::Equals, "Expected '=' after let pattern")?;
        let value = self.parse_expr()?;
        self.eat(TokenKind::In);
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::LetPattern {
                pattern,
                value: Box::new(value),
                body: Box::new(body),
            },
            span,
        ))
    }

    /// `do name <- expr ... in body`.
    fn parse_do(&mut self, start: Span) -> Result<Expr, ParseError> {
        let mut bindings = Vec::new();
        while !self.check(TokenKind::In) && !self.check(TokenKind::Eof) {
            let (name, name_span) = self.expect_identifier("Expected variable name in do binding")?;
            self.eat(TokenKind::LeftArrow);
            let value = self.parse_expr()?;
            let span = name_span.merge(value.span);
            bindings.push(DoBinding { name, value, span });
        }
        self.eat(TokenKind::In);
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::DoNotation {
                bindings,
                body: Box::new(body),
            },
            span,
        ))
    }

    // ── Conditionals and matching ──────────────────────────────────────

    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::If) {
            let start = self.current().span;
            self.bump();
            let cond = self.parse_expr()?;
            self.expect(TokenKind::Then, "Expected 'then'")?;
            let then_branch = self.parse_expr()?;
            self.expect(TokenKind::Else, "Expected 'else'")?;
            let else_branch = self.parse_expr()?;
            let span = start.merge(else_branch.span);
            return Ok(Expr::new(
                ExprKind::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                },
                span,
            ));
        }
        self.parse_match()
    }

    fn parse_match(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::Match) {
            let start = self.current().span;
            self.bump();
            let scrutinee = self.parse_expr()?;
            self.expect(TokenKind::With, "Expected 'with'")?;

            let mut cases = Vec::new();
            loop {
                if self.eat(TokenKind::Pipe) {
                    let pattern = self.parse_pattern()?;
                    cases.push(self.finish_match_case(pattern)?);
                    continue;
                }
                // A case may also begin without `|`: speculatively parse a
                // pattern and keep it only if an arrow (or guard) follows.
                if self.at_pattern_start() {
                    let checkpoint = self.checkpoint();
                    match self.parse_pattern() {
                        Ok(pattern)
                            if self.check(TokenKind::Arrow) || self.check(TokenKind::If) =>
                        {
                            cases.push(self.finish_match_case(pattern)?);
                            continue;
                        }
                        _ => {
                            self.restore(checkpoint);
                            break;
                        }
                    }
                }
                break;
            }

            let span = cases
                .last()
                .map(|c| start.merge(c.body.span))
                .unwrap_or_else(|| start.merge(self.prev_span()));
            return Ok(Expr::new(
                ExprKind::Match {
                    scrutinee: Box::new(scrutinee),
                    cases,
                },
                span,
            ));
        }
        if self.check(TokenKind::Handle) {
            let start = self.current().span;
            self.bump();
            return self.parse_handle(start);
        }
        self.parse_or()
    }

    fn finish_match_case(&mut self, pattern: crate::ast::Pattern) -> Result<MatchCase, ParseError> {
        let guard = if self.eat(TokenKind::If) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Arrow, "Expected '->'")?;
        let body = self.parse_expr()?;
        Ok(MatchCase {
            pattern,
            guard,
            body,
        })
    }

    /// `handle e with | op args -> body ...` or `handle e with name`.
    fn parse_handle(&mut self, start: Span) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        self.expect(TokenKind::With, "Expected 'with'")?;

        if self.check(TokenKind::Pipe) {
            let mut cases = Vec::new();
            while self.eat(TokenKind::Pipe) {
                cases.push(self.parse_handler_case()?);
            }
            let span = start.merge(self.prev_span());
            return Ok(Expr::new(
                ExprKind::Handle {
                    expr: Box::new(expr),
                    cases,
                    handler_name: None,
                },
                span,
            ));
        }

        let (handler_name, name_span) = self.expect_identifier("Expected handler name")?;
        Ok(Expr::new(
            ExprKind::Handle {
                expr: Box::new(expr),
                cases: Vec::new(),
                handler_name: Some(handler_name),
            },
            start.merge(name_span),
        ))
    }

    /// One `op params -> body` arm shared by handle expressions and
    /// handler declarations.
    pub(crate) fn parse_handler_case(&mut self) -> Result<HandlerCase, ParseError> {
        let (op_name, op_span) = self.expect_identifier("Expected operation name")?;
        let mut params = Vec::new();
        while self.at_identifier() {
            params.push(self.parse_bare_param()?);
        }
        self.expect(TokenKind::Arrow, "Expected '->'")?;
        let body = self.parse_expr()?;
        let resume_param = params
            .iter()
            .find(|p| p.name == "resume")
            .map(|p| p.name.clone());
        let span = op_span.merge(body.span);
        Ok(HandlerCase {
            op_name,
            params,
            resume_param,
            body,
            span,
        })
    }

    // ── Binary operators ───────────────────────────────────────────────

    fn binop(left: Expr, op: BinOpKind, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::PipePipe) {
            let right = self.parse_and()?;
            left = Self::binop(left, BinOpKind::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.eat(TokenKind::AmpAmp) {
            let right = self.parse_comparison()?;
            left = Self::binop(left, BinOpKind::And, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_cons()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinOpKind::Eq,
                TokenKind::NotEq => BinOpKind::NotEq,
                TokenKind::Lt => BinOpKind::Lt,
                TokenKind::LtEq => BinOpKind::LtEq,
                TokenKind::Gt => BinOpKind::Gt,
                TokenKind::GtEq => BinOpKind::GtEq,
                _ => break,
            };
            self.bump();
            let right = self.parse_cons()?;
            left = Self::binop(left, op, right);
        }
        Ok(left)
    }

    /// `::` is right-associative: `a :: b :: c` is `a :: (b :: c)`.
    fn parse_cons(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_concat()?;
        if self.eat(TokenKind::ColonColon) {
            let right = self.parse_cons()?;
            return Ok(Self::binop(left, BinOpKind::Cons, right));
        }
        Ok(left)
    }

    fn parse_concat(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        while self.eat(TokenKind::PlusPlus) {
            let right = self.parse_additive()?;
            left = Self::binop(left, BinOpKind::Concat, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOpKind::Add,
                TokenKind::Minus => BinOpKind::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = Self::binop(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOpKind::Mul,
                TokenKind::Slash => BinOpKind::Div,
                TokenKind::Percent => BinOpKind::Mod,
                _ => break,
            };
            self.bump();
            let right = self.parse_unary()?;
            left = Self::binop(left, op, right);
        }
        Ok(left)
    }

    /// Unary `-` and `!`. A `-` in atom position is unary; between two
    /// atoms the additive ladder has already claimed it as binary.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.kind() {
            TokenKind::Minus => Some(UnaryOpKind::Neg),
            TokenKind::Bang => Some(UnaryOpKind::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.current().span;
            self.bump();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_application()
    }

    // ── Application ────────────────────────────────────────────────────

    /// Juxtaposition (`f x y`) and parenthesised argument lists
    /// (`f(x, y)`) both produce curried single-argument applications.
    ///
    /// When a parenthesised group is followed by `=`, it was not an
    /// argument list but the start of a following binding; the parser
    /// rewinds and stops the application loop.
    fn parse_application(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_postfix()?;

        loop {
            if self.check(TokenKind::LParen) {
                let checkpoint = self.checkpoint();
                self.bump();
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    args.push(self.parse_expr()?);
                    while self.eat(TokenKind::Comma) {
                        args.push(self.parse_expr()?);
                    }
                }
                self.expect(TokenKind::RParen, "Expected ')'")?;
                if self.check(TokenKind::Equals) {
                    self.restore(checkpoint);
                    break;
                }
                // `f()` applies to unit.
                if args.is_empty() {
                    args.push(Expr::new(ExprKind::Unit, self.prev_span()));
                }
                for arg in args {
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr::new(
                        ExprKind::App {
                            func: Box::new(expr),
                            args: vec![arg],
                        },
                        span,
                    );
                }
            } else if self.at_juxtaposed_argument() {
                let arg = self.parse_postfix()?;
                let span = expr.span.merge(arg.span);
                expr = Expr::new(
                    ExprKind::App {
                        func: Box::new(expr),
                        args: vec![arg],
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Whether the current token begins a juxtaposed argument.
    ///
    /// An identifier followed by `=` or `<-` is the start of the next
    /// binding, not an argument.
    fn at_juxtaposed_argument(&self) -> bool {
        match self.kind() {
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Str
            | TokenKind::Char
            | TokenKind::True
            | TokenKind::False
            | TokenKind::LBracket
            | TokenKind::LBrace => true,
            TokenKind::Ident => !matches!(
                self.nth(1).kind,
                TokenKind::Equals | TokenKind::LeftArrow
            ),
            _ => false,
        }
    }

    // ── Postfix access ─────────────────────────────────────────────────

    /// Field access `.f`, index access `[i]`, and slices `[a:b:c]`.
    ///
    /// Indexing requires the `[` to touch the expression (`xs[0]`);
    /// a detached bracket (`f [1, 2]`) is a list-literal argument and is
    /// left for the application loop.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;

        loop {
            if self.check(TokenKind::Dot)
                && Self::token_as_identifier(self.nth(1)).is_some()
            {
                self.bump();
                let (field, field_span) = self.expect_identifier("Expected field name")?;
                let span = expr.span.merge(field_span);
                expr = Expr::new(
                    ExprKind::FieldAccess {
                        expr: Box::new(expr),
                        field,
                    },
                    span,
                );
            } else if self.check(TokenKind::LBracket)
                && self.current().span.start == expr.span.end
            {
                self.bump();
                expr = self.parse_index_or_slice(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// After the `[` of an index/slice: `e[i]`, `e[a:b]`, `e[a:b:c]` with
    /// any slice bound omissible. Two adjacent separators lex as a single
    /// `::` token (`e[::2]`), so both spellings are handled.
    fn parse_index_or_slice(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        let start_part =
            if self.check(TokenKind::Colon) || self.check(TokenKind::ColonColon) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };

        // `::` stands for an empty end bound between two separators.
        if self.eat(TokenKind::ColonColon) {
            let step = if self.check(TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            self.expect(TokenKind::RBracket, "Expected ']'")?;
            let span = expr.span.merge(self.prev_span());
            return Ok(Expr::new(
                ExprKind::Slice {
                    expr: Box::new(expr),
                    start: start_part,
                    end: None,
                    step,
                },
                span,
            ));
        }

        if self.eat(TokenKind::Colon) {
            let end_part = if self.check(TokenKind::RBracket) || self.check(TokenKind::Colon) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            let step = if self.eat(TokenKind::Colon) {
                if self.check(TokenKind::RBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                }
            } else {
                None
            };
            self.expect(TokenKind::RBracket, "Expected ']'")?;
            let span = expr.span.merge(self.prev_span());
            return Ok(Expr::new(
                ExprKind::Slice {
                    expr: Box::new(expr),
                    start: start_part,
                    end: end_part,
                    step,
                },
                span,
            ));
        }

        let index = start_part.ok_or_else(|| self.error("Expected index expression"))?;
        self.expect(TokenKind::RBracket, "Expected ']'")?;
        let span = expr.span.merge(self.prev_span());
        Ok(Expr::new(
            ExprKind::IndexAccess {
                expr: Box::new(expr),
                index,
            },
            span,
        ))
    }

    // ── Atoms ──────────────────────────────────────────────────────────

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span;

        match self.kind() {
            TokenKind::Int => {
                let token = self.bump();
                Ok(Expr::new(ExprKind::Int(Self::token_int(&token)), start))
            }
            TokenKind::Float => {
                let token = self.bump();
                Ok(Expr::new(ExprKind::Float(Self::token_float(&token)), start))
            }
            TokenKind::Str => {
                let token = self.bump();
                Ok(Expr::new(ExprKind::Str(Self::token_str(&token)), start))
            }
            TokenKind::Char => {
                let token = self.bump();
                Ok(Expr::new(ExprKind::Char(Self::token_char(&token)), start))
            }
            TokenKind::True => {
                self.bump();
                Ok(Expr::new(ExprKind::Bool(true), start))
            }
            TokenKind::False => {
                self.bump();
                Ok(Expr::new(ExprKind::Bool(false), start))
            }
            TokenKind::Fn => {
                self.bump();
                self.parse_fn_lambda(start)
            }
            TokenKind::Backslash => {
                self.bump();
                self.parse_backslash_lambda(start)
            }
            TokenKind::LParen => {
                self.bump();
                self.parse_paren_atom(start)
            }
            TokenKind::LBracket => {
                self.bump();
                self.parse_list_literal(start)
            }
            TokenKind::LBrace => {
                self.bump();
                self.parse_record_atom(start)
            }
            TokenKind::Ident => {
                if self.at_perform_form() {
                    return self.parse_perform(start);
                }
                let token = self.bump();
                Ok(Expr::new(ExprKind::Var(Self::token_str(&token)), start))
            }
            other => Err(self.error(format!("Unexpected token: {other:?}"))),
        }
    }

    /// `fn p1 p2 => body` with optionally parenthesised, annotated params.
    fn parse_fn_lambda(&mut self, start: Span) -> Result<Expr, ParseError> {
        let mut params = Vec::new();
        if self.eat(TokenKind::LParen) {
            if !self.check(TokenKind::RParen) {
                params.push(self.parse_param()?);
                while self.eat(TokenKind::Comma) {
                    params.push(self.parse_param()?);
                }
            }
            self.expect(TokenKind::RParen, "Expected ')'")?;
        } else {
            while self.at_identifier() {
                params.push(self.parse_bare_param()?);
            }
        }
        self.expect(TokenKind::FatArrow, "Expected '=>'")?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        ))
    }

    /// `\p1 p2 -> body`.
    fn parse_backslash_lambda(&mut self, start: Span) -> Result<Expr, ParseError> {
        let mut params = Vec::new();
        while self.at_identifier() {
            params.push(self.parse_bare_param()?);
        }
        self.expect(TokenKind::Arrow, "Expected '->'")?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        ))
    }

    /// `()` (unit), a grouped expression, or a tuple literal.
    fn parse_paren_atom(&mut self, start: Span) -> Result<Expr, ParseError> {
        if self.eat(TokenKind::RParen) {
            return Ok(Expr::new(ExprKind::Unit, start.merge(self.prev_span())));
        }

        let first = self.parse_expr()?;
        if self.eat(TokenKind::Comma) {
            let mut elements = vec![first];
            while !self.check(TokenKind::RParen) {
                elements.push(self.parse_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "Expected ')'")?;
            return Ok(Expr::new(
                ExprKind::TupleLit(elements),
                start.merge(self.prev_span()),
            ));
        }
        self.expect(TokenKind::RParen, "Expected ')'")?;
        Ok(first)
    }

    fn parse_list_literal(&mut self, start: Span) -> Result<Expr, ParseError> {
        if self.eat(TokenKind::RBracket) {
            return Ok(Expr::new(
                ExprKind::ListLit(Vec::new()),
                start.merge(self.prev_span()),
            ));
        }
        let mut elements = vec![self.parse_expr()?];
        while self.eat(TokenKind::Comma) {
            elements.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RBracket, "Expected ']'")?;
        Ok(Expr::new(
            ExprKind::ListLit(elements),
            start.merge(self.prev_span()),
        ))
    }

    /// `{f: v, ...}` record literal or `{r with f = v, ...}` update.
    fn parse_record_atom(&mut self, start: Span) -> Result<Expr, ParseError> {
        if self.at_identifier() && self.nth(1).kind == TokenKind::With {
            let (base, base_span) = self.expect_identifier("Expected record name")?;
            self.expect(TokenKind::With, "Expected 'with'")?;
            let mut updates = Vec::new();
            while !self.check(TokenKind::RBrace) {
                let (name, name_span) = self.expect_identifier("Expected field name")?;
                self.expect(TokenKind::Equals, "Expected '='")?;
                let value = self.parse_expr()?;
                let span = name_span.merge(value.span);
                updates.push(RecordField { name, value, span });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace, "Expected '}'")?;
            let record = Expr::new(ExprKind::Var(base), base_span);
            return Ok(Expr::new(
                ExprKind::RecordUpdate {
                    record: Box::new(record),
                    updates,
                },
                start.merge(self.prev_span()),
            ));
        }

        let mut fields = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let (name, name_span) = self.expect_identifier("Expected field name")?;
                self.expect(TokenKind::Colon, "Expected ':'")?;
                let value = self.parse_expr()?;
                let span = name_span.merge(value.span);
                fields.push(RecordField { name, value, span });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "Expected '}'")?;
        Ok(Expr::new(
            ExprKind::RecordLit(fields),
            start.merge(self.prev_span()),
        ))
    }

    // ── Perform ────────────────────────────────────────────────────────

    /// `perform` is a soft keyword: only the exact shape
    /// `perform Effect.op` triggers the special form, anywhere else the
    /// word is an ordinary identifier.
    fn at_perform_form(&self) -> bool {
        self.at_ident_text("perform")
            && self.nth(1).kind == TokenKind::Ident
            && self.nth(2).kind == TokenKind::Dot
            && self.nth(3).kind == TokenKind::Ident
    }

    fn parse_perform(&mut self, start: Span) -> Result<Expr, ParseError> {
        self.bump(); // `perform`
        let (effect, _) = self.expect_identifier("Expected effect name")?;
        self.expect(TokenKind::Dot, "Expected '.'")?;
        let (op, _) = self.expect_identifier("Expected operation name")?;

        let mut args = Vec::new();
        if self.eat(TokenKind::LParen) {
            if !self.check(TokenKind::RParen) {
                args.push(self.parse_expr()?);
                while self.eat(TokenKind::Comma) {
                    args.push(self.parse_expr()?);
                }
            }
            self.expect(TokenKind::RParen, "Expected ')'")?;
        }
        Ok(Expr::new(
            ExprKind::Perform { effect, op, args },
            start.merge(self.prev_span()),
        ))
    }

    // ── Params ─────────────────────────────────────────────────────────

    /// A parameter with an optional `: Type` annotation (used inside
    /// parentheses).
    pub(crate) fn parse_param(&mut self) -> Result<Param, ParseError> {
        let (name, span) = self.expect_identifier("Expected parameter name")?;
        let type_annotation = if self.eat(TokenKind::Colon) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };
        let span = type_annotation
            .as_ref()
            .map(|t| span.merge(t.span))
            .unwrap_or(span);
        Ok(Param {
            name,
            type_annotation,
            span,
        })
    }

    /// A bare (unparenthesised, unannotated) parameter name.
    pub(crate) fn parse_bare_param(&mut self) -> Result<Param, ParseError> {
        let (name, span) = self.expect_identifier("Expected parameter name")?;
        Ok(Param {
            name,
            type_annotation: None,
            span,
        })
    }
}
