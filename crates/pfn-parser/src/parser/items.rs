//! Top-level declaration parsing.
//!
//! Dispatch is on the leading keyword: `def`, `type`, `gadt`, `import`,
//! `interface`, `impl`, `effect`, `handler`, `export`, plus the
//! `@py.export` decorator which falls through to `def`.

use pfn_common::span::Span;
use pfn_common::token::TokenKind;

use crate::ast::{
    Constructor, Decl, DeclKind, DefDecl, EffectDecl, EffectOp, ExportDecl, HandlerDecl, ImplDecl,
    ImplMethod, ImportDecl, InterfaceDecl, InterfaceMethod, Param, TypeAliasDecl, TypeDecl,
    TypeRefKind,
};
use crate::error::ParseError;

use super::Parser;

impl Parser {
    pub(crate) fn parse_declaration(&mut self) -> Result<Decl, ParseError> {
        let start = self.current().span;

        match self.kind() {
            TokenKind::At => {
                let (export_name, _) = self.parse_py_export_decorator()?;
                self.expect(TokenKind::Def, "Expected 'def' after @py.export")?;
                let mut def = self.parse_def()?;
                def.is_exported = true;
                def.export_name = export_name;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Def(def), span))
            }
            TokenKind::Def => {
                self.bump();
                let def = self.parse_def()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Def(def), span))
            }
            TokenKind::Type => {
                self.bump();
                let kind = self.parse_type_decl()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(kind, span))
            }
            TokenKind::Gadt => {
                self.bump();
                let decl = self.parse_gadt_decl()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Type(decl), span))
            }
            TokenKind::Import => {
                self.bump();
                let decl = self.parse_import_decl()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Import(decl), span))
            }
            TokenKind::Interface => {
                self.bump();
                let decl = self.parse_interface_decl()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Interface(decl), span))
            }
            TokenKind::Impl => {
                self.bump();
                let decl = self.parse_impl_decl()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Impl(decl), span))
            }
            TokenKind::Effect => {
                self.bump();
                let decl = self.parse_effect_decl()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Effect(decl), span))
            }
            TokenKind::Handler => {
                self.bump();
                let decl = self.parse_handler_decl()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Handler(decl), span))
            }
            TokenKind::Export => {
                self.bump();
                let decl = self.parse_export_decl()?;
                let span = start.merge(self.prev_span());
                Ok(Decl::new(DeclKind::Export(decl), span))
            }
            other => Err(self.error(format!("Unexpected token: {other:?}"))),
        }
    }

    /// `@py.export` or `@py.export("name")`. Returns the optional quoted
    /// export name.
    fn parse_py_export_decorator(&mut self) -> Result<(Option<String>, Span), ParseError> {
        let start = self.current().span;
        self.expect(TokenKind::At, "Expected '@'")?;
        if !self.at_ident_text("py") {
            return Err(self.error("Expected 'py' after '@'"));
        }
        self.bump();
        self.expect(TokenKind::Dot, "Expected '.' after 'py'")?;
        if !self.at_ident_text("export") {
            return Err(self.error("Expected 'export' after 'py.'"));
        }
        self.bump();

        let mut export_name = None;
        if self.eat(TokenKind::LParen) {
            let name_token = self.expect(TokenKind::Str, "Expected export name")?;
            export_name = Some(Self::token_str(&name_token));
            self.expect(TokenKind::RParen, "Expected ')'")?;
        }
        Ok((export_name, start.merge(self.prev_span())))
    }

    /// Everything after the `def` keyword.
    fn parse_def(&mut self) -> Result<DefDecl, ParseError> {
        let (name, _) = self.expect_identifier("Expected function name")?;

        let mut params = Vec::new();
        loop {
            if self.at_identifier() {
                params.push(self.parse_bare_param()?);
            } else if self.check(TokenKind::LParen) {
                self.bump();
                if self.check(TokenKind::RParen) {
                    // `def f() = ...` -- an empty parameter list.
                    self.bump();
                    continue;
                }
                let first = self.parse_param()?;
                params.push(first);
                if self.eat(TokenKind::Comma) {
                    // `def f(a, b) = ...` -- comma-list form.
                    loop {
                        params.push(self.parse_param()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RParen, "Expected ')' after parameters")?;
            } else {
                break;
            }
        }

        let return_type = if self.eat(TokenKind::Colon) || self.eat(TokenKind::Arrow) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };

        self.expect(TokenKind::Equals, "Expected '=' after function signature")?;
        let body = self.parse_expr()?;

        Ok(DefDecl {
            name,
            params,
            return_type,
            body,
            is_exported: false,
            export_name: None,
        })
    }

    /// Everything after the `type` keyword: a sum type, a record type, or
    /// a type alias.
    fn parse_type_decl(&mut self) -> Result<DeclKind, ParseError> {
        let (name, _) = self.expect_identifier("Expected type name")?;

        let mut params = Vec::new();
        while self.check(TokenKind::Ident) {
            let (param, _) = self.expect_identifier("Expected type parameter")?;
            params.push(param);
        }

        if self.eat(TokenKind::Equals) {
            let aliased = self.parse_type_ref()?;
            if let TypeRefKind::Record(fields) = aliased.kind {
                return Ok(DeclKind::Type(TypeDecl {
                    name,
                    params,
                    constructors: Vec::new(),
                    is_record: true,
                    record_fields: fields,
                    is_gadt: false,
                }));
            }
            return Ok(DeclKind::TypeAlias(TypeAliasDecl {
                name,
                params,
                aliased,
            }));
        }

        let mut constructors = Vec::new();
        while self.eat(TokenKind::Pipe) {
            constructors.push(self.parse_constructor()?);
        }

        Ok(DeclKind::Type(TypeDecl {
            name,
            params,
            constructors,
            is_record: false,
            record_fields: Vec::new(),
            is_gadt: false,
        }))
    }

    /// One `Name field-types...` constructor alternative.
    fn parse_constructor(&mut self) -> Result<Constructor, ParseError> {
        let (name, name_span) = self.expect_identifier("Expected constructor name")?;
        let mut fields = Vec::new();
        while matches!(
            self.kind(),
            TokenKind::Ident | TokenKind::LBracket | TokenKind::LParen | TokenKind::LBrace
        ) {
            fields.push(self.parse_type_atom()?);
        }
        let span = name_span.merge(self.prev_span());
        Ok(Constructor { name, fields, span })
    }

    /// `gadt Name params where { Ctor T1 T2, ... }`. The last field of
    /// each constructor is its result type.
    fn parse_gadt_decl(&mut self) -> Result<TypeDecl, ParseError> {
        let (name, _) = self.expect_identifier("Expected type name")?;

        let mut params = Vec::new();
        while self.check(TokenKind::Ident) {
            let (param, _) = self.expect_identifier("Expected type parameter")?;
            params.push(param);
        }

        self.expect(TokenKind::Where, "Expected 'where'")?;
        self.expect(TokenKind::LBrace, "Expected '{'")?;

        let mut constructors = Vec::new();
        while !self.check(TokenKind::RBrace) {
            constructors.push(self.parse_constructor()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "Expected '}'")?;

        Ok(TypeDecl {
            name,
            params,
            constructors,
            is_record: false,
            record_fields: Vec::new(),
            is_gadt: true,
        })
    }

    /// `import [python] a.b.c [as alias] [(name1, name2)]`.
    fn parse_import_decl(&mut self) -> Result<ImportDecl, ParseError> {
        let is_python = if self.at_ident_text("python") {
            self.bump();
            true
        } else {
            false
        };

        let mut parts = vec![self.expect_identifier("Expected module name")?.0];
        while self.eat(TokenKind::Dot) {
            parts.push(self.expect_identifier("Expected module part")?.0);
        }
        let module = parts.join(".");

        let alias = if self.eat(TokenKind::As) {
            Some(self.expect_identifier("Expected alias")?.0)
        } else {
            None
        };

        let exposing = if self.eat(TokenKind::LParen) {
            let mut names = Vec::new();
            if !self.check(TokenKind::RParen) {
                names.push(self.expect_identifier("Expected exposed name")?.0);
                while self.eat(TokenKind::Comma) {
                    names.push(self.expect_identifier("Expected exposed name")?.0);
                }
            }
            self.expect(TokenKind::RParen, "Expected ')'")?;
            Some(names)
        } else {
            None
        };

        Ok(ImportDecl {
            module,
            alias,
            exposing,
            is_python,
        })
    }

    /// `interface Name params [: Super1, Super2] where { m: T, ... }`.
    fn parse_interface_decl(&mut self) -> Result<InterfaceDecl, ParseError> {
        let (name, _) = self.expect_identifier("Expected interface name")?;

        let mut params = Vec::new();
        while self.check(TokenKind::Ident) {
            let (param, _) = self.expect_identifier("Expected type parameter")?;
            params.push(param);
        }

        let mut superclasses = Vec::new();
        if self.eat(TokenKind::Colon) {
            superclasses.push(self.expect_identifier("Expected superclass name")?.0);
            while self.eat(TokenKind::Comma) {
                superclasses.push(self.expect_identifier("Expected superclass name")?.0);
            }
        }

        self.expect(TokenKind::Where, "Expected 'where'")?;
        self.expect(TokenKind::LBrace, "Expected '{'")?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let (method_name, method_span) = self.expect_identifier("Expected method name")?;
            self.expect(TokenKind::Colon, "Expected ':'")?;
            let ty = self.parse_type_ref()?;
            let span = method_span.merge(ty.span);
            methods.push(InterfaceMethod {
                name: method_name,
                ty,
                span,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "Expected '}'")?;

        Ok(InterfaceDecl {
            name,
            params,
            methods,
            superclasses,
        })
    }

    /// `impl Class TypeRef where { m params = body, ... }`.
    fn parse_impl_decl(&mut self) -> Result<ImplDecl, ParseError> {
        let (class_name, _) = self.expect_identifier("Expected class name")?;
        let type_ref = self.parse_type_ref()?;

        self.expect(TokenKind::Where, "Expected 'where'")?;
        self.expect(TokenKind::LBrace, "Expected '{'")?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let (method_name, method_span) = self.expect_identifier("Expected method name")?;

            let mut params: Vec<Param> = Vec::new();
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

            self.expect(TokenKind::Equals, "Expected '='")?;
            let body = self.parse_expr()?;
            let span = method_span.merge(body.span);
            methods.push(ImplMethod {
                name: method_name,
                params,
                body,
                span,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "Expected '}'")?;

        Ok(ImplDecl {
            class_name,
            type_ref,
            methods,
        })
    }

    /// `effect Name [param] { op: T, ... }`.
    fn parse_effect_decl(&mut self) -> Result<EffectDecl, ParseError> {
        let (name, _) = self.expect_identifier("Expected effect name")?;

        let type_param = if self.check(TokenKind::Ident) {
            Some(self.expect_identifier("Expected type parameter")?.0)
        } else {
            None
        };

        self.expect(TokenKind::LBrace, "Expected '{'")?;

        let mut operations = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let (op_name, op_span) = self.expect_identifier("Expected operation name")?;
            self.expect(TokenKind::Colon, "Expected ':'")?;
            let ty = self.parse_type_ref()?;
            let span = op_span.merge(ty.span);
            operations.push(EffectOp {
                name: op_name,
                ty,
                span,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "Expected '}'")?;

        Ok(EffectDecl {
            name,
            type_param,
            operations,
        })
    }

    /// `handler name [: Effect] { op params -> body, ... }`.
    fn parse_handler_decl(&mut self) -> Result<HandlerDecl, ParseError> {
        let (name, _) = self.expect_identifier("Expected handler name")?;
        let effect_name = if self.eat(TokenKind::Colon) {
            self.expect_identifier("Expected effect name")?.0
        } else {
            name.clone()
        };

        self.expect(TokenKind::LBrace, "Expected '{'")?;

        let mut cases = Vec::new();
        while !self.check(TokenKind::RBrace) {
            cases.push(self.parse_handler_case()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "Expected '}'")?;

        Ok(HandlerDecl {
            name,
            effect_name,
            cases,
        })
    }

    /// `export name1, name2`.
    fn parse_export_decl(&mut self) -> Result<ExportDecl, ParseError> {
        let mut names = vec![self.expect_identifier("Expected exported name")?.0];
        while self.eat(TokenKind::Comma) {
            names.push(self.expect_identifier("Expected exported name")?.0);
        }
        Ok(ExportDecl { names })
    }
}
