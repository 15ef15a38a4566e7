use serde::Serialize;

use pfn_common::span::Span;

use crate::ast::expr::{Expr, HandlerCase, Param};
use crate::ast::types::TypeRef;

/// A parsed module: an optional `module Name(.Part)*` header plus its
/// declarations in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub name: Option<String>,
    pub declarations: Vec<Decl>,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

impl Decl {
    pub fn new(kind: DeclKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeclKind {
    Def(DefDecl),
    Type(TypeDecl),
    TypeAlias(TypeAliasDecl),
    Import(ImportDecl),
    Export(ExportDecl),
    Interface(InterfaceDecl),
    Impl(ImplDecl),
    Effect(EffectDecl),
    Handler(HandlerDecl),
}

/// `def name params (: return_type)? = body`, optionally preceded by the
/// `@py.export("name")` decorator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub body: Expr,
    pub is_exported: bool,
    pub export_name: Option<String>,
}

/// One constructor of a sum type, e.g. `Circle Float` in
/// `type Shape | Circle Float | Point`. For GADT declarations the last
/// field is the constructor's result type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constructor {
    pub name: String,
    pub fields: Vec<TypeRef>,
    pub span: Span,
}

/// `type Name params | C1 ... | C2 ...` (sum form),
/// `type Name params = { field: T, ... }` (record form), or
/// `gadt Name params where { ... }` (GADT form).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub params: Vec<String>,
    pub constructors: Vec<Constructor>,
    pub is_record: bool,
    pub record_fields: Vec<(String, TypeRef)>,
    pub is_gadt: bool,
}

/// `type Name params = <typeref>` where the right-hand side is not a
/// record type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAliasDecl {
    pub name: String,
    pub params: Vec<String>,
    pub aliased: TypeRef,
}

/// `import [python] a.b.c [as alias] [(name1, name2)]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDecl {
    pub module: String,
    pub alias: Option<String>,
    pub exposing: Option<Vec<String>>,
    pub is_python: bool,
}

/// `export name1, name2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDecl {
    pub names: Vec<String>,
}

/// One method signature of an interface declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub ty: TypeRef,
    pub span: Span,
}

/// `interface Name params [: Super1, Super2] where { method: T, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub params: Vec<String>,
    pub methods: Vec<InterfaceMethod>,
    pub superclasses: Vec<String>,
}

/// One method implementation inside an impl block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImplMethod {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Expr,
    pub span: Span,
}

/// `impl Class TypeRef where { method params = body, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImplDecl {
    pub class_name: String,
    pub type_ref: TypeRef,
    pub methods: Vec<ImplMethod>,
}

/// One operation signature of an effect declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectOp {
    pub name: String,
    pub ty: TypeRef,
    pub span: Span,
}

/// `effect Name [param] { op: T, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectDecl {
    pub name: String,
    pub type_param: Option<String>,
    pub operations: Vec<EffectOp>,
}

/// `handler name [: Effect] { op params -> body, ... }`. Without the
/// colon the handler's name doubles as the effect name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerDecl {
    pub name: String,
    pub effect_name: String,
    pub cases: Vec<HandlerCase>,
}
