use std::fmt;

use serde::Serialize;

use pfn_common::span::Span;

use crate::ast::pat::Pattern;
use crate::ast::types::TypeRef;

/// An expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// A function or lambda parameter, with an optional type annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub type_annotation: Option<TypeRef>,
    pub span: Span,
}

/// One `pattern [if guard] -> body` case of a match expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

/// One `name <- value` binding of a do block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoBinding {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// A `name: value` field of a record literal or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordField {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

/// One operation arm of a handler declaration or handle expression.
///
/// A parameter literally named `resume` is the continuation binder and is
/// surfaced separately for the effect runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerCase {
    pub op_name: String,
    pub params: Vec<Param>,
    pub resume_param: Option<String>,
    pub body: Expr,
    pub span: Span,
}

/// Binary operators, lowest to highest precedence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOpKind {
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `::` -- cons; right-associative.
    Cons,
    /// `++` -- list concatenation.
    Concat,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl BinOpKind {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mul | BinOpKind::Div | BinOpKind::Mod
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOpKind::Lt | BinOpKind::LtEq | BinOpKind::Gt | BinOpKind::GtEq
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOpKind::Eq | BinOpKind::NotEq)
    }
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOpKind::Or => "||",
            BinOpKind::And => "&&",
            BinOpKind::Eq => "==",
            BinOpKind::NotEq => "!=",
            BinOpKind::Lt => "<",
            BinOpKind::LtEq => "<=",
            BinOpKind::Gt => ">",
            BinOpKind::GtEq => ">=",
            BinOpKind::Cons => "::",
            BinOpKind::Concat => "++",
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
            BinOpKind::Mod => "%",
        };
        f.write_str(s)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOpKind {
    /// `-`
    Neg,
    /// `!`
    Not,
}

impl fmt::Display for UnaryOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOpKind::Neg => f.write_str("-"),
            UnaryOpKind::Not => f.write_str("!"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    Unit,
    Var(String),
    /// `fn p1 p2 => body` or `\p1 p2 -> body`.
    Lambda { params: Vec<Param>, body: Box<Expr> },
    /// Function application. The parser normalises both juxtaposition and
    /// parenthesised argument lists into curried single-argument nodes, so
    /// `args` always has exactly one element after parsing.
    App { func: Box<Expr>, args: Vec<Expr> },
    BinOp {
        left: Box<Expr>,
        op: BinOpKind,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOpKind,
        operand: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `let name = value in body`.
    Let {
        name: String,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// `let (a, b) = value in body` and other pattern-shaped binders.
    LetPattern {
        pattern: Pattern,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// `let f x y = value in body`. The value may reference `name`
    /// (recursive by syntactic convention); codegen materialises the
    /// fixed point.
    LetFunc {
        name: String,
        params: Vec<Param>,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    Match {
        scrutinee: Box<Expr>,
        cases: Vec<MatchCase>,
    },
    DoNotation {
        bindings: Vec<DoBinding>,
        body: Box<Expr>,
    },
    ListLit(Vec<Expr>),
    TupleLit(Vec<Expr>),
    RecordLit(Vec<RecordField>),
    FieldAccess { expr: Box<Expr>, field: String },
    RecordUpdate {
        record: Box<Expr>,
        updates: Vec<RecordField>,
    },
    IndexAccess { expr: Box<Expr>, index: Box<Expr> },
    /// `e[start:end]` or `e[start:end:step]`, any bound omissible.
    Slice {
        expr: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    /// `handle e with | op args -> body ...` or `handle e with name`.
    Handle {
        expr: Box<Expr>,
        cases: Vec<HandlerCase>,
        handler_name: Option<String>,
    },
    /// `perform Effect.op(args...)`.
    Perform {
        effect: String,
        op: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Whether this expression mentions `name` as a free variable.
    ///
    /// Walks the tree but stops descending wherever `name` is re-bound by
    /// an inner binder (lambda/let/match/do), so shadowed uses do not
    /// count. Codegen uses this to decide whether a binding is recursive.
    pub fn refers_to(&self, name: &str) -> bool {
        match &self.kind {
            ExprKind::Var(v) => v == name,
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Char(_)
            | ExprKind::Bool(_)
            | ExprKind::Unit => false,
            ExprKind::Lambda { params, body } => {
                !params.iter().any(|p| p.name == name) && body.refers_to(name)
            }
            ExprKind::App { func, args } => {
                func.refers_to(name) || args.iter().any(|a| a.refers_to(name))
            }
            ExprKind::BinOp { left, right, .. } => left.refers_to(name) || right.refers_to(name),
            ExprKind::UnaryOp { operand, .. } => operand.refers_to(name),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => cond.refers_to(name) || then_branch.refers_to(name) || else_branch.refers_to(name),
            ExprKind::Let {
                name: bound,
                value,
                body,
            } => value.refers_to(name) || (bound != name && body.refers_to(name)),
            ExprKind::LetPattern {
                pattern,
                value,
                body,
            } => {
                value.refers_to(name)
                    || (!pattern.bound_names().iter().any(|n| n == name) && body.refers_to(name))
            }
            ExprKind::LetFunc {
                name: bound,
                params,
                value,
                body,
            } => {
                let shadowed_in_value =
                    bound == name || params.iter().any(|p| p.name == name);
                (!shadowed_in_value && value.refers_to(name))
                    || (bound != name && body.refers_to(name))
            }
            ExprKind::Match { scrutinee, cases } => {
                scrutinee.refers_to(name)
                    || cases.iter().any(|case| {
                        if case.pattern.bound_names().iter().any(|n| n == name) {
                            return false;
                        }
                        case.guard.as_ref().is_some_and(|g| g.refers_to(name))
                            || case.body.refers_to(name)
                    })
            }
            ExprKind::DoNotation { bindings, body } => {
                let mut shadowed = false;
                for binding in bindings {
                    if !shadowed && binding.value.refers_to(name) {
                        return true;
                    }
                    if binding.name == name {
                        shadowed = true;
                    }
                }
                !shadowed && body.refers_to(name)
            }
            ExprKind::ListLit(elements) | ExprKind::TupleLit(elements) => {
                elements.iter().any(|e| e.refers_to(name))
            }
            ExprKind::RecordLit(fields) => fields.iter().any(|f| f.value.refers_to(name)),
            ExprKind::FieldAccess { expr, .. } => expr.refers_to(name),
            ExprKind::RecordUpdate { record, updates } => {
                record.refers_to(name) || updates.iter().any(|f| f.value.refers_to(name))
            }
            ExprKind::IndexAccess { expr, index } => expr.refers_to(name) || index.refers_to(name),
            ExprKind::Slice {
                expr,
                start,
                end,
                step,
            } => {
                expr.refers_to(name)
                    || [start, end, step]
                        .iter()
                        .any(|part| part.as_ref().is_some_and(|e| e.refers_to(name)))
            }
            ExprKind::Handle { expr, cases, .. } => {
                expr.refers_to(name)
                    || cases.iter().any(|case| {
                        !case.params.iter().any(|p| p.name == name) && case.body.refers_to(name)
                    })
            }
            ExprKind::Perform { args, .. } => args.iter().any(|a| a.refers_to(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 0, 1, 1)
    }

    fn var(name: &str) -> Expr {
        Expr::new(ExprKind::Var(name.to_string()), span())
    }

    fn param(name: &str) -> Param {
        Param {
            name: name.to_string(),
            type_annotation: None,
            span: span(),
        }
    }

    #[test]
    fn refers_to_free_variable() {
        let expr = Expr::new(
            ExprKind::BinOp {
                left: Box::new(var("f")),
                op: BinOpKind::Add,
                right: Box::new(var("x")),
            },
            span(),
        );
        assert!(expr.refers_to("f"));
        assert!(!expr.refers_to("g"));
    }

    #[test]
    fn lambda_param_shadows() {
        let expr = Expr::new(
            ExprKind::Lambda {
                params: vec![param("f")],
                body: Box::new(var("f")),
            },
            span(),
        );
        assert!(!expr.refers_to("f"));
    }

    #[test]
    fn let_shadows_body_but_not_value() {
        // let f = f in f -- the value's `f` is the outer one.
        let expr = Expr::new(
            ExprKind::Let {
                name: "f".to_string(),
                value: Box::new(var("f")),
                body: Box::new(var("f")),
            },
            span(),
        );
        assert!(expr.refers_to("f"));

        let shadowed = Expr::new(
            ExprKind::Let {
                name: "f".to_string(),
                value: Box::new(var("x")),
                body: Box::new(var("f")),
            },
            span(),
        );
        assert!(!shadowed.refers_to("f"));
    }

    #[test]
    fn match_pattern_binding_shadows_body() {
        use crate::ast::pat::{Pattern, PatternKind};
        let expr = Expr::new(
            ExprKind::Match {
                scrutinee: Box::new(var("xs")),
                cases: vec![MatchCase {
                    pattern: Pattern::new(PatternKind::Var("n".to_string()), span()),
                    guard: None,
                    body: var("n"),
                }],
            },
            span(),
        );
        assert!(!expr.refers_to("n"));
        assert!(expr.refers_to("xs"));
    }
}
