use serde::Serialize;

use pfn_common::span::Span;

/// A surface-syntax type reference, as written in annotations and
/// declarations. Resolved into semantic types by the type checker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeRef {
    pub kind: TypeRefKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeRefKind {
    /// A named type, possibly applied to arguments: `Int`, `List a`,
    /// `Result e a`. List sugar `[T]` parses as `List T`.
    Simple { name: String, args: Vec<TypeRef> },
    /// A function type `param -> result`; right-associative.
    Fun {
        param: Box<TypeRef>,
        result: Box<TypeRef>,
    },
    /// A tuple type `(T1, T2, ...)`.
    Tuple(Vec<TypeRef>),
    /// A record type `{ field: T, ... }`.
    Record(Vec<(String, TypeRef)>),
}

impl TypeRef {
    pub fn new(kind: TypeRefKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The head name of a simple type ref, if any.
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            TypeRefKind::Simple { name, .. } => Some(name),
            _ => None,
        }
    }
}
