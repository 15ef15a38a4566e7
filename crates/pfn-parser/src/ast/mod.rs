//! The Pfn abstract syntax tree.
//!
//! Every node is a `{ kind, span }` pair: the kind is a closed enum of
//! variants and the span covers the node's full source extent, with child
//! spans lying within parent spans. Nodes are immutable after parsing.

pub mod expr;
pub mod item;
pub mod pat;
pub mod types;

pub use expr::{
    BinOpKind, DoBinding, Expr, ExprKind, HandlerCase, MatchCase, Param, RecordField, UnaryOpKind,
};
pub use item::{
    Constructor, Decl, DeclKind, DefDecl, EffectDecl, EffectOp, ExportDecl, HandlerDecl, ImplDecl,
    ImplMethod, ImportDecl, InterfaceDecl, InterfaceMethod, Module, TypeAliasDecl, TypeDecl,
};
pub use pat::{Pattern, PatternKind};
pub use types::{TypeRef, TypeRefKind};
