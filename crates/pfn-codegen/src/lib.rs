//! Pfn code generator: elaborated AST -> Python source text.
//!
//! The emitted host code is expression-oriented: curried single-argument
//! lambdas for functions, immediately-invoked lambdas for lets, condition
//! chains for matches, dataclasses for algebraic data types, and a small
//! inline runtime prelude (`Record`, `_handle`, `_perform`) so emitted
//! modules load under a stock Python interpreter.
//!
//! The generator is pure and deterministic: declarations emit in source
//! order, case chains preserve source order, and fresh helper names come
//! from a monotonically increasing counter.

mod codegen;

use pfn_parser::ast::Module;

pub use codegen::CodeGenerator;

/// Generate Python source for a whole module.
pub fn generate_module(module: &Module) -> String {
    CodeGenerator::new().generate_module(module)
}

/// Generate Python source for a single expression (used by tests and the
/// driver's collaborators).
pub fn generate_expr(expr: &pfn_parser::ast::Expr) -> String {
    CodeGenerator::new().generate(expr)
}
