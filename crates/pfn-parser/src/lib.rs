//! Pfn parser: token stream -> module AST.
//!
//! Recursive descent with a precedence ladder for binary operators.
//! Application is curried at parse time: both juxtaposition (`f x y`) and
//! parenthesised argument lists (`f(x, y)`) normalise to nested
//! single-argument [`ast::ExprKind::App`] nodes. Backtracking is a saved
//! token index, used in the two places the grammar needs it: telling an
//! application argument apart from a following binding, and deciding
//! whether a match expression has another case.

pub mod ast;
pub mod error;
mod parser;

use ast::Module;
use error::ParseError;
use pfn_common::token::Token;
use parser::Parser;

/// Parse a token stream (as produced by `pfn_lexer::tokenize`) into a
/// module. The first syntactic error aborts the parse.
pub fn parse(tokens: Vec<Token>) -> Result<Module, ParseError> {
    Parser::new(tokens).parse_module()
}

/// Parse a single expression. Used by tests and the driver's REPL-side
/// collaborators; ordinary compilation goes through [`parse`].
pub fn parse_expr(tokens: Vec<Token>) -> Result<ast::Expr, ParseError> {
    Parser::new(tokens).parse_standalone_expr()
}
