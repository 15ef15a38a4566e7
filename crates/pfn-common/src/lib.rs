//! Shared foundation types for the Pfn compiler.
//!
//! Every later stage (lexer, parser, type checker, code generator) consumes
//! the [`span::Span`] and [`token::Token`] types defined here. Nothing in
//! this crate depends on the rest of the pipeline.

pub mod error;
pub mod span;
pub mod token;
