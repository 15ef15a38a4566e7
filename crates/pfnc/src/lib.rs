//! The Pfn compiler pipeline: source text in, Python text out.
//!
//! This crate is the driver-facing facade over the pipeline crates:
//! `tokenize` -> `parse` -> (optionally) `check_module` ->
//! `generate_module`. The first error from any stage aborts the
//! pipeline; no partial output is produced.

use std::fmt;

use pfn_common::error::LexError;
use pfn_common::span::Span;
use pfn_parser::ast::Module;
use pfn_parser::error::ParseError;
use pfn_typeck::{ModuleTypes, TypeError};

/// A pipeline error from any stage, with the stage's prefix attached to
/// its message.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    Type(TypeError),
}

impl CompileError {
    /// The source span the error points at.
    pub fn span(&self) -> Span {
        match self {
            CompileError::Lex(err) => err.span,
            CompileError::Parse(err) => err.token.span,
            CompileError::Type(err) => err.span(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex(err) => write!(f, "Lexer error: {}", err.kind),
            CompileError::Parse(err) => write!(f, "Parser error: {}", err.message),
            CompileError::Type(err) => write!(f, "Type error: {err}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Lex(err)
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::Parse(err)
    }
}

impl From<TypeError> for CompileError {
    fn from(err: TypeError) -> Self {
        CompileError::Type(err)
    }
}

/// Parse a source string into a module.
pub fn parse_source(source: &str) -> Result<Module, CompileError> {
    let tokens = pfn_lexer::tokenize(source)?;
    Ok(pfn_parser::parse(tokens)?)
}

/// Compile a source string to Python text. With `typecheck` set the
/// module must typecheck first.
pub fn compile_source(source: &str, typecheck: bool) -> Result<String, CompileError> {
    let module = parse_source(source)?;
    if typecheck {
        pfn_typeck::check_module(&module)?;
    }
    Ok(pfn_codegen::generate_module(&module))
}

/// Typecheck a source string.
///
/// Returns `(true, signatures)` on success -- one `name : type` line per
/// top-level definition -- or `(false, message)` with the failing
/// stage's error.
pub fn typecheck_source(source: &str) -> (bool, String) {
    match check_source(source) {
        Ok(types) => {
            let mut lines: Vec<String> = types
                .schemes
                .iter()
                .map(|(name, scheme)| format!("{name} : {}", scheme.ty))
                .collect();
            if lines.is_empty() {
                lines.push("Type check passed".to_string());
            }
            (true, lines.join("\n"))
        }
        Err(err) => (false, err.to_string()),
    }
}

/// Parse and typecheck, returning the inferred module types.
pub fn check_source(source: &str) -> Result<ModuleTypes, CompileError> {
    let module = parse_source(source)?;
    Ok(pfn_typeck::check_module(&module)?)
}
