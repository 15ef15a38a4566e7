use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A lexer error with location information.
///
/// Lexing aborts at the first error; the span points at the offending
/// character or the start of the unterminated construct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    /// Create a new lexer error.
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The specific kind of lexer error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    /// An unexpected character was encountered.
    UnexpectedCharacter(char),
    /// A string literal was not closed before end of line or input.
    UnterminatedString,
    /// A `\` escape at the very end of input.
    UnterminatedEscape,
    /// A character literal with no character: `''`.
    EmptyCharLiteral,
    /// A character literal was not closed with `'`.
    UnterminatedCharLiteral,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character: {c:?}"),
            Self::UnterminatedString => write!(f, "unterminated string"),
            Self::UnterminatedEscape => write!(f, "unterminated escape sequence"),
            Self::EmptyCharLiteral => write!(f, "empty character literal"),
            Self::UnterminatedCharLiteral => write!(f, "unterminated character literal"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.span)
    }
}

impl std::error::Error for LexError {}
