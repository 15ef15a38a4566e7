use std::fmt;

use serde::Serialize;

use pfn_common::token::Token;

/// A parse error: the offending token plus a message describing what was
/// expected. The first syntactic error aborts the parse; there is no
/// recovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub message: String,
    pub token: Token,
}

impl ParseError {
    pub fn new(message: impl Into<String>, token: Token) -> Self {
        Self {
            message: message.into(),
            token,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.token.span)
    }
}

impl std::error::Error for ParseError {}
