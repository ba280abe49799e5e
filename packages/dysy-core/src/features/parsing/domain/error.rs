//! Parse error types

use thiserror::Error;

use crate::shared::models::Line;

/// Failure to turn subject source into the typed AST
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// tree-sitter rejected the grammar
    #[error("Failed to set Python language: {0}")]
    Language(String),

    /// tree-sitter returned no tree (cancelled or timed out)
    #[error("Failed to parse Python code")]
    NoTree,

    /// Source contains a syntax error
    #[error("Syntax error at line {line}")]
    Syntax { line: Line },

    /// Valid Python outside the supported subset
    #[error("Unsupported {kind} at line {line}")]
    Unsupported { kind: String, line: Line },

    /// Numeric literal that does not fit the value model
    #[error("Invalid literal '{text}' at line {line}")]
    Literal { text: String, line: Line },
}

impl ParseError {
    pub fn unsupported(kind: impl Into<String>, line: Line) -> Self {
        ParseError::Unsupported {
            kind: kind.into(),
            line,
        }
    }
}
