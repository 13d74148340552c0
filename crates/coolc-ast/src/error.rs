//! Errors raised while loading an AST

use thiserror::Error;

/// Errors that can occur while reading a serialized program
#[derive(Debug, Error)]
pub enum AstError {
    /// The input is not a well-formed JSON program tree
    #[error("Malformed AST input: {0}")]
    Json(#[from] serde_json::Error),

    /// The tree parsed but contains no classes
    #[error("Program declares no classes")]
    EmptyProgram,
}
