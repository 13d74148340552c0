//! Code generation errors

use coolc_checker::CheckError;
use thiserror::Error;

/// Code generation result type
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Errors raised while lowering a checked program
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodegenError {
    #[error("Unsupported construct in code generation: {construct}")]
    UnsupportedConstruct { construct: String },

    #[error("Malformed AST: {reason}")]
    MalformedTree { reason: String },

    #[error("Program has no Main class")]
    MissingMainClass,

    #[error("Class Main has no main method")]
    MissingMainMethod,

    #[error("Main.main takes {arity} argument(s), but the entry point passes none")]
    MainTakesArguments { arity: usize },
}

impl CodegenError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CodegenError::MalformedTree {
            reason: reason.into(),
        }
    }
}

/// Failure of the whole check-then-generate pipeline
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("Type check failed: {0}")]
    Check(#[from] CheckError),

    #[error("Code generation failed: {0}")]
    Codegen(#[from] CodegenError),
}
