//! Cool compiler driver
//!
//! Reads a program in its JSON AST form and runs the checker and code
//! generator over it. The `coolc` binary is a thin clap front end over
//! [`commands`].

pub mod commands;
pub mod logging;

use anyhow::Context;
use coolc_ast::Program;
use std::path::Path;
use tracing::debug;

/// Read and parse a JSON AST file
pub fn load_program(path: &Path) -> anyhow::Result<Program> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let program = Program::from_json(&input)
        .with_context(|| format!("Failed to load AST from {}", path.display()))?;
    debug!(path = %path.display(), classes = program.classes.len(), "loaded program");
    Ok(program)
}
