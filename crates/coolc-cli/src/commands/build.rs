//! `coolc build` - check and emit LLVM IR.

use crate::load_program;
use anyhow::Context;
use coolc_compiler::CodegenOptions;
use std::path::{Path, PathBuf};
use tracing::info;

/// IR goes to `output`, or next to the input with an `.ll` extension.
pub fn execute(file: &Path, output: Option<PathBuf>, lenient: bool) -> anyhow::Result<PathBuf> {
    let program = load_program(file)?;
    let options = if lenient {
        CodegenOptions::lenient()
    } else {
        CodegenOptions::strict()
    };
    let ir = coolc_compiler::compile(&program, options)
        .with_context(|| format!("Failed to compile {}", file.display()))?;

    let output = output.unwrap_or_else(|| file.with_extension("ll"));
    std::fs::write(&output, ir)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(output = %output.display(), lenient, "wrote module");
    Ok(output)
}
