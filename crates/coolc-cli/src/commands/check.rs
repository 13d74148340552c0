//! `coolc check` - type-check without generating code.

use crate::load_program;
use anyhow::Context;
use std::path::Path;

pub fn execute(file: &Path) -> anyhow::Result<()> {
    let program = load_program(file)?;
    let (table, result) = coolc_checker::check(&program)
        .with_context(|| format!("{} failed to type-check", file.display()))?;

    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    println!(
        "{}: ok ({} classes, {} expressions typed)",
        file.display(),
        table.len(),
        result.expr_types.len()
    );
    Ok(())
}
