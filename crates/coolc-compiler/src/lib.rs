//! Cool Compiler - Checked AST to LLVM IR
//!
//! Lowers a type-checked Cool program into a textual LLVM module
//! (typed-pointer syntax). Objects are `GC_malloc`ed instances whose first
//! field points at a per-class vtable; dispatch goes through vtable slots.
//!
//! # Usage
//!
//! ```ignore
//! use coolc_compiler::{compile, CodegenOptions};
//!
//! let ir = compile(&program, CodegenOptions::default())?;
//! std::fs::write("out.ll", ir)?;
//! ```

pub mod error;
pub mod ir;
pub mod lower;
pub mod options;
pub mod runtime;

pub use error::{CodegenError, CodegenResult, CompileError};
pub use ir::IrModule;
pub use lower::Compiler;
pub use options::CodegenOptions;

use coolc_ast::Program;
use tracing::{info, warn};

/// Check `program` and lower it to IR text.
///
/// Nothing is generated when checking fails.
pub fn compile(program: &Program, options: CodegenOptions) -> Result<String, CompileError> {
    let module = compile_module(program, options)?;
    Ok(module.to_string())
}

/// Check `program` and lower it to an [`IrModule`].
pub fn compile_module(program: &Program, options: CodegenOptions) -> Result<IrModule, CompileError> {
    let (table, result) = coolc_checker::check(program)?;
    for warning in &result.warnings {
        warn!("{}", warning);
    }
    let module = Compiler::new(&table, &result, options).generate_module(program)?;
    info!(
        classes = table.len(),
        functions = module.function_count(),
        "compiled program"
    );
    Ok(module)
}
