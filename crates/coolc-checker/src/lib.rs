//! Cool Semantic Analysis
//!
//! Builds the class table from a program and type-checks every expression.
//!
//! Five passes, each assuming the previous ones succeeded:
//! 1. class discovery
//! 2. parent resolution
//! 3. cycle detection
//! 4. attribute and method collection, then inheritance flattening
//! 5. expression checking
//!
//! The first error aborts the whole check.
//!
//! # Usage
//!
//! ```ignore
//! use coolc_checker::check;
//!
//! let (table, result) = check(&program)?;
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! ```

#![warn(missing_docs)]

pub mod binder;
pub mod checker;
pub mod error;

pub use binder::{check_hierarchy, Binder};
pub use checker::{CheckResult, TypeChecker, TypeEnv};
pub use error::{CheckError, CheckWarning};

use coolc_ast::Program;
use coolc_types::ClassTable;

/// Run all five passes over `program`.
///
/// Returns the populated class table together with the recorded expression
/// types.
pub fn check(program: &Program) -> Result<(ClassTable, CheckResult), CheckError> {
    let mut table = ClassTable::new();
    Binder::new(&mut table).bind_program(program)?;
    let result = TypeChecker::new(&table).check_program(program)?;
    Ok((table, result))
}
