//! AST node definitions
//!
//! - `Program` / `Class` / `Feature` - declarations
//! - `Expr` / `ExprKind` - expressions, one variant per construct

mod class;
mod expression;

pub use class::*;
pub use expression::*;

use crate::error::AstError;
use crate::visitor::{walk_expr_mut, VisitorMut};

/// A whole compilation unit: the classes in source order
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Program {
    pub classes: Vec<Class>,
}

impl Program {
    pub fn new(classes: Vec<Class>) -> Self {
        Self { classes }
    }

    /// Read a program from its JSON form and number its expressions.
    pub fn from_json(input: &str) -> Result<Self, AstError> {
        let mut program: Program = serde_json::from_str(input)?;
        if program.classes.is_empty() {
            return Err(AstError::EmptyProgram);
        }
        program.renumber();
        Ok(program)
    }

    /// Serialize to the JSON interchange form (ids are not written).
    pub fn to_json(&self) -> Result<String, AstError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Assign dense pre-order ids to every expression, starting at 0.
    ///
    /// Returns the number of expressions in the program.
    pub fn renumber(&mut self) -> u32 {
        let mut numberer = Renumber { next: 0 };
        for class in &mut self.classes {
            for feature in &mut class.features {
                match feature {
                    Feature::Attribute { init: Some(init), .. } => numberer.visit_expr_mut(init),
                    Feature::Attribute { init: None, .. } => {}
                    Feature::Method { body, .. } => numberer.visit_expr_mut(body),
                }
            }
        }
        numberer.next
    }
}

struct Renumber {
    next: u32,
}

impl VisitorMut for Renumber {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        expr.id = ExprId(self.next);
        self.next += 1;
        walk_expr_mut(self, expr);
    }
}
