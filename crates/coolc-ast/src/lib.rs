//! Cool abstract syntax tree
//!
//! The tree handed to the checker and the code generator by an external
//! parser. Every construct has its own variant; every expression carries an
//! [`ExprId`] so later phases can attach facts (static types) in side tables
//! instead of mutating the tree.
//!
//! # Usage
//!
//! ```ignore
//! use coolc_ast::Program;
//!
//! let program = Program::from_json(&std::fs::read_to_string("hello.json")?)?;
//! for class in &program.classes {
//!     println!("{}", class.name);
//! }
//! ```

pub mod ast;
pub mod builder;
pub mod error;
pub mod visitor;

pub use ast::*;
pub use builder::AstBuilder;
pub use error::AstError;
pub use visitor::{walk_expr_mut, VisitorMut};

/// Keyword naming the receiver inside a method body.
pub const SELF_NAME: &str = "self";
