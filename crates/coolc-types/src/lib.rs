//! Cool class system
//!
//! The symbol environment shared by the checker and the code generator:
//! an arena of class, attribute and method descriptors, the subtype lattice
//! over it, inheritance flattening with vtable slot assignment, and the
//! reversible binding stack used for lexical scopes.

#![warn(missing_docs)]

pub mod builtins;
pub mod class;
pub mod error;
pub mod scope;
pub mod subtyping;
pub mod table;

pub use builtins::BuiltinMethod;
pub use class::{
    AttributeDescriptor, AttributeId, ClassDescriptor, ClassId, DeclRef, MethodBody,
    MethodDescriptor, MethodId, Param, Primitive,
};
pub use error::EnvError;
pub use scope::{ScopeFrame, ScopedBindings};
pub use table::ClassTable;
