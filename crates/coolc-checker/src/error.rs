//! Error types for semantic analysis
//!
//! Checking stops at the first error; every variant carries enough names
//! to produce a self-contained message.

use coolc_types::EnvError;
use thiserror::Error;

/// Errors that reject a program
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    /// Class table violation: duplicate class, unknown type name, duplicate
    /// attribute or method, reserved name, incompatible override
    #[error(transparent)]
    Env(#[from] EnvError),

    /// The tree has a shape no parser should produce
    #[error("Malformed AST: {reason}")]
    MalformedTree {
        /// What was wrong
        reason: String,
    },

    /// Inheriting from Int, String or Bool
    #[error("Class {class} inherits from prohibited class {parent}")]
    ProhibitedInheritance {
        /// Offending class
        class: String,
        /// Sealed parent
        parent: String,
    },

    /// The parent chain of a class loops
    #[error("Class hierarchy is not a tree: {class} is its own ancestor")]
    InheritanceCycle {
        /// A class on the cycle
        class: String,
    },

    /// Identifier is neither a local nor an attribute
    #[error("Unknown identifier {name} in class {class}")]
    UnknownAttribute {
        /// Class being checked
        class: String,
        /// Identifier
        name: String,
    },

    /// Assignment to something other than a plain identifier
    #[error("Cannot assign to {construct} in class {class}")]
    InvalidAssignmentTarget {
        /// Class being checked
        class: String,
        /// Construct found on the left
        construct: String,
    },

    /// `self` assigned to or rebound
    #[error("'self' cannot be {context} in class {class}")]
    SelfAssignment {
        /// Class being checked
        class: String,
        /// How `self` was misused
        context: &'static str,
    },

    /// Value does not conform to the declared type
    #[error("{context}: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Where the value flows
        context: String,
        /// Declared type
        expected: String,
        /// Type of the value
        actual: String,
    },

    /// Method body does not conform to the declared return type
    #[error("Method {class}.{method} returns {actual}, but is declared to return {expected}")]
    ReturnType {
        /// Declaring class
        class: String,
        /// Method name
        method: String,
        /// Declared return type
        expected: String,
        /// Body type
        actual: String,
    },

    /// `e@T.m()` where T is not an ancestor of e's type
    #[error("Static dispatch to {static_type} is invalid for a receiver of type {receiver}")]
    StaticDispatch {
        /// Named class
        static_type: String,
        /// Receiver type
        receiver: String,
    },

    /// No method of that name up to the root
    #[error("Class {class} has no method {method}")]
    UnknownMethod {
        /// Class where lookup started
        class: String,
        /// Method name
        method: String,
    },

    /// Wrong number of arguments
    #[error("Method {class}.{method} takes {expected} argument(s), but {actual} were given")]
    Arity {
        /// Class declaring the method
        class: String,
        /// Method name
        method: String,
        /// Formal count
        expected: usize,
        /// Actual count
        actual: usize,
    },

    /// Argument does not conform to its formal
    #[error("Argument {position} of {class}.{method} must be {expected}, found {actual}")]
    ArgumentType {
        /// Class declaring the method
        class: String,
        /// Method name
        method: String,
        /// 1-based position
        position: usize,
        /// Formal type
        expected: String,
        /// Argument type
        actual: String,
    },

    /// `if` / `while` condition is not Bool
    #[error("Condition of {construct} must be Bool, found {actual}")]
    ConditionType {
        /// `if` or `while`
        construct: &'static str,
        /// Condition type
        actual: String,
    },

    /// Operand of the wrong type for an operator
    #[error("Operator {op} takes {expected} operands, found {actual}")]
    OperatorType {
        /// Operator symbol
        op: String,
        /// Required operand type
        expected: &'static str,
        /// Offending operand type
        actual: String,
    },

    /// `=` between different primitive types
    #[error("Ints, Bools and Strings can only be compared to their own type, not {lhs} to {rhs}")]
    IncomparableTypes {
        /// Left operand type
        lhs: String,
        /// Right operand type
        rhs: String,
    },

    /// Two branches of one `case` test the same type
    #[error("Duplicate branch type {ty} in case expression in class {class}")]
    DuplicateCaseBranch {
        /// Class being checked
        class: String,
        /// Repeated type
        ty: String,
    },

    /// Construct the checker does not handle
    #[error("Unimplemented construct: {construct}")]
    Unimplemented {
        /// Construct name
        construct: String,
    },
}

/// Findings that do not reject the program
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckWarning {
    /// No class named Main
    #[error("Program has no Main class")]
    MissingMainClass,

    /// Main has no main method, declared or inherited
    #[error("Class Main has no main method")]
    MissingMainMethod,

    /// Main.main declares parameters; the entry point passes none
    #[error("Main.main should take no arguments, but takes {arity}")]
    MainTakesArguments {
        /// Declared parameter count
        arity: usize,
    },
}
