//! Class table errors

use thiserror::Error;

/// Errors raised while populating the class table
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EnvError {
    /// A class name is registered twice (built-in names included)
    #[error("Class {name} is already defined")]
    DuplicateClass {
        /// Class name
        name: String,
    },

    /// A name used as a type does not name a class
    #[error("Unknown class {name}")]
    UnknownClass {
        /// Name that was not found
        name: String,
    },

    /// An attribute name is already taken in the class or one of its ancestors
    #[error("Attribute {name} of class {class} is already declared in class {declared_in}")]
    DuplicateAttribute {
        /// Class being populated
        class: String,
        /// Attribute name
        name: String,
        /// Class holding the earlier declaration
        declared_in: String,
    },

    /// A method name is declared twice in the same class
    #[error("Method {name} is declared twice in class {class}")]
    DuplicateMethod {
        /// Class being populated
        class: String,
        /// Method name
        name: String,
    },

    /// The receiver keyword is used as a declared name
    #[error("'self' cannot be used as the name of {what} in {class}.{member}")]
    ReservedName {
        /// Class being populated
        class: String,
        /// Member whose declaration uses the name
        member: String,
        /// What was named (e.g. "a parameter")
        what: &'static str,
    },

    /// An override does not match the signature it replaces
    #[error("Method {class}.{method} does not match inherited {base}.{method}: {reason}")]
    IncompatibleOverride {
        /// Overriding class
        class: String,
        /// Method name
        method: String,
        /// Class declaring the overridden method
        base: String,
        /// Which part of the signature differs
        reason: String,
    },
}
