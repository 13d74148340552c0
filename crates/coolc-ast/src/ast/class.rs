//! Class-level declarations

use super::Expr;
use serde::{Deserialize, Serialize};

/// `class Name [inherits Parent] { features }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    /// Explicit parent; `None` means the root class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A member of a class body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "snake_case")]
pub enum Feature {
    /// `name : Type [<- init]`
    Attribute {
        name: String,
        #[serde(rename = "type")]
        ty: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<Expr>,
    },
    /// `name(formals) : ReturnType { body }`
    Method {
        name: String,
        #[serde(default)]
        formals: Vec<Formal>,
        return_type: String,
        body: Expr,
    },
}

/// Formal parameter `name : Type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formal {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Formal {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}
