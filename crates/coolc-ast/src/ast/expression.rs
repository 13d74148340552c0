//! Expression AST nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one expression node within a program
///
/// Assigned by [`crate::Program::renumber`] or by [`crate::AstBuilder`];
/// later phases key their side tables on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An expression together with its node id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(skip)]
    pub id: ExprId,
    #[serde(flatten)]
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    /// Short construct name, used in diagnostics
    pub fn construct(&self) -> &str {
        self.kind.construct()
    }
}

/// Expression variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprKind {
    /// `true` / `false`
    Bool { value: bool },

    /// Integer literal, kept as written
    Int { value: String },

    /// String literal (already unescaped)
    Str { value: String },

    /// Identifier reference, including `self`
    Ident { name: String },

    /// `target <- value`
    Assign { target: Box<Expr>, value: Box<Expr> },

    /// `new Type`
    New {
        #[serde(rename = "type")]
        ty: String,
    },

    /// `[receiver][@StaticType].method(args)`
    Dispatch {
        /// `None` for an implicit `self` receiver
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<Box<Expr>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        static_type: Option<String>,
        method: String,
        #[serde(default)]
        args: Vec<Expr>,
    },

    /// `if cond then a else b fi`
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// `while cond loop body pool`
    While { cond: Box<Expr>, body: Box<Expr> },

    /// `{ e1; e2; ... }`
    Block { body: Vec<Expr> },

    /// `let x : T [<- init], ... in body`
    Let {
        bindings: Vec<LetBinding>,
        body: Box<Expr>,
    },

    /// `case scrutinee of name : T => expr; ... esac`
    Case {
        scrutinee: Box<Expr>,
        branches: Vec<CaseBranch>,
    },

    /// `isvoid expr`
    IsVoid { expr: Box<Expr> },

    /// `not expr`
    Not { expr: Box<Expr> },

    /// `~expr`
    Neg { expr: Box<Expr> },

    /// Binary arithmetic, comparison, or equality
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// A grammar construct this compiler does not understand
    Unsupported { construct: String },
}

impl ExprKind {
    pub fn construct(&self) -> &str {
        match self {
            ExprKind::Bool { .. } => "bool literal",
            ExprKind::Int { .. } => "int literal",
            ExprKind::Str { .. } => "string literal",
            ExprKind::Ident { .. } => "identifier",
            ExprKind::Assign { .. } => "assignment",
            ExprKind::New { .. } => "new",
            ExprKind::Dispatch { .. } => "dispatch",
            ExprKind::If { .. } => "if",
            ExprKind::While { .. } => "while",
            ExprKind::Block { .. } => "block",
            ExprKind::Let { .. } => "let",
            ExprKind::Case { .. } => "case",
            ExprKind::IsVoid { .. } => "isvoid",
            ExprKind::Not { .. } => "not",
            ExprKind::Neg { .. } => "negation",
            ExprKind::Binary { op, .. } => op.symbol(),
            ExprKind::Unsupported { construct } => construct,
        }
    }
}

/// One binding of a `let`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetBinding {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Expr>,
}

/// One branch of a `case`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseBranch {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub body: Expr,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Eq,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
