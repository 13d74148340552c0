//! Programmatic AST construction
//!
//! Used by tests, benches and tools that synthesize programs without a
//! parser. Every expression built here gets a fresh, unique id.

use crate::ast::*;
use std::cell::Cell;

/// Hands out fresh expression ids while building a tree
#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: Cell<u32>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn expr(&self, kind: ExprKind) -> Expr {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Expr::new(ExprId(id), kind)
    }

    /// Number of expressions built so far
    pub fn count(&self) -> u32 {
        self.next_id.get()
    }

    // Declarations

    pub fn class(&self, name: &str, parent: Option<&str>, features: Vec<Feature>) -> Class {
        Class {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            features,
        }
    }

    pub fn attribute(&self, name: &str, ty: &str, init: Option<Expr>) -> Feature {
        Feature::Attribute {
            name: name.to_string(),
            ty: ty.to_string(),
            init,
        }
    }

    pub fn method(&self, name: &str, formals: Vec<Formal>, return_type: &str, body: Expr) -> Feature {
        Feature::Method {
            name: name.to_string(),
            formals,
            return_type: return_type.to_string(),
            body,
        }
    }

    pub fn formal(&self, name: &str, ty: &str) -> Formal {
        Formal::new(name, ty)
    }

    // Expressions

    pub fn bool(&self, value: bool) -> Expr {
        self.expr(ExprKind::Bool { value })
    }

    pub fn int(&self, value: i32) -> Expr {
        self.expr(ExprKind::Int {
            value: value.to_string(),
        })
    }

    pub fn string(&self, value: &str) -> Expr {
        self.expr(ExprKind::Str {
            value: value.to_string(),
        })
    }

    pub fn ident(&self, name: &str) -> Expr {
        self.expr(ExprKind::Ident {
            name: name.to_string(),
        })
    }

    pub fn self_(&self) -> Expr {
        self.ident(crate::SELF_NAME)
    }

    pub fn assign(&self, name: &str, value: Expr) -> Expr {
        let target = self.ident(name);
        self.assign_to(target, value)
    }

    /// Assignment with an arbitrary target expression
    pub fn assign_to(&self, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn new_(&self, ty: &str) -> Expr {
        self.expr(ExprKind::New { ty: ty.to_string() })
    }

    /// `receiver.method(args)`
    pub fn call(&self, receiver: Expr, method: &str, args: Vec<Expr>) -> Expr {
        self.dispatch(Some(receiver), None, method, args)
    }

    /// `method(args)` on the implicit `self`
    pub fn call_self(&self, method: &str, args: Vec<Expr>) -> Expr {
        self.dispatch(None, None, method, args)
    }

    /// `receiver@Type.method(args)`
    pub fn static_call(&self, receiver: Expr, ty: &str, method: &str, args: Vec<Expr>) -> Expr {
        self.dispatch(Some(receiver), Some(ty), method, args)
    }

    pub fn dispatch(
        &self,
        receiver: Option<Expr>,
        static_type: Option<&str>,
        method: &str,
        args: Vec<Expr>,
    ) -> Expr {
        self.expr(ExprKind::Dispatch {
            receiver: receiver.map(Box::new),
            static_type: static_type.map(str::to_string),
            method: method.to_string(),
            args,
        })
    }

    pub fn if_(&self, cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        self.expr(ExprKind::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    pub fn while_(&self, cond: Expr, body: Expr) -> Expr {
        self.expr(ExprKind::While {
            cond: Box::new(cond),
            body: Box::new(body),
        })
    }

    pub fn block(&self, body: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Block { body })
    }

    pub fn let_(&self, bindings: Vec<LetBinding>, body: Expr) -> Expr {
        self.expr(ExprKind::Let {
            bindings,
            body: Box::new(body),
        })
    }

    pub fn binding(&self, name: &str, ty: &str, init: Option<Expr>) -> LetBinding {
        LetBinding {
            name: name.to_string(),
            ty: ty.to_string(),
            init,
        }
    }

    pub fn case(&self, scrutinee: Expr, branches: Vec<CaseBranch>) -> Expr {
        self.expr(ExprKind::Case {
            scrutinee: Box::new(scrutinee),
            branches,
        })
    }

    pub fn branch(&self, name: &str, ty: &str, body: Expr) -> CaseBranch {
        CaseBranch {
            name: name.to_string(),
            ty: ty.to_string(),
            body,
        }
    }

    pub fn is_void(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::IsVoid { expr: Box::new(expr) })
    }

    pub fn not(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Not { expr: Box::new(expr) })
    }

    pub fn neg(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Neg { expr: Box::new(expr) })
    }

    pub fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn unsupported(&self, construct: &str) -> Expr {
        self.expr(ExprKind::Unsupported {
            construct: construct.to_string(),
        })
    }
}
