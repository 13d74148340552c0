//! AST traversal
//!
//! Override `visit_expr_mut` to intercept nodes; call `walk_expr_mut` to
//! continue into the children.

use crate::ast::*;

/// In-place traversal, used for renumbering
pub trait VisitorMut: Sized {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Bool { .. }
        | ExprKind::Int { .. }
        | ExprKind::Str { .. }
        | ExprKind::Ident { .. }
        | ExprKind::New { .. }
        | ExprKind::Unsupported { .. } => {}
        ExprKind::Assign { target, value } => {
            visitor.visit_expr_mut(target);
            visitor.visit_expr_mut(value);
        }
        ExprKind::Dispatch { receiver, args, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr_mut(receiver);
            }
            for arg in args {
                visitor.visit_expr_mut(arg);
            }
        }
        ExprKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr_mut(cond);
            visitor.visit_expr_mut(then_branch);
            visitor.visit_expr_mut(else_branch);
        }
        ExprKind::While { cond, body } => {
            visitor.visit_expr_mut(cond);
            visitor.visit_expr_mut(body);
        }
        ExprKind::Block { body } => {
            for e in body {
                visitor.visit_expr_mut(e);
            }
        }
        ExprKind::Let { bindings, body } => {
            for binding in bindings {
                if let Some(init) = &mut binding.init {
                    visitor.visit_expr_mut(init);
                }
            }
            visitor.visit_expr_mut(body);
        }
        ExprKind::Case {
            scrutinee,
            branches,
        } => {
            visitor.visit_expr_mut(scrutinee);
            for branch in branches {
                visitor.visit_expr_mut(&mut branch.body);
            }
        }
        ExprKind::IsVoid { expr } | ExprKind::Not { expr } | ExprKind::Neg { expr } => {
            visitor.visit_expr_mut(expr)
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            visitor.visit_expr_mut(lhs);
            visitor.visit_expr_mut(rhs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AstBuilder;

    struct BumpLiterals;

    impl VisitorMut for BumpLiterals {
        fn visit_expr_mut(&mut self, expr: &mut Expr) {
            if let ExprKind::Int { value } = &mut expr.kind {
                value.push('0');
            }
            walk_expr_mut(self, expr);
        }
    }

    #[test]
    fn test_walk_reaches_nested_literals() {
        let b = AstBuilder::new();
        let mut body = b.block(vec![
            b.int(1),
            b.if_(b.bool(true), b.string("a"), b.binary(BinaryOp::Add, b.int(2), b.int(3))),
            b.let_(vec![b.binding("x", "Int", Some(b.int(4)))], b.ident("x")),
        ]);
        BumpLiterals.visit_expr_mut(&mut body);

        let ExprKind::Block { body } = &body.kind else {
            panic!("expected block");
        };
        assert_eq!(body[0].kind, ExprKind::Int { value: "10".to_string() });
        let ExprKind::If { else_branch, .. } = &body[1].kind else {
            panic!("expected if");
        };
        let ExprKind::Binary { lhs, rhs, .. } = &else_branch.kind else {
            panic!("expected binary");
        };
        assert_eq!(lhs.kind, ExprKind::Int { value: "20".to_string() });
        assert_eq!(rhs.kind, ExprKind::Int { value: "30".to_string() });
        let ExprKind::Let { bindings, .. } = &body[2].kind else {
            panic!("expected let");
        };
        let init = bindings[0].init.as_ref().unwrap();
        assert_eq!(init.kind, ExprKind::Int { value: "40".to_string() });
    }
}
