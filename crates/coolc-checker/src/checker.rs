//! Expression type checking
//!
//! Pass 5: every attribute initializer and method body is checked against
//! the class table built by the binder. The static type of each expression
//! is recorded in a side table keyed by `ExprId`; the tree itself is never
//! modified.

use crate::error::{CheckError, CheckWarning};
use coolc_ast::{BinaryOp, Expr, ExprId, ExprKind, Feature, Program, SELF_NAME};
use coolc_types::{ClassId, ClassTable, MethodBody, ScopedBindings};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// Names in scope while checking: locals and parameters to their types
pub type TypeEnv = ScopedBindings<ClassId>;

/// Output of a successful check
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    /// Static type of every checked expression
    pub expr_types: FxHashMap<ExprId, ClassId>,
    /// Non-fatal findings
    pub warnings: Vec<CheckWarning>,
}

impl CheckResult {
    /// Static type recorded for an expression
    pub fn type_of(&self, expr: &Expr) -> Option<ClassId> {
        self.expr_types.get(&expr.id).copied()
    }
}

/// Type checker for expressions
pub struct TypeChecker<'a> {
    table: &'a ClassTable,
    expr_types: FxHashMap<ExprId, ClassId>,
    warnings: Vec<CheckWarning>,
}

impl<'a> TypeChecker<'a> {
    /// Create a checker over a fully bound class table
    pub fn new(table: &'a ClassTable) -> Self {
        TypeChecker {
            table,
            expr_types: FxHashMap::default(),
            warnings: Vec::new(),
        }
    }

    /// Check every initializer and method body in the program.
    pub fn check_program(mut self, program: &Program) -> Result<CheckResult, CheckError> {
        let classes: Vec<(ClassId, usize)> = self
            .table
            .classes()
            .filter_map(|c| c.decl.map(|decl| (c.id, decl)))
            .collect();

        for &(class, decl) in &classes {
            debug!(class = self.table.name(class), "checking attributes");
            for feature in &program.classes[decl].features {
                if let Feature::Attribute {
                    name,
                    ty,
                    init: Some(init),
                } = feature
                {
                    let declared = self.table.resolve(ty)?;
                    let actual = self.check_expr(class, init, &mut TypeEnv::new())?;
                    if !self.table.is_subtype_or_equal(declared, actual) {
                        return Err(CheckError::TypeMismatch {
                            context: format!(
                                "Initializer of attribute {}.{}",
                                self.table.name(class),
                                name
                            ),
                            expected: self.table.name(declared).to_string(),
                            actual: self.table.name(actual).to_string(),
                        });
                    }
                }
            }
        }

        for &(class, decl) in &classes {
            debug!(class = self.table.name(class), "checking methods");
            for feature in &program.classes[decl].features {
                if let Feature::Method {
                    name,
                    formals,
                    return_type,
                    body,
                } = feature
                {
                    let mut env = TypeEnv::new();
                    let mut frame = env.frame();
                    for formal in formals {
                        frame.push(formal.name.as_str(), self.table.resolve(&formal.ty)?);
                    }
                    let actual = self.check_expr(class, body, &mut frame)?;
                    let declared = self.table.resolve(return_type)?;
                    if !self.table.is_subtype_or_equal(declared, actual) {
                        return Err(CheckError::ReturnType {
                            class: self.table.name(class).to_string(),
                            method: name.clone(),
                            expected: self.table.name(declared).to_string(),
                            actual: self.table.name(actual).to_string(),
                        });
                    }
                }
            }
        }

        self.check_entry_point();

        Ok(CheckResult {
            expr_types: self.expr_types,
            warnings: self.warnings,
        })
    }

    /// Warn when the program has no usable `Main.main()`.
    fn check_entry_point(&mut self) {
        let Some(main) = self.table.class_id("Main") else {
            self.warnings.push(CheckWarning::MissingMainClass);
            return;
        };
        match self.table.lookup_method(main, "main") {
            None => self.warnings.push(CheckWarning::MissingMainMethod),
            Some(method) => {
                let arity = self.table.method(method).arity();
                if arity != 0 {
                    self.warnings.push(CheckWarning::MainTakesArguments { arity });
                }
            }
        }
    }

    fn record(&mut self, expr: &Expr, ty: ClassId) -> ClassId {
        let previous = self.expr_types.insert(expr.id, ty);
        debug_assert!(previous.is_none(), "expression {} typed twice", expr.id);
        trace!(expr = %expr.id, construct = expr.construct(), ty = self.table.name(ty), "typed");
        ty
    }

    fn name(&self, class: ClassId) -> String {
        self.table.name(class).to_string()
    }

    /// Type of an expression in the context of `class`
    pub fn check_expr(
        &mut self,
        class: ClassId,
        expr: &Expr,
        env: &mut TypeEnv,
    ) -> Result<ClassId, CheckError> {
        let ty = match &expr.kind {
            ExprKind::Bool { .. } => ClassId::BOOL,
            ExprKind::Int { .. } => ClassId::INT,
            ExprKind::Str { .. } => ClassId::STRING,

            ExprKind::Ident { name } => self.lookup_identifier(class, name, env)?,

            ExprKind::Assign { target, value } => {
                let ExprKind::Ident { name } = &target.kind else {
                    return Err(CheckError::InvalidAssignmentTarget {
                        class: self.name(class),
                        construct: target.construct().to_string(),
                    });
                };
                if name == SELF_NAME {
                    return Err(CheckError::SelfAssignment {
                        class: self.name(class),
                        context: "assigned to",
                    });
                }
                let declared = self.lookup_identifier(class, name, env)?;
                self.record(target, declared);

                let actual = self.check_expr(class, value, env)?;
                if !self.table.is_subtype_or_equal(declared, actual) {
                    return Err(CheckError::TypeMismatch {
                        context: format!("Assignment to {}", name),
                        expected: self.name(declared),
                        actual: self.name(actual),
                    });
                }
                actual
            }

            ExprKind::New { ty } => self.table.resolve(ty)?,

            ExprKind::Dispatch {
                receiver,
                static_type,
                method,
                args,
            } => self.check_dispatch(
                class,
                receiver.as_deref(),
                static_type.as_deref(),
                method,
                args,
                env,
            )?,

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.check_expr(class, cond, env)?;
                if cond_ty != ClassId::BOOL {
                    return Err(CheckError::ConditionType {
                        construct: "if",
                        actual: self.name(cond_ty),
                    });
                }
                let then_ty = self.check_expr(class, then_branch, env)?;
                let else_ty = self.check_expr(class, else_branch, env)?;
                self.table.join(then_ty, else_ty)
            }

            ExprKind::While { cond, body } => {
                let cond_ty = self.check_expr(class, cond, env)?;
                if cond_ty != ClassId::BOOL {
                    return Err(CheckError::ConditionType {
                        construct: "while",
                        actual: self.name(cond_ty),
                    });
                }
                self.check_expr(class, body, env)?;
                ClassId::OBJECT
            }

            ExprKind::Block { body } => {
                let mut last = None;
                for e in body {
                    last = Some(self.check_expr(class, e, env)?);
                }
                last.ok_or_else(|| CheckError::MalformedTree {
                    reason: "empty block".to_string(),
                })?
            }

            ExprKind::Let { bindings, body } => {
                if bindings.is_empty() {
                    return Err(CheckError::MalformedTree {
                        reason: "let without bindings".to_string(),
                    });
                }
                let mut frame = env.frame();
                for binding in bindings {
                    if binding.name == SELF_NAME {
                        return Err(CheckError::SelfAssignment {
                            class: self.name(class),
                            context: "bound in a let",
                        });
                    }
                    let declared = self.table.resolve(&binding.ty)?;
                    let bound = match &binding.init {
                        Some(init) => {
                            let actual = self.check_expr(class, init, &mut frame)?;
                            if !self.table.is_subtype_or_equal(declared, actual) {
                                return Err(CheckError::TypeMismatch {
                                    context: format!("Initializer of let binding {}", binding.name),
                                    expected: self.name(declared),
                                    actual: self.name(actual),
                                });
                            }
                            // The initializer's type, not the declared one.
                            actual
                        }
                        None => declared,
                    };
                    frame.push(binding.name.as_str(), bound);
                }
                self.check_expr(class, body, &mut frame)?
            }

            ExprKind::Case {
                scrutinee,
                branches,
            } => {
                self.check_expr(class, scrutinee, env)?;
                if branches.is_empty() {
                    return Err(CheckError::MalformedTree {
                        reason: "case without branches".to_string(),
                    });
                }

                let mut seen = FxHashSet::default();
                let mut branch_types = Vec::with_capacity(branches.len());
                for branch in branches {
                    if branch.name == SELF_NAME {
                        return Err(CheckError::SelfAssignment {
                            class: self.name(class),
                            context: "bound in a case branch",
                        });
                    }
                    let ty = self.table.resolve(&branch.ty)?;
                    if !seen.insert(ty) {
                        return Err(CheckError::DuplicateCaseBranch {
                            class: self.name(class),
                            ty: branch.ty.clone(),
                        });
                    }
                    let mut frame = env.frame();
                    frame.push(branch.name.as_str(), ty);
                    branch_types.push(self.check_expr(class, &branch.body, &mut frame)?);
                }
                self.table
                    .join_all(branch_types)
                    .unwrap_or(ClassId::OBJECT)
            }

            ExprKind::IsVoid { expr: inner } => {
                self.check_expr(class, inner, env)?;
                ClassId::BOOL
            }

            ExprKind::Not { expr: inner } => {
                let ty = self.check_expr(class, inner, env)?;
                self.expect_operand("not", "Bool", ClassId::BOOL, ty)?;
                ClassId::BOOL
            }

            ExprKind::Neg { expr: inner } => {
                let ty = self.check_expr(class, inner, env)?;
                self.expect_operand("~", "Int", ClassId::INT, ty)?;
                ClassId::INT
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.check_expr(class, lhs, env)?;
                let rhs_ty = self.check_expr(class, rhs, env)?;
                self.check_binary(*op, lhs_ty, rhs_ty)?
            }

            ExprKind::Unsupported { construct } => {
                return Err(CheckError::Unimplemented {
                    construct: construct.clone(),
                })
            }
        };

        Ok(self.record(expr, ty))
    }

    /// Locals first (innermost binding wins), then `self`, then attributes.
    fn lookup_identifier(
        &self,
        class: ClassId,
        name: &str,
        env: &TypeEnv,
    ) -> Result<ClassId, CheckError> {
        if let Some(&ty) = env.get(name) {
            return Ok(ty);
        }
        if name == SELF_NAME {
            return Ok(class);
        }
        self.table
            .lookup_attribute(class, name)
            .map(|attr| self.table.attribute(attr).ty)
            .ok_or_else(|| CheckError::UnknownAttribute {
                class: self.name(class),
                name: name.to_string(),
            })
    }

    fn check_dispatch(
        &mut self,
        class: ClassId,
        receiver: Option<&Expr>,
        static_type: Option<&str>,
        method: &str,
        args: &[Expr],
        env: &mut TypeEnv,
    ) -> Result<ClassId, CheckError> {
        let receiver_ty = match receiver {
            Some(receiver) => self.check_expr(class, receiver, env)?,
            None => class,
        };

        let lookup_class = match static_type {
            Some(name) => {
                let static_ty = self.table.resolve(name)?;
                if !self.table.is_subtype_or_equal(static_ty, receiver_ty) {
                    return Err(CheckError::StaticDispatch {
                        static_type: name.to_string(),
                        receiver: self.name(receiver_ty),
                    });
                }
                static_ty
            }
            None => receiver_ty,
        };

        let method_id = self
            .table
            .lookup_method(lookup_class, method)
            .ok_or_else(|| CheckError::UnknownMethod {
                class: self.name(lookup_class),
                method: method.to_string(),
            })?;
        let descriptor = self.table.method(method_id);
        let owner = self.name(descriptor.owner);

        if descriptor.arity() != args.len() {
            return Err(CheckError::Arity {
                class: owner,
                method: method.to_string(),
                expected: descriptor.arity(),
                actual: args.len(),
            });
        }

        for (position, (arg, param)) in args.iter().zip(&descriptor.params).enumerate() {
            let arg_ty = self.check_expr(class, arg, env)?;
            if !self.table.is_subtype_or_equal(param.ty, arg_ty) {
                return Err(CheckError::ArgumentType {
                    class: owner,
                    method: method.to_string(),
                    position: position + 1,
                    expected: self.name(param.ty),
                    actual: self.name(arg_ty),
                });
            }
        }

        trace!(
            method,
            lookup = self.table.name(lookup_class),
            builtin = matches!(descriptor.body, MethodBody::Builtin(_)),
            "resolved dispatch"
        );
        Ok(descriptor.return_type)
    }

    fn check_binary(
        &self,
        op: BinaryOp,
        lhs: ClassId,
        rhs: ClassId,
    ) -> Result<ClassId, CheckError> {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                self.expect_operand(op.symbol(), "Int", ClassId::INT, lhs)?;
                self.expect_operand(op.symbol(), "Int", ClassId::INT, rhs)?;
                Ok(ClassId::INT)
            }
            BinaryOp::Lt | BinaryOp::Le => {
                self.expect_operand(op.symbol(), "Int", ClassId::INT, lhs)?;
                self.expect_operand(op.symbol(), "Int", ClassId::INT, rhs)?;
                Ok(ClassId::BOOL)
            }
            BinaryOp::Eq => {
                let primitive = |ty: ClassId| self.table.class(ty).primitive.is_some();
                if (primitive(lhs) || primitive(rhs)) && lhs != rhs {
                    return Err(CheckError::IncomparableTypes {
                        lhs: self.name(lhs),
                        rhs: self.name(rhs),
                    });
                }
                Ok(ClassId::BOOL)
            }
        }
    }

    fn expect_operand(
        &self,
        op: &str,
        expected_name: &'static str,
        expected: ClassId,
        actual: ClassId,
    ) -> Result<(), CheckError> {
        if actual == expected {
            Ok(())
        } else {
            Err(CheckError::OperatorType {
                op: op.to_string(),
                expected: expected_name,
                actual: self.name(actual),
            })
        }
    }
}
