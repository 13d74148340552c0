//! Expression lowering
//!
//! `lower_expr` may hand back a slot (`%__instance_T**`) for identifiers so
//! assignment can store through it; `lower_value` always yields an object
//! pointer. Every operand is read through `lower_value`.

use super::builder::{FunctionLowerer, LocalEnv};
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{BinaryOp as IrBinaryOp, CmpPred, Value};
use crate::runtime::Runtime;
use coolc_ast::{BinaryOp, Expr, ExprKind, SELF_NAME};
use coolc_types::{ClassId, Primitive};
use tracing::{trace, warn};

impl FunctionLowerer<'_, '_> {
    /// Static type the checker recorded for `expr`
    pub(crate) fn static_type(&self, expr: &Expr) -> CodegenResult<ClassId> {
        self.types.type_of(expr).ok_or_else(|| {
            CodegenError::malformed(format!(
                "{} {} has no static type",
                expr.construct(),
                expr.id
            ))
        })
    }

    /// Lower `expr` to an object pointer, loading through slots.
    pub(crate) fn lower_value(&mut self, expr: &Expr, env: &mut LocalEnv) -> CodegenResult<Value> {
        let value = self.lower_expr(expr, env)?;
        if value.is_slot() {
            self.load(value)
        } else {
            Ok(value)
        }
    }

    pub(crate) fn lower_expr(&mut self, expr: &Expr, env: &mut LocalEnv) -> CodegenResult<Value> {
        trace!(id = %expr.id, construct = expr.construct(), "lowering");
        match &expr.kind {
            ExprKind::Bool { value } => Ok(self.box_bool(Value::bool(*value))),

            ExprKind::Int { value } => {
                let value: i32 = value.parse().map_err(|_| {
                    CodegenError::malformed(format!("integer literal {} out of range", value))
                })?;
                Ok(self.box_int(Value::i32(value)))
            }

            ExprKind::Str { value } => {
                let (buf, len) = self.string_literal(value)?;
                Ok(self.box_string(Value::i32(len), buf))
            }

            ExprKind::Ident { name } => self.lower_identifier(expr, name, env),

            ExprKind::Assign { target, value } => self.lower_assign(target, value, env),

            ExprKind::New { .. } => {
                let ty = self.static_type(expr)?;
                Ok(self.instantiate(ty))
            }

            ExprKind::Dispatch {
                receiver,
                static_type,
                method,
                args,
            } => self.lower_dispatch(
                receiver.as_deref(),
                static_type.as_deref(),
                method,
                args,
                env,
            ),

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(expr, cond, then_branch, else_branch, env),

            ExprKind::While { cond, body } => self.lower_while(cond, body, env),

            ExprKind::Block { body } => self.lower_block(body, env),

            ExprKind::Let { bindings, body } => self.lower_let(bindings, body, env),

            ExprKind::Case {
                scrutinee,
                branches,
            } => self.lower_case(expr, scrutinee, branches, env),

            ExprKind::IsVoid { expr: inner } => {
                let value = self.lower_value(inner, env)?;
                let object = self.coerce(value, ClassId::OBJECT);
                let null = Value::null(object.ty.clone());
                let is_void = self.compare(CmpPred::Eq, object, null);
                Ok(self.box_bool(is_void))
            }

            ExprKind::Not { expr: inner } => {
                let value = self.lower_value(inner, env)?;
                let value = self.unbox_bool(value)?;
                let negated = self.compare(CmpPred::Eq, value, Value::bool(false));
                Ok(self.box_bool(negated))
            }

            ExprKind::Neg { expr: inner } => {
                let value = self.lower_value(inner, env)?;
                let value = self.unbox_int(value)?;
                let negated = self.binary(IrBinaryOp::Sub, Value::i32(0), value);
                Ok(self.box_int(negated))
            }

            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, env),

            ExprKind::Unsupported { construct } => self.lower_unsupported(expr, construct),
        }
    }

    /// Locals first, then `self`, then attributes of the current class.
    fn lower_identifier(&mut self, expr: &Expr, name: &str, env: &LocalEnv) -> CodegenResult<Value> {
        if let Some(slot) = env.get(name) {
            return Ok(slot.clone());
        }
        if name == SELF_NAME {
            let ty = self.static_type(expr)?;
            let receiver = self.receiver();
            return Ok(self.coerce(receiver, ty));
        }
        self.named_attribute_slot(name)
    }

    /// Store into the target slot; the assignment's value is the stored
    /// object.
    fn lower_assign(&mut self, target: &Expr, value: &Expr, env: &mut LocalEnv) -> CodegenResult<Value> {
        let ExprKind::Ident { name } = &target.kind else {
            return Err(CodegenError::malformed(format!(
                "cannot assign to {}",
                target.construct()
            )));
        };
        let slot = match env.get(name) {
            Some(slot) => slot.clone(),
            None => self.named_attribute_slot(name)?,
        };
        let value = self.lower_value(value, env)?;
        let pointee = slot
            .ty
            .pointee()
            .cloned()
            .ok_or_else(|| CodegenError::malformed(format!("slot of {} is not a pointer", name)))?;
        let stored = self.bitcast(value.clone(), pointee);
        self.store(stored, slot);
        Ok(value)
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        env: &mut LocalEnv,
    ) -> CodegenResult<Value> {
        let lhs_ty = self.static_type(lhs)?;
        let left = self.lower_value(lhs, env)?;
        let right = self.lower_value(rhs, env)?;

        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let ir_op = match op {
                    BinaryOp::Add => IrBinaryOp::Add,
                    BinaryOp::Sub => IrBinaryOp::Sub,
                    BinaryOp::Mul => IrBinaryOp::Mul,
                    _ => IrBinaryOp::SDiv,
                };
                let a = self.unbox_int(left)?;
                let b = self.unbox_int(right)?;
                if op == BinaryOp::Div {
                    let zero = self.compare(CmpPred::Eq, b.clone(), Value::i32(0));
                    self.exit_if(zero, "div.zero", "div.ok");
                }
                let result = self.binary(ir_op, a, b);
                Ok(self.box_int(result))
            }
            BinaryOp::Lt | BinaryOp::Le => {
                let pred = if op == BinaryOp::Lt {
                    CmpPred::Slt
                } else {
                    CmpPred::Sle
                };
                let a = self.unbox_int(left)?;
                let b = self.unbox_int(right)?;
                let result = self.compare(pred, a, b);
                Ok(self.box_bool(result))
            }
            BinaryOp::Eq => {
                let result = self.lower_equality(lhs_ty, left, right)?;
                Ok(self.box_bool(result))
            }
        }
    }

    /// Primitives compare by payload, everything else by identity.
    fn lower_equality(&mut self, ty: ClassId, left: Value, right: Value) -> CodegenResult<Value> {
        match self.table.class(ty).primitive {
            Some(Primitive::Int) => {
                let a = self.unbox_int(left)?;
                let b = self.unbox_int(right)?;
                Ok(self.compare(CmpPred::Eq, a, b))
            }
            Some(Primitive::Bool) => {
                let a = self.unbox_bool(left)?;
                let b = self.unbox_bool(right)?;
                Ok(self.compare(CmpPred::Eq, a, b))
            }
            Some(Primitive::String) => {
                let (_, a) = self.unbox_string(left)?;
                let (_, b) = self.unbox_string(right)?;
                let order = self.call_runtime(Runtime::Strcmp, vec![a, b]);
                Ok(self.compare(CmpPred::Eq, order, Value::i32(0)))
            }
            None => {
                let a = self.coerce(left, ClassId::OBJECT);
                let b = self.coerce(right, ClassId::OBJECT);
                Ok(self.compare(CmpPred::Eq, a, b))
            }
        }
    }

    /// Fails in strict mode; otherwise a null of the node's type.
    fn lower_unsupported(&mut self, expr: &Expr, construct: &str) -> CodegenResult<Value> {
        if !self.options().lenient {
            return Err(CodegenError::UnsupportedConstruct {
                construct: construct.to_string(),
            });
        }
        warn!(
            construct,
            class = self.table.name(self.class()),
            "unsupported construct lowered to null"
        );
        let ty = self.types.type_of(expr).unwrap_or(ClassId::OBJECT);
        Ok(Value::null(self.instance_ptr(ty)))
    }
}
