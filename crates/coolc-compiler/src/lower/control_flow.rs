//! Control flow lowering: if, while, blocks, let and case
//!
//! Branching constructs take one label number and name their blocks
//! `<construct>.<part>.<n>`. Merged results are coerced to the static type
//! of the whole expression before they reach the phi.

use super::builder::{FunctionLowerer, LocalEnv};
use super::layout::{self, VTABLE_PARENT};
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{BasicBlockId, CmpPred, IrType, Terminator, Value};
use coolc_ast::{CaseBranch, Expr, LetBinding};
use coolc_types::ClassId;
use tracing::trace;

impl FunctionLowerer<'_, '_> {
    fn resolve_type(&self, name: &str) -> CodegenResult<ClassId> {
        self.table
            .class_id(name)
            .ok_or_else(|| CodegenError::malformed(format!("unknown type {}", name)))
    }

    pub(super) fn lower_if(
        &mut self,
        expr: &Expr,
        cond: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
        env: &mut LocalEnv,
    ) -> CodegenResult<Value> {
        let ty = self.static_type(expr)?;
        let cond = self.lower_value(cond, env)?;
        let flag = self.unbox_bool(cond)?;

        let label = self.alloc_label();
        let then_block = BasicBlockId::new("if.then", label);
        let else_block = BasicBlockId::new("if.else", label);
        let end_block = BasicBlockId::new("if.end", label);
        self.terminate(Terminator::Branch {
            cond: flag,
            then_block,
            else_block,
        });

        self.switch_to(then_block);
        let then_value = self.lower_value(then_branch, env)?;
        let then_value = self.coerce(then_value, ty);
        let then_exit = self.current_block();
        self.terminate(Terminator::Jump(end_block));

        self.switch_to(else_block);
        let else_value = self.lower_value(else_branch, env)?;
        let else_value = self.coerce(else_value, ty);
        let else_exit = self.current_block();
        self.terminate(Terminator::Jump(end_block));

        self.switch_to(end_block);
        let result_ty = self.instance_ptr(ty);
        Ok(self.phi(
            result_ty,
            vec![(then_value, then_exit), (else_value, else_exit)],
        ))
    }

    /// Entry jumps straight to the test, which sits after the body; the
    /// loop's value is always void.
    pub(super) fn lower_while(
        &mut self,
        cond: &Expr,
        body: &Expr,
        env: &mut LocalEnv,
    ) -> CodegenResult<Value> {
        let label = self.alloc_label();
        let body_block = BasicBlockId::new("while.body", label);
        let cond_block = BasicBlockId::new("while.cond", label);
        let end_block = BasicBlockId::new("while.end", label);
        self.terminate(Terminator::Jump(cond_block));

        self.switch_to(body_block);
        self.lower_value(body, env)?;
        self.terminate(Terminator::Jump(cond_block));

        self.switch_to(cond_block);
        let cond = self.lower_value(cond, env)?;
        let flag = self.unbox_bool(cond)?;
        self.terminate(Terminator::Branch {
            cond: flag,
            then_block: body_block,
            else_block: end_block,
        });

        self.switch_to(end_block);
        Ok(Value::null(self.instance_ptr(ClassId::OBJECT)))
    }

    pub(super) fn lower_block(&mut self, body: &[Expr], env: &mut LocalEnv) -> CodegenResult<Value> {
        let mut last = None;
        for expr in body {
            last = Some(self.lower_value(expr, env)?);
        }
        last.ok_or_else(|| CodegenError::malformed("empty block"))
    }

    /// Each binding gets a stack slot typed as its initializer's static
    /// type, or the declared type when there is no initializer.
    pub(super) fn lower_let(
        &mut self,
        bindings: &[LetBinding],
        body: &Expr,
        env: &mut LocalEnv,
    ) -> CodegenResult<Value> {
        if bindings.is_empty() {
            return Err(CodegenError::malformed("let without bindings"));
        }
        let mut frame = env.frame();
        for binding in bindings {
            let (ty, value) = match &binding.init {
                Some(init) => {
                    let ty = self.static_type(init)?;
                    let value = self.lower_value(init, &mut frame)?;
                    (ty, self.coerce(value, ty))
                }
                None => {
                    let ty = self.resolve_type(&binding.ty)?;
                    (ty, self.default_value(ty))
                }
            };
            let slot_ty = self.instance_ptr(ty);
            let slot = self.alloca(slot_ty);
            self.store(value, slot.clone());
            frame.push(binding.name.as_str(), slot);
        }
        self.lower_value(body, &mut frame)
    }

    /// Walk the scrutinee's vtable chain upward; at each level the first
    /// branch naming that class is taken. A void scrutinee and a chain
    /// with no matching branch both exit with status 1.
    pub(super) fn lower_case(
        &mut self,
        expr: &Expr,
        scrutinee: &Expr,
        branches: &[CaseBranch],
        env: &mut LocalEnv,
    ) -> CodegenResult<Value> {
        if branches.is_empty() {
            return Err(CodegenError::malformed("case without branches"));
        }
        let ty = self.static_type(expr)?;
        let branch_types = branches
            .iter()
            .map(|branch| self.resolve_type(&branch.ty))
            .collect::<CodegenResult<Vec<_>>>()?;

        let value = self.lower_value(scrutinee, env)?;
        let object = self.coerce(value, ClassId::OBJECT);

        let label = self.alloc_label();
        let void_block = BasicBlockId::new("case.void", label);
        let start_block = BasicBlockId::new("case.start", label);
        let loop_block = BasicBlockId::new("case.loop", label);
        let up_block = BasicBlockId::new("case.up", label);
        let nomatch_block = BasicBlockId::new("case.nomatch", label);
        let end_block = BasicBlockId::new("case.end", label);
        let arms: Vec<(BasicBlockId, BasicBlockId)> = branches
            .iter()
            .map(|_| {
                let n = self.alloc_label();
                (
                    BasicBlockId::new("case.branch", n),
                    BasicBlockId::new("case.next", n),
                )
            })
            .collect();

        let null = Value::null(object.ty.clone());
        let is_void = self.compare(CmpPred::Eq, object.clone(), null);
        self.terminate(Terminator::Branch {
            cond: is_void,
            then_block: void_block,
            else_block: start_block,
        });

        self.switch_to(void_block);
        self.emit_exit_failure();

        // The class being tested lives in a stack slot so the loop needs no phi.
        self.switch_to(start_block);
        let cursor = self.alloca(IrType::byte_ptr());
        let vtable = self.load_vtable(object.clone(), ClassId::OBJECT)?;
        let vtable = self.bitcast(vtable, IrType::byte_ptr());
        self.store(vtable, cursor.clone());
        self.terminate(Terminator::Jump(loop_block));

        self.switch_to(loop_block);
        let current = self.load(cursor.clone())?;
        for (&branch_ty, &(body_block, next_block)) in branch_types.iter().zip(&arms) {
            let target = layout::vtable_bytes(self.table, branch_ty);
            let matches = self.compare(CmpPred::Eq, current.clone(), target);
            self.terminate(Terminator::Branch {
                cond: matches,
                then_block: body_block,
                else_block: next_block,
            });
            self.switch_to(next_block);
        }
        let root = layout::vtable_bytes(self.table, ClassId::OBJECT);
        let at_root = self.compare(CmpPred::Eq, current.clone(), root);
        self.terminate(Terminator::Branch {
            cond: at_root,
            then_block: nomatch_block,
            else_block: up_block,
        });

        self.switch_to(up_block);
        let header_ty = layout::vtable_type(self.table.name(ClassId::OBJECT)).ptr();
        let header = self.bitcast(current, header_ty);
        let parent_slot = self.field_addr(header, VTABLE_PARENT, IrType::byte_ptr());
        let parent = self.load(parent_slot)?;
        self.store(parent, cursor);
        self.terminate(Terminator::Jump(loop_block));

        self.switch_to(nomatch_block);
        self.emit_exit_failure();

        let mut incoming = Vec::with_capacity(branches.len());
        for ((branch, &branch_ty), &(body_block, _)) in
            branches.iter().zip(&branch_types).zip(&arms)
        {
            trace!(name = %branch.name, ty = %branch.ty, "lowering case branch");
            self.switch_to(body_block);
            let slot_ty = self.instance_ptr(branch_ty);
            let slot = self.alloca(slot_ty);
            let bound = self.coerce(object.clone(), branch_ty);
            self.store(bound, slot.clone());

            let mut frame = env.frame();
            frame.push(branch.name.as_str(), slot);
            let result = self.lower_value(&branch.body, &mut frame)?;
            drop(frame);

            let result = self.coerce(result, ty);
            incoming.push((result, self.current_block()));
            self.terminate(Terminator::Jump(end_block));
        }

        self.switch_to(end_block);
        let result_ty = self.instance_ptr(ty);
        Ok(self.phi(result_ty, incoming))
    }
}
