//! Per-function lowering state
//!
//! A [`FunctionLowerer`] owns the function being built and tracks the
//! block instructions are appended to. Register and label numbers come
//! from the enclosing [`Compiler`] so they stay unique across the module.

use super::Compiler;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{
    BasicBlock, BasicBlockId, BinaryOp, CastOp, CmpPred, IrFunction, IrInstr, IrType, Terminator,
    Value,
};
use crate::options::CodegenOptions;
use crate::runtime::Runtime;
use coolc_checker::CheckResult;
use coolc_types::{ClassId, ClassTable, ScopedBindings};

/// Storage locations of locals and parameters in scope
pub(crate) type LocalEnv = ScopedBindings<Value>;

pub(crate) struct FunctionLowerer<'c, 'a> {
    compiler: &'c mut Compiler<'a>,
    pub(crate) table: &'a ClassTable,
    pub(crate) types: &'a CheckResult,
    func: IrFunction,
    /// Position of the current block in `func.blocks`
    current: usize,
    /// Hoisted into the entry block by `finish`
    allocas: Vec<IrInstr>,
    class: ClassId,
    receiver: Value,
}

impl<'c, 'a> FunctionLowerer<'c, 'a> {
    /// Start lowering `func` in the context of `class`, positioned at a
    /// fresh entry block.
    pub(crate) fn new(compiler: &'c mut Compiler<'a>, mut func: IrFunction, class: ClassId) -> Self {
        let table = compiler.table;
        let types = compiler.types;
        func.add_block(BasicBlock::new(BasicBlockId::ENTRY));
        let receiver = Value::null(super::layout::instance_ptr(table.name(class)));
        Self {
            compiler,
            table,
            types,
            func,
            current: 0,
            allocas: Vec::new(),
            class,
            receiver,
        }
    }

    pub(crate) fn options(&self) -> CodegenOptions {
        self.compiler.options
    }

    /// Class whose attributes are visible through `self`
    pub(crate) fn class(&self) -> ClassId {
        self.class
    }

    /// The object `self` refers to, typed as the current class
    pub(crate) fn receiver(&self) -> Value {
        self.receiver.clone()
    }

    pub(crate) fn set_receiver(&mut self, receiver: Value) {
        self.receiver = receiver;
    }

    pub(crate) fn param(&self, index: usize) -> CodegenResult<Value> {
        self.func.params.get(index).cloned().ok_or_else(|| {
            CodegenError::malformed(format!(
                "{} has no parameter {}",
                self.func.name, index
            ))
        })
    }

    pub(crate) fn string_literal(&mut self, text: &str) -> CodegenResult<(Value, i32)> {
        self.compiler.string_literal(text)
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    /// Fresh number shared by the blocks of one construct
    pub(crate) fn alloc_label(&mut self) -> u32 {
        self.compiler.alloc_label()
    }

    /// Append block `id` and continue emitting into it
    pub(crate) fn switch_to(&mut self, id: BasicBlockId) {
        self.current = self.func.add_block(BasicBlock::new(id));
    }

    pub(crate) fn current_block(&self) -> BasicBlockId {
        self.func.blocks[self.current].id
    }

    fn current_block_mut(&mut self) -> &mut BasicBlock {
        &mut self.func.blocks[self.current]
    }

    /// Add an instruction to the current block
    pub(crate) fn emit(&mut self, instr: IrInstr) {
        self.current_block_mut().add_instr(instr);
    }

    /// Set the terminator for the current block
    pub(crate) fn terminate(&mut self, term: Terminator) {
        self.current_block_mut().set_terminator(term);
    }

    /// Finish the function, hoisting stack slots into the entry block.
    pub(crate) fn finish(mut self) -> IrFunction {
        if let Some(entry) = self.func.blocks.first_mut() {
            let mut instructions = std::mem::take(&mut self.allocas);
            instructions.append(&mut entry.instructions);
            entry.instructions = instructions;
        }
        self.func
    }

    // ------------------------------------------------------------------
    // Instructions
    // ------------------------------------------------------------------

    fn new_register(&mut self, ty: IrType) -> Value {
        self.compiler.alloc_register(ty)
    }

    /// Stack slot holding one `ty`
    pub(crate) fn alloca(&mut self, ty: IrType) -> Value {
        let dest = self.new_register(ty.clone().ptr());
        self.allocas.push(IrInstr::Alloca {
            dest: dest.clone(),
            ty,
        });
        dest
    }

    pub(crate) fn load(&mut self, ptr: Value) -> CodegenResult<Value> {
        let ty = ptr.ty.pointee().cloned().ok_or_else(|| {
            CodegenError::malformed(format!("load through non-pointer {}", ptr.typed()))
        })?;
        let dest = self.new_register(ty);
        self.emit(IrInstr::Load {
            dest: dest.clone(),
            ptr,
        });
        Ok(dest)
    }

    pub(crate) fn store(&mut self, value: Value, ptr: Value) {
        self.emit(IrInstr::Store { value, ptr });
    }

    /// Address of field `index` of the struct `base` points to
    pub(crate) fn field_addr(&mut self, base: Value, index: u32, field_ty: IrType) -> Value {
        let dest = self.new_register(field_ty.ptr());
        self.emit(IrInstr::GetElementPtr {
            dest: dest.clone(),
            base,
            indices: vec![Value::i32(0), Value::i32(index as i32)],
            inbounds: true,
        });
        dest
    }

    /// `base + offset` on a byte pointer
    pub(crate) fn byte_offset(&mut self, base: Value, offset: Value) -> Value {
        let dest = self.new_register(IrType::byte_ptr());
        self.emit(IrInstr::GetElementPtr {
            dest: dest.clone(),
            base,
            indices: vec![offset],
            inbounds: true,
        });
        dest
    }

    /// Size in bytes of `ty`, computed from a null pointer offset
    pub(crate) fn size_of(&mut self, ty: IrType) -> Value {
        let ptr_ty = ty.ptr();
        let end = self.new_register(ptr_ty.clone());
        self.emit(IrInstr::GetElementPtr {
            dest: end.clone(),
            base: Value::null(ptr_ty),
            indices: vec![Value::i32(1)],
            inbounds: false,
        });
        self.cast(CastOp::PtrToInt, end, IrType::I64)
    }

    pub(crate) fn cast(&mut self, op: CastOp, value: Value, to: IrType) -> Value {
        let dest = self.new_register(to);
        self.emit(IrInstr::Cast {
            dest: dest.clone(),
            op,
            value,
        });
        dest
    }

    /// Reinterpret a pointer; a no-op when the types already agree
    pub(crate) fn bitcast(&mut self, value: Value, to: IrType) -> Value {
        if value.ty == to {
            return value;
        }
        if value.repr == "null" {
            return Value::null(to);
        }
        self.cast(CastOp::Bitcast, value, to)
    }

    pub(crate) fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Value {
        let dest = self.new_register(lhs.ty.clone());
        self.emit(IrInstr::Binary {
            dest: dest.clone(),
            op,
            lhs,
            rhs,
        });
        dest
    }

    pub(crate) fn compare(&mut self, pred: CmpPred, lhs: Value, rhs: Value) -> Value {
        let dest = self.new_register(IrType::I1);
        self.emit(IrInstr::Cmp {
            dest: dest.clone(),
            pred,
            lhs,
            rhs,
        });
        dest
    }

    /// Call a function returning a value
    pub(crate) fn call(&mut self, callee: Value, args: Vec<Value>) -> Value {
        let ret = callee.ty.return_type().cloned().unwrap_or(IrType::Void);
        let dest = self.new_register(ret);
        self.emit(IrInstr::Call {
            dest: Some(dest.clone()),
            callee,
            args,
        });
        dest
    }

    pub(crate) fn call_void(&mut self, callee: Value, args: Vec<Value>) {
        self.emit(IrInstr::Call {
            dest: None,
            callee,
            args,
        });
    }

    pub(crate) fn call_runtime(&mut self, function: Runtime, args: Vec<Value>) -> Value {
        self.call(function.callee(), args)
    }

    pub(crate) fn phi(&mut self, ty: IrType, incoming: Vec<(Value, BasicBlockId)>) -> Value {
        let dest = self.new_register(ty);
        self.emit(IrInstr::Phi {
            dest: dest.clone(),
            incoming,
        });
        dest
    }

    /// `exit(1)` and end the current block
    pub(crate) fn emit_exit_failure(&mut self) {
        self.call_void(Runtime::Exit.callee(), vec![Value::i32(1)]);
        self.terminate(Terminator::Unreachable);
    }

    /// Exit with status 1 when `cond` holds; lowering continues in the
    /// `passed` block.
    pub(crate) fn exit_if(&mut self, cond: Value, failed: &'static str, passed: &'static str) {
        let label = self.alloc_label();
        let failed = BasicBlockId::new(failed, label);
        let passed = BasicBlockId::new(passed, label);
        self.terminate(Terminator::Branch {
            cond,
            then_block: failed,
            else_block: passed,
        });
        self.switch_to(failed);
        self.emit_exit_failure();
        self.switch_to(passed);
    }
}
