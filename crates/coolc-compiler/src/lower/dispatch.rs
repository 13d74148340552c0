//! Method dispatch and the program entry point
//!
//! Dynamic dispatch loads the receiver's runtime vtable; static dispatch
//! (`e@T.m()`) reads the slot straight out of `@_T`. Either way the slot
//! index comes from the class the method was looked up in, and every
//! override of a method shares that slot. An explicit receiver that is
//! void exits with status 1 before the vtable is touched.

use super::builder::{FunctionLowerer, LocalEnv};
use super::layout::{self, VTABLE_HEADER};
use super::Compiler;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{CmpPred, IrFunction, IrType, Terminator, Value};
use coolc_ast::Expr;
use coolc_types::{ClassId, MethodId};
use tracing::{debug, warn};

/// Class instantiated by the entry point
pub const MAIN_CLASS: &str = "Main";
/// Method the entry point calls
pub const MAIN_METHOD: &str = "main";

impl FunctionLowerer<'_, '_> {
    pub(super) fn lower_dispatch(
        &mut self,
        receiver: Option<&Expr>,
        static_type: Option<&str>,
        method: &str,
        args: &[Expr],
        env: &mut LocalEnv,
    ) -> CodegenResult<Value> {
        let table = self.table;
        let (object, receiver_ty) = match receiver {
            Some(receiver) => {
                let ty = self.static_type(receiver)?;
                (self.lower_value(receiver, env)?, ty)
            }
            None => (self.receiver(), self.class()),
        };

        let lookup = match static_type {
            Some(name) => table
                .class_id(name)
                .ok_or_else(|| CodegenError::malformed(format!("unknown type {}", name)))?,
            None => receiver_ty,
        };
        let unknown = || {
            CodegenError::malformed(format!(
                "class {} has no method {}",
                table.name(lookup),
                method
            ))
        };
        let method_id = table.lookup_method(lookup, method).ok_or_else(unknown)?;
        let slot = table.method_slot(lookup, method).ok_or_else(unknown)?;

        let params = &table.method(method_id).params;
        if params.len() != args.len() {
            return Err(CodegenError::malformed(format!(
                "{} expects {} argument(s), got {}",
                method,
                params.len(),
                args.len()
            )));
        }
        let mut values = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(params) {
            let value = self.lower_value(arg, env)?;
            values.push(self.coerce(value, param.ty));
        }

        if receiver.is_some() {
            let root = self.coerce(object.clone(), ClassId::OBJECT);
            let null = Value::null(root.ty.clone());
            let is_void = self.compare(CmpPred::Eq, root, null);
            self.exit_if(is_void, "dispatch.void", "dispatch.ok");
        }

        let vtable = match static_type {
            Some(_) => layout::vtable_ref(table, lookup),
            None => self.load_vtable(object.clone(), lookup)?,
        };
        self.call_virtual(vtable, object, method_id, slot, values)
    }

    /// Call through slot `slot` of `vtable` with `receiver` as `self`
    pub(super) fn call_virtual(
        &mut self,
        vtable: Value,
        receiver: Value,
        method: MethodId,
        slot: usize,
        args: Vec<Value>,
    ) -> CodegenResult<Value> {
        let fn_ptr = layout::method_type(self.table, method).ptr();
        let index = u32::try_from(slot)
            .map_err(|_| CodegenError::malformed(format!("vtable slot {} out of range", slot)))?;
        let entry = self.field_addr(vtable, index + VTABLE_HEADER, fn_ptr);
        let callee = self.load(entry)?;

        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(self.coerce(receiver, ClassId::OBJECT));
        call_args.extend(args);
        Ok(self.call(callee, call_args))
    }
}

impl Compiler<'_> {
    /// Resolve `Main.main` for the entry point
    fn entry_target(&self) -> CodegenResult<(ClassId, MethodId, usize)> {
        let table = self.table;
        let main_class = table
            .class_id(MAIN_CLASS)
            .ok_or(CodegenError::MissingMainClass)?;
        let method = table
            .lookup_method(main_class, MAIN_METHOD)
            .ok_or(CodegenError::MissingMainMethod)?;
        let arity = table.method(method).arity();
        if arity != 0 {
            return Err(CodegenError::MainTakesArguments { arity });
        }
        let slot = table
            .method_slot(main_class, MAIN_METHOD)
            .ok_or(CodegenError::MissingMainMethod)?;
        Ok((main_class, method, slot))
    }

    /// Emit `@main`: build a `Main` and call its `main` through the vtable.
    pub(super) fn emit_entry_point(&mut self) -> CodegenResult<()> {
        let target = match self.entry_target() {
            Ok(target) => Some(target),
            Err(err) if self.options.lenient => {
                warn!(error = %err, "emitting an entry point that does nothing");
                None
            }
            Err(err) => return Err(err),
        };

        let func = IrFunction::new("main", Vec::new(), IrType::I32);
        let mut f = FunctionLowerer::new(self, func, ClassId::OBJECT);
        if let Some((main_class, method, slot)) = target {
            debug!(slot, "emitting entry point");
            let object = f.instantiate(main_class);
            let vtable = f.load_vtable(object.clone(), main_class)?;
            f.call_virtual(vtable, object, method, slot, Vec::new())?;
        }
        f.terminate(Terminator::Return(Value::i32(0)));
        let func = f.finish();
        self.module.add_function(func);
        Ok(())
    }
}
