//! AST to IR Lowering
//!
//! Translates a checked program into an [`IrModule`]. Lowering walks the
//! class table for layouts and the AST for method bodies, reading static
//! types from the checker's side table.
//!
//! Output order: runtime constants, per-class types and name strings,
//! vtable instances, one constructor per class, one function per method
//! implementation, the `main` entry point, and runtime declarations.

mod builder;
mod control_flow;
mod dispatch;
mod expr;
pub mod layout;
mod object;

pub(crate) use builder::{FunctionLowerer, LocalEnv};

use crate::error::{CodegenError, CodegenResult};
use crate::ir::{Global, IrFunction, IrModule, IrType, RegisterId, Terminator, Value};
use crate::options::CodegenOptions;
use crate::runtime::{self, Runtime};
use coolc_ast::{Expr, Feature, Program, SELF_NAME};
use coolc_checker::CheckResult;
use coolc_types::{ClassTable, DeclRef, MethodBody, MethodId};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// Code generator for one checked program
///
/// Register and label counters live here and are never reset; a
/// `Compiler` is consumed by [`Compiler::generate_module`].
pub struct Compiler<'a> {
    table: &'a ClassTable,
    types: &'a CheckResult,
    options: CodegenOptions,
    module: IrModule,
    next_register: u32,
    next_label: u32,
    /// Interned string literals: text to (first byte, length)
    string_literals: FxHashMap<String, (Value, i32)>,
}

impl<'a> Compiler<'a> {
    pub fn new(table: &'a ClassTable, types: &'a CheckResult, options: CodegenOptions) -> Self {
        Self {
            table,
            types,
            options,
            module: IrModule::new("cool"),
            next_register: 0,
            next_label: 0,
            string_literals: FxHashMap::default(),
        }
    }

    /// Lower the whole program.
    pub fn generate_module(mut self, program: &Program) -> CodegenResult<IrModule> {
        let table = self.table;
        debug!(
            classes = table.len(),
            lenient = self.options.lenient,
            "generating module"
        );

        runtime::emit_constants(&mut self.module);
        self.emit_class_layouts();

        for class in table.class_ids() {
            self.emit_constructor(class, program)?;
        }

        for class in table.classes() {
            for &method in &class.method_order {
                self.emit_method(method, program)?;
            }
        }

        self.emit_entry_point()?;

        self.module.declarations = Runtime::ALL.iter().map(Runtime::declaration).collect();
        debug!(
            functions = self.module.function_count(),
            registers = self.next_register,
            "module generated"
        );
        Ok(self.module)
    }

    fn alloc_register(&mut self, ty: IrType) -> Value {
        let id = RegisterId(self.next_register);
        self.next_register += 1;
        Value::register(id, ty)
    }

    fn alloc_label(&mut self) -> u32 {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    /// Pointer to the first byte of an interned literal, and its length
    fn string_literal(&mut self, text: &str) -> CodegenResult<(Value, i32)> {
        if let Some(literal) = self.string_literals.get(text) {
            return Ok(literal.clone());
        }
        let len = i32::try_from(text.len())
            .map_err(|_| CodegenError::malformed("string literal longer than i32::MAX"))?;
        let global = Global::cstring(
            format!(".str.{}", self.string_literals.len()),
            text.as_bytes(),
        );
        let literal = (global.first_byte(), len);
        self.module.constants.push(global);
        self.string_literals
            .insert(text.to_string(), literal.clone());
        Ok(literal)
    }

    /// One function per method implementation, named after its owner.
    ///
    /// The receiver always arrives as `%__instance_Object*` so every
    /// implementation stored in a given vtable slot has the same type.
    fn emit_method(&mut self, method: MethodId, program: &Program) -> CodegenResult<()> {
        let table = self.table;
        let descriptor = table.method(method);
        let owner = table.name(descriptor.owner);

        let mut params = vec![Value::param(SELF_NAME, layout::instance_ptr("Object"))];
        params.extend(descriptor.params.iter().map(|p| {
            Value::param(
                &format!("arg.{}", p.name),
                layout::instance_ptr(table.name(p.ty)),
            )
        }));
        let func = IrFunction::new(
            layout::method_symbol(owner, &descriptor.name),
            params,
            layout::instance_ptr(table.name(descriptor.return_type)),
        );
        trace!(function = %func.name, "lowering method");

        let mut lowerer = FunctionLowerer::new(self, func, descriptor.owner);
        let receiver = lowerer.param(0)?;
        let receiver = lowerer.coerce(receiver, descriptor.owner);
        lowerer.set_receiver(receiver);

        match descriptor.body {
            MethodBody::Builtin(builtin) => runtime::lower_builtin(&mut lowerer, builtin)?,
            MethodBody::User(decl) => {
                let body = method_body(program, decl)?;
                let mut env = LocalEnv::new();
                for (index, param) in descriptor.params.iter().enumerate() {
                    let value = lowerer.param(index + 1)?;
                    let slot = lowerer.alloca(value.ty.clone());
                    lowerer.store(value, slot.clone());
                    env.push(param.name.as_str(), slot);
                }
                let result = lowerer.lower_value(body, &mut env)?;
                let result = lowerer.coerce(result, descriptor.return_type);
                lowerer.terminate(Terminator::Return(result));
            }
        }

        let func = lowerer.finish();
        self.module.add_function(func);
        Ok(())
    }
}

fn feature(program: &Program, decl: DeclRef) -> CodegenResult<&Feature> {
    program
        .classes
        .get(decl.class)
        .and_then(|class| class.features.get(decl.feature))
        .ok_or_else(|| {
            CodegenError::malformed(format!(
                "declaration {}:{} is not in the program",
                decl.class, decl.feature
            ))
        })
}

fn method_body(program: &Program, decl: DeclRef) -> CodegenResult<&Expr> {
    match feature(program, decl)? {
        Feature::Method { body, .. } => Ok(body),
        Feature::Attribute { name, .. } => Err(CodegenError::malformed(format!(
            "attribute {} recorded as a method",
            name
        ))),
    }
}

fn attribute_init(program: &Program, decl: DeclRef) -> CodegenResult<Option<&Expr>> {
    match feature(program, decl)? {
        Feature::Attribute { init, .. } => Ok(init.as_ref()),
        Feature::Method { name, .. } => Err(CodegenError::malformed(format!(
            "method {} recorded as an attribute",
            name
        ))),
    }
}
