//! Object construction, boxing and field access
//!
//! Every value is a heap object. Int, String and Bool carry their payload
//! right after the vtable pointer; boxing allocates a fresh instance and
//! writes the payload, unboxing reads it back.

use super::builder::{FunctionLowerer, LocalEnv};
use super::layout::{self, INSTANCE_PAYLOAD, INSTANCE_VTABLE};
use super::{attribute_init, Compiler};
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{CastOp, IrFunction, IrType, Terminator, Value};
use crate::runtime::{self, Runtime};
use coolc_ast::Program;
use coolc_types::{AttributeId, ClassId, Primitive};
use tracing::trace;

impl Compiler<'_> {
    /// Emit `@__new_C`, the constructor of `class`.
    ///
    /// Allocates and zeroes the instance, stores the vtable, writes payload
    /// defaults, gives every attribute its default value, then runs the
    /// attribute initializers in flattened order with the new object as
    /// `self`.
    pub(super) fn emit_constructor(&mut self, class: ClassId, program: &Program) -> CodegenResult<()> {
        let table = self.table;
        let descriptor = table.class(class);
        let name = descriptor.name.as_str();
        let func = IrFunction::new(
            layout::constructor_symbol(name),
            Vec::new(),
            layout::instance_ptr(name),
        );

        let mut f = FunctionLowerer::new(self, func, class);
        let object = f.allocate(class);

        let vtable_slot = f.field_addr(
            object.clone(),
            INSTANCE_VTABLE,
            layout::vtable_type(name).ptr(),
        );
        f.store(layout::vtable_ref(table, class), vtable_slot);

        match descriptor.primitive {
            Some(Primitive::Int) => {
                let slot = f.field_addr(object.clone(), INSTANCE_PAYLOAD, IrType::I32);
                f.store(Value::i32(0), slot);
            }
            Some(Primitive::Bool) => {
                let slot = f.field_addr(object.clone(), INSTANCE_PAYLOAD, IrType::I1);
                f.store(Value::bool(false), slot);
            }
            Some(Primitive::String) => {
                let len = f.field_addr(object.clone(), INSTANCE_PAYLOAD, IrType::I32);
                f.store(Value::i32(0), len);
                let buf = f.field_addr(object.clone(), INSTANCE_PAYLOAD + 1, IrType::byte_ptr());
                f.store(runtime::empty_buffer(), buf);
            }
            None => {}
        }

        f.set_receiver(object.clone());

        for &attr in &descriptor.flattened_attributes {
            let ty = table.attribute(attr).ty;
            let default = f.default_value(ty);
            let slot = f.attribute_slot(attr)?;
            f.store(default, slot);
        }

        for &attr in &descriptor.flattened_attributes {
            let attribute = table.attribute(attr);
            let Some(decl) = attribute.decl else {
                continue;
            };
            let Some(init) = attribute_init(program, decl)? else {
                continue;
            };
            trace!(class = name, attribute = %attribute.name, "lowering initializer");
            let value = f.lower_value(init, &mut LocalEnv::new())?;
            let value = f.coerce(value, attribute.ty);
            let slot = f.attribute_slot(attr)?;
            f.store(value, slot);
        }

        f.terminate(Terminator::Return(object));
        let func = f.finish();
        self.module.add_function(func);
        Ok(())
    }
}

impl FunctionLowerer<'_, '_> {
    pub(crate) fn instance_ptr(&self, class: ClassId) -> IrType {
        layout::instance_ptr(self.table.name(class))
    }

    /// Reinterpret an object pointer as an instance of `class`
    pub(crate) fn coerce(&mut self, value: Value, class: ClassId) -> Value {
        let ty = self.instance_ptr(class);
        self.bitcast(value, ty)
    }

    /// Raw zeroed storage for one instance of `class`
    pub(crate) fn allocate(&mut self, class: ClassId) -> Value {
        let ty = layout::instance_type(self.table.name(class));
        let size = self.size_of(ty.clone());
        let raw = self.call_runtime(Runtime::GcMalloc, vec![size]);
        self.cast(CastOp::Bitcast, raw, ty.ptr())
    }

    /// A fully constructed instance of `class`
    pub(crate) fn instantiate(&mut self, class: ClassId) -> Value {
        let name = self.table.name(class);
        let ty = layout::instance_ptr(name);
        let callee = Value::global(
            &layout::constructor_symbol(name),
            IrType::Function {
                ret: Box::new(ty),
                params: Vec::new(),
                variadic: false,
            }
            .ptr(),
        );
        self.call(callee, Vec::new())
    }

    /// Default value of a variable of type `class`: a boxed zero, empty
    /// string or false for primitives, null otherwise
    pub(crate) fn default_value(&mut self, class: ClassId) -> Value {
        if self.table.class(class).primitive.is_some() {
            self.instantiate(class)
        } else {
            Value::null(self.instance_ptr(class))
        }
    }

    pub(crate) fn box_int(&mut self, value: Value) -> Value {
        let object = self.instantiate(ClassId::INT);
        let slot = self.field_addr(object.clone(), INSTANCE_PAYLOAD, IrType::I32);
        self.store(value, slot);
        object
    }

    pub(crate) fn box_bool(&mut self, value: Value) -> Value {
        let object = self.instantiate(ClassId::BOOL);
        let slot = self.field_addr(object.clone(), INSTANCE_PAYLOAD, IrType::I1);
        self.store(value, slot);
        object
    }

    pub(crate) fn box_string(&mut self, len: Value, buf: Value) -> Value {
        let object = self.instantiate(ClassId::STRING);
        let len_slot = self.field_addr(object.clone(), INSTANCE_PAYLOAD, IrType::I32);
        self.store(len, len_slot);
        let buf_slot = self.field_addr(object.clone(), INSTANCE_PAYLOAD + 1, IrType::byte_ptr());
        self.store(buf, buf_slot);
        object
    }

    pub(crate) fn unbox_int(&mut self, object: Value) -> CodegenResult<Value> {
        let object = self.coerce(object, ClassId::INT);
        let slot = self.field_addr(object, INSTANCE_PAYLOAD, IrType::I32);
        self.load(slot)
    }

    pub(crate) fn unbox_bool(&mut self, object: Value) -> CodegenResult<Value> {
        let object = self.coerce(object, ClassId::BOOL);
        let slot = self.field_addr(object, INSTANCE_PAYLOAD, IrType::I1);
        self.load(slot)
    }

    /// Length and character buffer of a String
    pub(crate) fn unbox_string(&mut self, object: Value) -> CodegenResult<(Value, Value)> {
        let object = self.coerce(object, ClassId::STRING);
        let len_slot = self.field_addr(object.clone(), INSTANCE_PAYLOAD, IrType::I32);
        let len = self.load(len_slot)?;
        let buf_slot = self.field_addr(object, INSTANCE_PAYLOAD + 1, IrType::byte_ptr());
        let buf = self.load(buf_slot)?;
        Ok((len, buf))
    }

    /// Vtable of `object`, typed as the vtable of `class`
    pub(crate) fn load_vtable(&mut self, object: Value, class: ClassId) -> CodegenResult<Value> {
        let name = self.table.name(class);
        let vtable_ty = layout::vtable_type(name).ptr();
        let object = self.coerce(object, class);
        let slot = self.field_addr(object, INSTANCE_VTABLE, vtable_ty);
        self.load(slot)
    }

    /// Address of an attribute of the current receiver
    pub(crate) fn attribute_slot(&mut self, attr: AttributeId) -> CodegenResult<Value> {
        let class = self.class();
        let field = layout::attribute_field(self.table, class, attr).ok_or_else(|| {
            CodegenError::malformed(format!(
                "attribute {} is not part of class {}",
                self.table.attribute(attr).name,
                self.table.name(class)
            ))
        })?;
        let ty = self.instance_ptr(self.table.attribute(attr).ty);
        let receiver = self.receiver();
        Ok(self.field_addr(receiver, field, ty))
    }

    /// Address of the attribute `name` as seen from the current class
    pub(crate) fn named_attribute_slot(&mut self, name: &str) -> CodegenResult<Value> {
        let attr = self
            .table
            .lookup_attribute(self.class(), name)
            .ok_or_else(|| {
                CodegenError::malformed(format!(
                    "unknown identifier {} in class {}",
                    name,
                    self.table.name(self.class())
                ))
            })?;
        self.attribute_slot(attr)
    }
}
