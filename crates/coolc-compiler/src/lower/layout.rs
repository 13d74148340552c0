//! Object and vtable layout
//!
//! Every class `C` gets two struct types and one vtable instance:
//!
//! ```text
//! %__class_C    = type { i8* parent, i8* name, i64 size, <slot function pointers> }
//! %__instance_C = type { %__class_C*, <payload>, <one %__instance_T* per attribute> }
//! @_C           = global %__class_C { ... }
//! ```
//!
//! Slot `k` of the class's dispatch list is field `k + VTABLE_HEADER` of
//! the vtable. Attributes follow the flattened order, inherited first, so a
//! subclass instance is a prefix-compatible extension of its parent's.

use super::Compiler;
use crate::ir::{Constant, Global, IrType, TypeDef, Value};
use coolc_types::{AttributeId, ClassId, ClassTable, MethodId, Primitive};
use tracing::trace;

/// Vtable field holding the parent vtable as `i8*`
pub const VTABLE_PARENT: u32 = 0;
/// Vtable field holding the class name
pub const VTABLE_NAME: u32 = 1;
/// Vtable field holding the instance size in bytes
pub const VTABLE_SIZE: u32 = 2;
/// Fields before the first method slot
pub const VTABLE_HEADER: u32 = 3;

/// Instance field holding the vtable pointer
pub const INSTANCE_VTABLE: u32 = 0;
/// First payload field of Int, String and Bool
pub const INSTANCE_PAYLOAD: u32 = 1;

pub fn instance_type(class: &str) -> IrType {
    IrType::Named(format!("__instance_{}", class))
}

pub fn instance_ptr(class: &str) -> IrType {
    instance_type(class).ptr()
}

pub fn vtable_type(class: &str) -> IrType {
    IrType::Named(format!("__class_{}", class))
}

pub fn vtable_symbol(class: &str) -> String {
    format!("_{}", class)
}

pub fn class_name_symbol(class: &str) -> String {
    format!("__name_{}", class)
}

pub fn method_symbol(owner: &str, method: &str) -> String {
    format!("__method_{}_{}", owner, method)
}

pub fn constructor_symbol(class: &str) -> String {
    format!("__new_{}", class)
}

/// Unboxed fields after the vtable pointer
pub fn payload_fields(primitive: Option<Primitive>) -> Vec<IrType> {
    match primitive {
        Some(Primitive::Int) => vec![IrType::I32],
        Some(Primitive::String) => vec![IrType::I32, IrType::byte_ptr()],
        Some(Primitive::Bool) => vec![IrType::I1],
        None => Vec::new(),
    }
}

/// Field index of `attr` in instances of `class`
pub fn attribute_field(table: &ClassTable, class: ClassId, attr: AttributeId) -> Option<u32> {
    let payload = payload_fields(table.class(class).primitive).len();
    table
        .attribute_index(class, attr)
        .map(|index| (1 + payload + index) as u32)
}

/// Function type of a method implementation.
///
/// The receiver is always the root instance type.
pub fn method_type(table: &ClassTable, method: MethodId) -> IrType {
    let descriptor = table.method(method);
    let mut params = vec![instance_ptr(table.name(ClassId::OBJECT))];
    params.extend(
        descriptor
            .params
            .iter()
            .map(|p| instance_ptr(table.name(p.ty))),
    );
    IrType::Function {
        ret: Box::new(instance_ptr(table.name(descriptor.return_type))),
        params,
        variadic: false,
    }
}

/// The global vtable instance of `class`
pub fn vtable_ref(table: &ClassTable, class: ClassId) -> Value {
    let name = table.name(class);
    Value::global(&vtable_symbol(name), vtable_type(name).ptr())
}

/// The vtable of `class` as an `i8*` constant, the form stored in a
/// vtable's parent field
pub fn vtable_bytes(table: &ClassTable, class: ClassId) -> Value {
    let name = table.name(class);
    Value::new(
        format!("bitcast ({}* @{} to i8*)", vtable_type(name), vtable_symbol(name)),
        IrType::byte_ptr(),
    )
}

/// `i64` constant expression for the size of `ty`
pub fn size_constant(ty: &IrType) -> Value {
    Value::new(
        format!(
            "ptrtoint ({}* getelementptr ({}, {}* null, i32 1) to i64)",
            ty, ty, ty
        ),
        IrType::I64,
    )
}

impl Compiler<'_> {
    /// Emit class name strings, struct types and vtable instances.
    pub(super) fn emit_class_layouts(&mut self) {
        let table = self.table;
        for class in table.classes() {
            let name = class.name.as_str();

            let name_global = Global::cstring(class_name_symbol(name), name.as_bytes());
            let name_ptr = name_global.first_byte();
            self.module.constants.push(name_global);

            let mut vtable_fields = vec![IrType::byte_ptr(), IrType::byte_ptr(), IrType::I64];
            vtable_fields.extend(class.dispatch.iter().map(|&m| method_type(table, m).ptr()));
            self.module.types.push(TypeDef {
                name: format!("__class_{}", name),
                fields: vtable_fields,
            });

            let mut instance_fields = vec![vtable_type(name).ptr()];
            instance_fields.extend(payload_fields(class.primitive));
            instance_fields.extend(
                class
                    .flattened_attributes
                    .iter()
                    .map(|&a| instance_ptr(table.name(table.attribute(a).ty))),
            );
            self.module.types.push(TypeDef {
                name: format!("__instance_{}", name),
                fields: instance_fields,
            });

            let mut vtable = vec![
                vtable_bytes(table, class.parent),
                name_ptr,
                size_constant(&instance_type(name)),
            ];
            vtable.extend(class.dispatch.iter().map(|&m| {
                let method = table.method(m);
                Value::global(
                    &method_symbol(table.name(method.owner), &method.name),
                    method_type(table, m).ptr(),
                )
            }));
            self.module.globals.push(Global {
                name: vtable_symbol(name),
                private_constant: false,
                ty: vtable_type(name),
                init: Constant::Struct(vtable),
            });

            trace!(
                class = name,
                slots = class.dispatch.len(),
                attributes = class.flattened_attributes.len(),
                "laid out class"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coolc_types::DeclRef;

    fn decl(feature: usize) -> DeclRef {
        DeclRef { class: 0, feature }
    }

    #[test]
    fn test_attribute_fields_follow_vtable_pointer() {
        let mut table = ClassTable::new();
        let a = table.add_class("A", Some(0)).unwrap();
        let b = table.add_class("B", Some(1)).unwrap();
        table.set_parent(b, a);
        let x = table.add_attribute(a, "x", ClassId::INT, Some(decl(0))).unwrap();
        let y = table.add_attribute(b, "y", ClassId::STRING, Some(decl(0))).unwrap();
        table.inherit_all();

        assert_eq!(attribute_field(&table, a, x), Some(1));
        assert_eq!(attribute_field(&table, b, x), Some(1));
        assert_eq!(attribute_field(&table, b, y), Some(2));
        assert_eq!(attribute_field(&table, a, y), None);
    }

    #[test]
    fn test_method_type_uses_root_receiver() {
        let table = ClassTable::new();
        let concat = table.lookup_method(ClassId::STRING, "concat").unwrap();
        assert_eq!(
            method_type(&table, concat).to_string(),
            "%__instance_String* (%__instance_Object*, %__instance_String*)"
        );
    }

    #[test]
    fn test_payload_fields() {
        assert_eq!(payload_fields(Some(Primitive::String)).len(), 2);
        assert_eq!(payload_fields(Some(Primitive::Bool)), vec![IrType::I1]);
        assert!(payload_fields(None).is_empty());
    }

    #[test]
    fn test_vtable_bytes() {
        let table = ClassTable::new();
        assert_eq!(
            vtable_bytes(&table, ClassId::IO).typed().to_string(),
            "i8* bitcast (%__class_IO* @_IO to i8*)"
        );
    }

    #[test]
    fn test_size_constant() {
        let value = size_constant(&instance_type("Int"));
        assert_eq!(
            value.typed().to_string(),
            "i64 ptrtoint (%__instance_Int* getelementptr (%__instance_Int, %__instance_Int* null, i32 1) to i64)"
        );
    }
}
