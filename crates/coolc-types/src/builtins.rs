//! Built-in classes and their methods
//!
//! Object, IO, Int, String and Bool exist before any user class. Their
//! methods have no source body; the code generator supplies one per
//! [`BuiltinMethod`] tag.

use crate::class::{ClassDescriptor, ClassId, MethodBody, Param, Primitive};
use crate::table::ClassTable;

/// Built-in method implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinMethod {
    /// `Object.abort() : Object`
    Abort,
    /// `Object.type_name() : String`
    TypeName,
    /// `Object.copy() : Object`
    Copy,
    /// `IO.out_string(x : String) : Object`
    OutString,
    /// `IO.out_int(x : Int) : Object`
    OutInt,
    /// `IO.in_string() : String`
    InString,
    /// `IO.in_int() : Int`
    InInt,
    /// `String.length() : Int`
    Length,
    /// `String.concat(s : String) : String`
    Concat,
    /// `String.substr(i : Int, l : Int) : String`
    Substr,
}

impl BuiltinMethod {
    /// Every built-in, in vtable declaration order per class
    pub const ALL: [BuiltinMethod; 10] = [
        BuiltinMethod::Abort,
        BuiltinMethod::TypeName,
        BuiltinMethod::Copy,
        BuiltinMethod::OutString,
        BuiltinMethod::OutInt,
        BuiltinMethod::InString,
        BuiltinMethod::InInt,
        BuiltinMethod::Length,
        BuiltinMethod::Concat,
        BuiltinMethod::Substr,
    ];

    /// Source-level method name
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinMethod::Abort => "abort",
            BuiltinMethod::TypeName => "type_name",
            BuiltinMethod::Copy => "copy",
            BuiltinMethod::OutString => "out_string",
            BuiltinMethod::OutInt => "out_int",
            BuiltinMethod::InString => "in_string",
            BuiltinMethod::InInt => "in_int",
            BuiltinMethod::Length => "length",
            BuiltinMethod::Concat => "concat",
            BuiltinMethod::Substr => "substr",
        }
    }

    /// Class that declares the method
    pub fn owner(&self) -> ClassId {
        match self {
            BuiltinMethod::Abort | BuiltinMethod::TypeName | BuiltinMethod::Copy => ClassId::OBJECT,
            BuiltinMethod::OutString
            | BuiltinMethod::OutInt
            | BuiltinMethod::InString
            | BuiltinMethod::InInt => ClassId::IO,
            BuiltinMethod::Length | BuiltinMethod::Concat | BuiltinMethod::Substr => {
                ClassId::STRING
            }
        }
    }

    fn signature(&self) -> (Vec<Param>, ClassId) {
        match self {
            BuiltinMethod::Abort | BuiltinMethod::Copy => (vec![], ClassId::OBJECT),
            BuiltinMethod::TypeName => (vec![], ClassId::STRING),
            BuiltinMethod::OutString => (vec![Param::new("x", ClassId::STRING)], ClassId::OBJECT),
            BuiltinMethod::OutInt => (vec![Param::new("x", ClassId::INT)], ClassId::OBJECT),
            BuiltinMethod::InString => (vec![], ClassId::STRING),
            BuiltinMethod::InInt => (vec![], ClassId::INT),
            BuiltinMethod::Length => (vec![], ClassId::INT),
            BuiltinMethod::Concat => (vec![Param::new("s", ClassId::STRING)], ClassId::STRING),
            BuiltinMethod::Substr => (
                vec![Param::new("i", ClassId::INT), Param::new("l", ClassId::INT)],
                ClassId::STRING,
            ),
        }
    }
}

/// Register the five built-in classes and their methods.
///
/// Must run on an empty table so the ids line up with the `ClassId`
/// constants.
pub(crate) fn install(table: &mut ClassTable) {
    let classes: [(&str, ClassId, bool, Option<Primitive>); 5] = [
        ("Object", ClassId::OBJECT, false, None),
        ("IO", ClassId::OBJECT, false, None),
        ("Int", ClassId::OBJECT, true, Some(Primitive::Int)),
        ("String", ClassId::OBJECT, true, Some(Primitive::String)),
        ("Bool", ClassId::OBJECT, true, Some(Primitive::Bool)),
    ];

    for (index, (name, parent, sealed, primitive)) in classes.into_iter().enumerate() {
        let id = ClassId(index as u32);
        let mut class = ClassDescriptor::new(id, name, None);
        class.parent = parent;
        class.builtin = true;
        class.sealed = sealed;
        class.primitive = primitive;
        table.push_class(class);
    }

    for builtin in BuiltinMethod::ALL {
        let (params, return_type) = builtin.signature();
        table.push_method(
            builtin.owner(),
            builtin.name(),
            params,
            return_type,
            MethodBody::Builtin(builtin),
        );
    }
}
