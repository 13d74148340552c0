//! IR Values
//!
//! Operands of instructions: virtual registers, globals and constants. Every
//! value carries its IR type so instructions can print typed operands.

use super::types::IrType;
use std::fmt;

/// Virtual register identifier, printed as `%iN`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterId(pub u32);

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%i{}", self.0)
    }
}

/// An operand together with its type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    /// Textual form: `%i4`, `@_Main`, `null`, `42`, a constant expression
    pub repr: String,
    /// IR type of the operand
    pub ty: IrType,
}

impl Value {
    pub fn new(repr: impl Into<String>, ty: IrType) -> Self {
        Self {
            repr: repr.into(),
            ty,
        }
    }

    pub fn register(id: RegisterId, ty: IrType) -> Self {
        Self::new(id.to_string(), ty)
    }

    /// Reference to a global symbol; `ty` is the pointer type of the symbol
    pub fn global(name: &str, ty: IrType) -> Self {
        Self::new(format!("@{}", name), ty)
    }

    /// Function parameter, printed as `%name`
    pub fn param(name: &str, ty: IrType) -> Self {
        Self::new(format!("%{}", name), ty)
    }

    pub fn null(ty: IrType) -> Self {
        Self::new("null", ty)
    }

    pub fn i32(value: i32) -> Self {
        Self::new(value.to_string(), IrType::I32)
    }

    pub fn i64(value: i64) -> Self {
        Self::new(value.to_string(), IrType::I64)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(if value { "true" } else { "false" }, IrType::I1)
    }

    /// Printable as `<type> <repr>`
    pub fn typed(&self) -> Typed<'_> {
        Typed(self)
    }

    /// Slot values point at an object pointer instead of being one
    pub fn is_slot(&self) -> bool {
        self.ty.pointee().is_some_and(IrType::is_pointer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

/// Display adapter printing a value with its type
pub struct Typed<'a>(&'a Value);

impl fmt::Display for Typed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0.ty, self.0.repr)
    }
}
