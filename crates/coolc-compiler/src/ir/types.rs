//! IR Types
//!
//! First-class types of the emitted IR, printed in typed-pointer syntax.

use std::fmt;

/// A type in the emitted IR
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    I1,
    I8,
    I32,
    I64,
    /// Named struct type, printed as `%name`
    Named(String),
    Pointer(Box<IrType>),
    Array(usize, Box<IrType>),
    Function {
        ret: Box<IrType>,
        params: Vec<IrType>,
        variadic: bool,
    },
}

impl IrType {
    /// Pointer to this type
    pub fn ptr(self) -> IrType {
        IrType::Pointer(Box::new(self))
    }

    /// `i8*`, the untyped byte pointer
    pub fn byte_ptr() -> IrType {
        IrType::I8.ptr()
    }

    /// Type behind a pointer
    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Pointer(_))
    }

    /// Return type of a function or function pointer type
    pub fn return_type(&self) -> Option<&IrType> {
        match self {
            IrType::Function { ret, .. } => Some(ret),
            IrType::Pointer(inner) => inner.return_type(),
            _ => None,
        }
    }

    pub fn is_variadic_function(&self) -> bool {
        match self {
            IrType::Function { variadic, .. } => *variadic,
            IrType::Pointer(inner) => inner.is_variadic_function(),
            _ => false,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::Named(name) => write!(f, "%{}", name),
            IrType::Pointer(inner) => write!(f, "{}*", inner),
            IrType::Array(len, elem) => write!(f, "[{} x {}]", len, elem),
            IrType::Function {
                ret,
                params,
                variadic,
            } => {
                write!(f, "{} (", ret)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                if *variadic {
                    if !params.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, ")")
            }
        }
    }
}
