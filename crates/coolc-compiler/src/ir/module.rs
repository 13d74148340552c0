//! IR Module
//!
//! Top-level container for one compiled program: named struct types,
//! globals, function definitions and external declarations.

use super::function::IrFunction;
use super::types::IrType;
use super::value::Value;

/// Named struct type: `%name = type { fields }`
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub fields: Vec<IrType>,
}

impl TypeDef {
    /// The `%name` type this definition introduces
    pub fn ty(&self) -> IrType {
        IrType::Named(self.name.clone())
    }
}

/// Initializer of a global
#[derive(Debug, Clone)]
pub enum Constant {
    /// NUL-terminated byte string, printed as `c"..."`
    CString(Vec<u8>),
    /// Struct literal; each field is a typed constant
    Struct(Vec<Value>),
    /// Single scalar
    Scalar(Value),
}

/// A module-level variable
#[derive(Debug, Clone)]
pub struct Global {
    /// Symbol name, without the `@`
    pub name: String,
    /// Emitted as `private unnamed_addr constant` instead of `global`
    pub private_constant: bool,
    pub ty: IrType,
    pub init: Constant,
}

impl Global {
    /// Private string constant with a trailing NUL
    pub fn cstring(name: impl Into<String>, text: &[u8]) -> Self {
        let mut bytes = text.to_vec();
        bytes.push(0);
        Self {
            name: name.into(),
            private_constant: true,
            ty: IrType::Array(bytes.len(), Box::new(IrType::I8)),
            init: Constant::CString(bytes),
        }
    }

    /// `i8*` to the first byte of an array global
    pub fn first_byte(&self) -> Value {
        Value::new(
            format!(
                "getelementptr inbounds ({}, {}* @{}, i32 0, i32 0)",
                self.ty, self.ty, self.name
            ),
            IrType::byte_ptr(),
        )
    }
}

/// External function declaration: `declare ret @name(params)`
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub ret: IrType,
    pub params: Vec<IrType>,
    pub variadic: bool,
}

impl Declaration {
    pub fn signature(&self) -> IrType {
        IrType::Function {
            ret: Box::new(self.ret.clone()),
            params: self.params.clone(),
            variadic: self.variadic,
        }
    }

    /// The declared function as a call target
    pub fn callee(&self) -> Value {
        Value::global(&self.name, self.signature().ptr())
    }
}

/// An IR module (compilation unit)
#[derive(Debug, Clone, Default)]
pub struct IrModule {
    /// Module name
    pub name: String,
    /// Constants: format strings, class names, literals
    pub constants: Vec<Global>,
    /// Named struct types, vtable before instance per class
    pub types: Vec<TypeDef>,
    /// Vtable instances and other mutable globals
    pub globals: Vec<Global>,
    /// Functions in this module
    pub functions: Vec<IrFunction>,
    /// Runtime functions provided at link time
    pub declarations: Vec<Declaration>,
}

impl IrModule {
    /// Create a new empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_function(&mut self, func: IrFunction) {
        self.functions.push(func);
    }

    /// Get a function by name
    pub fn get_function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Get a named struct type by name
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Get a global or constant by name
    pub fn get_global(&self, name: &str) -> Option<&Global> {
        self.globals
            .iter()
            .chain(&self.constants)
            .find(|g| g.name == name)
    }

    /// Get the number of functions
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}
