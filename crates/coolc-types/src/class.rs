//! Class, attribute and method descriptors

use crate::builtins::BuiltinMethod;
use rustc_hash::FxHashMap;
use std::fmt;

/// Index of a class in the [`crate::ClassTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    /// The root class
    pub const OBJECT: ClassId = ClassId(0);
    /// `IO`
    pub const IO: ClassId = ClassId(1);
    /// `Int`
    pub const INT: ClassId = ClassId(2);
    /// `String`
    pub const STRING: ClassId = ClassId(3);
    /// `Bool`
    pub const BOOL: ClassId = ClassId(4);

    /// Position in registration order
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Index of a method in the [`crate::ClassTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(pub(crate) u32);

impl MethodId {
    /// Arena index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Index of an attribute in the [`crate::ClassTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeId(pub(crate) u32);

impl AttributeId {
    /// Arena index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Location of a declaration in the program tree
///
/// `class` indexes `Program::classes`; `feature` indexes that class's
/// `features`. The table stores these instead of references so it can
/// outlive the traversal that built it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclRef {
    /// Index into `Program::classes`
    pub class: usize,
    /// Index into `Class::features`
    pub feature: usize,
}

/// Unboxed payload carried by the primitive built-in classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// 32-bit integer value
    Int,
    /// Length plus character buffer
    String,
    /// Single bit
    Bool,
}

/// A class in the table
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    /// Class name (unique)
    pub name: String,
    /// This class's id
    pub id: ClassId,
    /// Parent class; the root is its own parent
    pub parent: ClassId,
    /// Methods declared directly in this class
    pub methods: FxHashMap<String, MethodId>,
    /// Same methods in declaration order
    pub method_order: Vec<MethodId>,
    /// Attributes declared directly in this class
    pub attributes: FxHashMap<String, AttributeId>,
    /// Same attributes in declaration order
    pub attribute_order: Vec<AttributeId>,
    /// All attributes, inherited first, root to leaf
    pub flattened_attributes: Vec<AttributeId>,
    /// Vtable layout: slot `k` holds the implementation reached by dispatch
    pub dispatch: Vec<MethodId>,
    /// Pre-populated class with no source declaration
    pub builtin: bool,
    /// Cannot be inherited from
    pub sealed: bool,
    /// Unboxed payload for Int / String / Bool
    pub primitive: Option<Primitive>,
    /// Index into `Program::classes` for user classes
    pub decl: Option<usize>,
    pub(crate) inheritance_done: bool,
}

impl ClassDescriptor {
    pub(crate) fn new(id: ClassId, name: impl Into<String>, decl: Option<usize>) -> Self {
        Self {
            name: name.into(),
            id,
            parent: ClassId::OBJECT,
            methods: FxHashMap::default(),
            method_order: Vec::new(),
            attributes: FxHashMap::default(),
            attribute_order: Vec::new(),
            flattened_attributes: Vec::new(),
            dispatch: Vec::new(),
            builtin: false,
            sealed: false,
            primitive: None,
            decl,
            inheritance_done: false,
        }
    }

    /// Whether flattening has run for this class
    pub fn is_flattened(&self) -> bool {
        self.inheritance_done
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An attribute declared in some class
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    /// This attribute's id
    pub id: AttributeId,
    /// Attribute name
    pub name: String,
    /// Declared type
    pub ty: ClassId,
    /// Declaring class
    pub owner: ClassId,
    /// Position within the owner's own declarations
    pub local_index: usize,
    /// Declaring feature, carrying the optional initializer
    pub decl: Option<DeclRef>,
}

/// A formal parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: ClassId,
}

impl Param {
    /// Create a parameter
    pub fn new(name: impl Into<String>, ty: ClassId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Where a method's implementation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodBody {
    /// Hand-written runtime body
    Builtin(BuiltinMethod),
    /// Source declaration
    User(DeclRef),
}

/// A method declared in some class
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    /// This method's id
    pub id: MethodId,
    /// Method name
    pub name: String,
    /// Formal parameters in order
    pub params: Vec<Param>,
    /// Declared return type
    pub return_type: ClassId,
    /// Declaring class
    pub owner: ClassId,
    /// Vtable slot, set once during flattening
    pub slot: Option<usize>,
    /// Implementation
    pub body: MethodBody,
}

impl MethodDescriptor {
    /// Number of formal parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
