//! Intermediate Representation (IR) for Cool
//!
//! An in-memory model of the emitted LLVM-style IR. Lowering builds these
//! structures; `Display` turns them into text.
//!
//! # Structure
//!
//! - `IrModule` - Types, globals, functions and external declarations
//! - `IrFunction` - A function with typed parameters and basic blocks
//! - `BasicBlock` - A sequence of instructions with a single entry and exit
//! - `IrInstr` - Typed instructions
//! - `Value` - Registers, globals and constants with their IR type

pub mod block;
pub mod function;
pub mod instr;
pub mod module;
pub mod pretty;
pub mod types;
pub mod value;

pub use block::{BasicBlock, BasicBlockId, Terminator};
pub use function::IrFunction;
pub use instr::{BinaryOp, CastOp, CmpPred, IrInstr};
pub use module::{Constant, Declaration, Global, IrModule, TypeDef};
pub use types::IrType;
pub use value::{RegisterId, Value};
