//! Basic Blocks and Control Flow
//!
//! Basic blocks are sequences of instructions with a single entry point
//! and a single exit point (the terminator).

use super::instr::IrInstr;
use super::value::Value;
use std::fmt;

/// Basic block identifier, printed as `<kind>.<index>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicBlockId {
    kind: &'static str,
    index: u32,
}

impl BasicBlockId {
    /// The first block of every function
    pub const ENTRY: BasicBlockId = BasicBlockId {
        kind: "entry",
        index: 0,
    };

    pub fn new(kind: &'static str, index: u32) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for BasicBlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == BasicBlockId::ENTRY {
            write!(f, "entry")
        } else {
            write!(f, "{}.{}", self.kind, self.index)
        }
    }
}

/// A basic block: sequence of instructions with single entry and exit
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Unique identifier for this block, also its label
    pub id: BasicBlockId,
    /// Instructions in this block (excluding terminator)
    pub instructions: Vec<IrInstr>,
    /// How this block exits
    pub terminator: Terminator,
}

impl BasicBlock {
    /// Create a new empty basic block
    pub fn new(id: BasicBlockId) -> Self {
        Self {
            id,
            instructions: Vec::new(),
            terminator: Terminator::Unreachable,
        }
    }

    /// Add an instruction to this block
    pub fn add_instr(&mut self, instr: IrInstr) {
        self.instructions.push(instr);
    }

    /// Set the terminator for this block
    pub fn set_terminator(&mut self, term: Terminator) {
        self.terminator = term;
    }

    /// Get the successor blocks
    pub fn successors(&self) -> Vec<BasicBlockId> {
        self.terminator.successors()
    }
}

/// Control flow terminator (ends a basic block)
#[derive(Debug, Clone)]
pub enum Terminator {
    /// Unconditional jump
    Jump(BasicBlockId),

    /// Two-way branch on an `i1`
    Branch {
        cond: Value,
        then_block: BasicBlockId,
        else_block: BasicBlockId,
    },

    /// Return from function
    Return(Value),

    /// Control never reaches the end of this block (after `exit`), or the
    /// terminator was not set
    Unreachable,
}

impl Terminator {
    /// Get all successor blocks
    pub fn successors(&self) -> Vec<BasicBlockId> {
        match self {
            Terminator::Jump(target) => vec![*target],
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) | Terminator::Unreachable => vec![],
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Jump(target) => write!(f, "br label %{}", target),
            Terminator::Branch {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br {}, label %{}, label %{}",
                cond.typed(),
                then_block,
                else_block
            ),
            Terminator::Return(value) => write!(f, "ret {}", value.typed()),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}
