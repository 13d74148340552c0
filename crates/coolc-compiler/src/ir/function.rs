//! IR Functions
//!
//! Functions in the IR contain typed parameters and basic blocks.

use super::block::{BasicBlock, BasicBlockId};
use super::types::IrType;
use super::value::Value;

/// An IR function definition
#[derive(Debug, Clone)]
pub struct IrFunction {
    /// Symbol name, without the `@`
    pub name: String,
    /// Parameters (with types)
    pub params: Vec<Value>,
    /// Return type
    pub ret: IrType,
    /// Basic blocks (in order); the first is the entry block
    pub blocks: Vec<BasicBlock>,
}

impl IrFunction {
    /// Create a new function
    pub fn new(name: impl Into<String>, params: Vec<Value>, ret: IrType) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            blocks: Vec::new(),
        }
    }

    /// Add a basic block and return its position
    pub fn add_block(&mut self, block: BasicBlock) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    /// Get a block by ID
    pub fn get_block(&self, id: BasicBlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Type of this function, as stored in vtable slots
    pub fn signature(&self) -> IrType {
        IrType::Function {
            ret: Box::new(self.ret.clone()),
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
            variadic: false,
        }
    }

    /// Validate the function structure
    pub fn validate(&self) -> Result<(), String> {
        if self.blocks.is_empty() {
            return Err(format!("Function {} has no blocks", self.name));
        }
        for (index, block) in self.blocks.iter().enumerate() {
            if self.blocks[..index].iter().any(|b| b.id == block.id) {
                return Err(format!("Block {} appears twice in {}", block.id, self.name));
            }
            for succ in block.successors() {
                if self.get_block(succ).is_none() {
                    return Err(format!(
                        "Block {} in {} jumps to missing block {}",
                        block.id, self.name, succ
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Terminator;

    #[test]
    fn test_validate_catches_dangling_jump() {
        let mut func = IrFunction::new("f", vec![], IrType::I32);
        assert!(func.validate().is_err());

        let mut entry = BasicBlock::new(BasicBlockId::ENTRY);
        entry.set_terminator(Terminator::Jump(BasicBlockId::new("if.end", 3)));
        func.add_block(entry);
        assert!(func.validate().is_err());

        let mut end = BasicBlock::new(BasicBlockId::new("if.end", 3));
        end.set_terminator(Terminator::Return(crate::ir::Value::i32(0)));
        func.add_block(end);
        assert!(func.validate().is_ok());
    }
}
