//! Textual output of IR
//!
//! `Display` for modules and their parts. The module's output is the IR
//! text handed to the assembler.

use super::block::BasicBlock;
use super::function::IrFunction;
use super::module::{Constant, Declaration, Global, IrModule, TypeDef};
use std::fmt::{self, Write};

/// Escape bytes for a `c"..."` literal
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        if (byte.is_ascii_graphic() && byte != b'"' && byte != b'\\') || byte == b' ' {
            out.push(byte as char);
        } else {
            // Writing to a String cannot fail.
            let _ = write!(out, "\\{:02X}", byte);
        }
    }
    out
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::CString(bytes) => write!(f, "c\"{}\"", escape_bytes(bytes)),
            Constant::Struct(fields) => {
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field.typed())?;
                }
                write!(f, " }}")
            }
            Constant::Scalar(value) => write!(f, "{}", value),
        }
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let linkage = if self.private_constant {
            "private unnamed_addr constant"
        } else {
            "global"
        };
        write!(f, "@{} = {} {} {}", self.name, linkage, self.ty, self.init)
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{} = type {{ ", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", field)?;
        }
        write!(f, " }}")
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "declare {} @{}(", self.ret, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        if self.variadic {
            write!(f, ", ...")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.id)?;
        for instr in &self.instructions {
            writeln!(f, "  {}", instr)?;
        }
        writeln!(f, "  {}", self.terminator)
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.ret, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.typed())?;
        }
        writeln!(f, ") {{")?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;

        writeln!(f)?;
        for constant in &self.constants {
            writeln!(f, "{}", constant)?;
        }

        writeln!(f)?;
        for def in &self.types {
            writeln!(f, "{}", def)?;
        }

        writeln!(f)?;
        for global in &self.globals {
            writeln!(f, "{}", global)?;
        }

        for func in &self.functions {
            writeln!(f)?;
            write!(f, "{}", func)?;
        }

        writeln!(f)?;
        for decl in &self.declarations {
            writeln!(f, "{}", decl)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BasicBlockId, IrType, Terminator, Value};

    #[test]
    fn test_escape_bytes() {
        assert_eq!(escape_bytes(b"hi there\n\0"), "hi there\\0A\\00");
        assert_eq!(escape_bytes(b"say \"x\""), "say \\22x\\22");
        assert_eq!(escape_bytes(b"a\\b"), "a\\5Cb");
    }

    #[test]
    fn test_cstring_global() {
        let global = Global::cstring("str.format", b"%s");
        assert_eq!(
            global.to_string(),
            "@str.format = private unnamed_addr constant [3 x i8] c\"%s\\00\""
        );
        assert_eq!(
            global.first_byte().repr,
            "getelementptr inbounds ([3 x i8], [3 x i8]* @str.format, i32 0, i32 0)"
        );
    }

    #[test]
    fn test_function_display() {
        let mut func = IrFunction::new("main", vec![], IrType::I32);
        let mut entry = BasicBlock::new(BasicBlockId::ENTRY);
        entry.set_terminator(Terminator::Return(Value::i32(0)));
        func.add_block(entry);
        assert_eq!(
            func.to_string(),
            "define i32 @main() {\nentry:\n  ret i32 0\n}\n"
        );
    }

    #[test]
    fn test_declaration_display() {
        let decl = Declaration {
            name: "printf".to_string(),
            ret: IrType::I32,
            params: vec![IrType::byte_ptr()],
            variadic: true,
        };
        assert_eq!(decl.to_string(), "declare i32 @printf(i8*, ...)");
    }
}
