//! Runtime support
//!
//! External C functions the emitted module links against, the constant
//! format strings they use, and the bodies of the built-in methods of
//! Object, IO and String.

use crate::error::CodegenResult;
use crate::ir::{
    BasicBlockId, BinaryOp, CastOp, CmpPred, Constant, Declaration, Global, IrModule, IrType,
    Terminator, Value,
};
use crate::lower::layout::{VTABLE_NAME, VTABLE_SIZE};
use crate::lower::FunctionLowerer;
use coolc_types::{BuiltinMethod, ClassId};

/// Functions resolved at link time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Printf,
    Scanf,
    GcMalloc,
    Strcmp,
    Strlen,
    Memcpy,
    Exit,
}

impl Runtime {
    /// Declaration order at the end of the module
    pub const ALL: [Runtime; 7] = [
        Runtime::Printf,
        Runtime::Scanf,
        Runtime::GcMalloc,
        Runtime::Strcmp,
        Runtime::Strlen,
        Runtime::Memcpy,
        Runtime::Exit,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Runtime::Printf => "printf",
            Runtime::Scanf => "scanf",
            Runtime::GcMalloc => "GC_malloc",
            Runtime::Strcmp => "strcmp",
            Runtime::Strlen => "strlen",
            Runtime::Memcpy => "memcpy",
            Runtime::Exit => "exit",
        }
    }

    pub fn declaration(&self) -> Declaration {
        let bytes = IrType::byte_ptr;
        let (ret, params, variadic) = match self {
            Runtime::Printf | Runtime::Scanf => (IrType::I32, vec![bytes()], true),
            Runtime::GcMalloc => (bytes(), vec![IrType::I64], false),
            Runtime::Strcmp => (IrType::I32, vec![bytes(), bytes()], false),
            Runtime::Strlen => (IrType::I64, vec![bytes()], false),
            Runtime::Memcpy => (bytes(), vec![bytes(), bytes(), IrType::I64], false),
            Runtime::Exit => (IrType::Void, vec![IrType::I32], false),
        };
        Declaration {
            name: self.symbol().to_string(),
            ret,
            params,
            variadic,
        }
    }

    pub fn callee(&self) -> Value {
        self.declaration().callee()
    }
}

/// A NUL-terminated constant string in the module header
#[derive(Debug, Clone, Copy)]
pub struct FormatString {
    pub symbol: &'static str,
    pub text: &'static [u8],
}

impl FormatString {
    pub fn global(&self) -> Global {
        Global::cstring(self.symbol, self.text)
    }

    pub fn ptr(&self) -> Value {
        self.global().first_byte()
    }
}

pub const FORMAT_STRING: FormatString = FormatString {
    symbol: "str.format",
    text: b"%s",
};

pub const FORMAT_INT: FormatString = FormatString {
    symbol: "str.format2",
    text: b"%d",
};

pub const FORMAT_ABORT: FormatString = FormatString {
    symbol: "str.abort",
    text: b"Abort called from class %s\n",
};

/// Fails without consuming anything when the line is empty, so the
/// newline is dropped separately by `FORMAT_SKIP_LINE` and `FORMAT_SKIP_CHAR`.
pub const FORMAT_READ_LINE: FormatString = FormatString {
    symbol: "str.readline",
    text: b"%1023[^\n]",
};

/// Rest of the current line, excluding the newline
pub const FORMAT_SKIP_LINE: FormatString = FormatString {
    symbol: "str.skipline",
    text: b"%*[^\n]",
};

pub const FORMAT_SKIP_CHAR: FormatString = FormatString {
    symbol: "str.skipchar",
    text: b"%*c",
};

pub const FORMAT_SUBSTR_RANGE: FormatString = FormatString {
    symbol: "str.substr_range",
    text: b"Substring out of range\n",
};

/// Buffer handed to `in_string`, including the terminating NUL
pub const INPUT_BUFFER_SIZE: i64 = 1024;

const EMPTY_CHAR: &str = "emptychar";

/// Character buffer shared by every empty String
pub fn empty_buffer() -> Value {
    Value::global(EMPTY_CHAR, IrType::byte_ptr())
}

/// Add the format strings and the empty-string buffer to `module`.
pub fn emit_constants(module: &mut IrModule) {
    for format in [
        FORMAT_STRING,
        FORMAT_INT,
        FORMAT_ABORT,
        FORMAT_READ_LINE,
        FORMAT_SKIP_LINE,
        FORMAT_SKIP_CHAR,
        FORMAT_SUBSTR_RANGE,
    ] {
        module.constants.push(format.global());
    }
    module.globals.push(Global {
        name: EMPTY_CHAR.to_string(),
        private_constant: false,
        ty: IrType::I8,
        init: Constant::Scalar(Value::new("0", IrType::I8)),
    });
}

/// Emit the body of a built-in method.
///
/// The receiver is already typed as the method's owner.
pub(crate) fn lower_builtin(f: &mut FunctionLowerer<'_, '_>, builtin: BuiltinMethod) -> CodegenResult<()> {
    match builtin {
        BuiltinMethod::Abort => abort(f),
        BuiltinMethod::TypeName => type_name(f),
        BuiltinMethod::Copy => copy(f),
        BuiltinMethod::OutString => out_string(f),
        BuiltinMethod::OutInt => out_int(f),
        BuiltinMethod::InString => in_string(f),
        BuiltinMethod::InInt => in_int(f),
        BuiltinMethod::Length => length(f),
        BuiltinMethod::Concat => concat(f),
        BuiltinMethod::Substr => substr(f),
    }
}

/// Class name stored in the receiver's runtime vtable
fn class_name(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<Value> {
    let receiver = f.receiver();
    let vtable = f.load_vtable(receiver, ClassId::OBJECT)?;
    let slot = f.field_addr(vtable, VTABLE_NAME, IrType::byte_ptr());
    f.load(slot)
}

/// Length of a NUL-terminated buffer as `i32`
fn buffer_len(f: &mut FunctionLowerer<'_, '_>, buf: Value) -> Value {
    let len = f.call_runtime(Runtime::Strlen, vec![buf]);
    f.cast(CastOp::Trunc, len, IrType::I32)
}

fn return_receiver_as_object(f: &mut FunctionLowerer<'_, '_>) {
    let receiver = f.receiver();
    let result = f.coerce(receiver, ClassId::OBJECT);
    f.terminate(Terminator::Return(result));
}

fn abort(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let name = class_name(f)?;
    f.call_runtime(Runtime::Printf, vec![FORMAT_ABORT.ptr(), name]);
    f.emit_exit_failure();
    Ok(())
}

fn type_name(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let name = class_name(f)?;
    let len = buffer_len(f, name.clone());
    let result = f.box_string(len, name);
    f.terminate(Terminator::Return(result));
    Ok(())
}

/// Shallow copy: same vtable, same attribute pointers, same payload.
fn copy(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let receiver = f.receiver();
    let vtable = f.load_vtable(receiver.clone(), ClassId::OBJECT)?;
    let size_slot = f.field_addr(vtable, VTABLE_SIZE, IrType::I64);
    let size = f.load(size_slot)?;
    let copy = f.call_runtime(Runtime::GcMalloc, vec![size.clone()]);
    let source = f.bitcast(receiver, IrType::byte_ptr());
    f.call_runtime(Runtime::Memcpy, vec![copy.clone(), source, size]);
    let result = f.bitcast(copy, f.instance_ptr(ClassId::OBJECT));
    f.terminate(Terminator::Return(result));
    Ok(())
}

fn out_string(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let arg = f.param(1)?;
    let (_, buf) = f.unbox_string(arg)?;
    f.call_runtime(Runtime::Printf, vec![FORMAT_STRING.ptr(), buf]);
    return_receiver_as_object(f);
    Ok(())
}

fn out_int(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let arg = f.param(1)?;
    let value = f.unbox_int(arg)?;
    f.call_runtime(Runtime::Printf, vec![FORMAT_INT.ptr(), value]);
    return_receiver_as_object(f);
    Ok(())
}

/// Discard the rest of the input line, newline included. Each step is its
/// own `scanf` call so an empty remainder does not stop the newline read.
fn skip_line(f: &mut FunctionLowerer<'_, '_>) {
    f.call_runtime(Runtime::Scanf, vec![FORMAT_SKIP_LINE.ptr()]);
    f.call_runtime(Runtime::Scanf, vec![FORMAT_SKIP_CHAR.ptr()]);
}

/// Read one line without its newline; bytes past the buffer are dropped.
fn in_string(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let buf = f.call_runtime(Runtime::GcMalloc, vec![Value::i64(INPUT_BUFFER_SIZE)]);
    f.call_runtime(Runtime::Scanf, vec![FORMAT_READ_LINE.ptr(), buf.clone()]);
    skip_line(f);
    let len = buffer_len(f, buf.clone());
    let result = f.box_string(len, buf);
    f.terminate(Terminator::Return(result));
    Ok(())
}

fn in_int(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let slot = f.alloca(IrType::I32);
    f.store(Value::i32(0), slot.clone());
    f.call_runtime(Runtime::Scanf, vec![FORMAT_INT.ptr(), slot.clone()]);
    skip_line(f);
    let value = f.load(slot)?;
    let result = f.box_int(value);
    f.terminate(Terminator::Return(result));
    Ok(())
}

fn length(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let receiver = f.receiver();
    let (len, _) = f.unbox_string(receiver)?;
    let result = f.box_int(len);
    f.terminate(Terminator::Return(result));
    Ok(())
}

/// Fresh buffer holding both strings; GC memory is zeroed, so the
/// terminating NUL is already in place.
fn concat(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let receiver = f.receiver();
    let (len, buf) = f.unbox_string(receiver)?;
    let arg = f.param(1)?;
    let (other_len, other_buf) = f.unbox_string(arg)?;

    let total = f.binary(BinaryOp::Add, len.clone(), other_len.clone());
    let with_nul = f.binary(BinaryOp::Add, total.clone(), Value::i32(1));
    let size = f.cast(CastOp::SExt, with_nul, IrType::I64);
    let result_buf = f.call_runtime(Runtime::GcMalloc, vec![size]);

    let first = f.cast(CastOp::SExt, len.clone(), IrType::I64);
    f.call_runtime(Runtime::Memcpy, vec![result_buf.clone(), buf, first]);
    let tail = f.byte_offset(result_buf.clone(), len);
    let second = f.cast(CastOp::SExt, other_len, IrType::I64);
    f.call_runtime(Runtime::Memcpy, vec![tail, other_buf, second]);

    let result = f.box_string(total, result_buf);
    f.terminate(Terminator::Return(result));
    Ok(())
}

/// `substr(i, l)`: exits with status 1 unless `0 <= i`, `0 <= l` and
/// `i + l <= length`.
fn substr(f: &mut FunctionLowerer<'_, '_>) -> CodegenResult<()> {
    let receiver = f.receiver();
    let (len, buf) = f.unbox_string(receiver)?;
    let start_arg = f.param(1)?;
    let start = f.unbox_int(start_arg)?;
    let count_arg = f.param(2)?;
    let count = f.unbox_int(count_arg)?;

    let negative_start = f.compare(CmpPred::Slt, start.clone(), Value::i32(0));
    let negative_count = f.compare(CmpPred::Slt, count.clone(), Value::i32(0));
    let end = f.binary(BinaryOp::Add, start.clone(), count.clone());
    let past_end = f.compare(CmpPred::Sgt, end, len);
    let negative = f.binary(BinaryOp::Or, negative_start, negative_count);
    let invalid = f.binary(BinaryOp::Or, negative, past_end);

    let label = f.alloc_label();
    let error_block = BasicBlockId::new("substr.error", label);
    let ok_block = BasicBlockId::new("substr.ok", label);
    f.terminate(Terminator::Branch {
        cond: invalid,
        then_block: error_block,
        else_block: ok_block,
    });

    f.switch_to(error_block);
    f.call_runtime(Runtime::Printf, vec![FORMAT_SUBSTR_RANGE.ptr()]);
    f.emit_exit_failure();

    f.switch_to(ok_block);
    let with_nul = f.binary(BinaryOp::Add, count.clone(), Value::i32(1));
    let size = f.cast(CastOp::SExt, with_nul, IrType::I64);
    let result_buf = f.call_runtime(Runtime::GcMalloc, vec![size]);
    let source = f.byte_offset(buf, start);
    let bytes = f.cast(CastOp::SExt, count.clone(), IrType::I64);
    f.call_runtime(Runtime::Memcpy, vec![result_buf.clone(), source, bytes]);

    let result = f.box_string(count, result_buf);
    f.terminate(Terminator::Return(result));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations() {
        let decls: Vec<String> = Runtime::ALL
            .iter()
            .map(|r| r.declaration().to_string())
            .collect();
        assert!(decls.contains(&"declare i32 @printf(i8*, ...)".to_string()));
        assert!(decls.contains(&"declare i8* @GC_malloc(i64)".to_string()));
        assert!(decls.contains(&"declare void @exit(i32)".to_string()));
        assert!(decls.contains(&"declare i32 @strcmp(i8*, i8*)".to_string()));
    }

    #[test]
    fn test_constants() {
        let mut module = IrModule::new("test");
        emit_constants(&mut module);
        let abort = module.get_global("str.abort").unwrap();
        assert_eq!(abort.ty, IrType::Array(28, Box::new(IrType::I8)));
        assert!(module.get_global("emptychar").is_some());
        assert!(module.get_global("str.format").is_some());
        assert!(module.get_global("str.format2").is_some());

        let read_line = module.get_global("str.readline").unwrap();
        assert_eq!(read_line.ty, IrType::Array(10, Box::new(IrType::I8)));
        let skip_line = module.get_global("str.skipline").unwrap();
        assert_eq!(skip_line.ty, IrType::Array(7, Box::new(IrType::I8)));
        let skip_char = module.get_global("str.skipchar").unwrap();
        assert_eq!(skip_char.ty, IrType::Array(4, Box::new(IrType::I8)));
    }
}
