//! IR Instructions
//!
//! Non-terminator instructions. Every instruction that defines a value
//! carries its destination as a typed [`Value`], so printing never needs a
//! separate type environment.

use super::block::BasicBlockId;
use super::types::IrType;
use super::value::Value;
use std::fmt;

/// Integer binary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    Or,
}

impl BinaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::Or => "or",
        }
    }
}

/// Integer / pointer comparison predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpPred {
    Eq,
    Slt,
    Sle,
    Sgt,
}

impl CmpPred {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CmpPred::Eq => "eq",
            CmpPred::Slt => "slt",
            CmpPred::Sle => "sle",
            CmpPred::Sgt => "sgt",
        }
    }
}

/// Conversion instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    Bitcast,
    PtrToInt,
    Trunc,
    SExt,
}

impl CastOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            CastOp::Bitcast => "bitcast",
            CastOp::PtrToInt => "ptrtoint",
            CastOp::Trunc => "trunc",
            CastOp::SExt => "sext",
        }
    }
}

/// IR instruction
#[derive(Debug, Clone)]
pub enum IrInstr {
    /// Stack slot: `dest = alloca ty`, `dest` has type `ty*`
    Alloca { dest: Value, ty: IrType },

    /// `dest = load T, T* ptr`
    Load { dest: Value, ptr: Value },

    /// `store T value, T* ptr`
    Store { value: Value, ptr: Value },

    /// Address computation relative to `base`
    GetElementPtr {
        dest: Value,
        base: Value,
        indices: Vec<Value>,
        inbounds: bool,
    },

    /// Type conversion to `dest.ty`
    Cast { dest: Value, op: CastOp, value: Value },

    Binary {
        dest: Value,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },

    /// `dest = icmp pred T lhs, rhs`, `dest` is `i1`
    Cmp {
        dest: Value,
        pred: CmpPred,
        lhs: Value,
        rhs: Value,
    },

    /// Call through a function or function pointer.
    ///
    /// `dest` is absent for calls returning void.
    Call {
        dest: Option<Value>,
        callee: Value,
        args: Vec<Value>,
    },

    /// SSA merge of values flowing in from predecessor blocks
    Phi {
        dest: Value,
        incoming: Vec<(Value, BasicBlockId)>,
    },
}

impl IrInstr {
    /// Value defined by this instruction, if any
    pub fn dest(&self) -> Option<&Value> {
        match self {
            IrInstr::Alloca { dest, .. }
            | IrInstr::Load { dest, .. }
            | IrInstr::GetElementPtr { dest, .. }
            | IrInstr::Cast { dest, .. }
            | IrInstr::Binary { dest, .. }
            | IrInstr::Cmp { dest, .. }
            | IrInstr::Phi { dest, .. } => Some(dest),
            IrInstr::Call { dest, .. } => dest.as_ref(),
            IrInstr::Store { .. } => None,
        }
    }
}

impl fmt::Display for IrInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrInstr::Alloca { dest, ty } => write!(f, "{} = alloca {}", dest, ty),
            IrInstr::Load { dest, ptr } => {
                write!(f, "{} = load {}, {}", dest, dest.ty, ptr.typed())
            }
            IrInstr::Store { value, ptr } => {
                write!(f, "store {}, {}", value.typed(), ptr.typed())
            }
            IrInstr::GetElementPtr {
                dest,
                base,
                indices,
                inbounds,
            } => {
                let elem = base.ty.pointee().unwrap_or(&base.ty);
                write!(f, "{} = getelementptr ", dest)?;
                if *inbounds {
                    write!(f, "inbounds ")?;
                }
                write!(f, "{}, {}", elem, base.typed())?;
                for index in indices {
                    write!(f, ", {}", index.typed())?;
                }
                Ok(())
            }
            IrInstr::Cast { dest, op, value } => write!(
                f,
                "{} = {} {} to {}",
                dest,
                op.mnemonic(),
                value.typed(),
                dest.ty
            ),
            IrInstr::Binary { dest, op, lhs, rhs } => {
                write!(f, "{} = {} {}, {}", dest, op.mnemonic(), lhs.typed(), rhs)
            }
            IrInstr::Cmp {
                dest,
                pred,
                lhs,
                rhs,
            } => write!(
                f,
                "{} = icmp {} {}, {}",
                dest,
                pred.mnemonic(),
                lhs.typed(),
                rhs
            ),
            IrInstr::Call { dest, callee, args } => {
                if let Some(dest) = dest {
                    write!(f, "{} = ", dest)?;
                }
                // Variadic callees need the full function type at the call site.
                if callee.ty.is_variadic_function() {
                    let fn_ty = callee.ty.pointee().unwrap_or(&callee.ty);
                    write!(f, "call {} {}(", fn_ty, callee)?;
                } else {
                    let ret = callee.ty.return_type().unwrap_or(&IrType::Void);
                    write!(f, "call {} {}(", ret, callee)?;
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.typed())?;
                }
                write!(f, ")")
            }
            IrInstr::Phi { dest, incoming } => {
                write!(f, "{} = phi {} ", dest, dest.ty)?;
                for (i, (value, block)) in incoming.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[ {}, %{} ]", value, block)?;
                }
                Ok(())
            }
        }
    }
}
