/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * This file is part of the Ark Sovereign Compiler.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 *
 * 1. OPEN SOURCE: You may use this file under the terms of the GNU Affero
 * General Public License v3.0. If you link to this code, your ENTIRE
 * application must be open-sourced under AGPLv3.
 *
 * 2. COMMERCIAL: For proprietary use, you must obtain a Commercial License
 * from Sovereign Systems.
 *
 * PATENT NOTICE: Protected by US Patent App #63/935,467.
 * NO IMPLIED LICENSE to rights of Mohamad Al-Zawahreh or Sovereign Systems.
 */

use super::{skip_lines, ConversionContext};
use crate::compiler::CompileError;
use crate::instruction::Instruction;
use crate::opcode::OpCode;
use crate::source::{BranchInsn, Cond, SourceInsn};

fn two_operand_jump(cond: Cond) -> OpCode {
    match cond {
        Cond::Eq => OpCode::JMPEQ_L,
        Cond::Ne => OpCode::JMPNE_L,
        Cond::Lt => OpCode::JMPLT_L,
        Cond::Ge => OpCode::JMPGE_L,
        Cond::Gt => OpCode::JMPGT_L,
        Cond::Le => OpCode::JMPLE_L,
    }
}

pub(super) fn convert(
    b: &BranchInsn,
    insns: &[SourceInsn],
    pos: usize,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<usize, CompileError> {
    match *b {
        BranchInsn::IfZero { cond, target } => match cond {
            Cond::Eq => ctx.emit(Instruction::jump(OpCode::JMPIFNOT_L, target)),
            Cond::Ne => ctx.emit(Instruction::jump(OpCode::JMPIF_L, target)),
            _ => {
                ctx.emit_op(OpCode::PUSH0);
                ctx.emit(Instruction::jump(two_operand_jump(cond), target));
            }
        },
        BranchInsn::IfCmp { cond, target } => {
            ctx.emit(Instruction::jump(two_operand_jump(cond), target));
        }
        BranchInsn::IfRefEq { equal, target } => {
            ctx.emit_op(if equal { OpCode::EQUAL } else { OpCode::NOTEQUAL });
            ctx.emit(Instruction::jump(OpCode::JMPIF_L, target));
        }
        BranchInsn::IfNull { is_null, target } => {
            ctx.emit_op(OpCode::ISNULL);
            let opcode = if is_null { OpCode::JMPIF_L } else { OpCode::JMPIFNOT_L };
            ctx.emit(Instruction::jump(opcode, target));
        }
        BranchInsn::Goto(target) => ctx.emit(Instruction::jump(OpCode::JMP_L, target)),
        BranchInsn::LongCmp => {
            // lcmp pushes -1/0/1 which the next branch compares with zero.
            // Comparing the two longs directly gives the same result.
            let next = skip_lines(insns, pos + 1);
            return match insns.get(next) {
                Some(SourceInsn::Branch(BranchInsn::IfZero { cond, target })) => {
                    ctx.emit(Instruction::jump(two_operand_jump(*cond), *target));
                    Ok(next)
                }
                _ => Err(ctx.unsupported(&insns[pos])),
            };
        }
        BranchInsn::FloatCmp | BranchInsn::Switch => return Err(ctx.unsupported(&insns[pos])),
    }
    Ok(pos)
}
