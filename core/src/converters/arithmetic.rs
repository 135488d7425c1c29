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

use super::ConversionContext;
use crate::compiler::CompileError;
use crate::opcode::OpCode;
use crate::source::{ArithInsn, ArithOp, ConvertInsn, ElemKind, SourceInsn};

pub(super) fn convert(
    a: &ArithInsn,
    insn: &SourceInsn,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    let opcode = match *a {
        ArithInsn::Binary { kind, .. } | ArithInsn::Neg(kind) if !kind.is_integral() => {
            return Err(ctx.unsupported(insn));
        }
        ArithInsn::Binary { op, .. } => match op {
            ArithOp::Add => OpCode::ADD,
            ArithOp::Sub => OpCode::SUB,
            ArithOp::Mul => OpCode::MUL,
            ArithOp::Div => OpCode::DIV,
            ArithOp::Rem => OpCode::MOD,
        },
        ArithInsn::Neg(_) => OpCode::NEGATE,
    };
    ctx.emit_op(opcode);
    Ok(())
}

/// Integers share one representation on the target, so integral
/// conversions emit nothing.
pub(super) fn convert_numeric(
    c: &ConvertInsn,
    insn: &SourceInsn,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    match *c {
        ConvertInsn::Widen { from, to } if from.is_integral() && to.is_integral() => Ok(()),
        ConvertInsn::Truncate(ElemKind::Byte | ElemKind::Char | ElemKind::Short) => Ok(()),
        _ => Err(ctx.unsupported(insn)),
    }
}
