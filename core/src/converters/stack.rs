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
use crate::source::{SourceInsn, StackInsn};

pub(super) fn convert(
    s: StackInsn,
    insn: &SourceInsn,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    let opcode = match s {
        StackInsn::Dup => OpCode::DUP,
        StackInsn::DupX1 => OpCode::TUCK,
        StackInsn::Pop => OpCode::DROP,
        StackInsn::Swap => OpCode::SWAP,
        // Two-slot forms depend on value widths the target does not have.
        StackInsn::DupX2 | StackInsn::Dup2 | StackInsn::Pop2 => return Err(ctx.unsupported(insn)),
    };
    ctx.emit_op(opcode);
    Ok(())
}
