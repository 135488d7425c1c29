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
use crate::source::{BitInsn, BitOp, SourceInsn};

/// Both integer widths map to the same target operation.
pub(super) fn convert(
    b: &BitInsn,
    insn: &SourceInsn,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    if !b.kind.is_integral() {
        return Err(ctx.unsupported(insn));
    }
    let opcode = match b.op {
        BitOp::Shl => OpCode::SHL,
        BitOp::Shr => OpCode::SHR,
        BitOp::And => OpCode::AND,
        BitOp::Or => OpCode::OR,
        BitOp::Xor => OpCode::XOR,
        // No unsigned shift on the target.
        BitOp::UShr => return Err(ctx.unsupported(insn)),
    };
    ctx.emit_op(opcode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::*;
    use crate::compiler::CompileError;
    use crate::opcode::OpCode;
    use crate::source::{BitInsn, BitOp, NumKind, SourceInsn};

    fn bit(op: BitOp, kind: NumKind) -> SourceInsn {
        SourceInsn::Bit(BitInsn { op, kind })
    }

    #[test]
    fn test_shift_and_logic() {
        let program = program(vec![method(
            "()V",
            0,
            vec![
                bit(BitOp::Shl, NumKind::Int),
                bit(BitOp::Shr, NumKind::Long),
                bit(BitOp::And, NumKind::Int),
                bit(BitOp::Or, NumKind::Long),
                bit(BitOp::Xor, NumKind::Int),
            ],
        )]);
        let m = convert_first(&program).unwrap();
        assert_eq!(
            opcodes(&m),
            vec![OpCode::SHL, OpCode::SHR, OpCode::AND, OpCode::OR, OpCode::XOR]
        );
    }

    #[test]
    fn test_unsigned_shift_is_rejected() {
        let program = program(vec![method(
            "()V",
            0,
            vec![SourceInsn::Line(21), bit(BitOp::UShr, NumKind::Int)],
        )]);
        match convert_first(&program) {
            Err(CompileError::UnsupportedInstruction { line, instruction, .. }) => {
                assert_eq!(line, Some(21));
                assert!(instruction.contains("UShr"));
            }
            other => panic!("Expected UnsupportedInstruction, got {:?}", other),
        }
    }
}
