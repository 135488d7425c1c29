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
use crate::instruction::Instruction;
use crate::opcode::OpCode;
use crate::source::{ConstInsn, Constant, SourceInsn};

pub(super) fn convert(
    c: &ConstInsn,
    insn: &SourceInsn,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    let out = match c {
        ConstInsn::Null => Instruction::new(OpCode::PUSHNULL),
        ConstInsn::IConst(v) | ConstInsn::BiPush(v) => Instruction::push_int(*v as i64),
        ConstInsn::SiPush(v) => Instruction::push_int(*v as i64),
        ConstInsn::LConst(v) => Instruction::push_int(*v),
        ConstInsn::FConst(_) => return Err(ctx.unsupported(insn)),
        ConstInsn::Ldc(constant) => match constant {
            Constant::Int(v) => Instruction::push_int(*v as i64),
            Constant::Long(v) => Instruction::push_int(*v),
            Constant::String(s) => Instruction::push_data(s.as_bytes())?,
            Constant::BigInt(bytes) => Instruction::push_big_int(bytes)?,
            Constant::Float(_) | Constant::Double(_) | Constant::Class(_) => {
                return Err(ctx.unsupported(insn))
            }
        },
    };
    ctx.emit(out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::*;
    use crate::compiler::CompileError;
    use crate::opcode::OpCode;
    use crate::source::{ConstInsn, Constant, ControlInsn, SourceInsn};

    #[test]
    fn test_constants() {
        let program = program(vec![method(
            "()V",
            0,
            vec![
                SourceInsn::Const(ConstInsn::Null),
                SourceInsn::Const(ConstInsn::IConst(-1)),
                SourceInsn::Const(ConstInsn::SiPush(1000)),
                SourceInsn::Const(ConstInsn::Ldc(Constant::String("hi".to_string()))),
                SourceInsn::Const(ConstInsn::Ldc(Constant::Long(1 << 40))),
                SourceInsn::Control(ControlInsn::Return),
            ],
        )]);
        let m = convert_first(&program).unwrap();
        assert_eq!(
            opcodes(&m),
            vec![
                OpCode::PUSHNULL,
                OpCode::PUSHM1,
                OpCode::PUSHINT16,
                OpCode::PUSHDATA1,
                OpCode::PUSHINT64,
                OpCode::RET
            ]
        );
        assert_eq!(m.instructions()[3].operand(), &[2, b'h', b'i']);
    }

    #[test]
    fn test_float_constant_is_unsupported() {
        let program = program(vec![method(
            "()V",
            0,
            vec![SourceInsn::Line(4), SourceInsn::Const(ConstInsn::FConst(1.0))],
        )]);
        match convert_first(&program) {
            Err(CompileError::UnsupportedInstruction { line: Some(4), .. }) => {}
            other => panic!("Expected UnsupportedInstruction, got {:?}", other),
        }
    }
}
