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

//! Simple value objects live on the target as structs, one item per field.

use super::ConversionContext;
use crate::compiler::CompileError;
use crate::instruction::Instruction;
use crate::opcode::OpCode;
use crate::source::{ObjectInsn, SourceInsn};

pub(super) fn convert(
    o: &ObjectInsn,
    insn: &SourceInsn,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    match o {
        ObjectInsn::New { fields, .. } => {
            ctx.emit(Instruction::push_int(*fields as i64));
            ctx.emit_op(OpCode::NEWSTRUCT);
        }
        ObjectInsn::GetField { index, .. } => {
            ctx.emit(Instruction::push_int(*index as i64));
            ctx.emit_op(OpCode::PICKITEM);
        }
        ObjectInsn::PutField { index, .. } => {
            // SETITEM wants the value on top, above the index.
            ctx.emit(Instruction::push_int(*index as i64));
            ctx.emit_op(OpCode::SWAP);
            ctx.emit_op(OpCode::SETITEM);
        }
        ObjectInsn::CheckCast(_) => {}
        ObjectInsn::GetStatic { .. } | ObjectInsn::PutStatic { .. } | ObjectInsn::InstanceOf(_) => {
            return Err(ctx.unsupported(insn))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::*;
    use crate::compiler::CompileError;
    use crate::opcode::OpCode;
    use crate::source::{ObjectInsn, SourceInsn};

    fn object(o: ObjectInsn) -> SourceInsn {
        SourceInsn::Object(o)
    }

    #[test]
    fn test_field_access() {
        let program = program(vec![method(
            "()V",
            0,
            vec![
                object(ObjectInsn::New {
                    owner: "Point".to_string(),
                    fields: 2,
                }),
                object(ObjectInsn::CheckCast("Point".to_string())),
                object(ObjectInsn::GetField {
                    owner: "Point".to_string(),
                    name: "y".to_string(),
                    index: 1,
                }),
                object(ObjectInsn::PutField {
                    owner: "Point".to_string(),
                    name: "x".to_string(),
                    index: 0,
                }),
            ],
        )]);
        let m = convert_first(&program).unwrap();
        assert_eq!(
            opcodes(&m),
            vec![
                OpCode::PUSH2,
                OpCode::NEWSTRUCT,
                OpCode::PUSH1,
                OpCode::PICKITEM,
                OpCode::PUSH0,
                OpCode::SWAP,
                OpCode::SETITEM
            ]
        );
    }

    #[test]
    fn test_static_fields_are_unsupported() {
        let program = program(vec![method(
            "()V",
            0,
            vec![object(ObjectInsn::GetStatic {
                owner: "C".to_string(),
                name: "OWNER".to_string(),
            })],
        )]);
        assert!(matches!(
            convert_first(&program),
            Err(CompileError::UnsupportedInstruction { .. })
        ));
    }
}
