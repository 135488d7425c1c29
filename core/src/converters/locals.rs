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
use crate::source::{LocalInsn, SourceInsn, ValueKind};

use OpCode::*;

const LDARG_SHORT: [OpCode; 7] = [LDARG0, LDARG1, LDARG2, LDARG3, LDARG4, LDARG5, LDARG6];
const STARG_SHORT: [OpCode; 7] = [STARG0, STARG1, STARG2, STARG3, STARG4, STARG5, STARG6];
const LDLOC_SHORT: [OpCode; 7] = [LDLOC0, LDLOC1, LDLOC2, LDLOC3, LDLOC4, LDLOC5, LDLOC6];
const STLOC_SHORT: [OpCode; 7] = [STLOC0, STLOC1, STLOC2, STLOC3, STLOC4, STLOC5, STLOC6];

#[derive(Clone, Copy)]
enum Access {
    Load,
    Store,
}

pub(super) fn convert(
    l: &LocalInsn,
    insn: &SourceInsn,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    match *l {
        LocalInsn::Load { kind, index } => {
            check_kind(kind, insn, ctx)?;
            let out = slot_instruction(ctx, index, Access::Load)?;
            ctx.emit(out);
        }
        LocalInsn::Store { kind, index } => {
            check_kind(kind, insn, ctx)?;
            let out = slot_instruction(ctx, index, Access::Store)?;
            ctx.emit(out);
        }
        LocalInsn::Inc { index, delta } => {
            let load = slot_instruction(ctx, index, Access::Load)?;
            let store = slot_instruction(ctx, index, Access::Store)?;
            ctx.emit(load);
            match delta {
                1 => ctx.emit_op(INC),
                -1 => ctx.emit_op(DEC),
                d => {
                    ctx.emit(Instruction::push_int(d as i64));
                    ctx.emit_op(ADD);
                }
            }
            ctx.emit(store);
        }
    }
    Ok(())
}

fn check_kind(
    kind: ValueKind,
    insn: &SourceInsn,
    ctx: &ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    match kind {
        ValueKind::Float | ValueKind::Double => Err(ctx.unsupported(insn)),
        _ => Ok(()),
    }
}

/// Load or store for a source slot, using the short form where one exists.
fn slot_instruction(
    ctx: &ConversionContext<'_, '_>,
    source_index: u16,
    access: Access,
) -> Result<Instruction, CompileError> {
    let method = ctx.method();
    let (target, short, long) = if let Some(var) = method.param_by_source(source_index) {
        match access {
            Access::Load => (var.target_index, &LDARG_SHORT, LDARG),
            Access::Store => (var.target_index, &STARG_SHORT, STARG),
        }
    } else if let Some(var) = method.local_by_source(source_index) {
        match access {
            Access::Load => (var.target_index, &LDLOC_SHORT, LDLOC),
            Access::Store => (var.target_index, &STLOC_SHORT, STLOC),
        }
    } else {
        return Err(CompileError::UnknownVariable {
            method: method.id().to_string(),
            index: source_index,
        });
    };
    Ok(match short.get(target as usize) {
        Some(&opcode) => Instruction::new(opcode),
        None => Instruction::with_operand(long, vec![target]),
    })
}
