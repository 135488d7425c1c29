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
use crate::source::{InvokeInsn, InvokeKind, NativeBody, NativeMethod, SourceInsn, OBJECT_CONSTRUCTOR_ID};
use crate::types::SourceType;

pub(super) fn convert(
    i: &InvokeInsn,
    insn: &SourceInsn,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<(), CompileError> {
    if i.kind == InvokeKind::Dynamic {
        return Err(ctx.unsupported(insn));
    }
    let id = i.method.id();
    if id == OBJECT_CONSTRUCTOR_ID {
        // Nothing to initialize; drop the receiver.
        ctx.emit_op(OpCode::DROP);
        return Ok(());
    }
    let (params, _) = SourceType::parse_method(&i.method.descriptor).map_err(|_| {
        CompileError::InvalidDescriptor {
            method: id.clone(),
            descriptor: i.method.descriptor.clone(),
        }
    })?;
    let argc = params.len() + usize::from(i.kind != InvokeKind::Static);

    if let Some(native) = ctx.program().native(&id) {
        reverse_arguments(argc, ctx);
        return emit_native(native, ctx);
    }
    let source = ctx
        .program()
        .method(&id)
        .ok_or_else(|| CompileError::UnknownMethod {
            method: ctx.method().id().to_string(),
            callee: id.clone(),
        })?;
    let callee = ctx.register(source)?;
    reverse_arguments(argc, ctx);
    ctx.emit(Instruction::call(callee));
    Ok(())
}

/// Source arguments are pushed first to last; the target expects the
/// first argument on top.
fn reverse_arguments(argc: usize, ctx: &mut ConversionContext<'_, '_>) {
    match argc {
        0 | 1 => {}
        2 => ctx.emit_op(OpCode::SWAP),
        3 => ctx.emit_op(OpCode::REVERSE3),
        4 => ctx.emit_op(OpCode::REVERSE4),
        n => {
            ctx.emit(Instruction::push_int(n as i64));
            ctx.emit_op(OpCode::REVERSEN);
        }
    }
}

fn emit_native(native: &NativeMethod, ctx: &mut ConversionContext<'_, '_>) -> Result<(), CompileError> {
    match &native.body {
        NativeBody::Syscalls(services) => {
            for service in services {
                ctx.emit(Instruction::syscall(service));
            }
        }
        NativeBody::Instructions(raw) => {
            for r in raw {
                let expected = r.opcode.operand_size();
                let valid = if r.opcode.is_push_data() {
                    r.operand.len() >= expected
                } else {
                    r.operand.len() == expected
                };
                if !valid {
                    return Err(ctx.malformed(format!(
                        "{} in {} has a {} byte operand",
                        r.opcode,
                        native.id(),
                        r.operand.len()
                    )));
                }
                ctx.emit(Instruction::with_operand(r.opcode, r.operand.clone()));
            }
        }
    }
    Ok(())
}
