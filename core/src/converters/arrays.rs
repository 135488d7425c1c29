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

use super::{locals, ConversionContext};
use crate::compiler::CompileError;
use crate::instruction::Instruction;
use crate::opcode::{OpCode, StackItemType};
use crate::source::{ArrayInsn, ElemKind, LocalInsn, SourceInsn, StackInsn, ValueKind};
use crate::types::SourceType;
use tracing::trace;

/// Largest item the target machine accepts.
const MAX_ITEM_SIZE: i64 = 1024 * 1024;

pub(super) fn convert(
    a: &ArrayInsn,
    insns: &[SourceInsn],
    pos: usize,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<usize, CompileError> {
    let insn = &insns[pos];
    match a {
        ArrayInsn::NewArray(descriptor) => {
            let element = SourceType::parse(descriptor).map_err(|_| {
                CompileError::InvalidDescriptor {
                    method: ctx.method().id().to_string(),
                    descriptor: descriptor.clone(),
                }
            })?;
            match element {
                SourceType::Byte => return new_byte_array(insns, pos, ctx),
                ty if !ty.is_supported() => return Err(ctx.unsupported(insn)),
                _ => ctx.emit_op(OpCode::NEWARRAY),
            }
        }
        ArrayInsn::NewObjectArray(_) => ctx.emit_op(OpCode::NEWARRAY),
        ArrayInsn::MultiNewArray { .. } => return Err(ctx.unsupported(insn)),
        ArrayInsn::Length => ctx.emit_op(OpCode::SIZE),
        ArrayInsn::Load(ElemKind::Float | ElemKind::Double)
        | ArrayInsn::Store(ElemKind::Float | ElemKind::Double) => {
            return Err(ctx.unsupported(insn))
        }
        // Target arrays are untyped.
        ArrayInsn::Load(_) => ctx.emit_op(OpCode::PICKITEM),
        ArrayInsn::Store(_) => ctx.emit_op(OpCode::SETITEM),
    }
    Ok(pos)
}

/// One literal element store: the array reference, a constant index, a
/// constant value and a byte store.
struct ElementStore {
    /// Last line marker passed over before this group.
    line: Option<u32>,
    index: i32,
    value: i32,
    end: usize,
}

fn match_element_store(
    insns: &[SourceInsn],
    from: usize,
    is_array_ref: impl Fn(&SourceInsn) -> bool,
) -> Option<ElementStore> {
    // A label is a jump target, so the run of folded stores ends there.
    let mut start = from;
    let mut line = None;
    while let Some(SourceInsn::Line(l)) = insns.get(start) {
        line = Some(*l);
        start += 1;
    }
    let group = insns.get(start..start + 4)?;
    if !is_array_ref(&group[0])
        || !matches!(group[3], SourceInsn::Array(ArrayInsn::Store(ElemKind::Byte)))
    {
        return None;
    }
    Some(ElementStore {
        line,
        index: group[1].small_int()?,
        value: group[2].small_int()?,
        end: start + 3,
    })
}

/// Folds `new byte[n]` and its literal initializers into one PUSHDATA.
///
/// Two initializer shapes are recognized: `dup, index, value, bastore`
/// groups directly after the allocation, and the array stored to a local
/// followed by `load, index, value, bastore` groups. Anything else falls
/// back to a plain allocation.
fn new_byte_array(
    insns: &[SourceInsn],
    pos: usize,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<usize, CompileError> {
    let length = match ctx.method().last_instruction().and_then(Instruction::decode_number) {
        Some(length) if !ctx.method().has_pending_labels() => length,
        _ => {
            ctx.emit_op(OpCode::NEWBUFFER);
            return Ok(pos);
        }
    };
    if length < 0 {
        return Err(ctx.malformed(format!("negative byte array length {}", length)));
    }
    if length > MAX_ITEM_SIZE {
        return Err(CompileError::DataTooLarge(length as usize));
    }
    let mut bytes = vec![0u8; length as usize];
    let mut line = None;

    let mut end = pos;
    while let Some(group) = match_element_store(insns, end + 1, |i| {
        matches!(i, SourceInsn::Stack(StackInsn::Dup))
    }) {
        set_element(ctx, &mut bytes, &group)?;
        line = group.line.or(line);
        end = group.end;
    }

    let mut store = None;
    if end == pos {
        if let Some(SourceInsn::Local(LocalInsn::Store {
            kind: ValueKind::Ref,
            index: slot,
        })) = insns.get(pos + 1)
        {
            let slot = *slot;
            let mut cursor = pos + 1;
            while let Some(group) = match_element_store(insns, cursor + 1, |i| {
                matches!(
                    i,
                    SourceInsn::Local(LocalInsn::Load { kind: ValueKind::Ref, index }) if *index == slot
                )
            }) {
                set_element(ctx, &mut bytes, &group)?;
                line = group.line.or(line);
                cursor = group.end;
            }
            if cursor > pos + 1 {
                store = Some(pos + 1);
                end = cursor;
            }
        }
    }

    trace!("Folded byte array literal of {} bytes", bytes.len());
    ctx.method_mut()
        .replace_last_instruction(Instruction::push_data(&bytes)?)?;
    ctx.emit(Instruction::with_operand(
        OpCode::CONVERT,
        vec![StackItemType::Buffer.byte()],
    ));
    if let Some(store_pos) = store {
        if let SourceInsn::Local(l) = &insns[store_pos] {
            locals::convert(l, &insns[store_pos], ctx)?;
        }
    }
    // Folded statements keep a sequence point on the next instruction.
    if let Some(line) = line {
        ctx.method_mut().set_current_line(line);
    }
    Ok(end)
}

fn set_element(
    ctx: &ConversionContext<'_, '_>,
    bytes: &mut [u8],
    group: &ElementStore,
) -> Result<(), CompileError> {
    let len = bytes.len();
    let slot = usize::try_from(group.index)
        .ok()
        .and_then(|i| bytes.get_mut(i))
        .ok_or_else(|| {
            ctx.malformed(format!(
                "initializer index {} outside byte array of length {}",
                group.index, len
            ))
        })?;
    // Truncates like a byte cast.
    *slot = group.value as u8;
    Ok(())
}
