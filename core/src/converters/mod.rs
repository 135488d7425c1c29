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

//! Translation of source instructions into target instructions.
//!
//! Every converter receives the whole instruction stream of the method and
//! the position of the instruction to translate, and returns the position
//! of the last instruction it consumed. Most consume exactly one; the
//! long-compare fusion and the byte-array literal recognition look ahead.

mod arithmetic;
mod arrays;
mod bit_ops;
mod constants;
mod invoke;
mod locals;
mod objects;
mod relational;
mod stack;

use crate::compiler::{register_method, CompileError, WorkQueue};
use crate::instruction::Instruction;
use crate::method::NeoMethod;
use crate::module::{MethodIdx, NeoModule};
use crate::opcode::OpCode;
use crate::source::{ControlInsn, ProgramIndex, SourceInsn, SourceMethod};

/// State shared by the converters while one method is translated.
pub struct ConversionContext<'a, 'p> {
    module: &'a mut NeoModule,
    current: MethodIdx,
    program: &'a ProgramIndex<'p>,
    queue: &'a mut WorkQueue<'p>,
}

impl<'a, 'p> ConversionContext<'a, 'p> {
    pub(crate) fn new(
        module: &'a mut NeoModule,
        current: MethodIdx,
        program: &'a ProgramIndex<'p>,
        queue: &'a mut WorkQueue<'p>,
    ) -> Self {
        Self {
            module,
            current,
            program,
            queue,
        }
    }

    pub fn method(&self) -> &NeoMethod {
        &self.module[self.current]
    }

    pub fn method_mut(&mut self) -> &mut NeoMethod {
        &mut self.module[self.current]
    }

    pub fn program(&self) -> &ProgramIndex<'p> {
        self.program
    }

    pub fn emit(&mut self, insn: Instruction) {
        self.method_mut().add_instruction(insn);
    }

    pub fn emit_op(&mut self, opcode: OpCode) {
        self.emit(Instruction::new(opcode));
    }

    /// Registers a callee of the current method and returns its handle.
    pub fn register(&mut self, source: &'p SourceMethod) -> Result<MethodIdx, CompileError> {
        register_method(self.module, self.queue, source)
    }

    pub fn unsupported(&self, insn: &SourceInsn) -> CompileError {
        CompileError::UnsupportedInstruction {
            method: self.method().id().to_string(),
            instruction: format!("{:?}", insn),
            line: self.method().current_line(),
        }
    }

    pub fn malformed(&self, reason: impl Into<String>) -> CompileError {
        CompileError::MalformedPattern {
            method: self.method().id().to_string(),
            reason: reason.into(),
        }
    }
}

/// Translates `insns[pos]` and returns the index of the last consumed
/// instruction.
pub fn convert(
    insns: &[SourceInsn],
    pos: usize,
    ctx: &mut ConversionContext<'_, '_>,
) -> Result<usize, CompileError> {
    let insn = &insns[pos];
    match insn {
        SourceInsn::Label(label) => {
            ctx.method_mut().set_current_label(*label);
            Ok(pos)
        }
        SourceInsn::Line(line) => {
            ctx.method_mut().set_current_line(*line);
            Ok(pos)
        }
        SourceInsn::Const(c) => constants::convert(c, insn, ctx).map(|_| pos),
        SourceInsn::Local(l) => locals::convert(l, insn, ctx).map(|_| pos),
        SourceInsn::Arith(a) => arithmetic::convert(a, insn, ctx).map(|_| pos),
        SourceInsn::Convert(c) => arithmetic::convert_numeric(c, insn, ctx).map(|_| pos),
        SourceInsn::Bit(b) => bit_ops::convert(b, insn, ctx).map(|_| pos),
        SourceInsn::Branch(b) => relational::convert(b, insns, pos, ctx),
        SourceInsn::Array(a) => arrays::convert(a, insns, pos, ctx),
        SourceInsn::Object(o) => objects::convert(o, insn, ctx).map(|_| pos),
        SourceInsn::Stack(s) => stack::convert(*s, insn, ctx).map(|_| pos),
        SourceInsn::Invoke(i) => invoke::convert(i, insn, ctx).map(|_| pos),
        SourceInsn::Control(c) => {
            match c {
                ControlInsn::Return => ctx.emit_op(OpCode::RET),
                ControlInsn::Throw => ctx.emit_op(OpCode::THROW),
                ControlInsn::Nop => {}
                ControlInsn::MonitorEnter | ControlInsn::MonitorExit => {
                    return Err(ctx.unsupported(insn))
                }
            }
            Ok(pos)
        }
    }
}

/// Next instruction at or after `from` that is not a line marker.
pub(crate) fn skip_lines(insns: &[SourceInsn], from: usize) -> usize {
    let mut pos = from;
    while matches!(insns.get(pos), Some(SourceInsn::Line(_))) {
        pos += 1;
    }
    pos
}
