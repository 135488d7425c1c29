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

use crate::compiler::{CompileError, CompilerOptions};
use crate::instruction::{Instruction, Label};
use crate::opcode::OpCode;
use crate::source::{ProgramIndex, SourceMethod};
use crate::types::SourceType;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// A parameter or local variable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub target_index: u8,
    pub source_index: u16,
    pub name: Option<String>,
    pub ty: SourceType,
}

/// Per-method code under construction.
///
/// Instructions are kept in emission order; their addresses are relative to
/// the method start and always contiguous.
#[derive(Debug, Clone)]
pub struct NeoMethod {
    id: String,
    owner: String,
    source_name: String,
    name: String,
    param_types: Vec<SourceType>,
    return_type: SourceType,
    has_receiver: bool,
    abi_entry: bool,

    instructions: Vec<Instruction>,
    jump_targets: HashMap<Label, usize>,
    jumps: Vec<usize>,
    last_address: u32,
    start_address: Option<u32>,

    params: BTreeMap<u8, Variable>,
    params_by_source: HashMap<u16, u8>,
    locals: BTreeMap<u8, Variable>,
    locals_by_source: HashMap<u16, u8>,

    pending_labels: Vec<Label>,
    current_line: Option<u32>,
    line_pending: bool,
}

impl NeoMethod {
    pub fn new(source: &SourceMethod) -> Result<Self, CompileError> {
        let (param_types, return_type) = SourceType::parse_method(&source.descriptor)
            .map_err(|_| CompileError::InvalidDescriptor {
                method: source.id(),
                descriptor: source.descriptor.clone(),
            })?;
        Ok(Self {
            id: source.id(),
            owner: source.owner.clone(),
            source_name: source.name.clone(),
            name: source.display_name.clone().unwrap_or_else(|| source.name.clone()),
            param_types,
            return_type,
            has_receiver: source.has_receiver(),
            abi_entry: false,
            instructions: Vec::new(),
            jump_targets: HashMap::new(),
            jumps: Vec::new(),
            last_address: 0,
            start_address: None,
            params: BTreeMap::new(),
            params_by_source: HashMap::new(),
            locals: BTreeMap::new(),
            locals_by_source: HashMap::new(),
            pending_labels: Vec::new(),
            current_line: None,
            line_pending: false,
        })
    }

    /// Sets up the variable slots and emits INITSLOT if any are needed.
    pub fn initialize(
        &mut self,
        source: &SourceMethod,
        program: &ProgramIndex<'_>,
        options: &CompilerOptions,
    ) -> Result<(), CompileError> {
        self.check_types(source)?;
        self.abi_entry = source.access.public
            && source.access.is_static
            && program.is_contract_type(&source.owner);

        let param_count = self.param_types.len() + usize::from(self.has_receiver);
        if param_count > options.max_params as usize {
            return Err(CompileError::TooManyParameters {
                method: self.id.clone(),
                count: param_count,
                max: options.max_params as usize,
            });
        }

        let mut source_index = 0u16;
        let mut slot_types = Vec::with_capacity(param_count);
        if self.has_receiver {
            slot_types.push(SourceType::Object(self.owner.clone()));
        }
        slot_types.extend(self.param_types.iter().cloned());
        for (target, ty) in slot_types.into_iter().enumerate() {
            let width = ty.slot_width();
            let var = Variable {
                // Bounded by max_params above.
                target_index: target as u8,
                source_index,
                name: variable_name(source, source_index),
                ty,
            };
            self.params_by_source.insert(source_index, var.target_index);
            self.params.insert(var.target_index, var);
            source_index += width;
        }

        let mut locals = Vec::new();
        while source_index < source.max_locals {
            let declared = source.locals.iter().find(|v| v.index == source_index);
            let ty = match declared {
                Some(v) => SourceType::parse(&v.descriptor).map_err(|_| {
                    CompileError::InvalidDescriptor {
                        method: self.id.clone(),
                        descriptor: v.descriptor.clone(),
                    }
                })?,
                None => SourceType::Object("java/lang/Object".to_string()),
            };
            let width = ty.slot_width();
            locals.push((source_index, declared.map(|v| v.name.clone()), ty));
            source_index += width;
        }
        if locals.len() > options.max_locals as usize {
            return Err(CompileError::TooManyLocals {
                method: self.id.clone(),
                count: locals.len(),
                max: options.max_locals as usize,
            });
        }
        for (target, (source_index, name, ty)) in locals.into_iter().enumerate() {
            self.locals_by_source.insert(source_index, target as u8);
            self.locals.insert(
                target as u8,
                Variable {
                    target_index: target as u8,
                    source_index,
                    name,
                    ty,
                },
            );
        }

        if !self.params.is_empty() || !self.locals.is_empty() {
            let operand = vec![self.locals.len() as u8, self.params.len() as u8];
            self.add_instruction(Instruction::with_operand(OpCode::INITSLOT, operand));
        }
        trace!(
            "Initialized {} with {} params and {} locals",
            self.id,
            self.params.len(),
            self.locals.len()
        );
        Ok(())
    }

    fn check_types(&self, source: &SourceMethod) -> Result<(), CompileError> {
        let unsupported = |ty: &SourceType| CompileError::UnsupportedType {
            method: self.id.clone(),
            ty: ty.to_string(),
        };
        if let Some(ty) = self
            .param_types
            .iter()
            .chain(std::iter::once(&self.return_type))
            .find(|ty| !ty.is_supported())
        {
            return Err(unsupported(ty));
        }
        for local in &source.locals {
            if let Ok(ty) = SourceType::parse(&local.descriptor) {
                if !ty.is_supported() {
                    return Err(unsupported(&ty));
                }
            }
        }
        Ok(())
    }

    pub fn set_current_line(&mut self, line: u32) {
        self.current_line = Some(line);
        self.line_pending = true;
    }

    /// The label is bound to the next instruction added.
    pub fn set_current_label(&mut self, label: Label) {
        self.pending_labels.push(label);
    }

    pub fn has_pending_labels(&self) -> bool {
        !self.pending_labels.is_empty()
    }

    pub fn add_instruction(&mut self, mut insn: Instruction) {
        if self.line_pending && self.current_line.is_some() {
            insn.set_line(self.current_line);
            self.line_pending = false;
        }
        let idx = self.instructions.len();
        for label in self.pending_labels.drain(..) {
            self.jump_targets.insert(label, idx);
        }
        trace!("{}: {}", self.id, insn);
        self.push(insn);
    }

    fn push(&mut self, mut insn: Instruction) {
        insn.set_address(self.last_address);
        self.last_address += insn.byte_size();
        if insn.is_jump() {
            self.jumps.push(self.instructions.len());
        }
        self.instructions.push(insn);
    }

    fn pop(&mut self) -> Option<Instruction> {
        let insn = self.instructions.pop()?;
        if self.jumps.last() == Some(&self.instructions.len()) {
            self.jumps.pop();
        }
        self.last_address -= insn.byte_size();
        Some(insn)
    }

    fn is_jump_target(&self, idx: usize) -> bool {
        self.jump_targets.values().any(|&target| target == idx)
    }

    /// Removes the last instruction. Fails if a label is bound to it.
    pub fn remove_last_instruction(&mut self) -> Result<Instruction, CompileError> {
        let idx = match self.instructions.len() {
            0 => return Err(CompileError::EmptyMethod(self.id.clone())),
            n => n - 1,
        };
        if self.is_jump_target(idx) {
            return Err(CompileError::JumpTargetRemoval {
                method: self.id.clone(),
                opcode: self.instructions[idx].opcode(),
            });
        }
        self.pop().ok_or_else(|| CompileError::EmptyMethod(self.id.clone()))
    }

    /// Swaps the last instruction for `insn`, carrying over its labels and
    /// line. Returns the replaced instruction.
    pub fn replace_last_instruction(
        &mut self,
        mut insn: Instruction,
    ) -> Result<Instruction, CompileError> {
        let old = self
            .pop()
            .ok_or_else(|| CompileError::EmptyMethod(self.id.clone()))?;
        if insn.line().is_none() {
            insn.set_line(old.line());
        }
        // Labels stay bound to the same index.
        self.push(insn);
        Ok(old)
    }

    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    pub fn instruction_at(&self, address: u32) -> Option<&Instruction> {
        self.instructions
            .binary_search_by_key(&address, |insn| insn.address())
            .ok()
            .map(|idx| &self.instructions[idx])
    }

    /// Address of the instruction bound to `label`.
    pub fn label_address(&self, label: Label) -> Option<u32> {
        self.jump_targets
            .get(&label)
            .and_then(|&idx| self.instructions.get(idx))
            .map(Instruction::address)
    }

    /// Writes the relative offsets of all jump instructions.
    pub fn finalize(&mut self) -> Result<(), CompileError> {
        for &idx in &self.jumps {
            let jump = &self.instructions[idx];
            let target = jump
                .label()
                .and_then(|label| self.jump_targets.get(&label))
                .and_then(|&t| self.instructions.get(t))
                .ok_or_else(|| CompileError::MissingJumpTarget {
                    method: self.id.clone(),
                    opcode: jump.opcode(),
                    line: jump.line(),
                })?;
            let offset = target.address() as i64 - jump.address() as i64;
            let offset = i32::try_from(offset).map_err(|_| CompileError::OffsetOutOfRange {
                opcode: jump.opcode(),
                offset,
            })?;
            self.instructions[idx].set_offset(offset);
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.last_address as usize);
        for insn in &self.instructions {
            bytes.extend(insn.to_bytes());
        }
        bytes
    }

    pub fn byte_size(&self) -> u32 {
        self.last_address
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Exposed name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_abi_entry(&self) -> bool {
        self.abi_entry
    }

    pub fn param_types(&self) -> &[SourceType] {
        &self.param_types
    }

    pub fn return_type(&self) -> &SourceType {
        &self.return_type
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut [Instruction] {
        &mut self.instructions
    }

    pub fn start_address(&self) -> Option<u32> {
        self.start_address
    }

    pub(crate) fn set_start_address(&mut self, address: u32) {
        self.start_address = Some(address);
    }

    pub fn current_line(&self) -> Option<u32> {
        self.current_line
    }

    /// Parameters in target slot order.
    pub fn params(&self) -> impl Iterator<Item = &Variable> {
        self.params.values()
    }

    /// Locals in target slot order.
    pub fn locals(&self) -> impl Iterator<Item = &Variable> {
        self.locals.values()
    }

    pub fn param_by_source(&self, source_index: u16) -> Option<&Variable> {
        self.params_by_source
            .get(&source_index)
            .and_then(|t| self.params.get(t))
    }

    pub fn local_by_source(&self, source_index: u16) -> Option<&Variable> {
        self.locals_by_source
            .get(&source_index)
            .and_then(|t| self.locals.get(t))
    }
}

fn variable_name(source: &SourceMethod, index: u16) -> Option<String> {
    source
        .locals
        .iter()
        .find(|v| v.index == index)
        .map(|v| v.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Access, LocalVar, SourceProgram};

    fn source(descriptor: &str, is_static: bool, max_locals: u16, locals: Vec<LocalVar>) -> SourceMethod {
        SourceMethod {
            owner: "C".to_string(),
            name: "m".to_string(),
            descriptor: descriptor.to_string(),
            display_name: None,
            access: Access {
                public: true,
                is_static,
            },
            locals,
            max_locals,
            instructions: vec![],
        }
    }

    fn local(name: &str, index: u16, descriptor: &str) -> LocalVar {
        LocalVar {
            name: name.to_string(),
            index,
            descriptor: descriptor.to_string(),
        }
    }

    fn program() -> SourceProgram {
        SourceProgram {
            contract_types: vec!["C".to_string()],
            methods: vec![],
            natives: vec![],
            events: vec![],
        }
    }

    fn initialized(src: &SourceMethod) -> Result<NeoMethod, CompileError> {
        let program = program();
        let mut method = NeoMethod::new(src)?;
        method.initialize(src, &program.index(), &CompilerOptions::default())?;
        Ok(method)
    }

    #[test]
    fn test_addresses_are_contiguous() {
        let src = source("()V", true, 0, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        m.add_instruction(Instruction::push_int(1000));
        m.add_instruction(Instruction::new(OpCode::DROP));
        m.add_instruction(Instruction::push_data(b"hello").unwrap());
        m.add_instruction(Instruction::new(OpCode::RET));

        let mut expected = 0;
        for insn in m.instructions() {
            assert_eq!(insn.address(), expected);
            expected += insn.byte_size();
        }
        assert_eq!(m.byte_size(), expected);
        assert_eq!(m.to_bytes().len() as u32, expected);
        assert_eq!(m.instruction_at(3).map(|i| i.opcode()), Some(OpCode::DROP));
    }

    #[test]
    fn test_forward_and_backward_jumps() {
        let src = source("()V", true, 0, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        m.set_current_label(Label(1));
        m.add_instruction(Instruction::new(OpCode::NOP)); // 0
        m.add_instruction(Instruction::jump(OpCode::JMPIF_L, Label(2))); // 1
        m.add_instruction(Instruction::jump(OpCode::JMP_L, Label(1))); // 6
        m.set_current_label(Label(2));
        m.add_instruction(Instruction::new(OpCode::RET)); // 11
        m.finalize().unwrap();

        let fwd = &m.instructions()[1];
        let back = &m.instructions()[2];
        assert_eq!(i32::from_le_bytes(fwd.operand().try_into().unwrap()), 10);
        assert_eq!(i32::from_le_bytes(back.operand().try_into().unwrap()), -6);
        assert_eq!(m.label_address(Label(2)), Some(11));
    }

    #[test]
    fn test_consecutive_labels_bind_to_same_instruction() {
        let src = source("()V", true, 0, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        m.set_current_label(Label(1));
        m.set_current_label(Label(2));
        m.add_instruction(Instruction::new(OpCode::RET));
        assert_eq!(m.label_address(Label(1)), Some(0));
        assert_eq!(m.label_address(Label(2)), Some(0));
    }

    #[test]
    fn test_missing_jump_target() {
        let src = source("()V", true, 0, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        m.set_current_line(12);
        m.add_instruction(Instruction::jump(OpCode::JMP_L, Label(9)));
        match m.finalize() {
            Err(CompileError::MissingJumpTarget { line: Some(12), .. }) => {}
            other => panic!("Expected MissingJumpTarget, got {:?}", other),
        }
    }

    #[test]
    fn test_line_stamped_once() {
        let src = source("()V", true, 0, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        m.set_current_line(7);
        m.add_instruction(Instruction::push_int(1));
        m.add_instruction(Instruction::new(OpCode::RET));
        assert_eq!(m.instructions()[0].line(), Some(7));
        assert_eq!(m.instructions()[1].line(), None);
    }

    #[test]
    fn test_remove_last_instruction() {
        let src = source("()V", true, 0, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        assert!(matches!(m.remove_last_instruction(), Err(CompileError::EmptyMethod(_))));

        m.add_instruction(Instruction::push_int(3));
        m.add_instruction(Instruction::jump(OpCode::JMP_L, Label(0)));
        let removed = m.remove_last_instruction().unwrap();
        assert_eq!(removed.opcode(), OpCode::JMP_L);
        assert_eq!(m.byte_size(), 1);

        m.set_current_label(Label(5));
        m.add_instruction(Instruction::new(OpCode::DUP));
        match m.remove_last_instruction() {
            Err(CompileError::JumpTargetRemoval { opcode: OpCode::DUP, .. }) => {}
            other => panic!("Expected JumpTargetRemoval, got {:?}", other),
        }
        // The rejected removal left the method untouched.
        assert_eq!(m.instructions().len(), 2);
    }

    #[test]
    fn test_replace_last_keeps_label_and_line() {
        let src = source("()V", true, 0, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        m.add_instruction(Instruction::new(OpCode::NOP));
        m.set_current_label(Label(4));
        m.set_current_line(30);
        m.add_instruction(Instruction::push_int(2));
        let old = m
            .replace_last_instruction(Instruction::push_data(&[0, 0]).unwrap())
            .unwrap();
        assert_eq!(old.opcode(), OpCode::PUSH2);

        let last = m.last_instruction().unwrap();
        assert_eq!(last.opcode(), OpCode::PUSHDATA1);
        assert_eq!(last.address(), 1);
        assert_eq!(last.line(), Some(30));
        assert_eq!(m.label_address(Label(4)), Some(1));
        assert_eq!(m.byte_size(), 1 + 4);
    }

    #[test]
    fn test_initialize_emits_init_slot() {
        let src = source(
            "(JI)V",
            true,
            5,
            vec![local("a", 0, "J"), local("b", 2, "I"), local("x", 3, "I"), local("y", 4, "I")],
        );
        let m = initialized(&src).unwrap();
        let first = &m.instructions()[0];
        assert_eq!(first.opcode(), OpCode::INITSLOT);
        assert_eq!(first.operand(), &[2, 2]);

        assert_eq!(m.param_by_source(0).map(|v| v.target_index), Some(0));
        assert_eq!(m.param_by_source(2).map(|v| v.target_index), Some(1));
        assert_eq!(m.param_by_source(1), None);
        assert_eq!(m.local_by_source(3).map(|v| v.target_index), Some(0));
        assert_eq!(m.local_by_source(4).and_then(|v| v.name.clone()), Some("y".to_string()));
        assert!(m.is_abi_entry());
    }

    #[test]
    fn test_initialize_counts_receiver() {
        let src = source("(I)I", false, 2, vec![]);
        let m = initialized(&src).unwrap();
        assert_eq!(m.instructions()[0].operand(), &[0, 2]);
        assert_eq!(m.param_by_source(0).map(|v| v.ty.clone()), Some(SourceType::Object("C".to_string())));
        assert!(!m.is_abi_entry());
    }

    #[test]
    fn test_initialize_without_slots() {
        let src = source("()V", true, 0, vec![]);
        let m = initialized(&src).unwrap();
        assert!(m.instructions().is_empty());
    }

    #[test]
    fn test_initialize_rejects_floats_and_limits() {
        let src = source("(F)V", true, 1, vec![]);
        assert!(matches!(initialized(&src), Err(CompileError::UnsupportedType { .. })));

        let src = source("()V", true, 1, vec![local("d", 0, "D")]);
        assert!(matches!(initialized(&src), Err(CompileError::UnsupportedType { .. })));

        let src = source("()V", true, 256, vec![]);
        match initialized(&src) {
            Err(CompileError::TooManyLocals { count: 256, max: 255, .. }) => {}
            other => panic!("Expected TooManyLocals, got {:?}", other),
        }
    }

    #[test]
    fn test_receiver_counts_towards_max_params() {
        let options = CompilerOptions {
            max_params: 1,
            ..CompilerOptions::default()
        };
        let program = program();

        let src = source("(I)V", true, 1, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        assert!(m.initialize(&src, &program.index(), &options).is_ok());

        let src = source("(I)V", false, 2, vec![]);
        let mut m = NeoMethod::new(&src).unwrap();
        match m.initialize(&src, &program.index(), &options) {
            Err(CompileError::TooManyParameters { count: 2, max: 1, .. }) => {}
            other => panic!("Expected TooManyParameters, got {:?}", other),
        }
    }
}
