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

//! The module collects every compiled method and links them into one script.

use crate::compiler::CompileError;
use crate::method::NeoMethod;
use crate::opcode::OpCode;
use crate::source::EventDecl;
use crate::types::SourceType;
use std::collections::HashMap;
use std::ops::{Index, IndexMut};
use tracing::debug;

/// Index of a method within its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodIdx(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub variable_name: String,
    pub display_name: String,
    pub parameters: Vec<(String, SourceType)>,
}

impl Event {
    pub fn from_decl(decl: &EventDecl) -> Result<Self, CompileError> {
        let parameters = decl
            .parameters
            .iter()
            .map(|p| {
                SourceType::parse(&p.descriptor)
                    .map(|ty| (p.name.clone(), ty))
                    .map_err(|_| CompileError::InvalidDescriptor {
                        method: decl.display_name().to_string(),
                        descriptor: p.descriptor.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            variable_name: decl.name.clone(),
            display_name: decl.display_name().to_string(),
            parameters,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NeoModule {
    methods: Vec<NeoMethod>,
    index: HashMap<String, MethodIdx>,
    events: Vec<Event>,
    linked: bool,
}

impl NeoModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a method. Methods are laid out in the order they are added.
    pub fn add_method(&mut self, method: NeoMethod) -> Result<MethodIdx, CompileError> {
        if self.index.contains_key(method.id()) {
            return Err(CompileError::DuplicateMethod(method.id().to_string()));
        }
        let idx = MethodIdx(self.methods.len());
        self.index.insert(method.id().to_string(), idx);
        self.methods.push(method);
        self.linked = false;
        Ok(idx)
    }

    pub fn method_idx(&self, id: &str) -> Option<MethodIdx> {
        self.index.get(id).copied()
    }

    pub fn method(&self, idx: MethodIdx) -> Option<&NeoMethod> {
        self.methods.get(idx.0)
    }

    pub fn method_mut(&mut self, idx: MethodIdx) -> Option<&mut NeoMethod> {
        self.methods.get_mut(idx.0)
    }

    pub fn methods(&self) -> &[NeoMethod] {
        &self.methods
    }

    pub fn add_event(&mut self, event: Event) -> Result<(), CompileError> {
        if self.events.iter().any(|e| e.display_name == event.display_name) {
            return Err(CompileError::DuplicateEvent(event.display_name));
        }
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Resolves jumps inside every method, assigns start addresses and
    /// patches the cross-method calls.
    pub fn link(&mut self) -> Result<(), CompileError> {
        let mut address = 0u32;
        for method in &mut self.methods {
            method.finalize()?;
            method.set_start_address(address);
            debug!("Placed {} at {} ({} bytes)", method.id(), address, method.byte_size());
            address += method.byte_size();
        }

        let starts: Vec<u32> = self
            .methods
            .iter()
            .map(|m| m.start_address().unwrap_or(0))
            .collect();
        for method in &mut self.methods {
            let caller_start = method.start_address().unwrap_or(0);
            let caller_id = method.id().to_string();
            for insn in method.instructions_mut() {
                if insn.opcode() != OpCode::CALL_L {
                    continue;
                }
                let callee_start = insn
                    .callee()
                    .and_then(|callee| starts.get(callee.0))
                    .ok_or_else(|| CompileError::MissingCallee {
                        method: caller_id.clone(),
                        line: insn.line(),
                    })?;
                let offset = *callee_start as i64 - (caller_start + insn.address()) as i64;
                let offset = i32::try_from(offset).map_err(|_| CompileError::OffsetOutOfRange {
                    opcode: OpCode::CALL_L,
                    offset,
                })?;
                insn.set_offset(offset);
            }
        }
        self.linked = true;
        Ok(())
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn byte_size(&self) -> u32 {
        self.methods.iter().map(NeoMethod::byte_size).sum()
    }

    /// The linked script. Fails if `link` has not run since the last method
    /// was added.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CompileError> {
        if !self.linked {
            return Err(CompileError::NotLinked);
        }
        let mut script = Vec::with_capacity(self.byte_size() as usize);
        for method in &self.methods {
            script.extend(method.to_bytes());
        }
        Ok(script)
    }
}

impl Index<MethodIdx> for NeoModule {
    type Output = NeoMethod;

    fn index(&self, idx: MethodIdx) -> &NeoMethod {
        &self.methods[idx.0]
    }
}

impl IndexMut<MethodIdx> for NeoModule {
    fn index_mut(&mut self, idx: MethodIdx) -> &mut NeoMethod {
        &mut self.methods[idx.0]
    }
}
