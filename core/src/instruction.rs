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

use crate::compiler::CompileError;
use crate::module::MethodIdx;
use crate::opcode::OpCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque source-level jump marker. Bound to the first instruction emitted
/// after the marker is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(pub u32);

/// Deferred reference resolved by the finalize/link passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extra {
    /// Jump to the instruction bound to this label (same method).
    Jump(Label),
    /// Call to another method of the module.
    Call(MethodIdx),
}

/// One target-machine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    opcode: OpCode,
    operand: Vec<u8>,
    address: u32,
    line: Option<u32>,
    extra: Option<Extra>,
}

impl Instruction {
    pub fn new(opcode: OpCode) -> Self {
        Self::with_operand(opcode, Vec::new())
    }

    pub fn with_operand(opcode: OpCode, operand: Vec<u8>) -> Self {
        Self {
            opcode,
            operand,
            address: 0,
            line: None,
            extra: None,
        }
    }

    /// Wide jump to `label`. The 4-byte operand is written by
    /// `NeoMethod::finalize`.
    pub fn jump(opcode: OpCode, label: Label) -> Self {
        debug_assert!(opcode.is_wide_jump(), "{} is not a wide jump", opcode);
        Self {
            extra: Some(Extra::Jump(label)),
            ..Self::with_operand(opcode, vec![0; 4])
        }
    }

    /// CALL_L to `callee`. The 4-byte operand is written when the module is
    /// linked.
    pub fn call(callee: MethodIdx) -> Self {
        Self {
            extra: Some(Extra::Call(callee)),
            ..Self::with_operand(OpCode::CALL_L, vec![0; 4])
        }
    }

    pub fn syscall(service: &str) -> Self {
        Self::with_operand(OpCode::SYSCALL, interop_hash(service).to_vec())
    }

    /// Shortest push for a 64-bit integer.
    pub fn push_int(value: i64) -> Self {
        if (-1..=16).contains(&value) {
            let opcode = if value == -1 {
                OpCode::PUSHM1
            } else {
                // Range checked above.
                OpCode::push_small(value as u8).unwrap_or(OpCode::PUSH0)
            };
            return Self::new(opcode);
        }
        let bytes = value.to_le_bytes();
        let width = minimal_width(&bytes);
        let (opcode, width) = match width {
            1 => (OpCode::PUSHINT8, 1),
            2 => (OpCode::PUSHINT16, 2),
            3..=4 => (OpCode::PUSHINT32, 4),
            _ => (OpCode::PUSHINT64, 8),
        };
        Self::with_operand(opcode, bytes[..width].to_vec())
    }

    /// Push for an arbitrary-precision integer given as little-endian two's
    /// complement bytes.
    pub fn push_big_int(le_bytes: &[u8]) -> Result<Self, CompileError> {
        if le_bytes.is_empty() {
            return Ok(Self::push_int(0));
        }
        let width = minimal_width(le_bytes);
        if width <= 8 {
            let mut buf = [sign_fill(le_bytes); 8];
            buf[..width].copy_from_slice(&le_bytes[..width]);
            return Ok(Self::push_int(i64::from_le_bytes(buf)));
        }
        let (opcode, size) = match width {
            9..=16 => (OpCode::PUSHINT128, 16),
            17..=32 => (OpCode::PUSHINT256, 32),
            _ => return Err(CompileError::IntegerOutOfRange(width)),
        };
        let mut operand = vec![sign_fill(le_bytes); size];
        operand[..width].copy_from_slice(&le_bytes[..width]);
        Ok(Self::with_operand(opcode, operand))
    }

    pub fn push_data(data: &[u8]) -> Result<Self, CompileError> {
        let len = data.len();
        let (opcode, mut operand) = if len < 0x100 {
            (OpCode::PUSHDATA1, vec![len as u8])
        } else if len < 0x1_0000 {
            (OpCode::PUSHDATA2, (len as u16).to_le_bytes().to_vec())
        } else {
            let len = u32::try_from(len).map_err(|_| CompileError::DataTooLarge(len))?;
            (OpCode::PUSHDATA4, len.to_le_bytes().to_vec())
        };
        operand.extend_from_slice(data);
        Ok(Self::with_operand(opcode, operand))
    }

    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    pub fn operand(&self) -> &[u8] {
        &self.operand
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn extra(&self) -> Option<Extra> {
        self.extra
    }

    pub fn label(&self) -> Option<Label> {
        match self.extra {
            Some(Extra::Jump(label)) => Some(label),
            _ => None,
        }
    }

    pub fn callee(&self) -> Option<MethodIdx> {
        match self.extra {
            Some(Extra::Call(idx)) => Some(idx),
            _ => None,
        }
    }

    pub fn is_jump(&self) -> bool {
        self.label().is_some()
    }

    pub fn byte_size(&self) -> u32 {
        1 + self.operand.len() as u32
    }

    /// The integer this instruction pushes, if it is a push-integer of at
    /// most 64 bits.
    pub fn decode_number(&self) -> Option<i64> {
        if let Some(value) = self.opcode.small_int_value() {
            return Some(value);
        }
        match self.opcode {
            OpCode::PUSHINT8 | OpCode::PUSHINT16 | OpCode::PUSHINT32 | OpCode::PUSHINT64 => {
                let mut buf = [sign_fill(&self.operand); 8];
                buf[..self.operand.len()].copy_from_slice(&self.operand);
                Some(i64::from_le_bytes(buf))
            }
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_size() as usize);
        bytes.push(self.opcode.code());
        bytes.extend_from_slice(&self.operand);
        bytes
    }

    pub(crate) fn set_address(&mut self, address: u32) {
        self.address = address;
    }

    pub(crate) fn set_line(&mut self, line: Option<u32>) {
        self.line = line;
    }

    /// Writes a resolved 4-byte little-endian offset.
    pub(crate) fn set_offset(&mut self, offset: i32) {
        self.operand = offset.to_le_bytes().to_vec();
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04} {}", self.address, self.opcode)?;
        if !self.operand.is_empty() {
            write!(f, " {}", hex::encode(&self.operand))?;
        }
        Ok(())
    }
}

/// First four bytes of SHA-256 over the ASCII service name.
pub fn interop_hash(service: &str) -> [u8; 4] {
    let digest = Sha256::digest(service.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn sign_fill(le_bytes: &[u8]) -> u8 {
    match le_bytes.last() {
        Some(b) if b & 0x80 != 0 => 0xFF,
        _ => 0x00,
    }
}

/// Number of bytes needed to hold the two's complement value without
/// changing its sign.
fn minimal_width(le_bytes: &[u8]) -> usize {
    let fill = sign_fill(le_bytes);
    let mut width = le_bytes.len();
    while width > 1 && le_bytes[width - 1] == fill && (le_bytes[width - 2] & 0x80) == (fill & 0x80)
    {
        width -= 1;
    }
    width.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_int_selects_shortest_form() {
        assert_eq!(Instruction::push_int(-1).opcode(), OpCode::PUSHM1);
        assert_eq!(Instruction::push_int(0).opcode(), OpCode::PUSH0);
        assert_eq!(Instruction::push_int(16).opcode(), OpCode::PUSH16);

        let insn = Instruction::push_int(17);
        assert_eq!(insn.opcode(), OpCode::PUSHINT8);
        assert_eq!(insn.operand(), &[0x11]);

        let insn = Instruction::push_int(128);
        assert_eq!(insn.opcode(), OpCode::PUSHINT16);
        assert_eq!(insn.operand(), &[0x80, 0x00]);

        let insn = Instruction::push_int(-129);
        assert_eq!(insn.opcode(), OpCode::PUSHINT16);
        assert_eq!(insn.operand(), &[0x7F, 0xFF]);

        let insn = Instruction::push_int(0x10_0000);
        assert_eq!(insn.opcode(), OpCode::PUSHINT32);
        assert_eq!(insn.operand(), &[0x00, 0x00, 0x10, 0x00]);

        assert_eq!(Instruction::push_int(i64::MIN).opcode(), OpCode::PUSHINT64);
    }

    #[test]
    fn test_decode_number_round_trips_push_int() {
        for value in [-1, 0, 5, 16, 17, -2, 127, -128, 300, -70000, i64::MAX, i64::MIN] {
            assert_eq!(Instruction::push_int(value).decode_number(), Some(value));
        }
        assert_eq!(Instruction::new(OpCode::ADD).decode_number(), None);
    }

    #[test]
    fn test_push_big_int() {
        // 2^64, does not fit into 8 bytes.
        let mut bytes = vec![0u8; 8];
        bytes.push(1);
        let insn = Instruction::push_big_int(&bytes).unwrap();
        assert_eq!(insn.opcode(), OpCode::PUSHINT128);
        assert_eq!(insn.operand().len(), 16);
        assert_eq!(insn.operand()[8], 1);

        let insn = Instruction::push_big_int(&[0x05, 0x00, 0x00]).unwrap();
        assert_eq!(insn.opcode(), OpCode::PUSH5);

        let too_big = vec![0x7F; 33];
        match Instruction::push_big_int(&too_big) {
            Err(CompileError::IntegerOutOfRange(33)) => {}
            other => panic!("Expected IntegerOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_push_data_prefixes() {
        let insn = Instruction::push_data(b"abc").unwrap();
        assert_eq!(insn.to_bytes(), vec![0x0C, 0x03, b'a', b'b', b'c']);

        let insn = Instruction::push_data(&[0u8; 300]).unwrap();
        assert_eq!(insn.opcode(), OpCode::PUSHDATA2);
        assert_eq!(&insn.operand()[..2], &[0x2C, 0x01]);
        assert_eq!(insn.byte_size(), 1 + 2 + 300);
    }

    #[test]
    fn test_syscall_hash() {
        // Well-known interop hash of System.Runtime.Notify.
        let insn = Instruction::syscall("System.Runtime.Notify");
        assert_eq!(hex::encode(insn.operand()), "95016f61");
    }

    #[test]
    fn test_jump_and_call_are_wide() {
        let jump = Instruction::jump(OpCode::JMP_L, Label(3));
        assert_eq!(jump.byte_size(), 5);
        assert_eq!(jump.label(), Some(Label(3)));

        let call = Instruction::call(MethodIdx(2));
        assert_eq!(call.opcode(), OpCode::CALL_L);
        assert_eq!(call.callee(), Some(MethodIdx(2)));
        assert!(!call.is_jump());
    }
}
