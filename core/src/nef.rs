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

//! NEF3 executable container.
//!
//! Layout: `magic u32 || compiler[64] || var-string source || 0x00 ||
//! var-int tokens || u16 0 || var-bytes script || checksum u32`.

use crate::compiler::CompileError;
use sha2::{Digest, Sha256};

pub const MAGIC: u32 = 0x3346_454E;
pub const COMPILER_FIELD_SIZE: usize = 64;
pub const MAX_SOURCE_URL: usize = 256;
pub const MAX_SCRIPT_SIZE: usize = 512 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NefFile {
    compiler: String,
    source_url: String,
    script: Vec<u8>,
    checksum: [u8; 4],
}

impl NefFile {
    pub fn new(compiler: &str, source_url: &str, script: Vec<u8>) -> Result<Self, CompileError> {
        check_len("compiler", compiler.len(), COMPILER_FIELD_SIZE)?;
        check_len("source", source_url.len(), MAX_SOURCE_URL)?;
        check_len("script", script.len(), MAX_SCRIPT_SIZE)?;
        let mut nef = Self {
            compiler: compiler.to_string(),
            source_url: source_url.to_string(),
            script,
            checksum: [0; 4],
        };
        nef.checksum = compute_checksum(&nef.body_bytes());
        Ok(nef)
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn checksum(&self) -> u32 {
        u32::from_le_bytes(self.checksum)
    }

    pub fn checksum_hex(&self) -> String {
        hex::encode(self.checksum)
    }

    /// Everything the checksum covers.
    fn body_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(COMPILER_FIELD_SIZE + self.script.len() + 16);
        out.extend_from_slice(&MAGIC.to_le_bytes());
        let mut compiler = [0u8; COMPILER_FIELD_SIZE];
        compiler[..self.compiler.len()].copy_from_slice(self.compiler.as_bytes());
        out.extend_from_slice(&compiler);
        write_var_bytes(&mut out, self.source_url.as_bytes());
        out.push(0);
        // No method tokens.
        write_var_int(&mut out, 0);
        out.extend_from_slice(&0u16.to_le_bytes());
        write_var_bytes(&mut out, &self.script);
        out
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.body_bytes();
        out.extend_from_slice(&self.checksum);
        out
    }
}

fn check_len(field: &'static str, len: usize, max: usize) -> Result<(), CompileError> {
    if len > max {
        return Err(CompileError::NefField { field, len, max });
    }
    Ok(())
}

/// First four bytes of a double SHA-256.
fn compute_checksum(data: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(data));
    [digest[0], digest[1], digest[2], digest[3]]
}

pub fn write_var_int(out: &mut Vec<u8>, value: u64) {
    if value < 0xFD {
        out.push(value as u8);
    } else if value <= 0xFFFF {
        out.push(0xFD);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xFFFF_FFFF {
        out.push(0xFE);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xFF);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

pub fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_var_int(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}
