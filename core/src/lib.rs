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

//! Backend that compiles JVM-style stack bytecode into a linked Neo N3
//! script, together with its NEF container, ABI and debug information.

pub mod abi;
pub mod compiler;
mod converters;
pub mod debug_info;
pub mod instruction;
pub mod loader;
pub mod method;
pub mod module;
pub mod nef;
pub mod opcode;
pub mod source;
pub mod types;

pub use compiler::{CompilationUnit, CompileError, Compiler, CompilerOptions};
pub use instruction::{Instruction, Label};
pub use method::NeoMethod;
pub use module::{MethodIdx, NeoModule};
pub use opcode::OpCode;
