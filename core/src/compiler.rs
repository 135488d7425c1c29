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

use crate::abi::ContractAbi;
use crate::converters::{self, ConversionContext};
use crate::debug_info::DebugInfo;
use crate::method::NeoMethod;
use crate::module::{Event, MethodIdx, NeoModule};
use crate::nef::NefFile;
use crate::opcode::OpCode;
use crate::source::{ProgramIndex, SourceMethod, SourceProgram};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Unsupported instruction {instruction} in {method}{}", display_line(.line))]
    UnsupportedInstruction {
        method: String,
        instruction: String,
        line: Option<u32>,
    },
    #[error("Unsupported type {ty} in {method}")]
    UnsupportedType { method: String, ty: String },
    #[error("Malformed descriptor '{descriptor}' in {method}")]
    InvalidDescriptor { method: String, descriptor: String },
    #[error("{method} uses {count} local variables, at most {max} are supported")]
    TooManyLocals {
        method: String,
        count: usize,
        max: usize,
    },
    #[error("{method} takes {count} parameters, at most {max} are supported")]
    TooManyParameters {
        method: String,
        count: usize,
        max: usize,
    },
    #[error("{opcode} in {method}{} jumps to a label that was never bound", display_line(.line))]
    MissingJumpTarget {
        method: String,
        opcode: OpCode,
        line: Option<u32>,
    },
    #[error("CALL_L in {method}{} has no callee", display_line(.line))]
    MissingCallee { method: String, line: Option<u32> },
    #[error("Cannot remove {opcode} from {method}: it is a jump target")]
    JumpTargetRemoval { method: String, opcode: OpCode },
    #[error("{0} has no instructions")]
    EmptyMethod(String),
    #[error("Method {0} was added twice")]
    DuplicateMethod(String),
    #[error("Event {0} is declared twice")]
    DuplicateEvent(String),
    #[error("{method} refers to unknown variable slot {index}")]
    UnknownVariable { method: String, index: u16 },
    #[error("{method} calls {callee}, which is neither compiled nor native")]
    UnknownMethod { method: String, callee: String },
    #[error("Integer of {0} bytes does not fit into 256 bits")]
    IntegerOutOfRange(usize),
    #[error("Data of {0} bytes is too large to push")]
    DataTooLarge(usize),
    #[error("Malformed instruction pattern in {method}: {reason}")]
    MalformedPattern { method: String, reason: String },
    #[error("Offset {offset} of {opcode} does not fit into 32 bits")]
    OffsetOutOfRange { opcode: OpCode, offset: i64 },
    #[error("NEF {field} is {len} bytes long, at most {max} are allowed")]
    NefField {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("Module must be linked before it is serialized")]
    NotLinked,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn display_line(line: &Option<u32>) -> String {
    match line {
        Some(line) => format!(" (line {})", line),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Written into the NEF header.
    pub compiler_name: String,
    pub source_url: String,
    pub max_locals: u8,
    pub max_params: u8,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            compiler_name: format!("ark-neo-{}", env!("CARGO_PKG_VERSION")),
            source_url: String::new(),
            max_locals: u8::MAX,
            max_params: u8::MAX,
        }
    }
}

/// Everything produced for one contract.
#[derive(Debug)]
pub struct CompilationUnit {
    pub module: NeoModule,
    pub script: Vec<u8>,
    pub nef: NefFile,
    pub abi: ContractAbi,
    pub debug_info: DebugInfo,
}

pub(crate) type WorkQueue<'p> = VecDeque<(MethodIdx, &'p SourceMethod)>;

#[derive(Debug, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn compile(&self, program: &SourceProgram) -> Result<CompilationUnit, CompileError> {
        let module = self.compile_module(program)?;
        let script = module.to_bytes()?;
        let nef = NefFile::new(&self.options.compiler_name, &self.options.source_url, script.clone())?;
        let abi = ContractAbi::from_module(&module);
        let debug_info = DebugInfo::from_module(&module);
        info!(
            "Compiled {} methods into {} bytes, checksum {}",
            module.methods().len(),
            script.len(),
            nef.checksum_hex()
        );
        Ok(CompilationUnit {
            module,
            script,
            nef,
            abi,
            debug_info,
        })
    }

    /// Compiles every entry point and everything reachable from it, then
    /// links the result.
    pub fn compile_module(&self, program: &SourceProgram) -> Result<NeoModule, CompileError> {
        let index = program.index();
        let mut module = NeoModule::new();
        for decl in &program.events {
            module.add_event(Event::from_decl(decl)?)?;
        }

        let mut queue = WorkQueue::new();
        for source in program
            .methods
            .iter()
            .filter(|m| m.access.public && m.access.is_static && index.is_contract_type(&m.owner))
        {
            register_method(&mut module, &mut queue, source)?;
        }

        while let Some((idx, source)) = queue.pop_front() {
            self.compile_method(idx, source, &index, &mut module, &mut queue)?;
        }
        module.link()?;
        Ok(module)
    }

    fn compile_method<'p>(
        &self,
        idx: MethodIdx,
        source: &'p SourceMethod,
        index: &ProgramIndex<'p>,
        module: &mut NeoModule,
        queue: &mut WorkQueue<'p>,
    ) -> Result<(), CompileError> {
        debug!("Compiling {}", source.id());
        module[idx].initialize(source, index, &self.options)?;

        let insns = &source.instructions;
        let mut ctx = ConversionContext::new(module, idx, index, queue);
        let mut pos = 0;
        while pos < insns.len() {
            pos = converters::convert(insns, pos, &mut ctx)? + 1;
        }
        Ok(())
    }
}

/// Adds `source` to the module unless it is already there. New methods are
/// queued for compilation.
pub(crate) fn register_method<'p>(
    module: &mut NeoModule,
    queue: &mut WorkQueue<'p>,
    source: &'p SourceMethod,
) -> Result<MethodIdx, CompileError> {
    if let Some(idx) = module.method_idx(&source.id()) {
        return Ok(idx);
    }
    let idx = module.add_method(NeoMethod::new(source)?)?;
    queue.push_back((idx, source));
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_line() {
        let err = CompileError::UnsupportedInstruction {
            method: "C.m()V".to_string(),
            instruction: "MonitorEnter".to_string(),
            line: Some(14),
        };
        assert_eq!(err.to_string(), "Unsupported instruction MonitorEnter in C.m()V (line 14)");

        let err = CompileError::MissingCallee {
            method: "C.m()V".to_string(),
            line: None,
        };
        assert_eq!(err.to_string(), "CALL_L in C.m()V has no callee");
    }

    #[test]
    fn test_default_options() {
        let options = CompilerOptions::default();
        assert_eq!(options.max_locals, 255);
        assert_eq!(options.max_params, 255);
        assert!(options.compiler_name.starts_with("ark-neo-"));

        let parsed: CompilerOptions = serde_json::from_str(r#"{"max_locals": 8}"#).unwrap();
        assert_eq!(parsed.max_locals, 8);
        assert_eq!(parsed.max_params, 255);
    }

    #[test]
    fn test_raw_call_in_native_has_no_callee() {
        use crate::source::{
            Access, InvokeInsn, InvokeKind, MethodRef, NativeBody, NativeMethod, RawInstruction,
            SourceInsn,
        };

        let main = SourceMethod {
            owner: "C".to_string(),
            name: "main".to_string(),
            descriptor: "()V".to_string(),
            display_name: None,
            access: Access {
                public: true,
                is_static: true,
            },
            locals: vec![],
            max_locals: 0,
            instructions: vec![
                SourceInsn::Line(3),
                SourceInsn::Invoke(InvokeInsn {
                    kind: InvokeKind::Static,
                    method: MethodRef::new("N", "jump", "()V"),
                }),
            ],
        };
        let program = SourceProgram {
            contract_types: vec!["C".to_string()],
            methods: vec![main],
            natives: vec![NativeMethod {
                owner: "N".to_string(),
                name: "jump".to_string(),
                descriptor: "()V".to_string(),
                body: NativeBody::Instructions(vec![RawInstruction {
                    opcode: OpCode::CALL_L,
                    operand: vec![0; 4],
                }]),
            }],
            events: vec![],
        };
        match Compiler::default().compile(&program) {
            Err(CompileError::MissingCallee { method, line }) => {
                assert_eq!(method, "C.main()V");
                assert_eq!(line, Some(3));
            }
            other => panic!("Expected MissingCallee, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program_compiles_to_empty_script() {
        let program = SourceProgram {
            contract_types: vec!["C".to_string()],
            methods: vec![],
            natives: vec![],
            events: vec![],
        };
        let unit = Compiler::default().compile(&program).unwrap();
        assert!(unit.script.is_empty());
        assert!(unit.abi.methods.is_empty());
    }
}
