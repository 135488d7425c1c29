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

use crate::compiler::CompilerOptions;
use crate::source::SourceProgram;
use crate::types::{DescriptorError, SourceType};
use serde::{Deserialize, Serialize};
use serde_json::from_str;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("JSON Parse Error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Descriptor Error in {owner}.{name}: {source}")]
    Descriptor {
        owner: String,
        name: String,
        source: DescriptorError,
    },
    #[error("Contract type {0} declares no methods")]
    EmptyContractType(String),
    #[error("Integrity Error: Hash Mismatch. Expected {expected}, computed {computed}.")]
    HashMismatch { expected: String, computed: String },
}

/// A program together with the options to compile it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub options: CompilerOptions,
    pub program: SourceProgram,
    /// Hex SHA-256 of the canonical program JSON, checked when present.
    #[serde(default)]
    pub sha256: Option<String>,
}

pub fn load_program(json: &str) -> Result<SourceProgram, LoadError> {
    let program: SourceProgram = from_str(json)?;
    validate(&program)?;
    Ok(program)
}

pub fn load_project(json: &str) -> Result<Project, LoadError> {
    let project: Project = from_str(json)?;
    if let Some(expected) = &project.sha256 {
        let computed = program_hash(&project.program)?;
        if !computed.eq_ignore_ascii_case(expected) {
            return Err(LoadError::HashMismatch {
                expected: expected.clone(),
                computed,
            });
        }
    }
    validate(&project.program)?;
    Ok(project)
}

/// Hex SHA-256 over the program serialized as compact JSON.
pub fn program_hash(program: &SourceProgram) -> Result<String, LoadError> {
    let canonical = serde_json::to_vec(program)?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}

fn validate(program: &SourceProgram) -> Result<(), LoadError> {
    for method in &program.methods {
        SourceType::parse_method(&method.descriptor).map_err(|source| LoadError::Descriptor {
            owner: method.owner.clone(),
            name: method.name.clone(),
            source,
        })?;
    }
    for native in &program.natives {
        SourceType::parse_method(&native.descriptor).map_err(|source| LoadError::Descriptor {
            owner: native.owner.clone(),
            name: native.name.clone(),
            source,
        })?;
    }
    for ty in &program.contract_types {
        if !program.methods.iter().any(|m| &m.owner == ty) {
            return Err(LoadError::EmptyContractType(ty.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = r#"{
        "contract_types": ["Hello"],
        "methods": [{
            "owner": "Hello",
            "name": "answer",
            "descriptor": "()I",
            "access": { "public": true, "static": true },
            "instructions": [
                { "Line": 3 },
                { "Const": { "BiPush": 42 } },
                { "Control": "Return" }
            ]
        }]
    }"#;

    #[test]
    fn test_load_program() {
        let program = load_program(PROGRAM).unwrap();
        assert_eq!(program.methods.len(), 1);
        assert_eq!(program.methods[0].id(), "Hello.answer()I");
        assert!(program.natives.is_empty());
    }

    #[test]
    fn test_bad_descriptor() {
        let json = PROGRAM.replace("()I", "(I");
        match load_program(&json) {
            Err(LoadError::Descriptor { name, .. }) => assert_eq!(name, "answer"),
            other => panic!("Expected Descriptor error, got {:?}", other),
        }
    }

    #[test]
    fn test_project_integrity() {
        let program = load_program(PROGRAM).unwrap();
        let hash = program_hash(&program).unwrap();
        let json = format!(r#"{{"program": {}, "sha256": "{}"}}"#, PROGRAM, hash);
        let project = load_project(&json).unwrap();
        assert_eq!(project.options, CompilerOptions::default());

        let json = format!(r#"{{"program": {}, "sha256": "00"}}"#, PROGRAM);
        match load_project(&json) {
            Err(LoadError::HashMismatch { computed, .. }) => assert_eq!(computed, hash),
            other => panic!("Expected HashMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(load_program("{"), Err(LoadError::ParseError(_))));
    }
}
