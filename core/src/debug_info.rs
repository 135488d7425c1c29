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
use crate::method::{NeoMethod, Variable};
use crate::module::NeoModule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// One document per owner type, referenced by index from sequence points.
    pub documents: Vec<String>,
    pub methods: Vec<DebugMethod>,
    pub events: Vec<DebugEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugMethod {
    pub id: String,
    /// `owner,name`
    pub name: String,
    /// `start-end`, both inclusive.
    pub range: String,
    pub params: Vec<String>,
    #[serde(rename = "return")]
    pub return_type: String,
    pub variables: Vec<String>,
    #[serde(rename = "sequence-points")]
    pub sequence_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugEvent {
    pub id: String,
    pub name: String,
    pub params: Vec<String>,
}

impl DebugInfo {
    pub fn from_module(module: &NeoModule) -> Self {
        let mut documents: Vec<String> = Vec::new();
        let mut methods = Vec::with_capacity(module.methods().len());
        for method in module.methods() {
            let doc = match documents.iter().position(|d| d == method.owner()) {
                Some(doc) => doc,
                None => {
                    documents.push(method.owner().to_string());
                    documents.len() - 1
                }
            };
            methods.push(DebugMethod::from_method(method, doc));
        }
        let events = module
            .events()
            .iter()
            .map(|e| DebugEvent {
                id: e.variable_name.clone(),
                name: e.display_name.clone(),
                params: e
                    .parameters
                    .iter()
                    .map(|(name, ty)| format!("{},{}", name, ty.to_parameter_type()))
                    .collect(),
            })
            .collect();
        Self {
            documents,
            methods,
            events,
        }
    }

    pub fn to_json(&self) -> Result<String, CompileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl DebugMethod {
    fn from_method(method: &NeoMethod, doc: usize) -> Self {
        let start = method.start_address().unwrap_or(0);
        let end = start + method.byte_size().saturating_sub(1);
        let describe = |(i, var): (usize, &Variable)| {
            let name = var.name.clone().unwrap_or_else(|| format!("var{}", i));
            format!("{},{}", name, var.ty.to_parameter_type())
        };
        let sequence_points = method
            .instructions()
            .iter()
            .filter_map(|insn| {
                insn.line().map(|line| {
                    format!("{}[{}]{}:1-{}:1", start + insn.address(), doc, line, line)
                })
            })
            .collect();
        Self {
            id: method.id().to_string(),
            name: format!("{},{}", method.owner(), method.name()),
            range: format!("{}-{}", start, end),
            params: method.params().enumerate().map(describe).collect(),
            return_type: method.return_type().to_parameter_type().to_string(),
            variables: method.locals().enumerate().map(describe).collect(),
            sequence_points,
        }
    }
}
