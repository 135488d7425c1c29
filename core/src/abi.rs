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
use crate::method::NeoMethod;
use crate::module::{Event, NeoModule};
use crate::types::ContractParameterType;
use serde::{Deserialize, Serialize};

/// Entry points and events of a compiled contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAbi {
    pub methods: Vec<AbiMethod>,
    pub events: Vec<AbiEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiMethod {
    pub name: String,
    pub offset: u32,
    pub parameters: Vec<AbiParameter>,
    pub return_type: ContractParameterType,
    pub safe: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ContractParameterType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    pub parameters: Vec<AbiParameter>,
}

impl ContractAbi {
    /// Collects the ABI-visible methods of a linked module.
    pub fn from_module(module: &NeoModule) -> Self {
        Self {
            methods: module
                .methods()
                .iter()
                .filter(|m| m.is_abi_entry())
                .map(AbiMethod::from_method)
                .collect(),
            events: module.events().iter().map(AbiEvent::from_event).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, CompileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl AbiMethod {
    fn from_method(method: &NeoMethod) -> Self {
        let parameters = method
            .params()
            .enumerate()
            .map(|(i, var)| AbiParameter {
                name: var.name.clone().unwrap_or_else(|| format!("arg{}", i)),
                ty: var.ty.to_parameter_type(),
            })
            .collect();
        Self {
            name: method.name().to_string(),
            offset: method.start_address().unwrap_or(0),
            parameters,
            return_type: method.return_type().to_parameter_type(),
            safe: false,
        }
    }
}

impl AbiEvent {
    fn from_event(event: &Event) -> Self {
        Self {
            name: event.display_name.clone(),
            parameters: event
                .parameters
                .iter()
                .map(|(name, ty)| AbiParameter {
                    name: name.clone(),
                    ty: ty.to_parameter_type(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::source::{
        Access, ConstInsn, ControlInsn, EventDecl, EventParam, LocalVar, SourceInsn, SourceMethod,
        SourceProgram,
    };

    fn entry(name: &str, descriptor: &str, locals: Vec<LocalVar>, max_locals: u16) -> SourceMethod {
        SourceMethod {
            owner: "Token".to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            display_name: None,
            access: Access {
                public: true,
                is_static: true,
            },
            locals,
            max_locals,
            instructions: vec![
                SourceInsn::Const(ConstInsn::IConst(1)),
                SourceInsn::Control(ControlInsn::Return),
            ],
        }
    }

    #[test]
    fn test_abi_lists_entry_points_and_events() {
        let program = SourceProgram {
            contract_types: vec!["Token".to_string()],
            methods: vec![
                entry("decimals", "()I", vec![], 0),
                entry(
                    "balanceOf",
                    "([B)I",
                    vec![LocalVar {
                        name: "account".to_string(),
                        index: 0,
                        descriptor: "[B".to_string(),
                    }],
                    1,
                ),
            ],
            natives: vec![],
            events: vec![EventDecl {
                name: "onTransfer".to_string(),
                display_name: Some("Transfer".to_string()),
                parameters: vec![EventParam {
                    name: "amount".to_string(),
                    descriptor: "I".to_string(),
                }],
            }],
        };
        let unit = Compiler::default().compile(&program).unwrap();
        let abi = &unit.abi;
        assert_eq!(abi.methods.len(), 2);
        assert_eq!(abi.methods[0].name, "decimals");
        assert_eq!(abi.methods[0].offset, 0);
        // PUSH1 RET
        assert_eq!(abi.methods[1].offset, 2);
        assert_eq!(abi.methods[1].parameters[0].name, "account");
        assert_eq!(abi.methods[1].parameters[0].ty, ContractParameterType::ByteArray);

        let json: serde_json::Value = serde_json::from_str(&abi.to_json().unwrap()).unwrap();
        assert_eq!(json["methods"][1]["returnType"], "Integer");
        assert_eq!(json["methods"][1]["parameters"][0]["type"], "ByteArray");
        assert_eq!(json["events"][0]["name"], "Transfer");
    }
}
