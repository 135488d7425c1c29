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

#![allow(dead_code)]

use ark_neo::source::{
    Access, InvokeInsn, InvokeKind, LocalVar, MethodRef, SourceInsn, SourceMethod, SourceProgram,
};

pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    // Ignore the error if another test already installed a subscriber.
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

pub fn entry(owner: &str, name: &str, descriptor: &str, max_locals: u16, insns: Vec<SourceInsn>) -> SourceMethod {
    SourceMethod {
        owner: owner.to_string(),
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        display_name: None,
        access: Access {
            public: true,
            is_static: true,
        },
        locals: vec![],
        max_locals,
        instructions: insns,
    }
}

pub fn helper(owner: &str, name: &str, descriptor: &str, max_locals: u16, insns: Vec<SourceInsn>) -> SourceMethod {
    let mut m = entry(owner, name, descriptor, max_locals, insns);
    m.access.public = false;
    m
}

pub fn local(name: &str, index: u16, descriptor: &str) -> LocalVar {
    LocalVar {
        name: name.to_string(),
        index,
        descriptor: descriptor.to_string(),
    }
}

pub fn call_static(owner: &str, name: &str, descriptor: &str) -> SourceInsn {
    SourceInsn::Invoke(InvokeInsn {
        kind: InvokeKind::Static,
        method: MethodRef::new(owner, name, descriptor),
    })
}

pub fn program(contract: &str, methods: Vec<SourceMethod>) -> SourceProgram {
    SourceProgram {
        contract_types: vec![contract.to_string()],
        methods,
        natives: vec![],
        events: vec![],
    }
}
