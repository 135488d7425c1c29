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

use ark_neo::compiler::{Compiler, CompilerOptions};
use ark_neo::loader::{load_program, load_project};
use ark_neo::source::SourceProgram;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: neo_compile <program.json> [out-dir]");
        return ExitCode::FAILURE;
    }
    let out_dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    match run(Path::new(&args[1]), &out_dir) {
        Ok(written) => {
            for path in written {
                println!("Wrote {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compile Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(input)?;
    let (program, options) = read_input(&json)?;
    let unit = Compiler::new(options).compile(&program)?;

    let name = contract_name(&program);
    fs::create_dir_all(out_dir)?;
    let nef_path = out_dir.join(format!("{}.nef", name));
    let manifest_path = out_dir.join(format!("{}.manifest.json", name));
    let debug_path = out_dir.join(format!("{}.nefdbgnfo.json", name));
    fs::write(&nef_path, unit.nef.to_bytes())?;
    fs::write(&manifest_path, unit.abi.to_json()?)?;
    fs::write(&debug_path, unit.debug_info.to_json()?)?;
    println!("Script: {}", hex::encode(&unit.script));
    Ok(vec![nef_path, manifest_path, debug_path])
}

/// Accepts either a bare program or a project with options.
fn read_input(json: &str) -> Result<(SourceProgram, CompilerOptions), Box<dyn std::error::Error>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if value.get("program").is_some() {
        let project = load_project(json)?;
        Ok((project.program, project.options))
    } else {
        Ok((load_program(json)?, CompilerOptions::default()))
    }
}

fn contract_name(program: &SourceProgram) -> String {
    program
        .contract_types
        .first()
        .map(|t| t.rsplit('/').next().unwrap_or(t).to_string())
        .unwrap_or_else(|| "contract".to_string())
}
