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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deepest array nesting a descriptor may declare.
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

/// Source type as written in a field or method descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum SourceType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Object(String), // internal name, e.g. java/lang/String
    Array(Box<SourceType>),
    Void,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorError(pub String);

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed type descriptor '{}'", self.0)
    }
}

impl std::error::Error for DescriptorError {}

impl SourceType {
    /// Parses a single field descriptor such as `I`, `[B` or `Ljava/lang/String;`.
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let (ty, rest) = Self::parse_prefix(descriptor)?;
        if !rest.is_empty() {
            return Err(DescriptorError(descriptor.to_string()));
        }
        Ok(ty)
    }

    /// Parses a method descriptor `(params)ret`.
    pub fn parse_method(descriptor: &str) -> Result<(Vec<SourceType>, SourceType), DescriptorError> {
        let err = || DescriptorError(descriptor.to_string());
        let mut rest = descriptor.strip_prefix('(').ok_or_else(err)?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            if rest.is_empty() {
                return Err(err());
            }
            let (ty, tail) = Self::parse_prefix(rest).map_err(|_| err())?;
            params.push(ty);
            rest = tail;
        }
        let ret = Self::parse(&rest[1..]).map_err(|_| err())?;
        Ok((params, ret))
    }

    fn parse_prefix(s: &str) -> Result<(SourceType, &str), DescriptorError> {
        let err = || DescriptorError(s.to_string());
        let first = s.chars().next().ok_or_else(err)?;
        let rest = &s[first.len_utf8()..];
        let ty = match first {
            'Z' => SourceType::Boolean,
            'B' => SourceType::Byte,
            'C' => SourceType::Char,
            'S' => SourceType::Short,
            'I' => SourceType::Int,
            'J' => SourceType::Long,
            'F' => SourceType::Float,
            'D' => SourceType::Double,
            'V' => SourceType::Void,
            '[' => {
                let dims = s.bytes().take_while(|b| *b == b'[').count();
                if dims > MAX_ARRAY_DIMENSIONS {
                    return Err(err());
                }
                let (mut ty, tail) = Self::parse_prefix(&s[dims..])?;
                for _ in 0..dims {
                    ty = SourceType::Array(Box::new(ty));
                }
                return Ok((ty, tail));
            }
            'L' => {
                let end = rest.find(';').ok_or_else(err)?;
                return Ok((SourceType::Object(rest[..end].to_string()), &rest[end + 1..]));
            }
            _ => return Err(err()),
        };
        Ok((ty, rest))
    }

    /// Number of source slots a value of this type occupies.
    pub fn slot_width(&self) -> u16 {
        match self {
            SourceType::Long | SourceType::Double => 2,
            _ => 1,
        }
    }

    /// Floating point values have no representation on the target machine.
    pub fn is_supported(&self) -> bool {
        !matches!(self, SourceType::Float | SourceType::Double)
    }

    pub fn is_byte_array(&self) -> bool {
        matches!(self, SourceType::Array(inner) if **inner == SourceType::Byte)
    }

    pub fn to_parameter_type(&self) -> ContractParameterType {
        match self {
            SourceType::Boolean => ContractParameterType::Boolean,
            SourceType::Byte
            | SourceType::Char
            | SourceType::Short
            | SourceType::Int
            | SourceType::Long => ContractParameterType::Integer,
            SourceType::Void => ContractParameterType::Void,
            SourceType::Array(inner) if **inner == SourceType::Byte => {
                ContractParameterType::ByteArray
            }
            SourceType::Array(_) => ContractParameterType::Array,
            SourceType::Object(name) => match name.as_str() {
                "java/lang/String" => ContractParameterType::String,
                "java/lang/Integer" | "java/lang/Long" | "java/lang/Short" | "java/lang/Byte"
                | "java/lang/Character" | "java/math/BigInteger" => ContractParameterType::Integer,
                "java/lang/Boolean" => ContractParameterType::Boolean,
                n if n.ends_with("/Hash160") => ContractParameterType::Hash160,
                n if n.ends_with("/Hash256") => ContractParameterType::Hash256,
                n if n.ends_with("/ECPoint") => ContractParameterType::PublicKey,
                n if n.ends_with("/Map") => ContractParameterType::Map,
                n if n.ends_with("/List") => ContractParameterType::Array,
                n if n.ends_with("/InteropInterface") || n.ends_with("/Iterator") => {
                    ContractParameterType::InteropInterface
                }
                _ => ContractParameterType::Any,
            },
            SourceType::Float | SourceType::Double => ContractParameterType::Any,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Boolean => write!(f, "boolean"),
            SourceType::Byte => write!(f, "byte"),
            SourceType::Char => write!(f, "char"),
            SourceType::Short => write!(f, "short"),
            SourceType::Int => write!(f, "int"),
            SourceType::Long => write!(f, "long"),
            SourceType::Float => write!(f, "float"),
            SourceType::Double => write!(f, "double"),
            SourceType::Void => write!(f, "void"),
            SourceType::Object(name) => write!(f, "{}", name.replace('/', ".")),
            SourceType::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

/// Parameter and return types as they appear in the contract ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractParameterType {
    Any,
    Boolean,
    Integer,
    ByteArray,
    String,
    Hash160,
    Hash256,
    PublicKey,
    Signature,
    Array,
    Map,
    InteropInterface,
    Void,
}

impl fmt::Display for ContractParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
