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

//! Input handed over by the front-end: the methods to compile, their
//! instruction streams and the declarations they refer to.

use crate::instruction::Label;
use crate::opcode::OpCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const OBJECT_CONSTRUCTOR_ID: &str = "java/lang/Object.<init>()V";

pub fn method_id(owner: &str, name: &str, descriptor: &str) -> String {
    format!("{}.{}{}", owner, name, descriptor)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceProgram {
    /// Types whose public static methods form the contract's entry points.
    pub contract_types: Vec<String>,
    pub methods: Vec<SourceMethod>,
    #[serde(default)]
    pub natives: Vec<NativeMethod>,
    #[serde(default)]
    pub events: Vec<EventDecl>,
}

impl SourceProgram {
    pub fn index(&self) -> ProgramIndex<'_> {
        ProgramIndex {
            contract_types: &self.contract_types,
            methods: self.methods.iter().map(|m| (m.id(), m)).collect(),
            natives: self.natives.iter().map(|n| (n.id(), n)).collect(),
        }
    }
}

/// Id-keyed view over a `SourceProgram`.
#[derive(Debug)]
pub struct ProgramIndex<'a> {
    pub contract_types: &'a [String],
    methods: HashMap<String, &'a SourceMethod>,
    natives: HashMap<String, &'a NativeMethod>,
}

impl<'a> ProgramIndex<'a> {
    pub fn method(&self, id: &str) -> Option<&'a SourceMethod> {
        self.methods.get(id).copied()
    }

    pub fn native(&self, id: &str) -> Option<&'a NativeMethod> {
        self.natives.get(id).copied()
    }

    pub fn is_contract_type(&self, owner: &str) -> bool {
        self.contract_types.iter().any(|t| t == owner)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Access {
    #[serde(default)]
    pub public: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceMethod {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    /// Name under which the method is exposed, if it differs from `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub locals: Vec<LocalVar>,
    /// Number of source slots used by parameters and locals together.
    #[serde(default)]
    pub max_locals: u16,
    pub instructions: Vec<SourceInsn>,
}

impl SourceMethod {
    pub fn id(&self) -> String {
        method_id(&self.owner, &self.name, &self.descriptor)
    }

    pub fn has_receiver(&self) -> bool {
        !self.access.is_static
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalVar {
    pub name: String,
    pub index: u16,
    pub descriptor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodRef {
    pub fn new(owner: &str, name: &str, descriptor: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    pub fn id(&self) -> String {
        method_id(&self.owner, &self.name, &self.descriptor)
    }
}

/// A method without a compiled body; calls are replaced inline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeMethod {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub body: NativeBody,
}

impl NativeMethod {
    pub fn id(&self) -> String {
        method_id(&self.owner, &self.name, &self.descriptor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NativeBody {
    /// Interop service names, invoked in order.
    Syscalls(Vec<String>),
    Instructions(Vec<RawInstruction>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawInstruction {
    pub opcode: OpCode,
    #[serde(default)]
    pub operand: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDecl {
    /// Variable name the event is declared under.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub parameters: Vec<EventParam>,
}

impl EventDecl {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub descriptor: String,
}

// =============================================================================
// Instructions
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SourceInsn {
    Const(ConstInsn),
    Local(LocalInsn),
    Arith(ArithInsn),
    Bit(BitInsn),
    Branch(BranchInsn),
    Array(ArrayInsn),
    Object(ObjectInsn),
    Stack(StackInsn),
    Invoke(InvokeInsn),
    Control(ControlInsn),
    Convert(ConvertInsn),
    /// Jump target marker; applies to the next emitted instruction.
    Label(Label),
    /// Source line marker.
    Line(u32),
}

impl SourceInsn {
    pub fn is_marker(&self) -> bool {
        matches!(self, SourceInsn::Label(_) | SourceInsn::Line(_))
    }

    /// The value pushed by a small integer constant (`iconst_*`, `bipush`).
    pub fn small_int(&self) -> Option<i32> {
        match self {
            SourceInsn::Const(ConstInsn::IConst(v)) | SourceInsn::Const(ConstInsn::BiPush(v)) => {
                Some(*v as i32)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NumKind {
    Int,
    Long,
    Float,
    Double,
}

impl NumKind {
    pub fn is_integral(self) -> bool {
        matches!(self, NumKind::Int | NumKind::Long)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Ref,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ConstInsn {
    Null,
    /// `iconst_m1` .. `iconst_5`
    IConst(i8),
    BiPush(i8),
    SiPush(i16),
    LConst(i64),
    FConst(f64),
    Ldc(Constant),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f64),
    Double(f64),
    String(String),
    /// Arbitrary-precision integer, little-endian two's complement.
    BigInt(Vec<u8>),
    Class(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LocalInsn {
    Load { kind: ValueKind, index: u16 },
    Store { kind: ValueKind, index: u16 },
    Inc { index: u16, delta: i16 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArithInsn {
    Binary { op: ArithOp, kind: NumKind },
    Neg(NumKind),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BitOp {
    Shl,
    Shr,
    /// Unsigned (logical) right shift.
    UShr,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BitInsn {
    pub op: BitOp,
    pub kind: NumKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BranchInsn {
    /// Compares the top int against zero.
    IfZero { cond: Cond, target: Label },
    /// Compares the top two ints.
    IfCmp { cond: Cond, target: Label },
    IfRefEq { equal: bool, target: Label },
    IfNull { is_null: bool, target: Label },
    Goto(Label),
    /// `lcmp`, must be followed by an `IfZero`.
    LongCmp,
    FloatCmp,
    Switch,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ElemKind {
    /// Bytes and booleans share one store/load form.
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Ref,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArrayInsn {
    /// `newarray` with a primitive element descriptor.
    NewArray(String),
    NewObjectArray(String),
    MultiNewArray { descriptor: String, dims: u8 },
    Length,
    Load(ElemKind),
    Store(ElemKind),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ObjectInsn {
    /// Allocation of a simple value object with `fields` fields.
    New { owner: String, fields: u16 },
    /// Field access by the field's position within its owner type.
    GetField { owner: String, name: String, index: u16 },
    PutField { owner: String, name: String, index: u16 },
    GetStatic { owner: String, name: String },
    PutStatic { owner: String, name: String },
    CheckCast(String),
    InstanceOf(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StackInsn {
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Pop,
    Pop2,
    Swap,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvokeKind {
    Static,
    Virtual,
    Special,
    Interface,
    Dynamic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvokeInsn {
    pub kind: InvokeKind,
    pub method: MethodRef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ControlInsn {
    Return,
    Throw,
    MonitorEnter,
    MonitorExit,
    Nop,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConvertInsn {
    Widen { from: NumKind, to: NumKind },
    /// `i2b`, `i2c`, `i2s`
    Truncate(ElemKind),
}
