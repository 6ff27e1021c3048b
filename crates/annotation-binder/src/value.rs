// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Values of annotation arguments as resolved by the host's semantic model.
//!
//! The host has already type-checked the invocation, so every argument arrives as a constant: a
//! scalar, a type handle, an enumeration constant, a list of those, or `null`. Adapters in
//! [`crate::type_guard`] pattern-match on this closed set instead of inspecting runtime types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum ValNumber {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl ValNumber {
    /// The integer value, if this is an integral number. Every integer width fits in an `i128`, so
    /// callers can narrow with `TryFrom` and reject anything that does not survive the conversion.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            ValNumber::I8(n) => Some(*n as i128),
            ValNumber::I16(n) => Some(*n as i128),
            ValNumber::I32(n) => Some(*n as i128),
            ValNumber::I64(n) => Some(*n as i128),
            ValNumber::U8(n) => Some(*n as i128),
            ValNumber::U16(n) => Some(*n as i128),
            ValNumber::U32(n) => Some(*n as i128),
            ValNumber::U64(n) => Some(*n as i128),
            ValNumber::F32(_) | ValNumber::F64(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|n| i64::try_from(n).ok())
    }

    /// The floating point value, if this is a floating point number (integers are not floats).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ValNumber::F32(n) => Some(*n as f64),
            ValNumber::F64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        self.as_i128().is_some()
    }
}

impl Display for ValNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValNumber::I8(n) => write!(f, "{n}"),
            ValNumber::I16(n) => write!(f, "{n}"),
            ValNumber::I32(n) => write!(f, "{n}"),
            ValNumber::I64(n) => write!(f, "{n}"),
            ValNumber::U8(n) => write!(f, "{n}"),
            ValNumber::U16(n) => write!(f, "{n}"),
            ValNumber::U32(n) => write!(f, "{n}"),
            ValNumber::U64(n) => write!(f, "{n}"),
            ValNumber::F32(n) => write!(f, "{n}"),
            ValNumber::F64(n) => write!(f, "{n}"),
        }
    }
}

macro_rules! number_from {
    ($($t:ty => $v:ident),* $(,)?) => {
        $(
            impl From<$t> for ValNumber {
                fn from(value: $t) -> Self {
                    ValNumber::$v(value)
                }
            }

            impl From<$t> for ResolvedValue {
                fn from(value: $t) -> Self {
                    ResolvedValue::Number(ValNumber::$v(value))
                }
            }
        )*
    };
}

number_from!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

/// An opaque handle to a type resolved by the host (type arguments and type-valued constants).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    pub name: String,
}

impl TypeHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Display for TypeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// An enumeration constant, carried with its underlying integer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnumValue {
    pub type_name: String,
    pub value: ValNumber,
}

impl EnumValue {
    pub fn new(type_name: impl Into<String>, value: impl Into<ValNumber>) -> Self {
        Self {
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ResolvedValue {
    Null,
    Bool(bool),
    Char(char),
    Number(ValNumber),
    String(String),
    Type(TypeHandle),
    Enum(EnumValue),
    List(Vec<ResolvedValue>),
}

impl ResolvedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ResolvedValue::Null)
    }

    pub fn as_list(&self) -> Option<&[ResolvedValue]> {
        match self {
            ResolvedValue::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// A short name for the kind of value, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedValue::Null => "null",
            ResolvedValue::Bool(_) => "bool",
            ResolvedValue::Char(_) => "char",
            ResolvedValue::Number(n) if n.is_integral() => "integer",
            ResolvedValue::Number(_) => "float",
            ResolvedValue::String(_) => "string",
            ResolvedValue::Type(_) => "type",
            ResolvedValue::Enum(_) => "enum",
            ResolvedValue::List(_) => "list",
        }
    }
}

impl Display for ResolvedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedValue::Null => write!(f, "null"),
            ResolvedValue::Bool(b) => write!(f, "{b}"),
            ResolvedValue::Char(c) => write!(f, "'{c}'"),
            ResolvedValue::Number(n) => write!(f, "{n}"),
            ResolvedValue::String(s) => write!(f, "\"{s}\""),
            ResolvedValue::Type(t) => write!(f, "typeof({t})"),
            ResolvedValue::Enum(e) => write!(f, "({}){}", e.type_name, e.value),
            ResolvedValue::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for ResolvedValue {
    fn from(value: bool) -> Self {
        ResolvedValue::Bool(value)
    }
}

impl From<char> for ResolvedValue {
    fn from(value: char) -> Self {
        ResolvedValue::Char(value)
    }
}

impl From<&str> for ResolvedValue {
    fn from(value: &str) -> Self {
        ResolvedValue::String(value.to_string())
    }
}

impl From<String> for ResolvedValue {
    fn from(value: String) -> Self {
        ResolvedValue::String(value)
    }
}

impl From<TypeHandle> for ResolvedValue {
    fn from(value: TypeHandle) -> Self {
        ResolvedValue::Type(value)
    }
}

impl From<EnumValue> for ResolvedValue {
    fn from(value: EnumValue) -> Self {
        ResolvedValue::Enum(value)
    }
}

impl<T: Into<ResolvedValue>> From<Option<T>> for ResolvedValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ResolvedValue::Null)
    }
}

impl<T: Into<ResolvedValue>> From<Vec<T>> for ResolvedValue {
    fn from(value: Vec<T>) -> Self {
        ResolvedValue::List(value.into_iter().map(Into::into).collect())
    }
}
