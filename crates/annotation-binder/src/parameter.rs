// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub ordinal: usize,
    pub name: String,
}

impl TypeParameter {
    pub fn new(ordinal: usize, name: impl Into<String>) -> Self {
        Self {
            ordinal,
            name: name.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructorParameter {
    pub name: String,
    pub ordinal: usize,
    /// Accepts a params-expanded run of trailing arguments (must be the last parameter).
    pub is_variadic: bool,
    /// Has a default value and may be omitted.
    pub is_optional: bool,
}

impl ConstructorParameter {
    pub fn required(ordinal: usize, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal,
            is_variadic: false,
            is_optional: false,
        }
    }

    pub fn optional(ordinal: usize, name: impl Into<String>) -> Self {
        Self {
            is_optional: true,
            ..Self::required(ordinal, name)
        }
    }

    pub fn variadic(ordinal: usize, name: impl Into<String>) -> Self {
        Self {
            is_variadic: true,
            ..Self::required(ordinal, name)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedParameter {
    pub name: String,
}

impl NamedParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormalParameter {
    Type(TypeParameter),
    Constructor(ConstructorParameter),
    Named(NamedParameter),
}

impl FormalParameter {
    pub fn name(&self) -> &str {
        match self {
            FormalParameter::Type(p) => &p.name,
            FormalParameter::Constructor(p) => &p.name,
            FormalParameter::Named(p) => &p.name,
        }
    }
}

impl Display for FormalParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormalParameter::Type(p) => write!(f, "type parameter `{}` (#{})", p.name, p.ordinal),
            FormalParameter::Constructor(p) => {
                write!(f, "constructor parameter `{}` (#{})", p.name, p.ordinal)
            }
            FormalParameter::Named(p) => write!(f, "named parameter `{}`", p.name),
        }
    }
}

/// The identity under which a recorder is registered in a mapping repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKey {
    TypeOrdinal(usize),
    TypeName(String),
    Constructor(String),
    Named(String),
}

impl Display for ParameterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterKey::TypeOrdinal(ordinal) => write!(f, "type parameter #{ordinal}"),
            ParameterKey::TypeName(name) => write!(f, "type parameter `{name}`"),
            ParameterKey::Constructor(name) => write!(f, "constructor parameter `{name}`"),
            ParameterKey::Named(name) => write!(f, "named parameter `{name}`"),
        }
    }
}
