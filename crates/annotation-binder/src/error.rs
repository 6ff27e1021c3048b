// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use thiserror::Error;

use crate::parameter::FormalParameter;

/// Faults raised while a schema populates its mapping repository.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Type parameter at ordinal {0} is already mapped")]
    DuplicateTypeParameterOrdinal(usize),

    #[error("Type parameter `{0}` is already mapped")]
    DuplicateTypeParameterName(String),

    #[error(
        "Type parameters must be mapped either all by ordinal or all by name (cannot add {attempted} mapping to a repository keyed by {existing})"
    )]
    MixedTypeParameterKeys {
        existing: &'static str,
        attempted: &'static str,
    },

    #[error("Constructor parameter `{0}` is already mapped")]
    DuplicateConstructorParameter(String),

    #[error("Named parameter `{0}` is already mapped")]
    DuplicateNamedParameter(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapperError {
    #[error("Could not build the argument mapping: {0}")]
    Mapping(#[from] MappingError),

    // Observed when the schema's population step resolves through its own mapper, or when two
    // threads race through the first resolution.
    #[error("Argument mapping is still being initialized")]
    InitializationInProgress,
}

/// Why binding an invocation stopped early.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not bind {site}: {reason}")]
pub struct BindFailure {
    pub site: ArgumentSite,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentSite {
    Parameter(FormalParameter),
    /// The invocation as a whole (its arguments do not line up with the formal parameters).
    Invocation,
}

impl Display for ArgumentSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgumentSite::Parameter(parameter) => write!(f, "{parameter}"),
            ArgumentSite::Invocation => write!(f, "invocation"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("no recorder is mapped for it")]
    Unmapped,

    #[error("the argument was rejected")]
    Rejected,

    #[error("{0}")]
    Malformed(String),
}
