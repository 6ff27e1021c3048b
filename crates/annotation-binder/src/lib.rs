// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Typed binding of annotation arguments onto consumer records.
//!
//! A consumer describes which annotation parameters it cares about by implementing
//! [`ArgumentSchema`]: it registers a typed recorder per parameter in a
//! [`MappingRepositoryBuilder`]. A [`Mapper`] runs the schema once, freezes the result and then
//! hands out recording sessions over a destination record. A [`Binder`] walks an
//! [`AnnotationInvocation`] and records each argument through such a session, capturing values,
//! source locations, or both.

pub mod binding;
pub mod config;
pub mod error;
pub mod location;
pub mod logging_tracing;
pub mod mapper;
pub mod parameter;
pub mod record;
pub mod recorder;
pub mod repository;
pub mod surface;
pub mod type_guard;
pub mod value;

pub use binding::{
    AnnotationInvocation, ArgumentSyntax, BindOutcome, Binder, LocationResolver, NamedArgument,
    TypeArgument,
};
pub use config::{BinderConfig, EnvError, Environment, MapEnvironment, SystemEnvironment};
pub use error::{ArgumentSite, BindFailure, FailureReason, MapperError, MappingError};
pub use location::{CollectionLocation, FromLocation, Location, ParamsLocation, VariadicLocation};
pub use mapper::{ArgumentSchema, BoundRecorder, Mapper, MapperStatus};
pub use parameter::{
    ConstructorParameter, FormalParameter, NamedParameter, ParameterKey, TypeParameter,
};
pub use record::{RecordBuilder, RecordHolder};
pub use recorder::{AdaptiveEntry, CombinedEntry, LocationEntry, SplitEntry, ValueEntry};
pub use repository::{MappingRepository, MappingRepositoryBuilder, TypeParameterMappings};
pub use surface::{
    CombinedRecording, CombinedSession, LocationRecording, LocationSession, RecordOutcome,
    ValueRecording, ValueSession,
};
pub use type_guard::{AnnotationEnum, FromResolved, RecordResult};
pub use value::{EnumValue, ResolvedValue, TypeHandle, ValNumber};
