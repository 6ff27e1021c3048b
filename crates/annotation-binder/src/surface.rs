// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Recording surfaces: what a binding driver calls, once per argument, to record an invocation.
//!
//! A session pairs a [`Mapper`] with one destination. Which sessions a mapper can produce follows
//! from its entry type: value sessions need [`ValueChannel`] entries, location sessions need
//! [`LocationChannel`] entries and combined sessions need [`CombinedChannel`] entries. A mapper over
//! [`SplitEntry`](crate::recorder::SplitEntry) therefore offers value and location sessions over the
//! same schema, and one over [`AdaptiveEntry`](crate::recorder::AdaptiveEntry) offers combined and
//! value sessions.

use crate::{
    error::MapperError,
    location::{Location, ParamsLocation},
    mapper::{ArgumentSchema, BoundRecorder, Mapper},
    parameter::{ConstructorParameter, NamedParameter, TypeParameter},
    record::RecordBuilder,
    recorder::{CombinedChannel, LocationChannel, ValueChannel},
    value::ResolvedValue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// The argument failed its type guard, or the recorder reported a domain failure.
    Rejected,
    /// The schema has no recorder for the parameter.
    Unmapped,
}

impl RecordOutcome {
    fn of<'d, R, D>(
        bound: Option<BoundRecorder<'d, R, D>>,
        record: impl FnOnce(BoundRecorder<'d, R, D>) -> bool,
    ) -> Self {
        match bound {
            Some(bound) => {
                if record(bound) {
                    RecordOutcome::Recorded
                } else {
                    RecordOutcome::Rejected
                }
            }
            None => RecordOutcome::Unmapped,
        }
    }
}

pub trait ValueRecording {
    fn record_type_argument(
        &mut self,
        parameter: &TypeParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_default_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_named_argument(
        &mut self,
        parameter: &NamedParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError>;
}

pub trait LocationRecording {
    fn record_type_argument(
        &mut self,
        parameter: &TypeParameter,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        location: &ParamsLocation,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_default_argument(
        &mut self,
        parameter: &ConstructorParameter,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_named_argument(
        &mut self,
        parameter: &NamedParameter,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError>;
}

pub trait CombinedRecording {
    fn record_type_argument(
        &mut self,
        parameter: &TypeParameter,
        value: &ResolvedValue,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        location: &ParamsLocation,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_default_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError>;

    fn record_named_argument(
        &mut self,
        parameter: &NamedParameter,
        value: &ResolvedValue,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError>;
}

macro_rules! session {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<'m, S, R, D> {
            mapper: &'m Mapper<S, R>,
            destination: D,
        }

        impl<S, R, D> $name<'_, S, R, D> {
            pub fn destination(&self) -> &D {
                &self.destination
            }

            /// Ends the session without building, e.g. to hand the destination to the next pass of
            /// a split extraction.
            pub fn into_destination(self) -> D {
                self.destination
            }

            pub fn finish(self) -> D::Record
            where
                D: RecordBuilder,
            {
                self.destination.build()
            }
        }
    };
}

session!(
    /// Records resolved values only.
    ValueSession
);
session!(
    /// Records source locations only.
    LocationSession
);
session!(
    /// Records each value together with its location.
    CombinedSession
);

impl<S, R> Mapper<S, R>
where
    S: ArgumentSchema<R>,
{
    pub fn value_session<D>(&self, destination: D) -> ValueSession<'_, S, R, D>
    where
        R: ValueChannel<D>,
    {
        ValueSession {
            mapper: self,
            destination,
        }
    }

    pub fn location_session<D>(&self, destination: D) -> LocationSession<'_, S, R, D>
    where
        R: LocationChannel<D>,
    {
        LocationSession {
            mapper: self,
            destination,
        }
    }

    pub fn combined_session<D>(&self, destination: D) -> CombinedSession<'_, S, R, D>
    where
        R: CombinedChannel<D>,
    {
        CombinedSession {
            mapper: self,
            destination,
        }
    }
}

impl<S, R, D> ValueRecording for ValueSession<'_, S, R, D>
where
    S: ArgumentSchema<R>,
    R: ValueChannel<D>,
{
    fn record_type_argument(
        &mut self,
        parameter: &TypeParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_type_parameter(parameter, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_value(value)))
    }

    fn record_constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_value(value)))
    }

    fn record_params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_params_value(value)))
    }

    fn record_default_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_default_value(value)))
    }

    fn record_named_argument(
        &mut self,
        parameter: &NamedParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_named_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_value(value)))
    }
}

impl<S, R, D> LocationRecording for LocationSession<'_, S, R, D>
where
    S: ArgumentSchema<R>,
    R: LocationChannel<D>,
{
    fn record_type_argument(
        &mut self,
        parameter: &TypeParameter,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_type_parameter(parameter, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_location(location)))
    }

    fn record_constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_location(location)))
    }

    fn record_params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        location: &ParamsLocation,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_params_location(location)))
    }

    fn record_default_argument(
        &mut self,
        parameter: &ConstructorParameter,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_default_location()))
    }

    fn record_named_argument(
        &mut self,
        parameter: &NamedParameter,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_named_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_location(location)))
    }
}

impl<S, R, D> CombinedRecording for CombinedSession<'_, S, R, D>
where
    S: ArgumentSchema<R>,
    R: CombinedChannel<D>,
{
    fn record_type_argument(
        &mut self,
        parameter: &TypeParameter,
        value: &ResolvedValue,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_type_parameter(parameter, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_combined(value, location)))
    }

    fn record_constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_combined(value, location)))
    }

    fn record_params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        location: &ParamsLocation,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| {
            b.record_params_combined(value, location)
        }))
    }

    fn record_default_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_constructor_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_default_combined(value)))
    }

    fn record_named_argument(
        &mut self,
        parameter: &NamedParameter,
        value: &ResolvedValue,
        location: &Location,
    ) -> Result<RecordOutcome, MapperError> {
        let bound = self
            .mapper
            .resolve_named_parameter(&parameter.name, &mut self.destination)?;
        Ok(RecordOutcome::of(bound, |b| b.record_combined(value, location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::MappingError,
        record::RecordHolder,
        recorder::{self, ValueEntry},
        repository::MappingRepositoryBuilder,
    };
    use multiplatform_test::multiplatform_test;

    #[derive(Default, Debug, PartialEq)]
    struct Limits {
        max: Option<u32>,
    }

    fn schema(
        repository: &mut MappingRepositoryBuilder<ValueEntry<RecordHolder<Limits>>>,
    ) -> Result<(), MappingError> {
        repository.add_constructor_parameter(
            "max",
            recorder::value(|r: &mut RecordHolder<Limits>, max: u32| {
                if max == 0 {
                    return false;
                }
                r.max = Some(max);
                true
            }),
        )?;
        Ok(())
    }

    #[multiplatform_test]
    fn outcomes() {
        let mapper = Mapper::new(schema);
        let max = ConstructorParameter::required(0, "max");

        let mut session = mapper.value_session(RecordHolder::<Limits>::default());
        assert_eq!(
            session.record_constructor_argument(&max, &ResolvedValue::from("ten")),
            Ok(RecordOutcome::Rejected)
        );
        assert_eq!(
            session.record_constructor_argument(&max, &ResolvedValue::from(0)),
            Ok(RecordOutcome::Rejected)
        );
        assert_eq!(
            session.record_named_argument(&NamedParameter::new("max"), &ResolvedValue::from(1)),
            Ok(RecordOutcome::Unmapped)
        );
        assert_eq!(session.destination().max, None);

        assert_eq!(
            session.record_constructor_argument(&max, &ResolvedValue::from(10u8)),
            Ok(RecordOutcome::Recorded)
        );
        assert_eq!(session.finish(), Limits { max: Some(10) });
    }
}
