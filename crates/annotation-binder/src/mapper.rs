// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The long-lived resolution surface for one schema.
//!
//! A [`Mapper`] populates its repository the first time anything is resolved through it and keeps
//! the frozen result for the rest of its life. It is meant to be built once and shared (read-only)
//! by every invocation bound against the schema; each invocation brings its own destination.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::{
    error::{MapperError, MappingError},
    location::{Location, ParamsLocation},
    parameter::{FormalParameter, TypeParameter},
    recorder::{CombinedChannel, LocationChannel, ValueChannel},
    repository::{MappingRepository, MappingRepositoryBuilder},
    value::ResolvedValue,
};

/// A consumer schema: registers a recorder for every parameter it wants to capture.
pub trait ArgumentSchema<R> {
    fn map_arguments(
        &self,
        repository: &mut MappingRepositoryBuilder<R>,
    ) -> Result<(), MappingError>;
}

impl<R, F> ArgumentSchema<R> for F
where
    F: Fn(&mut MappingRepositoryBuilder<R>) -> Result<(), MappingError>,
{
    fn map_arguments(
        &self,
        repository: &mut MappingRepositoryBuilder<R>,
    ) -> Result<(), MappingError> {
        self(repository)
    }
}

enum MapperState<R> {
    Uninitialized,
    Initializing,
    Ready(Arc<MappingRepository<R>>),
    Faulted(MappingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperStatus {
    Uninitialized,
    Initializing,
    Ready,
    Faulted,
}

/// Runs its schema once, on first use, and serves the frozen repository afterwards. A schema error
/// is remembered and returned from every later call. A schema panic leaves the mapper
/// uninitialized, so the next call runs the schema again.
pub struct Mapper<S, R> {
    schema: S,
    state: Mutex<MapperState<R>>,
}

impl<S, R> Mapper<S, R>
where
    S: ArgumentSchema<R>,
{
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            state: Mutex::new(MapperState::Uninitialized),
        }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn status(&self) -> MapperStatus {
        match &*self.lock_state() {
            MapperState::Uninitialized => MapperStatus::Uninitialized,
            MapperState::Initializing => MapperStatus::Initializing,
            MapperState::Ready(_) => MapperStatus::Ready,
            MapperState::Faulted(_) => MapperStatus::Faulted,
        }
    }

    /// Populates the repository if that has not happened yet. Idempotent; a failed population is
    /// remembered and reported again on every later call.
    pub fn initialize(&self) -> Result<(), MapperError> {
        self.repository().map(|_| ())
    }

    pub fn repository(&self) -> Result<Arc<MappingRepository<R>>, MapperError> {
        {
            let mut state = self.lock_state();
            match &*state {
                MapperState::Ready(repository) => return Ok(repository.clone()),
                MapperState::Faulted(error) => return Err(error.clone().into()),
                MapperState::Initializing => return Err(MapperError::InitializationInProgress),
                MapperState::Uninitialized => *state = MapperState::Initializing,
            }
        }

        // The lock is not held while the schema runs, so a schema that resolves through this
        // mapper observes `Initializing` instead of deadlocking.
        let mut builder = MappingRepositoryBuilder::new();
        let reset = ResetOnUnwind {
            state: &self.state,
            armed: true,
        };
        let populated = self.schema.map_arguments(&mut builder);
        reset.disarm();

        let mut state = self.lock_state();
        match populated {
            Ok(()) => {
                let repository = Arc::new(builder.build());
                debug!(
                    mappings = repository.len(),
                    "Initialized annotation argument mapping"
                );
                *state = MapperState::Ready(repository.clone());
                Ok(repository)
            }
            Err(error) => {
                debug!(%error, "Could not initialize annotation argument mapping");
                *state = MapperState::Faulted(error.clone());
                Err(error.into())
            }
        }
    }

    pub fn resolve_type_parameter<'d, D>(
        &self,
        parameter: &TypeParameter,
        destination: &'d mut D,
    ) -> Result<Option<BoundRecorder<'d, R, D>>, MapperError> {
        let repository = self.repository()?;
        Ok(repository
            .type_parameter(parameter)
            .map(|recorder| BoundRecorder::new(recorder.clone(), destination)))
    }

    pub fn resolve_constructor_parameter<'d, D>(
        &self,
        name: &str,
        destination: &'d mut D,
    ) -> Result<Option<BoundRecorder<'d, R, D>>, MapperError> {
        let repository = self.repository()?;
        Ok(repository
            .constructor_parameter(name)
            .map(|recorder| BoundRecorder::new(recorder.clone(), destination)))
    }

    pub fn resolve_named_parameter<'d, D>(
        &self,
        name: &str,
        destination: &'d mut D,
    ) -> Result<Option<BoundRecorder<'d, R, D>>, MapperError> {
        let repository = self.repository()?;
        Ok(repository
            .named_parameter(name)
            .map(|recorder| BoundRecorder::new(recorder.clone(), destination)))
    }

    pub fn resolve<'d, D>(
        &self,
        parameter: &FormalParameter,
        destination: &'d mut D,
    ) -> Result<Option<BoundRecorder<'d, R, D>>, MapperError> {
        match parameter {
            FormalParameter::Type(p) => self.resolve_type_parameter(p, destination),
            FormalParameter::Constructor(p) => self.resolve_constructor_parameter(&p.name, destination),
            FormalParameter::Named(p) => self.resolve_named_parameter(&p.name, destination),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, MapperState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A resolved recorder bound to the destination it will write to. Recording consumes it.
pub struct BoundRecorder<'d, R, D> {
    recorder: Arc<R>,
    destination: &'d mut D,
}

impl<'d, R, D> BoundRecorder<'d, R, D> {
    fn new(recorder: Arc<R>, destination: &'d mut D) -> Self {
        Self {
            recorder,
            destination,
        }
    }
}

impl<R: ValueChannel<D>, D> BoundRecorder<'_, R, D> {
    pub fn record_value(self, value: &ResolvedValue) -> bool {
        self.recorder
            .value_recorder()
            .record(self.destination, value)
    }

    pub fn record_params_value(self, value: &ResolvedValue) -> bool {
        self.recorder
            .value_recorder()
            .record_params(self.destination, value)
    }

    pub fn record_default_value(self, value: &ResolvedValue) -> bool {
        self.recorder
            .value_recorder()
            .record_default(self.destination, value)
    }
}

impl<R: LocationChannel<D>, D> BoundRecorder<'_, R, D> {
    pub fn record_location(self, location: &Location) -> bool {
        self.recorder
            .location_recorder()
            .record(self.destination, location)
    }

    pub fn record_params_location(self, location: &ParamsLocation) -> bool {
        self.recorder
            .location_recorder()
            .record_params(self.destination, location)
    }

    pub fn record_default_location(self) -> bool {
        self.recorder
            .location_recorder()
            .record_default(self.destination)
    }
}

impl<R: CombinedChannel<D>, D> BoundRecorder<'_, R, D> {
    pub fn record_combined(self, value: &ResolvedValue, location: &Location) -> bool {
        self.recorder
            .combined_recorder()
            .record(self.destination, value, location)
    }

    pub fn record_params_combined(self, value: &ResolvedValue, location: &ParamsLocation) -> bool {
        self.recorder
            .combined_recorder()
            .record_params(self.destination, value, location)
    }

    pub fn record_default_combined(self, value: &ResolvedValue) -> bool {
        self.recorder
            .combined_recorder()
            .record_default(self.destination, value)
    }
}

/// Puts a mapper back to `Uninitialized` if its schema panics, so the next resolution runs the
/// schema again instead of reporting `InitializationInProgress` forever.
struct ResetOnUnwind<'m, R> {
    state: &'m Mutex<MapperState<R>>,
    armed: bool,
}

impl<R> ResetOnUnwind<'_, R> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<R> Drop for ResetOnUnwind<'_, R> {
    fn drop(&mut self) {
        if self.armed {
            *self.state.lock().unwrap_or_else(PoisonError::into_inner) = MapperState::Uninitialized;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        parameter::ParameterKey,
        recorder::{self, ValueEntry},
    };
    use multiplatform_test::multiplatform_test;

    #[derive(Default)]
    struct Record {
        label: Option<String>,
        item_type: Option<String>,
    }

    #[derive(Default)]
    struct CountingSchema {
        populations: AtomicUsize,
    }

    impl ArgumentSchema<ValueEntry<Record>> for CountingSchema {
        fn map_arguments(
            &self,
            repository: &mut MappingRepositoryBuilder<ValueEntry<Record>>,
        ) -> Result<(), MappingError> {
            self.populations.fetch_add(1, Ordering::SeqCst);
            repository
                .add_named_parameter(
                    "Label",
                    recorder::value(|r: &mut Record, v: Option<String>| r.label = v),
                )?
                .add_type_parameter_by_ordinal(
                    0,
                    recorder::value(|r: &mut Record, t: crate::value::TypeHandle| {
                        r.item_type = Some(t.name)
                    }),
                )?;
            Ok(())
        }
    }

    #[multiplatform_test]
    fn populates_exactly_once() {
        let mapper = Mapper::new(CountingSchema::default());
        assert_eq!(mapper.status(), MapperStatus::Uninitialized);

        let mut record = Record::default();
        for _ in 0..3 {
            let bound = mapper
                .resolve_named_parameter("Label", &mut record)
                .unwrap()
                .unwrap();
            assert!(bound.record_value(&ResolvedValue::from("x")));
        }
        mapper.initialize().unwrap();
        assert!(
            mapper
                .resolve_named_parameter("Missing", &mut record)
                .unwrap()
                .is_none()
        );

        assert_eq!(mapper.schema().populations.load(Ordering::SeqCst), 1);
        assert_eq!(mapper.status(), MapperStatus::Ready);
        assert_eq!(record.label.as_deref(), Some("x"));

        let mut by_hand: MappingRepositoryBuilder<ValueEntry<Record>> =
            MappingRepositoryBuilder::new();
        CountingSchema::default()
            .map_arguments(&mut by_hand)
            .unwrap();
        assert_eq!(mapper.repository().unwrap().keys(), by_hand.build().keys());
    }

    #[multiplatform_test]
    fn resolves_type_parameters_by_ordinal() {
        let mapper = Mapper::new(CountingSchema::default());
        let mut record = Record::default();

        let bound = mapper
            .resolve(
                &FormalParameter::Type(TypeParameter::new(0, "T")),
                &mut record,
            )
            .unwrap()
            .unwrap();
        assert!(bound.record_value(&ResolvedValue::from(crate::value::TypeHandle::new(
            "System.Int32"
        ))));
        assert_eq!(record.item_type.as_deref(), Some("System.Int32"));

        assert!(
            mapper
                .resolve_type_parameter(&TypeParameter::new(1, "U"), &mut record)
                .unwrap()
                .is_none()
        );
    }

    #[multiplatform_test]
    fn failed_population_is_remembered() {
        let mapper = Mapper::new(
            |repository: &mut MappingRepositoryBuilder<()>| -> Result<(), MappingError> {
                repository.add(ParameterKey::TypeOrdinal(0), ())?;
                repository.add(ParameterKey::TypeName("T".to_string()), ())?;
                Ok(())
            },
        );

        let expected = MapperError::Mapping(MappingError::MixedTypeParameterKeys {
            existing: "ordinal",
            attempted: "name",
        });
        assert_eq!(mapper.initialize(), Err(expected.clone()));
        assert_eq!(mapper.status(), MapperStatus::Faulted);
        assert_eq!(
            mapper
                .resolve_named_parameter("anything", &mut ())
                .err(),
            Some(expected)
        );
    }

    #[multiplatform_test]
    fn reentrant_initialization_is_reported() {
        // The schema resolves through the mapper it belongs to.
        let slot: Arc<Mutex<Option<Arc<Mapper<SelfResolving, ()>>>>> = Arc::new(Mutex::new(None));
        let observed = Arc::new(Mutex::new(None));

        struct SelfResolving {
            mapper: Arc<Mutex<Option<Arc<Mapper<SelfResolving, ()>>>>>,
            observed: Arc<Mutex<Option<MapperError>>>,
        }

        impl ArgumentSchema<()> for SelfResolving {
            fn map_arguments(
                &self,
                _repository: &mut MappingRepositoryBuilder<()>,
            ) -> Result<(), MappingError> {
                let mapper = self.mapper.lock().unwrap().clone().unwrap();
                *self.observed.lock().unwrap() = mapper.initialize().err();
                Ok(())
            }
        }

        let mapper = Arc::new(Mapper::new(SelfResolving {
            mapper: slot.clone(),
            observed: observed.clone(),
        }));
        *slot.lock().unwrap() = Some(mapper.clone());

        mapper.initialize().unwrap();
        assert_eq!(
            *observed.lock().unwrap(),
            Some(MapperError::InitializationInProgress)
        );
        assert_eq!(mapper.status(), MapperStatus::Ready);

        // Break the reference cycle.
        slot.lock().unwrap().take();
    }

    #[cfg(not(target_family = "wasm"))]
    #[test]
    fn panicking_population_can_be_retried() {
        use std::panic::{AssertUnwindSafe, catch_unwind};
        use std::sync::atomic::AtomicBool;

        let panicked = AtomicBool::new(false);
        let mapper = Mapper::new(
            |repository: &mut MappingRepositoryBuilder<()>| -> Result<(), MappingError> {
                if !panicked.swap(true, Ordering::SeqCst) {
                    panic!("schema is not ready");
                }
                repository.add(ParameterKey::TypeOrdinal(0), ())?;
                Ok(())
            },
        );

        assert!(catch_unwind(AssertUnwindSafe(|| mapper.initialize())).is_err());
        assert_eq!(mapper.status(), MapperStatus::Uninitialized);

        mapper.initialize().unwrap();
        assert_eq!(mapper.status(), MapperStatus::Ready);
        assert_eq!(mapper.repository().unwrap().len(), 1);
    }
}
