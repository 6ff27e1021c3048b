// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Recorders: the callbacks a schema registers for its parameters.
//!
//! There is one recorder trait per channel:
//! - [`ValueRecorder`] receives resolved values only.
//! - [`LocationRecorder`] receives source locations only.
//! - [`CombinedRecorder`] receives a value together with its location in a single call, so a
//!   destination never holds a value without its location or vice versa.
//!
//! Each trait has one method per way an argument can reach a constructor parameter (normal,
//! params-expanded, omitted in favour of its default). Type and named parameters only ever use
//! `record`. The typed implementations are built with [`value`], [`location`], [`combined`] and
//! their `_with_default` variants, which wrap the callback in the relevant type guards.
//!
//! A repository stores one *entry* per parameter. Entries decide which recording surfaces a mapper
//! can produce: [`SplitEntry`] serves both the value and the location channel (for two-pass
//! extraction), and [`AdaptiveEntry`] serves the combined and the value channel (for consumers that
//! sometimes lack syntax).

use std::marker::PhantomData;

use tracing::trace;

use crate::{
    location::{FromLocation, Location, ParamsLocation},
    type_guard::{FromResolved, RecordResult, TypeGuard},
    value::ResolvedValue,
};

pub trait ValueRecorder<D>: Send + Sync {
    fn record(&self, destination: &mut D, value: &ResolvedValue) -> bool;

    /// Records trailing arguments packed into a variadic parameter (`value` is the packed list).
    fn record_params(&self, destination: &mut D, value: &ResolvedValue) -> bool {
        self.record(destination, value)
    }

    /// Notification that an optional parameter was omitted; `value` is the schema's default.
    fn record_default(&self, destination: &mut D, value: &ResolvedValue) -> bool {
        self.record(destination, value)
    }
}

pub trait LocationRecorder<D>: Send + Sync {
    fn record(&self, destination: &mut D, location: &Location) -> bool;

    fn record_params(&self, destination: &mut D, location: &ParamsLocation) -> bool;

    /// An omitted argument has no location; the notification is accepted by default.
    fn record_default(&self, _destination: &mut D) -> bool {
        true
    }
}

pub trait CombinedRecorder<D>: Send + Sync {
    fn record(&self, destination: &mut D, value: &ResolvedValue, location: &Location) -> bool;

    fn record_params(
        &self,
        destination: &mut D,
        value: &ResolvedValue,
        location: &ParamsLocation,
    ) -> bool;

    /// An omitted argument has a value but no location. Accepted without recording anything
    /// unless the recorder was built with a default callback.
    fn record_default(&self, _destination: &mut D, _value: &ResolvedValue) -> bool {
        true
    }
}

pub struct TypedValueRecorder<T, F> {
    guard: TypeGuard<T, F>,
}

impl<D, T, F, R> ValueRecorder<D> for TypedValueRecorder<T, F>
where
    T: FromResolved,
    F: Fn(&mut D, T) -> R + Send + Sync,
    R: RecordResult,
{
    fn record(&self, destination: &mut D, value: &ResolvedValue) -> bool {
        self.guard.invoke(destination, value)
    }
}

pub struct TypedLocationRecorder<L, F> {
    callback: F,
    _expected: PhantomData<fn() -> L>,
}

impl<L: FromLocation, F> TypedLocationRecorder<L, F> {
    fn forward<D, R>(&self, destination: &mut D, location: Option<L>) -> bool
    where
        F: Fn(&mut D, L) -> R,
        R: RecordResult,
    {
        match location {
            Some(location) => (self.callback)(destination, location).succeeded(),
            None => {
                trace!(expected = L::describe(), "Location rejected by type guard");
                false
            }
        }
    }
}

impl<D, L, F, R> LocationRecorder<D> for TypedLocationRecorder<L, F>
where
    L: FromLocation,
    F: Fn(&mut D, L) -> R + Send + Sync,
    R: RecordResult,
{
    fn record(&self, destination: &mut D, location: &Location) -> bool {
        self.forward(destination, L::from_location(location))
    }

    fn record_params(&self, destination: &mut D, location: &ParamsLocation) -> bool {
        self.forward(destination, L::from_params(location))
    }
}

pub struct TypedCombinedRecorder<T, L, F> {
    callback: F,
    _expected: PhantomData<fn() -> (T, L)>,
}

impl<T: FromResolved, L: FromLocation, F> TypedCombinedRecorder<T, L, F> {
    // Both guards must pass before the callback sees either half.
    fn forward<D, R>(
        &self,
        destination: &mut D,
        value: &ResolvedValue,
        location: Option<L>,
    ) -> bool
    where
        F: Fn(&mut D, T, L) -> R,
        R: RecordResult,
    {
        match (T::from_resolved(value), location) {
            (Some(value), Some(location)) => (self.callback)(destination, value, location).succeeded(),
            (typed, location) => {
                trace!(
                    expected_value = %T::describe(),
                    actual_value = value.kind(),
                    value_accepted = typed.is_some(),
                    expected_location = L::describe(),
                    location_accepted = location.is_some(),
                    "Argument rejected by type guard"
                );
                false
            }
        }
    }
}

impl<D, T, L, F, R> CombinedRecorder<D> for TypedCombinedRecorder<T, L, F>
where
    T: FromResolved,
    L: FromLocation,
    F: Fn(&mut D, T, L) -> R + Send + Sync,
    R: RecordResult,
{
    fn record(&self, destination: &mut D, value: &ResolvedValue, location: &Location) -> bool {
        self.forward(destination, value, L::from_location(location))
    }

    fn record_params(
        &self,
        destination: &mut D,
        value: &ResolvedValue,
        location: &ParamsLocation,
    ) -> bool {
        self.forward(destination, value, L::from_params(location))
    }
}

/// A recorder whose default-argument notifications go to a dedicated callback.
pub struct WithDefault<Inner, T, G> {
    inner: Inner,
    default: TypeGuard<T, G>,
}

impl<D, Inner, T, G, R> ValueRecorder<D> for WithDefault<Inner, T, G>
where
    Inner: ValueRecorder<D>,
    T: FromResolved,
    G: Fn(&mut D, T) -> R + Send + Sync,
    R: RecordResult,
{
    fn record(&self, destination: &mut D, value: &ResolvedValue) -> bool {
        self.inner.record(destination, value)
    }

    fn record_params(&self, destination: &mut D, value: &ResolvedValue) -> bool {
        self.inner.record_params(destination, value)
    }

    fn record_default(&self, destination: &mut D, value: &ResolvedValue) -> bool {
        self.default.invoke(destination, value)
    }
}

impl<D, Inner, T, G, R> CombinedRecorder<D> for WithDefault<Inner, T, G>
where
    Inner: CombinedRecorder<D>,
    T: FromResolved,
    G: Fn(&mut D, T) -> R + Send + Sync,
    R: RecordResult,
{
    fn record(&self, destination: &mut D, value: &ResolvedValue, location: &Location) -> bool {
        self.inner.record(destination, value, location)
    }

    fn record_params(
        &self,
        destination: &mut D,
        value: &ResolvedValue,
        location: &ParamsLocation,
    ) -> bool {
        self.inner.record_params(destination, value, location)
    }

    fn record_default(&self, destination: &mut D, value: &ResolvedValue) -> bool {
        self.default.invoke(destination, value)
    }
}

pub type ValueEntry<D> = Box<dyn ValueRecorder<D>>;
pub type LocationEntry<D> = Box<dyn LocationRecorder<D>>;
pub type CombinedEntry<D> = Box<dyn CombinedRecorder<D>>;

pub fn value<D, T, F, R>(callback: F) -> ValueEntry<D>
where
    T: FromResolved + 'static,
    F: Fn(&mut D, T) -> R + Send + Sync + 'static,
    R: RecordResult + 'static,
{
    Box::new(TypedValueRecorder {
        guard: TypeGuard::new(callback),
    })
}

pub fn value_with_default<D, T, F, R, G, RG>(callback: F, default: G) -> ValueEntry<D>
where
    T: FromResolved + 'static,
    F: Fn(&mut D, T) -> R + Send + Sync + 'static,
    R: RecordResult + 'static,
    G: Fn(&mut D, T) -> RG + Send + Sync + 'static,
    RG: RecordResult + 'static,
{
    Box::new(WithDefault {
        inner: TypedValueRecorder {
            guard: TypeGuard::<T, F>::new(callback),
        },
        default: TypeGuard::<T, G>::new(default),
    })
}

pub fn location<D, L, F, R>(callback: F) -> LocationEntry<D>
where
    L: FromLocation + 'static,
    F: Fn(&mut D, L) -> R + Send + Sync + 'static,
    R: RecordResult + 'static,
{
    Box::new(TypedLocationRecorder {
        callback,
        _expected: PhantomData,
    })
}

pub fn combined<D, T, L, F, R>(callback: F) -> CombinedEntry<D>
where
    T: FromResolved + 'static,
    L: FromLocation + 'static,
    F: Fn(&mut D, T, L) -> R + Send + Sync + 'static,
    R: RecordResult + 'static,
{
    Box::new(TypedCombinedRecorder {
        callback,
        _expected: PhantomData,
    })
}

pub fn combined_with_default<D, T, L, F, R, G, RG>(callback: F, default: G) -> CombinedEntry<D>
where
    T: FromResolved + 'static,
    L: FromLocation + 'static,
    F: Fn(&mut D, T, L) -> R + Send + Sync + 'static,
    R: RecordResult + 'static,
    G: Fn(&mut D, T) -> RG + Send + Sync + 'static,
    RG: RecordResult + 'static,
{
    Box::new(WithDefault {
        inner: TypedCombinedRecorder::<T, L, F> {
            callback,
            _expected: PhantomData,
        },
        default: TypeGuard::<T, G>::new(default),
    })
}

/// Entries that can serve the value channel.
pub trait ValueChannel<D> {
    fn value_recorder(&self) -> &dyn ValueRecorder<D>;
}

/// Entries that can serve the location channel.
pub trait LocationChannel<D> {
    fn location_recorder(&self) -> &dyn LocationRecorder<D>;
}

/// Entries that can serve the combined channel.
pub trait CombinedChannel<D> {
    fn combined_recorder(&self) -> &dyn CombinedRecorder<D>;
}

impl<D> ValueChannel<D> for ValueEntry<D> {
    fn value_recorder(&self) -> &dyn ValueRecorder<D> {
        &**self
    }
}

impl<D> LocationChannel<D> for LocationEntry<D> {
    fn location_recorder(&self) -> &dyn LocationRecorder<D> {
        &**self
    }
}

impl<D> CombinedChannel<D> for CombinedEntry<D> {
    fn combined_recorder(&self) -> &dyn CombinedRecorder<D> {
        &**self
    }
}

/// Value and location recorders for one parameter, driven in separate passes.
pub struct SplitEntry<D> {
    pub value: ValueEntry<D>,
    pub location: LocationEntry<D>,
}

pub fn split<D>(value: ValueEntry<D>, location: LocationEntry<D>) -> SplitEntry<D> {
    SplitEntry { value, location }
}

impl<D> ValueChannel<D> for SplitEntry<D> {
    fn value_recorder(&self) -> &dyn ValueRecorder<D> {
        &*self.value
    }
}

impl<D> LocationChannel<D> for SplitEntry<D> {
    fn location_recorder(&self) -> &dyn LocationRecorder<D> {
        &*self.location
    }
}

/// Combined and value-only recorders for one parameter; a mapper over these entries can record
/// with or without syntax.
pub struct AdaptiveEntry<D> {
    pub combined: CombinedEntry<D>,
    pub value: ValueEntry<D>,
}

pub fn adaptive<D>(combined: CombinedEntry<D>, value: ValueEntry<D>) -> AdaptiveEntry<D> {
    AdaptiveEntry { combined, value }
}

impl<D> CombinedChannel<D> for AdaptiveEntry<D> {
    fn combined_recorder(&self) -> &dyn CombinedRecorder<D> {
        &*self.combined
    }
}

impl<D> ValueChannel<D> for AdaptiveEntry<D> {
    fn value_recorder(&self) -> &dyn ValueRecorder<D> {
        &*self.value
    }
}
