// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// A destination that recorders mutate while an invocation is bound, and that yields the finished
/// record afterwards. `build` consumes the builder, so it runs at most once per recording session.
pub trait RecordBuilder {
    type Record;

    fn build(self) -> Self::Record;
}

/// Destination for consumers whose record needs no separate builder type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordHolder<T>(pub T);

impl<T> RecordHolder<T> {
    pub fn new(record: T) -> Self {
        Self(record)
    }
}

impl<T> RecordBuilder for RecordHolder<T> {
    type Record = T;

    fn build(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for RecordHolder<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> std::ops::DerefMut for RecordHolder<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
