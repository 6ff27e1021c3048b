// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Lookup from formal parameters to the recorders registered for them.
//!
//! A [`MappingRepositoryBuilder`] is populated once by a schema and then consumed by
//! [`MappingRepositoryBuilder::build`] into an immutable [`MappingRepository`]. Since `build` takes
//! the builder by value, neither adding to a frozen repository nor building twice can be expressed.
//! Consumers that need several repositories from the same registrations can clone the builder
//! (recorders are shared, not copied).
//!
//! Type parameters are keyed either all by ordinal or all by name. The choice is made by the first
//! registration and any attempt to mix the two is an error, so a type parameter can never match
//! two recorders at once.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use crate::{
    error::MappingError,
    parameter::{FormalParameter, ParameterKey, TypeParameter},
};

pub enum TypeParameterMappings<R> {
    Unmapped,
    ByOrdinal(BTreeMap<usize, Arc<R>>),
    ByName(HashMap<String, Arc<R>>),
}

impl<R> TypeParameterMappings<R> {
    fn kind(&self) -> &'static str {
        match self {
            TypeParameterMappings::Unmapped => "nothing",
            TypeParameterMappings::ByOrdinal(_) => "ordinal",
            TypeParameterMappings::ByName(_) => "name",
        }
    }

    fn len(&self) -> usize {
        match self {
            TypeParameterMappings::Unmapped => 0,
            TypeParameterMappings::ByOrdinal(map) => map.len(),
            TypeParameterMappings::ByName(map) => map.len(),
        }
    }

    pub fn get(&self, parameter: &TypeParameter) -> Option<&Arc<R>> {
        match self {
            TypeParameterMappings::Unmapped => None,
            TypeParameterMappings::ByOrdinal(map) => map.get(&parameter.ordinal),
            TypeParameterMappings::ByName(map) => map.get(&parameter.name),
        }
    }

    fn keys(&self) -> Vec<ParameterKey> {
        match self {
            TypeParameterMappings::Unmapped => vec![],
            TypeParameterMappings::ByOrdinal(map) => {
                map.keys().map(|o| ParameterKey::TypeOrdinal(*o)).collect()
            }
            TypeParameterMappings::ByName(map) => map
                .keys()
                .map(|n| ParameterKey::TypeName(n.clone()))
                .collect(),
        }
    }
}

impl<R> Clone for TypeParameterMappings<R> {
    fn clone(&self) -> Self {
        match self {
            TypeParameterMappings::Unmapped => TypeParameterMappings::Unmapped,
            TypeParameterMappings::ByOrdinal(map) => TypeParameterMappings::ByOrdinal(map.clone()),
            TypeParameterMappings::ByName(map) => TypeParameterMappings::ByName(map.clone()),
        }
    }
}

pub struct MappingRepositoryBuilder<R> {
    type_parameters: TypeParameterMappings<R>,
    constructor_parameters: HashMap<String, Arc<R>>,
    named_parameters: HashMap<String, Arc<R>>,
}

impl<R> Default for MappingRepositoryBuilder<R> {
    fn default() -> Self {
        Self {
            type_parameters: TypeParameterMappings::Unmapped,
            constructor_parameters: HashMap::new(),
            named_parameters: HashMap::new(),
        }
    }
}

impl<R> Clone for MappingRepositoryBuilder<R> {
    fn clone(&self) -> Self {
        Self {
            type_parameters: self.type_parameters.clone(),
            constructor_parameters: self.constructor_parameters.clone(),
            named_parameters: self.named_parameters.clone(),
        }
    }
}

impl<R> MappingRepositoryBuilder<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: ParameterKey, recorder: R) -> Result<&mut Self, MappingError> {
        let recorder = Arc::new(recorder);

        match key {
            ParameterKey::TypeOrdinal(ordinal) => {
                if let TypeParameterMappings::Unmapped = self.type_parameters {
                    self.type_parameters = TypeParameterMappings::ByOrdinal(BTreeMap::new());
                }
                match &mut self.type_parameters {
                    TypeParameterMappings::ByOrdinal(map) => {
                        if map.contains_key(&ordinal) {
                            return Err(MappingError::DuplicateTypeParameterOrdinal(ordinal));
                        }
                        map.insert(ordinal, recorder);
                    }
                    existing => {
                        return Err(MappingError::MixedTypeParameterKeys {
                            existing: existing.kind(),
                            attempted: "ordinal",
                        });
                    }
                }
            }
            ParameterKey::TypeName(name) => {
                if let TypeParameterMappings::Unmapped = self.type_parameters {
                    self.type_parameters = TypeParameterMappings::ByName(HashMap::new());
                }
                match &mut self.type_parameters {
                    TypeParameterMappings::ByName(map) => {
                        if map.contains_key(&name) {
                            return Err(MappingError::DuplicateTypeParameterName(name));
                        }
                        map.insert(name, recorder);
                    }
                    existing => {
                        return Err(MappingError::MixedTypeParameterKeys {
                            existing: existing.kind(),
                            attempted: "name",
                        });
                    }
                }
            }
            ParameterKey::Constructor(name) => {
                if self.constructor_parameters.contains_key(&name) {
                    return Err(MappingError::DuplicateConstructorParameter(name));
                }
                self.constructor_parameters.insert(name, recorder);
            }
            ParameterKey::Named(name) => {
                if self.named_parameters.contains_key(&name) {
                    return Err(MappingError::DuplicateNamedParameter(name));
                }
                self.named_parameters.insert(name, recorder);
            }
        }

        Ok(self)
    }

    pub fn add_type_parameter_by_ordinal(
        &mut self,
        ordinal: usize,
        recorder: R,
    ) -> Result<&mut Self, MappingError> {
        self.add(ParameterKey::TypeOrdinal(ordinal), recorder)
    }

    pub fn add_type_parameter_by_name(
        &mut self,
        name: &str,
        recorder: R,
    ) -> Result<&mut Self, MappingError> {
        self.add(ParameterKey::TypeName(name.to_string()), recorder)
    }

    pub fn add_constructor_parameter(
        &mut self,
        name: &str,
        recorder: R,
    ) -> Result<&mut Self, MappingError> {
        self.add(ParameterKey::Constructor(name.to_string()), recorder)
    }

    pub fn add_named_parameter(
        &mut self,
        name: &str,
        recorder: R,
    ) -> Result<&mut Self, MappingError> {
        self.add(ParameterKey::Named(name.to_string()), recorder)
    }

    pub fn build(self) -> MappingRepository<R> {
        MappingRepository {
            type_parameters: self.type_parameters,
            constructor_parameters: self.constructor_parameters,
            named_parameters: self.named_parameters,
        }
    }
}

/// A frozen mapping repository. Lookups never fail: an unmapped parameter is simply `None`.
pub struct MappingRepository<R> {
    type_parameters: TypeParameterMappings<R>,
    constructor_parameters: HashMap<String, Arc<R>>,
    named_parameters: HashMap<String, Arc<R>>,
}

impl<R> MappingRepository<R> {
    pub fn type_parameters(&self) -> &TypeParameterMappings<R> {
        &self.type_parameters
    }

    pub fn type_parameter(&self, parameter: &TypeParameter) -> Option<&Arc<R>> {
        self.type_parameters.get(parameter)
    }

    pub fn constructor_parameter(&self, name: &str) -> Option<&Arc<R>> {
        self.constructor_parameters.get(name)
    }

    pub fn named_parameter(&self, name: &str) -> Option<&Arc<R>> {
        self.named_parameters.get(name)
    }

    pub fn get(&self, parameter: &FormalParameter) -> Option<&Arc<R>> {
        match parameter {
            FormalParameter::Type(p) => self.type_parameter(p),
            FormalParameter::Constructor(p) => self.constructor_parameter(&p.name),
            FormalParameter::Named(p) => self.named_parameter(&p.name),
        }
    }

    pub fn len(&self) -> usize {
        self.type_parameters.len() + self.constructor_parameters.len() + self.named_parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<ParameterKey> {
        let mut keys = self.type_parameters.keys();
        keys.extend(
            self.constructor_parameters
                .keys()
                .map(|name| ParameterKey::Constructor(name.clone())),
        );
        keys.extend(
            self.named_parameters
                .keys()
                .map(|name| ParameterKey::Named(name.clone())),
        );
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{ConstructorParameter, NamedParameter};
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn lookups() {
        let mut builder = MappingRepositoryBuilder::new();
        builder
            .add_type_parameter_by_ordinal(1, "second type")
            .unwrap()
            .add_constructor_parameter("value", "value")
            .unwrap()
            .add_named_parameter("Label", "label")
            .unwrap();
        let repository = builder.build();

        assert_eq!(repository.len(), 3);
        assert_eq!(
            repository
                .type_parameter(&TypeParameter::new(1, "T"))
                .map(|r| **r),
            Some("second type")
        );
        assert!(
            repository
                .type_parameter(&TypeParameter::new(0, "T"))
                .is_none()
        );
        assert_eq!(
            repository
                .get(&FormalParameter::Constructor(ConstructorParameter::required(
                    0, "value"
                )))
                .map(|r| **r),
            Some("value")
        );
        assert_eq!(
            repository
                .get(&FormalParameter::Named(NamedParameter::new("Label")))
                .map(|r| **r),
            Some("label")
        );
        // Names are matched exactly.
        assert!(repository.named_parameter("label").is_none());
        assert!(repository.constructor_parameter("Label").is_none());
    }

    #[multiplatform_test]
    fn type_parameters_by_name() {
        let mut builder = MappingRepositoryBuilder::new();
        builder.add_type_parameter_by_name("TKey", 1).unwrap();
        let repository = builder.build();

        assert_eq!(
            repository
                .type_parameter(&TypeParameter::new(3, "TKey"))
                .map(|r| **r),
            Some(1)
        );
        assert!(matches!(
            repository.type_parameters(),
            TypeParameterMappings::ByName(_)
        ));
    }

    #[multiplatform_test]
    fn mixing_type_parameter_keys_fails_in_either_order() {
        let mut by_ordinal_first = MappingRepositoryBuilder::new();
        by_ordinal_first.add_type_parameter_by_ordinal(0, ()).unwrap();
        assert_eq!(
            by_ordinal_first
                .add_type_parameter_by_name("T", ())
                .err(),
            Some(MappingError::MixedTypeParameterKeys {
                existing: "ordinal",
                attempted: "name"
            })
        );

        let mut by_name_first = MappingRepositoryBuilder::new();
        by_name_first.add_type_parameter_by_name("T", ()).unwrap();
        assert_eq!(
            by_name_first.add_type_parameter_by_ordinal(0, ()).err(),
            Some(MappingError::MixedTypeParameterKeys {
                existing: "name",
                attempted: "ordinal"
            })
        );
    }

    #[multiplatform_test]
    fn duplicates_are_rejected() {
        let mut builder = MappingRepositoryBuilder::new();
        builder.add_type_parameter_by_ordinal(0, ()).unwrap();
        builder.add_constructor_parameter("a", ()).unwrap();
        builder.add_named_parameter("a", ()).unwrap();

        assert_eq!(
            builder.add_type_parameter_by_ordinal(0, ()).err(),
            Some(MappingError::DuplicateTypeParameterOrdinal(0))
        );
        assert_eq!(
            builder.add_constructor_parameter("a", ()).err(),
            Some(MappingError::DuplicateConstructorParameter("a".to_string()))
        );
        assert_eq!(
            builder.add_named_parameter("a", ()).err(),
            Some(MappingError::DuplicateNamedParameter("a".to_string()))
        );

        let mut by_name = MappingRepositoryBuilder::new();
        by_name.add_type_parameter_by_name("T", ()).unwrap();
        assert_eq!(
            by_name.add_type_parameter_by_name("T", ()).err(),
            Some(MappingError::DuplicateTypeParameterName("T".to_string()))
        );
    }

    #[multiplatform_test]
    fn cloned_builder_shares_recorders() {
        let mut builder = MappingRepositoryBuilder::new();
        builder.add_named_parameter("Label", 7).unwrap();

        let first = builder.clone().build();
        let second = builder.build();

        assert!(Arc::ptr_eq(
            first.named_parameter("Label").unwrap(),
            second.named_parameter("Label").unwrap()
        ));
        assert_eq!(first.keys(), vec![ParameterKey::Named("Label".to_string())]);
    }
}
