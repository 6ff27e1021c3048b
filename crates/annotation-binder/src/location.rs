// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Source locations of annotation arguments.
//!
//! A collection argument can reach a parameter in two ways: as an explicit collection literal
//! (`f(new[] { 1, 2, 3 })`), which has a span for the whole literal and one per element, or as a
//! params-expanded run (`f(1, 2, 3)`), which only has the spans of the supplied expressions. The
//! two are kept as separate types so that a consumer never mistakes one for the other.

use codemap::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Single(Span),
    Collection(CollectionLocation),
}

impl Location {
    /// The span of the whole argument expression.
    pub fn span(&self) -> Span {
        match self {
            Location::Single(span) => *span,
            Location::Collection(collection) => collection.outer,
        }
    }
}

/// Location of an explicit collection literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionLocation {
    pub outer: Span,
    pub elements: Vec<Span>,
}

/// Location of the expressions bound to a variadic parameter through params-expansion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamsLocation {
    pub elements: Vec<Span>,
}

/// Any shape a variadic parameter's location can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariadicLocation {
    Literal(CollectionLocation),
    Expanded(ParamsLocation),
    /// A single non-literal expression (`null`, a constant) passed in the parameter's normal form.
    Expression(Span),
}

impl VariadicLocation {
    /// Spans of the individual elements; empty for a non-literal expression.
    pub fn elements(&self) -> &[Span] {
        match self {
            VariadicLocation::Literal(collection) => &collection.elements,
            VariadicLocation::Expanded(params) => &params.elements,
            VariadicLocation::Expression(_) => &[],
        }
    }
}

/// Type guard for the location channel, the counterpart of [`crate::type_guard::FromResolved`].
pub trait FromLocation: Sized {
    fn from_location(location: &Location) -> Option<Self>;

    fn from_params(_location: &ParamsLocation) -> Option<Self> {
        None
    }

    fn describe() -> &'static str;
}

impl FromLocation for Span {
    fn from_location(location: &Location) -> Option<Self> {
        Some(location.span())
    }

    fn describe() -> &'static str {
        "span"
    }
}

impl FromLocation for Location {
    fn from_location(location: &Location) -> Option<Self> {
        Some(location.clone())
    }

    fn describe() -> &'static str {
        "location"
    }
}

impl FromLocation for CollectionLocation {
    fn from_location(location: &Location) -> Option<Self> {
        match location {
            Location::Collection(collection) => Some(collection.clone()),
            Location::Single(_) => None,
        }
    }

    fn describe() -> &'static str {
        "collection location"
    }
}

/// A nullable collection parameter may be given `null` (or a constant) instead of a literal.
impl FromLocation for Option<CollectionLocation> {
    fn from_location(location: &Location) -> Option<Self> {
        match location {
            Location::Collection(collection) => Some(Some(collection.clone())),
            Location::Single(_) => Some(None),
        }
    }

    fn describe() -> &'static str {
        "collection location?"
    }
}

impl FromLocation for ParamsLocation {
    fn from_location(_location: &Location) -> Option<Self> {
        None
    }

    fn from_params(location: &ParamsLocation) -> Option<Self> {
        Some(location.clone())
    }

    fn describe() -> &'static str {
        "params location"
    }
}

impl FromLocation for VariadicLocation {
    fn from_location(location: &Location) -> Option<Self> {
        Some(match location {
            Location::Single(span) => VariadicLocation::Expression(*span),
            Location::Collection(collection) => VariadicLocation::Literal(collection.clone()),
        })
    }

    fn from_params(location: &ParamsLocation) -> Option<Self> {
        Some(VariadicLocation::Expanded(location.clone()))
    }

    fn describe() -> &'static str {
        "variadic location"
    }
}
