// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Type guards between untyped resolved values and strongly-typed recorder callbacks.
//!
//! A single trait, [`FromResolved`], covers every combination of expected type, nullability and
//! cardinality: nullability is expressed as `Option<T>` and cardinality as `Vec<T>`, so
//! `Option<Vec<Option<i32>>>` reads as "nullable list of nullable ints". A guard either produces a
//! value of the expected type or rejects; there is no partial result, in particular no partial list.

use std::{fmt::Display, marker::PhantomData};

use tracing::{debug, trace};

use crate::value::{ResolvedValue, TypeHandle, ValNumber};

pub trait FromResolved: Sized {
    /// Converts `value` if its kind matches `Self` (allowing lossless numeric coercion).
    fn from_resolved(value: &ResolvedValue) -> Option<Self>;

    /// Human readable form of the expected type, such as `i32?[]`.
    fn describe() -> String;
}

impl FromResolved for bool {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        match value {
            ResolvedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn describe() -> String {
        "bool".to_string()
    }
}

impl FromResolved for char {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        match value {
            ResolvedValue::Char(c) => Some(*c),
            _ => None,
        }
    }

    fn describe() -> String {
        "char".to_string()
    }
}

impl FromResolved for String {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        match value {
            ResolvedValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn describe() -> String {
        "string".to_string()
    }
}

impl FromResolved for TypeHandle {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        match value {
            ResolvedValue::Type(t) => Some(t.clone()),
            _ => None,
        }
    }

    fn describe() -> String {
        "type".to_string()
    }
}

/// Accepts any non-null value, for recorders that want to inspect the value themselves.
impl FromResolved for ResolvedValue {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        (!value.is_null()).then(|| value.clone())
    }

    fn describe() -> String {
        "value".to_string()
    }
}

// Integers accept any integral number or enumeration constant whose value fits the target width.
macro_rules! integer_guard {
    ($($t:ty),*) => {
        $(
            impl FromResolved for $t {
                fn from_resolved(value: &ResolvedValue) -> Option<Self> {
                    let number = match value {
                        ResolvedValue::Number(n) => n,
                        ResolvedValue::Enum(e) => &e.value,
                        _ => return None,
                    };
                    number.as_i128().and_then(|n| <$t>::try_from(n).ok())
                }

                fn describe() -> String {
                    stringify!($t).to_string()
                }
            }
        )*
    };
}

integer_guard!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromResolved for f64 {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        match value {
            ResolvedValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    fn describe() -> String {
        "f64".to_string()
    }
}

impl FromResolved for f32 {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        match value {
            ResolvedValue::Number(ValNumber::F32(n)) => Some(*n),
            ResolvedValue::Number(ValNumber::F64(n)) => {
                let narrowed = *n as f32;
                (narrowed as f64 == *n || n.is_nan()).then_some(narrowed)
            }
            _ => None,
        }
    }

    fn describe() -> String {
        "f32".to_string()
    }
}

impl<T: FromResolved> FromResolved for Option<T> {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        match value {
            ResolvedValue::Null => Some(None),
            _ => T::from_resolved(value).map(Some),
        }
    }

    fn describe() -> String {
        format!("{}?", T::describe())
    }
}

impl<T: FromResolved> FromResolved for Vec<T> {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        value
            .as_list()?
            .iter()
            .map(T::from_resolved)
            .collect::<Option<Vec<_>>>()
    }

    fn describe() -> String {
        format!("{}[]", T::describe())
    }
}

/// A consumer enumeration that can be recorded from an enumeration constant or its underlying
/// integer. Implement this and invoke [`annotation_enum!`](crate::annotation_enum) to get the
/// [`FromResolved`] implementation.
pub trait AnnotationEnum: Sized {
    /// Type name the host reports for constants of this enumeration.
    const TYPE_NAME: &'static str;

    fn from_underlying(value: i64) -> Option<Self>;
}

pub fn enum_from_resolved<E: AnnotationEnum>(value: &ResolvedValue) -> Option<E> {
    match value {
        ResolvedValue::Enum(e) if e.type_name == E::TYPE_NAME => {
            e.value.as_i64().and_then(E::from_underlying)
        }
        ResolvedValue::Number(n) => n.as_i64().and_then(E::from_underlying),
        _ => None,
    }
}

#[macro_export]
macro_rules! annotation_enum {
    ($t:ty) => {
        impl $crate::type_guard::FromResolved for $t {
            fn from_resolved(value: &$crate::value::ResolvedValue) -> Option<Self> {
                $crate::type_guard::enum_from_resolved::<$t>(value)
            }

            fn describe() -> String {
                <$t as $crate::type_guard::AnnotationEnum>::TYPE_NAME.to_string()
            }
        }
    };
}

/// Outcome of a recorder callback.
///
/// Callbacks returning `()` always succeed. Callbacks returning `bool` or `Result<(), E>` can reject
/// a well-typed value (for example, one that fails a range check), which aborts the invocation the
/// same way a type mismatch does.
pub trait RecordResult {
    fn succeeded(self) -> bool;
}

impl RecordResult for () {
    fn succeeded(self) -> bool {
        true
    }
}

impl RecordResult for bool {
    fn succeeded(self) -> bool {
        self
    }
}

impl<E: Display> RecordResult for Result<(), E> {
    fn succeeded(self) -> bool {
        match self {
            Ok(()) => true,
            Err(reason) => {
                debug!(%reason, "Recorder rejected argument");
                false
            }
        }
    }
}

/// Wraps a callback expecting `T` with the validation that makes it callable with any value.
pub struct TypeGuard<T, F> {
    callback: F,
    _expected: PhantomData<fn() -> T>,
}

impl<T: FromResolved, F> TypeGuard<T, F> {
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _expected: PhantomData,
        }
    }

    /// Validates `value` and forwards it. Returns `true` iff validation passed and the callback
    /// reported success.
    pub fn invoke<D, R>(&self, destination: &mut D, value: &ResolvedValue) -> bool
    where
        F: Fn(&mut D, T) -> R,
        R: RecordResult,
    {
        match T::from_resolved(value) {
            Some(typed) => (self.callback)(destination, typed).succeeded(),
            None => {
                trace!(
                    expected = %T::describe(),
                    actual = value.kind(),
                    "Argument rejected by type guard"
                );
                false
            }
        }
    }
}
