// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Binding one annotation invocation against a recording session.
//!
//! Arguments are visited in a fixed order: type arguments, then constructor arguments in
//! declaration order, then named arguments in source order. Binding stops at the first argument
//! that is not recorded; whatever was recorded before that point stays in the destination.
//!
//! How a constructor argument reaches its parameter is decided from the invocation's syntax:
//! - a supplied expression is recorded as a normal argument,
//! - for a variadic parameter, a single explicit collection literal is a normal argument, and any
//!   other run of trailing expressions (including an empty one) is one params-expanded argument,
//! - an omitted optional parameter yields a default-argument notification.

use codemap::Span;
use tracing::{debug, instrument, trace, warn};

use crate::{
    config::{BinderConfig, EnvError, Environment},
    error::{ArgumentSite, BindFailure, FailureReason, MapperError},
    location::{CollectionLocation, Location, ParamsLocation},
    parameter::{ConstructorParameter, FormalParameter, NamedParameter, TypeParameter},
    surface::{CombinedRecording, LocationRecording, RecordOutcome, ValueRecording},
    value::{ResolvedValue, TypeHandle},
};

/// Syntax classification the host provides for each argument expression.
pub trait ArgumentSyntax {
    /// Whether the expression is an explicit collection literal (`new[] { ... }`, `[ ... ]`).
    fn is_collection_literal(&self) -> bool;
}

/// Maps argument syntax to source spans.
pub trait LocationResolver<X: ArgumentSyntax> {
    fn locate(&self, syntax: &X) -> Span;

    /// Only called for syntax that is a collection literal.
    fn locate_collection(&self, syntax: &X) -> CollectionLocation;

    fn locate_params(&self, syntax: &[X]) -> ParamsLocation {
        ParamsLocation {
            elements: syntax.iter().map(|s| self.locate(s)).collect(),
        }
    }

    fn locate_argument(&self, syntax: &X) -> Location {
        if syntax.is_collection_literal() {
            Location::Collection(self.locate_collection(syntax))
        } else {
            Location::Single(self.locate(syntax))
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeArgument<X> {
    pub parameter: TypeParameter,
    pub value: TypeHandle,
    pub syntax: X,
}

#[derive(Debug, Clone)]
pub struct NamedArgument<X> {
    pub parameter: NamedParameter,
    pub value: ResolvedValue,
    pub syntax: X,
}

/// One annotation application, as resolved by the host's semantic model.
#[derive(Debug, Clone)]
pub struct AnnotationInvocation<X> {
    pub name: String,
    pub type_arguments: Vec<TypeArgument<X>>,
    /// Formal constructor parameters in declaration order.
    pub constructor_parameters: Vec<ConstructorParameter>,
    /// One value per formal constructor parameter: defaults filled in and params packed into a
    /// list.
    pub constructor_values: Vec<ResolvedValue>,
    /// The positional argument expressions actually written, in source order.
    pub positional_syntax: Vec<X>,
    pub named_arguments: Vec<NamedArgument<X>>,
}

impl<X> AnnotationInvocation<X> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_arguments: vec![],
            constructor_parameters: vec![],
            constructor_values: vec![],
            positional_syntax: vec![],
            named_arguments: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Complete,
    Aborted(BindFailure),
}

impl BindOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BindOutcome::Complete)
    }

    pub fn failure(&self) -> Option<&BindFailure> {
        match self {
            BindOutcome::Complete => None,
            BindOutcome::Aborted(failure) => Some(failure),
        }
    }
}

/// How a constructor argument reaches its parameter.
#[derive(Debug, PartialEq)]
enum ArgumentForm<'a, X> {
    Normal(&'a X),
    Params(&'a [X]),
    Default,
}

#[derive(Debug)]
struct ConstructorArgument<'a, X> {
    parameter: &'a ConstructorParameter,
    value: &'a ResolvedValue,
    form: ArgumentForm<'a, X>,
}

enum Stop {
    Failed(BindFailure),
    Fault(MapperError),
}

impl From<BindFailure> for Stop {
    fn from(failure: BindFailure) -> Self {
        Stop::Failed(failure)
    }
}

impl From<MapperError> for Stop {
    fn from(error: MapperError) -> Self {
        Stop::Fault(error)
    }
}

fn malformed(site: ArgumentSite, message: String) -> BindFailure {
    BindFailure {
        site,
        reason: FailureReason::Malformed(message),
    }
}

/// Pairs each formal constructor parameter with its value and the form in which it was supplied.
/// Runs before anything is recorded, so a malformed invocation records nothing.
fn plan_constructor_arguments<X: ArgumentSyntax>(
    invocation: &AnnotationInvocation<X>,
) -> Result<Vec<ConstructorArgument<'_, X>>, BindFailure> {
    let parameters = &invocation.constructor_parameters;
    let syntax = &invocation.positional_syntax;

    if invocation.constructor_values.len() != parameters.len() {
        return Err(malformed(
            ArgumentSite::Invocation,
            format!(
                "expected {} constructor values, found {}",
                parameters.len(),
                invocation.constructor_values.len()
            ),
        ));
    }

    let mut arguments = Vec::with_capacity(parameters.len());
    let mut consumed = 0;

    for (index, (parameter, value)) in parameters
        .iter()
        .zip(&invocation.constructor_values)
        .enumerate()
    {
        let form = if parameter.is_variadic {
            if index + 1 != parameters.len() {
                return Err(malformed(
                    ArgumentSite::Parameter(FormalParameter::Constructor(parameter.clone())),
                    "a variadic parameter must be the last constructor parameter".to_string(),
                ));
            }
            let trailing = syntax.get(index..).unwrap_or_default();
            consumed = syntax.len();
            match trailing {
                [single] if single.is_collection_literal() => ArgumentForm::Normal(single),
                trailing => ArgumentForm::Params(trailing),
            }
        } else if let Some(supplied) = syntax.get(index) {
            consumed = index + 1;
            ArgumentForm::Normal(supplied)
        } else if parameter.is_optional {
            ArgumentForm::Default
        } else {
            return Err(malformed(
                ArgumentSite::Parameter(FormalParameter::Constructor(parameter.clone())),
                "no argument supplied for a required parameter".to_string(),
            ));
        };

        arguments.push(ConstructorArgument {
            parameter,
            value,
            form,
        });
    }

    if consumed < syntax.len() {
        return Err(malformed(
            ArgumentSite::Invocation,
            format!(
                "{} positional arguments supplied for {} constructor parameters",
                syntax.len(),
                parameters.len()
            ),
        ));
    }

    Ok(arguments)
}

/// The per-channel half of binding: records one argument through a session.
trait ArgumentSink<X> {
    fn type_argument(&mut self, argument: &TypeArgument<X>)
    -> Result<RecordOutcome, MapperError>;

    fn constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        syntax: &X,
    ) -> Result<RecordOutcome, MapperError>;

    fn params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        syntax: &[X],
    ) -> Result<RecordOutcome, MapperError>;

    fn default_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError>;

    fn named_argument(&mut self, argument: &NamedArgument<X>)
    -> Result<RecordOutcome, MapperError>;
}

struct ValueSink<'s, T>(&'s mut T);

impl<X, T: ValueRecording> ArgumentSink<X> for ValueSink<'_, T> {
    fn type_argument(
        &mut self,
        argument: &TypeArgument<X>,
    ) -> Result<RecordOutcome, MapperError> {
        self.0.record_type_argument(
            &argument.parameter,
            &ResolvedValue::Type(argument.value.clone()),
        )
    }

    fn constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        _syntax: &X,
    ) -> Result<RecordOutcome, MapperError> {
        self.0.record_constructor_argument(parameter, value)
    }

    fn params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        _syntax: &[X],
    ) -> Result<RecordOutcome, MapperError> {
        self.0.record_params_argument(parameter, value)
    }

    fn default_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        self.0.record_default_argument(parameter, value)
    }

    fn named_argument(
        &mut self,
        argument: &NamedArgument<X>,
    ) -> Result<RecordOutcome, MapperError> {
        self.0
            .record_named_argument(&argument.parameter, &argument.value)
    }
}

struct LocationSink<'s, T, L> {
    session: &'s mut T,
    resolver: &'s L,
}

impl<X, T, L> ArgumentSink<X> for LocationSink<'_, T, L>
where
    X: ArgumentSyntax,
    T: LocationRecording,
    L: LocationResolver<X>,
{
    fn type_argument(
        &mut self,
        argument: &TypeArgument<X>,
    ) -> Result<RecordOutcome, MapperError> {
        let location = self.resolver.locate_argument(&argument.syntax);
        self.session
            .record_type_argument(&argument.parameter, &location)
    }

    fn constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        _value: &ResolvedValue,
        syntax: &X,
    ) -> Result<RecordOutcome, MapperError> {
        let location = self.resolver.locate_argument(syntax);
        self.session.record_constructor_argument(parameter, &location)
    }

    fn params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        _value: &ResolvedValue,
        syntax: &[X],
    ) -> Result<RecordOutcome, MapperError> {
        let location = self.resolver.locate_params(syntax);
        self.session.record_params_argument(parameter, &location)
    }

    fn default_argument(
        &mut self,
        parameter: &ConstructorParameter,
        _value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        self.session.record_default_argument(parameter)
    }

    fn named_argument(
        &mut self,
        argument: &NamedArgument<X>,
    ) -> Result<RecordOutcome, MapperError> {
        let location = self.resolver.locate_argument(&argument.syntax);
        self.session
            .record_named_argument(&argument.parameter, &location)
    }
}

struct CombinedSink<'s, T, L> {
    session: &'s mut T,
    resolver: &'s L,
}

impl<X, T, L> ArgumentSink<X> for CombinedSink<'_, T, L>
where
    X: ArgumentSyntax,
    T: CombinedRecording,
    L: LocationResolver<X>,
{
    fn type_argument(
        &mut self,
        argument: &TypeArgument<X>,
    ) -> Result<RecordOutcome, MapperError> {
        let location = self.resolver.locate_argument(&argument.syntax);
        self.session.record_type_argument(
            &argument.parameter,
            &ResolvedValue::Type(argument.value.clone()),
            &location,
        )
    }

    fn constructor_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        syntax: &X,
    ) -> Result<RecordOutcome, MapperError> {
        let location = self.resolver.locate_argument(syntax);
        self.session
            .record_constructor_argument(parameter, value, &location)
    }

    fn params_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
        syntax: &[X],
    ) -> Result<RecordOutcome, MapperError> {
        let location = self.resolver.locate_params(syntax);
        self.session
            .record_params_argument(parameter, value, &location)
    }

    fn default_argument(
        &mut self,
        parameter: &ConstructorParameter,
        value: &ResolvedValue,
    ) -> Result<RecordOutcome, MapperError> {
        self.session.record_default_argument(parameter, value)
    }

    fn named_argument(
        &mut self,
        argument: &NamedArgument<X>,
    ) -> Result<RecordOutcome, MapperError> {
        let location = self.resolver.locate_argument(&argument.syntax);
        self.session
            .record_named_argument(&argument.parameter, &argument.value, &location)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Binder {
    config: BinderConfig,
}

impl Binder {
    pub fn new(config: BinderConfig) -> Self {
        Self { config }
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self::new(BinderConfig::from_env(env)?))
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    #[instrument(skip_all, fields(annotation = %invocation.name))]
    pub fn bind_values<X, T>(
        &self,
        invocation: &AnnotationInvocation<X>,
        session: &mut T,
    ) -> Result<BindOutcome, MapperError>
    where
        X: ArgumentSyntax,
        T: ValueRecording,
    {
        self.bind(invocation, &mut ValueSink(session))
    }

    #[instrument(skip_all, fields(annotation = %invocation.name))]
    pub fn bind_locations<X, T, L>(
        &self,
        invocation: &AnnotationInvocation<X>,
        resolver: &L,
        session: &mut T,
    ) -> Result<BindOutcome, MapperError>
    where
        X: ArgumentSyntax,
        T: LocationRecording,
        L: LocationResolver<X>,
    {
        self.bind(invocation, &mut LocationSink { session, resolver })
    }

    #[instrument(skip_all, fields(annotation = %invocation.name))]
    pub fn bind_combined<X, T, L>(
        &self,
        invocation: &AnnotationInvocation<X>,
        resolver: &L,
        session: &mut T,
    ) -> Result<BindOutcome, MapperError>
    where
        X: ArgumentSyntax,
        T: CombinedRecording,
        L: LocationResolver<X>,
    {
        self.bind(invocation, &mut CombinedSink { session, resolver })
    }

    fn bind<X: ArgumentSyntax>(
        &self,
        invocation: &AnnotationInvocation<X>,
        sink: &mut impl ArgumentSink<X>,
    ) -> Result<BindOutcome, MapperError> {
        match self.drive(invocation, sink) {
            Ok(()) => {
                debug!("Bound annotation invocation");
                Ok(BindOutcome::Complete)
            }
            Err(Stop::Failed(failure)) => {
                debug!(%failure, "Annotation invocation not bound");
                Ok(BindOutcome::Aborted(failure))
            }
            Err(Stop::Fault(error)) => Err(error),
        }
    }

    fn drive<X: ArgumentSyntax>(
        &self,
        invocation: &AnnotationInvocation<X>,
        sink: &mut impl ArgumentSink<X>,
    ) -> Result<(), Stop> {
        let constructor_arguments = plan_constructor_arguments(invocation)?;

        for argument in &invocation.type_arguments {
            let outcome = sink.type_argument(argument)?;
            self.accept(
                || FormalParameter::Type(argument.parameter.clone()),
                outcome,
            )?;
        }

        for ConstructorArgument {
            parameter,
            value,
            form,
        } in constructor_arguments
        {
            let outcome = match form {
                ArgumentForm::Normal(syntax) => sink.constructor_argument(parameter, value, syntax)?,
                ArgumentForm::Params(syntax) => sink.params_argument(parameter, value, syntax)?,
                ArgumentForm::Default if self.config.record_default_arguments => {
                    sink.default_argument(parameter, value)?
                }
                ArgumentForm::Default => continue,
            };
            self.accept(
                || FormalParameter::Constructor(parameter.clone()),
                outcome,
            )?;
        }

        for argument in &invocation.named_arguments {
            let outcome = sink.named_argument(argument)?;
            self.accept(
                || FormalParameter::Named(argument.parameter.clone()),
                outcome,
            )?;
        }

        Ok(())
    }

    fn accept(
        &self,
        parameter: impl FnOnce() -> FormalParameter,
        outcome: RecordOutcome,
    ) -> Result<(), BindFailure> {
        let reason = match outcome {
            RecordOutcome::Recorded => {
                trace!(parameter = %parameter(), "Recorded argument");
                return Ok(());
            }
            RecordOutcome::Unmapped if self.config.skip_unmapped_arguments => {
                warn!(parameter = %parameter(), "Skipping argument without a mapped recorder");
                return Ok(());
            }
            RecordOutcome::Unmapped => FailureReason::Unmapped,
            RecordOutcome::Rejected => FailureReason::Rejected,
        };

        Err(BindFailure {
            site: ArgumentSite::Parameter(parameter()),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[derive(Debug, PartialEq)]
    struct Syntax {
        literal: bool,
    }

    impl ArgumentSyntax for Syntax {
        fn is_collection_literal(&self) -> bool {
            self.literal
        }
    }

    fn expression() -> Syntax {
        Syntax { literal: false }
    }

    fn literal() -> Syntax {
        Syntax { literal: true }
    }

    fn invocation(
        parameters: Vec<ConstructorParameter>,
        positional_syntax: Vec<Syntax>,
    ) -> AnnotationInvocation<Syntax> {
        AnnotationInvocation {
            constructor_values: parameters.iter().map(|_| ResolvedValue::Null).collect(),
            constructor_parameters: parameters,
            positional_syntax,
            ..AnnotationInvocation::new("Test")
        }
    }

    fn forms(invocation: &AnnotationInvocation<Syntax>) -> Vec<ArgumentForm<'_, Syntax>> {
        plan_constructor_arguments(invocation)
            .unwrap()
            .into_iter()
            .map(|argument| argument.form)
            .collect()
    }

    #[multiplatform_test]
    fn plans_normal_default_and_variadic_forms() {
        let expanded = invocation(
            vec![
                ConstructorParameter::required(0, "first"),
                ConstructorParameter::variadic(1, "rest"),
            ],
            vec![expression(), expression(), expression()],
        );
        assert_eq!(
            forms(&expanded),
            vec![
                ArgumentForm::Normal(&expanded.positional_syntax[0]),
                ArgumentForm::Params(&expanded.positional_syntax[1..]),
            ]
        );

        let explicit = invocation(
            vec![ConstructorParameter::variadic(0, "rest")],
            vec![literal()],
        );
        assert_eq!(
            forms(&explicit),
            vec![ArgumentForm::Normal(&explicit.positional_syntax[0])]
        );

        let empty = invocation(vec![ConstructorParameter::variadic(0, "rest")], vec![]);
        assert_eq!(forms(&empty), vec![ArgumentForm::Params(&[][..])]);

        let defaulted = invocation(
            vec![
                ConstructorParameter::required(0, "first"),
                ConstructorParameter::optional(1, "second"),
            ],
            vec![expression()],
        );
        assert_eq!(
            forms(&defaulted),
            vec![
                ArgumentForm::Normal(&defaulted.positional_syntax[0]),
                ArgumentForm::Default,
            ]
        );
    }

    #[multiplatform_test]
    fn rejects_malformed_invocations() {
        let missing = invocation(vec![ConstructorParameter::required(0, "first")], vec![]);
        assert_eq!(
            plan_constructor_arguments(&missing).unwrap_err().site,
            ArgumentSite::Parameter(FormalParameter::Constructor(
                ConstructorParameter::required(0, "first")
            ))
        );

        let surplus = invocation(
            vec![ConstructorParameter::required(0, "first")],
            vec![expression(), expression()],
        );
        assert_eq!(
            plan_constructor_arguments(&surplus).unwrap_err(),
            malformed(
                ArgumentSite::Invocation,
                "2 positional arguments supplied for 1 constructor parameters".to_string()
            )
        );

        let mut mismatched = invocation(
            vec![ConstructorParameter::required(0, "first")],
            vec![expression()],
        );
        mismatched.constructor_values.clear();
        assert_eq!(
            plan_constructor_arguments(&mismatched).unwrap_err().site,
            ArgumentSite::Invocation
        );

        let misplaced = invocation(
            vec![
                ConstructorParameter::variadic(0, "rest"),
                ConstructorParameter::required(1, "last"),
            ],
            vec![expression(), expression()],
        );
        assert!(matches!(
            plan_constructor_arguments(&misplaced).unwrap_err().reason,
            FailureReason::Malformed(_)
        ));
    }
}
