// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Console logging for hosts that do not install their own subscriber.
//!
//! The filter comes from `ANNOTATION_BINDER_LOG`, which follows the conventions of `RUST_LOG`.
//! Binding is logged at `debug` per invocation and at `trace` per argument.

use tracing_subscriber::{EnvFilter, filter::LevelFilter, prelude::*, util::TryInitError};

use crate::config::Environment;

pub const LOG_ENV: &str = "ANNOTATION_BINDER_LOG";

fn filter(env: &dyn Environment) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(env.get_or_else(LOG_ENV, ""))
}

/// Installs a global `tracing_subscriber::fmt` subscriber. Fails if one is already installed.
pub fn init(env: &dyn Environment) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(filter(env))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnvironment;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn filter_defaults_to_warn() {
        assert_eq!(
            filter(&MapEnvironment::new()).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            filter(&MapEnvironment::from([(LOG_ENV, "annotation_binder=trace")])).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }
}
