//! Test utilities for the client crate.
//!
//! Compiled for unit tests and, behind the `test-support` feature, for the
//! integration suites under `tests/`.

pub mod gateway;
pub mod override_store;

pub use gateway::{
    RoutedTransport, ScriptedTransport, empty_response, gateway_over, json_response,
    test_endpoints,
};
pub use override_store::{FlakyOverrideStore, ImmediateSleeper, RecordingSleeper};
