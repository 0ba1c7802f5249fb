//! Dashboard client core for the V-Connect volunteering API.
//!
//! The crate follows a hexagonal layout: `domain` owns the fetch fallback
//! policy, the application-status reconciliation rules and the ports they
//! depend on; `outbound` provides reqwest and filesystem adapters for those
//! ports; `config` loads runtime settings through OrthoConfig.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
