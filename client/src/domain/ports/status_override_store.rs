//! Driven port for the durable status override map.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::StatusOverrides;

/// Well-known key the override map is stored under.
pub const STATUS_OVERRIDES_KEY: &str = "applicationStatuses";

define_port_error! {
    /// Errors surfaced by override store adapters.
    pub enum StatusOverrideStoreError {
        /// Backing storage could not be read or written.
        Io { message: String } =>
            "status override storage failed: {message}",
        /// Stored document could not be parsed or rendered.
        Serialization { message: String } =>
            "status override document invalid: {message}",
    }
}

/// Port for loading and replacing the whole override map.
///
/// Adapters replace the stored document atomically on `save`; callers
/// perform read-modify-write through `load` then `save`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusOverrideStore: Send + Sync {
    /// Read the current override map. A store that was never written
    /// returns an empty map.
    async fn load(&self) -> Result<StatusOverrides, StatusOverrideStoreError>;

    /// Replace the stored map with `overrides`.
    async fn save(&self, overrides: &StatusOverrides) -> Result<(), StatusOverrideStoreError>;
}
