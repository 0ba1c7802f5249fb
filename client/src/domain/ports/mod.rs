//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod refresh_sleeper;
mod resource_transport;
mod status_override_store;

pub use refresh_sleeper::{RefreshSleeper, TokioSleeper};
#[cfg(test)]
pub use resource_transport::MockResourceTransport;
pub use resource_transport::{
    HttpMethod, OfflineResourceTransport, ResourceTransport, TransportError, TransportRequest,
    TransportResponse,
};
#[cfg(test)]
pub use status_override_store::MockStatusOverrideStore;
pub use status_override_store::{
    STATUS_OVERRIDES_KEY, StatusOverrideStore, StatusOverrideStoreError,
};
