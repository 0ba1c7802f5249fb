//! Port and runtime dependency bundles for the application-status service.

use std::sync::Arc;

use crate::domain::FetchGateway;
use crate::domain::ports::{RefreshSleeper, StatusOverrideStore, TokioSleeper};

/// Port bundle required by the application-status service.
pub struct ApplicationStatusPorts {
    /// Gateway used for the listing fetch and the status PATCH.
    pub gateway: FetchGateway,
    /// Durable override map.
    pub override_store: Arc<dyn StatusOverrideStore>,
}

impl ApplicationStatusPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(gateway: FetchGateway, override_store: Arc<dyn StatusOverrideStore>) -> Self {
        Self {
            gateway,
            override_store,
        }
    }
}

/// Runtime helpers used between the status update and the refresh.
pub struct ApplicationStatusRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn RefreshSleeper>,
}

impl Default for ApplicationStatusRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
        }
    }
}
