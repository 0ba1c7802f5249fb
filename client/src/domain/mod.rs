//! Domain primitives and services for the dashboard client.
//!
//! Purpose: own the fetch fallback policy, the sample catalog, the
//! application-status reconciliation rules and the session gate. Adapters
//! for transports and storage plug in through [`ports`].
//!
//! Public surface:
//! - FetchGateway (alias to `fetch_gateway::FetchGateway`) — proxy then
//!   direct request policy collapsing failures into `FetchOutcome::Failure`.
//! - get_mock_payload (alias to `mock_catalog::get_mock_payload`) — static
//!   sample records keyed by endpoint substring.
//! - reconcile_applications (alias to `reconcile::reconcile_applications`) —
//!   override > current state > server status merge.
//! - ApplicationStatusService (alias to
//!   `application_status::ApplicationStatusService`) — optimistic status
//!   updates backed by the override store.
//! - DashboardFeeds (alias to `dashboard_feeds::DashboardFeeds`) — listings
//!   with sample-data fallback.

pub mod application;
pub mod application_status;
pub mod dashboard_feeds;
pub mod fetch_gateway;
pub mod mock_catalog;
pub mod ports;
pub mod reconcile;
pub mod session;

pub(crate) use self::application::json_kind;
pub use self::application::{
    ApplicationId, ApplicationRecord, ApplicationStatus, EventId, ServerApplication,
    StatusOverrides, UnknownApplicationStatus, fallback_volunteer_name,
};
pub use self::application_status::{
    ApplicationStatusConfig, ApplicationStatusPorts, ApplicationStatusRuntime,
    ApplicationStatusService, ConflictPolicy, RefreshOutcome, RemoteConfirmation,
    StatusUpdateError, StatusUpdateOutcome,
};
pub use self::dashboard_feeds::{
    CONTRIBUTORS_SAMPLE_NOTICE, DashboardFeeds, DataSource, EVENTS_ENDPOINT,
    EVENTS_SAMPLE_NOTICE, Feed,
};
pub use self::fetch_gateway::{
    DispatchOutcome, FetchGateway, FetchOptions, FetchOutcome, GatewayEndpoints,
};
pub use self::mock_catalog::get_mock_payload;
pub use self::reconcile::{ResolvedStatus, StatusSource, reconcile_applications, resolve_status};
pub use self::session::{AuthorizedSession, Role, SessionCredentials, SessionError};
