//! Admin dashboard feeds with sample-data fallback.
//!
//! Listings always produce something to render. When the API cannot be
//! reached the feed carries the sample records from the mock catalog and a
//! notice the view shows as its degraded-mode banner.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{
    AuthorizedSession, EventId, FetchGateway, FetchOptions, FetchOutcome, get_mock_payload,
    json_kind,
};

/// Endpoint for the public event listing.
pub const EVENTS_ENDPOINT: &str = "pub/events/";

/// Notice attached to sample events.
pub const EVENTS_SAMPLE_NOTICE: &str =
    "Could not connect to the events API. Showing sample data instead.";

/// Notice attached to sample contributors.
pub const CONTRIBUTORS_SAMPLE_NOTICE: &str =
    "Unable to fetch contributor data. Showing sample contributors.";

/// Where a feed's records came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DataSource {
    /// Records returned by the API.
    Live,
    /// Records from the built-in sample catalog.
    Sample {
        /// Banner text for the view.
        notice: &'static str,
    },
}

/// Records ready to render plus their provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    /// Records in server order.
    pub records: Vec<Value>,
    /// Live or sample.
    pub source: DataSource,
}

impl Feed {
    fn live(payload: Value) -> Self {
        Self {
            records: into_records(payload),
            source: DataSource::Live,
        }
    }

    fn sample(endpoint: &str, notice: &'static str) -> Self {
        Self {
            records: get_mock_payload(endpoint).to_vec(),
            source: DataSource::Sample { notice },
        }
    }

    /// Whether the records are sample data.
    pub const fn is_sample(&self) -> bool {
        matches!(self.source, DataSource::Sample { .. })
    }
}

/// Read-only listings backing the admin dashboard.
#[derive(Clone)]
pub struct DashboardFeeds {
    gateway: FetchGateway,
}

impl DashboardFeeds {
    /// Build feeds over `gateway`.
    pub fn new(gateway: FetchGateway) -> Self {
        Self { gateway }
    }

    /// Load the public event listing, falling back to sample events.
    pub async fn load_events(&self) -> Feed {
        match self.fetch(EVENTS_ENDPOINT, &FetchOptions::get()).await {
            Some(payload) => Feed::live(payload),
            None => {
                warn!(endpoint = EVENTS_ENDPOINT, "events unavailable; using sample data");
                Feed::sample(EVENTS_ENDPOINT, EVENTS_SAMPLE_NOTICE)
            }
        }
    }

    /// Load volunteer contributions for one event.
    ///
    /// Tries the public endpoint, then the admin endpoint with the session's
    /// bearer token, then falls back to sample contributors.
    pub async fn load_contributors(&self, event_id: EventId, session: &AuthorizedSession) -> Feed {
        let public = format!("pub/events/{event_id}/contributions");
        if let Some(payload) = self.fetch(&public, &FetchOptions::get()).await {
            return Feed::live(payload);
        }

        let admin = format!("api/admin/events/{event_id}/contributions");
        let options = FetchOptions::get().with_bearer(session.bearer_token());
        if let Some(payload) = self.fetch(&admin, &options).await {
            info!(event_id = event_id.get(), "contributors served by the admin endpoint");
            return Feed::live(payload);
        }

        warn!(event_id = event_id.get(), "contributors unavailable; using sample data");
        Feed::sample(&public, CONTRIBUTORS_SAMPLE_NOTICE)
    }

    /// Fetch `endpoint`, treating a JSON `null` body as a failure.
    async fn fetch(&self, endpoint: &str, options: &FetchOptions) -> Option<Value> {
        match self.gateway.fetch_resource(endpoint, options).await {
            FetchOutcome::Success(Value::Null) | FetchOutcome::Failure => None,
            FetchOutcome::Success(payload) => Some(payload),
        }
    }
}

fn into_records(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(records) => records,
        record @ Value::Object(_) => vec![record],
        other => {
            warn!(kind = json_kind(&other), "listing payload is not a list");
            Vec::new()
        }
    }
}
