//! Effective-status resolution for volunteer applications.
//!
//! Three sources compete for an application's status. In priority order:
//! the durable override written when an organizer last changed it, the
//! record already on screen, and finally what the server reports.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ServerApplication, StatusOverrides,
    fallback_volunteer_name,
};

/// Where an effective status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// Durable override store.
    Override,
    /// Record held in memory before the refresh.
    CurrentState,
    /// Server-reported status (after synonym mapping).
    Server,
    /// Server sent no usable status.
    Default,
}

/// Effective status together with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStatus {
    /// Status to display.
    pub status: ApplicationStatus,
    /// Which input won.
    pub source: StatusSource,
}

/// Resolve one application's status from its three candidate sources.
///
/// # Examples
///
/// ```
/// use vconnect_client::domain::{ApplicationStatus, StatusSource, resolve_status};
///
/// let resolved = resolve_status(None, None, Some("accepted"));
/// assert_eq!(resolved.status, ApplicationStatus::Approved);
/// assert_eq!(resolved.source, StatusSource::Server);
/// ```
pub fn resolve_status(
    override_status: Option<ApplicationStatus>,
    current_status: Option<ApplicationStatus>,
    server_status: Option<&str>,
) -> ResolvedStatus {
    if let Some(status) = override_status {
        return ResolvedStatus {
            status,
            source: StatusSource::Override,
        };
    }
    if let Some(status) = current_status {
        return ResolvedStatus {
            status,
            source: StatusSource::CurrentState,
        };
    }
    match server_status.and_then(ApplicationStatus::from_wire) {
        Some(status) => ResolvedStatus {
            status,
            source: StatusSource::Server,
        },
        None => {
            if let Some(raw) = server_status.filter(|raw| !raw.trim().is_empty()) {
                debug!(status = raw, "unrecognised server status; defaulting to pending");
            }
            ResolvedStatus {
                status: ApplicationStatus::Pending,
                source: StatusSource::Default,
            }
        }
    }
}

/// Merge a server snapshot with the current board and the override store.
///
/// Pure and idempotent: the same inputs always produce the same map. Server
/// records without an `application_id` are dropped; applications missing
/// from the server snapshot are dropped from the result even if they were on
/// the current board.
pub fn reconcile_applications(
    server_records: &[ServerApplication],
    current_state: &BTreeMap<ApplicationId, ApplicationRecord>,
    overrides: &StatusOverrides,
) -> BTreeMap<ApplicationId, ApplicationRecord> {
    server_records
        .iter()
        .filter_map(|server| {
            let Some(raw_id) = server.application_id else {
                warn!("dropping server application without an application_id");
                return None;
            };
            let id = ApplicationId::new(raw_id);
            let resolved = resolve_status(
                overrides.get(id),
                current_state.get(&id).map(|record| record.status),
                server.status.as_deref(),
            );
            Some((id, normalise(id, server, resolved.status)))
        })
        .collect()
}

fn normalise(
    id: ApplicationId,
    server: &ServerApplication,
    status: ApplicationStatus,
) -> ApplicationRecord {
    let volunteer_name = server
        .volunteer_name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback_volunteer_name(server.volunteer_id));

    ApplicationRecord {
        application_id: id,
        volunteer_id: server.volunteer_id,
        volunteer_name,
        status,
        applied_at: server.applied_at.clone(),
        message: server.message.clone().unwrap_or_default(),
        extra: server.extra.clone(),
    }
}
