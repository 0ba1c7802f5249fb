//! Organization-side application board with optimistic status updates.
//!
//! The service keeps one in-memory board per event. A status change is
//! applied to the board and written to the override store before the PATCH
//! is sent, so the user's choice survives a failed request and any later
//! refresh. After a fixed delay the event's applications are re-fetched and
//! reconciled against the board and the override store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    HttpMethod, RefreshSleeper, StatusOverrideStore, StatusOverrideStoreError,
};
use crate::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, AuthorizedSession, DispatchOutcome,
    EventId, FetchGateway, FetchOptions, FetchOutcome, ServerApplication, StatusOverrides,
    reconcile_applications,
};

mod runtime;

pub use runtime::{ApplicationStatusPorts, ApplicationStatusRuntime};

type Board = BTreeMap<ApplicationId, ApplicationRecord>;

/// What to do with a local status change the server did not confirm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Keep the optimistic board entry and the override.
    #[default]
    ClientWins,
    /// Restore the previous board entry and override.
    ServerWins,
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationStatusConfig {
    /// Wait between the PATCH and the follow-up refresh.
    pub refresh_delay: Duration,
    /// Handling of unconfirmed updates.
    pub conflict_policy: ConflictPolicy,
}

impl Default for ApplicationStatusConfig {
    fn default() -> Self {
        Self {
            refresh_delay: Duration::from_secs(1),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

/// Whether the server accepted a status PATCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteConfirmation {
    /// One gateway attempt returned 2xx.
    Confirmed,
    /// Both gateway attempts failed.
    Unconfirmed,
}

/// Result of re-fetching an event's applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Board replaced with `count` reconciled records.
    Refreshed {
        /// Records now on the board.
        count: usize,
    },
    /// Listing could not be fetched; the board was left as it was.
    Unavailable,
}

/// Summary of [`ApplicationStatusService::set_application_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdateOutcome {
    /// Server-side result of the PATCH.
    pub remote: RemoteConfirmation,
    /// Result of the follow-up refresh.
    pub refresh: RefreshOutcome,
}

/// Failures the view layer must show to the user.
#[derive(Debug, thiserror::Error)]
pub enum StatusUpdateError {
    /// Override map could not be read or written.
    #[error(transparent)]
    OverrideStore(#[from] StatusOverrideStoreError),
}

/// Application boards for one authorized organization session.
pub struct ApplicationStatusService {
    gateway: FetchGateway,
    override_store: Arc<dyn StatusOverrideStore>,
    sleeper: Arc<dyn RefreshSleeper>,
    session: AuthorizedSession,
    config: ApplicationStatusConfig,
    boards: Mutex<BTreeMap<EventId, Board>>,
    /// Held across each override load/save pair so concurrent updates for
    /// different ids never overwrite each other's entries.
    override_writes: tokio::sync::Mutex<()>,
}

impl ApplicationStatusService {
    /// Build a service using the Tokio sleeper.
    pub fn new(
        ports: ApplicationStatusPorts,
        session: AuthorizedSession,
        config: ApplicationStatusConfig,
    ) -> Self {
        Self::with_runtime(ports, ApplicationStatusRuntime::default(), session, config)
    }

    /// Build a service with injected runtime abstractions.
    pub fn with_runtime(
        ports: ApplicationStatusPorts,
        runtime: ApplicationStatusRuntime,
        session: AuthorizedSession,
        config: ApplicationStatusConfig,
    ) -> Self {
        Self {
            gateway: ports.gateway,
            override_store: ports.override_store,
            sleeper: runtime.sleeper,
            session,
            config,
            boards: Mutex::new(BTreeMap::new()),
            override_writes: tokio::sync::Mutex::new(()),
        }
    }

    /// Change one application's status.
    ///
    /// The board entry and the override are committed before the PATCH is
    /// issued. The follow-up refresh runs whatever the PATCH outcome; a
    /// refresh failure is logged and reported as
    /// [`RefreshOutcome::Unavailable`].
    ///
    /// # Errors
    ///
    /// Returns [`StatusUpdateError::OverrideStore`] when the override cannot
    /// be persisted. The board entry is restored and no request is sent.
    pub async fn set_application_status(
        &self,
        event_id: EventId,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<StatusUpdateOutcome, StatusUpdateError> {
        let previous_status = self.apply_to_board(event_id, application_id, status);

        let previous_override = match self.write_override(application_id, Some(status)).await {
            Ok(previous) => previous,
            Err(error) => {
                self.restore_board(event_id, application_id, previous_status);
                return Err(error.into());
            }
        };
        info!(
            event_id = event_id.get(),
            application_id = application_id.get(),
            status = status.as_str(),
            "application status committed locally"
        );

        let endpoint = format!(
            "api/org/events/{event_id}/applications/{application_id}/status?status={}",
            status.as_wire()
        );
        let options =
            FetchOptions::new(HttpMethod::Patch).with_bearer(self.session.bearer_token());
        let remote = match self.gateway.dispatch(&endpoint, &options).await {
            DispatchOutcome::Delivered => RemoteConfirmation::Confirmed,
            DispatchOutcome::Failed => {
                self.handle_unconfirmed(
                    event_id,
                    application_id,
                    previous_status,
                    previous_override,
                )
                .await;
                RemoteConfirmation::Unconfirmed
            }
        };

        self.sleeper.sleep(self.config.refresh_delay).await;
        let refresh = match self.refresh_applications(event_id).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(event_id = event_id.get(), error = %error, "post-update refresh failed");
                RefreshOutcome::Unavailable
            }
        };

        Ok(StatusUpdateOutcome { remote, refresh })
    }

    /// Re-fetch an event's applications and reconcile them into the board.
    ///
    /// # Errors
    ///
    /// Returns [`StatusUpdateError::OverrideStore`] when the override map
    /// cannot be loaded. A failed fetch is not an error.
    pub async fn refresh_applications(
        &self,
        event_id: EventId,
    ) -> Result<RefreshOutcome, StatusUpdateError> {
        let endpoint = format!("api/org/events/{event_id}/applications");
        let options = FetchOptions::get().with_bearer(self.session.bearer_token());
        let FetchOutcome::Success(payload) =
            self.gateway.fetch_resource(&endpoint, &options).await
        else {
            warn!(event_id = event_id.get(), "applications unavailable; keeping current board");
            return Ok(RefreshOutcome::Unavailable);
        };

        let overrides = self.override_store.load().await?;
        let snapshot = ServerApplication::decode_listing(&payload);

        let mut boards = self.boards();
        let current = boards.get(&event_id).cloned().unwrap_or_default();
        let merged = reconcile_applications(&snapshot, &current, &overrides);
        let count = merged.len();
        boards.insert(event_id, merged);
        debug!(event_id = event_id.get(), count, "application board refreshed");
        Ok(RefreshOutcome::Refreshed { count })
    }

    /// Snapshot of an event's board in application id order.
    pub fn applications(&self, event_id: EventId) -> Vec<ApplicationRecord> {
        self.boards()
            .get(&event_id)
            .map(|board| board.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Applications on an event's board whose effective status is approved.
    pub fn approved_volunteers(&self, event_id: EventId) -> Vec<ApplicationRecord> {
        self.applications(event_id)
            .into_iter()
            .filter(|record| record.status == ApplicationStatus::Approved)
            .collect()
    }

    /// Remove the stored override for `application_id`.
    ///
    /// Returns whether an entry was removed. Boards are not touched; the
    /// server status applies once the record leaves the board.
    ///
    /// # Errors
    ///
    /// Returns [`StatusUpdateError::OverrideStore`] when the map cannot be
    /// loaded or saved.
    pub async fn clear_override(
        &self,
        application_id: ApplicationId,
    ) -> Result<bool, StatusUpdateError> {
        let removed = self.write_override(application_id, None).await?;
        Ok(removed.is_some())
    }

    fn boards(&self) -> MutexGuard<'_, BTreeMap<EventId, Board>> {
        self.boards.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the board status for one record, returning the status it had.
    /// A record that is not on the board is left alone.
    fn apply_to_board(
        &self,
        event_id: EventId,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Option<ApplicationStatus> {
        let mut boards = self.boards();
        let Some(record) = boards
            .get_mut(&event_id)
            .and_then(|board| board.get_mut(&application_id))
        else {
            debug!(
                event_id = event_id.get(),
                application_id = application_id.get(),
                "application not on board; skipping optimistic update"
            );
            return None;
        };
        Some(std::mem::replace(&mut record.status, status))
    }

    fn restore_board(
        &self,
        event_id: EventId,
        application_id: ApplicationId,
        previous: Option<ApplicationStatus>,
    ) {
        if let Some(previous) = previous {
            self.apply_to_board(event_id, application_id, previous);
        }
    }

    /// Read-modify-write of the override map. `None` removes the entry.
    /// Returns the entry that was replaced.
    async fn write_override(
        &self,
        application_id: ApplicationId,
        status: Option<ApplicationStatus>,
    ) -> Result<Option<ApplicationStatus>, StatusOverrideStoreError> {
        let _write = self.override_writes.lock().await;
        let mut overrides: StatusOverrides = self.override_store.load().await?;
        let previous = match status {
            Some(status) => overrides.insert(application_id, status),
            None => overrides.remove(application_id),
        };
        if status.is_some() || previous.is_some() {
            self.override_store.save(&overrides).await?;
        }
        Ok(previous)
    }

    async fn handle_unconfirmed(
        &self,
        event_id: EventId,
        application_id: ApplicationId,
        previous_status: Option<ApplicationStatus>,
        previous_override: Option<ApplicationStatus>,
    ) {
        match self.config.conflict_policy {
            ConflictPolicy::ClientWins => {
                warn!(
                    event_id = event_id.get(),
                    application_id = application_id.get(),
                    "status update not confirmed; keeping local choice"
                );
            }
            ConflictPolicy::ServerWins => {
                warn!(
                    event_id = event_id.get(),
                    application_id = application_id.get(),
                    "status update not confirmed; rolling back"
                );
                self.restore_board(event_id, application_id, previous_status);
                if let Err(error) = self.write_override(application_id, previous_override).await {
                    warn!(
                        application_id = application_id.get(),
                        error = %error,
                        "could not restore previous status override"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
