//! Unit tests for optimistic status updates and board refreshes.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tokio::time::timeout;

use super::*;
use crate::domain::ports::{
    MockStatusOverrideStore, TransportError, TransportRequest, TransportResponse,
};
use crate::domain::{Role, SessionCredentials};
use crate::outbound::override_store::FileStatusOverrideStore;
use crate::test_support::{
    FlakyOverrideStore, ImmediateSleeper, RecordingSleeper, RoutedTransport, empty_response,
    gateway_over, json_response,
};

const EVENT: EventId = EventId::new(1);
const JORDAN: ApplicationId = ApplicationId::new(42);
const RILEY: ApplicationId = ApplicationId::new(43);

type Scripted = Result<TransportResponse, TransportError>;

fn listing() -> Value {
    json!([
        { "application_id": 42, "volunteer_id": 5, "volunteer_name": "Jordan", "status": "pending" },
        { "application_id": 43, "volunteer_id": 6, "status": "accepted" },
    ])
}

/// Serve the listing for GETs and `patch_status` for everything else.
fn backend(patch_status: u16) -> impl Fn(&TransportRequest) -> Scripted + Send + Sync + 'static {
    move |request| match request.method {
        HttpMethod::Get => json_response(200, &listing()),
        _ => empty_response(patch_status),
    }
}

#[fixture]
fn session() -> AuthorizedSession {
    SessionCredentials {
        token: Some("org-token".to_owned()),
        user_type: Some("organization".to_owned()),
        user_id: Some("4".to_owned()),
    }
    .require_role(Role::Organization)
    .expect("organization session")
}

struct Harness {
    service: Arc<ApplicationStatusService>,
    transport: Arc<RoutedTransport>,
    store: Arc<FlakyOverrideStore>,
    sleeper: Arc<RecordingSleeper>,
}

fn harness(
    transport: RoutedTransport,
    store: FlakyOverrideStore,
    policy: ConflictPolicy,
    session: AuthorizedSession,
) -> Harness {
    let transport = Arc::new(transport);
    let store = Arc::new(store);
    let sleeper = Arc::new(RecordingSleeper::default());
    let service = ApplicationStatusService::with_runtime(
        ApplicationStatusPorts::new(gateway_over(transport.clone()), store.clone()),
        ApplicationStatusRuntime {
            sleeper: sleeper.clone(),
        },
        session,
        ApplicationStatusConfig {
            refresh_delay: Duration::from_millis(250),
            conflict_policy: policy,
        },
    );
    Harness {
        service: Arc::new(service),
        transport,
        store,
        sleeper,
    }
}

fn status_of(service: &ApplicationStatusService, id: ApplicationId) -> Option<ApplicationStatus> {
    service
        .applications(EVENT)
        .into_iter()
        .find(|record| record.application_id == id)
        .map(|record| record.status)
}

async fn seeded(harness: &Harness) {
    let outcome = harness
        .service
        .refresh_applications(EVENT)
        .await
        .expect("initial refresh");
    assert_eq!(outcome, RefreshOutcome::Refreshed { count: 2 });
}

#[rstest]
#[tokio::test]
async fn optimistic_commit_lands_before_the_patch_settles(session: AuthorizedSession) {
    let (transport, mut entered, release) =
        RoutedTransport::new(backend(500)).gated_on(HttpMethod::Patch);
    let harness = harness(
        transport,
        FlakyOverrideStore::default(),
        ConflictPolicy::ClientWins,
        session,
    );
    seeded(&harness).await;

    let service = Arc::clone(&harness.service);
    let update = tokio::spawn(async move {
        service
            .set_application_status(EVENT, JORDAN, ApplicationStatus::Approved)
            .await
    });

    let proxied = timeout(Duration::from_secs(1), entered.recv())
        .await
        .expect("patch should be issued")
        .expect("gate channel open");
    assert_eq!(proxied.url.query(), Some("status=accepted"));
    assert_eq!(
        status_of(&harness.service, JORDAN),
        Some(ApplicationStatus::Approved),
        "board shows the new status while the PATCH is in flight"
    );
    assert_eq!(
        harness.store.snapshot().get(JORDAN),
        Some(ApplicationStatus::Approved),
        "override is durable before the network call"
    );

    release.notify_one();
    timeout(Duration::from_secs(1), entered.recv())
        .await
        .expect("direct attempt should follow")
        .expect("gate channel open");
    release.notify_one();

    let outcome = update
        .await
        .expect("update task joins")
        .expect("update succeeds locally");
    assert_eq!(outcome.remote, RemoteConfirmation::Unconfirmed);
    assert_eq!(
        status_of(&harness.service, JORDAN),
        Some(ApplicationStatus::Approved)
    );
}

#[rstest]
#[tokio::test]
async fn confirmed_update_patches_with_wire_status_and_refreshes(session: AuthorizedSession) {
    let harness = harness(
        RoutedTransport::new(backend(204)),
        FlakyOverrideStore::default(),
        ConflictPolicy::ClientWins,
        session,
    );
    seeded(&harness).await;

    let outcome = harness
        .service
        .set_application_status(EVENT, JORDAN, ApplicationStatus::Approved)
        .await
        .expect("update");

    assert_eq!(
        outcome,
        StatusUpdateOutcome {
            remote: RemoteConfirmation::Confirmed,
            refresh: RefreshOutcome::Refreshed { count: 2 },
        }
    );
    let patches = harness.transport.requests_with(HttpMethod::Patch);
    assert_eq!(patches.len(), 1, "proxy attempt succeeded");
    assert_eq!(
        patches[0].url.as_str(),
        "http://proxy.test/api/org/events/1/applications/42/status?status=accepted"
    );
    assert!(
        patches[0]
            .headers
            .contains(&("Authorization".to_owned(), "Bearer org-token".to_owned()))
    );
    assert_eq!(harness.sleeper.recorded(), vec![Duration::from_millis(250)]);
    assert_eq!(
        status_of(&harness.service, JORDAN),
        Some(ApplicationStatus::Approved),
        "override outranks the lagging server status"
    );
}

#[rstest]
#[tokio::test]
async fn client_wins_keeps_choice_when_patch_fails(session: AuthorizedSession) {
    let harness = harness(
        RoutedTransport::new(backend(500)),
        FlakyOverrideStore::default(),
        ConflictPolicy::ClientWins,
        session,
    );
    seeded(&harness).await;

    let outcome = harness
        .service
        .set_application_status(EVENT, JORDAN, ApplicationStatus::Rejected)
        .await
        .expect("update");

    assert_eq!(outcome.remote, RemoteConfirmation::Unconfirmed);
    assert_eq!(outcome.refresh, RefreshOutcome::Refreshed { count: 2 });
    assert_eq!(harness.transport.requests_with(HttpMethod::Patch).len(), 2);
    assert_eq!(
        status_of(&harness.service, JORDAN),
        Some(ApplicationStatus::Rejected)
    );
    assert_eq!(
        harness.store.snapshot().get(JORDAN),
        Some(ApplicationStatus::Rejected)
    );
}

#[rstest]
#[case::without_prior_override(None, ApplicationStatus::Pending)]
#[case::with_prior_override(Some(ApplicationStatus::Rejected), ApplicationStatus::Rejected)]
#[tokio::test]
async fn server_wins_restores_previous_state_when_patch_fails(
    session: AuthorizedSession,
    #[case] prior: Option<ApplicationStatus>,
    #[case] expected: ApplicationStatus,
) {
    let seed: StatusOverrides = prior.map(|status| (JORDAN, status)).into_iter().collect();
    let harness = harness(
        RoutedTransport::new(backend(500)),
        FlakyOverrideStore::seeded(seed),
        ConflictPolicy::ServerWins,
        session,
    );
    seeded(&harness).await;

    let outcome = harness
        .service
        .set_application_status(EVENT, JORDAN, ApplicationStatus::Approved)
        .await
        .expect("update");

    assert_eq!(outcome.remote, RemoteConfirmation::Unconfirmed);
    assert_eq!(status_of(&harness.service, JORDAN), Some(expected));
    assert_eq!(harness.store.snapshot().get(JORDAN), prior);
}

#[rstest]
#[tokio::test]
async fn override_write_failure_reverts_board_and_skips_network(session: AuthorizedSession) {
    let harness = harness(
        RoutedTransport::new(backend(204)),
        FlakyOverrideStore::default().failing_saves(),
        ConflictPolicy::ClientWins,
        session,
    );
    seeded(&harness).await;

    let error = harness
        .service
        .set_application_status(EVENT, JORDAN, ApplicationStatus::Approved)
        .await
        .expect_err("store failure surfaces");

    assert!(matches!(error, StatusUpdateError::OverrideStore(_)));
    assert_eq!(
        status_of(&harness.service, JORDAN),
        Some(ApplicationStatus::Pending)
    );
    assert!(harness.transport.requests_with(HttpMethod::Patch).is_empty());
    assert!(harness.sleeper.recorded().is_empty());
}

#[rstest]
#[tokio::test]
async fn refresh_fails_when_overrides_cannot_load(session: AuthorizedSession) {
    let harness = harness(
        RoutedTransport::new(backend(204)),
        FlakyOverrideStore::default().failing_loads(),
        ConflictPolicy::ClientWins,
        session,
    );

    let error = harness
        .service
        .refresh_applications(EVENT)
        .await
        .expect_err("load failure surfaces");

    assert!(matches!(error, StatusUpdateError::OverrideStore(_)));
    assert!(harness.service.applications(EVENT).is_empty());
}

#[rstest]
#[tokio::test]
async fn offline_refresh_leaves_board_untouched(session: AuthorizedSession) {
    let harness = harness(
        RoutedTransport::new(|_| empty_response(503)),
        FlakyOverrideStore::default(),
        ConflictPolicy::ClientWins,
        session,
    );

    let refresh = harness
        .service
        .refresh_applications(EVENT)
        .await
        .expect("refresh");
    assert_eq!(refresh, RefreshOutcome::Unavailable);

    let outcome = harness
        .service
        .set_application_status(EVENT, JORDAN, ApplicationStatus::Approved)
        .await
        .expect("update");
    assert_eq!(
        outcome,
        StatusUpdateOutcome {
            remote: RemoteConfirmation::Unconfirmed,
            refresh: RefreshOutcome::Unavailable,
        }
    );
    assert!(harness.service.applications(EVENT).is_empty());
    assert_eq!(
        harness.store.snapshot().get(JORDAN),
        Some(ApplicationStatus::Approved),
        "override is kept even without a board entry"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_updates_for_different_ids_keep_both_overrides(session: AuthorizedSession) {
    for round in 0..25 {
        let state_dir = tempfile::tempdir().expect("state dir");
        let store = Arc::new(FileStatusOverrideStore::new(state_dir.path()));
        let service = ApplicationStatusService::with_runtime(
            ApplicationStatusPorts::new(
                gateway_over(Arc::new(RoutedTransport::new(backend(204)))),
                store.clone(),
            ),
            ApplicationStatusRuntime {
                sleeper: Arc::new(ImmediateSleeper),
            },
            session.clone(),
            ApplicationStatusConfig::default(),
        );
        service
            .refresh_applications(EVENT)
            .await
            .expect("initial refresh");

        let (first, second) = tokio::join!(
            service.set_application_status(EVENT, JORDAN, ApplicationStatus::Approved),
            service.set_application_status(EVENT, RILEY, ApplicationStatus::Rejected),
        );
        first.expect("first update");
        second.expect("second update");

        let stored = store.load().await.expect("reload overrides");
        assert_eq!(
            stored.get(JORDAN),
            Some(ApplicationStatus::Approved),
            "round {round}: {stored:?}"
        );
        assert_eq!(
            stored.get(RILEY),
            Some(ApplicationStatus::Rejected),
            "round {round}: {stored:?}"
        );
        assert_eq!(status_of(&service, JORDAN), Some(ApplicationStatus::Approved));
        assert_eq!(status_of(&service, RILEY), Some(ApplicationStatus::Rejected));
    }
}

#[rstest]
#[tokio::test]
async fn approved_volunteers_follow_effective_status(session: AuthorizedSession) {
    let harness = harness(
        RoutedTransport::new(backend(204)),
        FlakyOverrideStore::default(),
        ConflictPolicy::ClientWins,
        session,
    );
    seeded(&harness).await;

    let approved: Vec<_> = harness
        .service
        .approved_volunteers(EVENT)
        .into_iter()
        .map(|record| record.application_id)
        .collect();
    assert_eq!(approved, vec![RILEY], "server `accepted` counts as approved");

    harness
        .service
        .set_application_status(EVENT, JORDAN, ApplicationStatus::Approved)
        .await
        .expect("update");

    assert_eq!(harness.service.approved_volunteers(EVENT).len(), 2);
    assert!(harness.service.applications(EventId::new(99)).is_empty());
}

#[rstest]
#[tokio::test]
async fn clear_override_removes_only_existing_entries(session: AuthorizedSession) {
    let harness = harness(
        RoutedTransport::new(backend(204)),
        FlakyOverrideStore::seeded([(JORDAN, ApplicationStatus::Rejected)].into_iter().collect()),
        ConflictPolicy::ClientWins,
        session,
    );

    assert!(harness.service.clear_override(JORDAN).await.expect("clear"));
    assert!(!harness.service.clear_override(JORDAN).await.expect("clear again"));
    assert!(harness.store.snapshot().is_empty());
}

#[rstest]
#[tokio::test]
async fn override_is_saved_after_loading_the_current_map(session: AuthorizedSession) {
    let mut store = MockStatusOverrideStore::new();
    let mut sequence = mockall::Sequence::new();
    store
        .expect_load()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|| Ok([(RILEY, ApplicationStatus::Rejected)].into_iter().collect()));
    store
        .expect_save()
        .withf(|overrides| {
            overrides.get(RILEY) == Some(ApplicationStatus::Rejected)
                && overrides.get(JORDAN) == Some(ApplicationStatus::Approved)
        })
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_| Ok(()));
    let transport = Arc::new(RoutedTransport::new(|request| match request.method {
        HttpMethod::Patch => empty_response(204),
        _ => empty_response(503),
    }));
    let service = ApplicationStatusService::with_runtime(
        ApplicationStatusPorts::new(gateway_over(transport), Arc::new(store)),
        ApplicationStatusRuntime {
            sleeper: Arc::new(crate::test_support::ImmediateSleeper),
        },
        session,
        ApplicationStatusConfig::default(),
    );

    let outcome = service
        .set_application_status(EVENT, JORDAN, ApplicationStatus::Approved)
        .await
        .expect("update");

    assert_eq!(outcome.remote, RemoteConfirmation::Confirmed);
    assert_eq!(outcome.refresh, RefreshOutcome::Unavailable);
}

#[test]
fn defaults_match_the_dashboard_behaviour() {
    let config = ApplicationStatusConfig::default();
    assert_eq!(config.refresh_delay, Duration::from_secs(1));
    assert_eq!(config.conflict_policy, ConflictPolicy::ClientWins);
}
