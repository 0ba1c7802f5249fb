//! Command-line view over the dashboard client core.
//!
//! Each subcommand prints one JSON document on stdout. Logs, including the
//! sample-data notices, go to stderr as JSON lines.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use serde_json::{Value, json};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use vconnect_client::config::ClientSettings;
use vconnect_client::domain::ports::{OfflineResourceTransport, ResourceTransport};
use vconnect_client::domain::{
    ApplicationId, ApplicationStatus, ApplicationStatusPorts, ApplicationStatusService,
    DashboardFeeds, DataSource, EventId, Feed, FetchGateway, RemoteConfirmation, Role,
};
use vconnect_client::outbound::http::ReqwestTransport;
use vconnect_client::outbound::override_store::FileStatusOverrideStore;

/// `vconnect-console` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "vconnect-console",
    about = "Inspect V-Connect dashboards and manage application statuses",
    version
)]
struct CliArgs {
    /// Skip the network and serve sample data where the dashboard would.
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List public events, falling back to sample data.
    Events,
    /// List volunteer contributions for an event (admin session).
    Contributors {
        /// Event identifier.
        event_id: EventId,
    },
    /// Show the reconciled application board for an event (organization session).
    Applications {
        /// Event identifier.
        event_id: EventId,
    },
    /// Change an application's status (organization session).
    SetStatus {
        /// Event identifier.
        event_id: EventId,
        /// Application identifier.
        application_id: ApplicationId,
        /// `pending`, `approved` or `rejected`.
        status: ApplicationStatus,
    },
    /// Forget the stored status override for an application (organization session).
    ClearOverride {
        /// Application identifier.
        application_id: ApplicationId,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = ClientSettings::load_from_iter([OsString::from("vconnect-console")])
        .map_err(|error| eyre!("load configuration: {error}"))?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    let document = runtime.block_on(run(args.command, args.offline, &settings))?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(&document)?)?;
    Ok(())
}

async fn run(command: Command, offline: bool, settings: &ClientSettings) -> Result<Value> {
    let transport: Arc<dyn ResourceTransport> = if offline {
        Arc::new(OfflineResourceTransport)
    } else {
        Arc::new(ReqwestTransport::new(settings.request_timeout()).wrap_err("build HTTP client")?)
    };
    let gateway = FetchGateway::new(transport, settings.gateway_endpoints()?);

    match command {
        Command::Events => {
            let feed = DashboardFeeds::new(gateway).load_events().await;
            render_feed(feed)
        }
        Command::Contributors { event_id } => {
            let session = settings.credentials().require_role(Role::Admin)?;
            let feed = DashboardFeeds::new(gateway)
                .load_contributors(event_id, &session)
                .await;
            render_feed(feed)
        }
        Command::Applications { event_id } => {
            let service = status_service(gateway, settings)?;
            let refresh = service.refresh_applications(event_id).await?;
            Ok(json!({
                "refresh": refresh,
                "applications": service.applications(event_id),
            }))
        }
        Command::SetStatus {
            event_id,
            application_id,
            status,
        } => {
            let service = status_service(gateway, settings)?;
            service.refresh_applications(event_id).await?;
            let outcome = service
                .set_application_status(event_id, application_id, status)
                .await?;
            if outcome.remote == RemoteConfirmation::Unconfirmed {
                warn!(
                    application_id = application_id.get(),
                    "server did not confirm the change; it is kept locally"
                );
            }
            Ok(json!({
                "outcome": outcome,
                "applications": service.applications(event_id),
            }))
        }
        Command::ClearOverride { application_id } => {
            let service = status_service(gateway, settings)?;
            let removed = service.clear_override(application_id).await?;
            Ok(json!({ "application_id": application_id, "removed": removed }))
        }
    }
}

fn status_service(
    gateway: FetchGateway,
    settings: &ClientSettings,
) -> Result<ApplicationStatusService> {
    let session = settings.credentials().require_role(Role::Organization)?;
    let store = Arc::new(FileStatusOverrideStore::new(settings.state_dir()));
    Ok(ApplicationStatusService::new(
        ApplicationStatusPorts::new(gateway, store),
        session,
        settings.application_status_config()?,
    ))
}

fn render_feed(feed: Feed) -> Result<Value> {
    if let DataSource::Sample { notice } = &feed.source {
        warn!(notice = *notice, "Using Sample Data");
    }
    Ok(serde_json::to_value(feed)?)
}
