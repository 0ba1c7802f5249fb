//! Unit tests for the architecture lint.

use rstest::fixture;
use rstest::rstest;

use super::*;

#[derive(Clone, Copy)]
struct LintSingle;

impl LintSingle {
    fn lint(self, file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
        lint_sources(&[LintSource {
            file: Utf8PathBuf::from(file),
            contents: contents.to_owned(),
        }])
    }
}

#[fixture]
fn lint_single() -> LintSingle {
    LintSingle
}

#[rstest]
#[case(
    "domain/application_status/mod.rs",
    "use super::fetch_gateway::FetchGateway; use tracing::warn; fn run(config: u8) { let _ = config; }",
    true
)]
#[case(
    "domain/reconcile.rs",
    "use crate::outbound::http::ReqwestTransport; fn build() { let _ = ReqwestTransport::new; }",
    false
)]
#[case(
    "domain/reconcile.rs",
    "use vconnect_client::config::ClientSettings; fn build() {}",
    false
)]
#[case(
    "domain/fetch_gateway.rs",
    "fn client() -> reqwest::Client { reqwest::Client::new() }",
    false
)]
#[case(
    "domain/ports/status_override_store.rs",
    "use cap_std::fs::Dir; fn open() {}",
    false
)]
#[case(
    "outbound/http/reqwest_transport.rs",
    "use crate::domain::ports::ResourceTransport; use reqwest::Client; fn build() {}",
    true
)]
#[case(
    "outbound/override_store/file.rs",
    "use super::super::config::ClientSettings; fn build() {}",
    false
)]
#[case(
    "outbound/override_store/file.rs",
    "use ortho_config::OrthoConfig; fn build() {}",
    false
)]
fn detects_boundary_violations(
    lint_single: LintSingle,
    #[case] file: &str,
    #[case] contents: &str,
    #[case] ok: bool,
) {
    let result = lint_single.lint(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
fn files_outside_linted_layers_are_rejected(lint_single: LintSingle) {
    let result = lint_single.lint("bin/vconnect_console.rs", "fn main() {}");
    assert!(
        matches!(result, Err(ArchitectureLintError::Parse { .. })),
        "result: {result:?}"
    );
}
