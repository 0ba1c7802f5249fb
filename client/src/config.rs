//! Client configuration loaded via OrthoConfig.
//!
//! Every field is optional; accessors supply the defaults used by the
//! dashboard when nothing is configured.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{
    ApplicationStatusConfig, ConflictPolicy, GatewayEndpoints, SessionCredentials,
};

const DEFAULT_PROXY_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_API_BASE_URL: &str = "http://localhost:9000";
const DEFAULT_REFRESH_DELAY_MS: u64 = 1_000;
const DEFAULT_STATE_DIR: &str = ".vconnect";

/// Errors raised when configured values cannot be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL setting failed to parse.
    #[error("{field} is not a valid URL ({value}): {source}")]
    InvalidUrl {
        /// Setting name.
        field: &'static str,
        /// Raw configured value.
        value: String,
        /// Parser error.
        source: url::ParseError,
    },
    /// The conflict policy is not one of the known names.
    #[error("unknown conflict policy `{value}`; expected `client-wins` or `server-wins`")]
    UnknownConflictPolicy {
        /// Raw configured value.
        value: String,
    },
}

/// Runtime settings for the dashboard client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "VCONNECT")]
pub struct ClientSettings {
    /// Same-origin root tried first.
    pub proxy_origin: Option<String>,
    /// Absolute API base URL tried second.
    pub api_base_url: Option<String>,
    /// Milliseconds between a status PATCH and the follow-up refresh.
    pub refresh_delay_ms: Option<u64>,
    /// Per-request timeout in milliseconds; unset leaves requests unbounded.
    pub request_timeout_ms: Option<u64>,
    /// Directory holding the status override document.
    pub state_dir: Option<PathBuf>,
    /// `client-wins` or `server-wins`.
    pub conflict_policy: Option<String>,
    /// Bearer token stored after login.
    pub token: Option<String>,
    /// Stored user type (`admin`, `organization`, `volunteer`).
    pub user_type: Option<String>,
    /// Stored user identifier.
    pub user_id: Option<String>,
}

impl ClientSettings {
    /// Proxy origin, falling back to the local dev server.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when the value does not parse.
    pub fn proxy_origin(&self) -> Result<Url, ConfigError> {
        parse_url(
            "proxy_origin",
            self.proxy_origin.as_deref().unwrap_or(DEFAULT_PROXY_ORIGIN),
        )
    }

    /// Direct API base URL, falling back to the local API server.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when the value does not parse.
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        parse_url(
            "api_base_url",
            self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL),
        )
    }

    /// Both gateway origins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when either value does not parse.
    pub fn gateway_endpoints(&self) -> Result<GatewayEndpoints, ConfigError> {
        Ok(GatewayEndpoints {
            proxy_origin: self.proxy_origin()?,
            api_base_url: self.api_base_url()?,
        })
    }

    /// Delay before the post-update refresh.
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms.unwrap_or(DEFAULT_REFRESH_DELAY_MS))
    }

    /// Per-request timeout for the HTTP transport, only when configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Directory for the override document.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
    }

    /// Conflict policy, defaulting to client-wins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownConflictPolicy`] for unrecognised names.
    pub fn conflict_policy(&self) -> Result<ConflictPolicy, ConfigError> {
        match self.conflict_policy.as_deref().map(str::trim) {
            None | Some("") => Ok(ConflictPolicy::default()),
            Some(raw) if raw.eq_ignore_ascii_case("client-wins") => Ok(ConflictPolicy::ClientWins),
            Some(raw) if raw.eq_ignore_ascii_case("server-wins") => Ok(ConflictPolicy::ServerWins),
            Some(raw) => Err(ConfigError::UnknownConflictPolicy {
                value: raw.to_owned(),
            }),
        }
    }

    /// Service configuration derived from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownConflictPolicy`] for unrecognised names.
    pub fn application_status_config(&self) -> Result<ApplicationStatusConfig, ConfigError> {
        Ok(ApplicationStatusConfig {
            refresh_delay: self.refresh_delay(),
            conflict_policy: self.conflict_policy()?,
        })
    }

    /// Stored login values.
    pub fn credentials(&self) -> SessionCredentials {
        SessionCredentials {
            token: self.token.clone(),
            user_type: self.user_type.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_owned(),
        source,
    })
}
