//! Resilient fetch gateway: proxied request first, direct request second.
//!
//! Both attempts share one request description. Any failure of an attempt
//! (transport error, non-2xx status, undecodable body) moves on to the next
//! attempt; when both fail the caller sees a bare [`FetchOutcome::Failure`].
//! The cause of each failed attempt is only visible in the logs.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::domain::ports::{
    HttpMethod, ResourceTransport, TransportError, TransportRequest, TransportResponse,
};

/// Result of [`FetchGateway::fetch_resource`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// One attempt returned 2xx with a JSON body.
    Success(Value),
    /// Neither attempt produced a usable payload.
    Failure,
}

impl FetchOutcome {
    /// Return the payload, discarding the failure marker.
    pub fn into_payload(self) -> Option<Value> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure => None,
        }
    }

    /// Whether this is [`FetchOutcome::Success`].
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Result of [`FetchGateway::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// One attempt returned 2xx.
    Delivered,
    /// Both attempts failed.
    Failed,
}

/// Per-call request configuration.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vconnect_client::domain::FetchOptions;
/// use vconnect_client::domain::ports::HttpMethod;
///
/// let options = FetchOptions::new(HttpMethod::Post)
///     .with_bearer("token-123")
///     .with_json_body(json!({ "title": "Beach cleanup" }));
/// assert_eq!(options.method, HttpMethod::Post);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    /// Request verb.
    pub method: HttpMethod,
    /// Extra headers, sent after the defaults.
    pub headers: Vec<(String, String)>,
    /// Token sent as `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
    /// JSON request body.
    pub body: Option<Value>,
}

impl FetchOptions {
    /// Options for a bodiless request with `method`.
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Plain `GET`.
    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Origins the gateway tries, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoints {
    /// Same-origin root that a dev proxy or reverse proxy rewrites.
    pub proxy_origin: Url,
    /// Absolute API base URL used when the proxy attempt fails.
    pub api_base_url: Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Proxy,
    Direct,
}

impl Attempt {
    const ORDER: [Self; 2] = [Self::Proxy, Self::Direct];

    const fn label(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Direct => "direct",
        }
    }
}

/// Two-attempt fetch gateway over a [`ResourceTransport`].
#[derive(Clone)]
pub struct FetchGateway {
    transport: Arc<dyn ResourceTransport>,
    endpoints: GatewayEndpoints,
}

impl FetchGateway {
    /// Build a gateway over `transport`.
    pub fn new(transport: Arc<dyn ResourceTransport>, endpoints: GatewayEndpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Origins this gateway targets.
    pub fn endpoints(&self) -> &GatewayEndpoints {
        &self.endpoints
    }

    /// Fetch `endpoint` and decode its body as JSON.
    ///
    /// The direct attempt runs only after the proxy attempt has settled
    /// without a decodable 2xx response. Never panics and never reports why
    /// both attempts failed.
    pub async fn fetch_resource(&self, endpoint: &str, options: &FetchOptions) -> FetchOutcome {
        for attempt in Attempt::ORDER {
            let Some(response) = self.try_attempt(attempt, endpoint, options).await else {
                continue;
            };
            match serde_json::from_slice::<Value>(&response.body) {
                Ok(payload) => return FetchOutcome::Success(payload),
                Err(error) => warn!(
                    endpoint,
                    attempt = attempt.label(),
                    error = %error,
                    "response body is not valid JSON"
                ),
            }
        }
        debug!(endpoint, "all fetch attempts failed");
        FetchOutcome::Failure
    }

    /// Send a command whose success body may be empty.
    ///
    /// Uses the same proxy-then-direct policy as
    /// [`FetchGateway::fetch_resource`] but only inspects the status.
    pub async fn dispatch(&self, endpoint: &str, options: &FetchOptions) -> DispatchOutcome {
        for attempt in Attempt::ORDER {
            if self.try_attempt(attempt, endpoint, options).await.is_some() {
                return DispatchOutcome::Delivered;
            }
        }
        debug!(endpoint, method = options.method.as_str(), "all dispatch attempts failed");
        DispatchOutcome::Failed
    }

    async fn try_attempt(
        &self,
        attempt: Attempt,
        endpoint: &str,
        options: &FetchOptions,
    ) -> Option<TransportResponse> {
        let base = match attempt {
            Attempt::Proxy => &self.endpoints.proxy_origin,
            Attempt::Direct => &self.endpoints.api_base_url,
        };
        let result = match resolve_url(base, endpoint) {
            Ok(url) => self.transport.send(&build_request(url, options)).await,
            Err(error) => Err(TransportError::invalid_request(format!(
                "cannot resolve `{endpoint}` against {base}: {error}"
            ))),
        };

        match result {
            Ok(response) if response.is_success() => Some(response),
            Ok(response) => {
                warn!(
                    endpoint,
                    attempt = attempt.label(),
                    status = response.status,
                    "request returned a non-success status"
                );
                None
            }
            Err(error) => {
                warn!(
                    endpoint,
                    attempt = attempt.label(),
                    error = %error,
                    "request failed"
                );
                None
            }
        }
    }
}

/// Join `endpoint` onto `base`, keeping any path prefix on `base` and
/// adding the leading `/` when `endpoint` lacks one.
pub(crate) fn resolve_url(base: &Url, endpoint: &str) -> Result<Url, url::ParseError> {
    let path: Cow<'_, str> = if endpoint.starts_with('/') {
        Cow::Borrowed(endpoint)
    } else {
        Cow::Owned(format!("/{endpoint}"))
    };
    Url::parse(&format!("{}{path}", base.as_str().trim_end_matches('/')))
}

fn build_request(url: Url, options: &FetchOptions) -> TransportRequest {
    let mut headers = vec![("Accept".to_owned(), "application/json".to_owned())];
    if let Some(token) = &options.bearer_token {
        headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
    }
    headers.extend(options.headers.iter().cloned());

    TransportRequest {
        method: options.method,
        url,
        headers,
        body: options.body.clone(),
    }
}

#[cfg(test)]
#[path = "fetch_gateway_tests.rs"]
mod tests;
