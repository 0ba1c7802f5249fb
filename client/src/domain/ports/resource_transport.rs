//! Driven port for issuing one HTTP exchange against the volunteering API.
//!
//! The gateway owns the attempt policy (proxy first, then direct); adapters
//! behind this port own the wire and report every exchange that produced a
//! status line as `Ok`, whatever the status.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::define_port_error;

/// HTTP verbs the dashboard issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case verb as it appears on the request line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Fully-resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Request verb.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: Url,
    /// Header name/value pairs, sent in order.
    pub headers: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Errors raised before a status line was received.
    pub enum TransportError {
        /// Connection, TLS or body streaming failed.
        Transport { message: String } =>
            "transport failed: {message}",
        /// The underlying client gave up waiting.
        Timeout { message: String } =>
            "transport timed out: {message}",
        /// The request could not be built (bad header, unsupported URL).
        InvalidRequest { message: String } =>
            "request invalid: {message}",
    }
}

/// Port for sending one request and reading the full response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceTransport: Send + Sync {
    /// Send `request` and return its status and body.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use vconnect_client::domain::ports::{
    ///     HttpMethod, OfflineResourceTransport, ResourceTransport, TransportRequest,
    /// };
    ///
    /// let transport = OfflineResourceTransport;
    /// let result = transport
    ///     .send(&TransportRequest {
    ///         method: HttpMethod::Get,
    ///         url: "http://localhost:9000/pub/events/".parse()?,
    ///         headers: Vec::new(),
    ///         body: None,
    ///     })
    ///     .await;
    /// assert!(result.is_err());
    /// ```
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Fixture transport for running without a backend: every call fails at the
/// transport level.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResourceTransport;

#[async_trait]
impl ResourceTransport for OfflineResourceTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        Err(TransportError::transport(format!(
            "offline: {} {} not sent",
            request.method.as_str(),
            request.url
        )))
    }
}
