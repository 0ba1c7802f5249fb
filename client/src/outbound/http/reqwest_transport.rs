//! Reqwest-backed resource transport.
//!
//! This adapter owns transport details only: method and header mapping,
//! an optional timeout and reading the full body. Status interpretation belongs
//! to the fetch gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::domain::ports::{
    HttpMethod, ResourceTransport, TransportError, TransportRequest, TransportResponse,
};

const DEFAULT_USER_AGENT: &str = concat!("vconnect-client/", env!("CARGO_PKG_VERSION"));

/// Resource transport that performs requests with a shared reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport using a reqwest client.
    ///
    /// Without `timeout` requests run under reqwest's defaults, which never
    /// time out a whole request.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceTransport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(map_method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else if error.is_builder() {
        TransportError::invalid_request(error.to_string())
    } else {
        TransportError::transport(error.to_string())
    }
}
