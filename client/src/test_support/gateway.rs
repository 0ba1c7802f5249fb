//! Transport doubles for gateway and workflow tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Notify, mpsc};
use url::Url;

use crate::domain::ports::{
    HttpMethod, ResourceTransport, TransportError, TransportRequest, TransportResponse,
};
use crate::domain::{FetchGateway, GatewayEndpoints};

type Scripted = Result<TransportResponse, TransportError>;
type Responder = dyn Fn(&TransportRequest) -> Scripted + Send + Sync;

/// Proxy origin used by [`test_endpoints`].
pub const TEST_PROXY_ORIGIN: &str = "http://proxy.test";
/// Direct API base used by [`test_endpoints`].
pub const TEST_API_BASE: &str = "http://api.test:9000";

/// Endpoints pointing at two distinct fake hosts.
pub fn test_endpoints() -> GatewayEndpoints {
    GatewayEndpoints {
        proxy_origin: parse(TEST_PROXY_ORIGIN),
        api_base_url: parse(TEST_API_BASE),
    }
}

/// Gateway over `transport` using [`test_endpoints`].
pub fn gateway_over(transport: Arc<dyn ResourceTransport>) -> FetchGateway {
    FetchGateway::new(transport, test_endpoints())
}

/// Response with `status` and `value` rendered as the JSON body.
pub fn json_response(status: u16, value: &Value) -> Scripted {
    Ok(TransportResponse {
        status,
        body: value.to_string().into_bytes(),
    })
}

/// Response with `status` and an empty body.
pub fn empty_response(status: u16) -> Scripted {
    Ok(TransportResponse {
        status,
        body: Vec::new(),
    })
}

fn parse(raw: &str) -> Url {
    match Url::parse(raw) {
        Ok(url) => url,
        Err(error) => panic!("test URL {raw} must parse: {error}"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("transport double mutex poisoned"),
    }
}

/// Transport that replays a fixed script in call order and records requests.
pub struct ScriptedTransport {
    scripted: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<TransportRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    /// Replay `scripted`; calls beyond the script fail at the transport level.
    pub fn new(scripted: Vec<Scripted>) -> Self {
        Self {
            scripted: Mutex::new(scripted.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of requests sent.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests sent so far, in order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ResourceTransport for ScriptedTransport {
    async fn send(&self, request: &TransportRequest) -> Scripted {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());
        lock(&self.scripted).pop_front().unwrap_or_else(|| {
            Err(TransportError::transport(
                "transport script exhausted unexpectedly",
            ))
        })
    }
}

struct Gate {
    method: HttpMethod,
    entered: mpsc::UnboundedSender<TransportRequest>,
    release: Arc<Notify>,
}

/// Transport that answers through a closure, optionally parking requests of
/// one method until released.
pub struct RoutedTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<TransportRequest>>,
    gate: Option<Gate>,
}

impl RoutedTransport {
    /// Answer every request with `responder`.
    pub fn new(
        responder: impl Fn(&TransportRequest) -> Scripted + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Park requests using `method` until `release` is notified, announcing
    /// each on the returned channel.
    #[must_use]
    pub fn gated_on(
        mut self,
        method: HttpMethod,
    ) -> (Self, mpsc::UnboundedReceiver<TransportRequest>, Arc<Notify>) {
        let (entered, entered_rx) = mpsc::unbounded_channel();
        let release = Arc::new(Notify::new());
        self.gate = Some(Gate {
            method,
            entered,
            release: Arc::clone(&release),
        });
        (self, entered_rx, release)
    }

    /// Requests sent so far, in order.
    pub fn requests(&self) -> Vec<TransportRequest> {
        lock(&self.requests).clone()
    }

    /// Requests sent with `method`.
    pub fn requests_with(&self, method: HttpMethod) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method)
            .collect()
    }
}

#[async_trait]
impl ResourceTransport for RoutedTransport {
    async fn send(&self, request: &TransportRequest) -> Scripted {
        lock(&self.requests).push(request.clone());
        if let Some(gate) = self.gate.as_ref().filter(|gate| gate.method == request.method) {
            drop(gate.entered.send(request.clone()));
            gate.release.notified().await;
        }
        (self.responder)(request)
    }
}
