//! In-memory fakes for the client boundary (testing only)
//!
//! Provides `StaticClient`, `ScriptedClient` and `UnreachableClient`, which
//! satisfy [`HttpClient`] without touching the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{HttpClient, ProbeRequest, ProbeResponse};
use crate::error::ClientError;

// ---------------------------------------------------------------------------
// StaticClient
// ---------------------------------------------------------------------------

/// Answers every request with the same status.
#[derive(Debug)]
pub struct StaticClient {
    status: u16,
    calls: AtomicUsize,
}

impl StaticClient {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for StaticClient {
    async fn request(&self, _request: &ProbeRequest) -> Result<ProbeResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProbeResponse::with_status(self.status))
    }
}

// ---------------------------------------------------------------------------
// ScriptedClient
// ---------------------------------------------------------------------------

/// Answers by `METHOD path` with a fallback status, recording every request.
///
/// Routes match on the request path only (query parameters are ignored), so
/// probes with randomized path segments can be scripted by prefix through
/// [`ScriptedClient::route_prefix`].
#[derive(Debug)]
pub struct ScriptedClient {
    fallback: u16,
    exact: HashMap<String, u16>,
    prefixes: Vec<(String, u16)>,
    failing: Vec<String>,
    log: Mutex<Vec<ProbeRequest>>,
}

impl ScriptedClient {
    pub fn new(fallback: u16) -> Self {
        Self {
            fallback,
            exact: HashMap::new(),
            prefixes: Vec::new(),
            failing: Vec::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Respond to exactly `label` (e.g. `"GET /board"`) with `status`.
    pub fn route(mut self, label: &str, status: u16) -> Self {
        self.exact.insert(label.to_string(), status);
        self
    }

    /// Respond to any label starting with `prefix` with `status`.
    pub fn route_prefix(mut self, prefix: &str, status: u16) -> Self {
        self.prefixes.push((prefix.to_string(), status));
        self
    }

    /// Fail with a connection error for labels starting with `prefix`.
    pub fn fail_prefix(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ProbeRequest> {
        self.log.lock().unwrap().clone()
    }

    /// `METHOD path` labels of every request seen so far.
    pub fn labels(&self) -> Vec<String> {
        self.requests().iter().map(ProbeRequest::label).collect()
    }

    fn status_for(&self, label: &str) -> u16 {
        if let Some(status) = self.exact.get(label) {
            return *status;
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| label.starts_with(prefix.as_str()))
            .map(|(_, status)| *status)
            .unwrap_or(self.fallback)
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn request(&self, request: &ProbeRequest) -> Result<ProbeResponse, ClientError> {
        let label = request.label();
        self.log.lock().unwrap().push(request.clone());
        if self.failing.iter().any(|p| label.starts_with(p.as_str())) {
            return Err(ClientError::Connect(format!("scripted failure for {}", label)));
        }
        Ok(ProbeResponse::with_status(self.status_for(&label)))
    }
}

// ---------------------------------------------------------------------------
// UnreachableClient
// ---------------------------------------------------------------------------

/// Fails every request as if the server refused the connection.
#[derive(Debug, Default)]
pub struct UnreachableClient {
    calls: AtomicUsize,
}

impl UnreachableClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for UnreachableClient {
    async fn request(&self, request: &ProbeRequest) -> Result<ProbeResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::Connect(format!(
            "connection refused ({})",
            request.label()
        )))
    }
}
