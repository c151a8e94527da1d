//! HTTP client adapter.
//!
//! Probes talk to the target application only through [`HttpClient`], which
//! reduces every exchange to a status code (and an unused body). Transport
//! failures surface as [`ClientError`] so callers can tell "got a response"
//! apart from "could not reach the server".

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MonkeyConfig;
use crate::error::{ClientError, MonkeyError, Result};

/// HTTP methods used by the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing probe request. The path is joined against the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub method: HttpMethod,
    pub path: String,
    /// Form-encoded body fields (POST only).
    pub form: Vec<(String, String)>,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
}

impl ProbeRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            form: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Add a form field.
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// `METHOD path` label used in logs and diagnostics.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Response as seen by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

impl ProbeResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Capability the probes need from an HTTP session.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue one request and return the response status.
    ///
    /// Any HTTP status is `Ok`; only transport-level failures are `Err`.
    async fn request(&self, request: &ProbeRequest) -> std::result::Result<ProbeResponse, ClientError>;
}

/// Cookie-carrying session bound to one base URL.
///
/// Cookies set by one probe (e.g. a login) are replayed on every later
/// request made through the same instance. Redirects are not followed so
/// that 3xx statuses reach the probe's acceptance set.
#[derive(Debug, Clone)]
pub struct SessionClient {
    base_url: Url,
    http: Client,
}

impl SessionClient {
    /// Build a fresh session (empty cookie jar) for the configured target.
    pub fn new(config: &MonkeyConfig) -> Result<Self> {
        let base_url = config.parsed_base_url()?;
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .map_err(ClientError::from)?;

        debug!(base_url = %base_url, "Created session client");
        Ok(Self { base_url, http })
    }

    /// Resolve a probe path against the base URL.
    pub fn resolve(&self, path: &str) -> std::result::Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl HttpClient for SessionClient {
    async fn request(&self, request: &ProbeRequest) -> std::result::Result<ProbeResponse, ClientError> {
        let url = self.resolve(&request.path)?;

        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(request = %request.label(), status, "Probe request completed");
        Ok(ProbeResponse { status, body })
    }
}

/// Issue one plain GET against the base URL with a short timeout.
///
/// Any HTTP response means the target is up; a transport failure is
/// reported as [`MonkeyError::Unreachable`].
pub async fn probe_reachability(base_url: &str, timeout: Duration) -> Result<u16> {
    let url = Url::parse(base_url)
        .map_err(|e| MonkeyError::InvalidConfig(format!("base URL {:?}: {}", base_url, e)))?;
    let http = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ClientError::from)?;

    match http.get(url.clone()).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            debug!(url = %url, status, "Target reachable");
            Ok(status)
        }
        Err(e) => Err(MonkeyError::Unreachable {
            url: url.to_string(),
            reason: ClientError::from(e).to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let req = ProbeRequest::post("/user/login")
            .form("username", "testuser_1")
            .form("password", "password_1");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.form.len(), 2);
        assert!(req.query.is_empty());
        assert_eq!(req.label(), "POST /user/login");

        let req = ProbeRequest::get("/search").query("q", "test_7");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.query, vec![("q".to_string(), "test_7".to_string())]);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }

    #[test]
    fn test_resolve_replaces_base_path() {
        let config = MonkeyConfig::new("http://localhost:8080/app/");
        let client = SessionClient::new(&config).expect("client");
        let url = client.resolve("/profile/user_3").expect("resolve");
        assert_eq!(url.as_str(), "http://localhost:8080/profile/user_3");
    }

    #[test]
    fn test_session_rejects_invalid_base_url() {
        let config = MonkeyConfig::new("::nonsense::");
        assert!(matches!(
            SessionClient::new(&config),
            Err(MonkeyError::InvalidConfig(_))
        ));
    }
}
