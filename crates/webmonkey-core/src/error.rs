//! Error taxonomy for Web Monkey.

/// Errors raised by the HTTP client adapter.
///
/// These never mean "the server answered badly": any HTTP response, whatever
/// its status, is a successful call at this layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ClientError::Connect(err.to_string())
        } else if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_builder() {
            ClientError::Build(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Top-level Web Monkey errors.
#[derive(Debug, thiserror::Error)]
pub enum MonkeyError {
    /// The target application could not be reached at all. This is the only
    /// fatal condition: the run stops before any probe executes.
    #[error("target unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("feature already registered: {0}")]
    DuplicateFeature(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonkeyError {
    /// Whether this error should terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MonkeyError::Unreachable { .. })
    }
}

/// Result type for Web Monkey operations.
pub type Result<T> = std::result::Result<T, MonkeyError>;
