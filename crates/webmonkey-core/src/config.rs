//! Run configuration.
//!
//! The base URL is the only parameter expected from the outside world
//! (`MONKEY_BASE_URL`); every other knob has a default matching the
//! classic monkey-test cadence and can be overridden from the CLI.

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{MonkeyError, Result};

/// Default target application.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// User agent sent on every probe request.
pub const DEFAULT_USER_AGENT: &str = "MonkeyTester/1.0";

/// Environment variable holding the base URL.
pub const BASE_URL_ENV: &str = "MONKEY_BASE_URL";

/// Web Monkey run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonkeyConfig {
    /// Base URL every probe path is joined against.
    pub base_url: String,
    /// User agent header for the session client.
    pub user_agent: String,
    /// Iterations in the first round.
    pub initial_iterations: u32,
    /// Iterations in every retry round.
    pub retry_iterations: u32,
    /// Maximum number of retry rounds after the first one.
    pub max_rounds: u32,
    /// Pause between rounds, in milliseconds.
    pub retry_pause_ms: u64,
    /// Lower bound of the random inter-probe delay, in milliseconds.
    pub probe_delay_min_ms: u64,
    /// Upper bound of the random inter-probe delay, in milliseconds.
    pub probe_delay_max_ms: u64,
    /// Timeout of the initial reachability check, in seconds.
    pub connect_timeout_secs: u64,
    /// Overall success rate (percent) at which retrying stops.
    pub target_rate: f64,
}

impl Default for MonkeyConfig {
    fn default() -> Self {
        MonkeyConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            initial_iterations: 5,
            retry_iterations: 3,
            max_rounds: 5,
            retry_pause_ms: 2_000,
            probe_delay_min_ms: 100,
            probe_delay_max_ms: 500,
            connect_timeout_secs: 5,
            target_rate: 100.0,
        }
    }
}

impl MonkeyConfig {
    /// Defaults, with the base URL taken from `MONKEY_BASE_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }
        config
    }

    /// Defaults targeting a specific base URL.
    pub fn new(base_url: &str) -> Self {
        MonkeyConfig {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Disable the inter-probe delay (useful in tests).
    pub fn without_delay(mut self) -> Self {
        self.probe_delay_min_ms = 0;
        self.probe_delay_max_ms = 0;
        self
    }

    /// Disable the pause between rounds.
    pub fn without_pause(mut self) -> Self {
        self.retry_pause_ms = 0;
        self
    }

    /// Parse the base URL.
    pub fn parsed_base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| MonkeyError::InvalidConfig(format!("base URL {:?}: {}", self.base_url, e)))
    }

    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Check the configuration for values that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        let url = self.parsed_base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MonkeyError::InvalidConfig(format!(
                "base URL must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.initial_iterations == 0 {
            return Err(MonkeyError::InvalidConfig(
                "initial iterations must be at least 1".to_string(),
            ));
        }
        if self.retry_iterations == 0 {
            return Err(MonkeyError::InvalidConfig(
                "retry iterations must be at least 1".to_string(),
            ));
        }
        if self.probe_delay_min_ms > self.probe_delay_max_ms {
            return Err(MonkeyError::InvalidConfig(format!(
                "probe delay bounds inverted: {}ms > {}ms",
                self.probe_delay_min_ms, self.probe_delay_max_ms
            )));
        }
        if !(0.0..=100.0).contains(&self.target_rate) {
            return Err(MonkeyError::InvalidConfig(format!(
                "target rate must be within 0-100, got {}",
                self.target_rate
            )));
        }
        Ok(())
    }
}
