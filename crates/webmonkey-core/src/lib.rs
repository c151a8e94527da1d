//! Web Monkey Core
//!
//! Shared building blocks for the monkey tester:
//! - a cookie-carrying HTTP session adapter ([`SessionClient`]) behind the
//!   [`HttpClient`] capability
//! - run configuration ([`MonkeyConfig`])
//! - probe verdicts and per-feature counters ([`ProbeOutcome`], [`RunResults`])
//! - error taxonomy and tracing setup

pub mod client;
pub mod config;
pub mod error;
pub mod fakes;
pub mod result;
pub mod telemetry;

pub use client::{
    probe_reachability, HttpClient, HttpMethod, ProbeRequest, ProbeResponse, SessionClient,
};
pub use config::{MonkeyConfig, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use error::{ClientError, MonkeyError, Result};
pub use result::{FeatureResult, ProbeOutcome, RunResult, RunResults};
pub use telemetry::{init_tracing, install_panic_hook, panic_message};

/// Web Monkey version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
