//! Web Monkey Suite - randomized feature probing for a web application
//!
//! Provides the monkey-test orchestration layer that:
//! - Probes ten application features with semi-random HTTP requests
//! - Counts per-feature successes across repeated iterations
//! - Reports per-feature and overall success rates
//! - Re-runs fresh rounds until the rate converges or a bound is reached

pub mod aggregator;
pub mod controller;
pub mod probe;
pub mod report;
pub mod runner;
pub mod step;

// Re-export key types
pub use aggregator::{DelayPolicy, RunAggregator};
pub use controller::{
    ConvergenceController, ConvergencePolicy, ConvergenceSummary, HttpRounds, RoundExecutor,
    RoundRecord, StopReason,
};
pub use probe::{Feature, FeatureProbe, FeatureSet, Probe};
pub use report::{render, FeatureRow, RunReport, ATTENTION_THRESHOLD};
pub use runner::ProbeRunner;
pub use step::{AcceptSet, OnReject, ProbeStep};
