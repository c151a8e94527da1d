//! Convergence control: re-run the suite until it is clean or a bound is hit.
//!
//! The controller performs one reachability check, an initial round, then
//! bounded retry rounds. Each round starts from scratch (fresh session,
//! fresh feature set, fresh counters); nothing carries over between rounds.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use webmonkey_core::{probe_reachability, MonkeyConfig, Result, SessionClient};

use crate::aggregator::{DelayPolicy, RunAggregator};
use crate::probe::FeatureSet;
use crate::report::RunReport;

/// Bounded retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePolicy {
    pub initial_iterations: u32,
    pub retry_iterations: u32,
    /// Retry rounds allowed after the initial one.
    pub max_rounds: u32,
    pub retry_pause_ms: u64,
    /// Overall rate (percent) that ends the loop.
    pub target_rate: f64,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self::from_config(&MonkeyConfig::default())
    }
}

impl ConvergencePolicy {
    pub fn from_config(config: &MonkeyConfig) -> Self {
        Self {
            initial_iterations: config.initial_iterations,
            retry_iterations: config.retry_iterations,
            max_rounds: config.max_rounds,
            retry_pause_ms: config.retry_pause_ms,
            target_rate: config.target_rate,
        }
    }
}

/// Why the controller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The target rate was reached.
    Converged,
    /// All retry rounds were used.
    RoundLimit,
    /// A round executed no probes; retrying cannot change that.
    NoProbes,
}

/// Rate observed in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub iterations: u32,
    pub overall_rate: f64,
}

/// Outcome of a controller run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSummary {
    pub rounds: u32,
    pub stop_reason: StopReason,
    pub history: Vec<RoundRecord>,
    pub final_report: RunReport,
}

impl ConvergenceSummary {
    pub fn converged(&self) -> bool {
        self.stop_reason == StopReason::Converged
    }

    pub fn final_rate(&self) -> f64 {
        self.final_report.overall_rate
    }
}

/// Executes rounds on behalf of the controller.
#[async_trait]
pub trait RoundExecutor: Send {
    /// One plain reachability check. An error here is fatal.
    async fn check_connectivity(&self) -> Result<()>;

    /// Run one full round of `iterations` from a clean state.
    async fn run_round(&mut self, round: u32, iterations: u32) -> Result<RunReport>;
}

/// Drives [`RoundExecutor`] rounds under a [`ConvergencePolicy`].
pub struct ConvergenceController {
    policy: ConvergencePolicy,
}

impl ConvergenceController {
    pub fn new(policy: ConvergencePolicy) -> Self {
        Self { policy }
    }

    /// Run until the target rate is reached or the retry bound is exhausted.
    ///
    /// `observer` sees every round's report as soon as it is available.
    /// Returns early with the connectivity error, before any round, when the
    /// target cannot be reached.
    pub async fn run<E, F>(&self, executor: &mut E, mut observer: F) -> Result<ConvergenceSummary>
    where
        E: RoundExecutor + ?Sized,
        F: FnMut(&RunReport),
    {
        executor.check_connectivity().await?;

        let mut round = 1u32;
        let mut history = Vec::new();
        let mut report = executor
            .run_round(round, self.policy.initial_iterations)
            .await?;
        observer(&report);
        history.push(record(&report, round, self.policy.initial_iterations));

        let stop_reason = loop {
            if !report.has_probes() {
                warn!(round, "Round executed no probes, stopping");
                break StopReason::NoProbes;
            }
            if report.overall_rate >= self.policy.target_rate {
                break StopReason::Converged;
            }
            if round > self.policy.max_rounds {
                warn!(round, "Maximum number of rounds reached");
                break StopReason::RoundLimit;
            }

            info!(
                round,
                rate = report.overall_rate,
                "Success rate is {:.1}%, retrying",
                report.overall_rate
            );
            if self.policy.retry_pause_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.policy.retry_pause_ms))
                    .await;
            }

            round += 1;
            report = executor
                .run_round(round, self.policy.retry_iterations)
                .await?;
            observer(&report);
            history.push(record(&report, round, self.policy.retry_iterations));
        };

        info!(
            rounds = round,
            rate = report.overall_rate,
            reason = ?stop_reason,
            "Convergence finished"
        );

        Ok(ConvergenceSummary {
            rounds: round,
            stop_reason,
            history,
            final_report: report,
        })
    }
}

fn record(report: &RunReport, round: u32, iterations: u32) -> RoundRecord {
    RoundRecord {
        round,
        iterations,
        overall_rate: report.overall_rate,
    }
}

/// Live executor: each round gets a brand-new session client and feature set.
pub struct HttpRounds {
    config: MonkeyConfig,
    features: fn() -> FeatureSet,
}

impl HttpRounds {
    /// Rounds over the ten standard feature probes.
    pub fn new(config: MonkeyConfig) -> Self {
        Self::with_features(config, FeatureSet::standard)
    }

    /// Rounds over a custom feature set, rebuilt for every round.
    pub fn with_features(config: MonkeyConfig, features: fn() -> FeatureSet) -> Self {
        Self { config, features }
    }
}

#[async_trait]
impl RoundExecutor for HttpRounds {
    async fn check_connectivity(&self) -> Result<()> {
        let status =
            probe_reachability(&self.config.base_url, self.config.connect_timeout()).await?;
        info!(base_url = %self.config.base_url, status, "Connected to target application");
        Ok(())
    }

    async fn run_round(&mut self, round: u32, iterations: u32) -> Result<RunReport> {
        let started_at = Utc::now();
        let client = SessionClient::new(&self.config)?;
        let features = (self.features)();
        let aggregator = RunAggregator::new(client, DelayPolicy::from_config(&self.config));

        info!(round, iterations, "=== Monkey test round {} ({} iterations) ===", round, iterations);
        let results = aggregator.run_all(&features, iterations).await;

        Ok(RunReport::from_results(&results, round, iterations).started_at(started_at))
    }
}
