//! Run aggregation: every feature, every iteration, counted.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use rand::Rng;
use tracing::{info, warn};
use webmonkey_core::{panic_message, HttpClient, MonkeyConfig, ProbeOutcome, RunResults};

use crate::probe::{Feature, FeatureSet};

/// Random pause inserted between probe invocations to avoid request bursts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    min: Duration,
    max: Duration,
}

impl DelayPolicy {
    /// Uniform delay within `[min, max]`. Inverted bounds are swapped.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No pause at all.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &MonkeyConfig) -> Self {
        Self::new(
            Duration::from_millis(config.probe_delay_min_ms),
            Duration::from_millis(config.probe_delay_max_ms),
        )
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    /// Draw one delay.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rng.gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_millis(500))
    }
}

/// Runs a feature set for a number of iterations over one session.
///
/// The aggregator exclusively owns its client (and the client's cookie jar);
/// dropping the aggregator drops the session.
pub struct RunAggregator<C> {
    client: C,
    delay: DelayPolicy,
}

impl<C: HttpClient> RunAggregator<C> {
    pub fn new(client: C, delay: DelayPolicy) -> Self {
        Self { client, delay }
    }

    /// Invoke every feature once per iteration, in registration order.
    ///
    /// Every invocation counts toward its feature's total, whether the probe
    /// succeeds, fails, or panics, so each feature ends with `total ==
    /// iterations`.
    pub async fn run_all(&self, features: &FeatureSet, iterations: u32) -> RunResults {
        let mut results = RunResults::for_features(features.names());
        let invocations = features.len() as u64 * u64::from(iterations);
        let mut done = 0u64;

        info!(iterations, features = features.len(), "Starting monkey run");

        for iteration in 1..=iterations {
            info!(iteration, iterations, "--- Iteration {}/{} ---", iteration, iterations);

            for feature in features.iter() {
                let outcome = attempt_contained(feature, &self.client).await;
                report_mark(feature.name(), iteration, &outcome);
                results.record(feature.name(), outcome);

                done += 1;
                if done < invocations {
                    self.pause().await;
                }
            }
        }

        info!(
            probes = results.total_probes(),
            succeeded = results.total_success(),
            "Monkey run finished"
        );
        results
    }

    async fn pause(&self) {
        if self.delay.is_disabled() {
            return;
        }
        let delay = {
            let mut rng = rand::thread_rng();
            self.delay.sample(&mut rng)
        };
        tokio::time::sleep(delay).await;
    }
}

/// Run one probe, converting a panic into a failed outcome so one feature's
/// fault never aborts the run.
async fn attempt_contained(feature: &Feature, client: &dyn HttpClient) -> ProbeOutcome {
    match AssertUnwindSafe(feature.probe().attempt(client))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(feature = %feature.name(), error = %message, "Probe panicked");
            ProbeOutcome::errored(format!("probe panicked: {}", message))
        }
    }
}

fn report_mark(name: &str, iteration: u32, outcome: &ProbeOutcome) {
    match (outcome.succeeded, outcome.error_message.as_deref()) {
        (true, _) => info!(feature = %name, iteration, "✓ {}: success", name),
        (false, Some(message)) => {
            info!(feature = %name, iteration, "✗ {}: failure - {}", name, message)
        }
        (false, None) => info!(feature = %name, iteration, "✗ {}: failure", name),
    }
}
