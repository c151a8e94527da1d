//! Probe verdicts and per-feature run counters.

use serde::{Deserialize, Serialize};

/// Verdict of one probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub succeeded: bool,
    /// Error text or rejection diagnostic, if the probe has one to report.
    pub error_message: Option<String>,
}

impl ProbeOutcome {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            error_message: None,
        }
    }

    /// Failed without an exceptional cause worth logging.
    pub fn failure() -> Self {
        Self {
            succeeded: false,
            error_message: None,
        }
    }

    /// Failed with a message for the feature's error log.
    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error_message: Some(message.into()),
        }
    }
}

/// Counters for one feature over one run.
///
/// `success <= total` always holds: the only mutators bump `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    success: u32,
    total: u32,
    errors: Vec<String>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one probe invocation.
    pub fn record(&mut self, outcome: ProbeOutcome) {
        self.total += 1;
        if outcome.succeeded {
            self.success += 1;
        } else if let Some(message) = outcome.error_message {
            self.errors.push(message);
        }
    }

    pub fn success(&self) -> u32 {
        self.success
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn failures(&self) -> u32 {
        self.total - self.success
    }

    /// Captured error messages, oldest first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    /// Success rate in percent; 0 when nothing ran.
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.success) / f64::from(self.total) * 100.0
        }
    }
}

/// One feature's counters, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureResult {
    pub name: String,
    pub result: RunResult,
}

/// Results of one full run, in feature registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResults {
    features: Vec<FeatureResult>,
}

impl RunResults {
    /// Empty counters for each named feature, preserving order.
    pub fn for_features<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: names
                .into_iter()
                .map(|name| FeatureResult {
                    name: name.into(),
                    result: RunResult::new(),
                })
                .collect(),
        }
    }

    /// Record an outcome for `name`, appending the feature if unseen.
    pub fn record(&mut self, name: &str, outcome: ProbeOutcome) {
        match self.features.iter_mut().find(|f| f.name == name) {
            Some(feature) => feature.result.record(outcome),
            None => {
                let mut result = RunResult::new();
                result.record(outcome);
                self.features.push(FeatureResult {
                    name: name.to_string(),
                    result,
                });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&RunResult> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.result)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureResult> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn total_success(&self) -> u32 {
        self.features.iter().map(|f| f.result.success()).sum()
    }

    pub fn total_probes(&self) -> u32 {
        self.features.iter().map(|f| f.result.total()).sum()
    }

    /// Aggregate success rate in percent; 0 when no probe ran.
    pub fn overall_rate(&self) -> f64 {
        let total = self.total_probes();
        if total == 0 {
            0.0
        } else {
            f64::from(self.total_success()) / f64::from(total) * 100.0
        }
    }

    /// Features whose own rate is strictly below `threshold` percent.
    pub fn below(&self, threshold: f64) -> Vec<&str> {
        self.features
            .iter()
            .filter(|f| f.result.rate() < threshold)
            .map(|f| f.name.as_str())
            .collect()
    }
}
