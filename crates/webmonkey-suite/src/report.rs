//! Run reports: per-feature and overall success rates.
//!
//! Provides two renderings of the same [`RunReport`]:
//! - a fixed-width text table for the console (`Display`)
//! - the serde representation (`--format json`)

use std::fmt;
use std::io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use webmonkey_core::RunResults;

/// Features whose own success rate is strictly below this are flagged.
pub const ATTENTION_THRESHOLD: f64 = 50.0;

const RULE_WIDTH: usize = 60;

/// One feature's line in the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRow {
    pub name: String,
    pub success: u32,
    pub total: u32,
    pub rate: f64,
    pub error_count: usize,
    pub first_error: Option<String>,
}

/// Summary of one round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub round: u32,
    pub iterations: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub features: Vec<FeatureRow>,
    pub total_success: u32,
    pub total_probes: u32,
    pub overall_rate: f64,
    /// Features below [`ATTENTION_THRESHOLD`], in registration order.
    pub needs_attention: Vec<String>,
}

impl RunReport {
    /// Build the report for one round from its counters.
    pub fn from_results(results: &RunResults, round: u32, iterations: u32) -> Self {
        let features = results
            .iter()
            .map(|f| FeatureRow {
                name: f.name.clone(),
                success: f.result.success(),
                total: f.result.total(),
                rate: f.result.rate(),
                error_count: f.result.errors().len(),
                first_error: f.result.first_error().map(str::to_string),
            })
            .collect();
        let now = Utc::now();

        Self {
            run_id: Uuid::new_v4(),
            round,
            iterations,
            started_at: now,
            finished_at: now,
            features,
            total_success: results.total_success(),
            total_probes: results.total_probes(),
            overall_rate: results.overall_rate(),
            needs_attention: results
                .below(ATTENTION_THRESHOLD)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Whether at least one probe ran.
    pub fn has_probes(&self) -> bool {
        self.total_probes > 0
    }

    /// Every probe in the round succeeded.
    pub fn is_perfect(&self) -> bool {
        self.has_probes() && self.total_success == self.total_probes
    }
}

/// Fixed-width console table.
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{}", heavy)?;
        writeln!(
            f,
            "Monkey test results (round {}, {} iterations)",
            self.round, self.iterations
        )?;
        writeln!(f, "{}", heavy)?;

        for row in &self.features {
            writeln!(
                f,
                "{:<20} | {:>3}/{:<3} | {:>6.1}%",
                row.name, row.success, row.total, row.rate
            )?;
            if let Some(error) = &row.first_error {
                writeln!(f, "  Example error: {}", error)?;
            }
        }

        writeln!(f, "{}", light)?;
        writeln!(
            f,
            "{:<20} | {:>3}/{:<3} | {:>6.1}%",
            "Overall", self.total_success, self.total_probes, self.overall_rate
        )?;
        writeln!(f, "{}", heavy)?;

        if !self.needs_attention.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Features needing attention (success rate below {:.0}%):",
                ATTENTION_THRESHOLD
            )?;
            for name in &self.needs_attention {
                writeln!(f, "- {}", name)?;
            }
        }
        Ok(())
    }
}

/// Write the report table for one round of `results` and return the overall
/// success rate (0 when no probe ran).
pub fn render<W: io::Write>(
    results: &RunResults,
    round: u32,
    iterations: u32,
    out: &mut W,
) -> io::Result<f64> {
    let report = RunReport::from_results(results, round, iterations);
    write!(out, "{}", report)?;
    Ok(report.overall_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use webmonkey_core::ProbeOutcome;

    fn sample_results() -> RunResults {
        let mut results = RunResults::for_features(["Login", "Search", "Follow"]);
        for _ in 0..4 {
            results.record("Login", ProbeOutcome::success());
        }
        results.record("Search", ProbeOutcome::success());
        results.record("Search", ProbeOutcome::errored("GET /search returned 500"));
        results.record("Follow", ProbeOutcome::errored("connection refused"));
        results.record("Follow", ProbeOutcome::errored("timed out"));
        results.record("Follow", ProbeOutcome::success());
        results
    }

    #[test]
    fn test_report_counts() {
        let report = RunReport::from_results(&sample_results(), 1, 4);
        assert_eq!(report.features.len(), 3);
        assert_eq!(report.total_success, 6);
        assert_eq!(report.total_probes, 9);
        assert!((report.overall_rate - 600.0 / 9.0).abs() < 1e-9);
        assert!(report.has_probes());
        assert!(!report.is_perfect());
    }

    #[test]
    fn test_report_carries_round_metadata() {
        let report = RunReport::from_results(&sample_results(), 4, 3);
        assert_eq!(report.round, 4);
        assert_eq!(report.iterations, 3);
        assert!(report.finished_at >= report.started_at);

        let v = serde_json::to_value(&report).expect("to_value");
        assert_eq!(v["round"], 4);
        assert_eq!(v["iterations"], 3);
    }

    #[test]
    fn test_attention_list_excludes_exactly_half() {
        let report = RunReport::from_results(&sample_results(), 1, 4);
        // Search sits at exactly 50% and is not flagged.
        assert_eq!(report.needs_attention, vec!["Follow".to_string()]);
    }

    #[test]
    fn test_first_error_is_kept() {
        let report = RunReport::from_results(&sample_results(), 1, 4);
        let follow = report.features.iter().find(|r| r.name == "Follow").unwrap();
        assert_eq!(follow.first_error.as_deref(), Some("connection refused"));
        assert_eq!(follow.error_count, 2);

        let login = report.features.iter().find(|r| r.name == "Login").unwrap();
        assert!(login.first_error.is_none());
    }

    #[test]
    fn test_display_table_contents() {
        let table = RunReport::from_results(&sample_results(), 2, 3).to_string();
        assert!(table.contains("round 2, 3 iterations"));
        assert!(table.contains("Login                |   4/4   |  100.0%"));
        assert!(table.contains("  Example error: connection refused"));
        assert!(table.contains("Overall"));
        assert!(table.contains("66.7%"));
        assert!(table.contains("below 50%"));
        assert!(table.contains("- Follow"));
        assert!(!table.contains("- Search"));
    }

    #[test]
    fn test_render_returns_overall_rate() {
        let mut buf = Vec::new();
        let rate = render(&sample_results(), 1, 4, &mut buf).expect("render");
        assert!((rate - 600.0 / 9.0).abs() < 1e-9);
        assert!(String::from_utf8(buf).unwrap().contains("Monkey test results"));
    }

    #[test]
    fn test_render_without_probes_is_zero() {
        let results = RunResults::for_features(["Login"]);
        let mut buf = Vec::new();
        let rate = render(&results, 1, 0, &mut buf).expect("render");
        assert_eq!(rate, 0.0);
        assert!(!rate.is_nan());

        let report = RunReport::from_results(&results, 1, 0);
        assert!(!report.has_probes());
        assert!(!report.is_perfect());
        // A feature that never ran sits at 0% and is flagged.
        assert_eq!(report.needs_attention, vec!["Login".to_string()]);
    }

    #[test]
    fn test_perfect_report() {
        let mut results = RunResults::for_features(["Login"]);
        results.record("Login", ProbeOutcome::success());
        let report = RunReport::from_results(&results, 1, 1);
        assert!(report.is_perfect());
        assert_eq!(report.overall_rate, 100.0);
        assert!(report.needs_attention.is_empty());
        assert!(!report.to_string().contains("needing attention"));
    }

    #[test]
    fn test_report_json_fields() {
        let report = RunReport::from_results(&sample_results(), 1, 4);
        let v = serde_json::to_value(&report).expect("to_value");
        let obj = v.as_object().expect("object");
        for key in &[
            "run_id",
            "round",
            "iterations",
            "started_at",
            "finished_at",
            "features",
            "total_success",
            "total_probes",
            "overall_rate",
            "needs_attention",
        ] {
            assert!(obj.contains_key(*key), "missing key: {}", key);
        }
    }
}
