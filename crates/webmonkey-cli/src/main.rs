//! Web Monkey - randomized black-box feature exerciser
//!
//! The `webmonkey` command fires semi-random HTTP requests at the feature
//! endpoints of a running web application and reports how often each
//! feature answered with an acceptable status. Rounds are repeated until
//! every probe succeeds or the retry bound is reached.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};

use webmonkey_core::{MonkeyConfig, MonkeyError};
use webmonkey_suite::{
    ConvergenceController, ConvergencePolicy, ConvergenceSummary, HttpRounds, RunReport,
    StopReason,
};

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Fixed-width table per round
    Text,
    /// One JSON document describing the whole run
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "webmonkey")]
#[command(author = "Web Monkey Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Randomized black-box monkey tester for web applications", long_about = None)]
struct Cli {
    /// Base URL of the application under test (overrides --base-url)
    #[arg(value_name = "URL")]
    target: Option<String>,

    /// Base URL of the application under test (falls back to
    /// $MONKEY_BASE_URL, then http://localhost:8080)
    #[arg(long)]
    base_url: Option<String>,

    /// Iterations in the first round
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Iterations in every retry round
    #[arg(long)]
    retry_iterations: Option<u32>,

    /// Retry rounds allowed after the first one
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Pause between rounds, in milliseconds
    #[arg(long)]
    retry_pause_ms: Option<u64>,

    /// Lower bound of the random delay between probes, in milliseconds
    #[arg(long)]
    min_delay_ms: Option<u64>,

    /// Upper bound of the random delay between probes, in milliseconds
    #[arg(long)]
    max_delay_ms: Option<u64>,

    /// Disable the delay between probes
    #[arg(long)]
    no_delay: bool,

    /// Timeout of the initial reachability check, in seconds
    #[arg(long)]
    connect_timeout_secs: Option<u64>,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the environment defaults.
    fn config(&self) -> MonkeyConfig {
        let mut config = MonkeyConfig::from_env();

        if let Some(url) = self.target.as_ref().or(self.base_url.as_ref()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(n) = self.iterations {
            config.initial_iterations = n;
        }
        if let Some(n) = self.retry_iterations {
            config.retry_iterations = n;
        }
        if let Some(n) = self.max_rounds {
            config.max_rounds = n;
        }
        if let Some(ms) = self.retry_pause_ms {
            config.retry_pause_ms = ms;
        }
        if let Some(ms) = self.min_delay_ms {
            config.probe_delay_min_ms = ms;
        }
        if let Some(ms) = self.max_delay_ms {
            config.probe_delay_max_ms = ms;
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout_secs = secs;
        }

        if self.no_delay {
            config.without_delay()
        } else {
            config
        }
    }

    fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    webmonkey_core::init_tracing(cli.json, cli.log_level());
    webmonkey_core::install_panic_hook();

    let config = cli.config();
    config.validate().context("invalid configuration")?;

    info!(
        base_url = %config.base_url,
        version = webmonkey_core::VERSION,
        "Starting monkey test"
    );

    let controller = ConvergenceController::new(ConvergencePolicy::from_config(&config));
    let mut rounds = HttpRounds::new(config.clone());
    let format = cli.format;

    let outcome = controller
        .run(&mut rounds, |report| {
            if format == OutputFormat::Text {
                print_round(report);
            }
        })
        .await;

    let summary = match outcome {
        Ok(summary) => summary,
        Err(MonkeyError::Unreachable { url, reason }) => {
            eprintln!("Error: target application is not running ({})", reason);
            eprintln!("Start the application at {} and try again.", url);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("monkey test aborted"),
    };

    match format {
        OutputFormat::Text => print_conclusion(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(ExitCode::SUCCESS)
}

fn print_round(report: &RunReport) {
    println!();
    print!("{}", report);
}

fn print_conclusion(summary: &ConvergenceSummary) {
    println!();
    if summary.final_report.is_perfect() {
        println!(
            "🎉 Every feature responded as expected (100%) after {} round(s)",
            summary.rounds
        );
        return;
    }

    if summary.stop_reason == StopReason::RoundLimit {
        println!("✗ Maximum number of rounds reached ({})", summary.rounds);
    }
    println!("Final success rate: {:.1}%", summary.final_rate());
}

#[cfg(test)]
mod tests {
    use super::*;
    use webmonkey_core::{BASE_URL_ENV, DEFAULT_BASE_URL};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["webmonkey"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        let cli = parse(&["--base-url", DEFAULT_BASE_URL]);
        assert_eq!(cli.config(), MonkeyConfig::default());
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.log_level(), Level::INFO);
    }

    #[test]
    fn test_base_url_from_environment() {
        std::env::set_var(BASE_URL_ENV, " http://env.example:8081 ");
        let from_env = parse(&[]).config();
        let overridden = parse(&["--base-url", "http://flag.example"]).config();
        std::env::remove_var(BASE_URL_ENV);
        let unset = parse(&[]).config();

        assert_eq!(from_env.base_url, "http://env.example:8081");
        assert_eq!(overridden.base_url, "http://flag.example");
        assert_eq!(unset.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_positional_target_wins() {
        let cli = parse(&["--base-url", "http://a.example", "http://b.example:3000"]);
        assert_eq!(cli.config().base_url, "http://b.example:3000");
    }

    #[test]
    fn test_overrides_are_applied() {
        let cli = parse(&[
            "http://localhost:9000",
            "--iterations",
            "2",
            "--retry-iterations",
            "1",
            "--max-rounds",
            "0",
            "--retry-pause-ms",
            "10",
            "--min-delay-ms",
            "5",
            "--max-delay-ms",
            "6",
            "--connect-timeout-secs",
            "1",
            "--format",
            "json",
            "--verbose",
        ]);
        let config = cli.config();
        assert_eq!(config.initial_iterations, 2);
        assert_eq!(config.retry_iterations, 1);
        assert_eq!(config.max_rounds, 0);
        assert_eq!(config.retry_pause_ms, 10);
        assert_eq!(config.probe_delay_min_ms, 5);
        assert_eq!(config.probe_delay_max_ms, 6);
        assert_eq!(config.connect_timeout_secs, 1);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_level(), Level::DEBUG);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_delay_clears_bounds() {
        let cli = parse(&["http://localhost:9000", "--min-delay-ms", "50", "--no-delay"]);
        let config = cli.config();
        assert_eq!(config.probe_delay_min_ms, 0);
        assert_eq!(config.probe_delay_max_ms, 0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Cli::try_parse_from(["webmonkey", "--iterations", "many"]).is_err());
        assert!(Cli::try_parse_from(["webmonkey", "--format", "xml"]).is_err());

        let cli = parse(&["ftp://localhost", "--iterations", "0"]);
        assert!(cli.config().validate().is_err());
    }
}
