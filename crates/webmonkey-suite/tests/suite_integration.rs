//! Integration tests for the probe suite against a mock web application.

use webmonkey_core::MonkeyConfig;
use webmonkey_suite::{
    ConvergenceController, ConvergencePolicy, FeatureProbe, HttpRounds, RunReport, StopReason,
};
use wiremock::matchers::{any, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_config(base_url: &str, initial: u32, retry: u32, max_rounds: u32) -> MonkeyConfig {
    let mut config = MonkeyConfig::new(base_url).without_delay().without_pause();
    config.initial_iterations = initial;
    config.retry_iterations = retry;
    config.max_rounds = max_rounds;
    config
}

fn row<'a>(report: &'a RunReport, probe: FeatureProbe) -> &'a webmonkey_suite::FeatureRow {
    report
        .features
        .iter()
        .find(|r| r.name == probe.label())
        .expect("feature row")
}

/// Test: a healthy application converges in the first round
#[tokio::test]
async fn test_healthy_app_converges_first_round() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = quick_config(&server.uri(), 2, 1, 5);
    let controller = ConvergenceController::new(ConvergencePolicy::from_config(&config));
    let mut rounds = HttpRounds::new(config);

    let summary = controller.run(&mut rounds, |_| {}).await.expect("run");

    assert_eq!(summary.rounds, 1);
    assert_eq!(summary.stop_reason, StopReason::Converged);
    assert_eq!(summary.final_rate(), 100.0);
    assert_eq!(summary.final_report.total_probes, 20);
    for feature in &summary.final_report.features {
        assert_eq!(feature.total, 2, "{}", feature.name);
    }

    // One reachability GET plus 20 calls per iteration.
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1 + 2 * 20);
}

/// Test: an application answering 404 everywhere is scored per acceptance set
#[tokio::test]
async fn test_not_found_everywhere_scores_lenient_probes_only() {
    let server = MockServer::start().await;

    let config = quick_config(&server.uri(), 1, 1, 0);
    let controller = ConvergenceController::new(ConvergencePolicy::from_config(&config));
    let mut rounds = HttpRounds::new(config);

    let summary = controller.run(&mut rounds, |_| {}).await.expect("run");
    let report = &summary.final_report;

    assert_eq!(summary.stop_reason, StopReason::RoundLimit);
    for probe in [
        FeatureProbe::ProfileEdit,
        FeatureProbe::PostCreation,
        FeatureProbe::PostEdit,
        FeatureProbe::PostDeletion,
    ] {
        assert_eq!(row(report, probe).success, 1, "{}", probe.label());
    }
    for probe in [
        FeatureProbe::Registration,
        FeatureProbe::Login,
        FeatureProbe::ProfileDisplay,
        FeatureProbe::Follow,
        FeatureProbe::TimelineDisplay,
        FeatureProbe::Search,
    ] {
        let r = row(report, probe);
        assert_eq!(r.success, 0, "{}", probe.label());
        assert!(r.first_error.as_deref().unwrap_or("").contains("404"));
    }
    assert!((report.overall_rate - 40.0).abs() < 1e-9);
    assert_eq!(report.needs_attention.len(), 6);
}

/// Test: a broken endpoint keeps the rate below target until the bound
#[tokio::test]
async fn test_broken_search_exhausts_rounds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;

    let config = quick_config(&server.uri(), 1, 1, 2);
    let controller = ConvergenceController::new(ConvergencePolicy::from_config(&config));
    let mut rounds = HttpRounds::new(config);
    let mut reports = Vec::new();

    let summary = controller
        .run(&mut rounds, |report| reports.push(report.clone()))
        .await
        .expect("run");

    assert_eq!(summary.rounds, 3);
    assert_eq!(summary.stop_reason, StopReason::RoundLimit);
    assert_eq!(reports.len(), 3);
    // The registration and login pages must render with 200, so a redirect
    // fails them alongside the broken search.
    for report in &reports {
        assert_eq!(
            report.needs_attention,
            vec![
                "User registration".to_string(),
                "Login".to_string(),
                "Search".to_string(),
            ]
        );
        assert_eq!(report.total_probes, 10);
    }
    assert!((summary.final_rate() - 70.0).abs() < 1e-9);
}

/// Test: every round starts with an empty cookie jar
#[tokio::test]
async fn test_each_round_uses_fresh_session() {
    let server = MockServer::start().await;
    // Registration only renders for visitors without a session.
    Mock::given(method("GET"))
        .and(path("/user/register"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).insert_header("Set-Cookie", "SESSION=abc; Path=/"))
        .mount(&server)
        .await;

    let config = quick_config(&server.uri(), 1, 1, 1);
    let controller = ConvergenceController::new(ConvergencePolicy::from_config(&config));
    let mut rounds = HttpRounds::new(config);
    let mut reports = Vec::new();

    let summary = controller
        .run(&mut rounds, |report| reports.push(report.clone()))
        .await
        .expect("run");

    assert_eq!(summary.rounds, 2);
    for report in &reports {
        assert_eq!(row(report, FeatureProbe::Registration).success, 1);
        assert_eq!(row(report, FeatureProbe::Search).success, 0);
    }
}

/// Test: an unreachable target fails before any probe runs
#[tokio::test]
async fn test_unreachable_target_is_fatal() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let mut config = quick_config(&format!("http://127.0.0.1:{}", port), 1, 1, 5);
    config.connect_timeout_secs = 1;
    let controller = ConvergenceController::new(ConvergencePolicy::from_config(&config));
    let mut rounds = HttpRounds::new(config);
    let mut seen = 0;

    let err = controller
        .run(&mut rounds, |_| seen += 1)
        .await
        .expect_err("nothing listens on the port");

    assert!(err.is_fatal());
    assert_eq!(seen, 0);
}
