//! Probe step execution.

use tracing::{debug, warn};
use webmonkey_core::{HttpClient, ProbeOutcome};

use crate::step::{OnReject, ProbeStep};

/// Executes a probe's step plan against a session and reduces it to a verdict.
pub struct ProbeRunner;

impl ProbeRunner {
    /// Run `steps` in order.
    ///
    /// - A transport error ends the probe as a failure carrying the error text.
    /// - An accepted status moves on to the next step.
    /// - A rejected status applies the step's [`OnReject`] policy; the first
    ///   rejection diagnostic is kept as the outcome's message.
    pub async fn execute(client: &dyn HttpClient, steps: &[ProbeStep]) -> ProbeOutcome {
        let mut rejection: Option<String> = None;

        for step in steps {
            let label = step.request.label();
            let response = match client.request(&step.request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(request = %label, error = %e, "Probe request failed");
                    return ProbeOutcome::errored(format!("{}: {}", label, e));
                }
            };

            if step.accept.accepts(response.status) {
                debug!(request = %label, status = response.status, "Step accepted");
                continue;
            }

            let diagnostic = format!(
                "{} returned {}, expected one of {}",
                label, response.status, step.accept
            );
            match step.on_reject {
                OnReject::PassEarly => {
                    debug!(request = %label, status = response.status, "Step rejected, treating as expected redirect");
                    return ProbeOutcome::success();
                }
                OnReject::Fail => {
                    debug!(request = %label, status = response.status, "Step rejected, aborting probe");
                    return ProbeOutcome::errored(diagnostic);
                }
                OnReject::Continue => {
                    debug!(request = %label, status = response.status, "Step rejected");
                    rejection.get_or_insert(diagnostic);
                }
            }
        }

        match rejection {
            None => ProbeOutcome::success(),
            Some(diagnostic) => ProbeOutcome::errored(diagnostic),
        }
    }
}
