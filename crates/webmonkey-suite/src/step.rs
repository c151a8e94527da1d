//! Probe step definitions and acceptance sets.

use std::fmt;

use webmonkey_core::ProbeRequest;

/// Status codes a single call treats as non-failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptSet(&'static [u16]);

impl AcceptSet {
    /// Page must render.
    pub const OK: AcceptSet = AcceptSet(&[200]);

    /// Page renders or redirects (e.g. to the login form).
    pub const PAGE: AcceptSet = AcceptSet(&[200, 302]);

    /// Page renders, redirects, or the resource does not exist.
    pub const PAGE_OR_MISSING: AcceptSet = AcceptSet(&[200, 302, 404]);

    /// Submission accepted, redirected, or refused for lack of credentials.
    pub const SUBMIT: AcceptSet = AcceptSet(&[200, 302, 401, 403]);

    /// Follow action: accepted, redirected, rejected or unauthenticated.
    pub const FOLLOW: AcceptSet = AcceptSet(&[200, 302, 400, 401]);

    /// Mutation on a possibly missing resource.
    pub const MUTATE: AcceptSet = AcceptSet(&[200, 302, 400, 401, 403, 404]);

    pub fn accepts(&self, status: u16) -> bool {
        self.0.contains(&status)
    }
}

impl fmt::Display for AcceptSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.0.iter().map(u16::to_string).collect();
        f.write_str(&codes.join(", "))
    }
}

/// What a probe does when a step's status falls outside its acceptance set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnReject {
    /// Stop; the probe fails.
    Fail,
    /// Stop; the probe succeeds. Models "redirected away because
    /// unauthenticated", which is itself correct behaviour.
    PassEarly,
    /// Mark the probe failed but still issue the remaining steps.
    Continue,
}

/// One HTTP call inside a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStep {
    pub request: ProbeRequest,
    pub accept: AcceptSet,
    pub on_reject: OnReject,
}

impl ProbeStep {
    pub fn new(request: ProbeRequest, accept: AcceptSet) -> Self {
        Self {
            request,
            accept,
            on_reject: OnReject::Continue,
        }
    }

    /// Abort the probe with failure if this step is rejected.
    pub fn required(mut self) -> Self {
        self.on_reject = OnReject::Fail;
        self
    }

    /// End the probe with success if this step is rejected.
    pub fn pass_early(mut self) -> Self {
        self.on_reject = OnReject::PassEarly;
        self
    }
}
