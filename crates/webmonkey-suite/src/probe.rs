//! Feature probes and the ordered feature set.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use webmonkey_core::{HttpClient, MonkeyError, ProbeOutcome, ProbeRequest, Result};

use crate::runner::ProbeRunner;
use crate::step::{AcceptSet, ProbeStep};

/// Capability "attempt feature X and report success/failure".
///
/// Implementations own their failures: transport errors and rejected
/// statuses come back as an unsuccessful [`ProbeOutcome`], never as a panic
/// or an `Err`.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn attempt(&self, client: &dyn HttpClient) -> ProbeOutcome;
}

/// Builtin feature probes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureProbe {
    /// GET/POST /user/register
    Registration,

    /// GET /user, POST /user/login
    Login,

    /// GET /profile, GET /profile/{userId}
    ProfileDisplay,

    /// GET/POST /profile/edit
    ProfileEdit,

    /// GET /follow, /follow/following, /follow/followers, POST /follow/{userId}
    Follow,

    /// GET /board
    TimelineDisplay,

    /// GET/POST /board
    PostCreation,

    /// GET/POST /board/edit/{postId}
    PostEdit,

    /// POST /board/delete/{postId}
    PostDeletion,

    /// GET /search, GET /search?q=...
    Search,
}

impl FeatureProbe {
    /// Every builtin probe, in registration order.
    pub const ALL: [FeatureProbe; 10] = [
        FeatureProbe::Registration,
        FeatureProbe::Login,
        FeatureProbe::ProfileDisplay,
        FeatureProbe::ProfileEdit,
        FeatureProbe::Follow,
        FeatureProbe::TimelineDisplay,
        FeatureProbe::PostCreation,
        FeatureProbe::PostEdit,
        FeatureProbe::PostDeletion,
        FeatureProbe::Search,
    ];

    /// Human-readable feature name used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            FeatureProbe::Registration => "User registration",
            FeatureProbe::Login => "Login",
            FeatureProbe::ProfileDisplay => "Profile display",
            FeatureProbe::ProfileEdit => "Profile edit",
            FeatureProbe::Follow => "Follow",
            FeatureProbe::TimelineDisplay => "Timeline display",
            FeatureProbe::PostCreation => "Post creation",
            FeatureProbe::PostEdit => "Post edit",
            FeatureProbe::PostDeletion => "Post deletion",
            FeatureProbe::Search => "Search",
        }
    }

    /// Build this probe's call sequence with fresh random inputs.
    pub fn plan<R: Rng>(&self, rng: &mut R) -> Vec<ProbeStep> {
        match self {
            FeatureProbe::Registration => vec![
                ProbeStep::new(ProbeRequest::get("/user/register"), AcceptSet::OK).required(),
                ProbeStep::new(
                    ProbeRequest::post("/user/register")
                        .form("username", format!("testuser_{}", rng.gen_range(1000..=9999)))
                        .form("password", format!("password_{}", rng.gen_range(100..=999)))
                        .form("displayName", format!("test user_{}", rng.gen_range(100..=999))),
                    AcceptSet::PAGE,
                ),
            ],
            FeatureProbe::Login => vec![
                ProbeStep::new(ProbeRequest::get("/user"), AcceptSet::OK).required(),
                // Credentials are random, so rejection by auth is the common case.
                ProbeStep::new(
                    ProbeRequest::post("/user/login")
                        .form("username", format!("testuser_{}", rng.gen_range(1..=100)))
                        .form("password", format!("password_{}", rng.gen_range(1..=100))),
                    AcceptSet::SUBMIT,
                ),
            ],
            FeatureProbe::ProfileDisplay => vec![
                ProbeStep::new(ProbeRequest::get("/profile"), AcceptSet::PAGE),
                ProbeStep::new(
                    ProbeRequest::get(format!("/profile/user_{}", rng.gen_range(1..=100))),
                    AcceptSet::PAGE_OR_MISSING,
                ),
            ],
            FeatureProbe::ProfileEdit => vec![
                ProbeStep::new(ProbeRequest::get("/profile/edit"), AcceptSet::PAGE).pass_early(),
                ProbeStep::new(
                    ProbeRequest::post("/profile/edit")
                        .form(
                            "displayName",
                            format!("updated user_{}", rng.gen_range(100..=999)),
                        )
                        .form("bio", format!("updated bio_{}", rng.gen_range(100..=999))),
                    AcceptSet::SUBMIT,
                ),
            ],
            FeatureProbe::Follow => vec![
                ProbeStep::new(ProbeRequest::get("/follow"), AcceptSet::PAGE),
                ProbeStep::new(ProbeRequest::get("/follow/following"), AcceptSet::PAGE),
                ProbeStep::new(ProbeRequest::get("/follow/followers"), AcceptSet::PAGE),
                ProbeStep::new(
                    ProbeRequest::post(format!("/follow/user_{}", rng.gen_range(1..=100))),
                    AcceptSet::FOLLOW,
                ),
            ],
            FeatureProbe::TimelineDisplay => {
                vec![ProbeStep::new(ProbeRequest::get("/board"), AcceptSet::PAGE)]
            }
            FeatureProbe::PostCreation => vec![
                ProbeStep::new(ProbeRequest::get("/board"), AcceptSet::PAGE).pass_early(),
                ProbeStep::new(
                    ProbeRequest::post("/board").form(
                        "text",
                        format!(
                            "test post_{}_{}",
                            rng.gen_range(1000..=9999),
                            chrono::Utc::now().timestamp_millis()
                        ),
                    ),
                    AcceptSet::SUBMIT,
                ),
            ],
            FeatureProbe::PostEdit => {
                let path = format!("/board/edit/post_{}", rng.gen_range(1..=100));
                vec![
                    ProbeStep::new(ProbeRequest::get(path.clone()), AcceptSet::PAGE_OR_MISSING),
                    ProbeStep::new(
                        ProbeRequest::post(path).form(
                            "text",
                            format!("edited test post_{}", rng.gen_range(1000..=9999)),
                        ),
                        AcceptSet::MUTATE,
                    ),
                ]
            }
            FeatureProbe::PostDeletion => vec![ProbeStep::new(
                ProbeRequest::post(format!("/board/delete/post_{}", rng.gen_range(1..=100))),
                AcceptSet::MUTATE,
            )],
            FeatureProbe::Search => vec![
                ProbeStep::new(ProbeRequest::get("/search"), AcceptSet::PAGE),
                ProbeStep::new(
                    ProbeRequest::get("/search")
                        .query("q", format!("test_{}", rng.gen_range(1..=100))),
                    AcceptSet::PAGE,
                ),
            ],
        }
    }
}

#[async_trait]
impl Probe for FeatureProbe {
    async fn attempt(&self, client: &dyn HttpClient) -> ProbeOutcome {
        let steps = {
            let mut rng = rand::thread_rng();
            self.plan(&mut rng)
        };
        ProbeRunner::execute(client, &steps).await
    }
}

/// A named probe. Immutable once registered.
pub struct Feature {
    name: String,
    probe: Box<dyn Probe>,
}

impl Feature {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn probe(&self) -> &dyn Probe {
        self.probe.as_ref()
    }
}

impl std::fmt::Debug for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feature").field("name", &self.name).finish()
    }
}

/// Ordered set of uniquely named features.
#[derive(Debug, Default)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ten builtin feature probes.
    pub fn standard() -> Self {
        Self {
            features: FeatureProbe::ALL
                .iter()
                .map(|probe| Feature {
                    name: probe.label().to_string(),
                    probe: Box::new(*probe),
                })
                .collect(),
        }
    }

    /// Append a feature. Names must be unique within the set.
    pub fn register(&mut self, name: impl Into<String>, probe: impl Probe + 'static) -> Result<()> {
        let name = name.into();
        if self.features.iter().any(|f| f.name == name) {
            return Err(MonkeyError::DuplicateFeature(name));
        }
        self.features.push(Feature {
            name,
            probe: Box::new(probe),
        });
        Ok(())
    }

    /// Builder-style [`FeatureSet::register`].
    pub fn with(mut self, name: impl Into<String>, probe: impl Probe + 'static) -> Result<Self> {
        self.register(name, probe)?;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
