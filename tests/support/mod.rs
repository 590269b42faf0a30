// ABOUTME: Test support utilities.
// ABOUTME: In-memory fakes for the control plane, builder, watcher, and rollout engine.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use hangar::api::{
    self, ApiError, AppSummary, ConfigSource, ControlPlane, DeployImageInput, Organization,
    Release, ReleaseCommand,
};
use hangar::config::{AppConfig, Platform};
use hangar::deploy::{ReleaseWatcher, RolloutEngine, RolloutError, RolloutSpec, WatchError};
use hangar::image::{
    BuildError, DeploymentImage, Heartbeat, ImageOptions, ImageResolver, RefOptions,
    Result as BuildResult,
};
use hangar::types::{AppName, EvaluationId, ReleaseCommandId, ReleaseId};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("hangar=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn app() -> AppName {
    AppName::new("web").unwrap()
}

pub fn summary(deployed: bool, platform: Option<Platform>) -> AppSummary {
    AppSummary {
        name: app(),
        organization: Organization {
            slug: "acme".to_string(),
        },
        platform_version: platform,
        deployed,
    }
}

pub fn image(tag: &str) -> DeploymentImage {
    DeploymentImage {
        tag: tag.to_string(),
        id: Some("sha256:abc".to_string()),
        digest: None,
        size: 82_854_982,
        labels: HashMap::new(),
    }
}

pub fn release(version: u32, strategy: &str) -> Release {
    Release {
        id: ReleaseId::new(format!("rel_{version}")),
        version,
        deployment_strategy: strategy.to_string(),
        evaluation_id: EvaluationId::new(format!("eval_{version}")),
        status: "pending".to_string(),
        created_at: None,
    }
}

pub fn release_command(command: &str) -> ReleaseCommand {
    ReleaseCommand {
        id: ReleaseCommandId::new("rc_1"),
        command: command.to_string(),
        status: "pending".to_string(),
    }
}

// =============================================================================
// Control plane
// =============================================================================

pub struct FakeControlPlane {
    pub summary: AppSummary,
    /// `None` makes the org settings lookup fail.
    pub org_default_on: Option<bool>,
    /// `None` makes opening a config source fail.
    pub remote_config: Option<AppConfig>,
    pub release: Release,
    pub release_command: Option<ReleaseCommand>,
    /// Returned when the release is fetched again.
    pub refreshed: Option<Release>,
    pub created: Mutex<Vec<DeployImageInput>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeControlPlane {
    pub fn new(summary: AppSummary) -> Self {
        Self {
            summary,
            org_default_on: Some(false),
            remote_config: None,
            release: release(1, "ROLLING"),
            release_command: None,
            refreshed: None,
            created: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

struct FakeConfigSource(AppConfig);

#[async_trait]
impl ConfigSource for FakeConfigSource {
    async fn fetch_config(&self) -> api::Result<AppConfig> {
        Ok(self.0.clone())
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn app_summary(&self, _app: &AppName) -> api::Result<AppSummary> {
        self.record("app_summary");
        Ok(self.summary.clone())
    }

    async fn machines_default_on(&self, _org_slug: &str) -> api::Result<bool> {
        self.record("machines_default_on");
        self.org_default_on
            .ok_or_else(|| ApiError::Other("org settings unavailable".to_string()))
    }

    async fn config_source(&self, app: &AppName) -> api::Result<Box<dyn ConfigSource>> {
        self.record("config_source");
        match &self.remote_config {
            Some(config) => Ok(Box::new(FakeConfigSource(config.clone()))),
            None => Err(ApiError::NotFound(format!("/v1/apps/{app}"))),
        }
    }

    async fn create_release(
        &self,
        input: &DeployImageInput,
    ) -> api::Result<(Release, Option<ReleaseCommand>)> {
        self.record("create_release");
        self.created.lock().push(input.clone());
        Ok((self.release.clone(), self.release_command.clone()))
    }

    async fn release(&self, _app: &AppName, _id: &ReleaseId) -> api::Result<Release> {
        self.record("release");
        Ok(self.refreshed.clone().unwrap_or_else(|| self.release.clone()))
    }
}

// =============================================================================
// Image resolver
// =============================================================================

/// What the fake builder hands back.
#[derive(Clone)]
pub enum Outcome {
    Image(DeploymentImage),
    Nothing,
    Fail(String),
}

impl Outcome {
    fn into_result(self) -> BuildResult<Option<DeploymentImage>> {
        match self {
            Outcome::Image(image) => Ok(Some(image)),
            Outcome::Nothing => Ok(None),
            Outcome::Fail(message) => Err(BuildError::Unsupported(message)),
        }
    }
}

pub struct FakeResolver {
    pub outcome: Outcome,
    pub ref_calls: Mutex<Vec<RefOptions>>,
    pub build_calls: Mutex<Vec<ImageOptions>>,
    /// Heartbeats currently held.
    pub live_heartbeats: Arc<AtomicUsize>,
    /// Heartbeats seen by each build call.
    pub heartbeats_during_build: Mutex<Vec<usize>>,
}

impl FakeResolver {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            ref_calls: Mutex::new(Vec::new()),
            build_calls: Mutex::new(Vec::new()),
            live_heartbeats: Arc::new(AtomicUsize::new(0)),
            heartbeats_during_build: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(tag: &str) -> Self {
        Self::new(Outcome::Image(image(tag)))
    }

    pub fn live_heartbeats(&self) -> usize {
        self.live_heartbeats.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageResolver for FakeResolver {
    async fn resolve_reference(&self, opts: &RefOptions) -> BuildResult<Option<DeploymentImage>> {
        self.ref_calls.lock().push(opts.clone());
        self.outcome.clone().into_result()
    }

    async fn build_image(&self, opts: &ImageOptions) -> BuildResult<Option<DeploymentImage>> {
        self.build_calls.lock().push(opts.clone());
        self.heartbeats_during_build
            .lock()
            .push(self.live_heartbeats());
        self.outcome.clone().into_result()
    }

    fn start_heartbeat(&self) -> Heartbeat {
        self.live_heartbeats.fetch_add(1, Ordering::SeqCst);
        let live = self.live_heartbeats.clone();
        Heartbeat::noop().on_release(move || {
            live.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

// =============================================================================
// Release watcher
// =============================================================================

#[derive(Default)]
pub struct FakeWatcher {
    /// Failure reason for the release command, if it should fail.
    pub command_failure: Option<String>,
    /// Failure reason for the deployment, if it should fail.
    pub deployment_failure: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeWatcher {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ReleaseWatcher for FakeWatcher {
    async fn watch_release_command(
        &self,
        _app: &AppName,
        id: &ReleaseCommandId,
    ) -> Result<(), WatchError> {
        self.calls.lock().push(format!("release_command:{id}"));
        match &self.command_failure {
            Some(reason) => Err(WatchError::Failed {
                what: "release command".to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn watch_deployment(&self, _app: &AppName, id: &EvaluationId) -> Result<(), WatchError> {
        self.calls.lock().push(format!("deployment:{id}"));
        match &self.deployment_failure {
            Some(reason) => Err(WatchError::Failed {
                what: "deployment".to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Rollout engine
// =============================================================================

#[derive(Default)]
pub struct FakeRollout {
    pub fail: bool,
    pub specs: Mutex<Vec<RolloutSpec>>,
}

impl FakeRollout {
    pub fn specs(&self) -> Vec<RolloutSpec> {
        self.specs.lock().clone()
    }
}

#[async_trait]
impl RolloutEngine for FakeRollout {
    async fn run_rollout(&self, spec: &RolloutSpec) -> Result<(), RolloutError> {
        self.specs.lock().push(spec.clone());
        if self.fail {
            return Err(ApiError::Other("lease held by another deploy".to_string()).into());
        }
        Ok(())
    }
}
