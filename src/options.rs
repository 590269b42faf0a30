// ABOUTME: Explicit per-invocation deploy options.
// ABOUTME: Carries every flag the pipeline reads instead of an implicit global context.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::AppName;

/// Default time to wait for machines to change state and become healthy.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default machine lease duration during a rollout.
pub const DEFAULT_LEASE_TIMEOUT: Duration = Duration::from_secs(13);

/// Image build toggles and overrides.
#[derive(Debug, Clone, Default)]
pub struct BuildFlags {
    pub local_only: bool,
    pub remote_only: bool,
    pub push: bool,
    pub no_cache: bool,
    pub nixpacks: bool,
    pub target: Option<String>,
    pub dockerfile: Option<PathBuf>,
    pub ignorefile: Option<PathBuf>,
    /// Raw `NAME=VALUE` build arguments.
    pub args: Vec<String>,
    /// Raw `NAME=VALUE` build secrets.
    pub secrets: Vec<String>,
}

/// Everything one deploy invocation needs to know about the caller's intent.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// App to deploy. Always wins over the name inside a loaded config.
    pub app: AppName,
    pub working_dir: PathBuf,
    pub region: Option<String>,
    pub image: Option<String>,
    pub image_label: Option<String>,
    pub build: BuildFlags,
    pub strategy: Option<String>,
    /// Raw `NAME=VALUE` environment overrides.
    pub env: Vec<String>,
    pub detach: bool,
    pub build_only: bool,
    /// Accepted for compatibility; no decision currently depends on it.
    pub auto_confirm: bool,
    pub wait_timeout: Duration,
    pub lease_timeout: Duration,
    pub force_releases: bool,
    pub force_machines: bool,
}

impl DeployOptions {
    pub fn new(app: AppName, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            app,
            working_dir: working_dir.into(),
            region: None,
            image: None,
            image_label: None,
            build: BuildFlags::default(),
            strategy: None,
            env: Vec::new(),
            detach: false,
            build_only: false,
            auto_confirm: false,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            lease_timeout: DEFAULT_LEASE_TIMEOUT,
            force_releases: false,
            force_machines: false,
        }
    }

    /// Region override, ignoring an empty flag value.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| !r.is_empty())
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|i| !i.is_empty())
    }

    pub fn image_label(&self) -> Option<&str> {
        self.image_label.as_deref().filter(|l| !l.is_empty())
    }

    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref().filter(|s| !s.is_empty())
    }
}
