// ABOUTME: Deployment image resolution: use an existing reference or build from source.
// ABOUTME: Defines the builder seam, its option sets, and the resolved image record.

mod determine;
pub mod docker;
mod error;
mod heartbeat;
mod paths;

pub use determine::{ImageDeterminer, merge_build_args};
pub use error::{BuildError, Result};
pub use heartbeat::Heartbeat;
pub use paths::{absolute, discover_dockerfile, resolve_build_file};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::options::BuildFlags;
use crate::types::AppName;

/// The image a deploy rolls out. Produced once per deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentImage {
    /// Full reference the backends pull, e.g. `registry.hangar.dev/web:deployment-…`.
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Size in bytes.
    pub size: u64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

/// Options for deploying an image that already exists.
#[derive(Debug, Clone, PartialEq)]
pub struct RefOptions {
    pub app: AppName,
    pub working_dir: PathBuf,
    pub publish: bool,
    pub image_ref: String,
    pub image_label: Option<String>,
}

/// Options for building an image from source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOptions {
    pub app: AppName,
    pub working_dir: PathBuf,
    pub publish: bool,
    pub image_label: Option<String>,
    pub no_cache: bool,
    pub builtin: Option<String>,
    pub builtin_settings: HashMap<String, serde_json::Value>,
    pub builder: Option<String>,
    pub buildpacks: Vec<String>,
    pub build_args: HashMap<String, String>,
    pub build_secrets: HashMap<String, String>,
    pub dockerfile: Option<PathBuf>,
    pub ignorefile: Option<PathBuf>,
    pub target: Option<String>,
}

/// The external build engine.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Locate (and publish, if asked) an existing image.
    async fn resolve_reference(&self, opts: &RefOptions) -> Result<Option<DeploymentImage>>;

    /// Build an image from source.
    async fn build_image(&self, opts: &ImageOptions) -> Result<Option<DeploymentImage>>;

    /// Start the builder's liveness signal. Released when the guard drops.
    fn start_heartbeat(&self) -> Heartbeat;
}

/// Which docker daemons a build may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonType {
    pub allow_local: bool,
    pub allow_remote: bool,
    /// Try the local daemon before a remote one.
    pub prefer_local: bool,
    pub nixpacks: bool,
}

impl DaemonType {
    pub fn new(allow_local: bool, allow_remote: bool, prefer_local: bool, nixpacks: bool) -> Self {
        Self {
            allow_local,
            allow_remote,
            prefer_local,
            nixpacks,
        }
    }

    /// `--remote-only` forbids local, `--local-only` forbids remote. CI runs
    /// prefer a local daemon when one is allowed.
    pub fn from_flags(flags: &BuildFlags, is_ci: bool) -> Self {
        Self::new(!flags.remote_only, !flags.local_only, is_ci, flags.nixpacks)
    }

    pub fn is_none(&self) -> bool {
        !self.allow_local && !self.allow_remote
    }
}
