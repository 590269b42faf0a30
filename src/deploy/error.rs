// ABOUTME: Deploy pipeline error types with SNAFU pattern.
// ABOUTME: Each variant names the stage that failed; kind() groups them for handling.

use snafu::Snafu;

use super::machines::RolloutError;
use super::watch::WatchError;
use crate::api::ApiError;
use crate::config::ConfigError;
use crate::image::BuildError;
use crate::types::{AppName, ReleaseId};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DeployError {
    #[snafu(display("{source}"))]
    Config { source: ConfigError },

    #[snafu(display("failed to look up app {app}: {source}"))]
    AppLookup { app: AppName, source: ApiError },

    #[snafu(display("Can't deploy an invalid app config: {source}"))]
    InvalidMachinesConfig { source: ConfigError },

    #[snafu(display("failed to fetch an image or build from source: {source}"))]
    Image { source: BuildError },

    #[snafu(display("{source}"))]
    CreateRelease { source: ApiError },

    #[snafu(display("failed to refresh release {release}: {source}"))]
    RefreshRelease { release: ReleaseId, source: ApiError },

    #[snafu(display("{source}"))]
    ReleaseCommand { source: WatchError },

    #[snafu(display("{source}"))]
    Monitor { source: WatchError },

    #[snafu(display("{source}"))]
    Rollout { source: RolloutError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// Config could not be obtained, parsed, or validated.
    Configuration,
    /// Remote lookups or image resolution failed.
    Resolution,
    /// The selected backend rejected or failed the deploy.
    Backend,
    /// The deploy was dispatched but watching it failed.
    Monitoring,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Config { .. } | DeployError::InvalidMachinesConfig { .. } => {
                DeployErrorKind::Configuration
            }
            DeployError::AppLookup { .. } | DeployError::Image { .. } => {
                DeployErrorKind::Resolution
            }
            DeployError::CreateRelease { .. } | DeployError::RefreshRelease { .. } => {
                DeployErrorKind::Backend
            }
            DeployError::ReleaseCommand { .. } | DeployError::Monitor { .. } => {
                DeployErrorKind::Monitoring
            }
            DeployError::Rollout { source } => match source {
                RolloutError::Watch(_) => DeployErrorKind::Monitoring,
                RolloutError::Api(_) => DeployErrorKind::Backend,
            },
        }
    }

    /// Follow-up advice to print under the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self.kind() {
            DeployErrorKind::Monitoring => Some(
                "the deployment may still be progressing; check its status before redeploying",
            ),
            _ => None,
        }
    }
}
