// ABOUTME: Control plane interface used by the deploy pipeline.
// ABOUTME: Traits at the seam plus the HTTP client that implements them.

mod client;
mod error;
mod models;

pub use client::{ApiClient, AppScopedClient};
pub use error::{ApiError, Result};
pub use models::{
    AppSummary, CreatedRelease, DeployImageInput, OrgSettings, Organization, Progress, Release,
    ReleaseCommand, StatusReport,
};

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::types::{AppName, EvaluationId, ReleaseCommandId, ReleaseId};

/// Control plane operations the pipeline reads and writes through.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn app_summary(&self, app: &AppName) -> Result<AppSummary>;

    /// Whether the organization deploys new apps to machines by default.
    async fn machines_default_on(&self, org_slug: &str) -> Result<bool>;

    /// Open a connection scoped to one app for reading its stored config.
    async fn config_source(&self, app: &AppName) -> Result<Box<dyn ConfigSource>>;

    async fn create_release(
        &self,
        input: &DeployImageInput,
    ) -> Result<(Release, Option<ReleaseCommand>)>;

    async fn release(&self, app: &AppName, id: &ReleaseId) -> Result<Release>;
}

/// App-scoped source of the config last deployed for that app.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch_config(&self) -> Result<AppConfig>;
}

/// Point-in-time status lookups used by watchers.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn release_command_status(
        &self,
        app: &AppName,
        id: &ReleaseCommandId,
    ) -> Result<StatusReport>;

    async fn evaluation_status(&self, app: &AppName, id: &EvaluationId) -> Result<StatusReport>;
}
