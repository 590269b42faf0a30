// ABOUTME: Machines backend: turns config, options, and image into a rollout spec.
// ABOUTME: Hands the rollout spec to the rollout engine and reports failures with app context.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use snafu::ResultExt;
use thiserror::Error;

use super::error::{ConfigSnafu, DeployError, InvalidMachinesConfigSnafu, RolloutSnafu};
use super::watch::WatchError;
use crate::api::{ApiError, AppSummary};
use crate::config::{AppConfig, ConfigError};
use crate::image::DeploymentImage;
use crate::options::DeployOptions;
use crate::output::Output;
use crate::types::{AppName, parse_kv_pairs};

/// What the rollout engine needs to roll an image across an app's machines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolloutSpec {
    pub app: AppName,
    pub organization: String,
    pub image: DeploymentImage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Only the `--env` overrides; the full env travels inside `config`.
    pub env: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_region: Option<String>,
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub lease_timeout: Duration,
    pub skip_health_checks: bool,
    pub config: AppConfig,
}

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("rollout request failed: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// The external per-machine rollout engine.
#[async_trait]
pub trait RolloutEngine: Send + Sync {
    async fn run_rollout(&self, spec: &RolloutSpec) -> Result<(), RolloutError>;
}

pub struct MachineRolloutOrchestrator<'a, R> {
    engine: &'a R,
    output: &'a Output,
}

impl<'a, R: RolloutEngine> MachineRolloutOrchestrator<'a, R> {
    pub fn new(engine: &'a R, output: &'a Output) -> Self {
        Self { engine, output }
    }

    pub fn rollout_spec(
        options: &DeployOptions,
        config: &AppConfig,
        summary: &AppSummary,
        image: &DeploymentImage,
    ) -> Result<RolloutSpec, ConfigError> {
        let env = parse_kv_pairs(&options.env).map_err(ConfigError::Env)?;

        let primary_region = options
            .region()
            .or_else(|| Some(config.primary_region.as_str()).filter(|r| !r.is_empty()))
            .map(str::to_string);

        let strategy = options
            .strategy()
            .or_else(|| config.deploy_strategy())
            .map(str::to_string);

        Ok(RolloutSpec {
            app: options.app.clone(),
            organization: summary.organization.slug.clone(),
            image: image.clone(),
            strategy,
            env,
            primary_region,
            wait_timeout: options.wait_timeout,
            lease_timeout: options.lease_timeout,
            skip_health_checks: options.detach,
            config: config.clone(),
        })
    }

    pub async fn run(
        &self,
        options: &DeployOptions,
        config: &AppConfig,
        summary: &AppSummary,
        image: &DeploymentImage,
    ) -> Result<(), DeployError> {
        config
            .ensure_machines_config()
            .context(InvalidMachinesConfigSnafu)?;

        let spec = Self::rollout_spec(options, config, summary, image).context(ConfigSnafu)?;

        self.output.progress(&format!(
            "Rolling out {} to machines of {}",
            spec.image.tag, spec.app
        ));

        if let Err(e) = self.engine.run_rollout(&spec).await {
            tracing::error!(
                app = %spec.app,
                org = %spec.organization,
                stage = "deploy",
                error = %e,
                "machines rollout failed"
            );
            return Err(e).context(RolloutSnafu);
        }

        Ok(())
    }
}
