// ABOUTME: Resolves the app config used for a deploy.
// ABOUTME: Local file or remote fallback, then CLI overrides, then validation.

use super::{AppConfig, ConfigError, Result};
use crate::api::ControlPlane;
use crate::diagnostics::{Diagnostics, Warning};
use crate::options::DeployOptions;
use crate::output::Output;
use crate::types::parse_kv_pairs;

pub struct ConfigResolver<'a, C> {
    control_plane: &'a C,
    output: &'a Output,
}

impl<'a, C: ControlPlane> ConfigResolver<'a, C> {
    pub fn new(control_plane: &'a C, output: &'a Output) -> Self {
        Self {
            control_plane,
            output,
        }
    }

    /// Produce the final config for this deploy.
    ///
    /// Overrides are applied to a working copy; nothing is returned unless
    /// validation passes.
    pub async fn resolve(
        &self,
        options: &DeployOptions,
        local: Option<AppConfig>,
        diag: &mut Diagnostics,
    ) -> Result<AppConfig> {
        self.output.progress("Verifying app config");

        let mut config = match local {
            Some(config) => config,
            None => {
                tracing::debug!(app = %options.app, "no local app config detected; fetching from backend");
                let source = self
                    .control_plane
                    .config_source(&options.app)
                    .await
                    .map_err(ConfigError::RemoteClient)?;
                source
                    .fetch_config()
                    .await
                    .map_err(ConfigError::RemoteFetch)?
            }
        };

        if !options.env.is_empty() {
            let parsed = parse_kv_pairs(&options.env).map_err(ConfigError::Env)?;
            config.set_env_variables(parsed);
        }

        if let Some(region) = options.region() {
            config.primary_region = region.to_string();
        }

        config.app = Some(options.app.clone());

        let report = config.validate();
        for advisory in &report.advisories {
            diag.report(self.output, Warning::config_advisory(advisory.clone()));
        }
        report.into_result()?;

        self.output.detail("Verified app config");
        Ok(config)
    }
}
