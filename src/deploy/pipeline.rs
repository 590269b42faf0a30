// ABOUTME: Top-level deploy coordinator.
// ABOUTME: Config, app lookup, platform selection, image, then dispatch to one backend.

use serde::Serialize;
use snafu::ResultExt;

use super::backend::select_backend;
use super::error::{AppLookupSnafu, ConfigSnafu, DeployError, ImageSnafu, InvalidMachinesConfigSnafu};
use super::machines::{MachineRolloutOrchestrator, RolloutEngine};
use super::release::ReleaseOrchestrator;
use super::watch::ReleaseWatcher;
use crate::api::ControlPlane;
use crate::config::{AppConfig, ConfigResolver, Platform};
use crate::diagnostics::Diagnostics;
use crate::image::{DeploymentImage, ImageDeterminer, ImageResolver};
use crate::options::DeployOptions;
use crate::output::Output;

/// What a finished deploy did.
#[derive(Debug, Serialize)]
pub struct DeployReport {
    pub platform: Platform,
    pub image: DeploymentImage,
    /// False when the run stopped after producing the image.
    pub dispatched: bool,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

pub struct DeployPipeline<'a, C, B, W, R> {
    control_plane: &'a C,
    resolver: &'a B,
    watcher: &'a W,
    rollout: &'a R,
    output: &'a Output,
}

impl<'a, C, B, W, R> DeployPipeline<'a, C, B, W, R>
where
    C: ControlPlane,
    B: ImageResolver,
    W: ReleaseWatcher,
    R: RolloutEngine,
{
    pub fn new(
        control_plane: &'a C,
        resolver: &'a B,
        watcher: &'a W,
        rollout: &'a R,
        output: &'a Output,
    ) -> Self {
        Self {
            control_plane,
            resolver,
            watcher,
            rollout,
            output,
        }
    }

    /// Run one deploy. `local` is the config found on disk, if any.
    pub async fn deploy(
        &self,
        options: &DeployOptions,
        local: Option<AppConfig>,
    ) -> Result<DeployReport, DeployError> {
        let mut diag = Diagnostics::default();

        let mut config = ConfigResolver::new(self.control_plane, self.output)
            .resolve(options, local, &mut diag)
            .await
            .context(ConfigSnafu)?;

        let summary = self
            .control_plane
            .app_summary(&options.app)
            .await
            .context(AppLookupSnafu {
                app: options.app.clone(),
            })?;

        let org_default_on = match self
            .control_plane
            .machines_default_on(&summary.organization.slug)
            .await
        {
            Ok(on) => on,
            Err(e) => {
                tracing::debug!(org = %summary.organization.slug, error = %e, "org default lookup failed; treating as off");
                false
            }
        };

        let platform = select_backend(
            &summary,
            options.force_releases,
            options.force_machines,
            options.auto_confirm,
            org_default_on,
        );

        if platform == Platform::Machines {
            config
                .ensure_machines_config()
                .context(InvalidMachinesConfigSnafu)?;
        }

        let image = ImageDeterminer::new(self.resolver, self.output)
            .determine(options, &config, &mut diag)
            .await
            .context(ImageSnafu)?;

        if options.build_only {
            tracing::debug!(image = %image.tag, "build only; skipping deploy");
            return Ok(DeployReport {
                platform,
                image,
                dispatched: false,
                diagnostics: diag,
            });
        }

        config.inject_primary_region();

        match platform {
            Platform::Machines => {
                MachineRolloutOrchestrator::new(self.rollout, self.output)
                    .run(options, &config, &summary, &image)
                    .await?
            }
            Platform::Releases => {
                ReleaseOrchestrator::new(self.control_plane, self.watcher, self.output)
                    .run(options, &config, &image)
                    .await?
            }
        }

        Ok(DeployReport {
            platform,
            image,
            dispatched: true,
            diagnostics: diag,
        })
    }
}
