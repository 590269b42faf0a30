// ABOUTME: Legacy releases backend: create a release and watch it go live.
// ABOUTME: Waits on the release command first when the release has one.

use snafu::ResultExt;

use super::error::{
    ConfigSnafu, CreateReleaseSnafu, DeployError, MonitorSnafu, RefreshReleaseSnafu,
    ReleaseCommandSnafu,
};
use super::watch::ReleaseWatcher;
use crate::api::{ControlPlane, DeployImageInput};
use crate::config::AppConfig;
use crate::image::DeploymentImage;
use crate::options::DeployOptions;
use crate::output::Output;

/// Release strategies are upper snake case: `bluegreen` stays `BLUEGREEN`,
/// `rolling-one` becomes `ROLLING_ONE`.
pub fn normalize_strategy(strategy: &str) -> String {
    strategy.replace('-', "_").to_uppercase()
}

pub struct ReleaseOrchestrator<'a, C, W> {
    control_plane: &'a C,
    watcher: &'a W,
    output: &'a Output,
}

impl<'a, C: ControlPlane, W: ReleaseWatcher> ReleaseOrchestrator<'a, C, W> {
    pub fn new(control_plane: &'a C, watcher: &'a W, output: &'a Output) -> Self {
        Self {
            control_plane,
            watcher,
            output,
        }
    }

    pub async fn run(
        &self,
        options: &DeployOptions,
        config: &AppConfig,
        image: &DeploymentImage,
    ) -> Result<(), DeployError> {
        self.output.progress("Creating release");

        let input = DeployImageInput {
            app_id: options.app.clone(),
            image: image.tag.clone(),
            strategy: options.strategy().map(normalize_strategy),
            definition: Some(config.sanitized_definition().context(ConfigSnafu)?),
        };

        let (release, release_command) = self
            .control_plane
            .create_release(&input)
            .await
            .context(CreateReleaseSnafu)?;

        tracing::debug!(
            release = %release.id,
            version = release.version,
            strategy = %release.deployment_strategy,
            "release created"
        );
        self.output
            .detail(&format!("release v{} created", release.version));

        if options.detach {
            return Ok(());
        }

        self.output
            .detail("You can detach the terminal anytime without stopping the deployment");

        let release = match release_command {
            Some(command) => {
                self.output
                    .progress(&format!("Release command detected: {}", command.command));
                self.output.detail(
                    "This release will not be available until the release command succeeds.",
                );

                self.watcher
                    .watch_release_command(&options.app, &command.id)
                    .await
                    .context(ReleaseCommandSnafu)?;

                self.control_plane
                    .release(&options.app, &release.id)
                    .await
                    .context(RefreshReleaseSnafu {
                        release: release.id.clone(),
                    })?
            }
            None => release,
        };

        if release.is_immediate() {
            tracing::debug!(release = %release.id, "immediate release, nothing to monitor");
            return Ok(());
        }

        self.watcher
            .watch_deployment(&options.app, &release.evaluation_id)
            .await
            .context(MonitorSnafu)
    }
}
