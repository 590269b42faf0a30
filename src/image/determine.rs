// ABOUTME: Decides which image a deploy uses and obtains it from the builder.
// ABOUTME: Flag image beats config image beats building from source.

use std::collections::HashMap;

use super::error::{BuildError, Result};
use super::paths::{absolute, discover_dockerfile, resolve_build_file};
use super::{DeploymentImage, ImageOptions, ImageResolver, RefOptions};
use crate::config::AppConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::options::DeployOptions;
use crate::output::{Output, human_bytes};
use crate::types::parse_kv_pairs;

pub struct ImageDeterminer<'a, R> {
    resolver: &'a R,
    output: &'a Output,
}

/// Layer CLI build args over the config's; the CLI wins per key.
pub fn merge_build_args(
    config_args: &HashMap<String, String>,
    cli_args: &[String],
) -> Result<HashMap<String, String>> {
    let mut args = config_args.clone();
    let overrides = parse_kv_pairs(cli_args).map_err(BuildError::InvalidBuildArgs)?;
    args.extend(overrides);
    Ok(args)
}

fn image_ref<'o>(options: &'o DeployOptions, config: &'o AppConfig) -> Option<&'o str> {
    options.image().or_else(|| config.build_image())
}

impl<'a, R: ImageResolver> ImageDeterminer<'a, R> {
    pub fn new(resolver: &'a R, output: &'a Output) -> Self {
        Self { resolver, output }
    }

    pub async fn determine(
        &self,
        options: &DeployOptions,
        config: &AppConfig,
        diag: &mut Diagnostics,
    ) -> Result<DeploymentImage> {
        self.output.progress("Building image");

        if !config.build_strategies().is_empty() {
            self.warn_ignored_dockerfile(options, config, diag);
        }

        let image = match image_ref(options, config) {
            Some(reference) => {
                let opts = RefOptions {
                    app: options.app.clone(),
                    working_dir: options.working_dir.clone(),
                    publish: !options.build_only,
                    image_ref: reference.to_string(),
                    image_label: options.image_label().map(str::to_string),
                };
                tracing::debug!(image = %opts.image_ref, "deploying prebuilt image");
                self.resolver.resolve_reference(&opts).await?
            }
            None => {
                let opts = self.image_options(options, config)?;
                let _heartbeat = self.resolver.start_heartbeat();
                self.resolver.build_image(&opts).await?
            }
        };

        let image = image.ok_or(BuildError::NoImage)?;

        self.output.detail(&format!("image: {}", image.tag));
        self.output
            .detail(&format!("image size: {}", human_bytes(image.size)));

        Ok(image)
    }

    fn warn_ignored_dockerfile(
        &self,
        options: &DeployOptions,
        config: &AppConfig,
        diag: &mut Diagnostics,
    ) {
        let Some(found) = discover_dockerfile(&options.working_dir) else {
            return;
        };
        let found = absolute(&found, &options.working_dir).unwrap_or(found);
        let configured = resolve_build_file(
            config.dockerfile(),
            config.config_path(),
            options.build.dockerfile.as_deref(),
            &options.working_dir,
        )
        .ok()
        .flatten();

        if configured.as_ref() != Some(&found) {
            diag.report(self.output, Warning::ignored_dockerfile(&found));
        }
    }

    fn image_options(&self, options: &DeployOptions, config: &AppConfig) -> Result<ImageOptions> {
        let build = config.build.clone().unwrap_or_default();
        let flags = &options.build;

        let build_secrets =
            parse_kv_pairs(&flags.secrets).map_err(BuildError::InvalidBuildSecrets)?;
        let build_args = merge_build_args(&build.args, &flags.args)?;

        let dockerfile = resolve_build_file(
            config.dockerfile(),
            config.config_path(),
            flags.dockerfile.as_deref(),
            &options.working_dir,
        )?;
        let ignorefile = resolve_build_file(
            config.ignorefile(),
            config.config_path(),
            flags.ignorefile.as_deref(),
            &options.working_dir,
        )?;

        let target = config
            .docker_build_target()
            .or_else(|| flags.target.as_deref().filter(|t| !t.is_empty()))
            .map(str::to_string);

        Ok(ImageOptions {
            app: options.app.clone(),
            working_dir: options.working_dir.clone(),
            publish: flags.push || !options.build_only,
            image_label: options.image_label().map(str::to_string),
            no_cache: flags.no_cache,
            builtin: build.builtin().map(str::to_string),
            builtin_settings: build.settings.clone(),
            builder: build.builder().map(str::to_string),
            buildpacks: build.buildpacks.clone(),
            build_args,
            build_secrets,
            dockerfile,
            ignorefile,
            target,
        })
    }
}
