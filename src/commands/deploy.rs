// ABOUTME: Deploy command implementation.
// ABOUTME: Wires CLI flags and environment settings into the deploy pipeline.

use std::path::PathBuf;
use std::time::Duration;

use hangar::api::ApiClient;
use hangar::config::AppConfig;
use hangar::deploy::{DeployPipeline, PollingWatcher};
use hangar::error::{Error, Result};
use hangar::image::DaemonType;
use hangar::image::docker::DockerResolver;
use hangar::options::{BuildFlags, DeployOptions};
use hangar::output::Output;
use hangar::settings::{ClientSettings, is_ci};
use hangar::types::AppName;

use crate::cli::DeployArgs;

fn deploy_options(args: DeployArgs, app: AppName, working_dir: PathBuf) -> DeployOptions {
    DeployOptions {
        app,
        working_dir,
        region: args.region,
        image: args.image,
        image_label: args.image_label,
        build: BuildFlags {
            local_only: args.local_only,
            remote_only: args.remote_only,
            push: args.push,
            no_cache: args.no_cache,
            nixpacks: args.nixpacks,
            target: args.build_target,
            dockerfile: args.dockerfile,
            ignorefile: args.ignorefile,
            args: args.build_args,
            secrets: args.build_secrets,
        },
        strategy: args.strategy,
        env: args.env,
        detach: args.detach,
        build_only: args.build_only,
        auto_confirm: args.auto_confirm,
        wait_timeout: Duration::from_secs(args.wait_timeout),
        lease_timeout: Duration::from_secs(args.lease_timeout),
        force_releases: args.force_releases,
        force_machines: args.force_machines,
    }
}

/// Deploy the app in the working directory.
pub async fn deploy(args: DeployArgs, mut output: Output) -> Result<()> {
    output.start_timer();

    let dir = args
        .working_directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let working_dir = dir.canonicalize().map_err(|_| Error::WorkingDir(dir))?;

    let local = match &args.config {
        Some(path) => Some(AppConfig::load(&working_dir.join(path))?),
        None => AppConfig::discover(&working_dir)?,
    };

    let app = match args.app.as_deref().filter(|a| !a.is_empty()) {
        Some(name) => AppName::new(name)?,
        None => local
            .as_ref()
            .and_then(|c| c.app.clone())
            .ok_or(Error::MissingAppName)?,
    };

    let options = deploy_options(args, app, working_dir);
    tracing::debug!(app = %options.app, dir = %options.working_dir.display(), "starting deploy");

    let settings = ClientSettings::from_env()?;
    let client = ApiClient::new(&settings)?;
    let watcher = PollingWatcher::new(
        client.clone(),
        settings.poll_interval,
        settings.watch_timeout,
    );
    let daemon = DaemonType::from_flags(&options.build, is_ci());
    let resolver = DockerResolver::connect(&settings, daemon)?;

    let pipeline = DeployPipeline::new(&client, &resolver, &watcher, &client, &output);

    let report = tokio::select! {
        result = pipeline.deploy(&options, local) => result?,
        _ = tokio::signal::ctrl_c() => return Err(Error::Interrupted),
    };

    if !report.dispatched {
        output.success(&format!("Built image {}", report.image.tag));
    } else if options.detach {
        output.success(&format!(
            "Started deploy of {} on {}",
            options.app, report.platform
        ));
    } else {
        output.success(&format!("Deployed {} on {}", options.app, report.platform));
    }

    Ok(())
}
