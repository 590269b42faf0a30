// ABOUTME: Docker-backed image resolver using bollard plus the docker/pack/nixpacks CLIs.
// ABOUTME: Picks a local or remote daemon, builds, tags, pushes, and inspects images.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::CreateImageOptions;
use futures::StreamExt;

use super::error::{BuildError, Result};
use super::paths::discover_dockerfile;
use super::{DaemonType, DeploymentImage, Heartbeat, ImageOptions, ImageResolver, RefOptions};
use crate::settings::ClientSettings;
use crate::types::AppName;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
const APP_LABEL: &str = "hangar.app";
const SECRET_ENV_PREFIX: &str = "HANGAR_BUILD_SECRET_";

pub struct DockerResolver {
    client: Docker,
    /// Set when talking to a remote builder; forwarded to the CLIs as `DOCKER_HOST`.
    docker_host: Option<String>,
    registry: String,
    daemon: DaemonType,
}

impl DockerResolver {
    pub fn connect(settings: &ClientSettings, daemon: DaemonType) -> Result<Self> {
        let docker_host = select_daemon(daemon, settings.remote_builder.as_deref())?;

        let client = match &docker_host {
            Some(host) => {
                tracing::debug!(host = %host, "using remote builder");
                Docker::connect_with_http(host, 120, bollard::API_DEFAULT_VERSION)?
            }
            None => {
                tracing::debug!("using local docker daemon");
                Docker::connect_with_local_defaults()?
            }
        };

        Ok(Self {
            client,
            docker_host: docker_host.map(str::to_string),
            registry: settings.registry.clone(),
            daemon,
        })
    }

    async fn inspect(&self, reference: &str) -> Result<Option<DeploymentImage>> {
        match self.client.inspect_image(reference).await {
            Ok(inspect) => {
                let digest = inspect
                    .repo_digests
                    .unwrap_or_default()
                    .into_iter()
                    .find_map(|d| d.split_once('@').map(|(_, digest)| digest.to_string()));
                let labels = inspect
                    .config
                    .and_then(|c| c.labels)
                    .unwrap_or_default();

                Ok(Some(DeploymentImage {
                    tag: reference.to_string(),
                    id: inspect.id,
                    digest,
                    size: inspect.size.and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                    labels,
                }))
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn pull(&self, reference: &str) -> Result<()> {
        let opts = CreateImageOptions {
            from_image: Some(reference.to_string()),
            ..Default::default()
        };

        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(progress) = stream.next().await {
            progress?;
        }
        Ok(())
    }

    async fn run(&self, program: &str, args: &[String], envs: &HashMap<String, String>) -> Result<()> {
        tracing::debug!(program, ?args, "running build command");

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .envs(envs)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(host) = &self.docker_host {
            cmd.env("DOCKER_HOST", host);
        }

        let status = cmd.status().await.map_err(|e| BuildError::Command {
            program: program.to_string(),
            message: e.to_string(),
        })?;

        if !status.success() {
            return Err(BuildError::Command {
                program: program.to_string(),
                message: format!("exited with {status}"),
            });
        }
        Ok(())
    }

    async fn push(&self, tag: &str) -> Result<()> {
        self.run("docker", &["push".to_string(), tag.to_string()], &HashMap::new())
            .await
    }

    async fn build_with_dockerfile(
        &self,
        opts: &ImageOptions,
        tag: &str,
        dockerfile: &Path,
    ) -> Result<()> {
        if let Some(ignorefile) = &opts.ignorefile {
            tracing::warn!(
                path = %ignorefile.display(),
                "docker reads .dockerignore from the build context; custom ignore file not applied"
            );
        }

        let mut envs = secret_envs(&opts.build_secrets);
        envs.insert("DOCKER_BUILDKIT".to_string(), "1".to_string());

        let args = docker_build_args(opts, tag, dockerfile);
        self.run("docker", &args, &envs).await
    }

    async fn build_with_buildpacks(&self, opts: &ImageOptions, tag: &str, builder: &str) -> Result<()> {
        let mut args = vec![
            "build".to_string(),
            tag.to_string(),
            "--builder".to_string(),
            builder.to_string(),
            "--path".to_string(),
            opts.working_dir.display().to_string(),
        ];
        for buildpack in &opts.buildpacks {
            args.push("--buildpack".to_string());
            args.push(buildpack.clone());
        }
        for (key, value) in sorted(&opts.build_args) {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }
        if opts.no_cache {
            args.push("--clear-cache".to_string());
        }
        self.run("pack", &args, &HashMap::new()).await
    }

    async fn build_with_nixpacks(&self, opts: &ImageOptions, tag: &str) -> Result<()> {
        let mut args = vec![
            "build".to_string(),
            opts.working_dir.display().to_string(),
            "--name".to_string(),
            tag.to_string(),
        ];
        for (key, value) in sorted(&opts.build_args) {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }
        if opts.no_cache {
            args.push("--no-cache".to_string());
        }
        self.run("nixpacks", &args, &HashMap::new()).await
    }
}

/// Pick the daemon for this build. `Some(host)` means the remote builder.
fn select_daemon(daemon: DaemonType, remote_builder: Option<&str>) -> Result<Option<&str>> {
    if daemon.is_none() {
        return Err(BuildError::NoBuilder(
            "both local and remote builders were disabled".to_string(),
        ));
    }

    let remote = remote_builder.filter(|_| daemon.allow_remote);
    match remote {
        Some(host) if !daemon.allow_local || !daemon.prefer_local => Ok(Some(host)),
        _ if daemon.allow_local => Ok(None),
        _ => Err(BuildError::NoBuilder(
            "remote builds requested but HANGAR_REMOTE_BUILDER is not set".to_string(),
        )),
    }
}

fn sorted(map: &HashMap<String, String>) -> Vec<(&String, &String)> {
    let mut pairs: Vec<_> = map.iter().collect();
    pairs.sort();
    pairs
}

fn secret_env_name(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{SECRET_ENV_PREFIX}{sanitized}")
}

fn secret_envs(secrets: &HashMap<String, String>) -> HashMap<String, String> {
    secrets
        .iter()
        .map(|(id, value)| (secret_env_name(id), value.clone()))
        .collect()
}

/// Image tag for a new build: `<registry>/<app>:<label>`.
pub fn image_tag(registry: &str, app: &AppName, label: Option<&str>) -> String {
    let label = match label {
        Some(label) => label.to_string(),
        None => chrono::Utc::now()
            .format("deployment-%Y%m%d%H%M%S")
            .to_string(),
    };
    format!("{registry}/{app}:{label}")
}

/// Arguments for `docker build`. Secret values travel through the environment.
pub fn docker_build_args(opts: &ImageOptions, tag: &str, dockerfile: &Path) -> Vec<String> {
    let mut args = vec![
        "build".to_string(),
        "--tag".to_string(),
        tag.to_string(),
        "--file".to_string(),
        dockerfile.display().to_string(),
        "--label".to_string(),
        format!("{APP_LABEL}={}", opts.app),
    ];

    for (key, value) in sorted(&opts.build_args) {
        args.push("--build-arg".to_string());
        args.push(format!("{key}={value}"));
    }

    let mut secret_ids: Vec<_> = opts.build_secrets.keys().collect();
    secret_ids.sort();
    for id in secret_ids {
        args.push("--secret".to_string());
        args.push(format!("id={id},env={}", secret_env_name(id)));
    }

    if let Some(target) = &opts.target {
        args.push("--target".to_string());
        args.push(target.clone());
    }
    if opts.no_cache {
        args.push("--no-cache".to_string());
    }

    args.push(opts.working_dir.display().to_string());
    args
}

#[async_trait]
impl ImageResolver for DockerResolver {
    async fn resolve_reference(&self, opts: &RefOptions) -> Result<Option<DeploymentImage>> {
        if let Some(local) = self.inspect(&opts.image_ref).await? {
            if !opts.publish {
                return Ok(Some(local));
            }

            let tag = image_tag(&self.registry, &opts.app, opts.image_label.as_deref());
            let args = vec!["tag".to_string(), opts.image_ref.clone(), tag.clone()];
            self.run("docker", &args, &HashMap::new()).await?;
            self.push(&tag).await?;
            return self.inspect(&tag).await;
        }

        tracing::debug!(image = %opts.image_ref, "image not found locally, pulling");
        self.pull(&opts.image_ref).await?;
        self.inspect(&opts.image_ref).await
    }

    async fn build_image(&self, opts: &ImageOptions) -> Result<Option<DeploymentImage>> {
        if let Some(builtin) = &opts.builtin {
            return Err(BuildError::Unsupported(format!(
                "the \"{builtin}\" builtin cannot be built by the docker builder"
            )));
        }

        let tag = image_tag(&self.registry, &opts.app, opts.image_label.as_deref());
        let dockerfile: Option<PathBuf> = opts
            .dockerfile
            .clone()
            .or_else(|| discover_dockerfile(&opts.working_dir));

        match (&dockerfile, &opts.builder) {
            (Some(dockerfile), _) => self.build_with_dockerfile(opts, &tag, dockerfile).await?,
            (None, Some(builder)) => self.build_with_buildpacks(opts, &tag, builder).await?,
            (None, None) if self.daemon.nixpacks => self.build_with_nixpacks(opts, &tag).await?,
            (None, None) => return Ok(None),
        }

        if opts.publish {
            self.push(&tag).await?;
        }

        self.inspect(&tag).await
    }

    fn start_heartbeat(&self) -> Heartbeat {
        let client = self.client.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(e) = client.ping().await {
                    tracing::debug!(error = %e, "builder heartbeat failed");
                }
            }
        });
        Heartbeat::from_task(task)
    }
}
