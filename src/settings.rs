// ABOUTME: Client settings read from the environment.
// ABOUTME: API endpoint, credentials, registry, remote builder, and watch timing.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.hangar.dev";
pub const DEFAULT_REGISTRY: &str = "registry.hangar.dev";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_WATCH_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("invalid duration in {var}: {source}")]
    InvalidDuration {
        var: &'static str,
        source: humantime::DurationError,
    },
}

#[derive(Clone)]
pub struct ClientSettings {
    pub api_url: String,
    pub access_token: String,
    pub registry: String,
    /// Docker host of a remote builder, e.g. `tcp://builder.internal:2375`.
    pub remote_builder: Option<String>,
    pub poll_interval: Duration,
    pub watch_timeout: Duration,
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("api_url", &self.api_url)
            .field("access_token", &"<redacted>")
            .field("registry", &self.registry)
            .field("remote_builder", &self.remote_builder)
            .field("poll_interval", &self.poll_interval)
            .field("watch_timeout", &self.watch_timeout)
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn duration_var(name: &'static str, default: Duration) -> Result<Duration, SettingsError> {
    match non_empty_var(name) {
        Some(raw) => humantime::parse_duration(&raw)
            .map_err(|source| SettingsError::InvalidDuration { var: name, source }),
        None => Ok(default),
    }
}

impl ClientSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let access_token = non_empty_var("HANGAR_ACCESS_TOKEN")
            .ok_or(SettingsError::MissingEnvVar("HANGAR_ACCESS_TOKEN"))?;

        Ok(Self {
            api_url: non_empty_var("HANGAR_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            access_token,
            registry: non_empty_var("HANGAR_REGISTRY")
                .unwrap_or_else(|| DEFAULT_REGISTRY.to_string()),
            remote_builder: non_empty_var("HANGAR_REMOTE_BUILDER"),
            poll_interval: duration_var("HANGAR_POLL_INTERVAL", DEFAULT_POLL_INTERVAL)?,
            watch_timeout: duration_var("HANGAR_WATCH_TIMEOUT", DEFAULT_WATCH_TIMEOUT)?,
        })
    }
}

/// Whether we're running under a CI system.
pub fn is_ci() -> bool {
    non_empty_var("CI").is_some_and(|v| v != "false" && v != "0")
}
