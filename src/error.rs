// ABOUTME: Application-wide error types for hangar.
// ABOUTME: Wraps each layer's error for the binary to report.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::deploy::DeployError;
use crate::image::BuildError;
use crate::settings::SettingsError;
use crate::types::AppNameError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("could not create API client: {0}")]
    Api(#[from] ApiError),

    #[error("could not set up image builder: {0}")]
    Builder(#[from] BuildError),

    #[error("invalid app name: {0}")]
    AppName(#[from] AppNameError),

    #[error("the app name must be specified with --app or in the config file")]
    MissingAppName,

    #[error("working directory not found: {0}")]
    WorkingDir(PathBuf),

    #[error("interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Follow-up advice to print under the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Deploy(e) => e.hint(),
            Error::Interrupted => Some(
                "the deployment may still be progressing; check its status before redeploying",
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
