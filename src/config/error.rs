// ABOUTME: Error types for loading, merging, and validating app configuration.
// ABOUTME: Every variant is fatal and raised before any remote mutation.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;
use crate::types::ParseKvError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed parsing environment: {0}")]
    Env(ParseKvError),

    #[error("could not create config client: {0}")]
    RemoteClient(ApiError),

    #[error("failed to fetch app config from the control plane: {0}")]
    RemoteFetch(ApiError),

    #[error("invalid app config: {0}")]
    Invalid(String),

    #[error("config is not compatible with machines: {0}")]
    MachinesIncompatible(String),

    #[error("failed to serialize app definition: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
