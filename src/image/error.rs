// ABOUTME: Error types for resolving or building a deployment image.
// ABOUTME: Covers flag parsing, path resolution, builder selection, and daemon failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ParseKvError;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid build args: {0}")]
    InvalidBuildArgs(ParseKvError),

    #[error("invalid build secrets: {0}")]
    InvalidBuildSecrets(ParseKvError),

    #[error("failed to resolve path {path}: {source}")]
    Path {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The builder reported success without producing an image.
    #[error("no image specified")]
    NoImage,

    #[error("no builder available: {0}")]
    NoBuilder(String),

    #[error("unsupported build configuration: {0}")]
    Unsupported(String),

    #[error("docker daemon error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("{program} failed: {message}")]
    Command { program: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
