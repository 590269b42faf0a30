// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the deploy subcommand, its flags, and global output options.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hangar")]
#[command(about = "Deploy applications from source or an image")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy an app from source or an image
    Deploy(DeployArgs),
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Directory to deploy from (defaults to the current directory)
    pub working_directory: Option<PathBuf>,

    /// App to deploy
    #[arg(short, long)]
    pub app: Option<String>,

    /// Path to the app config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Primary region for the deploy
    #[arg(short, long)]
    pub region: Option<String>,

    /// Deploy this image instead of building
    #[arg(short, long)]
    pub image: Option<String>,

    /// Only build with the local docker daemon
    #[arg(long)]
    pub local_only: bool,

    /// Only build with a remote builder
    #[arg(long)]
    pub remote_only: bool,

    /// Push the image to the registry even with --build-only
    #[arg(long)]
    pub push: bool,

    /// Build without the layer cache
    #[arg(long)]
    pub no_cache: bool,

    /// Target stage of a multistage Dockerfile
    #[arg(long)]
    pub build_target: Option<String>,

    /// Path to a Dockerfile
    #[arg(long)]
    pub dockerfile: Option<PathBuf>,

    /// Path to an ignore file
    #[arg(long)]
    pub ignorefile: Option<PathBuf>,

    /// Build argument as NAME=VALUE (repeatable)
    #[arg(long = "build-arg", value_name = "NAME=VALUE")]
    pub build_args: Vec<String>,

    /// Build secret as NAME=VALUE (repeatable)
    #[arg(long = "build-secret", value_name = "NAME=VALUE")]
    pub build_secrets: Vec<String>,

    /// Image label to use instead of a generated one
    #[arg(long)]
    pub image_label: Option<String>,

    /// Build with nixpacks
    #[arg(long)]
    pub nixpacks: bool,

    /// Build the image but don't deploy it
    #[arg(long)]
    pub build_only: bool,

    /// Deployment strategy
    #[arg(long)]
    pub strategy: Option<String>,

    /// Environment variable as NAME=VALUE (repeatable)
    #[arg(short, long = "env", value_name = "NAME=VALUE")]
    pub env: Vec<String>,

    /// Return once the deploy has been started
    #[arg(long)]
    pub detach: bool,

    /// Don't prompt for confirmation
    #[arg(long, short = 'y')]
    pub auto_confirm: bool,

    /// Seconds to wait for machines to become healthy
    #[arg(long, default_value_t = 120)]
    pub wait_timeout: u64,

    /// Seconds to lease each machine during the rollout
    #[arg(long, default_value_t = 13)]
    pub lease_timeout: u64,

    /// Deploy a new app to the releases platform
    #[arg(long, alias = "force-nomad")]
    pub force_releases: bool,

    /// Deploy a new app to machines
    #[arg(long)]
    pub force_machines: bool,
}
