//! CLI command definitions

use clap::Args;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "deploy.yaml";

/// Deploy a new release
#[derive(Debug, Args, Clone)]
pub struct DeployCommand {
    /// Path to deployment YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,
}

/// Roll `current` back to an earlier release
#[derive(Debug, Args, Clone)]
pub struct RollbackCommand {
    /// Path to deployment YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Release to roll back to (defaults to the previous release)
    #[arg(short = 'v', long = "version")]
    pub version: Option<String>,
}

/// List releases on the target host
#[derive(Debug, Args, Clone)]
pub struct ReleasesCommand {
    /// Path to deployment YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Remove a lock left behind by an interrupted run
#[derive(Debug, Args, Clone)]
pub struct UnlockCommand {
    /// Path to deployment YAML file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,
}

/// Show version information
#[derive(Debug, Args, Clone)]
pub struct VersionCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
