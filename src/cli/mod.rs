//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{DeployCommand, ReleasesCommand, RollbackCommand, UnlockCommand, VersionCommand};
use std::ffi::OsString;

/// Release deployment tool
#[derive(Debug, Parser, Clone)]
#[command(name = "deployer")]
#[command(about = "Deploy versioned releases over SSH and roll them back", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deploy a new release
    Deploy(DeployCommand),

    /// Roll back to an earlier release
    Rollback(RollbackCommand),

    /// List releases on the target host
    Releases(ReleasesCommand),

    /// Remove a stale deploy lock
    Unlock(UnlockCommand),

    /// Show version information
    Version(VersionCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_defaults_config_path() {
        let cli = Cli::try_parse_from(["deployer", "deploy"]).unwrap();
        match cli.command {
            Command::Deploy(cmd) => assert_eq!(cmd.config, "deploy.yaml"),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_rollback_short_version_flag() {
        let cli = Cli::try_parse_from([
            "deployer",
            "rollback",
            "-c",
            "prod.yaml",
            "-v",
            "20240101000000",
            "--verbose",
        ])
        .unwrap();
        match cli.command {
            Command::Rollback(cmd) => {
                assert_eq!(cmd.config, "prod.yaml");
                assert_eq!(cmd.version.as_deref(), Some("20240101000000"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(cli.verbose);
    }

    #[test]
    fn test_rollback_without_version() {
        let cli = Cli::try_parse_from(["deployer", "rollback"]).unwrap();
        assert!(matches!(cli.command, Command::Rollback(RollbackCommand { version: None, .. })));
    }

    #[test]
    fn test_version_json() {
        let cli = Cli::try_parse_from(["deployer", "version", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Version(VersionCommand { json: true })));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["deployer", "destroy"]).is_err());
    }
}
