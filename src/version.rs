//! Build and version information

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version information for the binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_commit: String,
    pub build_date: String,
    pub os: String,
    pub arch: String,
}

/// Get version information
///
/// Commit and build date come from `DEPLOYER_GIT_COMMIT` and
/// `DEPLOYER_BUILD_DATE` at compile time.
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_commit: option_env!("DEPLOYER_GIT_COMMIT").unwrap_or("unknown").to_string(),
        build_date: option_env!("DEPLOYER_BUILD_DATE").unwrap_or("unknown").to_string(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "deployer {}", self.version)?;
        writeln!(f, "  commit:     {}", self.git_commit)?;
        writeln!(f, "  built:      {}", self.build_date)?;
        write!(f, "  platform:   {}/{}", self.os, self.arch)
    }
}
