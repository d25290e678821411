//! Deployment configuration from YAML

use crate::core::error::DeployError;
use crate::core::release::ReleaseLayout;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Releases kept when `keep_releases` is unset or zero
pub const DEFAULT_KEEP_RELEASES: usize = 5;

/// Default connection timeout for the remote shell
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Top-level deployment configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Target host name or address
    #[serde(default)]
    pub host: String,

    /// Remote user to log in as
    #[serde(default)]
    pub ssh_user: String,

    /// Remote shell port
    #[serde(default = "default_ssh_port")]
    pub ssh_port: String,

    /// Private key used for authentication (`~/` is expanded)
    #[serde(default)]
    pub ssh_key_path: String,

    /// Root of the release tree on the remote host
    #[serde(default, alias = "deploy_path")]
    pub root_path: String,

    /// Legacy name of the release root used by older rollback configs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_path: Option<String>,

    /// Repository cloned into each release
    #[serde(default)]
    pub repository: String,

    /// Branch to deploy
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Number of releases to keep (0 or unset means the default)
    #[serde(default)]
    pub keep_releases: Option<usize>,

    /// Files linked from `shared/` into every release
    #[serde(default)]
    pub shared_files: Vec<String>,

    /// Directories linked from `shared/` into every release
    #[serde(default)]
    pub shared_dirs: Vec<String>,

    /// Commands run in the release root before the new release is fetched
    #[serde(default)]
    pub before_deploy: Vec<String>,

    /// Commands run inside `current` after the restart
    #[serde(default)]
    pub after_deploy: Vec<String>,

    /// Dependency install command, run inside the new release
    #[serde(default)]
    pub install_command: Option<String>,

    /// Build command, run inside the new release
    #[serde(default)]
    pub build_command: Option<String>,

    /// Migration command, run inside the new release
    #[serde(default)]
    pub migrate_command: Option<String>,

    /// Service restart command
    #[serde(default)]
    pub restart_command: Option<String>,

    /// Hold an advisory lock on the release root while deploying
    #[serde(default = "default_lock")]
    pub lock: bool,

    /// Connection timeout for the remote shell (in seconds)
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

fn default_ssh_port() -> String {
    "22".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_lock() -> bool {
    true
}

impl DeployConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DeployError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Configuration(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string, applying defaults and validation
    pub fn from_yaml(yaml: &str) -> Result<Self, DeployError> {
        let mut config: DeployConfig = serde_yaml::from_str(yaml).map_err(|e| {
            DeployError::Configuration(format!("failed to parse config file: {}", e))
        })?;
        config.normalize()?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve legacy keys and expand the key path
    fn normalize(&mut self) -> Result<(), DeployError> {
        if self.ssh_port.trim().is_empty() {
            self.ssh_port = default_ssh_port();
        }
        if self.branch.trim().is_empty() {
            self.branch = default_branch();
        }

        if let Some(remote_path) = self.remote_path.as_deref().filter(|p| !p.is_empty()) {
            if self.root_path.is_empty() {
                self.root_path = remote_path.to_string();
            } else if remote_path.trim_end_matches('/') != self.root_path.trim_end_matches('/') {
                return Err(DeployError::Configuration(format!(
                    "remote_path ({}) and root_path ({}) point at different release roots; \
                     remove remote_path and keep a single root_path",
                    remote_path, self.root_path
                )));
            }
        }

        if !self.ssh_key_path.is_empty() {
            self.ssh_key_path = expand_home(&self.ssh_key_path)?;
        }

        Ok(())
    }

    /// Validate required fields and value ranges
    pub fn validate(&self) -> Result<(), DeployError> {
        let required = [
            ("host", &self.host),
            ("ssh_user", &self.ssh_user),
            ("ssh_key_path", &self.ssh_key_path),
            ("root_path", &self.root_path),
            ("repository", &self.repository),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(DeployError::Configuration(format!(
                    "{} is required in config file",
                    key
                )));
            }
        }

        self.port()?;

        for path in self.shared_dirs.iter().chain(&self.shared_files) {
            validate_shared_path(path)?;
        }

        Ok(())
    }

    /// Remote shell port as a number
    pub fn port(&self) -> Result<u16, DeployError> {
        self.ssh_port.trim().parse().map_err(|_| {
            DeployError::Configuration(format!("ssh_port '{}' is not a valid port", self.ssh_port))
        })
    }

    /// Effective retention count
    pub fn retention(&self) -> usize {
        match self.keep_releases {
            Some(0) | None => DEFAULT_KEEP_RELEASES,
            Some(count) => count,
        }
    }

    pub fn connect_timeout_secs(&self) -> u64 {
        self.connect_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS)
    }

    /// Layout of the release tree under the configured root
    pub fn layout(&self) -> ReleaseLayout {
        ReleaseLayout::new(self.root_path.clone())
    }
}

/// Expand a leading `~/` to the current user's home directory
pub fn expand_home(path: &str) -> Result<String, DeployError> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().ok_or_else(|| {
                DeployError::Configuration("failed to get user home directory".to_string())
            })?;
            Ok(home.join(rest).to_string_lossy().into_owned())
        }
        None => Ok(path.to_string()),
    }
}

fn validate_shared_path(path: &str) -> Result<(), DeployError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || path.starts_with('/') || trimmed.split('/').any(|part| part == "..") {
        return Err(DeployError::Configuration(format!(
            "shared path '{}' must be relative to the release root",
            path
        )));
    }
    Ok(())
}
