//! Remote shell client configuration

use crate::core::config::{DeployConfig, DEFAULT_CONNECT_TIMEOUT_SECS};
use crate::core::error::DeployError;

/// Configuration for an SSH client
#[derive(Debug, Clone)]
pub struct SshClientConfig {
    pub host: String,
    pub user: String,
    pub port: u16,

    /// Private key passed to `ssh -i`
    pub identity_file: Option<String>,

    /// Timeout for establishing the connection in seconds
    pub connect_timeout_secs: u64,

    /// Path to the ssh executable (defaults to `ssh` on PATH)
    pub ssh_path: String,
}

impl SshClientConfig {
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            port: 22,
            identity_file: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            ssh_path: "ssh".to_string(),
        }
    }

    /// Build the client configuration from a deploy configuration
    pub fn from_deploy_config(config: &DeployConfig) -> Result<Self, DeployError> {
        Ok(Self::new(&config.host, &config.ssh_user)
            .with_port(config.port()?)
            .with_identity_file(&config.ssh_key_path)
            .with_timeout(config.connect_timeout_secs()))
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_identity_file(mut self, path: &str) -> Self {
        self.identity_file = Some(path.to_string()).filter(|p| !p.is_empty());
        self
    }

    pub fn with_timeout(mut self, connect_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self
    }

    pub fn with_ssh_path(mut self, ssh_path: &str) -> Self {
        self.ssh_path = ssh_path.to_string();
        self
    }

    /// `user@host` destination
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// Whether the host refers to the machine we are running on
pub fn is_local_host(host: &str) -> bool {
    matches!(host.trim(), "localhost" | "127.0.0.1" | "::1")
}
