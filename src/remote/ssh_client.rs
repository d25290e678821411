//! SSH client - runs commands on the target host through the `ssh` binary

use crate::remote::{client::SshClientConfig, CommandOutput, RemoteError, RemoteExecutor};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Exit status ssh uses for its own (connection/authentication) failures
///
/// A remote command can exit 255 too, so the status alone is not enough;
/// see [`is_transport_failure`].
const SSH_TRANSPORT_FAILURE: i32 = 255;

/// Messages ssh itself prints when it cannot reach or log in to the host
const SSH_FAILURE_MARKERS: &[&str] = &[
    "ssh: ",
    "Permission denied (",
    "Host key verification failed",
    "Connection closed by",
    "Connection reset by",
    "kex_exchange_identification",
    "Control socket connect",
];

/// Whether a 255 exit came from ssh rather than from the remote command
fn is_transport_failure(exit_code: Option<i32>, stderr: &str) -> bool {
    exit_code == Some(SSH_TRANSPORT_FAILURE)
        && stderr
            .lines()
            .any(|line| SSH_FAILURE_MARKERS.iter().any(|marker| line.contains(marker)))
}

/// Client for executing commands over SSH
///
/// Commands share one multiplexed master connection (`ControlMaster=auto`)
/// which is opened by [`SshClient::connect`] and torn down by
/// [`RemoteExecutor::close`].
#[derive(Debug, Clone)]
pub struct SshClient {
    config: SshClientConfig,
    control_path: String,
}

impl SshClient {
    pub fn new(config: SshClientConfig) -> Self {
        Self {
            config,
            control_path: "/tmp/deployer-%C".to_string(),
        }
    }

    /// Open the connection and verify the host is reachable
    ///
    /// Bounded by the configured connect timeout.
    pub async fn connect(config: SshClientConfig) -> Result<Self, RemoteError> {
        if let Some(identity_file) = &config.identity_file {
            if !std::path::Path::new(identity_file).exists() {
                return Err(RemoteError::Transport(format!(
                    "unable to read private key: {} not found",
                    identity_file
                )));
            }
        }

        let client = Self::new(config);
        let limit = client.config.connect_timeout_secs;

        debug!("Connecting to {}:{}", client.config.host, client.config.port);
        let reply = timeout(Duration::from_secs(limit), client.run("true"))
            .await
            .map_err(|_| RemoteError::Timeout(limit))??;

        if !reply.success {
            return Err(RemoteError::Transport(format!(
                "failed to dial {}: {}",
                client.config.destination(),
                reply.output.trim()
            )));
        }

        Ok(client)
    }

    pub fn config(&self) -> &SshClientConfig {
        &self.config
    }

    fn build_ssh_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(identity_file) = &self.config.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.clone());
        }

        args.push("-p".to_string());
        args.push(self.config.port.to_string());

        for option in [
            "BatchMode=yes".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
            "ServerAliveInterval=15".to_string(),
            "ServerAliveCountMax=3".to_string(),
            "ControlMaster=auto".to_string(),
            "ControlPersist=60".to_string(),
            format!("ControlPath={}", self.control_path),
        ] {
            args.push("-o".to_string());
            args.push(option);
        }

        args
    }
}

#[async_trait]
impl RemoteExecutor for SshClient {
    async fn run(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        debug!("ssh {}: {}", self.config.destination(), command);

        let output = Command::new(&self.config.ssh_path)
            .args(self.build_ssh_args())
            .arg(self.config.destination())
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RemoteError::Transport(format!("failed to spawn ssh: {}", e)))?;

        let combined = CommandOutput::combine(&output.stdout, &output.stderr);
        let exit_code = output.status.code();

        if is_transport_failure(exit_code, &String::from_utf8_lossy(&output.stderr)) {
            warn!("ssh transport failure for {}: {}", self.config.destination(), combined.trim());
            return Err(RemoteError::Transport(format!(
                "{}: {}",
                self.config.destination(),
                combined.trim()
            )));
        }

        Ok(CommandOutput {
            output: combined,
            success: output.status.success(),
            exit_code,
        })
    }

    async fn close(&self) -> Result<(), RemoteError> {
        let status = Command::new(&self.config.ssh_path)
            .args(self.build_ssh_args())
            .args(["-O", "exit"])
            .arg(self.config.destination())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RemoteError::Transport(format!("failed to spawn ssh: {}", e)))?;

        if !status.status.success() {
            debug!(
                "ssh master for {} already closed: {}",
                self.config.destination(),
                String::from_utf8_lossy(&status.stderr).trim()
            );
        }
        Ok(())
    }
}
