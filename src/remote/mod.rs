//! Remote command execution on the target host

pub mod client;
pub mod local;
pub mod response;
pub mod shell;
pub mod ssh_client;

use async_trait::async_trait;
pub use client::{is_local_host, SshClientConfig};
pub use local::LocalExecutor;
pub use response::{CommandOutput, RemoteError};
pub use ssh_client::SshClient;

use crate::core::config::DeployConfig;
use crate::core::error::DeployError;
use tracing::info;

/// Capability to run a shell command on the target host
///
/// Implementations carry no deployment policy; they only report what the
/// command printed and whether it succeeded.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run a command and capture its combined output
    async fn run(&self, command: &str) -> Result<CommandOutput, RemoteError>;

    /// Run a command, treating a non-zero exit as an error
    async fn run_checked(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        self.run(command).await?.into_result(command)
    }

    /// Release any connection held by the executor
    async fn close(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}

#[async_trait]
impl<T: RemoteExecutor + ?Sized> RemoteExecutor for Box<T> {
    async fn run(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        (**self).run(command).await
    }

    async fn close(&self) -> Result<(), RemoteError> {
        (**self).close().await
    }
}

/// Acquire an executor for the configured host
///
/// Local hosts run through `sh`; anything else connects over SSH.
pub async fn connect(config: &DeployConfig) -> Result<Box<dyn RemoteExecutor>, DeployError> {
    if is_local_host(&config.host) {
        info!("Host {} is local, running commands through sh", config.host);
        return Ok(Box::new(LocalExecutor::new()));
    }

    let client_config = SshClientConfig::from_deploy_config(config)?;
    let client = SshClient::connect(client_config).await?;
    info!("Connected to {}", client.config().destination());
    Ok(Box::new(client))
}
