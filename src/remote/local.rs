//! Local executor - runs commands through `sh -c` on this machine

use crate::remote::{CommandOutput, RemoteError, RemoteExecutor};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Executor used when the target host is this machine
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    shell: String,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteExecutor for LocalExecutor {
    async fn run(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        debug!("local: {}", command);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RemoteError::Internal(format!("failed to spawn {}: {}", self.shell, e)))?;

        Ok(CommandOutput {
            output: CommandOutput::combine(&output.stdout, &output.stderr),
            success: output.status.success(),
            exit_code: output.status.code(),
        })
    }
}
