//! Remote command results

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for remote command execution
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("command `{command}` failed: {output}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Output of one command run on the target host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Combined stdout and stderr
    pub output: String,

    /// Whether the command exited with status zero
    pub success: bool,

    /// Exit code, when the process exited normally
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
            exit_code: Some(0),
        }
    }

    pub fn failure(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: false,
            exit_code: Some(exit_code),
        }
    }

    /// Turn a non-zero exit into an error carrying the command
    pub fn into_result(self, command: &str) -> Result<CommandOutput, RemoteError> {
        if self.success {
            Ok(self)
        } else {
            Err(RemoteError::CommandFailed {
                command: command.to_string(),
                exit_code: self.exit_code,
                output: self.output.trim().to_string(),
            })
        }
    }

    /// Merge stdout and stderr the way a terminal would show them
    pub(crate) fn combine(stdout: &[u8], stderr: &[u8]) -> String {
        let stdout = String::from_utf8_lossy(stdout);
        let stderr = String::from_utf8_lossy(stderr);
        match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
            (_, true) => stdout.into_owned(),
            (true, false) => stderr.into_owned(),
            (false, false) => format!("{}\n{}", stdout.trim_end(), stderr),
        }
    }
}
