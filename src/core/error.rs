//! Error types for deploy and rollback operations

use crate::remote::RemoteError;
use thiserror::Error;

/// Errors surfaced by the release-lifecycle core
///
/// Every error is propagated unchanged to the caller; task failures are
/// wrapped in [`DeployError::Task`] so the message names the failing step.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("command `{command}` failed{}: {output}", exit_code_suffix(.exit_code))]
    Execution {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("not enough releases to roll back (found {found}, need at least 2)")]
    InsufficientHistory { found: usize },

    #[error("release {0} does not exist")]
    UnknownVersion(String),

    #[error("release {0} is already the newest release, nothing to roll back")]
    NothingToRollBack(String),

    #[error("{root} is locked by another deployment ({holder})")]
    Locked { root: String, holder: String },

    #[error("task '{task}' failed: {source}")]
    Task {
        task: String,
        #[source]
        source: Box<DeployError>,
    },
}

fn exit_code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl DeployError {
    /// Wrap an error with the name of the task that produced it
    pub fn in_task(task: &str, source: DeployError) -> Self {
        DeployError::Task {
            task: task.to_string(),
            source: Box::new(source),
        }
    }

    /// Name of the failing task, if this error came out of a pipeline
    pub fn task_name(&self) -> Option<&str> {
        match self {
            DeployError::Task { task, .. } => Some(task),
            _ => None,
        }
    }

    /// The innermost error with all task wrappers removed
    pub fn root_cause(&self) -> &DeployError {
        match self {
            DeployError::Task { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<RemoteError> for DeployError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Transport(message) => DeployError::Transport(message),
            RemoteError::Timeout(secs) => {
                DeployError::Transport(format!("connection timed out after {} seconds", secs))
            }
            RemoteError::CommandFailed {
                command,
                exit_code,
                output,
            } => DeployError::Execution {
                command,
                exit_code,
                output,
            },
            RemoteError::Internal(message) => DeployError::Execution {
                command: String::new(),
                exit_code: None,
                output: message,
            },
        }
    }
}
