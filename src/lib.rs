//! deployer - push versioned releases to a host over SSH and roll them back

pub mod cli;
pub mod core;
pub mod execution;
pub mod release;
pub mod remote;
pub mod version;

// Re-export commonly used types
pub use core::{DeployConfig, DeployContext, DeployError, ExecutionStatus, Pipeline, ReleaseId, ReleaseLayout};
pub use execution::{DeployReport, ExecutionEngine, ExecutionEvent, RollbackReport};
pub use release::RollbackTarget;
pub use remote::{CommandOutput, LocalExecutor, RemoteError, RemoteExecutor, SshClient};
