//! Deploy context - state threaded between tasks of one run

use crate::core::{
    config::DeployConfig,
    error::DeployError,
    release::{ReleaseId, ReleaseLayout},
};

/// Execution context for a deploy or rollback run
///
/// Carries the configuration plus values produced by earlier tasks, most
/// importantly the release created by the Update Code task, so later tasks
/// never have to re-derive "the newest release" from the remote filesystem.
#[derive(Debug, Clone)]
pub struct DeployContext {
    /// Configuration for this run
    pub config: DeployConfig,

    /// Remote release tree
    pub layout: ReleaseLayout,

    /// Release created by this run (set by Update Code)
    pub release: Option<ReleaseId>,

    /// Releases removed by retention pruning
    pub pruned: Vec<ReleaseId>,

    /// Archive directory name produced by a rollback
    pub archived_as: Option<String>,
}

impl DeployContext {
    pub fn new(config: DeployConfig) -> Self {
        let layout = config.layout();
        Self {
            config,
            layout,
            release: None,
            pruned: Vec::new(),
            archived_as: None,
        }
    }

    /// The release created earlier in this run
    pub fn release(&self) -> Result<&ReleaseId, DeployError> {
        self.release.as_ref().ok_or_else(|| DeployError::Execution {
            command: String::new(),
            exit_code: None,
            output: "no release has been created in this run".to_string(),
        })
    }

    /// Absolute path of the release created in this run
    pub fn release_dir(&self) -> Result<String, DeployError> {
        Ok(self.layout.release_dir(self.release()?))
    }
}
