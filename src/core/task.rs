//! Task domain model

use crate::core::release::ReleaseId;

/// What a task does when it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Ensure the release root and shared directory exist, run `before_deploy` hooks
    Prepare,
    /// Clone the repository into a fresh release directory and link shared paths
    UpdateCode,
    /// Run the configured install command inside the new release
    InstallDependencies,
    /// Run the configured build command inside the new release
    Build,
    /// Run the configured migration command inside the new release
    Migrate,
    /// Point `current` at the new release
    Symlink,
    /// Run the restart command, optionally followed by `after_deploy` hooks
    Restart { run_hooks: bool },
    /// Remove releases beyond the retention count
    Cleanup,
    /// Point `current` at an existing release
    PointCurrentAt(ReleaseId),
    /// Rename a displaced release out of the enumerable set
    ArchiveRelease(ReleaseId),
}

/// A single named unit of work in a pipeline
///
/// Tasks carry no runtime state; progress is tracked by the
/// [`Pipeline`](crate::core::Pipeline) that owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub action: TaskAction,
}

impl Task {
    pub fn new(name: &str, description: &str, action: TaskAction) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            action,
        }
    }

    /// The fixed deployment sequence
    pub fn deploy_sequence() -> Vec<Task> {
        vec![
            Task::new("Prepare", "Prepare the deployment environment", TaskAction::Prepare),
            Task::new("Update Code", "Fetch the repository into a new release", TaskAction::UpdateCode),
            Task::new(
                "Install Dependencies",
                "Install or update project dependencies",
                TaskAction::InstallDependencies,
            ),
            Task::new("Build", "Build the project", TaskAction::Build),
            Task::new("Migrate", "Run database migrations", TaskAction::Migrate),
            Task::new("Symlink", "Point current at the new release", TaskAction::Symlink),
            Task::new(
                "Restart",
                "Restart application services",
                TaskAction::Restart { run_hooks: true },
            ),
            Task::new("Cleanup", "Remove releases beyond the retention count", TaskAction::Cleanup),
        ]
    }

    /// The rollback sequence from `current` to `target`
    pub fn rollback_sequence(target: &ReleaseId, current: &ReleaseId) -> Vec<Task> {
        vec![
            Task::new(
                "Symlink",
                &format!("Point current at release {}", target),
                TaskAction::PointCurrentAt(target.clone()),
            ),
            Task::new(
                "Restart",
                "Restart application services",
                TaskAction::Restart { run_hooks: false },
            ),
            Task::new(
                "Archive",
                &format!("Archive release {}", current),
                TaskAction::ArchiveRelease(current.clone()),
            ),
        ]
    }
}
