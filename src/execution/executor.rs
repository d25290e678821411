//! Task executor - turns a task into commands on the target host

use crate::{
    core::{DeployContext, DeployError, ReleaseId, Task, TaskAction},
    release::{self, prune_releases},
    remote::{
        shell::{in_dir, parent_dir, quote_arg, quote_path},
        RemoteExecutor,
    },
};
use tracing::{debug, info};

/// Result of running a single task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Task ran its commands; carries their combined output
    Completed { output: String },
    /// Task had nothing to do
    Skipped { reason: String },
}

/// Executes single tasks against a remote executor
pub struct TaskExecutor<'a, E: ?Sized> {
    executor: &'a E,
}

impl<'a, E: RemoteExecutor + ?Sized> TaskExecutor<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Execute a task and return its outcome
    pub async fn execute(&self, task: &Task, ctx: &mut DeployContext) -> Result<TaskOutcome, DeployError> {
        info!("Executing task: {}", task.name);

        match &task.action {
            TaskAction::Prepare => self.prepare(ctx).await,
            TaskAction::UpdateCode => self.update_code(ctx).await,
            TaskAction::InstallDependencies => {
                let command = ctx.config.install_command.clone();
                self.run_in_release(ctx, command.as_deref(), "install_command").await
            }
            TaskAction::Build => {
                let command = ctx.config.build_command.clone();
                self.run_in_release(ctx, command.as_deref(), "build_command").await
            }
            TaskAction::Migrate => {
                let command = ctx.config.migrate_command.clone();
                self.run_in_release(ctx, command.as_deref(), "migrate_command").await
            }
            TaskAction::Symlink => {
                let release = ctx.release()?.clone();
                self.point_current_at(ctx, &release).await
            }
            TaskAction::Restart { run_hooks } => self.restart(ctx, *run_hooks).await,
            TaskAction::Cleanup => self.cleanup(ctx).await,
            TaskAction::PointCurrentAt(release) => self.point_current_at(ctx, release).await,
            TaskAction::ArchiveRelease(release) => {
                let archived = release::archive_release(self.executor, &ctx.layout, release).await?;
                info!("Archived release {} as {}", release, archived);
                ctx.archived_as = Some(archived.clone());
                Ok(TaskOutcome::Completed { output: archived })
            }
        }
    }

    async fn run(&self, command: &str, transcript: &mut String) -> Result<(), DeployError> {
        debug!("Running: {}", command);
        let output = self.executor.run_checked(command).await?;
        transcript.push_str(&output.output);
        Ok(())
    }

    async fn prepare(&self, ctx: &DeployContext) -> Result<TaskOutcome, DeployError> {
        let mut transcript = String::new();
        self.run(
            &format!(
                "mkdir -p {} {}",
                quote_path(ctx.layout.root()),
                quote_path(&ctx.layout.shared_dir())
            ),
            &mut transcript,
        )
        .await?;

        for hook in &ctx.config.before_deploy {
            self.run(&in_dir(ctx.layout.root(), hook), &mut transcript).await?;
        }

        Ok(TaskOutcome::Completed { output: transcript })
    }

    async fn update_code(&self, ctx: &mut DeployContext) -> Result<TaskOutcome, DeployError> {
        let release = ReleaseId::now();
        let release_dir = ctx.layout.release_dir(&release);
        let mut transcript = String::new();

        let exists = self
            .executor
            .run(&format!("test ! -e {}", quote_path(&release_dir)))
            .await?;
        if !exists.success {
            return Err(DeployError::Execution {
                command: format!("test ! -e {}", quote_path(&release_dir)),
                exit_code: exists.exit_code,
                output: format!("release directory {} already exists", release_dir),
            });
        }

        self.run(
            &format!(
                "git clone --depth 1 --branch {} {} {}",
                quote_arg(&ctx.config.branch),
                quote_arg(&ctx.config.repository),
                quote_path(&release_dir)
            ),
            &mut transcript,
        )
        .await?;
        ctx.release = Some(release.clone());
        info!("Created release {}", release);

        for dir in &ctx.config.shared_dirs {
            let shared = ctx.layout.shared_path(dir);
            let linked = format!("{}/{}", release_dir, dir.trim_matches('/'));
            self.run(&link_shared_command(&shared, &linked, true), &mut transcript)
                .await?;
        }
        for file in &ctx.config.shared_files {
            let shared = ctx.layout.shared_path(file);
            let linked = format!("{}/{}", release_dir, file.trim_matches('/'));
            self.run(&link_shared_command(&shared, &linked, false), &mut transcript)
                .await?;
        }

        Ok(TaskOutcome::Completed { output: transcript })
    }

    async fn run_in_release(
        &self,
        ctx: &DeployContext,
        command: Option<&str>,
        key: &str,
    ) -> Result<TaskOutcome, DeployError> {
        let release_dir = ctx.release_dir()?;
        let Some(command) = command.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(TaskOutcome::Skipped {
                reason: format!("no {} configured", key),
            });
        };

        let mut transcript = String::new();
        self.run(&in_dir(&release_dir, command), &mut transcript).await?;
        Ok(TaskOutcome::Completed { output: transcript })
    }

    async fn point_current_at(&self, ctx: &DeployContext, release: &ReleaseId) -> Result<TaskOutcome, DeployError> {
        let output = release::switch_current(self.executor, &ctx.layout, release).await?;
        info!("current -> {}", release);
        Ok(TaskOutcome::Completed { output })
    }

    async fn restart(&self, ctx: &DeployContext, run_hooks: bool) -> Result<TaskOutcome, DeployError> {
        let restart = ctx
            .config
            .restart_command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let hooks: &[String] = if run_hooks { &ctx.config.after_deploy } else { &[] };

        if restart.is_none() && hooks.is_empty() {
            return Ok(TaskOutcome::Skipped {
                reason: "no restart_command configured".to_string(),
            });
        }

        let mut transcript = String::new();
        if let Some(command) = restart {
            self.run(command, &mut transcript).await?;
        }
        for hook in hooks {
            self.run(&in_dir(&ctx.layout.current_link(), hook), &mut transcript)
                .await?;
        }

        Ok(TaskOutcome::Completed { output: transcript })
    }

    async fn cleanup(&self, ctx: &mut DeployContext) -> Result<TaskOutcome, DeployError> {
        let keep = ctx.config.retention();
        let pruned = prune_releases(self.executor, &ctx.layout, keep).await?;

        if pruned.is_empty() {
            return Ok(TaskOutcome::Skipped {
                reason: format!("{} or fewer releases present", keep),
            });
        }

        let output = pruned
            .iter()
            .map(|r| format!("removed {}", r))
            .collect::<Vec<_>>()
            .join("\n");
        ctx.pruned = pruned;
        Ok(TaskOutcome::Completed { output })
    }
}

/// Command linking a shared path into a release, creating it in `shared/`
/// first when missing
fn link_shared_command(shared: &str, linked: &str, is_dir: bool) -> String {
    let mut parts = Vec::new();
    if is_dir {
        parts.push(format!("mkdir -p {}", quote_path(shared)));
    } else {
        if let Some(parent) = parent_dir(shared) {
            parts.push(format!("mkdir -p {}", quote_path(parent)));
        }
        parts.push(format!("touch {}", quote_path(shared)));
    }
    parts.push(format!("rm -rf {}", quote_path(linked)));
    if let Some(parent) = parent_dir(linked) {
        parts.push(format!("mkdir -p {}", quote_path(parent)));
    }
    parts.push(format!("ln -sfn {} {}", quote_path(shared), quote_path(linked)));
    parts.join(" && ")
}
