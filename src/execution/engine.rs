//! Main execution engine - runs deploy and rollback pipelines

use crate::{
    core::{DeployConfig, DeployContext, DeployError, ExecutionStatus, Pipeline, ReleaseId},
    execution::{TaskExecutor, TaskOutcome},
    release::{list_releases, plan_rollback, DeployLock, RollbackTarget},
    remote::{shell::quote_path, RemoteExecutor},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_tasks: usize,
    },
    TaskStarted {
        index: usize,
        total: usize,
        name: String,
        description: String,
    },
    TaskCompleted {
        name: String,
        output: String,
    },
    TaskSkipped {
        name: String,
        reason: String,
    },
    TaskFailed {
        name: String,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Summary of a successful deployment
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub execution_id: Uuid,
    /// The release `current` now points at
    pub release: ReleaseId,
    /// Releases removed by retention
    pub pruned: Vec<ReleaseId>,
}

/// Summary of a successful rollback
#[derive(Debug, Clone, Serialize)]
pub struct RollbackReport {
    pub execution_id: Uuid,
    /// The release `current` now points at
    pub target: ReleaseId,
    /// The release that was displaced
    pub displaced: ReleaseId,
    /// Directory name the displaced release was archived under
    pub archived_as: String,
}

/// Pipeline execution engine bound to one remote executor
///
/// Tasks run strictly one after another; the first failure stops the
/// pipeline and nothing already done is undone.
pub struct ExecutionEngine<'a, E: ?Sized> {
    executor: &'a E,
    event_handlers: Vec<EventHandler>,
}

impl<'a, E: RemoteExecutor + ?Sized> ExecutionEngine<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self {
            executor,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute every task of the pipeline in order, stopping at the first failure
    pub async fn execute(&self, pipeline: &mut Pipeline, ctx: &mut DeployContext) -> Result<(), DeployError> {
        let execution_id = pipeline.state.execution_id;
        let total = pipeline.tasks().len();

        info!("Starting {} pipeline ({})", pipeline.name, execution_id);
        pipeline.state.start(total);
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            total_tasks: total,
        });

        let task_executor = TaskExecutor::new(self.executor);

        for index in 0..total {
            let task = pipeline.tasks()[index].clone();

            self.emit_event(ExecutionEvent::TaskStarted {
                index,
                total,
                name: task.name.clone(),
                description: task.description.clone(),
            });
            pipeline.mark_running(index);

            match task_executor.execute(&task, ctx).await {
                Ok(TaskOutcome::Completed { output }) => {
                    pipeline.mark_completed(index, output.clone());
                    self.emit_event(ExecutionEvent::TaskCompleted {
                        name: task.name.clone(),
                        output,
                    });
                }
                Ok(TaskOutcome::Skipped { reason }) => {
                    info!("Task {} skipped: {}", task.name, reason);
                    pipeline.mark_skipped(index, reason.clone());
                    self.emit_event(ExecutionEvent::TaskSkipped {
                        name: task.name.clone(),
                        reason,
                    });
                }
                Err(err) => {
                    error!("Task {} failed: {}", task.name, err);
                    pipeline.mark_failed(index, err.to_string());
                    self.emit_event(ExecutionEvent::TaskFailed {
                        name: task.name.clone(),
                        error: err.to_string(),
                    });
                    self.emit_event(ExecutionEvent::PipelineCompleted {
                        execution_id,
                        status: ExecutionStatus::Failed,
                    });
                    return Err(DeployError::in_task(&task.name, err));
                }
            }
        }

        pipeline.state.complete();
        info!("Pipeline {} finished ({})", pipeline.name, execution_id);
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            status: ExecutionStatus::Completed,
        });

        Ok(())
    }

    /// Deploy a new release with the standard task sequence
    pub async fn deploy(&self, config: &DeployConfig) -> Result<DeployReport, DeployError> {
        let mut pipeline = Pipeline::deploy();
        self.deploy_with(&mut pipeline, config).await
    }

    /// Deploy using a caller-owned pipeline, leaving its task states inspectable
    pub async fn deploy_with(
        &self,
        pipeline: &mut Pipeline,
        config: &DeployConfig,
    ) -> Result<DeployReport, DeployError> {
        let mut ctx = DeployContext::new(config.clone());
        if config.lock {
            // a first deploy has no root to hold the lock yet
            self.executor
                .run_checked(&format!("mkdir -p {}", quote_path(ctx.layout.root())))
                .await?;
        }
        let lock = self.acquire_lock(config, pipeline.state.execution_id).await?;

        let result = self.execute(pipeline, &mut ctx).await;
        self.release_lock(lock, result).await?;

        Ok(DeployReport {
            execution_id: pipeline.state.execution_id,
            release: ctx.release()?.clone(),
            pruned: ctx.pruned,
        })
    }

    /// Point `current` back at an earlier release and archive the newest one
    pub async fn rollback(&self, config: &DeployConfig, target: &RollbackTarget) -> Result<RollbackReport, DeployError> {
        let execution_id = Uuid::new_v4();
        let lock = self.acquire_lock(config, execution_id).await?;

        let result = self.run_rollback(config, target, execution_id).await;
        self.release_lock(lock, result).await
    }

    async fn run_rollback(
        &self,
        config: &DeployConfig,
        target: &RollbackTarget,
        execution_id: Uuid,
    ) -> Result<RollbackReport, DeployError> {
        let mut ctx = DeployContext::new(config.clone());
        let releases = list_releases(self.executor, &ctx.layout).await?;
        let plan = plan_rollback(&releases, target)?;
        info!("Rolling back from {} to {}", plan.current, plan.target);

        let mut pipeline = Pipeline::rollback(&plan.target, &plan.current);
        pipeline.state.execution_id = execution_id;
        self.execute(&mut pipeline, &mut ctx).await?;

        Ok(RollbackReport {
            execution_id,
            target: plan.target,
            displaced: plan.current,
            archived_as: ctx.archived_as.unwrap_or_default(),
        })
    }

    async fn acquire_lock(&self, config: &DeployConfig, execution_id: Uuid) -> Result<Option<DeployLock>, DeployError> {
        if !config.lock {
            return Ok(None);
        }
        let lock = DeployLock::acquire(self.executor, &config.layout(), execution_id).await?;
        Ok(Some(lock))
    }

    /// Release the lock whatever the outcome; an unlock failure only
    /// surfaces when the run itself succeeded
    async fn release_lock<T>(
        &self,
        lock: Option<DeployLock>,
        result: Result<T, DeployError>,
    ) -> Result<T, DeployError> {
        let Some(lock) = lock else {
            return result;
        };

        match (lock.release(self.executor).await, result) {
            (Ok(()), result) => result,
            (Err(unlock_err), Ok(_)) => Err(unlock_err),
            (Err(unlock_err), Err(err)) => {
                warn!("Failed to release deploy lock: {}", unlock_err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{CommandOutput, RemoteError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records commands; answers listings and fails on a marker substring
    #[derive(Default)]
    struct ScriptedExecutor {
        commands: Mutex<Vec<String>>,
        listing: String,
        fail_on: Option<String>,
    }

    impl ScriptedExecutor {
        fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteExecutor for ScriptedExecutor {
        async fn run(&self, command: &str) -> Result<CommandOutput, RemoteError> {
            self.commands.lock().unwrap().push(command.to_string());
            if let Some(marker) = &self.fail_on {
                if command.contains(marker.as_str()) {
                    return Ok(CommandOutput::failure(1, "boom"));
                }
            }
            if command.starts_with("ls -1") {
                return Ok(CommandOutput::success(self.listing.clone()));
            }
            Ok(CommandOutput::success(""))
        }
    }

    fn config(extra: &str) -> DeployConfig {
        DeployConfig::from_yaml(&format!(
            r#"
host: "example.com"
ssh_user: "deploy"
ssh_key_path: "/keys/id"
root_path: "/srv/app"
repository: "git@example.com:app.git"
{}
"#,
            extra
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_deploy_runs_every_task_in_order() {
        let executor = ScriptedExecutor::default();
        let engine = ExecutionEngine::new(&executor);
        let mut pipeline = Pipeline::deploy();

        let report = engine
            .deploy_with(&mut pipeline, &config("build_command: \"make\""))
            .await
            .unwrap();

        assert!(pipeline.is_complete());
        assert_eq!(pipeline.state.status, ExecutionStatus::Completed);
        assert!(matches!(
            pipeline.state_of("Install Dependencies"),
            Some(crate::core::TaskState::Skipped { .. })
        ));
        assert!(matches!(
            pipeline.state_of("Build"),
            Some(crate::core::TaskState::Completed { .. })
        ));

        let release_dir = format!("/srv/app/{}", report.release);
        assert!(executor
            .commands()
            .iter()
            .any(|c| c == &format!("cd '{}' && make", release_dir)));
    }

    #[tokio::test]
    async fn test_deploy_stops_at_first_failure() {
        let executor = ScriptedExecutor {
            fail_on: Some("git clone".to_string()),
            ..Default::default()
        };
        let engine = ExecutionEngine::new(&executor);
        let mut pipeline = Pipeline::deploy();

        let err = engine.deploy_with(&mut pipeline, &config("")).await.unwrap_err();

        assert_eq!(err.task_name(), Some("Update Code"));
        assert!(pipeline.has_failed());
        assert_eq!(pipeline.executed_tasks(), vec!["Prepare", "Update Code"]);
        assert!(!executor.commands().iter().any(|c| c.contains("current")));
        // lock released even though the run failed
        assert!(executor.commands().last().unwrap().starts_with("rm -rf '/srv/app/.deploy.lock'"));
    }

    #[tokio::test]
    async fn test_lock_can_be_disabled() {
        let executor = ScriptedExecutor::default();
        let engine = ExecutionEngine::new(&executor);

        engine.deploy(&config("lock: false")).await.unwrap();

        assert!(!executor.commands().iter().any(|c| c.contains(".deploy.lock")));
    }

    #[tokio::test]
    async fn test_rollback_emits_events() {
        let executor = ScriptedExecutor {
            listing: "20240101000000\n20240201000000\nshared\ncurrent\n".to_string(),
            ..Default::default()
        };
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut engine = ExecutionEngine::new(&executor);
        engine.add_event_handler(move |event| {
            if let ExecutionEvent::TaskStarted { name, .. } = event {
                sink.lock().unwrap().push(name);
            }
        });

        let report = engine
            .rollback(&config(""), &RollbackTarget::Previous)
            .await
            .unwrap();

        assert_eq!(report.target.as_str(), "20240101000000");
        assert_eq!(report.displaced.as_str(), "20240201000000");
        assert!(report.archived_as.starts_with("20240201000000_rollback_"));
        assert_eq!(*events.lock().unwrap(), vec!["Symlink", "Restart", "Archive"]);
    }
}
