//! Pipeline domain model

use crate::core::{
    release::ReleaseId,
    state::{ExecutionStatus, PipelineState, TaskState},
    task::Task,
};
use chrono::Utc;

/// An ordered, per-invocation sequence of tasks and their run state
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Execution state
    pub state: PipelineState,

    tasks: Vec<Task>,
    task_states: Vec<TaskState>,
}

impl Pipeline {
    pub fn new(name: &str, tasks: Vec<Task>) -> Self {
        let task_states = vec![TaskState::Pending; tasks.len()];
        Pipeline {
            name: name.to_string(),
            state: PipelineState::new(),
            tasks,
            task_states,
        }
    }

    /// Pipeline for a full deployment
    pub fn deploy() -> Self {
        Self::new("deploy", Task::deploy_sequence())
    }

    /// Pipeline for switching `current` from `current` back to `target`
    pub fn rollback(target: &ReleaseId, current: &ReleaseId) -> Self {
        Self::new("rollback", Task::rollback_sequence(target, current))
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task state by task name
    pub fn state_of(&self, name: &str) -> Option<&TaskState> {
        self.tasks
            .iter()
            .position(|t| t.name == name)
            .and_then(|i| self.task_states.get(i))
    }

    /// Names of tasks that ran, in execution order
    pub fn executed_tasks(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .zip(&self.task_states)
            .filter(|(_, state)| state.was_executed())
            .map(|(task, _)| task.name.as_str())
            .collect()
    }

    /// Check if every task reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.task_states.iter().all(|s| s.is_terminal())
    }

    /// Check if pipeline has failed
    pub fn has_failed(&self) -> bool {
        self.state.status == ExecutionStatus::Failed
    }

    pub(crate) fn mark_running(&mut self, index: usize) {
        if let Some(state) = self.task_states.get_mut(index) {
            *state = TaskState::Running {
                started_at: Utc::now(),
            };
        }
    }

    pub(crate) fn mark_completed(&mut self, index: usize, output: String) {
        if let Some(state) = self.task_states.get_mut(index) {
            let started_at = match state {
                TaskState::Running { started_at } => *started_at,
                _ => Utc::now(),
            };
            *state = TaskState::Completed {
                output,
                started_at,
                completed_at: Utc::now(),
            };
            self.state.finished_tasks += 1;
        }
    }

    pub(crate) fn mark_skipped(&mut self, index: usize, reason: String) {
        if let Some(state) = self.task_states.get_mut(index) {
            *state = TaskState::Skipped { reason };
            self.state.finished_tasks += 1;
        }
    }

    pub(crate) fn mark_failed(&mut self, index: usize, error: String) {
        if let Some(state) = self.task_states.get_mut(index) {
            let started_at = match state {
                TaskState::Running { started_at } => *started_at,
                _ => Utc::now(),
            };
            *state = TaskState::Failed {
                error,
                started_at,
                failed_at: Utc::now(),
            };
        }
        self.state.fail();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pipeline_is_pending() {
        let pipeline = Pipeline::deploy();

        assert_eq!(pipeline.tasks().len(), 8);
        assert!(pipeline.executed_tasks().is_empty());
        assert!(!pipeline.is_complete());
        assert!(matches!(pipeline.state_of("Build"), Some(TaskState::Pending)));
        assert!(pipeline.state_of("Deploy").is_none());
    }

    #[test]
    fn test_task_transitions() {
        let mut pipeline = Pipeline::deploy();
        pipeline.state.start(pipeline.tasks().len());

        pipeline.mark_running(0);
        pipeline.mark_completed(0, "ok".to_string());
        pipeline.mark_running(1);
        pipeline.mark_failed(1, "clone failed".to_string());

        assert_eq!(pipeline.executed_tasks(), vec!["Prepare", "Update Code"]);
        assert!(pipeline.has_failed());
        assert_eq!(pipeline.state.finished_tasks, 1);
        assert!(matches!(
            pipeline.state_of("Update Code"),
            Some(TaskState::Failed { error, .. }) if error == "clone failed"
        ));
    }
}
