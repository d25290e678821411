//! Test utilities shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use deployer::core::{DeployConfig, Pipeline, TaskState};
use deployer::remote::{CommandOutput, RemoteError, RemoteExecutor};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

pub const ROOT: &str = "/srv/app";

/// Release tree the mock pretends to hold
#[derive(Debug, Default, Clone)]
pub struct RemoteTree {
    /// Release and archive directory names under the root
    pub entries: BTreeSet<String>,
    /// Name `current` points at
    pub current: Option<String>,
    /// Owner text of a held lock
    pub lock: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    commands: Vec<String>,
    tree: RemoteTree,
    fail_on: Option<String>,
}

/// Mock executor that records every command and simulates the release tree
///
/// It understands the handful of shell shapes the deployer emits (listing,
/// readlink, clone, link switch, archive move, removal and the lock
/// directory) and answers everything else with success.
#[derive(Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with these releases present, `current` on the newest
    pub fn with_releases(releases: &[&str]) -> Self {
        let mock = Self::new();
        {
            let mut state = mock.state.lock().unwrap();
            state.tree.entries = releases.iter().map(|r| r.to_string()).collect();
            state.tree.current = releases.iter().max().map(|r| r.to_string());
        }
        mock
    }

    /// Fail (exit 1) every command containing `marker`
    pub fn fail_on(self, marker: &str) -> Self {
        self.state.lock().unwrap().fail_on = Some(marker.to_string());
        self
    }

    /// Pretend another run holds the lock
    pub fn locked_by(self, holder: &str) -> Self {
        self.state.lock().unwrap().tree.lock = Some(holder.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn tree(&self) -> RemoteTree {
        self.state.lock().unwrap().tree.clone()
    }

    /// Index of the first recorded command containing `needle`
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.commands().iter().position(|c| c.contains(needle))
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }
}

/// Single-quoted arguments of a command, in order
fn quoted_args(command: &str) -> Vec<&str> {
    command.split('\'').skip(1).step_by(2).collect()
}

fn base_name(path: &str) -> String {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("").to_string()
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    async fn run(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.to_string());

        if let Some(marker) = &state.fail_on {
            if command.contains(marker.as_str()) {
                return Ok(CommandOutput::failure(1, "simulated failure"));
            }
        }

        let args = quoted_args(command);
        let tree = &mut state.tree;

        if command.starts_with("ls -1") {
            let mut listing: Vec<String> = tree.entries.iter().cloned().collect();
            listing.push("shared".to_string());
            if tree.current.is_some() {
                listing.push("current".to_string());
            }
            return Ok(CommandOutput::success(listing.join("\n")));
        }
        if command.contains("readlink") {
            let target = tree
                .current
                .as_ref()
                .map(|c| format!("{}/{}\n", ROOT, c))
                .unwrap_or_default();
            return Ok(CommandOutput::success(target));
        }
        if command.starts_with("mkdir '") && command.ends_with(".deploy.lock'") {
            if tree.lock.is_some() {
                return Ok(CommandOutput::failure(1, "mkdir: File exists"));
            }
            tree.lock = Some(String::new());
            return Ok(CommandOutput::success(""));
        }
        if command.starts_with("printf") && command.contains(".deploy.lock/owner") {
            tree.lock = args.first().map(|s| s.to_string());
            return Ok(CommandOutput::success(""));
        }
        if command.starts_with("if [ -d") && command.contains(".deploy.lock/owner") {
            return Ok(match &tree.lock {
                Some(holder) => CommandOutput::success(holder.clone()),
                None => CommandOutput::failure(1, ""),
            });
        }
        if command.starts_with("git clone") {
            if let Some(dest) = args.last() {
                tree.entries.insert(base_name(dest));
            }
        } else if command.starts_with("ln -sfn") && command.contains(".current.tmp") {
            tree.current = args.first().map(|target| base_name(target));
        } else if command.contains("_rollback_") && args.len() >= 2 {
            let source = base_name(args[args.len() - 2]);
            let dest = base_name(args[args.len() - 1]);
            if !tree.entries.remove(&source) {
                return Ok(CommandOutput::failure(1, "release directory not found"));
            }
            tree.entries.insert(dest);
        } else if command.starts_with("rm -rf") && args.len() == 1 {
            let name = base_name(args[0]);
            if name == ".deploy.lock" {
                tree.lock = None;
            } else {
                tree.entries.remove(&name);
            }
        }

        Ok(CommandOutput::success(""))
    }
}

/// Config pointing at [`ROOT`], with extra YAML appended
pub fn config_with(extra: &str) -> DeployConfig {
    DeployConfig::from_yaml(&format!(
        r#"
host: "app.example.com"
ssh_user: "deploy"
ssh_key_path: "/keys/deploy"
root_path: "{}"
repository: "git@example.com:acme/app.git"
{}
"#,
        ROOT, extra
    ))
    .unwrap()
}

pub fn config() -> DeployConfig {
    config_with("")
}

/// Assert a named task failed
pub fn assert_task_failed(pipeline: &Pipeline, name: &str) {
    match pipeline.state_of(name) {
        Some(TaskState::Failed { .. }) => {}
        other => panic!("expected task '{}' to have failed, got {:?}", name, other),
    }
}

/// Assert a named task never ran
pub fn assert_task_pending(pipeline: &Pipeline, name: &str) {
    match pipeline.state_of(name) {
        Some(TaskState::Pending) => {}
        other => panic!("expected task '{}' to be pending, got {:?}", name, other),
    }
}
