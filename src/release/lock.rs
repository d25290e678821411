//! Advisory lock on a release root
//!
//! The lock is a directory (`mkdir` is atomic on POSIX filesystems) holding
//! an `owner` file that describes who took it.

use crate::core::{DeployError, ReleaseLayout};
use crate::remote::{shell::quote_path, RemoteExecutor};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A held lock; call [`DeployLock::release`] on every exit path
#[derive(Debug)]
#[must_use = "the lock stays on the remote host until released"]
pub struct DeployLock {
    dir: String,
}

impl DeployLock {
    /// Take the lock, failing fast if another run holds it
    ///
    /// The root must already exist; a missing root surfaces as the failed
    /// `mkdir`, not as contention.
    pub async fn acquire<E>(
        executor: &E,
        layout: &ReleaseLayout,
        execution_id: Uuid,
    ) -> Result<Self, DeployError>
    where
        E: RemoteExecutor + ?Sized,
    {
        let dir = layout.lock_dir();
        let mkdir = format!("mkdir {}", quote_path(&dir));

        let taken = executor.run(&mkdir).await?;
        if !taken.success {
            let check = format!(
                "if [ -d {} ]; then cat {} 2>/dev/null; true; else exit 1; fi",
                quote_path(&dir),
                quote_path(&owner_file(&dir))
            );
            let held = executor.run(&check).await?;
            if !held.success {
                return Err(DeployError::Execution {
                    command: mkdir,
                    exit_code: taken.exit_code,
                    output: taken.output.trim().to_string(),
                });
            }

            let holder = held.output.trim().to_string();
            return Err(DeployError::Locked {
                root: layout.root().to_string(),
                holder: if holder.is_empty() {
                    "unknown owner".to_string()
                } else {
                    holder
                },
            });
        }

        let owner = owner_description(execution_id);
        let written = executor
            .run_checked(&format!(
                "printf '%s\\n' {} > {}",
                quote_path(&owner),
                quote_path(&owner_file(&dir))
            ))
            .await;
        if let Err(err) = written {
            // drop the half-taken lock
            if let Err(cleanup) = executor.run_checked(&format!("rm -rf {}", quote_path(&dir))).await {
                warn!("Failed to remove lock {} after owner write failed: {}", dir, cleanup);
            }
            return Err(err.into());
        }

        debug!("Acquired lock {}", dir);
        Ok(Self { dir })
    }

    pub async fn release<E>(self, executor: &E) -> Result<(), DeployError>
    where
        E: RemoteExecutor + ?Sized,
    {
        executor
            .run_checked(&format!("rm -rf {}", quote_path(&self.dir)))
            .await?;
        debug!("Released lock {}", self.dir);
        Ok(())
    }
}

/// Remove a lock left behind by an interrupted run
pub async fn force_unlock<E>(executor: &E, layout: &ReleaseLayout) -> Result<bool, DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    let dir = quote_path(&layout.lock_dir());
    let output = executor
        .run_checked(&format!("if [ -d {dir} ]; then rm -rf {dir} && echo removed; fi"))
        .await?;
    let removed = output.output.trim() == "removed";
    if removed {
        info!("Removed lock {}", layout.lock_dir());
    }
    Ok(removed)
}

fn owner_file(dir: &str) -> String {
    format!("{}/owner", dir)
}

fn owner_description(execution_id: Uuid) -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    format!(
        "{} (execution {}, since {})",
        user,
        execution_id,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}
