//! Retention - removes the oldest releases beyond the configured count

use crate::core::{DeployError, ReleaseId, ReleaseLayout};
use crate::release::enumerator::{list_releases, resolve_current};
use crate::remote::{shell::quote_path, RemoteExecutor};
use tracing::info;

/// Releases to delete so that at most `keep` remain
///
/// `releases` must be sorted oldest first. The live release is never
/// selected, even when it is older than the retention window.
pub fn releases_to_prune(releases: &[ReleaseId], keep: usize, live: Option<&ReleaseId>) -> Vec<ReleaseId> {
    let excess = releases.len().saturating_sub(keep);
    releases
        .iter()
        .filter(|release| Some(*release) != live)
        .take(excess)
        .cloned()
        .collect()
}

/// Delete releases beyond `keep`, returning the removed identifiers
pub async fn prune_releases<E>(
    executor: &E,
    layout: &ReleaseLayout,
    keep: usize,
) -> Result<Vec<ReleaseId>, DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    let releases = list_releases(executor, layout).await?;
    let live = resolve_current(executor, layout).await?;
    let doomed = releases_to_prune(&releases, keep, live.as_ref());

    for release in &doomed {
        info!("Removing old release {}", release);
        executor
            .run_checked(&format!("rm -rf {}", quote_path(&layout.release_dir(release))))
            .await?;
    }

    Ok(doomed)
}
