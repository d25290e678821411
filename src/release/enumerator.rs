//! Release enumeration - which releases exist and which one is live

use crate::core::{DeployError, ReleaseId, ReleaseLayout};
use crate::remote::{shell::quote_path, RemoteExecutor};
use tracing::debug;

/// List releases under the root, oldest first
///
/// Only entries that parse as a [`ReleaseId`] are returned; `current`,
/// `shared`, the lock directory and rollback archives are skipped.
pub async fn list_releases<E>(executor: &E, layout: &ReleaseLayout) -> Result<Vec<ReleaseId>, DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    let command = format!("ls -1 {}", quote_path(layout.root()));
    let output = executor.run_checked(&command).await?;

    let releases = parse_listing(&output.output);
    debug!("Found {} releases under {}", releases.len(), layout.root());
    Ok(releases)
}

/// Turn `ls -1` output into sorted release identifiers
pub fn parse_listing(listing: &str) -> Vec<ReleaseId> {
    let mut releases: Vec<ReleaseId> = listing.lines().filter_map(ReleaseId::parse).collect();
    releases.sort();
    releases.dedup();
    releases
}

/// Release the `current` link resolves to, if any
pub async fn resolve_current<E>(executor: &E, layout: &ReleaseLayout) -> Result<Option<ReleaseId>, DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    let link = quote_path(&layout.current_link());
    let command = format!("if [ -L {link} ]; then readlink {link}; fi");
    let output = executor.run_checked(&command).await?;

    let target = output.output.trim().trim_end_matches('/');
    Ok(target.rsplit('/').next().and_then(ReleaseId::parse))
}
