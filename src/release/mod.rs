//! Release lifecycle on the remote host: enumeration, switching, archival,
//! retention and locking

pub mod enumerator;
pub mod lock;
pub mod retention;
pub mod rollback;

pub use enumerator::{list_releases, resolve_current};
pub use lock::{force_unlock, DeployLock};
pub use retention::{prune_releases, releases_to_prune};
pub use rollback::{plan_rollback, RollbackPlan, RollbackTarget};

use crate::core::{DeployError, ReleaseId, ReleaseLayout};
use crate::remote::{shell::quote_path, RemoteExecutor};
use chrono::Utc;

const CURRENT_STAGING_LINK: &str = ".current.tmp";

/// Shell command that points `current` at `release`
///
/// The new link is created beside `current` and renamed over it, so readers
/// see either the old or the new target. Hosts whose `mv` lacks `-T` fall
/// back to `ln -sfn` directly on `current`.
pub fn switch_current_command(layout: &ReleaseLayout, release: &ReleaseId) -> String {
    let target = quote_path(&layout.release_dir(release));
    let staging = quote_path(&layout.join(CURRENT_STAGING_LINK));
    let current = quote_path(&layout.current_link());
    format!(
        "ln -sfn {target} {staging} && {{ mv -Tf {staging} {current} 2>/dev/null || \
         {{ rm -f {staging} && ln -sfn {target} {current}; }}; }}"
    )
}

/// Point `current` at `release`
pub async fn switch_current<E>(executor: &E, layout: &ReleaseLayout, release: &ReleaseId) -> Result<String, DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    let output = executor
        .run_checked(&switch_current_command(layout, release))
        .await?;
    Ok(output.output)
}

/// Shell command that renames `release` to `archive_name`, refusing to
/// overwrite an existing archive
pub fn archive_command(layout: &ReleaseLayout, release: &ReleaseId, archive_name: &str) -> String {
    let source = quote_path(&layout.release_dir(release));
    let dest = quote_path(&layout.join(archive_name));
    format!(
        "if [ ! -d {source} ]; then echo 'release directory not found' >&2; exit 1; fi; \
         if [ -e {dest} ]; then echo 'archive already exists' >&2; exit 1; fi; \
         mv {source} {dest}"
    )
}

/// Move a displaced release out of the enumerable set
///
/// Returns the archive directory name.
pub async fn archive_release<E>(executor: &E, layout: &ReleaseLayout, release: &ReleaseId) -> Result<String, DeployError>
where
    E: RemoteExecutor + ?Sized,
{
    let archive_name = release.archive_name(&Utc::now());
    executor
        .run_checked(&archive_command(layout, release, &archive_name))
        .await?;
    Ok(archive_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_current_command() {
        let layout = ReleaseLayout::new("/srv/app");
        let release = ReleaseId::parse("20240101000000").unwrap();
        let command = switch_current_command(&layout, &release);

        assert!(command.starts_with("ln -sfn '/srv/app/20240101000000' '/srv/app/.current.tmp'"));
        assert!(command.contains("mv -Tf '/srv/app/.current.tmp' '/srv/app/current'"));
    }

    #[test]
    fn test_archive_command_guards_existing_archive() {
        let layout = ReleaseLayout::new("/srv/app");
        let release = ReleaseId::parse("20240301000000").unwrap();
        let command = archive_command(&layout, &release, "20240301000000_rollback_20240302_101010");

        assert!(command.contains("if [ -e '/srv/app/20240301000000_rollback_20240302_101010' ]"));
        assert!(command.ends_with(
            "mv '/srv/app/20240301000000' '/srv/app/20240301000000_rollback_20240302_101010'"
        ));
    }
}
