use log::{debug, warn};
use std::path::Path;

use super::model::PrivilegeState;
use crate::runtime::Runtime;

/// Find out whether this process may create symlinks by trying it once in the
/// temp directory. Creating a symlink without Developer Mode or elevation
/// fails on Windows; elsewhere it normally succeeds.
#[tracing::instrument(skip(runtime))]
pub fn probe_privilege<R: Runtime>(runtime: &R) -> PrivilegeState {
    PrivilegeState {
        can_create_symlinks: can_create_symlinks(runtime, &runtime.temp_dir()),
        elevated: runtime.is_privileged(),
    }
}

fn can_create_symlinks<R: Runtime>(runtime: &R, scratch: &Path) -> bool {
    let pid = std::process::id();
    let target = scratch.join(format!("_modlink_symlink_target_{}", pid));
    let link = scratch.join(format!("_modlink_symlink_test_{}", pid));

    if let Err(e) = runtime.create_dir_all(&target) {
        warn!("Cannot prepare symlink probe in {}: {:#}", scratch.display(), e);
        return false;
    }
    if runtime.is_symlink(&link) {
        let _ = runtime.remove_symlink(&link);
    }

    let result = runtime.symlink(&target, &link);
    if result.is_ok() {
        let _ = runtime.remove_symlink(&link);
    }
    let _ = runtime.remove_dir(&target);

    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("Symlink probe failed: {:#}", e);
            false
        }
    }
}
