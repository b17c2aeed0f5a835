use log::warn;
use std::path::{Path, PathBuf};

use super::error::{ModError, ModResult};
use super::model::ScannedEntry;
use crate::runtime::Runtime;

/// Lists candidate mod folders (directories and symlinks) directly under a root.
pub struct DirectoryScanner<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> DirectoryScanner<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Entries are yielded in filesystem order, which callers must not rely on.
    /// Regular files are skipped, as are children whose names are not valid UTF-8.
    #[tracing::instrument(skip(self))]
    pub fn list_entries(
        &self,
        root: &Path,
    ) -> ModResult<impl Iterator<Item = ScannedEntry> + use<'a, R>> {
        let children = self
            .runtime
            .read_dir(root)
            .map_err(|source| ModError::DirectoryUnreadable {
                path: root.to_path_buf(),
                source,
            })?;

        let runtime = self.runtime;
        Ok(children
            .into_iter()
            .filter_map(move |path| to_entry(runtime, path)))
    }
}

fn to_entry<R: Runtime>(runtime: &R, path: PathBuf) -> Option<ScannedEntry> {
    // Symlinks are kept even when broken so they still occupy their slot.
    if !runtime.is_symlink(&path) && !runtime.is_dir(&path) {
        return None;
    }

    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => Some(ScannedEntry {
            name: name.to_string(),
            path,
        }),
        None => {
            warn!("Skipping entry with non UTF-8 name: {:?}", path);
            None
        }
    }
}
