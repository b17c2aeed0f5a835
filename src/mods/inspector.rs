use log::debug;
use std::path::Path;

use super::model::Classification;
use crate::runtime::Runtime;

/// Classifies entries of the extensions directory by their link metadata.
pub struct LinkInspector<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> LinkInspector<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Never fails: an unreadable or dangling link is reported as broken.
    #[tracing::instrument(skip(self))]
    pub fn classify(&self, entry: &Path) -> Classification {
        if !self.runtime.is_symlink(entry) {
            return Classification::directory();
        }

        match self.runtime.resolve_link(entry) {
            // `exists` follows the link, so it fails for dangling targets.
            Ok(target) if self.runtime.exists(entry) => Classification::symlink(target),
            Ok(target) => {
                debug!("Link {:?} points to missing {:?}", entry, target);
                Classification::broken_symlink()
            }
            Err(e) => {
                debug!("Cannot read link {:?}: {:#}", entry, e);
                Classification::broken_symlink()
            }
        }
    }

    /// Whether a slot is taken by anything, including a broken symlink.
    pub fn is_occupied(&self, path: &Path) -> bool {
        self.runtime.is_symlink(path) || self.runtime.exists(path)
    }
}
