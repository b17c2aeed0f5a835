//! Validation of the configured mods/extensions roots and of mod names.

use log::debug;
use std::path::{Path, PathBuf};

use super::error::{ModError, ModResult};
use super::model::Roots;
use crate::runtime::{Runtime, is_path_under, is_single_component};

pub struct PathResolver<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> PathResolver<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Resolve a user-supplied directory to its canonical absolute path.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, raw: &Path) -> ModResult<PathBuf> {
        let trimmed = raw.to_string_lossy();
        let trimmed = trimmed.trim();
        if trimmed.is_empty() {
            return Err(ModError::invalid_path(raw, "path is empty"));
        }

        let path = PathBuf::from(trimmed);
        if !self.runtime.exists(&path) {
            return Err(ModError::invalid_path(path, "does not exist"));
        }
        if !self.runtime.is_dir(&path) {
            return Err(ModError::invalid_path(path, "is not a directory"));
        }

        let canonical = self
            .runtime
            .canonicalize(&path)
            .map_err(|e| ModError::invalid_path(&path, format!("{:#}", e)))?;
        debug!("Resolved {:?} to {:?}", raw, canonical);
        Ok(canonical)
    }

    /// Resolve both roots and reject layouts that would let a link point at itself.
    #[tracing::instrument(skip(self))]
    pub fn validate_roots(&self, source: Option<&Path>, target: Option<&Path>) -> ModResult<Roots> {
        let source = source.ok_or_else(|| ModError::Config("mods directory is not set".into()))?;
        let target =
            target.ok_or_else(|| ModError::Config("extensions directory is not set".into()))?;

        let source = self.resolve(source)?;
        let target = self.resolve(target)?;

        if source == target {
            return Err(ModError::Config(format!(
                "mods and extensions directories are the same: {}",
                source.display()
            )));
        }
        if is_path_under(&source, &target) || is_path_under(&target, &source) {
            return Err(ModError::Config(format!(
                "mods directory {} and extensions directory {} must not be nested",
                source.display(),
                target.display()
            )));
        }

        Ok(Roots { source, target })
    }
}

/// Reject names that are not a single plain path component.
pub fn validate_name(name: &str) -> ModResult<&str> {
    if is_single_component(name) {
        Ok(name)
    } else {
        Err(ModError::invalid_path(
            name,
            "mod name must be a single folder name",
        ))
    }
}
