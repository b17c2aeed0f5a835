use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    mods::{ModResult, ModService},
    runtime::Runtime,
};

use super::paths::{default_config_path, default_source_root, default_target_root};

/// Persisted root directories.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub source_root: Option<PathBuf>,
    pub target_root: Option<PathBuf>,
}

impl Settings {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        Ok(settings)
    }

    #[tracing::instrument(skip(runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            runtime.create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        runtime.write(path, content.as_bytes())?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Fill unset roots from `other`.
    fn or(self, other: Settings) -> Settings {
        Settings {
            source_root: self.source_root.or(other.source_root),
            target_root: self.target_root.or(other.target_root),
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub source_root: Option<PathBuf>,
    pub target_root: Option<PathBuf>,
}

/// Effective settings: overrides first, then the settings file, then defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub settings: Settings,
}

impl Config {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let path = match overrides.config_path {
            Some(path) => path,
            None => default_config_path(runtime)?,
        };

        let stored = if runtime.exists(&path) {
            Settings::load(runtime, &path)?
        } else {
            debug!("No settings file at {}", path.display());
            Settings::default()
        };

        let defaults = Settings {
            source_root: Some(default_source_root(runtime)?),
            target_root: default_target_root(),
        };

        let settings = Settings {
            source_root: overrides.source_root,
            target_root: overrides.target_root,
        }
        .or(stored)
        .or(defaults);

        debug!("Using settings {:?} from {}", settings, path.display());
        Ok(Self { path, settings })
    }

    /// Validate the roots and build a service over them.
    pub fn service<'a, R: Runtime>(&self, runtime: &'a R) -> ModResult<ModService<'a, R>> {
        ModService::open(
            runtime,
            self.settings.source_root.as_deref(),
            self.settings.target_root.as_deref(),
        )
    }

    pub fn save<R: Runtime>(&self, runtime: &R) -> Result<()> {
        self.settings.save(runtime, &self.path)
    }
}
