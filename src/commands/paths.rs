use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::runtime::Runtime;

pub const APP_DIR: &str = "modlink";
pub const CONFIG_FILE: &str = "config.json";

/// Get the default settings file location
#[tracing::instrument(skip(runtime))]
pub fn default_config_path<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let config_dir = runtime
        .config_dir()
        .context("Could not find the user config directory; pass --config")?;
    Ok(config_dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Get the default managed mods directory: `mods` under the working directory
#[tracing::instrument(skip(runtime))]
pub fn default_source_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let cwd = runtime
        .current_dir()
        .context("Could not determine the current directory")?;
    Ok(cwd.join("mods"))
}

/// Get the default game extensions directory
#[cfg(target_os = "windows")]
pub fn default_target_root() -> Option<PathBuf> {
    Some(PathBuf::from(
        r"C:\Program Files (x86)\Steam\steamapps\common\X4 Foundations\extensions",
    ))
}

#[cfg(not(target_os = "windows"))]
pub fn default_target_root() -> Option<PathBuf> {
    None
}
