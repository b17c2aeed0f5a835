use anyhow::Result;
use log::{debug, warn};
use std::net::{IpAddr, SocketAddr};

use crate::{
    mods::{ModError, Outcome, privilege_hint, probe_privilege},
    runtime::Runtime,
    server,
};

pub mod config;
mod paths;
mod status;

pub use config::{Config, ConfigOverrides, Settings};
pub use paths::{default_config_path, default_source_root, default_target_root};
pub use status::status;

pub const DEFAULT_PORT: u16 = 9480;

/// Print the error's hint, if any, and hand the error on.
pub(crate) fn report(err: ModError) -> anyhow::Error {
    if let Some(hint) = err.hint() {
        eprintln!("hint: {}", hint);
    }
    err.into()
}

fn describe(name: &str, outcome: Outcome) -> String {
    match outcome {
        Outcome::Installed => format!("Installed {}", name),
        Outcome::Uninstalled => format!("Uninstalled {}", name),
        Outcome::Removed => format!("Removed broken link {}", name),
        Outcome::Deleted => format!("Deleted {}", name),
        Outcome::Noop => format!("{}: nothing to do", name),
    }
}

/// Link a managed mod into the extensions directory
#[tracing::instrument(skip(runtime, overrides))]
pub fn install<R: Runtime>(runtime: R, overrides: ConfigOverrides, name: &str) -> Result<()> {
    let config = Config::load(&runtime, overrides)?;
    let service = config.service(&runtime).map_err(report)?;
    let outcome = service.install(name).map_err(report)?;
    println!("{}", describe(name, outcome));
    Ok(())
}

/// Remove a mod's link from the extensions directory
#[tracing::instrument(skip(runtime, overrides))]
pub fn uninstall<R: Runtime>(runtime: R, overrides: ConfigOverrides, name: &str) -> Result<()> {
    let config = Config::load(&runtime, overrides)?;
    let service = config.service(&runtime).map_err(report)?;
    let outcome = service.uninstall(name).map_err(report)?;
    println!("{}", describe(name, outcome));
    Ok(())
}

/// Remove a broken link from the extensions directory
#[tracing::instrument(skip(runtime, overrides))]
pub fn cleanup<R: Runtime>(runtime: R, overrides: ConfigOverrides, name: &str) -> Result<()> {
    let config = Config::load(&runtime, overrides)?;
    let service = config.service(&runtime).map_err(report)?;
    let outcome = service.cleanup(name).map_err(report)?;
    println!("{}", describe(name, outcome));
    Ok(())
}

/// Delete a managed mod's files, unlinking it first
#[tracing::instrument(skip(runtime, overrides))]
pub fn delete<R: Runtime>(runtime: R, overrides: ConfigOverrides, name: &str) -> Result<()> {
    let config = Config::load(&runtime, overrides)?;
    let service = config.service(&runtime).map_err(report)?;
    let outcome = service.delete(name).map_err(report)?;
    println!("{}", describe(name, outcome));
    Ok(())
}

/// Show the effective settings, optionally persisting them
#[tracing::instrument(skip(runtime, overrides))]
pub fn config<R: Runtime>(runtime: R, overrides: ConfigOverrides, save: bool) -> Result<()> {
    let mut config = Config::load(&runtime, overrides)?;

    if save {
        let roots = config.service(&runtime).map_err(report)?.roots().clone();
        config.settings = Settings {
            source_root: Some(roots.source),
            target_root: Some(roots.target),
        };
        config.save(&runtime)?;
    }

    println!("Settings file: {}", config.path.display());
    println!("{}", serde_json::to_string_pretty(&config.settings)?);
    Ok(())
}

/// Report whether symlinks can be created by this process
#[tracing::instrument(skip(runtime))]
pub fn privilege<R: Runtime>(runtime: R) -> Result<()> {
    let state = probe_privilege(&runtime);
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("Can create symlinks: {}", yes_no(state.can_create_symlinks));
    println!("Elevated: {}", yes_no(state.elevated));

    if !state.can_create_symlinks {
        println!("{}", privilege_hint());
    }
    Ok(())
}

/// Serve the web UI and JSON API until Ctrl-C
#[tracing::instrument(skip(runtime, overrides))]
pub async fn serve<R: Runtime + 'static>(
    runtime: R,
    overrides: ConfigOverrides,
    host: IpAddr,
    port: u16,
) -> Result<()> {
    let config = Config::load(&runtime, overrides)?;
    if let Err(e) = config.service(&runtime) {
        // The roots can still be fixed from the settings page.
        warn!("Current settings are not usable yet: {}", e);
    }

    let addr = SocketAddr::new(host, port);
    debug!("Starting server on {}", addr);
    server::serve(runtime, config, addr).await
}
