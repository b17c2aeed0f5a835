use anyhow::Result;
use log::debug;

use crate::{mods::ModStatus, runtime::Runtime};

use super::config::{Config, ConfigOverrides};
use super::report;

/// Short label for the status table.
pub(crate) fn state_label(status: &ModStatus) -> &'static str {
    if status.broken {
        "broken"
    } else if status.installed {
        "installed"
    } else if status.managed && status.external {
        "blocked"
    } else if status.external {
        "external"
    } else {
        "available"
    }
}

pub(crate) fn format_status_line(status: &ModStatus, width: usize) -> String {
    let mut line = format!("{:<width$}  {}", status.name, state_label(status), width = width);
    if let Some(info) = &status.info {
        line.push_str(&format!("  ({} v{})", info.name, info.version));
    }
    if status.external {
        if let Some(target) = &status.resolved_target {
            line.push_str(&format!(" -> {}", target.display()));
        }
    }
    line
}

/// Print the reconciled status of every mod
#[tracing::instrument(skip(runtime, overrides))]
pub fn status<R: Runtime>(runtime: R, overrides: ConfigOverrides, json: bool) -> Result<()> {
    let config = Config::load(&runtime, overrides)?;
    let service = config.service(&runtime).map_err(report)?;
    let statuses = service.statuses().map_err(report)?;
    debug!("Found {} mod(s)", statuses.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No mods found.");
        return Ok(());
    }

    let width = statuses.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for status in &statuses {
        println!("{}", format_status_line(status, width));
    }
    Ok(())
}
