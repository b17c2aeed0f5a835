use serde::Serialize;
use std::path::PathBuf;

use super::metadata::ModInfo;

/// The two validated directories every operation works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    /// Managed mods directory
    pub source: PathBuf,
    /// Game extensions directory
    pub target: PathBuf,
}

impl Roots {
    pub fn source_path(&self, name: &str) -> PathBuf {
        self.source.join(name)
    }

    pub fn target_path(&self, name: &str) -> PathBuf {
        self.target.join(name)
    }
}

/// An immediate child of a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    pub name: String,
    pub path: PathBuf,
}

/// A mod folder in the source root.
#[derive(Debug, Clone, PartialEq)]
pub struct ModEntry {
    pub name: String,
    pub source_path: PathBuf,
    pub info: Option<ModInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    Symlink,
    RealDirectory,
}

/// What the link inspector found at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: EntryKind,
    /// One level of link resolution; `None` for directories and broken links.
    pub resolved_target: Option<PathBuf>,
    pub broken: bool,
}

impl Classification {
    pub fn directory() -> Self {
        Self {
            kind: EntryKind::RealDirectory,
            resolved_target: None,
            broken: false,
        }
    }

    pub fn symlink(target: PathBuf) -> Self {
        Self {
            kind: EntryKind::Symlink,
            resolved_target: Some(target),
            broken: false,
        }
    }

    pub fn broken_symlink() -> Self {
        Self {
            kind: EntryKind::Symlink,
            resolved_target: None,
            broken: true,
        }
    }
}

/// An entry in the target (extensions) root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledLink {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub resolved_target: Option<PathBuf>,
    pub broken: bool,
    /// Descriptor found inside the entry, read through the link when there is one.
    pub info: Option<ModInfo>,
}

impl InstalledLink {
    pub fn new(entry: ScannedEntry, classification: Classification) -> Self {
        Self {
            name: entry.name,
            path: entry.path,
            kind: classification.kind,
            resolved_target: classification.resolved_target,
            broken: classification.broken,
            info: None,
        }
    }

    pub fn with_info(mut self, info: Option<ModInfo>) -> Self {
        self.info = info;
        self
    }
}

/// Reconciled view of one mod name across both roots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModStatus {
    pub name: String,
    pub managed: bool,
    pub installed: bool,
    pub external: bool,
    pub broken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_target: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ModInfo>,
}

/// State of one target slot, probed right before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    NotInstalled,
    /// Symlink to the expected source path.
    Installed,
    /// Real directory, or a symlink that resolves somewhere else.
    ExternallyOccupied(Classification),
    Broken,
}

/// Successful outcome of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Installed,
    Uninstalled,
    Removed,
    Deleted,
    /// Nothing to do; the filesystem already had the requested shape.
    Noop,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Installed => "installed",
            Outcome::Uninstalled => "uninstalled",
            Outcome::Removed => "removed",
            Outcome::Deleted => "deleted",
            Outcome::Noop => "noop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeState {
    pub can_create_symlinks: bool,
    pub elevated: bool,
}
