//! Reconciliation of the mods directory against the extensions directory.
//!
//! Everything here is a pure function of its inputs so it can be tested
//! without touching a filesystem.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::error::{ModError, ModResult};
use super::model::{EntryKind, InstalledLink, ModEntry, ModStatus};
use crate::runtime::normalize_path;

/// How names and paths are compared on the host filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// NTFS and APFS are case-insensitive by default.
    pub fn host() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            CaseSensitivity::Insensitive
        } else {
            CaseSensitivity::Sensitive
        }
    }

    pub fn key(&self, name: &str) -> String {
        match self {
            CaseSensitivity::Sensitive => name.to_string(),
            CaseSensitivity::Insensitive => name.to_lowercase(),
        }
    }

    pub fn paths_match(&self, a: &Path, b: &Path) -> bool {
        let a = normalize_path(a);
        let b = normalize_path(b);
        match self {
            CaseSensitivity::Sensitive => a == b,
            CaseSensitivity::Insensitive => {
                a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
            }
        }
    }
}

/// Index entries by name key, failing on the first collision.
fn index_by_name<'e, T>(
    entries: &'e [T],
    case: CaseSensitivity,
    name_of: impl Fn(&T) -> &str,
    path_of: impl Fn(&T) -> &Path,
) -> ModResult<HashMap<String, &'e T>> {
    let mut index: HashMap<String, &T> = HashMap::with_capacity(entries.len());
    for entry in entries {
        let key = case.key(name_of(entry));
        if let Some(existing) = index.insert(key, entry) {
            return Err(ModError::DuplicateName {
                root: path_of(entry)
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
                first: name_of(existing).to_string(),
                second: name_of(entry).to_string(),
            });
        }
    }
    Ok(index)
}

/// Join source and target listings into exactly one status per distinct name.
///
/// Keys of the returned map are display names: the source folder name when the
/// mod is managed, the extensions entry name otherwise.
pub fn compute_statuses(
    sources: &[ModEntry],
    targets: &[InstalledLink],
    case: CaseSensitivity,
) -> ModResult<BTreeMap<String, ModStatus>> {
    let by_source = index_by_name(sources, case, |e| e.name.as_str(), |e| e.source_path.as_path())?;
    let by_target = index_by_name(targets, case, |l| l.name.as_str(), |l| l.path.as_path())?;

    let mut statuses = BTreeMap::new();
    for key in by_source.keys().chain(by_target.keys()) {
        let source = by_source.get(key).copied();
        let target = by_target.get(key).copied();

        let name = match (source, target) {
            (Some(s), _) => &s.name,
            (None, Some(t)) => &t.name,
            (None, None) => continue,
        };
        if statuses.contains_key(name) {
            continue;
        }

        let status = derive_status(source, target, case);
        statuses.insert(name.clone(), status);
    }
    Ok(statuses)
}

fn derive_status(
    source: Option<&ModEntry>,
    target: Option<&InstalledLink>,
    case: CaseSensitivity,
) -> ModStatus {
    let broken = target.is_some_and(|t| t.broken);

    let installed = match (source, target) {
        (Some(s), Some(t)) => {
            t.kind == EntryKind::Symlink
                && !t.broken
                && t.resolved_target
                    .as_deref()
                    .is_some_and(|resolved| case.paths_match(resolved, &s.source_path))
        }
        _ => false,
    };

    let name = source
        .map(|s| s.name.clone())
        .or_else(|| target.map(|t| t.name.clone()))
        .unwrap_or_default();

    ModStatus {
        name,
        managed: source.is_some(),
        installed,
        external: target.is_some() && !installed,
        broken,
        source_path: source.map(|s| s.source_path.clone()),
        target_path: target.map(|t| t.path.clone()),
        resolved_target: target.and_then(|t| t.resolved_target.clone()),
        info: source
            .and_then(|s| s.info.clone())
            .or_else(|| target.and_then(|t| t.info.clone())),
    }
}
