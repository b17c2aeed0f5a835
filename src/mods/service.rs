use log::{debug, warn};
use std::path::Path;

use super::error::ModResult;
use super::inspector::LinkInspector;
use super::metadata::load_mod_info;
use super::model::{InstalledLink, ModEntry, ModStatus, Outcome, Roots};
use super::operator::LinkOperator;
use super::registry::{CaseSensitivity, compute_statuses};
use super::resolver::PathResolver;
use super::scanner::DirectoryScanner;
use crate::runtime::Runtime;

/// Runs scans, reconciliation and link transitions for one pair of validated roots.
///
/// Holds no state besides the roots; every call looks at the filesystem again.
pub struct ModService<'a, R: Runtime> {
    runtime: &'a R,
    roots: Roots,
    case: CaseSensitivity,
}

impl<'a, R: Runtime> ModService<'a, R> {
    /// Validate the configured roots and build a service for them.
    pub fn open(runtime: &'a R, source: Option<&Path>, target: Option<&Path>) -> ModResult<Self> {
        let roots = PathResolver::new(runtime).validate_roots(source, target)?;
        Ok(Self::new(runtime, roots))
    }

    pub fn new(runtime: &'a R, roots: Roots) -> Self {
        Self {
            runtime,
            roots,
            case: CaseSensitivity::host(),
        }
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    /// Mod folders in the source root. Links that do not lead to a directory are
    /// skipped, matching what `install` and `delete` accept as a managed mod.
    #[tracing::instrument(skip(self))]
    pub fn scan_sources(&self) -> ModResult<Vec<ModEntry>> {
        let entries = DirectoryScanner::new(self.runtime).list_entries(&self.roots.source)?;
        Ok(entries
            .filter(|entry| {
                let usable = self.runtime.is_dir(&entry.path);
                if !usable {
                    warn!("Skipping {:?}: link does not lead to a directory", entry.path);
                }
                usable
            })
            .map(|entry| ModEntry {
                info: load_mod_info(self.runtime, &entry.path),
                name: entry.name,
                source_path: entry.path,
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub fn scan_targets(&self) -> ModResult<Vec<InstalledLink>> {
        let inspector = LinkInspector::new(self.runtime);
        let entries = DirectoryScanner::new(self.runtime).list_entries(&self.roots.target)?;
        Ok(entries
            .map(|entry| {
                let classification = inspector.classify(&entry.path);
                let info = if classification.broken {
                    None
                } else {
                    load_mod_info(self.runtime, &entry.path)
                };
                InstalledLink::new(entry, classification).with_info(info)
            })
            .collect())
    }

    /// Reconciled status of every mod name in either root, sorted by name.
    #[tracing::instrument(skip(self))]
    pub fn statuses(&self) -> ModResult<Vec<ModStatus>> {
        let sources = self.scan_sources()?;
        let targets = self.scan_targets()?;
        debug!(
            "Reconciling {} source entries with {} extension entries",
            sources.len(),
            targets.len()
        );

        let statuses = compute_statuses(&sources, &targets, self.case)?;
        Ok(statuses.into_values().collect())
    }

    fn operator(&self) -> LinkOperator<'_, R> {
        LinkOperator::with_case(self.runtime, &self.roots, self.case)
    }

    pub fn install(&self, name: &str) -> ModResult<Outcome> {
        self.operator().install(name)
    }

    pub fn uninstall(&self, name: &str) -> ModResult<Outcome> {
        self.operator().uninstall(name)
    }

    pub fn cleanup(&self, name: &str) -> ModResult<Outcome> {
        self.operator().cleanup(name)
    }

    pub fn delete(&self, name: &str) -> ModResult<Outcome> {
        self.operator().delete(name)
    }
}
