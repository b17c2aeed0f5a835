//! Install/uninstall transitions for a single mod name.
//!
//! Every transition probes the extensions slot immediately before acting and
//! never reuses an earlier status read.

use log::{debug, info, warn};
use std::path::Path;

use super::error::{ModError, ModResult, is_already_exists, is_permission_denied};
use super::inspector::LinkInspector;
use super::model::{Classification, EntryKind, LinkState, Outcome, Roots};
use super::registry::CaseSensitivity;
use super::resolver::validate_name;
use crate::runtime::Runtime;

pub struct LinkOperator<'a, R: Runtime> {
    runtime: &'a R,
    roots: &'a Roots,
    case: CaseSensitivity,
}

impl<'a, R: Runtime> LinkOperator<'a, R> {
    pub fn with_case(runtime: &'a R, roots: &'a Roots, case: CaseSensitivity) -> Self {
        Self {
            runtime,
            roots,
            case,
        }
    }

    fn inspector(&self) -> LinkInspector<'a, R> {
        LinkInspector::new(self.runtime)
    }

    /// Current state of `<extensions>/<name>` relative to `<mods>/<name>`.
    #[tracing::instrument(skip(self))]
    pub fn probe(&self, name: &str) -> LinkState {
        let slot = self.roots.target_path(name);
        if !self.inspector().is_occupied(&slot) {
            return LinkState::NotInstalled;
        }

        let classification = self.inspector().classify(&slot);
        if classification.broken {
            return LinkState::Broken;
        }
        match &classification.resolved_target {
            Some(target) if self.points_to_source(target, name) => LinkState::Installed,
            _ => LinkState::ExternallyOccupied(classification),
        }
    }

    fn points_to_source(&self, target: &Path, name: &str) -> bool {
        self.case.paths_match(target, &self.roots.source_path(name))
    }

    fn require_managed(&self, name: &str) -> ModResult<()> {
        if self.runtime.is_dir(&self.roots.source_path(name)) {
            Ok(())
        } else {
            Err(ModError::ModNotFound {
                name: name.to_string(),
                root: self.roots.source.clone(),
            })
        }
    }

    /// Link `<extensions>/<name>` to `<mods>/<name>`.
    #[tracing::instrument(skip(self))]
    pub fn install(&self, name: &str) -> ModResult<Outcome> {
        let name = validate_name(name)?;
        self.require_managed(name)?;

        let source = self.roots.source_path(name);
        let slot = self.roots.target_path(name);

        match self.probe(name) {
            LinkState::Installed => {
                debug!("{} is already linked", name);
                return Ok(Outcome::Noop);
            }
            LinkState::ExternallyOccupied(_) | LinkState::Broken => {
                return Err(ModError::SlotOccupied { path: slot });
            }
            LinkState::NotInstalled => {}
        }

        match self.runtime.symlink(&source, &slot) {
            Ok(()) => {
                info!("Linked {:?} -> {:?}", slot, source);
                Ok(Outcome::Installed)
            }
            Err(e) if is_permission_denied(&e) => {
                warn!("Symlink creation denied for {:?}: {:#}", slot, e);
                Err(ModError::Privilege {
                    link: slot,
                    message: format!("{:#}", e),
                })
            }
            Err(e) if is_already_exists(&e) => Err(ModError::SlotOccupied { path: slot }),
            Err(e) => Err(ModError::Io(e.context(format!("Failed to link {}", name)))),
        }
    }

    /// Remove `<extensions>/<name>` if, and only if, it is our symlink.
    #[tracing::instrument(skip(self))]
    pub fn uninstall(&self, name: &str) -> ModResult<Outcome> {
        let name = validate_name(name)?;
        let slot = self.roots.target_path(name);

        match self.probe(name) {
            LinkState::NotInstalled => {
                debug!("{} is not linked", name);
                Ok(Outcome::Noop)
            }
            LinkState::Installed => self.remove_link(&slot, Outcome::Uninstalled),
            LinkState::ExternallyOccupied(classification) => {
                Err(self.occupied_error(name, classification))
            }
            LinkState::Broken => {
                // A dangling link still counts as ours when it names our source path.
                match self.runtime.resolve_link(&slot) {
                    Ok(target) if self.points_to_source(&target, name) => {
                        self.remove_link(&slot, Outcome::Uninstalled)
                    }
                    Ok(target) => Err(ModError::StaleTarget {
                        path: slot,
                        expected: self.roots.source_path(name),
                        actual: target,
                    }),
                    Err(e) => Err(ModError::Io(e)),
                }
            }
        }
    }

    /// Remove a dangling symlink from the extensions directory. Anything else is left alone.
    #[tracing::instrument(skip(self))]
    pub fn cleanup(&self, name: &str) -> ModResult<Outcome> {
        let name = validate_name(name)?;
        let slot = self.roots.target_path(name);

        match self.probe(name) {
            LinkState::Broken => self.remove_link(&slot, Outcome::Removed),
            state => {
                debug!("Nothing to clean up for {}: {:?}", name, state);
                Ok(Outcome::Noop)
            }
        }
    }

    /// Unlink the mod if it is installed, then delete its folder from the mods directory.
    /// Foreign entries with the same name in the extensions directory are left alone.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, name: &str) -> ModResult<Outcome> {
        let name = validate_name(name)?;
        self.require_managed(name)?;

        if self.probe(name) == LinkState::Installed {
            self.remove_link(&self.roots.target_path(name), Outcome::Uninstalled)?;
        }

        let source = self.roots.source_path(name);
        if self.runtime.is_symlink(&source) {
            // A symlinked mod folder: drop the link, keep whatever it points to.
            self.runtime.remove_symlink(&source)?;
        } else {
            self.runtime.remove_dir_all(&source)?;
        }

        info!("Deleted mod {:?}", source);
        Ok(Outcome::Deleted)
    }

    fn remove_link(&self, slot: &Path, outcome: Outcome) -> ModResult<Outcome> {
        // Last check right before the syscall; a real directory must never be removed.
        if !self.runtime.is_symlink(slot) {
            return Err(ModError::NotASymlink {
                path: slot.to_path_buf(),
            });
        }
        self.runtime.remove_symlink(slot)?;
        info!("Removed link {:?}", slot);
        Ok(outcome)
    }

    fn occupied_error(&self, name: &str, classification: Classification) -> ModError {
        let slot = self.roots.target_path(name);
        match (classification.kind, classification.resolved_target) {
            (EntryKind::Symlink, Some(actual)) => ModError::StaleTarget {
                path: slot,
                expected: self.roots.source_path(name),
                actual,
            },
            _ => ModError::NotASymlink { path: slot },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{test_extensions_root, test_mods_root, test_other_root};
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn roots() -> Roots {
        Roots {
            source: test_mods_root(),
            target: test_extensions_root(),
        }
    }

    fn slot(name: &str) -> PathBuf {
        test_extensions_root().join(name)
    }

    fn src(name: &str) -> PathBuf {
        test_mods_root().join(name)
    }

    /// Slot is empty, source is a directory.
    fn empty_slot(runtime: &mut MockRuntime, name: &str) {
        let source = src(name);
        runtime
            .expect_is_dir()
            .with(eq(source))
            .returning(|_| true);
        runtime
            .expect_is_symlink()
            .with(eq(slot(name)))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(slot(name)))
            .returning(|_| false);
    }

    /// Slot holds a symlink resolving to `target`.
    fn linked_slot(runtime: &mut MockRuntime, name: &str, target: PathBuf, dangling: bool) {
        runtime
            .expect_is_symlink()
            .with(eq(slot(name)))
            .returning(|_| true);
        runtime
            .expect_exists()
            .with(eq(slot(name)))
            .returning(move |_| !dangling);
        runtime
            .expect_resolve_link()
            .with(eq(slot(name)))
            .returning(move |_| Ok(target.clone()));
    }

    /// Slot holds a real directory.
    fn directory_slot(runtime: &mut MockRuntime, name: &str) {
        runtime
            .expect_is_symlink()
            .with(eq(slot(name)))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(slot(name)))
            .returning(|_| true);
    }

    #[test]
    fn test_install_creates_link() {
        let mut runtime = MockRuntime::new();
        empty_slot(&mut runtime, "ModB");
        runtime
            .expect_symlink()
            .with(eq(src("ModB")), eq(slot("ModB")))
            .times(1)
            .returning(|_, _| Ok(()));

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.install("ModB").unwrap(), Outcome::Installed);
    }

    #[test]
    fn test_install_already_installed_is_noop() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| true);
        linked_slot(&mut runtime, "ModA", src("ModA"), false);
        runtime.expect_symlink().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.install("ModA").unwrap(), Outcome::Noop);
    }

    #[test]
    fn test_install_into_real_directory_fails() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| true);
        directory_slot(&mut runtime, "ModB");
        runtime.expect_symlink().never();
        runtime.expect_remove_dir_all().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        let err = operator.install("ModB").unwrap_err();
        assert!(matches!(err, ModError::SlotOccupied { .. }), "{:?}", err);
    }

    #[test]
    fn test_install_over_broken_link_fails() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| true);
        linked_slot(&mut runtime, "ModA", test_other_root().join("Gone"), true);
        runtime.expect_symlink().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert!(matches!(
            operator.install("ModA"),
            Err(ModError::SlotOccupied { .. })
        ));
    }

    #[test]
    fn test_install_unmanaged_mod() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| false);
        runtime.expect_symlink().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert!(matches!(
            operator.install("Nope"),
            Err(ModError::ModNotFound { .. })
        ));
    }

    #[test]
    fn test_install_rejects_path_names() {
        let runtime = MockRuntime::new();
        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);

        assert!(matches!(
            operator.install("../../etc"),
            Err(ModError::InvalidPath { .. })
        ));
        assert!(matches!(
            operator.uninstall("a/b"),
            Err(ModError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_install_permission_denied_maps_to_privilege_error() {
        let mut runtime = MockRuntime::new();
        empty_slot(&mut runtime, "ModB");
        runtime.expect_symlink().returning(|_, _| {
            Err(anyhow::Error::new(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            ))
            .context("Failed to create directory symlink"))
        });

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        let err = operator.install("ModB").unwrap_err();
        assert_eq!(err.kind(), "PrivilegeError");
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_install_race_with_external_creation() {
        let mut runtime = MockRuntime::new();
        empty_slot(&mut runtime, "ModB");
        runtime.expect_symlink().returning(|_, _| {
            Err(anyhow::Error::new(std::io::Error::from(
                std::io::ErrorKind::AlreadyExists,
            )))
        });

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert!(matches!(
            operator.install("ModB"),
            Err(ModError::SlotOccupied { .. })
        ));
    }

    #[test]
    fn test_install_other_io_error_is_generic() {
        let mut runtime = MockRuntime::new();
        empty_slot(&mut runtime, "ModB");
        runtime
            .expect_symlink()
            .returning(|_, _| Err(anyhow::anyhow!("No space left on device")));

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.install("ModB").unwrap_err().kind(), "IoError");
    }

    #[test]
    fn test_uninstall_removes_link() {
        let mut runtime = MockRuntime::new();
        linked_slot(&mut runtime, "ModA", src("ModA"), false);
        runtime
            .expect_remove_symlink()
            .with(eq(slot("ModA")))
            .times(1)
            .returning(|_| Ok(()));
        runtime.expect_remove_dir_all().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.uninstall("ModA").unwrap(), Outcome::Uninstalled);
    }

    #[test]
    fn test_uninstall_missing_is_noop() {
        let mut runtime = MockRuntime::new();
        empty_slot(&mut runtime, "ModA");
        runtime.expect_remove_symlink().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.uninstall("ModA").unwrap(), Outcome::Noop);
    }

    #[test]
    fn test_uninstall_replaced_by_directory() {
        let mut runtime = MockRuntime::new();
        directory_slot(&mut runtime, "ModA");
        runtime.expect_remove_symlink().never();
        runtime.expect_remove_dir_all().never();
        runtime.expect_remove_dir().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        let err = operator.uninstall("ModA").unwrap_err();
        assert!(matches!(err, ModError::NotASymlink { .. }), "{:?}", err);
    }

    #[test]
    fn test_uninstall_link_points_elsewhere() {
        let mut runtime = MockRuntime::new();
        let foreign = test_other_root().join("ModA");
        linked_slot(&mut runtime, "ModA", foreign.clone(), false);
        runtime.expect_remove_symlink().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        match operator.uninstall("ModA").unwrap_err() {
            ModError::StaleTarget { actual, expected, .. } => {
                assert_eq!(actual, foreign);
                assert_eq!(expected, src("ModA"));
            }
            other => panic!("Expected StaleTarget, got {:?}", other),
        }
    }

    #[test]
    fn test_uninstall_dangling_link_to_our_source() {
        let mut runtime = MockRuntime::new();
        linked_slot(&mut runtime, "ModA", src("ModA"), true);
        runtime
            .expect_remove_symlink()
            .times(1)
            .returning(|_| Ok(()));

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.uninstall("ModA").unwrap(), Outcome::Uninstalled);
    }

    #[test]
    fn test_cleanup_broken_link() {
        let mut runtime = MockRuntime::new();
        linked_slot(&mut runtime, "Gone", test_other_root().join("Gone"), true);
        runtime
            .expect_remove_symlink()
            .with(eq(slot("Gone")))
            .times(1)
            .returning(|_| Ok(()));

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.cleanup("Gone").unwrap(), Outcome::Removed);
    }

    #[test]
    fn test_cleanup_leaves_working_link_and_directories() {
        let mut runtime = MockRuntime::new();
        linked_slot(&mut runtime, "ModA", src("ModA"), false);
        directory_slot(&mut runtime, "OtherMod");
        runtime.expect_remove_symlink().never();
        runtime.expect_remove_dir_all().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.cleanup("ModA").unwrap(), Outcome::Noop);
        assert_eq!(operator.cleanup("OtherMod").unwrap(), Outcome::Noop);
    }

    #[test]
    fn test_delete_installed_mod() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_is_dir()
            .with(eq(src("ModA")))
            .returning(|_| true);
        runtime
            .expect_is_symlink()
            .with(eq(src("ModA")))
            .returning(|_| false);
        linked_slot(&mut runtime, "ModA", src("ModA"), false);
        runtime
            .expect_remove_symlink()
            .with(eq(slot("ModA")))
            .times(1)
            .returning(|_| Ok(()));
        runtime
            .expect_remove_dir_all()
            .with(eq(src("ModA")))
            .times(1)
            .returning(|_| Ok(()));

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.delete("ModA").unwrap(), Outcome::Deleted);
    }

    #[test]
    fn test_delete_keeps_foreign_extension_entry() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_dir().returning(|_| true);
        runtime
            .expect_is_symlink()
            .with(eq(src("ModA")))
            .returning(|_| false);
        directory_slot(&mut runtime, "ModA");
        runtime
            .expect_remove_dir_all()
            .with(eq(src("ModA")))
            .times(1)
            .returning(|_| Ok(()));
        runtime.expect_remove_symlink().never();

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert_eq!(operator.delete("ModA").unwrap(), Outcome::Deleted);
    }

    #[test]
    fn test_probe_case_insensitive_match() {
        let mut runtime = MockRuntime::new();
        linked_slot(&mut runtime, "ModA", src("MODA"), false);

        let roots = roots();
        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Insensitive);
        assert_eq!(operator.probe("ModA"), LinkState::Installed);

        let operator = LinkOperator::with_case(&runtime, &roots, CaseSensitivity::Sensitive);
        assert!(matches!(
            operator.probe("ModA"),
            LinkState::ExternallyOccupied(_)
        ));
    }
}
