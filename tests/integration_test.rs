use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

struct Layout {
    dir: TempDir,
}

impl Layout {
    fn new(mods: &[&str]) -> Self {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("extensions")).unwrap();
        fs::create_dir_all(dir.path().join("mods")).unwrap();
        for name in mods {
            let mod_dir = dir.path().join("mods").join(name);
            fs::create_dir_all(&mod_dir).unwrap();
            fs::write(
                mod_dir.join("content.xml"),
                format!(r#"<content id="{0}" name="{0} title" version="200"/>"#, name),
            )
            .unwrap();
        }
        Self { dir }
    }

    fn mods(&self) -> PathBuf {
        self.dir.path().join("mods")
    }

    fn extensions(&self) -> PathBuf {
        self.dir.path().join("extensions")
    }

    fn config_file(&self) -> PathBuf {
        self.dir.path().join("settings").join("config.json")
    }

    fn modlink(&self) -> Command {
        let mut cmd = Command::new(cargo::cargo_bin!("modlink"));
        cmd.env_remove("MODLINK_CONFIG")
            .env_remove("MODLINK_SOURCE")
            .env_remove("MODLINK_TARGET")
            .arg("--config")
            .arg(self.config_file())
            .arg("--source")
            .arg(self.mods())
            .arg("--target")
            .arg(self.extensions());
        cmd
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg_attr(
    modlink_skip_cross_windows_tests,
    ignore = "cross windows tests disabled; set MODLINK_RUN_CROSS_WINDOWS_TESTS=1 to enable"
)]
#[test]
fn test_install_then_uninstall_round_trip() {
    let layout = Layout::new(&["ModA", "ModB"]);

    layout
        .modlink()
        .args(["install", "ModA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed ModA"));

    let link = layout.extensions().join("ModA");
    assert!(is_symlink(&link));

    layout
        .modlink()
        .args(["install", "ModA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ModA: nothing to do"));

    layout
        .modlink()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"ModA\s+installed").unwrap())
        .stdout(predicate::str::is_match(r"ModB\s+available").unwrap())
        .stdout(predicate::str::contains("(ModA title v200)"));

    layout
        .modlink()
        .args(["uninstall", "ModA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Uninstalled ModA"));

    layout
        .modlink()
        .args(["uninstall", "ModA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ModA: nothing to do"));

    assert!(fs::symlink_metadata(&link).is_err());
    assert!(layout.mods().join("ModA").join("content.xml").is_file());
    assert_eq!(fs::read_dir(layout.extensions()).unwrap().count(), 0);
}

#[test]
fn test_install_refuses_occupied_slot() {
    let layout = Layout::new(&["ModB"]);
    let blocker = layout.extensions().join("ModB");
    fs::create_dir_all(&blocker).unwrap();
    fs::write(blocker.join("keep.txt"), "unmanaged").unwrap();

    layout
        .modlink()
        .args(["install", "ModB"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert!(!is_symlink(&blocker));
    assert!(blocker.join("keep.txt").is_file());
}

#[test]
fn test_uninstall_never_removes_real_directory() {
    let layout = Layout::new(&["ModA"]);
    let real = layout.extensions().join("ModA");
    fs::create_dir_all(&real).unwrap();
    fs::write(real.join("keep.txt"), "unmanaged").unwrap();

    layout
        .modlink()
        .args(["uninstall", "ModA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a symlink"));

    assert!(real.join("keep.txt").is_file());
}

#[test]
fn test_status_json_reports_external_mod() {
    let layout = Layout::new(&["ModA"]);
    fs::create_dir_all(layout.extensions().join("OtherMod")).unwrap();

    let output = layout
        .modlink()
        .args(["status", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let statuses: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let statuses = statuses.as_array().unwrap();
    assert_eq!(statuses.len(), 2);

    assert_eq!(statuses[0]["name"], "ModA");
    assert_eq!(statuses[0]["managed"], true);
    assert_eq!(statuses[0]["installed"], false);
    assert_eq!(statuses[0]["info"]["version"], "200");

    assert_eq!(statuses[1]["name"], "OtherMod");
    assert_eq!(statuses[1]["managed"], false);
    assert_eq!(statuses[1]["external"], true);
}

#[test]
fn test_install_unknown_mod_fails() {
    let layout = Layout::new(&[]);

    layout
        .modlink()
        .args(["install", "Missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_install_rejects_path_like_name() {
    let layout = Layout::new(&["ModA"]);

    layout
        .modlink()
        .args(["install", "../ModA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("single folder name"));
}

#[test]
fn test_nested_roots_are_rejected() {
    let layout = Layout::new(&[]);
    let nested = layout.mods().join("extensions");
    fs::create_dir_all(&nested).unwrap();

    Command::new(cargo::cargo_bin!("modlink"))
        .env_remove("MODLINK_CONFIG")
        .arg("--config")
        .arg(layout.config_file())
        .arg("--source")
        .arg(layout.mods())
        .arg("--target")
        .arg(&nested)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be nested"));
}

#[test]
fn test_config_save_persists_roots() {
    let layout = Layout::new(&[]);

    layout
        .modlink()
        .args(["config", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sourceRoot"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(layout.config_file()).unwrap()).unwrap();
    let source = PathBuf::from(saved["sourceRoot"].as_str().unwrap());
    assert!(source.ends_with("mods"));

    // The saved roots are used when no overrides are given.
    Command::new(cargo::cargo_bin!("modlink"))
        .env_remove("MODLINK_SOURCE")
        .env_remove("MODLINK_TARGET")
        .env("MODLINK_CONFIG", layout.config_file())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No mods found."));
}

#[cfg_attr(
    modlink_skip_cross_windows_tests,
    ignore = "cross windows tests disabled; set MODLINK_RUN_CROSS_WINDOWS_TESTS=1 to enable"
)]
#[test]
fn test_cleanup_and_delete() {
    let layout = Layout::new(&["ModA"]);
    let gone = layout.dir.path().join("gone");
    fs::create_dir_all(&gone).unwrap();
    let dangling = layout.extensions().join("Gone");
    #[cfg(unix)]
    std::os::unix::fs::symlink(&gone, &dangling).unwrap();
    #[cfg(windows)]
    std::os::windows::fs::symlink_dir(&gone, &dangling).unwrap();
    fs::remove_dir(&gone).unwrap();

    layout
        .modlink()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Gone\s+broken").unwrap());

    layout
        .modlink()
        .args(["cleanup", "Gone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed broken link Gone"));
    assert!(fs::symlink_metadata(&dangling).is_err());

    layout.modlink().args(["install", "ModA"]).assert().success();
    layout
        .modlink()
        .args(["delete", "ModA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted ModA"));

    assert!(!layout.mods().join("ModA").exists());
    assert!(fs::symlink_metadata(layout.extensions().join("ModA")).is_err());
}

#[test]
fn test_privilege_command() {
    Command::new(cargo::cargo_bin!("modlink"))
        .arg("privilege")
        .assert()
        .success()
        .stdout(predicate::str::contains("Can create symlinks:"))
        .stdout(predicate::str::contains("Elevated:"));
}

#[test]
fn test_serve_warns_about_unusable_roots() {
    let layout = Layout::new(&[]);
    let nested = layout.mods().join("extensions");
    fs::create_dir_all(&nested).unwrap();

    // The server keeps running so the roots can be fixed from the page; stop it after a moment.
    Command::new(cargo::cargo_bin!("modlink"))
        .env_remove("MODLINK_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(layout.config_file())
        .arg("--source")
        .arg(layout.mods())
        .arg("--target")
        .arg(&nested)
        .args(["serve", "--port", "0"])
        .timeout(Duration::from_secs(3))
        .assert()
        .stderr(predicate::str::contains("not usable yet"))
        .stderr(predicate::str::contains("must not be nested"));
}
