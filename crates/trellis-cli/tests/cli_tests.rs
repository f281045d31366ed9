//! CLI integration tests for the trellis binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ANDROID_LAYOUT: &str = r#"
[project]
name = "android"
build-dir = "../build"

[buildscript]
repositories = ["google", "maven-central"]
dependencies = ["com.google.gms:google-services:4.4.2"]

[allprojects]
repositories = ["google", "maven-central"]

[subprojects]
include = ["app", "lib"]
evaluation-depends-on = ":app"
"#;

/// Command isolated from the user's global config and environment overrides
fn trellis(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trellis").unwrap();
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("TRELLIS_BUILD_DIR")
        .env_remove("TRELLIS_JSON")
        .env_remove("RUST_LOG");
    cmd
}

/// Temp dir holding `android/trellis.toml`; `../build` lands beside it
fn create_project(manifest: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("android");
    fs::create_dir(&project).unwrap();
    fs::write(project.join("trellis.toml"), manifest).unwrap();
    (temp, project)
}

fn stdout_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

// ============================================================================
// Clean
// ============================================================================

#[test]
fn test_clean_removes_build_directory() {
    let (temp, project) = create_project(ANDROID_LAYOUT);
    let build = temp.path().join("build");
    fs::create_dir_all(build.join("app/outputs")).unwrap();
    fs::write(build.join("app/outputs/app.apk"), b"apk").unwrap();

    trellis(temp.path())
        .arg("-C")
        .arg(&project)
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));

    assert!(!build.exists());
    assert!(project.join("trellis.toml").exists());
}

#[test]
fn test_clean_without_build_directory_succeeds() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    trellis(temp.path())
        .arg("clean")
        .arg("-C")
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to delete"));
}

#[test]
fn test_clean_json_report() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    let output = trellis(temp.path())
        .args(["clean", "--json", "-C"])
        .arg(&project)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = stdout_json(&output.stdout);
    assert_eq!(report["task"], "clean");
    assert_eq!(report["targets"][0]["outcome"], "already-absent");
}

#[test]
fn test_run_clean_by_name() {
    let (temp, project) = create_project(ANDROID_LAYOUT);
    fs::create_dir(temp.path().join("build")).unwrap();

    trellis(temp.path())
        .args(["run", "clean", "-C"])
        .arg(&project)
        .assert()
        .success();

    assert!(!temp.path().join("build").exists());
}

#[test]
fn test_run_unknown_task_fails() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    trellis(temp.path())
        .args(["run", "assembleRelease", "-C"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task not found"));
}

#[cfg(unix)]
#[test]
fn test_clean_fails_when_output_cannot_be_deleted() {
    use std::os::unix::fs::PermissionsExt;

    let (temp, project) = create_project("[project]\nbuild-dir = \"locked/build\"\n");
    let locked = project.join("locked");
    fs::create_dir_all(locked.join("build/app")).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Permission bits do not stop a privileged user
    if fs::write(locked.join("canary"), b"").is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let assert = trellis(temp.path())
        .arg("clean")
        .arg("-C")
        .arg(&project)
        .assert();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert
        .failure()
        .stderr(predicate::str::contains("Failed to delete"));
    assert!(locked.join("build/app").exists());
}

// ============================================================================
// Projects
// ============================================================================

#[test]
fn test_projects_json_bindings() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    let output = trellis(temp.path())
        .args(["projects", "--json", "-C"])
        .arg(&project)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["root_project"], "android");
    assert_eq!(json["bindings"]["app"], "../build/app");
    assert_eq!(json["bindings"]["lib"], "../build/lib");

    let order: Vec<&str> = json["evaluation_order"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    let app = order.iter().position(|p| *p == "app").unwrap();
    let lib = order.iter().position(|p| *p == "lib").unwrap();
    assert!(app < lib);
}

#[test]
fn test_build_dir_flag_overrides_manifest() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    let output = trellis(temp.path())
        .args(["projects", "--json", "--build-dir", "out", "-C"])
        .arg(&project)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["bindings"]["app"], "out/app");
}

#[test]
fn test_build_dir_env_overrides_manifest() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    let output = trellis(temp.path())
        .env("TRELLIS_BUILD_DIR", "env-out")
        .args(["projects", "--json", "-C"])
        .arg(&project)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["root_output_directory"], "env-out");
}

#[test]
fn test_projects_human_output() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    trellis(temp.path())
        .args(["projects", "-C"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Root project: android"))
        .stdout(predicate::str::contains("../build/app"));
}

#[test]
fn test_cyclic_declaration_fails() {
    let (temp, project) = create_project(
        r#"
[subprojects]
include = ["app", "lib"]

[[evaluation]]
dependent = "app"
depends-on = "lib"

[[evaluation]]
dependent = "lib"
depends-on = "app"
"#,
    );

    trellis(temp.path())
        .args(["projects", "-C"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Circular evaluation dependency"));
}

#[test]
fn test_invalid_manifest_fails() {
    let (temp, project) = create_project("[project]\nversion = \"1.0\"\n");

    trellis(temp.path())
        .args(["projects", "-C"])
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

// ============================================================================
// Repositories and tasks
// ============================================================================

#[test]
fn test_repositories_lists_lookup_order() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    let output = trellis(temp.path())
        .args(["repos", "--json", "-C"])
        .arg(&project)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["buildscript"][0]["name"], "google");
    assert_eq!(json["buildscript"][1]["name"], "maven-central");
    assert_eq!(
        json["classpath"][0]["coordinate"],
        "com.google.gms:google-services:4.4.2"
    );
    assert_eq!(json["classpath"][0]["candidates"].as_array().unwrap().len(), 2);
}

#[test]
fn test_tasks_lists_clean() {
    let (temp, project) = create_project(ANDROID_LAYOUT);

    trellis(temp.path())
        .args(["tasks", "-C"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"));
}

#[test]
fn test_completions_bash() {
    let temp = TempDir::new().unwrap();

    trellis(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trellis"));
}
