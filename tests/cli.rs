//! End-to-end tests for the gitpolicy binary.
//!
//! Exit code contract:
//! - Exit 0: push accepted
//! - Exit 1: push rejected by policy
//! - Exit 2: configuration or setup error

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SOME_SHA: &str = "1234567891234567891234567891234567891234";
const OTHER_SHA: &str = "9876543219876543219876543219876543219876";
const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

fn gitpolicy(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gitpolicy").expect("binary builds");
    cmd.current_dir(dir.path());
    cmd
}

fn write_config(dir: &TempDir, contents: &str) {
    fs::write(dir.path().join(".gitpolicy.yml"), contents).expect("write config");
}

/// Run `gitpolicy check` for one ref update in the given directory.
fn check(dir: &TempDir, local_ref: &str, local_sha: &str, remote_ref: &str, remote_sha: &str) -> Command {
    let mut cmd = gitpolicy(dir);
    cmd.args([
        "check",
        "--local-ref",
        local_ref,
        "--local-sha",
        local_sha,
        "--remote-ref",
        remote_ref,
        "--remote-sha",
        remote_sha,
    ]);
    cmd
}

// =============================================================================
// check: accepted pushes (exit 0)
// =============================================================================

#[test]
fn accepts_tag_create_under_permissive_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "tag:\n  forbidden:\n    delete: 'no tag deletes'\n");

    check(&dir, "refs/tags/1.2.3", SOME_SHA, "refs/tags/1.2.3", ZERO_SHA)
        .assert()
        .success()
        .stdout(predicate::str::contains("Done :)"))
        .stderr(predicate::str::contains("Stopping").not());
}

#[test]
fn accepts_branch_update_with_empty_config() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "");

    check(&dir, "refs/heads/main", SOME_SHA, "refs/heads/main", OTHER_SHA)
        .assert()
        .success()
        .stdout(predicate::str::contains("Done :)"));
}

#[test]
fn prints_after_push_message_on_accepted_push() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "tag:\n  after_push_messages:\n    create: 'welcome to the release club'\n",
    );

    check(&dir, "refs/tags/v1.0.0", SOME_SHA, "refs/tags/v1.0.0", ZERO_SHA)
        .assert()
        .success()
        .stdout(predicate::str::contains("welcome to the release club"))
        .stdout(predicate::str::contains("Done :)"));
}

// =============================================================================
// check: rejected pushes (exit 1)
// =============================================================================

#[test]
fn rejects_forbidden_tag_create() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "tag:\n  forbidden:\n    create: 'no new tags please'\n");

    check(&dir, "refs/tags/1.2.3", SOME_SHA, "refs/tags/1.2.3", ZERO_SHA)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no new tags please"))
        .stderr(predicate::str::contains("Stopping :/"))
        .stdout(predicate::str::contains("Done :)").not());
}

#[test]
fn rejects_branch_delete_when_forbidden() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "branch:\n  forbidden:\n    delete: 'branches live forever'\n");

    check(&dir, "(deleted)", ZERO_SHA, "refs/heads/old-feature", OTHER_SHA)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("branches live forever"));
}

#[test]
fn rejects_tag_missing_required_pattern() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "tag:\n  name:\n    required_patterns:\n      '/^v/': 'tags must start with v'\n",
    );

    check(&dir, "refs/tags/1.2.3", SOME_SHA, "refs/tags/1.2.3", ZERO_SHA)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("tags must start with v"));
}

#[test]
fn reports_every_violation_in_one_run() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "branch:
  forbidden:
    update: 'repo is frozen'
  name:
    forbidden:
      master: 'not to master'
    required_patterns:
      '/^release-/': 'release branches only'
",
    );

    check(&dir, "refs/heads/master", SOME_SHA, "refs/heads/master", OTHER_SHA)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("repo is frozen"))
        .stderr(predicate::str::contains("not to master"))
        .stderr(predicate::str::contains("release branches only"));
}

// =============================================================================
// check: configuration problems
// =============================================================================

#[test]
fn missing_config_exits_2_and_hints_at_init() {
    let dir = TempDir::new().unwrap();

    check(&dir, "refs/heads/main", SOME_SHA, "refs/heads/main", OTHER_SHA)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("gitpolicy init"));
}

#[test]
fn unparseable_config_exits_2() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "tag: [not: a: mapping\n");

    check(&dir, "refs/heads/main", SOME_SHA, "refs/heads/main", OTHER_SHA)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn invalid_pattern_warns_but_other_rules_still_apply() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "tag:\n  name:\n    forbidden_patterns:\n      '/[broken/': 'never evaluated'\n      '/^bad-/': 'bad tags are bad'\n",
    );

    // Broken pattern is skipped with a warning; the healthy one still rejects.
    check(&dir, "refs/tags/bad-idea", SOME_SHA, "refs/tags/bad-idea", ZERO_SHA)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("skipping invalid pattern"))
        .stderr(predicate::str::contains("bad tags are bad"));

    // And a healthy push passes despite the broken rule.
    check(&dir, "refs/tags/v1.0.0", SOME_SHA, "refs/tags/v1.0.0", ZERO_SHA)
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping invalid pattern"));
}

#[test]
fn config_path_option_is_honored() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("team-policy.yml"),
        "tag:\n  forbidden:\n    create: 'no new tags please'\n",
    )
    .unwrap();

    let mut cmd = check(&dir, "refs/tags/1.2.3", SOME_SHA, "refs/tags/1.2.3", ZERO_SHA);
    cmd.args(["--config", "team-policy.yml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no new tags please"));
}

// =============================================================================
// init
// =============================================================================

#[test]
fn init_installs_hook_and_config() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();

    gitpolicy(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("pre-push hook"))
        .stdout(predicate::str::contains(".gitpolicy.yml"));

    let hook = dir.path().join(".git/hooks/pre-push");
    assert!(hook.is_file(), "hook script should be installed");
    assert!(
        fs::read_to_string(&hook).unwrap().contains("gitpolicy check"),
        "hook should invoke gitpolicy"
    );
    assert!(dir.path().join(".gitpolicy.yml").is_file());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&hook).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "hook should be executable");
    }
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();

    gitpolicy(&dir).arg("init").assert().success();
    gitpolicy(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already in place"))
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_keeps_foreign_hook_without_force() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".git/hooks")).unwrap();
    let hook = dir.path().join(".git/hooks/pre-push");
    fs::write(&hook, "#!/bin/sh\necho custom hook\n").unwrap();

    gitpolicy(&dir)
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("already has a pre-push hook"));
    assert!(fs::read_to_string(&hook).unwrap().contains("custom hook"));

    gitpolicy(&dir)
        .args(["init", "--force"])
        .assert()
        .success();
    assert!(fs::read_to_string(&hook).unwrap().contains("gitpolicy check"));
}

#[test]
fn init_outside_a_repo_fails() {
    let dir = TempDir::new().unwrap();

    gitpolicy(&dir)
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("git repo"));
}

// =============================================================================
// installed config sanity: the check path used by the generated hook
// =============================================================================

#[test]
fn starter_config_rejects_wip_branch_and_accepts_release_tag() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    gitpolicy(&dir).arg("init").assert().success();

    check(&dir, "refs/heads/wip-thing", SOME_SHA, "refs/heads/wip-thing", ZERO_SHA)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Work-in-progress"));

    check(&dir, "refs/tags/v1.2.3", SOME_SHA, "refs/tags/v1.2.3", ZERO_SHA)
        .assert()
        .success()
        .stdout(predicate::str::contains("changelog"));
}
