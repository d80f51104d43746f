//! Integration tests for the `regress` binary
//!
//! Covers the generate/verify workflow, exit statuses and the auxiliary
//! commands.

use super::common::sim_fixtures::SimFixture;
use predicates::prelude::*;

/// Generate a baseline, then verify the same output passes
#[test]
fn test_generate_then_verify_passes() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");

    fx.regress()
        .args(["generate", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GENERATED"))
        .stdout(predicate::str::contains("alpha"));
    assert!(fx.archive_path("alpha").is_file());
    assert!(!fx.regression_dir().join("knowns").exists());

    fx.regress()
        .args(["verify", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS"))
        .stdout(predicate::str::contains("verify: 1/1 succeeded"));
}

/// Changing the output after generating makes verify fail with status 1
#[test]
fn test_verify_detects_changed_output() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");
    fx.regress().args(["generate", "alpha"]).assert().success();

    fx.set_output("out.log", "B");
    fx.regress()
        .args(["verify", "alpha"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("content differs: out.log"));
}

/// Missing and added files are both reported
#[test]
fn test_verify_detects_missing_and_added_files() {
    let fx = SimFixture::new();
    fx.set_output("a.tr", "1");
    fx.regress().args(["generate", "alpha"]).assert().success();

    fx.remove_output("a.tr");
    fx.set_output("b.tr", "2");
    fx.regress()
        .args(["verify", "alpha"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("only in baseline: a.tr"))
        .stdout(predicate::str::contains("only in trace: b.tr"));
}

/// A failing simulator exits with status 2 and writes no baseline
#[test]
fn test_simulator_failure_is_distinct_status() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");
    fx.set_exit_code(4);

    fx.regress()
        .args(["generate", "alpha"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("SIMULATOR FAILED"))
        .stdout(predicate::str::contains("exit status: 4"))
        .stdout(predicate::str::contains("simulator exiting with 4"));
    assert!(!fx.archive_path("alpha").exists());
}

/// Verifying a test with no archive is a runner error (status 3)
#[test]
fn test_verify_without_baseline_is_error() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");

    fx.regress()
        .args(["verify", "alpha"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("ERROR"))
        .stdout(predicate::str::contains("No baseline archive"));
}

/// Without test names every configured test runs
#[test]
fn test_generate_runs_whole_suite() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");

    fx.regress()
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate: 2/2 succeeded"));
    assert!(fx.archive_path("alpha").is_file());
    assert!(fx.archive_path("beta").is_file());
}

/// Ad-hoc test names that are not in the config still run
#[test]
fn test_adhoc_test_name() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");

    fx.regress().args(["generate", "gamma"]).assert().success();
    assert!(fx.archive_path("gamma").is_file());
}

/// `list` shows which configured tests have a baseline
#[test]
fn test_list_reports_baseline_status() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");
    fx.regress().args(["generate", "alpha"]).assert().success();

    let output = fx.regress().arg("list").assert().success().get_output().clone();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let alpha = stdout.lines().find(|l| l.starts_with("alpha")).unwrap();
    let beta = stdout.lines().find(|l| l.starts_with("beta")).unwrap();
    assert!(alpha.contains(" baseline"));
    assert!(!alpha.contains("no baseline"));
    assert!(beta.contains("no baseline"));
}

/// `show` lists archive entries under knowns/
#[test]
fn test_show_lists_archive_entries() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");
    fx.set_output("node-0/rx.tr", "r");
    fx.regress().args(["generate", "alpha"]).assert().success();

    fx.regress()
        .args(["show", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("knowns/out.log"))
        .stdout(predicate::str::contains("knowns/node-0/rx.tr"));

    fx.regress().args(["show", "beta"]).assert().code(3);
}

/// `--json` emits a parseable suite report
#[test]
fn test_json_report() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");
    fx.regress().args(["generate", "alpha"]).assert().success();

    let output = fx
        .regress()
        .args(["--json", "verify", "alpha"])
        .assert()
        .success()
        .get_output()
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["mode"], "verify");
    assert_eq!(report["results"][0]["test"], "alpha");
    assert_eq!(report["results"][0]["outcome"]["outcome"], "passed");
}

/// `--root` relocates the trace/known/archive layout
#[test]
fn test_root_override() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");
    let other = fx.path.join("elsewhere");

    fx.regress()
        .arg("--root")
        .arg(&other)
        .args(["generate", "alpha"])
        .assert()
        .success();
    assert!(other.join("tests/test-alpha.bz2").is_file());
    assert!(!fx.archive_path("alpha").exists());
}

/// A broken config file is reported on stderr with status 3
#[test]
fn test_invalid_config_is_error() {
    let fx = SimFixture::new();
    fx.append_config("bogus_key = 1\n");

    fx.regress()
        .arg("list")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("bogus_key"));
}

/// The bundled example config is printed verbatim
#[test]
fn test_example_config() {
    let fx = SimFixture::new();
    fx.regress()
        .arg("example-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[simulator]"))
        .stdout(predicate::str::contains("tcp-nonlistening-server"));
}

/// A layout whose known directory is the regression root is refused and
/// existing baselines survive
#[test]
fn test_overlapping_layout_keeps_baselines() {
    let fx = SimFixture::new();
    fx.set_output("out.log", "A");
    fx.regress().args(["generate", "beta"]).assert().success();

    fx.append_config("\n[layout]\nknowns = \".\"\n");
    fx.regress()
        .args(["generate", "alpha"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("layout.knowns"));

    assert!(fx.archive_path("beta").is_file());
}

/// Printing the example config does not depend on the local config file
#[test]
fn test_example_config_ignores_broken_config() {
    let fx = SimFixture::new();
    fx.append_config("bogus_key = 1\n");

    fx.regress()
        .arg("example-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[simulator]"));
}
