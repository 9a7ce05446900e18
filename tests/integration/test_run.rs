//! Integration tests for `cbs-release run`
//!
//! Host preconditions are skipped here; `test_doctor` covers them.

use crate::helpers::{TestCheckout, stdout_json};
use anyhow::Result;

const LUMINOUS_NVR: &str = "ceph-ansible-3.2.1-1.el7";

#[test]
fn test_run_builds_submits_and_tags() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;

  let output = checkout.run_ok("3.2.1", &["run", "--skip-prereqs"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("1 variant(s) released, 0 skipped"), "stdout: {}", stdout);

  let calls = checkout.calls();
  assert_eq!(calls[0], "make dist");
  assert_eq!(calls[1], "make spec DIST=el7");
  assert!(calls[2].starts_with("rpmbuild -bs ceph-ansible.spec"));
  assert_eq!(calls[3], format!("cbs buildinfo {}", LUMINOUS_NVR));
  assert!(calls[4].starts_with("cbs build storage7-ceph-luminous-el7 "));
  assert!(calls[4].ends_with(&format!("{}.src.rpm", LUMINOUS_NVR)));
  assert_eq!(checkout.calls_to("cbs tag-build").len(), 2);

  assert_eq!(
    checkout.tags_of(LUMINOUS_NVR),
    vec!["storage7-ceph-luminous-candidate", "storage7-ceph-mimic-candidate"]
  );
  assert!(checkout.file_exists(&format!("{}.src.rpm", LUMINOUS_NVR)));
  Ok(())
}

#[test]
fn test_rerun_is_idempotent() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;
  checkout.run_ok("3.2.1", &["run", "--skip-prereqs"])?;
  checkout.clear_calls()?;

  // The artifact from the first run is rebuilt in place, so it stays unambiguous
  let output = checkout.run_ok("3.2.1", &["run", "--skip-prereqs"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("already built"));
  assert!(stdout.contains("already carries every candidate tag"));

  assert!(checkout.calls_to("cbs build ").is_empty());
  assert!(checkout.calls_to("cbs tag-build").is_empty());
  assert_eq!(checkout.tags_of(LUMINOUS_NVR).len(), 2);
  Ok(())
}

#[test]
fn test_existing_build_only_gets_missing_tags() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;
  checkout.mark_built(LUMINOUS_NVR)?;
  checkout.set_tags(LUMINOUS_NVR, &["storage7-ceph-luminous-candidate", "storage7-ceph-luminous-testing"])?;

  checkout.run_ok("3.2.1", &["run", "--skip-prereqs"])?;

  assert!(checkout.calls_to("cbs build ").is_empty());
  assert_eq!(
    checkout.calls_to("cbs tag-build"),
    vec![format!("cbs tag-build storage7-ceph-mimic-candidate {}", LUMINOUS_NVR)]
  );
  Ok(())
}

#[test]
fn test_fully_tagged_build_is_left_alone() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.0.0")?;
  checkout.mark_built("ceph-ansible-3.0.0-1.el7")?;
  checkout.set_tags("ceph-ansible-3.0.0-1.el7", &["storage7-ceph-jewel-candidate"])?;

  checkout.run_ok("3.0.0", &["run", "--skip-prereqs"])?;

  assert!(checkout.calls_to("cbs build ").is_empty());
  assert!(checkout.calls_to("cbs tag-build").is_empty());
  Ok(())
}

#[test]
fn test_stale_artifact_aborts_before_submission() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;
  checkout.write_file("ceph-ansible-3.2.0-1.el7.src.rpm", "")?;

  let output = checkout.run("3.2.1", &["run", "--skip-prereqs"])?;
  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Multiple artifacts"), "stderr: {}", stderr);
  assert!(checkout.calls_to("cbs").is_empty());

  checkout.clear_calls()?;
  checkout.run_ok("3.2.1", &["run", "--skip-prereqs", "--clean"])?;
  assert!(!checkout.file_exists("ceph-ansible-3.2.0-1.el7.src.rpm"));
  assert_eq!(checkout.calls_to("cbs build ").len(), 1);
  Ok(())
}

#[test]
fn test_retired_line_skips_cleanly() -> Result<()> {
  let checkout = TestCheckout::tagged("v2.4.0")?;

  // No --skip-prereqs: a run with nothing to build never checks the host
  let output = checkout.run_ok("2.4.0", &["run"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("no build target"));
  assert!(stdout.contains("0 variant(s) released, 1 skipped"));
  assert!(checkout.calls().is_empty());
  Ok(())
}

#[test]
fn test_dry_run_has_no_side_effects() -> Result<()> {
  let checkout = TestCheckout::tagged("v4.0.0")?;

  let output = checkout.run_ok("4.0.0", &["run", "--dry-run"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("storage8-ceph-nautilus-el8"));
  assert!(stdout.contains("Dry-run"));
  assert!(checkout.calls().is_empty());
  Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;

  let output = checkout.run_ok("3.2.1", &["run", "--skip-prereqs", "--json"])?;
  let report = stdout_json(&output)?;

  assert_eq!(report["tag"], "v3.2.1");
  assert_eq!(report["version"], "3.2.1");
  let variant = &report["variants"][0];
  assert_eq!(variant["state"], "done");
  assert_eq!(variant["target"], "storage7-ceph-luminous-el7");
  assert_eq!(variant["identity"], LUMINOUS_NVR);
  assert_eq!(variant["build_id"], 1234);
  assert_eq!(variant["reused"], false);
  assert_eq!(variant["tags_applied"].as_array().unwrap().len(), 2);
  assert!(variant["finished_at"].is_string());
  Ok(())
}

#[test]
fn test_scratch_build_is_not_tagged() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;

  checkout.run_ok("3.2.1", &["run", "--skip-prereqs", "--scratch"])?;

  let builds = checkout.calls_to("cbs build ");
  assert_eq!(builds.len(), 1);
  assert!(builds[0].contains("--scratch"));
  assert!(checkout.calls_to("cbs tag-build").is_empty());
  Ok(())
}

#[test]
fn test_no_wait_submission_is_not_tagged() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;

  checkout.run_ok("3.2.1", &["run", "--skip-prereqs", "--no-wait"])?;

  let builds = checkout.calls_to("cbs build ");
  assert_eq!(builds.len(), 1);
  assert!(builds[0].contains("--nowait"));
  assert!(checkout.calls_to("cbs list-tags").is_empty());
  assert!(checkout.calls_to("cbs tag-build").is_empty());
  Ok(())
}

#[test]
fn test_toolchain_failure_stops_the_run() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;

  let output = checkout
    .command("3.2.1", &["run", "--skip-prereqs"])
    .env("FAKE_MAKE_EXIT", "2")
    .output()?;
  assert_eq!(output.status.code(), Some(2));
  assert!(String::from_utf8_lossy(&output.stderr).contains("make dist"));
  assert_eq!(checkout.calls(), vec!["make dist"]);
  Ok(())
}

#[test]
fn test_first_failing_variant_stops_the_rest() -> Result<()> {
  let checkout = TestCheckout::tagged("v4.0.0")?;
  // el7 builds fine but el8 finds a leftover artifact
  checkout.write_file("ceph-ansible-3.9.0-1.el8.src.rpm", "")?;

  let output = checkout.run("4.0.0", &["run", "--skip-prereqs", "--json"])?;
  assert_eq!(output.status.code(), Some(2));

  let report = stdout_json(&output)?;
  assert_eq!(report["variants"][0]["state"], "done");
  assert_eq!(report["variants"][1]["state"], "aborted");
  assert!(report["variants"][1]["error"].as_str().unwrap().contains("Multiple artifacts"));
  assert_eq!(checkout.calls_to("cbs build ").len(), 1);
  Ok(())
}

#[test]
fn test_missing_toolchain_is_a_host_error() -> Result<()> {
  let checkout = TestCheckout::tagged("v3.2.1")?;
  checkout.write_file("release.toml", "[toolchain]\nmake = \"no-such-make-for-cbs-release\"\n")?;

  let output = checkout.run("3.2.1", &["run", "--skip-prereqs"])?;
  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Failed to execute no-such-make-for-cbs-release"), "stderr: {}", stderr);
  assert!(checkout.calls_to("cbs").is_empty());
  Ok(())
}
