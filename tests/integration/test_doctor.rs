//! Integration tests for `cbs-release doctor` and the precondition gate of `run`

use crate::helpers::{TestCheckout, stdout_json};
use anyhow::Result;
use std::process::Command;

/// Checkout whose config names a group the current user is in, with a
/// provisioned home directory
fn provisioned_checkout() -> Result<TestCheckout> {
  let checkout = TestCheckout::new()?;
  let group = Command::new("id").arg("-gn").output()?;
  let group = String::from_utf8_lossy(&group.stdout).trim().to_string();
  checkout.write_file("release.toml", &format!("[bootstrap]\ngroup = \"{}\"\n", group))?;
  std::fs::write(checkout.home.join(".centos.cert"), "pem")?;
  std::fs::write(checkout.home.join(".centos-server-ca.cert"), "ca")?;
  Ok(checkout)
}

#[test]
fn test_doctor_healthy_host() -> Result<()> {
  let checkout = provisioned_checkout()?;

  let output = checkout.run_ok("", &["doctor", "--json"])?;
  let results = stdout_json(&output)?;
  let results = results.as_array().unwrap();
  assert!(!results.is_empty());
  assert!(results.iter().all(|r| r["passed"] == true), "results: {:?}", results);
  assert!(results.iter().any(|r| r["check_name"] == "client-package"));
  assert!(checkout.calls_to("cbs hello").is_empty());
  Ok(())
}

#[test]
fn test_doctor_thorough_authenticates() -> Result<()> {
  let checkout = provisioned_checkout()?;

  checkout.run_ok("", &["doctor", "--thorough"])?;
  assert_eq!(checkout.calls_to("cbs hello").len(), 1);
  Ok(())
}

#[test]
fn test_doctor_missing_certificate() -> Result<()> {
  let checkout = provisioned_checkout()?;
  std::fs::remove_file(checkout.home.join(".centos.cert"))?;

  let output = checkout.run("", &["doctor"])?;
  assert_eq!(output.status.code(), Some(3));
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("❌ client-certificate"), "stdout: {}", stdout);
  assert!(String::from_utf8_lossy(&output.stderr).contains("client-certificate"));
  Ok(())
}

#[test]
fn test_doctor_missing_ca_only_warns() -> Result<()> {
  let checkout = provisioned_checkout()?;
  std::fs::remove_file(checkout.home.join(".centos-server-ca.cert"))?;

  let output = checkout.run_ok("", &["doctor"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Some warnings found"));
  Ok(())
}

#[test]
fn test_run_refuses_unprovisioned_host() -> Result<()> {
  let checkout = provisioned_checkout()?;
  std::fs::remove_file(checkout.home.join(".centos.cert"))?;
  checkout.tag("v3.2.1")?;

  let output = checkout.run("3.2.1", &["run"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(checkout.calls_to("make").is_empty());
  assert!(checkout.calls_to("cbs build").is_empty());
  Ok(())
}

#[test]
fn test_run_authenticates_before_building() -> Result<()> {
  let checkout = provisioned_checkout()?;
  checkout.tag("v3.2.1")?;

  checkout.run_ok("3.2.1", &["run"])?;

  let calls = checkout.calls();
  let hello = calls.iter().position(|c| c == "cbs hello");
  let make = calls.iter().position(|c| c == "make dist");
  assert!(hello.is_some(), "calls: {:?}", calls);
  assert!(hello < make, "calls: {:?}", calls);
  Ok(())
}

#[test]
fn test_run_stops_on_rejected_credentials() -> Result<()> {
  let checkout = provisioned_checkout()?;
  checkout.tag("v3.2.1")?;

  let output = checkout
    .command("3.2.1", &["run"])
    .env("FAKE_HELLO_EXIT", "1")
    .output()?;
  assert_eq!(output.status.code(), Some(3));
  assert!(String::from_utf8_lossy(&output.stderr).contains("service-auth"));
  assert!(checkout.calls_to("make").is_empty());
  Ok(())
}

#[test]
fn test_run_checks_group_before_provisioning() -> Result<()> {
  let checkout = provisioned_checkout()?;
  checkout.write_file("release.toml", "[bootstrap]\ngroup = \"no-such-group-for-cbs-release\"\n")?;
  checkout.tag("v3.2.1")?;

  let output = checkout.run("3.2.1", &["run"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(String::from_utf8_lossy(&output.stderr).contains("unix-group"));
  // Nothing installed, nothing linked
  assert!(checkout.calls().is_empty());
  Ok(())
}

#[test]
fn test_run_links_certificate_from_environment() -> Result<()> {
  let checkout = provisioned_checkout()?;
  std::fs::remove_file(checkout.home.join(".centos.cert"))?;
  let jenkins_cert = checkout.home.join("jenkins.pem");
  std::fs::write(&jenkins_cert, "pem")?;
  checkout.tag("v3.2.1")?;

  let output = checkout
    .command("3.2.1", &["run"])
    .env("CENTOS_CERT", &jenkins_cert)
    .output()?;
  assert!(
    output.status.success(),
    "stderr: {}",
    String::from_utf8_lossy(&output.stderr)
  );
  assert_eq!(std::fs::read_link(checkout.home.join(".centos.cert"))?, jenkins_cert);
  assert_eq!(checkout.calls_to("rpm -qv centos-packager").len(), 1);
  assert_eq!(checkout.calls_to("cbs tag-build").len(), 2);
  Ok(())
}
