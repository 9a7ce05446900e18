//! Integration tests for `cbs-release rules` and configuration loading

use crate::helpers::{TestCheckout, stdout_json};
use anyhow::Result;

#[test]
fn test_rules_json() -> Result<()> {
  let checkout = TestCheckout::new()?;

  let rules = stdout_json(&checkout.run_ok("", &["rules", "--json"])?)?;
  assert_eq!(rules["target_template"], "storage{major}-ceph-{release}-{variant}");
  assert_eq!(rules["targets"].as_array().unwrap().len(), 7);
  assert_eq!(rules["targets"][0]["prefix"], "2.");
  assert!(rules["targets"][0].get("release").is_none());
  assert_eq!(rules["default_variants"], serde_json::json!(["el7"]));
  Ok(())
}

#[test]
fn test_rules_human_output() -> Result<()> {
  let checkout = TestCheckout::new()?;

  let output = checkout.run_ok("", &["rules"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Built-in rules"));
  assert!(stdout.contains("(retired, not built)"));
  assert!(stdout.contains("luminous, mimic"));
  Ok(())
}

#[test]
fn test_rules_reports_config_source() -> Result<()> {
  let checkout = TestCheckout::new()?;
  std::fs::create_dir_all(checkout.path.join(".config"))?;
  checkout.write_file(".config/release.toml", "[rules]\ndefault_variants = [\"el8\"]\n")?;

  let output = checkout.run_ok("", &["rules"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains(".config/release.toml"));
  assert!(stdout.contains("(other)  el8"));
  Ok(())
}

#[test]
fn test_shadowed_rule_is_rejected() -> Result<()> {
  let checkout = TestCheckout::new()?;
  checkout.write_file(
    "release.toml",
    r#"
[[rules.targets]]
prefix = "3."
release = "luminous"

[[rules.targets]]
prefix = "3.2"
release = "mimic"
"#,
  )?;

  let output = checkout.run("", &["rules"])?;
  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("'3.2'"), "stderr: {}", stderr);
  assert!(stderr.contains("unreachable"));
  Ok(())
}

#[test]
fn test_missing_explicit_config() -> Result<()> {
  let checkout = TestCheckout::new()?;

  let output = checkout.run("", &["--config", "nope.toml", "rules"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
  Ok(())
}
