//! Health check command for diagnosing build host issues
//!
//! The doctor command runs all precondition checks and reports any issues found.

use crate::checks::{CheckContext, CheckResult, Severity, blocking_failures, create_default_runner};
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::process::SystemRunner;

/// Run the doctor command
///
/// Fails with a validation error (exit 3) when any blocking check fails.
pub fn run_doctor(ctx: &ReleaseContext, thorough: bool, json: bool) -> ReleaseResult<()> {
  let runner = SystemRunner::new(&ctx.root);
  let check_ctx = CheckContext {
    runner: &runner,
    home: ctx.home.as_deref(),
    config: &ctx.config,
    thorough,
  };

  let checks = create_default_runner();
  let results = checks.run_all(&check_ctx);

  if json {
    println!("{}", serde_json::to_string_pretty(&results)?);
  } else {
    println!("🏥 Running host checks...\n");

    println!("📋 Registered checks:");
    for check in checks.checks() {
      let note = if check.is_expensive() && !thorough {
        " (skipped, use --thorough)"
      } else {
        ""
      };
      println!("   • {}: {}{}", check.name(), check.description(), note);
    }
    println!();

    for result in &results {
      let icon = if result.passed { "✅" } else { "❌" };
      println!("{} {}: {}", icon, result.check_name, result.message);
      if !result.passed
        && let Some(ref suggestion) = result.suggestion
      {
        println!("   💡 Fix: {}", suggestion);
      }
    }

    let passed_count = results.iter().filter(|r| r.passed).count();
    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Summary: {}/{} checks passed", passed_count, results.len());

    if has_severity(&results, Severity::Error) {
      println!("\n⚠️  Critical issues found. A release run would stop before building.");
    } else if has_severity(&results, Severity::Warning) {
      println!("\n⚠️  Some warnings found. Consider running `cbs-release bootstrap`.");
    } else {
      println!("\n✨ All checks passed! This host can cut releases.");
    }
  }

  blocking_failures(&results)
}

fn has_severity(results: &[CheckResult], severity: Severity) -> bool {
  results.iter().any(|r| !r.passed && r.severity == severity)
}
