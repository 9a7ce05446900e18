//! Check runner for executing precondition checks

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::{ReleaseError, ReleaseResult, ValidationError};

/// Check runner that executes multiple checks
pub struct CheckRunner {
  checks: Vec<Box<dyn Check>>,
}

impl CheckRunner {
  pub fn new() -> Self {
    Self { checks: Vec::new() }
  }

  /// Add a check to the runner
  pub fn add_check(&mut self, check: Box<dyn Check>) {
    self.checks.push(check);
  }

  /// Run all checks and collect results
  pub fn run_all(&self, ctx: &CheckContext<'_>) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for check in &self.checks {
      if check.is_expensive() && !ctx.thorough {
        log::debug!("skipping expensive check {}", check.name());
        continue;
      }

      match check.run(ctx) {
        Ok(result) => results.push(result),
        Err(err) => {
          // A check that cannot run counts as failed
          results.push(CheckResult::error(
            check.name(),
            format!("Check failed to run: {}", err),
            Some("Re-run with RUST_LOG=debug for details"),
          ));
        }
      }
    }

    results
  }

  /// Run all checks and fail if any error-severity check failed
  pub fn enforce(&self, ctx: &CheckContext<'_>) -> ReleaseResult<Vec<CheckResult>> {
    let results = self.run_all(ctx);
    blocking_failures(&results)?;
    Ok(results)
  }

  /// Get all registered checks
  pub fn checks(&self) -> &[Box<dyn Check>] {
    &self.checks
  }
}

impl Default for CheckRunner {
  fn default() -> Self {
    Self::new()
  }
}

/// Turn error-severity failures into `PreconditionFailed`
pub fn blocking_failures(results: &[CheckResult]) -> ReleaseResult<()> {
  let failures: Vec<String> = results
    .iter()
    .filter(|r| r.is_blocking())
    .map(|r| format!("{}: {}", r.check_name, r.message))
    .collect();

  if failures.is_empty() {
    Ok(())
  } else {
    Err(ReleaseError::Validation(ValidationError::PreconditionFailed { failures }))
  }
}

/// Create a runner with all built-in checks
pub fn create_default_runner() -> CheckRunner {
  let mut runner = CheckRunner::new();

  runner.add_check(Box::new(super::group::UnixGroupCheck));
  runner.add_check(Box::new(super::package::ClientPackageCheck));
  runner.add_check(Box::new(super::certificate::ClientCertificateCheck));
  runner.add_check(Box::new(super::certificate::ServiceCaCheck));
  runner.add_check(Box::new(super::service::ServiceAuthCheck));

  runner
}

/// Create a runner with only the group membership check
///
/// Runs before provisioning, which installs packages with sudo.
pub fn create_membership_runner() -> CheckRunner {
  let mut runner = CheckRunner::new();
  runner.add_check(Box::new(super::group::UnixGroupCheck));
  runner
}
