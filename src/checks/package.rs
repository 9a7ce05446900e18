//! Build service client package check

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::ReleaseResult;
use crate::core::process::CommandLine;

/// The package providing the `cbs` client must be installed
pub struct ClientPackageCheck;

impl Check for ClientPackageCheck {
  fn name(&self) -> &str {
    "client-package"
  }

  fn description(&self) -> &str {
    "Validates the build service client package is installed"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> ReleaseResult<CheckResult> {
    let package = &ctx.config.bootstrap.package;
    let output = ctx.runner.run(&CommandLine::new("rpm").args(["-q", package.as_str()]))?;

    if output.success() {
      Ok(CheckResult::pass(self.name(), output.stdout.trim().to_string()))
    } else {
      Ok(CheckResult::error(
        self.name(),
        format!("{} is not installed", package),
        Some(format!("Run `cbs-release bootstrap` or `sudo yum -y install {}`", package)),
      ))
    }
  }
}
