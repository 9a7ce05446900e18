//! Client certificate and service CA checks

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::ReleaseResult;
use crate::utils::expand_home;
use std::fs;

/// The client certificate must be present (a dangling symlink does not count)
pub struct ClientCertificateCheck;

impl Check for ClientCertificateCheck {
  fn name(&self) -> &str {
    "client-certificate"
  }

  fn description(&self) -> &str {
    "Validates the build service client certificate is in place"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> ReleaseResult<CheckResult> {
    let Some(home) = ctx.home else {
      return Ok(CheckResult::error(
        self.name(),
        "Could not determine the home directory",
        Some("Set HOME for the build user"),
      ));
    };
    let bootstrap = &ctx.config.bootstrap;
    let path = expand_home(&bootstrap.cert_path, home);

    if path.exists() {
      return Ok(CheckResult::pass(self.name(), format!("{} present", path.display())));
    }

    let suggestion = format!("Set {} and run `cbs-release bootstrap`", bootstrap.cert_env);
    if fs::symlink_metadata(&path).is_ok() {
      let target = fs::read_link(&path)
        .map(|t| t.display().to_string())
        .unwrap_or_else(|_| "?".to_string());
      return Ok(CheckResult::error(
        self.name(),
        format!("{} points to missing {}", path.display(), target),
        Some(suggestion),
      ));
    }

    Ok(CheckResult::error(
      self.name(),
      format!("{} not found", path.display()),
      Some(suggestion),
    ))
  }
}

/// The service CA should be cached; bootstrap downloads it otherwise
pub struct ServiceCaCheck;

impl Check for ServiceCaCheck {
  fn name(&self) -> &str {
    "service-ca"
  }

  fn description(&self) -> &str {
    "Checks the build service CA certificate is cached"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> ReleaseResult<CheckResult> {
    let Some(home) = ctx.home else {
      return Ok(CheckResult::warning(
        self.name(),
        "Could not determine the home directory",
        None::<String>,
      ));
    };
    let path = expand_home(&ctx.config.bootstrap.ca_path, home);

    if path.is_file() {
      Ok(CheckResult::pass(self.name(), format!("{} present", path.display())))
    } else {
      Ok(CheckResult::warning(
        self.name(),
        format!("{} not cached yet", path.display()),
        Some("Run `cbs-release bootstrap` to download it"),
      ))
    }
  }
}
