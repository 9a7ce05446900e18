//! Build service authentication check

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::cbs::{BuildService, CbsClient};
use crate::core::error::ReleaseResult;

/// `cbs hello` must succeed with the configured certificate
pub struct ServiceAuthCheck;

impl Check for ServiceAuthCheck {
  fn name(&self) -> &str {
    "service-auth"
  }

  fn description(&self) -> &str {
    "Authenticates against the build service (cbs hello)"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> ReleaseResult<CheckResult> {
    let client = CbsClient::new(ctx.runner, &ctx.config.service.program, false);
    match client.hello() {
      Ok(greeting) => {
        let first = greeting.lines().next().unwrap_or("authenticated").to_string();
        Ok(CheckResult::pass(self.name(), first))
      }
      Err(err) => Ok(CheckResult::error(
        self.name(),
        err.to_string(),
        Some("Check the client certificate has not expired"),
      )),
    }
  }

  fn is_expensive(&self) -> bool {
    true
  }
}
