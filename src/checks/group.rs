//! Unix group membership check

use super::trait_def::{Check, CheckContext, CheckResult};
use crate::core::error::ReleaseResult;

/// The build user must be in the group allowed to run mock chroots
pub struct UnixGroupCheck;

impl Check for UnixGroupCheck {
  fn name(&self) -> &str {
    "unix-group"
  }

  fn description(&self) -> &str {
    "Validates membership of the build Unix group"
  }

  fn run(&self, ctx: &CheckContext<'_>) -> ReleaseResult<CheckResult> {
    let wanted = &ctx.config.bootstrap.group;
    let groups = current_groups()?;
    Ok(evaluate(self.name(), wanted, &groups))
  }
}

fn evaluate(name: &str, wanted: &str, groups: &[String]) -> CheckResult {
  if groups.iter().any(|g| g == wanted) {
    CheckResult::pass(name, format!("member of \"{}\"", wanted))
  } else {
    CheckResult::error(
      name,
      format!("current user not in the \"{}\" group", wanted),
      Some(format!("sudo usermod -aG {} $USER, then log in again", wanted)),
    )
  }
}

/// Names of the primary and supplementary groups of this process
#[cfg(unix)]
fn current_groups() -> ReleaseResult<Vec<String>> {
  let mut groups: Vec<String> = users::group_access_list()?
    .iter()
    .map(|g| g.name().to_string_lossy().into_owned())
    .collect();
  if let Some(primary) = users::get_group_by_gid(users::get_current_gid()) {
    groups.push(primary.name().to_string_lossy().into_owned());
  }
  Ok(groups)
}

#[cfg(not(unix))]
fn current_groups() -> ReleaseResult<Vec<String>> {
  Err(crate::core::error::ReleaseError::message("Unix group membership is only available on Unix hosts"))
}
