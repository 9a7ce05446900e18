//! Remote build service access through the `cbs` command line client

use super::parse::{self, BuildState};
use crate::build::artifact::{Artifact, BuildIdentity, identity_of};
use crate::core::error::{ReleaseError, ReleaseResult, ServiceError};
use crate::core::process::{CommandLine, CommandRunner, ProcessOutput};
use crate::release::rules::BuildTarget;
use serde::Serialize;
use std::collections::BTreeSet;

/// A build the service reports as complete, usable for tagging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedBuildRef {
  pub nvr: BuildIdentity,
  pub build_id: Option<u64>,
}

/// Result of submitting a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
  /// Build finished and was imported
  Completed(CompletedBuildRef),
  /// Scratch build finished; nothing was imported
  Scratch,
  /// Submitted without waiting
  Pending,
}

/// Operations against the remote build service
pub trait BuildService {
  /// Completed build matching `identity`, if one exists
  fn existing_build(&self, identity: &BuildIdentity) -> ReleaseResult<Option<CompletedBuildRef>>;

  /// Submit an artifact for a target, optionally blocking until the build ends
  fn submit(&self, target: &BuildTarget, artifact: &Artifact, wait: bool) -> ReleaseResult<Submission>;

  /// Tags currently applied to a build
  fn tags_of(&self, identity: &BuildIdentity) -> ReleaseResult<BTreeSet<String>>;

  /// Add `tag` to a build
  fn apply_tag(&self, identity: &BuildIdentity, tag: &str) -> ReleaseResult<()>;

  /// Authentication round trip
  fn hello(&self) -> ReleaseResult<String>;
}

/// `cbs` (koji) CLI backed build service
pub struct CbsClient<'a> {
  runner: &'a dyn CommandRunner,
  program: String,
  scratch: bool,
}

impl<'a> CbsClient<'a> {
  pub fn new(runner: &'a dyn CommandRunner, program: impl Into<String>, scratch: bool) -> Self {
    Self {
      runner,
      program: program.into(),
      scratch,
    }
  }

  fn cmd(&self) -> CommandLine {
    CommandLine::new(&self.program)
  }

  fn query(&self, cmd: CommandLine) -> ReleaseResult<ProcessOutput> {
    let output = self.runner.run(&cmd)?;
    if !output.success() {
      return Err(ReleaseError::Service(ServiceError::QueryFailure {
        command: cmd.to_string(),
        stderr: output.stderr,
      }));
    }
    Ok(output)
  }
}

fn failure_reason(output: &ProcessOutput) -> String {
  let stderr = output.stderr.trim();
  let status = match output.status {
    Some(code) => format!("exit {}", code),
    None => "killed by signal".to_string(),
  };
  if stderr.is_empty() {
    status
  } else {
    format!("{}: {}", status, stderr)
  }
}

impl BuildService for CbsClient<'_> {
  fn existing_build(&self, identity: &BuildIdentity) -> ReleaseResult<Option<CompletedBuildRef>> {
    let cmd = self.cmd().args(["buildinfo", identity.as_str()]);
    let output = self.runner.run(&cmd)?;

    // Newer koji clients exit non-zero for unknown builds
    if parse::is_missing_build(&output.stdout) || parse::is_missing_build(&output.stderr) {
      log::info!("no existing build for {}", identity);
      return Ok(None);
    }
    if !output.success() {
      return Err(ReleaseError::Service(ServiceError::QueryFailure {
        command: cmd.to_string(),
        stderr: output.stderr,
      }));
    }

    match parse::parse_buildinfo(&output.stdout) {
      Some(info) if info.state == BuildState::Complete => Ok(Some(CompletedBuildRef {
        nvr: identity.clone(),
        build_id: info.build_id,
      })),
      Some(info) => {
        log::info!("existing build {} is {}, not reusing it", identity, info.state);
        Ok(None)
      }
      None => Err(ReleaseError::Service(ServiceError::QueryFailure {
        command: cmd.to_string(),
        stderr: format!("unrecognized buildinfo output:\n{}", output.stdout),
      })),
    }
  }

  fn submit(&self, target: &BuildTarget, artifact: &Artifact, wait: bool) -> ReleaseResult<Submission> {
    let mut cmd = self.cmd().arg("build");
    if self.scratch {
      cmd = cmd.arg("--scratch");
    }
    if !wait {
      cmd = cmd.arg("--nowait");
    }
    cmd = cmd
      .arg(target.as_str())
      .arg(artifact.path().to_string_lossy().into_owned());

    let output = self.runner.stream(&cmd)?;
    if !output.success() {
      return Err(ReleaseError::Service(ServiceError::SubmissionFailure {
        target: target.to_string(),
        artifact: artifact.file_name(),
        reason: failure_reason(&output),
      }));
    }

    if self.scratch {
      return Ok(Submission::Scratch);
    }
    if !wait {
      return Ok(Submission::Pending);
    }

    let identity = identity_of(artifact)?;
    match self.existing_build(&identity)? {
      Some(build) => Ok(Submission::Completed(build)),
      None => Err(ReleaseError::Service(ServiceError::SubmissionFailure {
        target: target.to_string(),
        artifact: artifact.file_name(),
        reason: format!("build finished but {} is not COMPLETE", identity),
      })),
    }
  }

  fn tags_of(&self, identity: &BuildIdentity) -> ReleaseResult<BTreeSet<String>> {
    let output = self.query(self.cmd().args(["list-tags", "--build", identity.as_str()]))?;
    Ok(parse::parse_tag_list(&output.stdout))
  }

  fn apply_tag(&self, identity: &BuildIdentity, tag: &str) -> ReleaseResult<()> {
    let cmd = self.cmd().args(["tag-build", tag, identity.as_str()]);
    let output = self.runner.run(&cmd)?;
    if !output.success() {
      return Err(ReleaseError::Service(ServiceError::TaggingFailure {
        tag: tag.to_string(),
        nvr: identity.to_string(),
        reason: failure_reason(&output),
      }));
    }
    Ok(())
  }

  fn hello(&self) -> ReleaseResult<String> {
    let output = self.runner.run(&self.cmd().arg("hello"))?;
    if !output.success() {
      return Err(ReleaseError::Service(ServiceError::AuthFailure {
        reason: failure_reason(&output),
      }));
    }
    Ok(output.stdout.trim().to_string())
  }
}
