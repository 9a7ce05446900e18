//! External process execution
//!
//! Every collaborator of a release run (make, rpmbuild, rpm, yum, cbs) is an
//! external program. Components never spawn processes directly; they describe a
//! [`CommandLine`] and hand it to a [`CommandRunner`]. The system runner spawns
//! real processes in the configured working directory, tests substitute a
//! recording fake.

use crate::core::error::{ReleaseResult, ResultExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A program invocation, independent of how it gets executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
  pub program: String,
  pub args: Vec<String>,
}

impl CommandLine {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// First positional argument (the subcommand for tools like `cbs`)
  #[cfg(test)]
  pub fn subcommand(&self) -> Option<&str> {
    self.args.first().map(String::as_str)
  }
}

impl fmt::Display for CommandLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      if arg.is_empty() || arg.contains(char::is_whitespace) {
        write!(f, " '{}'", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
  /// Exit code, `None` when killed by a signal
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ProcessOutput {
  pub fn success(&self) -> bool {
    self.status == Some(0)
  }

  /// Successful output with the given stdout
  #[cfg(test)]
  pub fn ok(stdout: impl Into<String>) -> Self {
    Self {
      status: Some(0),
      stdout: stdout.into(),
      stderr: String::new(),
    }
  }

  /// Failed output with the given exit code and stderr
  #[cfg(test)]
  pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
    Self {
      status: Some(code),
      stdout: String::new(),
      stderr: stderr.into(),
    }
  }
}

/// Executes command lines
pub trait CommandRunner {
  /// Run to completion, capturing stdout and stderr
  fn run(&self, cmd: &CommandLine) -> ReleaseResult<ProcessOutput>;

  /// Run to completion with output passed through to the job log
  ///
  /// Used for long-running steps (packaging, build submission). The child's
  /// stdout goes to our stderr so our own stdout stays machine-readable;
  /// stderr is still captured for error reports.
  fn stream(&self, cmd: &CommandLine) -> ReleaseResult<ProcessOutput> {
    self.run(cmd)
  }
}

/// Runs commands as real child processes in a fixed working directory
pub struct SystemRunner {
  cwd: PathBuf,
}

impl SystemRunner {
  pub fn new(cwd: &Path) -> Self {
    Self { cwd: cwd.to_path_buf() }
  }

  fn command(&self, cmd: &CommandLine) -> Command {
    let mut command = Command::new(&cmd.program);
    command.current_dir(&self.cwd).args(&cmd.args);
    command
  }
}

impl CommandRunner for SystemRunner {
  fn run(&self, cmd: &CommandLine) -> ReleaseResult<ProcessOutput> {
    log::debug!("$ {}", cmd);
    let output = self
      .command(cmd)
      .output()
      .with_context(|| format!("Failed to execute {}", cmd.program))?;

    Ok(ProcessOutput {
      status: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
  }

  fn stream(&self, cmd: &CommandLine) -> ReleaseResult<ProcessOutput> {
    log::debug!("$ {}", cmd);
    let output = self
      .command(cmd)
      .stdin(Stdio::null())
      .stdout(Stdio::from(std::io::stderr()))
      .stderr(Stdio::piped())
      .output()
      .with_context(|| format!("Failed to execute {}", cmd.program))?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    // Keep stderr visible in the job log as well
    if !stderr.is_empty() {
      eprint!("{}", stderr);
    }

    Ok(ProcessOutput {
      status: output.status.code(),
      stdout: String::new(),
      stderr,
    })
  }
}
