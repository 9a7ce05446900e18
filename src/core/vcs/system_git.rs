//! System git backend
//!
//! Shells out to the `git` binary found on PATH with an isolated environment.

use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git
pub struct SystemGit {
  /// Working tree root
  work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ReleaseError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(Self {
      work_tree: PathBuf::from(stdout.trim()),
    })
  }

  /// Most recent tag reachable from HEAD whose name matches `pattern`
  ///
  /// Equivalent to `git describe --tags --abbrev=0 --match <pattern>`.
  pub fn latest_tag(&self, pattern: &str) -> ReleaseResult<String> {
    let output = self
      .git_cmd()
      .args(["describe", "--tags", "--abbrev=0", "--match", pattern])
      .output()
      .context("Failed to execute git describe")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("No names found") || stderr.contains("No tags can describe") {
        return Err(ReleaseError::Git(GitError::NoTag {
          pattern: pattern.to_string(),
        }));
      }
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: format!("git describe --tags --abbrev=0 --match {}", pattern),
        stderr: stderr.to_string(),
      }));
    }

    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    log::debug!("latest tag matching {}: {}", pattern, tag);
    Ok(tag)
  }

  /// Create a git command with isolated environment
  ///
  /// Only PATH and HOME survive; user config cannot change output formats.
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(&self.work_tree);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false");
    cmd
  }
}
