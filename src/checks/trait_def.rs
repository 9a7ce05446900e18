//! Check trait abstraction for host preconditions
//!
//! A release run must not start building on a host that cannot finish the
//! job. Every precondition implements [`Check`]; the [`super::CheckRunner`]
//! executes them and turns error-severity failures into a single
//! `PreconditionFailed` error.

use crate::core::config::ReleaseConfig;
use crate::core::error::ReleaseResult;
use crate::core::process::CommandRunner;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Severity level for check results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
  /// Informational message (not an issue)
  Info,
  /// Warning (non-blocking, but should be addressed)
  Warning,
  /// Error (blocking, must be fixed)
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Info => write!(f, "INFO"),
      Severity::Warning => write!(f, "WARN"),
      Severity::Error => write!(f, "ERROR"),
    }
  }
}

/// Result of running a check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
  /// Name of the check that ran
  pub check_name: String,
  /// Whether the check passed
  pub passed: bool,
  /// Severity level (if failed)
  pub severity: Severity,
  /// Human-readable message
  pub message: String,
  /// Optional suggested fix
  pub suggestion: Option<String>,
}

impl CheckResult {
  /// Create a passing check result
  pub fn pass(check_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      check_name: check_name.into(),
      passed: true,
      severity: Severity::Info,
      message: message.into(),
      suggestion: None,
    }
  }

  /// Create a failing check result with error severity
  pub fn error(
    check_name: impl Into<String>,
    message: impl Into<String>,
    suggestion: Option<impl Into<String>>,
  ) -> Self {
    Self {
      check_name: check_name.into(),
      passed: false,
      severity: Severity::Error,
      message: message.into(),
      suggestion: suggestion.map(|s| s.into()),
    }
  }

  /// Create a failing check result with warning severity
  pub fn warning(
    check_name: impl Into<String>,
    message: impl Into<String>,
    suggestion: Option<impl Into<String>>,
  ) -> Self {
    Self {
      check_name: check_name.into(),
      passed: false,
      severity: Severity::Warning,
      message: message.into(),
      suggestion: suggestion.map(|s| s.into()),
    }
  }

  /// Failed with error severity
  pub fn is_blocking(&self) -> bool {
    !self.passed && self.severity == Severity::Error
  }
}

/// Context passed to checks
pub struct CheckContext<'a> {
  /// Runs `rpm`, `cbs` and friends
  pub runner: &'a dyn CommandRunner,
  /// Home directory of the build user
  pub home: Option<&'a Path>,
  pub config: &'a ReleaseConfig,
  /// Whether to run expensive checks (remote service round trips)
  pub thorough: bool,
}

/// Host precondition
pub trait Check {
  /// Unique name for this check (kebab-case)
  fn name(&self) -> &str;

  /// Human-readable description of what this check validates
  fn description(&self) -> &str;

  /// Run the check and return a result
  fn run(&self, ctx: &CheckContext<'_>) -> ReleaseResult<CheckResult>;

  /// Whether this check is expensive (requires network, etc.)
  fn is_expensive(&self) -> bool {
    false
  }
}
