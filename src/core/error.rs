//! Error types for cbs-release with contextual messages and exit codes
//!
//! Every fatal condition in a release run ends up here: precondition failures,
//! toolchain failures, artifact discovery problems and remote build service
//! errors. Resolution misses (no target for a version) are deliberately NOT
//! errors and never reach this module.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cbs-release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, toolchain, build service, I/O)
  System = 2,
  /// Validation failure (host preconditions)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cbs-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Host precondition and input validation errors
  Validation(ValidationError),

  /// Packaging toolchain and artifact errors
  Build(BuildError),

  /// Remote build service errors
  Service(ServiceError),

  /// I/O errors
  Io(io::Error),

  /// Structured error with a line of context in front of it
  Context { context: String, source: Box<ReleaseError> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Structured errors keep their category, exit code and help text.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      other => ReleaseError::Context {
        context: ctx_str,
        source: Box::new(other),
      },
    }
  }


  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Git(_) => ExitCode::System,
      ReleaseError::Validation(_) => ExitCode::Validation,
      ReleaseError::Build(_) => ExitCode::System,
      ReleaseError::Service(_) => ExitCode::System,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Context { source, .. } => source.exit_code(),
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Validation(e) => e.help_message(),
      ReleaseError::Build(e) => e.help_message(),
      ReleaseError::Service(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Context { source, .. } => source.help_message(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Validation(e) => write!(f, "{}", e),
      ReleaseError::Build(e) => write!(f, "{}", e),
      ReleaseError::Service(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Context { context, source } => write!(f, "{}: {}", context, source),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      ReleaseError::Context { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<BuildError> for ReleaseError {
  fn from(err: BuildError) -> Self {
    ReleaseError::Build(err)
  }
}

impl From<ServiceError> for ReleaseError {
  fn from(err: ServiceError) -> Self {
    ReleaseError::Service(err)
  }
}

impl From<toml_edit::TomlError> for ReleaseError {
  fn from(err: toml_edit::TomlError) -> Self {
    ReleaseError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<glob::PatternError> for ReleaseError {
  fn from(err: glob::PatternError) -> Self {
    ReleaseError::message(format!("Invalid glob pattern: {}", err))
  }
}

impl From<glob::GlobError> for ReleaseError {
  fn from(err: glob::GlobError) -> Self {
    ReleaseError::message(format!("Failed to read glob match: {}", err))
  }
}

impl From<reqwest::Error> for ReleaseError {
  fn from(err: reqwest::Error) -> Self {
    ReleaseError::message(format!("HTTP error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Explicitly requested config file does not exist
  NotFound { path: PathBuf },

  /// Config parsed but failed validation
  Invalid { reason: String },

  /// A rule can never match because an earlier rule always wins
  UnreachableRule { table: String, prefix: String, shadowed_by: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Omit --config to use release.toml from the working directory or the built-in rules.".to_string())
      }
      ConfigError::UnreachableRule { .. } => {
        Some("Rules match first-to-last; list the more specific prefix first.".to_string())
      }
      ConfigError::Invalid { .. } => Some("Run `cbs-release rules` to see the effective configuration.".to_string()),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => write!(f, "Config file not found: {}", path.display()),
      ConfigError::Invalid { reason } => write!(f, "Invalid configuration: {}", reason),
      ConfigError::UnreachableRule {
        table,
        prefix,
        shadowed_by,
      } => write!(
        f,
        "Rule '{}' in [rules.{}] is unreachable: rule '{}' comes first and always matches",
        prefix, table, shadowed_by
      ),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// No tag matching the pattern is reachable from HEAD
  NoTag { pattern: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run from a ceph-ansible checkout or pass --dir. Looked in: {}",
        path.display()
      )),
      GitError::NoTag { .. } => Some("Fetch tags (`git fetch --tags`) or pass --tag explicitly.".to_string()),
      GitError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::NoTag { pattern } => write!(f, "No git tag matching '{}' found", pattern),
    }
  }
}

/// Validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// One or more host preconditions failed
  PreconditionFailed { failures: Vec<String> },

  /// Distribution variant is not of the form `el<N>`
  InvalidVariant { value: String },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::PreconditionFailed { .. } => {
        Some("Run `cbs-release doctor` for details, then `cbs-release bootstrap` to provision the host.".to_string())
      }
      ValidationError::InvalidVariant { .. } => Some("Variants look like 'el7' or 'el8'.".to_string()),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::PreconditionFailed { failures } => {
        write!(f, "Host preconditions failed:")?;
        for failure in failures {
          write!(f, "\n  - {}", failure)?;
        }
        Ok(())
      }
      ValidationError::InvalidVariant { value } => write!(f, "Invalid distribution variant: '{}'", value),
    }
  }
}

/// Packaging toolchain and artifact errors
#[derive(Debug)]
pub enum BuildError {
  /// A toolchain command exited non-zero
  ToolFailure {
    command: String,
    status: Option<i32>,
    stderr: String,
  },

  /// The toolchain succeeded but produced no matching artifact
  ArtifactNotFound { pattern: String },

  /// More than one file matches the artifact pattern
  AmbiguousArtifact { pattern: String, matches: Vec<PathBuf> },

  /// Artifact file name lacks the required suffix
  MalformedArtifactName { name: String },

  /// A metadata patch could not be applied
  PatchFailed { name: String, reason: String },
}

impl BuildError {
  fn help_message(&self) -> Option<String> {
    match self {
      BuildError::AmbiguousArtifact { .. } => {
        Some("Remove stale .src.rpm files from the working directory or re-run with --clean.".to_string())
      }
      BuildError::ToolFailure { .. } => {
        Some("Packaging failures indicate a source tree problem; fix the repository rather than retrying.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::ToolFailure { command, status, stderr } => {
        match status {
          Some(code) => write!(f, "Build tool failed (exit {}): {}", code, command)?,
          None => write!(f, "Build tool terminated by signal: {}", command)?,
        }
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
      BuildError::ArtifactNotFound { pattern } => write!(f, "No artifact found matching '{}'", pattern),
      BuildError::AmbiguousArtifact { pattern, matches } => {
        write!(f, "Multiple artifacts match '{}':", pattern)?;
        for path in matches {
          write!(f, "\n  - {}", path.display())?;
        }
        Ok(())
      }
      BuildError::MalformedArtifactName { name } => {
        write!(f, "Artifact name '{}' does not end in .src.rpm", name)
      }
      BuildError::PatchFailed { name, reason } => write!(f, "Metadata patch '{}' failed: {}", name, reason),
    }
  }
}

/// Remote build service errors
#[derive(Debug)]
pub enum ServiceError {
  /// A read-only query failed
  QueryFailure { command: String, stderr: String },

  /// Build submission failed or did not complete
  SubmissionFailure { target: String, artifact: String, reason: String },

  /// Tagging a build failed
  TaggingFailure { tag: String, nvr: String, reason: String },

  /// Authentication check failed
  AuthFailure { reason: String },
}

impl ServiceError {
  fn help_message(&self) -> Option<String> {
    match self {
      ServiceError::AuthFailure { .. } => {
        Some("Check ~/.centos.cert (set CENTOS_CERT and run `cbs-release bootstrap`).".to_string())
      }
      ServiceError::SubmissionFailure { .. } | ServiceError::TaggingFailure { .. } => {
        Some("Re-run the job; existing builds and tags are detected and skipped.".to_string())
      }
      ServiceError::QueryFailure { .. } => None,
    }
  }
}

impl fmt::Display for ServiceError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ServiceError::QueryFailure { command, stderr } => {
        write!(f, "Build service query failed: {}\n{}", command, stderr.trim_end())
      }
      ServiceError::SubmissionFailure {
        target,
        artifact,
        reason,
      } => write!(f, "Build submission of {} to {} failed: {}", artifact, target, reason),
      ServiceError::TaggingFailure { tag, nvr, reason } => {
        write!(f, "Tagging {} into {} failed: {}", nvr, tag, reason)
      }
      ServiceError::AuthFailure { reason } => write!(f, "Build service authentication failed: {}", reason),
    }
  }
}

/// Result type alias for cbs-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
