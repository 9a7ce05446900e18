//! Release context - build once, pass everywhere
//!
//! Everything a component could otherwise read ad hoc from the process
//! environment (working directory, home directory, client certificate path,
//! configuration) is gathered here once in `main` and passed by reference.

use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::utils::expand_home;
use std::path::{Path, PathBuf};

/// Shared state for one invocation
pub struct ReleaseContext {
  /// Checkout the release is cut from (absolute path)
  pub root: PathBuf,

  /// Home directory of the build user, if one could be determined
  pub home: Option<PathBuf>,

  /// Effective configuration (built-in rules overlaid by release.toml)
  pub config: ReleaseConfig,

  /// Value of the certificate environment variable, if set
  pub cert_source: Option<PathBuf>,
}

impl ReleaseContext {
  /// Build the context for a checkout from the real process environment
  pub fn build(root: &Path, config_path: Option<&Path>) -> ReleaseResult<Self> {
    let root = if root.is_absolute() {
      root.to_path_buf()
    } else {
      std::env::current_dir()?.join(root)
    };
    let config = ReleaseConfig::load(&root, config_path)?;
    let cert_source = std::env::var_os(&config.bootstrap.cert_env)
      .filter(|v| !v.is_empty())
      .map(PathBuf::from);

    Ok(Self {
      root,
      home: dirs::home_dir(),
      config,
      cert_source,
    })
  }

  /// Home directory or error
  ///
  /// Use this in operations that touch per-user client files.
  pub fn require_home(&self) -> ReleaseResult<&Path> {
    self.home.as_deref().ok_or_else(|| {
      ReleaseError::with_help(
        "Could not determine the home directory",
        "Set HOME for the build user",
      )
    })
  }

  /// Where the build service client looks for its certificate
  pub fn cert_path(&self) -> ReleaseResult<PathBuf> {
    Ok(expand_home(&self.config.bootstrap.cert_path, self.require_home()?))
  }

  /// Where the service CA is cached
  pub fn ca_path(&self) -> ReleaseResult<PathBuf> {
    Ok(expand_home(&self.config.bootstrap.ca_path, self.require_home()?))
  }
}

#[cfg(test)]
impl ReleaseContext {
  /// Context over built-in configuration with explicit paths
  pub fn for_tests(root: &Path, home: Option<&Path>) -> Self {
    Self {
      root: root.to_path_buf(),
      home: home.map(Path::to_path_buf),
      config: ReleaseConfig::builtin().unwrap(),
      cert_source: None,
    }
  }
}
