use crate::build::patches::MetadataPatch;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::rules::RuleTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in configuration, overlaid by the user's release.toml
const BUILTIN_CONFIG: &str = include_str!("../../defaults/release.toml");

/// Configuration for cbs-release
/// Searched in order: release.toml, .release.toml, .config/release.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
  pub project: ProjectConfig,
  pub rules: RuleTable,
  pub toolchain: ToolchainConfig,
  pub service: ServiceConfig,
  pub bootstrap: BootstrapConfig,
  #[serde(default)]
  pub patches: Vec<MetadataPatch>,
  /// File the config was loaded from (`None` = built-in only)
  #[serde(skip)]
  pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
  /// Package name, first component of every artifact name
  pub name: String,
  /// Build-description file produced by `make spec`
  pub spec_file: String,
  /// Leading marker stripped from tags ("v")
  pub version_marker: String,
  /// Glob passed to `git describe --match`
  pub tag_match: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
  pub make: String,
  pub rpmbuild: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
  /// Build service client (`cbs`, or plain `koji` with a profile wrapper)
  pub program: String,
  /// Submit scratch builds (never imported, never tagged)
  pub scratch: bool,
  /// Block until the remote build finishes
  pub wait: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
  /// Unix group the build user must belong to
  pub group: String,
  /// Package providing the build service client
  pub package: String,
  /// Environment variable naming the client certificate
  pub cert_env: String,
  /// Where the client expects its certificate (`~` expands to $HOME)
  pub cert_path: String,
  pub ca_url: String,
  /// Cached CA file (`~` expands to $HOME)
  pub ca_path: String,
}

impl ReleaseConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Built-in configuration only
  pub fn builtin() -> ReleaseResult<Self> {
    Self::from_overlay(None).context("Built-in configuration is invalid")
  }

  /// Load configuration for a checkout
  ///
  /// An explicit path must exist. Otherwise the search order is tried and the
  /// built-in configuration is used when nothing is found.
  pub fn load(root: &Path, explicit: Option<&Path>) -> ReleaseResult<Self> {
    let path = match explicit {
      Some(path) => {
        let path = if path.is_absolute() { path.to_path_buf() } else { root.join(path) };
        if !path.exists() {
          return Err(ReleaseError::Config(ConfigError::NotFound { path }));
        }
        Some(path)
      }
      None => Self::find_config_path(root),
    };

    let Some(path) = path else {
      log::debug!("no release.toml in {}, using built-in rules", root.display());
      return Self::builtin();
    };

    let content =
      fs::read_to_string(&path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    let mut config = Self::from_overlay(Some(&content))
      .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.source = Some(path);
    Ok(config)
  }

  /// Parse a user document on top of the built-in one
  pub fn from_overlay(user: Option<&str>) -> ReleaseResult<Self> {
    let mut doc: toml_edit::DocumentMut = BUILTIN_CONFIG.parse()?;

    if let Some(user) = user {
      let user_doc: toml_edit::DocumentMut = user.parse()?;
      overlay(doc.as_table_mut(), user_doc.as_table());
    }

    let config: ReleaseConfig = toml_edit::de::from_str(&doc.to_string())?;
    config.validate()?;
    Ok(config)
  }

  /// Validate the whole configuration
  pub fn validate(&self) -> ReleaseResult<()> {
    if self.project.name.trim().is_empty() {
      return Err(invalid("project.name must not be empty"));
    }
    if self.project.spec_file.trim().is_empty() {
      return Err(invalid("project.spec_file must not be empty"));
    }
    if self.service.program.trim().is_empty() {
      return Err(invalid("service.program must not be empty"));
    }

    self.rules.validate()?;

    let mut names = HashSet::new();
    for patch in &self.patches {
      patch.validate()?;
      if !names.insert(patch.name.as_str()) {
        return Err(invalid(&format!("duplicate patch name '{}'", patch.name)));
      }
    }

    Ok(())
  }
}

fn invalid(reason: &str) -> ReleaseError {
  ReleaseError::Config(ConfigError::Invalid {
    reason: reason.to_string(),
  })
}

/// Merge `user` into `base`: top-level tables merge key by key, everything else is replaced
fn overlay(base: &mut toml_edit::Table, user: &toml_edit::Table) {
  for (key, item) in user.iter() {
    match (base.get_mut(key), item) {
      (Some(toml_edit::Item::Table(base_table)), toml_edit::Item::Table(user_table)) => {
        for (inner_key, inner_item) in user_table.iter() {
          base_table.insert(inner_key, inner_item.clone());
        }
      }
      _ => {
        base.insert(key, item.clone());
      }
    }
  }
}
