//! Version-scoped metadata patches
//!
//! Some upstream tags carry a version string the packaging metadata cannot
//! digest. A patch rewrites a literal string in one file, only for the exact
//! versions it lists, and only for the duration of the toolchain run. Each one
//! is named and can be switched off or deleted without touching anything else.

use crate::core::error::{BuildError, ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::version::ResolvedVersion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_enabled() -> bool {
  true
}

/// A single named find/replace workaround
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPatch {
  pub name: String,
  #[serde(default = "default_enabled")]
  pub enabled: bool,
  /// File to patch, relative to the checkout
  pub file: PathBuf,
  /// Exact resolved versions (marker stripped) this patch applies to
  pub versions: Vec<String>,
  pub find: String,
  pub replace: String,
}

/// What happened to one patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
  Applied,
  Disabled,
  /// Version not listed
  NotApplicable,
  /// Listed version, but the text to replace is gone
  AlreadyClean,
}

impl MetadataPatch {
  pub fn validate(&self) -> ReleaseResult<()> {
    let reason = if self.name.trim().is_empty() {
      Some("patch name must not be empty".to_string())
    } else if self.find.is_empty() {
      Some(format!("patch '{}' has an empty `find`", self.name))
    } else if self.versions.is_empty() {
      Some(format!("patch '{}' lists no versions", self.name))
    } else if self.file.is_absolute() {
      Some(format!("patch '{}' file must be relative to the checkout", self.name))
    } else {
      None
    };

    match reason {
      Some(reason) => Err(ReleaseError::Config(ConfigError::Invalid { reason })),
      None => Ok(()),
    }
  }

  pub fn applies_to(&self, version: &ResolvedVersion) -> bool {
    self.versions.iter().any(|v| v == version.as_str())
  }
}

/// Original contents of patched files, restored after packaging
#[derive(Debug, Default)]
pub struct AppliedPatches {
  originals: Vec<(PathBuf, String)>,
}

impl AppliedPatches {
  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.originals.is_empty()
  }

  /// Put every patched file back the way it was
  pub fn restore(self) -> ReleaseResult<()> {
    // Reverse order so a file patched twice ends up with its first original
    for (path, original) in self.originals.into_iter().rev() {
      fs::write(&path, original).with_context(|| format!("Failed to restore {}", path.display()))?;
      log::debug!("restored {}", path.display());
    }
    Ok(())
  }
}

/// Apply every enabled patch that targets `version`
pub fn apply_patches(
  root: &Path,
  patches: &[MetadataPatch],
  version: &ResolvedVersion,
) -> ReleaseResult<(AppliedPatches, Vec<(String, PatchOutcome)>)> {
  let mut applied = AppliedPatches::default();
  let mut outcomes = Vec::with_capacity(patches.len());

  for patch in patches {
    let outcome = if !patch.enabled {
      PatchOutcome::Disabled
    } else if !patch.applies_to(version) {
      PatchOutcome::NotApplicable
    } else {
      let path = root.join(&patch.file);
      let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
          // Undo anything already applied before bailing
          applied.restore()?;
          return Err(ReleaseError::Build(BuildError::PatchFailed {
            name: patch.name.clone(),
            reason: format!("cannot read {}: {}", path.display(), err),
          }));
        }
      };

      if content.contains(&patch.find) {
        let patched = content.replace(&patch.find, &patch.replace);
        if let Err(err) = fs::write(&path, patched) {
          applied.restore()?;
          return Err(ReleaseError::Build(BuildError::PatchFailed {
            name: patch.name.clone(),
            reason: format!("cannot write {}: {}", path.display(), err),
          }));
        }
        applied.originals.push((path, content));
        PatchOutcome::Applied
      } else {
        PatchOutcome::AlreadyClean
      }
    };

    match outcome {
      PatchOutcome::Applied => log::info!("applied metadata patch '{}' for {}", patch.name, version),
      PatchOutcome::AlreadyClean => log::warn!(
        "metadata patch '{}' targets {} but its text is gone; it can be retired",
        patch.name,
        version
      ),
      _ => log::debug!("metadata patch '{}': {:?}", patch.name, outcome),
    }
    outcomes.push((patch.name.clone(), outcome));
  }

  Ok((applied, outcomes))
}
