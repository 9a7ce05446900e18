//! Source RPM production via the project's packaging toolchain

use super::artifact::{self, Artifact};
use super::patches::{self, MetadataPatch, PatchOutcome};
use crate::core::config::{ProjectConfig, ToolchainConfig};
use crate::core::error::{BuildError, ReleaseError, ReleaseResult, ResultExt};
use crate::core::process::{CommandLine, CommandRunner};
use crate::release::version::{ResolvedVersion, Variant};
use std::fs;
use std::path::Path;

/// A freshly built source package
#[derive(Debug)]
pub struct Built {
  pub artifact: Artifact,
  /// Metadata patches that were live while the toolchain ran
  pub patches: Vec<String>,
}

/// Runs `make dist`, `make spec` and `rpmbuild -bs` in a checkout
pub struct ArtifactBuilder<'a> {
  runner: &'a dyn CommandRunner,
  root: &'a Path,
  project: &'a ProjectConfig,
  toolchain: &'a ToolchainConfig,
  patches: &'a [MetadataPatch],
}

impl<'a> ArtifactBuilder<'a> {
  pub fn new(
    runner: &'a dyn CommandRunner,
    root: &'a Path,
    project: &'a ProjectConfig,
    toolchain: &'a ToolchainConfig,
    patches: &'a [MetadataPatch],
  ) -> Self {
    Self {
      runner,
      root,
      project,
      toolchain,
      patches,
    }
  }

  /// Build the source package for one variant and return the single artifact
  pub fn build(&self, version: &ResolvedVersion, variant: &Variant) -> ReleaseResult<Built> {
    let (applied, outcomes) = patches::apply_patches(self.root, self.patches, version)?;

    let result = self.run_toolchain(variant);
    applied.restore()?;
    result?;

    let artifact = artifact::discover(self.root, &self.project.name, variant)?;
    log::info!("built {}", artifact.path().display());
    let patches = outcomes
      .into_iter()
      .filter(|(_, outcome)| *outcome == PatchOutcome::Applied)
      .map(|(name, _)| name)
      .collect();
    Ok(Built { artifact, patches })
  }

  /// Remove stale artifacts for a variant, returning how many were deleted
  pub fn clean(&self, variant: &Variant) -> ReleaseResult<usize> {
    let stale = artifact::find_matches(self.root, &self.project.name, variant)?;
    for path in &stale {
      fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
      log::info!("removed stale artifact {}", path.display());
    }
    Ok(stale.len())
  }

  fn run_toolchain(&self, variant: &Variant) -> ReleaseResult<()> {
    for cmd in self.commands(variant) {
      let output = self.runner.stream(&cmd)?;
      if !output.success() {
        return Err(ReleaseError::Build(BuildError::ToolFailure {
          command: cmd.to_string(),
          status: output.status,
          stderr: output.stderr,
        }));
      }
    }
    Ok(())
  }

  /// Toolchain invocations, in order
  pub fn commands(&self, variant: &Variant) -> Vec<CommandLine> {
    let topdir = self.root.to_string_lossy();
    vec![
      CommandLine::new(&self.toolchain.make).arg("dist"),
      CommandLine::new(&self.toolchain.make).args(["spec".to_string(), format!("DIST={}", variant)]),
      CommandLine::new(&self.toolchain.rpmbuild).args([
        "-bs".to_string(),
        self.project.spec_file.clone(),
        "--define".to_string(),
        format!("_topdir {}", topdir),
        "--define".to_string(),
        format!("_sourcedir {}", topdir),
        "--define".to_string(),
        format!("_srcrpmdir {}", topdir),
        "--define".to_string(),
        format!("dist .{}", variant),
      ]),
    ]
  }
}
