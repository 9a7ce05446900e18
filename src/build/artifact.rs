//! Source RPM artifacts and their build identities

use crate::core::error::{BuildError, ReleaseError, ReleaseResult};
use crate::release::version::Variant;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Required file name suffix of a source package
pub const SRPM_SUFFIX: &str = ".src.rpm";

/// A source package on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  path: PathBuf,
}

impl Artifact {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

/// Canonical name-version-release of a build, e.g. `ceph-ansible-3.2.1-1.el7`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BuildIdentity(String);

impl BuildIdentity {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for BuildIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Derive the build identity from an artifact's file name
pub fn identity_of(artifact: &Artifact) -> ReleaseResult<BuildIdentity> {
  let name = artifact.file_name();
  match name.strip_suffix(SRPM_SUFFIX) {
    Some(nvr) if !nvr.is_empty() => Ok(BuildIdentity(nvr.to_string())),
    _ => Err(ReleaseError::Build(BuildError::MalformedArtifactName { name })),
  }
}

/// File name glob for a project's source package for one variant
pub fn artifact_pattern(project: &str, variant: &Variant) -> String {
  format!("{}-*.{}{}", project, variant.name(), SRPM_SUFFIX)
}

/// Find the single artifact matching `project`/`variant` in `dir`
pub fn discover(dir: &Path, project: &str, variant: &Variant) -> ReleaseResult<Artifact> {
  let matches = find_matches(dir, project, variant)?;
  let pattern = artifact_pattern(project, variant);

  match matches.len() {
    0 => Err(ReleaseError::Build(BuildError::ArtifactNotFound { pattern })),
    1 => Ok(Artifact::new(matches.into_iter().next().unwrap_or_default())),
    _ => Err(ReleaseError::Build(BuildError::AmbiguousArtifact { pattern, matches })),
  }
}

/// All files in `dir` matching the artifact pattern, sorted
pub fn find_matches(dir: &Path, project: &str, variant: &Variant) -> ReleaseResult<Vec<PathBuf>> {
  let dir_pattern = glob::Pattern::escape(&dir.to_string_lossy());
  let full = format!("{}/{}", dir_pattern, artifact_pattern(project, variant));

  let mut matches = Vec::new();
  for entry in glob::glob(&full)? {
    let path = entry?;
    if path.is_file() {
      matches.push(path);
    }
  }
  matches.sort();
  Ok(matches)
}
