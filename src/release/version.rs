//! Version and distribution variant types

use crate::core::error::{ReleaseError, ReleaseResult, ValidationError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static VARIANT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^el([0-9]+)$").unwrap());

/// A tag with its leading version marker removed, e.g. `v3.2.1` -> `3.2.1`
///
/// Only ever compared by prefix, so pre-release tags such as `3.0.0rc7`
/// are fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedVersion(String);

impl ResolvedVersion {
  /// Strip `marker` from the front of `tag`. A tag without the marker is kept as-is.
  pub fn from_tag(tag: &str, marker: &str) -> Self {
    let tag = tag.trim();
    let stripped = if marker.is_empty() {
      tag
    } else {
      tag.strip_prefix(marker).unwrap_or(tag)
    };
    Self(stripped.to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn starts_with(&self, prefix: &str) -> bool {
    self.0.starts_with(prefix)
  }
}

impl fmt::Display for ResolvedVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Distribution variant such as `el7`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Variant {
  name: String,
  major: u32,
}

impl Variant {
  pub fn parse(value: &str) -> ReleaseResult<Self> {
    let value = value.trim();
    let major = VARIANT_RE
      .captures(value)
      .and_then(|caps| caps[1].parse::<u32>().ok())
      .ok_or_else(|| {
        ReleaseError::Validation(ValidationError::InvalidVariant {
          value: value.to_string(),
        })
      })?;

    Ok(Self {
      name: value.to_string(),
      major,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// OS major release, `7` for `el7`
  pub fn major(&self) -> u32 {
    self.major
  }
}

impl fmt::Display for Variant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name)
  }
}

impl TryFrom<String> for Variant {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Variant::parse(&value).map_err(|e| e.to_string())
  }
}

impl From<Variant> for String {
  fn from(variant: Variant) -> Self {
    variant.name
  }
}
