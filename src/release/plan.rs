//! Release planning: resolve a tag into per-variant targets and candidate tags
//!
//! A plan has no side effects. `cbs-release plan` prints it, `cbs-release run`
//! executes it.

use super::rules::{BuildTarget, RuleTable};
use super::version::{ResolvedVersion, Variant};
use serde::Serialize;
use std::collections::BTreeSet;

/// Resolves tags against a rule table
pub struct Resolver<'a> {
  marker: &'a str,
  rules: &'a RuleTable,
}

impl<'a> Resolver<'a> {
  pub fn new(marker: &'a str, rules: &'a RuleTable) -> Self {
    Self { marker, rules }
  }

  pub fn resolve_version(&self, tag: &str) -> ResolvedVersion {
    ResolvedVersion::from_tag(tag, self.marker)
  }

  /// Resolve a tag into a full plan
  ///
  /// `dists` overrides the variant table when non-empty.
  pub fn plan(&self, tag: &str, dists: &[Variant]) -> ReleasePlan {
    let version = self.resolve_version(tag);
    let variants = if dists.is_empty() {
      self.rules.variants_for(&version)
    } else {
      dists.to_vec()
    };

    let variants = variants
      .into_iter()
      .map(|variant| VariantPlan {
        target: self.rules.target_for(&version, &variant),
        candidate_tags: self.rules.candidate_tags_for(&version, &variant),
        variant,
      })
      .collect();

    ReleasePlan {
      tag: tag.trim().to_string(),
      version,
      variants,
    }
  }
}

/// What should happen for one distribution variant
#[derive(Debug, Clone, Serialize)]
pub struct VariantPlan {
  pub variant: Variant,
  /// `None` means the variant is skipped
  pub target: Option<BuildTarget>,
  pub candidate_tags: BTreeSet<String>,
}

impl VariantPlan {
  pub fn is_skipped(&self) -> bool {
    self.target.is_none()
  }
}

/// Resolved release plan for one tag
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  pub tag: String,
  pub version: ResolvedVersion,
  pub variants: Vec<VariantPlan>,
}

impl ReleasePlan {
  /// True when no variant has a build target
  pub fn is_noop(&self) -> bool {
    self.variants.iter().all(VariantPlan::is_skipped)
  }
}
