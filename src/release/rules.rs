//! Version-prefix rule tables
//!
//! Each upstream release line gets a few rows here, never a new branch of code.
//! Tables are ordered and the first matching row wins, so more specific
//! prefixes (`3.2`) must come before broader ones (`3.`).
//!
//! ```toml
//! [rules]
//! target_template = "storage{major}-ceph-{release}-{variant}"
//! tag_template = "storage{major}-ceph-{release}-candidate"
//! default_variants = ["el7"]
//!
//! [[rules.targets]]
//! prefix = "2."          # no release: retired line, resolves to nothing
//!
//! [[rules.targets]]
//! prefix = "3.2"
//! variants = ["el7"]
//! release = "luminous"
//!
//! [[rules.candidates]]
//! prefix = "3.2"
//! variants = ["el7"]
//! releases = ["luminous", "mimic"]
//!
//! [[rules.variants]]
//! prefix = "4."
//! dists = ["el7", "el8"]
//! ```

use super::version::{ResolvedVersion, Variant};
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());

const PLACEHOLDERS: &[&str] = &["major", "release", "variant"];

/// Maps a version prefix to the release a build target is named after
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRule {
  pub prefix: String,
  /// Variants this rule applies to (empty = all)
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub variants: Vec<String>,
  /// Release codename; `None` marks the line as retired
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub release: Option<String>,
}

/// Maps a version prefix to every release whose candidate repo should carry the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRule {
  pub prefix: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub variants: Vec<String>,
  #[serde(default)]
  pub releases: Vec<String>,
}

/// Maps a version prefix to the distribution variants built for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRule {
  pub prefix: String,
  pub dists: Vec<Variant>,
}

/// A build target identifier, e.g. `storage7-ceph-jewel-el7`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildTarget(String);

impl BuildTarget {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for BuildTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// All version-to-release rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
  pub target_template: String,
  pub tag_template: String,
  #[serde(default)]
  pub default_variants: Vec<Variant>,
  #[serde(default)]
  pub targets: Vec<TargetRule>,
  #[serde(default)]
  pub candidates: Vec<CandidateRule>,
  #[serde(default)]
  pub variants: Vec<VariantRule>,
}

fn admits(filter: &[String], variant: &Variant) -> bool {
  filter.is_empty() || filter.iter().any(|v| v == variant.name())
}

fn render(template: &str, release: &str, variant: &Variant) -> String {
  template
    .replace("{major}", &variant.major().to_string())
    .replace("{release}", release)
    .replace("{variant}", variant.name())
}

impl RuleTable {
  /// Build target for a version/variant pair, `None` when nothing should be built
  pub fn target_for(&self, version: &ResolvedVersion, variant: &Variant) -> Option<BuildTarget> {
    let rule = self
      .targets
      .iter()
      .find(|rule| version.starts_with(&rule.prefix) && admits(&rule.variants, variant))?;

    match &rule.release {
      Some(release) => Some(BuildTarget(render(&self.target_template, release, variant))),
      None => {
        log::info!("version {} matches retired line '{}'", version, rule.prefix);
        None
      }
    }
  }

  /// Candidate tags a completed build for this version/variant should carry
  pub fn candidate_tags_for(&self, version: &ResolvedVersion, variant: &Variant) -> BTreeSet<String> {
    self
      .candidates
      .iter()
      .find(|rule| version.starts_with(&rule.prefix) && admits(&rule.variants, variant))
      .map(|rule| {
        rule
          .releases
          .iter()
          .map(|release| render(&self.tag_template, release, variant))
          .collect()
      })
      .unwrap_or_default()
  }

  /// Variants to build for a version
  pub fn variants_for(&self, version: &ResolvedVersion) -> Vec<Variant> {
    self
      .variants
      .iter()
      .find(|rule| version.starts_with(&rule.prefix))
      .map(|rule| rule.dists.clone())
      .unwrap_or_else(|| self.default_variants.clone())
  }

  /// Validate templates and rule ordering
  pub fn validate(&self) -> ReleaseResult<()> {
    validate_template("target_template", &self.target_template)?;
    validate_template("tag_template", &self.tag_template)?;

    let targets: Vec<(&str, &[String])> = self
      .targets
      .iter()
      .map(|r| (r.prefix.as_str(), r.variants.as_slice()))
      .collect();
    check_reachable("targets", &targets)?;

    let candidates: Vec<(&str, &[String])> = self
      .candidates
      .iter()
      .map(|r| (r.prefix.as_str(), r.variants.as_slice()))
      .collect();
    check_reachable("candidates", &candidates)?;

    let variants: Vec<(&str, &[String])> = self.variants.iter().map(|r| (r.prefix.as_str(), &[][..])).collect();
    check_reachable("variants", &variants)?;

    for rule in &self.targets {
      for name in &rule.variants {
        Variant::parse(name)?;
      }
    }
    for rule in &self.candidates {
      for name in &rule.variants {
        Variant::parse(name)?;
      }
    }

    if let Some(rule) = self.variants.iter().find(|r| r.dists.is_empty()) {
      return Err(invalid(format!("[[rules.variants]] '{}' lists no dists", rule.prefix)));
    }

    Ok(())
  }
}

fn invalid(reason: String) -> ReleaseError {
  ReleaseError::Config(ConfigError::Invalid { reason })
}

fn validate_template(name: &str, template: &str) -> ReleaseResult<()> {
  if template.trim().is_empty() {
    return Err(invalid(format!("{} must not be empty", name)));
  }
  for caps in PLACEHOLDER_RE.captures_iter(template) {
    let key = &caps[1];
    if !PLACEHOLDERS.contains(&key) {
      return Err(invalid(format!(
        "{} uses unknown placeholder '{{{}}}' (known: {})",
        name,
        key,
        PLACEHOLDERS.join(", ")
      )));
    }
  }
  Ok(())
}

/// A row is unreachable when an earlier row's prefix is a prefix of it and the
/// earlier row admits every variant the later one does.
fn check_reachable(table: &str, rows: &[(&str, &[String])]) -> ReleaseResult<()> {
  for (i, (prefix, variants)) in rows.iter().enumerate() {
    if prefix.is_empty() {
      return Err(invalid(format!("[[rules.{}]] entry {} has an empty prefix", table, i + 1)));
    }
    for (earlier_prefix, earlier_variants) in &rows[..i] {
      let covers = earlier_variants.is_empty()
        || (!variants.is_empty() && variants.iter().all(|v| earlier_variants.contains(v)));
      if prefix.starts_with(earlier_prefix) && covers {
        return Err(ReleaseError::Config(ConfigError::UnreachableRule {
          table: table.to_string(),
          prefix: prefix.to_string(),
          shadowed_by: earlier_prefix.to_string(),
        }));
      }
    }
  }
  Ok(())
}
