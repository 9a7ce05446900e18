//! Parsers for koji-style CLI output

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static BUILD_LINE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^BUILD:\s+(\S+)(?:\s+\[(\d+)\])?\s*$").unwrap());
static STATE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^State:\s+(\S+)\s*$").unwrap());

/// Remote build states as reported by `buildinfo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
  Building,
  Complete,
  Deleted,
  Failed,
  Canceled,
  Other(String),
}

impl BuildState {
  fn parse(value: &str) -> Self {
    match value.to_ascii_uppercase().as_str() {
      "BUILDING" => BuildState::Building,
      "COMPLETE" => BuildState::Complete,
      "DELETED" => BuildState::Deleted,
      "FAILED" => BuildState::Failed,
      "CANCELED" => BuildState::Canceled,
      _ => BuildState::Other(value.to_string()),
    }
  }
}

impl fmt::Display for BuildState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildState::Building => write!(f, "BUILDING"),
      BuildState::Complete => write!(f, "COMPLETE"),
      BuildState::Deleted => write!(f, "DELETED"),
      BuildState::Failed => write!(f, "FAILED"),
      BuildState::Canceled => write!(f, "CANCELED"),
      BuildState::Other(s) => write!(f, "{}", s),
    }
  }
}

/// The parts of `buildinfo` output we care about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
  pub nvr: String,
  pub build_id: Option<u64>,
  pub state: BuildState,
}

/// True when the service says the build does not exist
pub fn is_missing_build(output: &str) -> bool {
  output.contains("No such build")
}

/// Parse `buildinfo` output, `None` if it does not describe a build
pub fn parse_buildinfo(output: &str) -> Option<BuildInfo> {
  if is_missing_build(output) {
    return None;
  }

  let build = BUILD_LINE_RE.captures(output)?;
  let state = STATE_LINE_RE
    .captures(output)
    .map(|caps| BuildState::parse(&caps[1]))
    .unwrap_or_else(|| BuildState::Other("UNKNOWN".to_string()));

  Some(BuildInfo {
    nvr: build[1].to_string(),
    build_id: build.get(2).and_then(|id| id.as_str().parse().ok()),
    state,
  })
}

/// Parse `list-tags --build` output: one tag per line
pub fn parse_tag_list(output: &str) -> BTreeSet<String> {
  output
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .filter_map(|line| line.split_whitespace().next())
    .map(str::to_string)
    .collect()
}
