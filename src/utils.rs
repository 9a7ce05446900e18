//! Utility functions for path handling

use std::path::{Path, PathBuf};

/// Expand a leading `~` (alone or followed by `/`) against `home`
///
/// Other paths are returned unchanged; `~user` forms are not supported.
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
  if path == "~" {
    return home.to_path_buf();
  }
  match path.strip_prefix("~/") {
    Some(rest) => home.join(rest),
    None => PathBuf::from(path),
  }
}
