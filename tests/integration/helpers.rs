//! Test helpers for integration tests
//!
//! A [`TestCheckout`] is a throwaway git repository plus a `bin/` directory of
//! shell-script stand-ins for `make`, `rpmbuild`, `rpm` and `cbs`. The fakes
//! append every invocation to `calls.log` and keep remote build state (which
//! builds exist, which tags they carry) as files in a state directory.

use anyhow::{Context, Result};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FAKE_MAKE: &str = r#"#!/bin/sh
echo "make $*" >> "$FAKE_STATE/calls.log"
exit "${FAKE_MAKE_EXIT:-0}"
"#;

const FAKE_RPMBUILD: &str = r#"#!/bin/sh
echo "rpmbuild $*" >> "$FAKE_STATE/calls.log"
dist=""
for a in "$@"; do
  case "$a" in
    "dist ."*) dist="${a#dist .}" ;;
  esac
done
touch "ceph-ansible-${FAKE_VERSION}-1.${dist}.src.rpm"
"#;

const FAKE_RPM: &str = r#"#!/bin/sh
echo "rpm $*" >> "$FAKE_STATE/calls.log"
for a in "$@"; do pkg="$a"; done
echo "${pkg}-0.7.0-1.el7.noarch"
"#;

const FAKE_CBS: &str = r#"#!/bin/sh
echo "cbs $*" >> "$FAKE_STATE/calls.log"
cmd="$1"; shift
case "$cmd" in
  buildinfo)
    if [ -e "$FAKE_STATE/built-$1" ]; then
      printf 'BUILD: %s [1234]\nState: COMPLETE\n' "$1"
    else
      echo "No such build: $1"
    fi
    ;;
  build)
    for a in "$@"; do last="$a"; done
    nvr=$(basename "$last" .src.rpm)
    case " $* " in
      *" --scratch "*) ;;
      *) touch "$FAKE_STATE/built-$nvr" ;;
    esac
    ;;
  list-tags)
    cat "$FAKE_STATE/tags-$2" 2>/dev/null || true
    ;;
  tag-build)
    echo "$1" >> "$FAKE_STATE/tags-$2"
    ;;
  hello)
    if [ "${FAKE_HELLO_EXIT:-0}" != 0 ]; then
      echo "AuthError: certificate expired" >&2
      exit "$FAKE_HELLO_EXIT"
    fi
    echo "olá, jenkins!"
    ;;
esac
"#;

/// A git checkout with fake packaging and build service tools on PATH
pub struct TestCheckout {
  _root: TempDir,
  pub path: PathBuf,
  pub state: PathBuf,
  pub home: PathBuf,
  bin: PathBuf,
}

impl TestCheckout {
  /// Create a checkout with one commit and no tags
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("ceph-ansible");
    let state = root.path().join("state");
    let home = root.path().join("home");
    let bin = root.path().join("bin");
    for dir in [&path, &state, &home, &bin] {
      std::fs::create_dir_all(dir)?;
    }

    install_script(&bin, "make", FAKE_MAKE)?;
    install_script(&bin, "rpmbuild", FAKE_RPMBUILD)?;
    install_script(&bin, "rpm", FAKE_RPM)?;
    install_script(&bin, "cbs", FAKE_CBS)?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    std::fs::write(path.join("Makefile"), "dist:\n\nspec:\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial commit"])?;

    Ok(Self {
      _root: root,
      path,
      state,
      home,
      bin,
    })
  }

  /// Create a checkout with `tag` on HEAD
  pub fn tagged(tag: &str) -> Result<Self> {
    let checkout = Self::new()?;
    checkout.tag(tag)?;
    Ok(checkout)
  }

  pub fn tag(&self, tag: &str) -> Result<()> {
    git(&self.path, &["tag", tag])?;
    Ok(())
  }

  /// Commit an empty change so later tags land on a new commit
  pub fn commit(&self, message: &str) -> Result<()> {
    git(&self.path, &["commit", "--allow-empty", "-m", message])?;
    Ok(())
  }

  pub fn write_file(&self, name: &str, content: &str) -> Result<()> {
    std::fs::write(self.path.join(name), content)?;
    Ok(())
  }

  pub fn file_exists(&self, name: &str) -> bool {
    self.path.join(name).exists()
  }

  /// Pretend the build service already holds a completed build
  pub fn mark_built(&self, nvr: &str) -> Result<()> {
    std::fs::write(self.state.join(format!("built-{}", nvr)), "")?;
    Ok(())
  }

  /// Set the tags the build service reports for a build
  pub fn set_tags(&self, nvr: &str, tags: &[&str]) -> Result<()> {
    let mut content = tags.join("\n");
    content.push('\n');
    std::fs::write(self.state.join(format!("tags-{}", nvr)), content)?;
    Ok(())
  }

  pub fn tags_of(&self, nvr: &str) -> Vec<String> {
    std::fs::read_to_string(self.state.join(format!("tags-{}", nvr)))
      .unwrap_or_default()
      .lines()
      .map(String::from)
      .collect()
  }

  /// Every fake tool invocation so far, in order
  pub fn calls(&self) -> Vec<String> {
    std::fs::read_to_string(self.state.join("calls.log"))
      .unwrap_or_default()
      .lines()
      .map(String::from)
      .collect()
  }

  pub fn calls_to(&self, prefix: &str) -> Vec<String> {
    self.calls().into_iter().filter(|c| c.starts_with(prefix)).collect()
  }

  pub fn clear_calls(&self) -> Result<()> {
    let log = self.state.join("calls.log");
    if log.exists() {
      std::fs::remove_file(log)?;
    }
    Ok(())
  }

  /// Command for the binary with the fake tools first on PATH
  pub fn command(&self, version: &str, args: &[&str]) -> Command {
    let path = std::env::var("PATH").unwrap_or_default();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cbs-release"));
    cmd
      .arg("-C")
      .arg(&self.path)
      .args(args)
      .env("PATH", format!("{}:{}", self.bin.display(), path))
      .env("HOME", &self.home)
      .env("FAKE_STATE", &self.state)
      .env("FAKE_VERSION", version)
      .env_remove("CENTOS_CERT")
      .env_remove("CBS_RELEASE_CONFIG")
      .env_remove("RUST_LOG");
    cmd
  }

  /// Run the binary, returning its output whatever the exit status
  pub fn run(&self, version: &str, args: &[&str]) -> Result<Output> {
    self
      .command(version, args)
      .output()
      .context("Failed to run cbs-release")
  }

  /// Run the binary and require success
  pub fn run_ok(&self, version: &str, args: &[&str]) -> Result<Output> {
    let output = self.run(version, args)?;
    if !output.status.success() {
      anyhow::bail!(
        "cbs-release {} failed\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
      );
    }
    Ok(output)
  }
}

fn install_script(bin: &Path, name: &str, body: &str) -> Result<()> {
  let path = bin.join(name);
  std::fs::write(&path, body)?;
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
  Ok(())
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

pub fn stdout_json(output: &Output) -> Result<serde_json::Value> {
  serde_json::from_slice(&output.stdout).with_context(|| {
    format!(
      "stdout is not JSON:\n{}",
      String::from_utf8_lossy(&output.stdout)
    )
  })
}
