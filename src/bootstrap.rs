//! Build host provisioning
//!
//! Idempotent setup run before every release (and by `cbs-release bootstrap`):
//! install the build service client, point the client certificate at the one
//! Jenkins provides, and cache the service CA.

use crate::core::context::ReleaseContext;
use crate::core::error::{BuildError, ReleaseError, ReleaseResult, ResultExt};
use crate::core::process::{CommandLine, CommandRunner};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Whether `ensure_package` had to install anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
  AlreadyInstalled,
  Installed,
}

/// Install `package` with yum unless rpm already knows it
pub fn ensure_package(runner: &dyn CommandRunner, package: &str) -> ReleaseResult<PackageStatus> {
  let query = runner.run(&CommandLine::new("rpm").args(["-qv", package]))?;
  if query.success() {
    log::info!("{} installed: {}", package, query.stdout.trim());
    return Ok(PackageStatus::AlreadyInstalled);
  }

  let install = CommandLine::new("sudo").args(["yum", "-y", "install", package]);
  let output = runner.stream(&install)?;
  if !output.success() {
    return Err(ReleaseError::Build(BuildError::ToolFailure {
      command: install.to_string(),
      status: output.status,
      stderr: output.stderr,
    }));
  }
  Ok(PackageStatus::Installed)
}

/// Replace `link` with a symlink to `source`
///
/// A missing `link` is fine; any other removal error is fatal.
pub fn link_client_cert(source: &Path, link: &Path) -> ReleaseResult<()> {
  match fs::remove_file(link) {
    Ok(()) => log::debug!("removed old {}", link.display()),
    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
    Err(err) => return Err(err).with_context(|| format!("Failed to remove {}", link.display())),
  }

  symlink(source, link).with_context(|| format!("Failed to link {} to {}", link.display(), source.display()))
}

#[cfg(unix)]
fn symlink(source: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(source, link)
}

#[cfg(not(unix))]
fn symlink(_source: &Path, _link: &Path) -> io::Result<()> {
  Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks require a Unix host"))
}

/// Write the CA to `path` unless it is already cached
///
/// Returns true when it was downloaded.
pub fn ensure_ca<F>(url: &str, path: &Path, fetch: F) -> ReleaseResult<bool>
where
  F: FnOnce(&str) -> ReleaseResult<Vec<u8>>,
{
  if path.exists() {
    log::debug!("{} already cached", path.display());
    return Ok(false);
  }

  let body = fetch(url)?;
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(true)
}

/// Download a URL with a blocking client
pub fn download(url: &str) -> ReleaseResult<Vec<u8>> {
  log::info!("downloading {}", url);
  let response = reqwest::blocking::get(url)
    .and_then(|r| r.error_for_status())
    .with_context(|| format!("Download of {} failed", url))?;
  let bytes = response.bytes().context("Failed to read response body")?;
  Ok(bytes.to_vec())
}

/// What `provision` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
  pub package: PackageStatus,
  /// Certificate link and its target, when the env var was set
  pub cert_link: Option<(PathBuf, PathBuf)>,
  /// CA cache path, when it had to be downloaded
  pub ca_downloaded: Option<PathBuf>,
}

impl Provisioned {
  /// Status lines for the job log
  pub fn print(&self, package: &str) {
    match self.package {
      PackageStatus::AlreadyInstalled => println!("✅ {} already installed", package),
      PackageStatus::Installed => println!("📥 Installed {}", package),
    }
    if let Some((link, source)) = &self.cert_link {
      println!("🔑 {} -> {}", link.display(), source.display());
    }
    if let Some(path) = &self.ca_downloaded {
      println!("📥 Cached service CA at {}", path.display());
    }
  }
}

/// Run every provisioning step for this host
pub fn provision<F>(ctx: &ReleaseContext, runner: &dyn CommandRunner, fetch: F) -> ReleaseResult<Provisioned>
where
  F: FnOnce(&str) -> ReleaseResult<Vec<u8>>,
{
  let bootstrap = &ctx.config.bootstrap;
  let package = ensure_package(runner, &bootstrap.package)?;

  let cert_path = ctx.cert_path()?;
  let cert_link = match &ctx.cert_source {
    Some(source) => {
      link_client_cert(source, &cert_path)?;
      Some((cert_path, source.clone()))
    }
    None => {
      log::info!("{} not set, leaving {} alone", bootstrap.cert_env, cert_path.display());
      None
    }
  };

  let ca_path = ctx.ca_path()?;
  let ca_downloaded = ensure_ca(&bootstrap.ca_url, &ca_path, fetch)?.then_some(ca_path);

  Ok(Provisioned {
    package,
    cert_link,
    ca_downloaded,
  })
}
