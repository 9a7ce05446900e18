//! Core engine for cbs-release
//!
//! - **config**: release.toml parsing, built-in defaults and validation
//! - **context**: per-invocation paths and configuration shared by all commands
//! - **error**: error types with contextual help messages and exit codes
//! - **process**: external command execution behind a mockable runner
//! - **vcs**: git access (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod process;
pub mod vcs;
