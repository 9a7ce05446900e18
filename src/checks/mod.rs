//! Host precondition checks
//!
//! # Built-in Checks
//!
//! - **unix-group**: build user belongs to the mock group
//! - **client-package**: the package providing `cbs` is installed
//! - **client-certificate**: the client certificate is in place
//! - **service-ca**: the service CA is cached (warning only)
//! - **service-auth**: `cbs hello` succeeds (expensive: always run by `run`,
//!   by `doctor` only with `--thorough`)

mod certificate;
mod group;
mod package;
mod runner;
mod service;
mod trait_def;

pub use runner::{blocking_failures, create_default_runner, create_membership_runner};
pub use trait_def::{CheckContext, CheckResult, Severity};
