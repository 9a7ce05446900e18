//! CLI commands for cbs-release
//!
//! - **run**: the full release pipeline (preconditions, build, submit, tag)
//! - **plan**: resolve a tag into targets and candidate tags, no side effects
//! - **doctor**: run host precondition checks
//! - **bootstrap**: provision the build host
//! - **rules**: show the effective rule tables
//!
//! All commands accept `&ReleaseContext` built once in `main`.

pub mod bootstrap;
pub mod doctor;
pub mod plan;
pub mod rules;
pub mod run;

pub use bootstrap::run_bootstrap;
pub use doctor::run_doctor;
pub use plan::run_plan;
pub use rules::run_rules;
pub use run::{RunArgs, run_release};
