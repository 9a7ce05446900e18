//! Version resolution
//!
//! Turns a git tag into what should be built and where it should be tagged.
//!
//! - **version**: tag/marker handling and distribution variants
//! - **rules**: ordered version-prefix tables (targets, candidate tags, variants)
//! - **plan**: per-variant resolution of a single tag

pub mod plan;
pub mod rules;
pub mod version;
