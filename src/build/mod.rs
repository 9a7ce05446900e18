//! Artifact production
//!
//! - **artifact**: source RPM naming, discovery and build identity (NVR)
//! - **builder**: packaging toolchain invocation
//! - **patches**: named, version-scoped metadata workarounds

pub mod artifact;
pub mod builder;
pub mod patches;

pub use builder::{ArtifactBuilder, Built};
