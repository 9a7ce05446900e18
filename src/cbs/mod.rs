//! Community Build System (koji) client
//!
//! The build service is an opaque collaborator reached only through its
//! command line client. [`BuildService`] is the seam the release pipeline
//! depends on; [`CbsClient`] is the real implementation.

pub mod client;
pub mod parse;

pub use client::{BuildService, CbsClient, CompletedBuildRef, Submission};
