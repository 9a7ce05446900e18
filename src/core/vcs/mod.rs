//! Source control access
//!
//! Only the release tag is read from git; everything else about the checkout
//! comes from the packaging toolchain.

pub mod system_git;

pub use system_git::SystemGit;
