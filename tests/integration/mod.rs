//! Integration tests for cbs-release
//!
//! Every test drives the compiled binary against a temporary git checkout with
//! fake packaging and build service tools. The fakes are POSIX shell scripts.

#![cfg(unix)]

mod helpers;
mod test_doctor;
mod test_rules;
mod test_run;
