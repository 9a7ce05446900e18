//! `bootstrap` command: provision the build host

use crate::bootstrap::{download, provision};
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::process::SystemRunner;

/// Install the client package, link the client certificate and cache the CA
pub fn run_bootstrap(ctx: &ReleaseContext) -> ReleaseResult<()> {
  let runner = SystemRunner::new(&ctx.root);
  let provisioned = provision(ctx, &runner, download)?;
  provisioned.print(&ctx.config.bootstrap.package);
  if ctx.cert_source.is_none() {
    println!(
      "⚠️  {} not set; client certificate left as is",
      ctx.config.bootstrap.cert_env
    );
  }
  println!("✨ Host provisioned");
  Ok(())
}
