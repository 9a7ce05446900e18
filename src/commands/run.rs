//! `run` command: the full release pipeline

use super::plan::{print_plan, resolve_plan};
use crate::bootstrap;
use crate::build::ArtifactBuilder;
use crate::cbs::CbsClient;
use crate::checks::{CheckContext, create_default_runner, create_membership_runner};
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::process::{CommandRunner, SystemRunner};
use crate::pipeline::{Orchestrator, RunOptions, RunReport, VariantState};

/// Flags of `cbs-release run`
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
  pub tag: Option<String>,
  pub dists: Vec<String>,
  pub scratch: bool,
  pub no_wait: bool,
  pub clean: bool,
  pub skip_prereqs: bool,
  pub dry_run: bool,
  pub json: bool,
}

/// Run the release pipeline
pub fn run_release(ctx: &ReleaseContext, args: RunArgs) -> ReleaseResult<()> {
  let plan = resolve_plan(ctx, args.tag.clone(), &args.dists)?;

  if args.dry_run {
    if args.json {
      println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
      print_plan(&plan);
      println!("🔍 Dry-run mode (nothing built or submitted)");
    }
    return Ok(());
  }

  let runner = SystemRunner::new(&ctx.root);
  let say = |line: String| {
    if !args.json {
      println!("{}", line);
    }
  };

  if plan.is_noop() {
    log::info!("no variant of {} has a build target, skipping preconditions", plan.version);
  } else if args.skip_prereqs {
    say("⚠️  Skipping host preconditions".to_string());
  } else {
    ensure_prereqs(ctx, &runner, args.json)?;
  }

  let config = &ctx.config;
  let builder = ArtifactBuilder::new(&runner, &ctx.root, &config.project, &config.toolchain, &config.patches);
  let scratch = args.scratch || config.service.scratch;
  let client = CbsClient::new(&runner, &config.service.program, scratch);
  let options = RunOptions {
    clean: args.clean,
    wait: config.service.wait && !args.no_wait,
    scratch,
    quiet: args.json,
  };

  say(format!("🚀 Releasing {} (version {})", plan.tag, plan.version));
  let mut report = RunReport::new(&plan);
  let result = Orchestrator::new(&builder, &client, options).execute(&plan, &mut report);

  if args.json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else if report.succeeded() {
    let skipped = report
      .variants
      .iter()
      .filter(|v| v.state == VariantState::Skipped)
      .count();
    println!();
    println!(
      "✨ {} variant(s) released, {} skipped",
      report.variants.len() - skipped,
      skipped
    );
  }
  result
}

/// Check group membership, provision the host, then refuse to continue if
/// any blocking check fails
///
/// Authentication against the build service is part of the gate, so an
/// expired certificate stops the run before anything is built.
fn ensure_prereqs(ctx: &ReleaseContext, runner: &dyn CommandRunner, quiet: bool) -> ReleaseResult<()> {
  let check_ctx = CheckContext {
    runner,
    home: ctx.home.as_deref(),
    config: &ctx.config,
    thorough: true,
  };
  create_membership_runner().enforce(&check_ctx)?;

  let provisioned = bootstrap::provision(ctx, runner, bootstrap::download)?;
  if !quiet {
    provisioned.print(&ctx.config.bootstrap.package);
  }

  let results = create_default_runner().enforce(&check_ctx)?;
  if !quiet {
    for result in results.iter().filter(|r| !r.passed) {
      println!("⚠️  {}: {}", result.check_name, result.message);
    }
    println!("✅ Host preconditions satisfied");
  }
  Ok(())
}
