//! `plan` command: resolve a tag without side effects

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseResult, ResultExt};
use crate::core::vcs::SystemGit;
use crate::release::plan::{ReleasePlan, Resolver};
use crate::release::version::Variant;

/// Resolve the release plan for `tag` (or the latest matching git tag)
pub fn resolve_plan(ctx: &ReleaseContext, tag: Option<String>, dists: &[String]) -> ReleaseResult<ReleasePlan> {
  let project = &ctx.config.project;
  let tag = match tag {
    Some(tag) => tag,
    None => SystemGit::open(&ctx.root)?
      .latest_tag(&project.tag_match)
      .context("Could not determine the release tag")?,
  };

  let dists = dists
    .iter()
    .map(|d| Variant::parse(d))
    .collect::<ReleaseResult<Vec<_>>>()?;

  let plan = Resolver::new(&project.version_marker, &ctx.config.rules).plan(&tag, &dists);
  log::info!("resolved {} to version {}", plan.tag, plan.version);
  Ok(plan)
}

/// Human-readable plan
pub fn print_plan(plan: &ReleasePlan) {
  println!("📦 Release plan for {} (version {})", plan.tag, plan.version);
  println!();
  for variant in &plan.variants {
    match &variant.target {
      Some(target) => {
        println!("  {} → {}", variant.variant, target);
        if variant.candidate_tags.is_empty() {
          println!("      tags: (none)");
        } else {
          for tag in &variant.candidate_tags {
            println!("      tag:  {}", tag);
          }
        }
      }
      None => println!("  {} → skipped (no build target)", variant.variant),
    }
  }
  println!();
}

/// Run the plan command
pub fn run_plan(ctx: &ReleaseContext, tag: Option<String>, dists: Vec<String>, json: bool) -> ReleaseResult<()> {
  let plan = resolve_plan(ctx, tag, &dists)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&plan)?);
  } else {
    print_plan(&plan);
    if plan.is_noop() {
      println!("⏭️  Nothing to build for {}", plan.version);
    }
  }
  Ok(())
}
