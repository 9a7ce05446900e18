//! `rules` command: show the effective rule tables

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::rules::RuleTable;

/// Print the rule tables in effect for this checkout
pub fn run_rules(ctx: &ReleaseContext, json: bool) -> ReleaseResult<()> {
  let rules = &ctx.config.rules;

  if json {
    println!("{}", serde_json::to_string_pretty(rules)?);
    return Ok(());
  }

  match &ctx.config.source {
    Some(path) => println!("📋 Rules from {} (over built-in defaults)", path.display()),
    None => println!("📋 Built-in rules"),
  }
  print_rules(rules);
  Ok(())
}

fn print_rules(rules: &RuleTable) {
  println!();
  println!("  target template: {}", rules.target_template);
  println!("  tag template:    {}", rules.tag_template);
  println!();

  println!("  Targets (first match wins):");
  for rule in &rules.targets {
    let release = rule.release.as_deref().unwrap_or("(retired, not built)");
    println!("    {:<8} {:<14} {}", rule.prefix, filter(&rule.variants), release);
  }
  println!();

  println!("  Candidate tags:");
  for rule in &rules.candidates {
    println!(
      "    {:<8} {:<14} {}",
      rule.prefix,
      filter(&rule.variants),
      rule.releases.join(", ")
    );
  }
  println!();

  println!("  Variants:");
  for rule in &rules.variants {
    let dists: Vec<&str> = rule.dists.iter().map(|d| d.name()).collect();
    println!("    {:<8} {}", rule.prefix, dists.join(", "));
  }
  let defaults: Vec<&str> = rules.default_variants.iter().map(|d| d.name()).collect();
  println!("    {:<8} {}", "(other)", defaults.join(", "));
}

fn filter(variants: &[String]) -> String {
  if variants.is_empty() {
    "any".to_string()
  } else {
    variants.join(", ")
  }
}
