//! Release pipeline: per-variant state machine
//!
//! ```text
//! Resolving -> Building -> CheckingExisting -> [Submitting] -> Tagging -> Done
//!     |
//!     +-> Skipped                      (any state) -> Aborted
//! ```
//!
//! Variants are processed sequentially in plan order. The first failure aborts
//! the run; later variants are not attempted. Re-running after a partial
//! failure is safe: a completed build is reused instead of resubmitted and
//! only missing tags are applied.

use crate::build::artifact::{BuildIdentity, identity_of};
use crate::build::{ArtifactBuilder, Built};
use crate::cbs::{BuildService, CompletedBuildRef, Submission};
use crate::core::error::ReleaseResult;
use crate::release::plan::{ReleasePlan, VariantPlan};
use crate::release::rules::BuildTarget;
use crate::release::version::{ResolvedVersion, Variant};
use crate::ui::progress::TagProgress;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a variant is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantState {
  Resolving,
  Building,
  CheckingExisting,
  Submitting,
  Tagging,
  Done,
  Skipped,
  Aborted,
}

impl VariantState {
  pub fn is_success(self) -> bool {
    matches!(self, VariantState::Done | VariantState::Skipped)
  }
}

/// Knobs for a pipeline run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
  /// Remove stale artifacts before building
  pub clean: bool,
  /// Block until submitted builds finish
  pub wait: bool,
  /// Builds are scratch builds; nothing gets tagged
  pub scratch: bool,
  /// No status lines or progress bars (stdout carries JSON)
  pub quiet: bool,
}

impl Default for RunOptions {
  fn default() -> Self {
    Self {
      clean: false,
      wait: true,
      scratch: false,
      quiet: false,
    }
  }
}

/// What happened to one variant
#[derive(Debug, Clone, Serialize)]
pub struct VariantOutcome {
  pub variant: Variant,
  pub target: Option<BuildTarget>,
  pub artifact: Option<String>,
  pub identity: Option<BuildIdentity>,
  pub build_id: Option<u64>,
  /// An existing completed build was used instead of submitting
  pub reused: bool,
  /// Metadata patches live during the build
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub patches_applied: Vec<String>,
  pub tags_applied: Vec<String>,
  pub tags_present: Vec<String>,
  pub state: VariantState,
  pub note: Option<String>,
  pub error: Option<String>,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
}

impl VariantOutcome {
  fn start(plan: &VariantPlan) -> Self {
    Self {
      variant: plan.variant.clone(),
      target: plan.target.clone(),
      artifact: None,
      identity: None,
      build_id: None,
      reused: false,
      patches_applied: Vec::new(),
      tags_applied: Vec::new(),
      tags_present: Vec::new(),
      state: VariantState::Resolving,
      note: None,
      error: None,
      started_at: Utc::now(),
      finished_at: None,
    }
  }

  fn finish(&mut self, state: VariantState) {
    self.state = state;
    self.finished_at = Some(Utc::now());
  }
}

/// Outcome of a whole run, printed by `run --json`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub tag: String,
  pub version: ResolvedVersion,
  pub variants: Vec<VariantOutcome>,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
  pub fn new(plan: &ReleasePlan) -> Self {
    Self {
      tag: plan.tag.clone(),
      version: plan.version.clone(),
      variants: Vec::new(),
      started_at: Utc::now(),
      finished_at: None,
    }
  }

  /// True when every attempted variant ended `Done` or `Skipped`
  pub fn succeeded(&self) -> bool {
    self.variants.iter().all(|v| v.state.is_success())
  }
}

/// Sequences builder and build service for every variant of a plan
pub struct Orchestrator<'a> {
  builder: &'a ArtifactBuilder<'a>,
  service: &'a dyn BuildService,
  options: RunOptions,
}

impl<'a> Orchestrator<'a> {
  pub fn new(builder: &'a ArtifactBuilder<'a>, service: &'a dyn BuildService, options: RunOptions) -> Self {
    Self {
      builder,
      service,
      options,
    }
  }

  /// Execute a plan, recording outcomes into `report`
  ///
  /// Stops at the first failing variant and returns its error; the report
  /// still holds everything that happened up to that point.
  pub fn execute(&self, plan: &ReleasePlan, report: &mut RunReport) -> ReleaseResult<()> {
    for variant_plan in &plan.variants {
      let mut outcome = VariantOutcome::start(variant_plan);
      let result = self.run_variant(&plan.version, variant_plan, &mut outcome);

      if let Err(err) = result {
        log::info!("{}: aborted in state {:?}", variant_plan.variant, outcome.state);
        outcome.error = Some(err.to_string());
        outcome.finish(VariantState::Aborted);
        report.variants.push(outcome);
        report.finished_at = Some(Utc::now());
        return Err(err);
      }
      report.variants.push(outcome);
    }

    report.finished_at = Some(Utc::now());
    Ok(())
  }

  fn run_variant(
    &self,
    version: &ResolvedVersion,
    plan: &VariantPlan,
    outcome: &mut VariantOutcome,
  ) -> ReleaseResult<()> {
    let variant = &plan.variant;

    let Some(target) = &plan.target else {
      self.status(format_args!("⏭️  {}: no build target for {}, skipping", variant, version));
      outcome.note = Some(format!("no build target for {}", version));
      outcome.finish(VariantState::Skipped);
      return Ok(());
    };

    outcome.state = VariantState::Building;
    if self.options.clean {
      let removed = self.builder.clean(variant)?;
      if removed > 0 {
        self.status(format_args!("🧹 {}: removed {} stale artifact(s)", variant, removed));
      }
    }
    self.status(format_args!("📦 {}: building source package", variant));
    let Built { artifact, patches } = self.builder.build(version, variant)?;
    outcome.patches_applied = patches;
    let identity = identity_of(&artifact)?;
    outcome.artifact = Some(artifact.file_name());
    outcome.identity = Some(identity.clone());

    outcome.state = VariantState::CheckingExisting;
    let build = match self.service.existing_build(&identity)? {
      Some(build) => {
        self.status(format_args!("♻️  {}: {} already built, not resubmitting", variant, identity));
        outcome.reused = true;
        build
      }
      None => {
        outcome.state = VariantState::Submitting;
        self.status(format_args!("🚀 {}: submitting {} to {}", variant, artifact.file_name(), target));
        match self.service.submit(target, &artifact, self.options.wait)? {
          Submission::Completed(build) => {
            self.status(format_args!("✅ {}: {} built", variant, identity));
            build
          }
          Submission::Scratch => {
            outcome.note = Some("scratch build, not tagged".to_string());
            self.status(format_args!("✅ {}: scratch build finished, not tagging", variant));
            outcome.finish(VariantState::Done);
            return Ok(());
          }
          Submission::Pending => {
            outcome.note = Some("submitted without waiting, not tagged".to_string());
            self.status(format_args!("✅ {}: submitted without waiting, not tagging", variant));
            outcome.finish(VariantState::Done);
            return Ok(());
          }
        }
      }
    };
    outcome.build_id = build.build_id;

    if self.options.scratch {
      outcome.note = Some("scratch mode, not tagged".to_string());
      outcome.finish(VariantState::Done);
      return Ok(());
    }

    outcome.state = VariantState::Tagging;
    self.apply_missing_tags(variant, &build, plan, outcome)?;
    outcome.finish(VariantState::Done);
    Ok(())
  }

  fn status(&self, line: std::fmt::Arguments<'_>) {
    if !self.options.quiet {
      println!("{}", line);
    }
  }

  /// Apply candidate tags the build does not carry yet
  fn apply_missing_tags(
    &self,
    variant: &Variant,
    build: &CompletedBuildRef,
    plan: &VariantPlan,
    outcome: &mut VariantOutcome,
  ) -> ReleaseResult<()> {
    if plan.candidate_tags.is_empty() {
      log::info!("{}: no candidate tags for {}", variant, build.nvr);
      return Ok(());
    }

    let present = self.service.tags_of(&build.nvr)?;
    outcome.tags_present = plan.candidate_tags.intersection(&present).cloned().collect();
    let missing: Vec<&String> = plan.candidate_tags.difference(&present).collect();

    if missing.is_empty() {
      self.status(format_args!("🏷️  {}: {} already carries every candidate tag", variant, build.nvr));
      return Ok(());
    }

    let mut progress = (!self.options.quiet).then(|| TagProgress::new(missing.len(), format!("Tagging {}", build.nvr)));
    for tag in missing {
      self.service.apply_tag(&build.nvr, tag)?;
      log::info!("tagged {} into {}", build.nvr, tag);
      outcome.tags_applied.push(tag.clone());
      if let Some(progress) = progress.as_mut() {
        progress.inc();
      }
    }
    self.status(format_args!("🏷️  {}: applied {}", variant, outcome.tags_applied.join(", ")));
    Ok(())
  }
}
