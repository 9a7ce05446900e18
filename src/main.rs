mod bootstrap;
mod build;
mod cbs;
mod checks;
mod commands;
mod core;
mod pipeline;
mod release;
mod ui;
mod utils;

use clap::{Parser, Subcommand};
use core::context::ReleaseContext;
use core::error::{ReleaseError, print_error};
use std::path::PathBuf;

/// Build ceph-ansible source RPMs and ship them through the CentOS Community Build System
#[derive(Parser)]
#[command(name = "cbs-release")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Configuration file (default: release.toml, .release.toml or .config/release.toml)
  #[arg(long, global = true, env = "CBS_RELEASE_CONFIG")]
  config: Option<PathBuf>,

  /// Checkout to release from
  #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
  dir: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build, submit and tag the release for the latest tag
  Run {
    /// Release this tag instead of the latest `git describe` match
    #[arg(long)]
    tag: Option<String>,
    /// Build only these variants (repeatable, e.g. --dist el8)
    #[arg(long = "dist")]
    dists: Vec<String>,
    /// Submit scratch builds (never imported, never tagged)
    #[arg(long)]
    scratch: bool,
    /// Do not wait for submitted builds to finish (nothing gets tagged)
    #[arg(long)]
    no_wait: bool,
    /// Remove stale source RPMs before building
    #[arg(long)]
    clean: bool,
    /// Skip host provisioning and precondition checks
    #[arg(long)]
    skip_prereqs: bool,
    /// Show the plan without building or calling the build service
    #[arg(long)]
    dry_run: bool,
    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show targets and candidate tags for a tag, without side effects
  Plan {
    /// Plan this tag instead of the latest `git describe` match
    #[arg(long)]
    tag: Option<String>,
    /// Plan only these variants (repeatable)
    #[arg(long = "dist")]
    dists: Vec<String>,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run host precondition checks
  Doctor {
    /// Run thorough checks (authenticates against the build service)
    #[arg(long)]
    thorough: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Install the client package, link the client certificate, cache the CA
  Bootstrap,

  /// Show the effective version rule tables
  Rules {
    /// Output the tables in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let cli = Cli::parse();

  // Context is built once (config, home, certificate env) and shared by all commands
  let ctx = match ReleaseContext::build(&cli.dir, cli.config.as_deref()) {
    Ok(ctx) => ctx,
    Err(err) => handle_error(err),
  };

  let result = match cli.command {
    Commands::Run {
      tag,
      dists,
      scratch,
      no_wait,
      clean,
      skip_prereqs,
      dry_run,
      json,
    } => commands::run_release(
      &ctx,
      commands::RunArgs {
        tag,
        dists,
        scratch,
        no_wait,
        clean,
        skip_prereqs,
        dry_run,
        json,
      },
    ),
    Commands::Plan { tag, dists, json } => commands::run_plan(&ctx, tag, dists, json),
    Commands::Doctor { thorough, json } => commands::run_doctor(&ctx, thorough, json),
    Commands::Bootstrap => commands::run_bootstrap(&ctx),
    Commands::Rules { json } => commands::run_rules(&ctx, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
