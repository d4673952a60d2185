//! verdict - Multi-Checker Aggregation CLI
//!
//! The `verdict` command runs every applicable checker backend over a
//! resolved target set and reports one deterministic verdict.
//!
//! ## Commands
//!
//! - `check`: run the check goal over a run manifest
//! - `typecheck`: deprecated alias for `check`

mod manifest;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manifest::RunManifest;
use verdict_core::{
    run_check, warn_deprecated_goal_alias, NonEmptySources, StderrConsole, Workspace,
};

#[derive(Parser)]
#[command(name = "verdict")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-checker aggregation and reporting", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every applicable checker and aggregate one exit status
    Check(CheckArgs),

    /// Deprecated alias for `check`
    #[command(hide = true)]
    Typecheck(CheckArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Run manifest listing targets and checkers (JSON)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Directory report artifacts are written beneath
    #[arg(long, default_value = "dist")]
    output_root: PathBuf,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs share stderr with the status block; stdout stays clean for
    // machine consumers.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().try_init().ok();
    } else {
        builder.try_init().ok();
    }
}

async fn run(args: &CheckArgs) -> Result<i32> {
    let manifest = RunManifest::load(&args.manifest)?;
    let registry = manifest.build_registry()?;
    let engine = manifest.build_engine();
    let targets = manifest.to_targets();
    tracing::debug!(
        targets = targets.len(),
        checkers = registry.len(),
        manifest = %args.manifest.display(),
        "run manifest loaded"
    );

    let workspace = Workspace::new(&args.output_root);
    let mut console = StderrConsole::new();

    let run = run_check(
        &registry,
        &targets,
        &NonEmptySources::new(),
        &engine,
        &workspace,
        &mut console,
    )
    .await
    .context("check goal failed")?;

    Ok(run.exit_code)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    let args = match &cli.command {
        Commands::Check(args) => args,
        Commands::Typecheck(args) => {
            warn_deprecated_goal_alias();
            args
        }
    };

    let exit_code = run(args).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
