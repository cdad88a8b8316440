//! depgov CLI - command-line interface for dependency upgrade governance
//!
//! This CLI lets maintainers and CI pipelines:
//! - Gate upgrades on policy, CVE, SBOM, drift and contract evidence
//! - Plan and attempt upgrades through the project resolver
//! - Check packages, versions and upgrades against the policy contract
//! - Find conflicting version constraints
//! - Maintain the security overlay from OSV scans

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

use commands::conflicts::ConflictArgs;
use commands::policy::PolicyCommands;
use commands::run::{GuardArgs, PlannerArgs};
use commands::security::SecurityCommands;
use config::CliConfig;
use depgov_types::RunContext;

/// Exit code for errors that stop a command before it produces a verdict.
const EXIT_ERROR: u8 = 2;

/// depgov CLI application
#[derive(Parser)]
#[command(name = "depgov")]
#[command(about = "Dependency upgrade governance", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to ./depgov.toml when present)
    #[arg(short, long, env = "DEPGOV_CONFIG", global = true)]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Evaluate upgrade risk and fail above the threshold
    Guard {
        #[command(flatten)]
        guard: GuardArgs,
    },

    /// Run the guard, then rank and attempt upgrades
    Plan {
        #[command(flatten)]
        guard: GuardArgs,
        #[command(flatten)]
        planner: PlannerArgs,
        /// Write the plan here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Guard and planner in a single report
    Status {
        #[command(flatten)]
        guard: GuardArgs,
        #[command(flatten)]
        planner: PlannerArgs,
        /// Do not run the planner
        #[arg(long)]
        no_planner: bool,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Query the dependency policy
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },

    /// Detect conflicting version constraints
    Conflicts {
        #[command(flatten)]
        args: ConflictArgs,
    },

    /// Manage the security overlay
    Security {
        #[command(subcommand)]
        command: SecurityCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).without_time())
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(EXIT_ERROR)),
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let ctx = RunContext::new();
    debug!(config = ?config, now = %ctx.now, "depgov starting");

    match cli.command {
        Commands::Guard { guard } => commands::run::guard(guard, &config, &ctx),
        Commands::Plan {
            guard,
            planner,
            output,
        } => commands::run::plan(guard, planner, output, &config, &ctx),
        Commands::Status {
            guard,
            planner,
            no_planner,
            output,
        } => commands::run::status(guard, planner, no_planner, output, &config, &ctx),
        Commands::Policy { command } => commands::policy::execute(command, &config, &ctx),
        Commands::Conflicts { args } => commands::conflicts::execute(args, &config, &ctx),
        Commands::Security { command } => commands::security::execute(command, &config),
    }
}
