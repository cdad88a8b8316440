//! Guard, plan and status commands

use anyhow::Context;
use clap::Args;
use depgov_guard::{GuardConfig, GuardRun, UpgradeGuard};
use depgov_planner::{PlannerConfig, PlannerError, UpgradePlanner};
use depgov_status::{run_dependency_status, StatusConfig};
use depgov_types::{RiskLevel, RunContext};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::CliConfig;
use crate::output::{colorize_risk, emit_json, print_error, print_success, print_warning};

/// Evidence inputs and guard outputs
#[derive(Args, Debug, Clone, Default)]
pub struct GuardArgs {
    /// Preflight report (JSON)
    #[arg(long)]
    pub preflight: Option<PathBuf>,

    /// OSV scan results (JSON)
    #[arg(long)]
    pub cve_scan: Option<PathBuf>,

    /// CycloneDX-style SBOM (JSON)
    #[arg(long)]
    pub sbom: Option<PathBuf>,

    /// Policy contract (TOML)
    #[arg(long)]
    pub contract: Option<PathBuf>,

    /// Package metadata (JSON)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Lowest risk that fails the run (safe, needs-review, blocked)
    #[arg(long)]
    pub fail_threshold: Option<RiskLevel>,

    /// Guard JSON report path [default: <outputs.dir>/guard-report.json]
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Guard Markdown report path [default: <outputs.dir>/guard-report.md]
    #[arg(long)]
    pub markdown_output: Option<PathBuf>,
}

impl GuardArgs {
    pub fn to_config(&self, config: &CliConfig) -> GuardConfig {
        let inputs = &config.inputs;
        let pick = |flag: &Option<PathBuf>, default: &Option<PathBuf>| flag.clone().or_else(|| default.clone());
        GuardConfig {
            preflight: pick(&self.preflight, &inputs.preflight),
            cve_scan: pick(&self.cve_scan, &inputs.cve_scan),
            sbom: pick(&self.sbom, &inputs.sbom),
            contract: pick(&self.contract, &inputs.contract),
            metadata: pick(&self.metadata, &inputs.metadata),
            fail_threshold: self
                .fail_threshold
                .or(config.guard.fail_threshold)
                .unwrap_or(RiskLevel::Blocked),
            json_output: Some(
                self.json_output
                    .clone()
                    .unwrap_or_else(|| config.outputs.guard_json_path()),
            ),
            markdown_output: Some(
                self.markdown_output
                    .clone()
                    .unwrap_or_else(|| config.outputs.guard_markdown_path()),
            ),
        }
    }
}

/// Upgrade planner settings
#[derive(Args, Debug, Clone, Default)]
pub struct PlannerArgs {
    /// Stop after this many successful upgrades
    #[arg(long)]
    pub limit: Option<usize>,

    /// Attempt major version upgrades
    #[arg(long)]
    pub allow_major: bool,

    /// Score candidates without invoking the resolver
    #[arg(long)]
    pub skip_resolver: bool,

    /// Per-attempt resolver timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Resolver command template with {package} and {version} placeholders
    #[arg(long = "command")]
    pub command_template: Option<String>,

    /// Restrict planning to these packages (repeatable)
    #[arg(long = "package")]
    pub packages: Vec<String>,
}

impl PlannerArgs {
    pub fn to_config(&self, config: &CliConfig) -> PlannerConfig {
        let defaults = &config.planner;
        let mut planner = PlannerConfig::new()
            .with_allow_major(self.allow_major || defaults.allow_major.unwrap_or(false))
            .with_skip_resolver(self.skip_resolver);
        if let Some(limit) = self.limit.or(defaults.limit) {
            planner = planner.with_limit(limit);
        }
        if let Some(secs) = self.timeout.or(defaults.timeout_secs) {
            planner = planner.with_timeout(Duration::from_secs(secs));
        }
        if let Some(template) = self.command_template.clone().or_else(|| defaults.command.clone()) {
            planner = planner.with_command_template(template);
        }
        if !self.packages.is_empty() {
            planner = planner.with_packages(&self.packages);
        }
        planner
    }
}

/// Run the guard and print a short summary. Returns the guard exit code.
pub fn guard(args: GuardArgs, config: &CliConfig, ctx: &RunContext) -> anyhow::Result<i32> {
    let run = UpgradeGuard::new(args.to_config(config), ctx).run()?;
    print_guard_summary(&run);
    if args.json_output.is_none() && config.outputs.guard_json.is_none() {
        emit_json(&run, None)?;
    }
    Ok(run.exit_code)
}

fn print_guard_summary(run: &GuardRun) {
    let s = &run.summary;
    for finding in &run.suppressed {
        print_warning(&format!(
            "{} {} suppressed by snooze {}",
            finding.package, finding.cve, finding.snooze_id
        ));
    }
    let line = format!(
        "{} packages: {} safe, {} needs-review, {} blocked (highest {})",
        s.total,
        s.safe,
        s.needs_review,
        s.blocked,
        colorize_risk(s.highest_risk)
    );
    if run.exit_code == 0 {
        print_success(&line);
    } else {
        print_error(&line);
    }
}

/// Run the guard, then the planner. Returns the planner exit code.
pub fn plan(
    guard_args: GuardArgs,
    planner_args: PlannerArgs,
    output: Option<PathBuf>,
    config: &CliConfig,
    ctx: &RunContext,
) -> anyhow::Result<i32> {
    let guard_config = guard_args.to_config(config);
    let sbom = guard_config
        .sbom
        .clone()
        .context("planning requires an SBOM (--sbom or inputs.sbom)")?;
    let run = UpgradeGuard::new(guard_config, ctx).run()?;
    let planner = UpgradePlanner::new(planner_args.to_config(config), ctx);
    match planner.plan_from_path(&run, &sbom) {
        Ok(result) => {
            emit_json(&result, output.as_deref())?;
            let s = &result.summary;
            let line = format!(
                "{} candidates: {} succeeded, {} failed, {} skipped",
                s.candidates, s.success, s.failure, s.skipped
            );
            if result.exit_code == 0 {
                print_success(&line);
            } else {
                print_error(&line);
            }
            Ok(result.exit_code)
        }
        Err(e) => {
            print_error(&e.to_string());
            Ok(PlannerError::EXIT_CODE)
        }
    }
}

/// Guard plus planner in one report. Returns the combined exit code.
pub fn status(
    guard_args: GuardArgs,
    planner_args: PlannerArgs,
    no_planner: bool,
    output: Option<PathBuf>,
    config: &CliConfig,
    ctx: &RunContext,
) -> anyhow::Result<i32> {
    let status_config = StatusConfig::new(guard_args.to_config(config))
        .with_planner(planner_args.to_config(config))
        .with_planner_enabled(!no_planner);
    let status = run_dependency_status(&status_config, ctx, None)?;
    emit_json(&status, output.as_deref())?;
    if let Some(reason) = &status.planner_reason {
        print_warning(reason);
    }
    Ok(status.exit_code)
}
