//! Dependency conflict analysis

use clap::Args;
use depgov_conflicts::{load_manifest, ConflictResolver, ResolutionType};
use depgov_types::RunContext;
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::output::{emit_json, print_success, print_warning};

#[derive(Args, Debug, Clone, Default)]
pub struct ConflictArgs {
    /// Project manifest
    #[arg(long)]
    pub pyproject: Option<PathBuf>,

    /// Lock file with transitive requirements
    #[arg(long)]
    pub lock: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Analyze constraints. Exit code 1 when any conflict needs manual work.
pub fn execute(args: ConflictArgs, config: &CliConfig, ctx: &RunContext) -> anyhow::Result<i32> {
    let pyproject = args
        .pyproject
        .or_else(|| config.inputs.pyproject.clone())
        .unwrap_or_else(|| PathBuf::from("pyproject.toml"));
    let lock = args
        .lock
        .or_else(|| config.inputs.lock.clone())
        .unwrap_or_else(|| PathBuf::from("uv.lock"));

    let manifest = load_manifest(&pyproject, Some(&lock))?;
    let report = ConflictResolver::new(ctx).analyze_conflicts(&manifest);
    emit_json(&report, args.output.as_deref())?;

    let manual = report
        .resolutions
        .iter()
        .filter(|r| r.resolution_type == ResolutionType::Manual)
        .count();
    if !report.has_conflicts() {
        print_success(&format!("No conflicts across {} packages", manifest.package_count()));
    } else {
        print_warning(&format!(
            "{} conflict(s): {} auto-resolvable, {} manual",
            report.conflicts.len(),
            report.auto_resolvable,
            manual
        ));
    }
    Ok(i32::from(manual > 0))
}
