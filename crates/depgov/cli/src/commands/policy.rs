//! Policy check commands

use anyhow::Context;
use clap::Subcommand;
use depgov_policy::PolicyEngine;
use depgov_types::RunContext;
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::output::{emit_json, print_error, print_success, print_warning};

/// Policy subcommands
#[derive(Subcommand, Debug)]
pub enum PolicyCommands {
    /// Is a package allowed at all
    CheckPackage {
        /// Package name
        package: String,
        /// Policy contract (TOML)
        #[arg(long)]
        contract: Option<PathBuf>,
    },

    /// Is a specific version of a package allowed
    CheckVersion {
        package: String,
        version: String,
        #[arg(long)]
        contract: Option<PathBuf>,
    },

    /// List the rules an upgrade would break
    CheckUpgrade {
        package: String,
        from: String,
        to: String,
        #[arg(long)]
        contract: Option<PathBuf>,
    },
}

fn engine(contract: Option<PathBuf>, config: &CliConfig, ctx: &RunContext) -> anyhow::Result<PolicyEngine> {
    let path = contract
        .or_else(|| config.inputs.contract.clone())
        .context("a policy contract is required (--contract or inputs.contract)")?;
    PolicyEngine::from_contract_path(&path, ctx)
        .with_context(|| format!("failed to load policy from {}", path.display()))
}

fn report_decision(subject: &str, allowed: bool, reason: Option<String>) -> i32 {
    match (allowed, reason) {
        (true, None) => print_success(&format!("{subject} is allowed")),
        (true, Some(reason)) => print_warning(&format!("{subject} is allowed: {reason}")),
        (false, reason) => print_error(&format!(
            "{subject} is not allowed: {}",
            reason.unwrap_or_else(|| "no reason given".into())
        )),
    }
    i32::from(!allowed)
}

/// Execute a policy command. Exit code 1 when the answer is "no".
pub fn execute(command: PolicyCommands, config: &CliConfig, ctx: &RunContext) -> anyhow::Result<i32> {
    match command {
        PolicyCommands::CheckPackage { package, contract } => {
            let (allowed, reason) = engine(contract, config, ctx)?.check_package_allowed(&package);
            Ok(report_decision(&package, allowed, reason))
        }
        PolicyCommands::CheckVersion {
            package,
            version,
            contract,
        } => {
            let (allowed, reason) =
                engine(contract, config, ctx)?.check_version_allowed(&package, &version);
            Ok(report_decision(&format!("{package} {version}"), allowed, reason))
        }
        PolicyCommands::CheckUpgrade {
            package,
            from,
            to,
            contract,
        } => {
            let violations = engine(contract, config, ctx)?.check_upgrade_allowed(&package, &from, &to);
            emit_json(&violations, None)?;
            let errors = violations.iter().filter(|v| v.is_error()).count();
            if violations.is_empty() {
                print_success(&format!("{package} {from} -> {to} violates no policy"));
            } else if errors == 0 {
                print_warning(&format!("{package} {from} -> {to}: {} warning(s)", violations.len()));
            } else {
                print_error(&format!("{package} {from} -> {to}: {errors} violation(s)"));
            }
            Ok(i32::from(errors > 0))
        }
    }
}
