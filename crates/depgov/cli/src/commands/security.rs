//! Security overlay commands

use clap::Subcommand;
use depgov_security::{CveRecord, SecurityConstraint, SecurityOverlay};
use depgov_types::canonical_name;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::CliConfig;
use crate::output::{emit_json, print_error, print_success};

const DEFAULT_OVERLAY: &str = ".depgov/security-overlay.json";

/// Security subcommands
#[derive(Subcommand, Debug)]
pub enum SecurityCommands {
    /// Import an OSV scan into the overlay
    Import {
        /// OSV scan results (JSON)
        scan: PathBuf,
        /// Overlay file to update
        #[arg(long)]
        overlay: Option<PathBuf>,
    },

    /// Show the constraint and known CVEs for a package
    Show {
        package: String,
        /// Only CVEs affecting this version
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct PackageSecurity<'a> {
    package: String,
    version: Option<String>,
    constraint: Option<&'a SecurityConstraint>,
    violates_constraint: bool,
    vulnerabilities: Vec<&'a CveRecord>,
}

fn overlay_path(flag: Option<PathBuf>, config: &CliConfig) -> PathBuf {
    flag.or_else(|| config.inputs.overlay.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OVERLAY))
}

/// Execute a security command. `show` exits 1 when the given version breaks
/// the package's constraint.
pub fn execute(command: SecurityCommands, config: &CliConfig) -> anyhow::Result<i32> {
    match command {
        SecurityCommands::Import { scan, overlay } => {
            let path = overlay_path(overlay, config);
            let mut store = SecurityOverlay::load(&path)?;
            let imported = store.import_osv_scan(&scan)?;
            store.save()?;
            print_success(&format!(
                "Imported {imported} finding(s) into {} ({} constraint(s))",
                path.display(),
                store.constraints.len()
            ));
            Ok(0)
        }
        SecurityCommands::Show {
            package,
            version,
            overlay,
        } => show(&overlay_path(overlay, config), &package, version),
    }
}

fn show(path: &Path, package: &str, version: Option<String>) -> anyhow::Result<i32> {
    let store = SecurityOverlay::load(path)?;
    let canonical = canonical_name(package);
    let (vulnerabilities, violates) = match version.as_deref() {
        Some(v) => (
            store.vulnerabilities_for(&canonical, v),
            store.check_version(&canonical, v).is_some(),
        ),
        None => (
            store
                .cve_database
                .values()
                .filter(|r| r.package == canonical)
                .collect(),
            false,
        ),
    };
    let view = PackageSecurity {
        constraint: store.constraint_for(&canonical),
        package: canonical,
        version,
        violates_constraint: violates,
        vulnerabilities,
    };
    emit_json(&view, None)?;
    if view.violates_constraint {
        if let Some(constraint) = view.constraint {
            print_error(&constraint.reason);
        }
    }
    Ok(i32::from(view.violates_constraint))
}
