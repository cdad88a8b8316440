//! Guard run report and its JSON / Markdown artifacts.

use chrono::{DateTime, Utc};
use depgov_policy::PolicySummary;
use depgov_types::{PackageAssessment, RiskLevel, Severity, SourceStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::contract::{ContractEvaluation, Snooze};
use crate::error::GuardError;

/// A CVE finding that an active snooze kept out of the risk calculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressedFinding {
    pub package: String,
    pub cve: String,
    pub severity: Severity,
    pub snooze_id: String,
    pub expires: Option<String>,
    pub reason: Option<String>,
    pub approved_by: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardSummary {
    pub total: usize,
    pub safe: usize,
    pub needs_review: usize,
    pub blocked: usize,
    /// Highest risk across packages and the contract evaluation.
    pub highest_risk: RiskLevel,
    pub fail_threshold: RiskLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardRun {
    pub generated_at: DateTime<Utc>,
    /// Keyed by source name: `preflight`, `cve`, `sbom`, `contract`, `metadata`.
    pub sources: BTreeMap<String, SourceStatus>,
    pub contract: Option<ContractEvaluation>,
    pub policy: Option<PolicySummary>,
    pub signatures: Option<Value>,
    pub snoozes: Vec<Snooze>,
    pub environment_alignment: Option<Value>,
    pub suppressed: Vec<SuppressedFinding>,
    pub packages: Vec<PackageAssessment>,
    pub summary: GuardSummary,
    pub exit_code: i32,
}

impl GuardRun {
    pub fn assessment(&self, package: &str) -> Option<&PackageAssessment> {
        let canonical = depgov_types::canonical_name(package);
        self.packages
            .iter()
            .find(|a| depgov_types::canonical_name(&a.package) == canonical)
    }

    pub fn highest_risk(&self) -> RiskLevel {
        self.summary.highest_risk
    }

    /// Candidate versions keyed by canonical name.
    pub fn candidate_versions(&self) -> BTreeMap<String, String> {
        self.packages
            .iter()
            .filter_map(|a| {
                a.candidate_version
                    .as_ref()
                    .map(|v| (depgov_types::canonical_name(&a.package), v.clone()))
            })
            .collect()
    }
}

pub fn render_markdown(run: &GuardRun) -> String {
    let mut out = String::new();
    let s = &run.summary;
    let _ = writeln!(out, "# Dependency Upgrade Guard");
    let _ = writeln!(out);
    let _ = writeln!(out, "Generated: {}", run.generated_at.to_rfc3339());
    let _ = writeln!(
        out,
        "Result: **{}** (highest risk `{}`, fail threshold `{}`)",
        if run.exit_code == 0 { "PASS" } else { "FAIL" },
        s.highest_risk,
        s.fail_threshold
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Packages: {} total, {} safe, {} needs-review, {} blocked",
        s.total, s.safe, s.needs_review, s.blocked
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "## Sources");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Source | State | Detail |");
    let _ = writeln!(out, "|---|---|---|");
    for (name, status) in &run.sources {
        let detail = status
            .message
            .clone()
            .or_else(|| status.path.as_ref().map(|p| p.display().to_string()))
            .unwrap_or_default();
        let _ = writeln!(out, "| {name} | {} | {} |", status.state, escape(&detail));
    }

    if let Some(contract) = &run.contract {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Contract");
        let _ = writeln!(out);
        let _ = writeln!(out, "- Status: {} (`{}`)", contract.status, contract.risk);
        let _ = writeln!(out, "- {}", contract.message);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Packages");
    let _ = writeln!(out);
    if run.packages.is_empty() {
        let _ = writeln!(out, "_No packages evaluated._");
    } else {
        let _ = writeln!(out, "| Package | Current | Candidate | Risk | Reasons |");
        let _ = writeln!(out, "|---|---|---|---|---|");
        for a in &run.packages {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                a.package,
                a.current_version.as_deref().unwrap_or("-"),
                a.candidate_version.as_deref().unwrap_or("-"),
                a.risk,
                escape(&a.reasons.join("; "))
            );
        }
    }

    if !run.suppressed.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Suppressed findings");
        let _ = writeln!(out);
        for f in &run.suppressed {
            let _ = writeln!(
                out,
                "- {} {} ({}) snoozed by `{}` until {}",
                f.package,
                f.cve,
                f.severity,
                f.snooze_id,
                f.expires.as_deref().unwrap_or("?")
            );
        }
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Write whichever artifacts have a configured path.
pub fn write_artifacts(
    run: &GuardRun,
    json_path: Option<&Path>,
    markdown_path: Option<&Path>,
) -> Result<(), GuardError> {
    if let Some(path) = json_path {
        let json = serde_json::to_string_pretty(run)?;
        write_file(path, &json)?;
        info!(path = %path.display(), "Guard JSON report written");
    }
    if let Some(path) = markdown_path {
        write_file(path, &render_markdown(run))?;
        info!(path = %path.display(), "Guard Markdown report written");
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), GuardError> {
    let io_err = |source| GuardError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)
}
