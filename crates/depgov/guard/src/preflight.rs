//! Preflight report: the package survey produced before an upgrade window.

use depgov_types::{LoadError, RiskLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightReport {
    #[serde(default)]
    pub generated_at: Option<String>,
    pub packages: Vec<PreflightPackage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightPackage {
    pub name: String,
    #[serde(default)]
    pub current_version: Option<String>,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Notes,
}

/// `notes` is written either as one string or as a list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Notes {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Notes {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::One(note) => vec![note.clone()],
            Self::Many(notes) => notes.clone(),
        }
    }
}

impl PreflightPackage {
    /// Risk implied by the preflight status; `None` for informational ones.
    pub fn status_risk(&self) -> Option<RiskLevel> {
        let status = self.status.as_deref()?.trim().to_ascii_lowercase();
        match status.as_str() {
            "error" | "failed" | "incompatible" => Some(RiskLevel::Blocked),
            "warning" | "outdated-major" | "needs-review" => Some(RiskLevel::NeedsReview),
            _ => None,
        }
    }
}

pub fn load_preflight(path: &Path) -> Result<PreflightReport, LoadError> {
    let text = depgov_types::error::read_to_string(path)?;
    let report: PreflightReport = serde_json::from_str(&text)?;
    info!(path = %path.display(), packages = report.packages.len(), "Preflight report loaded");
    Ok(report)
}
