use chrono::{DateTime, Utc};
use depgov_types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Requirer label for the project's own runtime dependencies.
pub const ROOT_REQUIRER: &str = "<root>";
/// Requirer label for the project's development dependencies.
pub const ROOT_DEV_REQUIRER: &str = "<root-dev>";

/// One constraint declared against a package by one requirer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConstraint {
    /// Canonical package name.
    pub package: String,
    /// Specifier text as declared (empty = any version).
    pub constraint: String,
    pub required_by: String,
    pub is_direct: bool,
}

impl DependencyConstraint {
    pub fn direct(package: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            constraint: constraint.into(),
            required_by: ROOT_REQUIRER.into(),
            is_direct: true,
        }
    }

    pub fn dev(package: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            constraint: constraint.into(),
            required_by: ROOT_DEV_REQUIRER.into(),
            is_direct: true,
        }
    }

    pub fn transitive(
        package: impl Into<String>,
        constraint: impl Into<String>,
        required_by: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            constraint: constraint.into(),
            required_by: required_by.into(),
            is_direct: false,
        }
    }

    /// `spec (required by X)` for human-readable listings.
    pub fn describe(&self) -> String {
        let spec = if self.constraint.is_empty() {
            "*"
        } else {
            self.constraint.as_str()
        };
        format!("{spec} (required by {})", self.required_by)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Version,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Version => "version",
        }
    }
}

/// All constraints for one package whose requirements disagree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub package: String,
    pub kind: ConflictKind,
    pub constraints: Vec<DependencyConstraint>,
    pub auto_resolvable: bool,
    pub severity: Severity,
    pub suggestions: Vec<String>,
}

impl Conflict {
    pub fn direct_constraints(&self) -> impl Iterator<Item = &DependencyConstraint> {
        self.constraints.iter().filter(|c| c.is_direct)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionType {
    Pin,
    Manual,
}

/// Proposed way out of a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub package: String,
    #[serde(rename = "type")]
    pub resolution_type: ResolutionType,
    /// Specifier to pin to (pin resolutions only).
    pub target_version: Option<String>,
    pub commands: Vec<String>,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictAnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub conflicts: Vec<Conflict>,
    pub resolutions: Vec<Resolution>,
    /// Conflict counts keyed by kind, plus `total`.
    pub summary: BTreeMap<String, usize>,
    pub auto_resolvable: usize,
}

impl ConflictAnalysisReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn resolution_for(&self, package: &str) -> Option<&Resolution> {
        self.resolutions.iter().find(|r| r.package == package)
    }
}
