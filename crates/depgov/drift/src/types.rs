use depgov_types::{canonical_name, DriftSeverity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDrift {
    pub package: String,
    pub current_version: String,
    pub latest_version: String,
    pub severity: DriftSeverity,
    pub notes: Vec<String>,
}

/// Per-package replacement for any of the policy windows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriftOverride {
    #[serde(default)]
    pub default_review_days: Option<u32>,
    #[serde(default)]
    pub minor_review_days: Option<u32>,
    #[serde(default)]
    pub major_review_required: Option<bool>,
}

fn default_review_days() -> u32 {
    30
}

fn minor_review_days() -> u32 {
    14
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

/// The `[drift_policy]` contract section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriftPolicy {
    #[serde(default = "default_review_days")]
    pub default_review_days: u32,
    #[serde(default = "minor_review_days")]
    pub minor_review_days: u32,
    #[serde(default = "default_true")]
    pub major_review_required: bool,
    #[serde(default = "default_weight")]
    pub weight_recency: f64,
    #[serde(default = "default_weight")]
    pub weight_security: f64,
    /// Keyed by canonical package name.
    #[serde(default)]
    pub overrides: BTreeMap<String, DriftOverride>,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            default_review_days: default_review_days(),
            minor_review_days: minor_review_days(),
            major_review_required: true,
            weight_recency: default_weight(),
            weight_security: default_weight(),
            overrides: BTreeMap::new(),
        }
    }
}

impl DriftPolicy {
    pub fn with_override(mut self, package: &str, rule: DriftOverride) -> Self {
        self.overrides.insert(canonical_name(package), rule);
        self
    }

    fn override_for(&self, package: &str) -> Option<&DriftOverride> {
        self.overrides.get(&canonical_name(package))
    }

    /// Review window in days for a package at a given tier: the minor window
    /// for `minor`, the default window otherwise.
    pub fn review_window(&self, package: &str, tier: DriftSeverity) -> u32 {
        let rule = self.override_for(package);
        match tier {
            DriftSeverity::Minor => rule
                .and_then(|r| r.minor_review_days)
                .unwrap_or(self.minor_review_days),
            _ => rule
                .and_then(|r| r.default_review_days)
                .unwrap_or(self.default_review_days),
        }
    }

    pub fn major_review_required_for(&self, package: &str) -> bool {
        self.override_for(package)
            .and_then(|r| r.major_review_required)
            .unwrap_or(self.major_review_required)
    }
}
