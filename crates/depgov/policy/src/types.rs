//! Policy value objects.

use depgov_types::canonical_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::error::PolicyError;

fn default_true() -> bool {
    true
}

fn default_max_major_jump() -> u64 {
    1
}

/// Rules for one package, from an allowlist or denylist sub-table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagePolicy {
    /// Filled from the table key when omitted.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub allowed: bool,
    /// Highest admissible version (inclusive).
    #[serde(default, alias = "ceiling")]
    pub max_version: Option<String>,
    /// Lowest admissible version (inclusive).
    #[serde(default, alias = "floor")]
    pub min_version: Option<String>,
    #[serde(default)]
    pub allowed_versions: Vec<String>,
    #[serde(default)]
    pub blocked_versions: Vec<String>,
    #[serde(default)]
    pub upgrade_cadence_days: Option<u32>,
    #[serde(default)]
    pub requires_review: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl PackagePolicy {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed: true,
            max_version: None,
            min_version: None,
            allowed_versions: Vec::new(),
            blocked_versions: Vec::new(),
            upgrade_cadence_days: None,
            requires_review: false,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// The `[dependency_policy]` section of a contract. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyPolicy {
    #[serde(default = "default_true")]
    pub default_allowed: bool,
    #[serde(default)]
    pub allowlist: BTreeMap<String, PackagePolicy>,
    #[serde(default)]
    pub denylist: BTreeMap<String, PackagePolicy>,
    #[serde(default = "default_max_major_jump")]
    pub max_major_version_jump: u64,
    /// Minimum days between upgrades of one package; 0 disables the check.
    #[serde(default)]
    pub upgrade_cadence_days: u32,
    #[serde(default)]
    pub allow_pre_releases: bool,
    #[serde(default)]
    pub require_security_review: bool,
    #[serde(default)]
    pub python_version_requirement: Option<String>,
}

impl Default for DependencyPolicy {
    fn default() -> Self {
        Self {
            default_allowed: true,
            allowlist: BTreeMap::new(),
            denylist: BTreeMap::new(),
            max_major_version_jump: default_max_major_jump(),
            upgrade_cadence_days: 0,
            allow_pre_releases: false,
            require_security_review: false,
            python_version_requirement: None,
        }
    }
}

impl DependencyPolicy {
    /// Parse the `[dependency_policy]` section of a contract document.
    /// A contract without the section yields the default policy.
    pub fn from_contract_str(contract: &str) -> Result<Self, PolicyError> {
        let mut table: toml::Table = toml::from_str(contract)?;
        match table.remove("dependency_policy") {
            Some(section) => Self::from_value(section),
            None => Ok(Self::default()),
        }
    }

    pub fn from_contract_path(path: &Path) -> Result<Self, PolicyError> {
        let text = depgov_types::error::read_to_string(path)?;
        let policy = Self::from_contract_str(&text)?;
        info!(
            path = %path.display(),
            allowlisted = policy.allowlist.len(),
            denylisted = policy.denylist.len(),
            "Dependency policy loaded"
        );
        Ok(policy)
    }

    /// Build from an already-parsed `[dependency_policy]` value.
    pub fn from_value(section: toml::Value) -> Result<Self, PolicyError> {
        let policy: DependencyPolicy = section.try_into()?;
        Ok(policy.normalized())
    }

    /// Key both lists by canonical name and fill in missing entry names.
    fn normalized(self) -> Self {
        fn rekey(list: BTreeMap<String, PackagePolicy>) -> BTreeMap<String, PackagePolicy> {
            list.into_iter()
                .map(|(key, mut rule)| {
                    if rule.name.is_empty() {
                        rule.name = key.clone();
                    }
                    (canonical_name(&key), rule)
                })
                .collect()
        }
        Self {
            allowlist: rekey(self.allowlist),
            denylist: rekey(self.denylist),
            ..self
        }
    }

    pub fn with_allowed(mut self, rule: PackagePolicy) -> Self {
        self.allowlist.insert(canonical_name(&rule.name), rule);
        self
    }

    pub fn with_denied(mut self, rule: PackagePolicy) -> Self {
        self.denylist.insert(canonical_name(&rule.name), rule);
        self
    }

    pub fn summary(&self) -> PolicySummary {
        PolicySummary {
            default_allowed: self.default_allowed,
            allowlisted: self.allowlist.len(),
            denylisted: self.denylist.len(),
            max_major_version_jump: self.max_major_version_jump,
            upgrade_cadence_days: self.upgrade_cadence_days,
            allow_pre_releases: self.allow_pre_releases,
            require_security_review: self.require_security_review,
            python_version_requirement: self.python_version_requirement.clone(),
        }
    }
}

/// Report-friendly digest of a policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub default_allowed: bool,
    pub allowlisted: usize,
    pub denylisted: usize,
    pub max_major_version_jump: u64,
    pub upgrade_cadence_days: u32,
    pub allow_pre_releases: bool,
    pub require_security_review: bool,
    pub python_version_requirement: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    PackageDenied,
    VersionDenied,
    MajorVersionJump,
    UpgradeCadence,
    ReviewRequired,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PackageDenied => "package_denied",
            Self::VersionDenied => "version_denied",
            Self::MajorVersionJump => "major_version_jump",
            Self::UpgradeCadence => "upgrade_cadence",
            Self::ReviewRequired => "review_required",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Warning,
    Error,
}

/// One broken rule for a proposed upgrade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyViolation {
    pub package: String,
    pub current_version: String,
    pub target_version: String,
    pub kind: ViolationKind,
    pub message: String,
    pub severity: ViolationSeverity,
}

impl PolicyViolation {
    pub fn is_error(&self) -> bool {
        self.severity == ViolationSeverity::Error
    }
}
