use depgov_types::{parse_version, Severity};
use semver::Version;
use serde::{Deserialize, Serialize};

/// One affected interval from an OSV `ranges[].events[]` list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedRange {
    #[serde(default)]
    pub introduced: Option<String>,
    #[serde(default)]
    pub fixed: Option<String>,
    #[serde(default)]
    pub last_affected: Option<String>,
}

impl AffectedRange {
    /// Unparsable bounds are treated as open.
    pub fn contains(&self, version: &Version) -> bool {
        let above_floor = self
            .introduced
            .as_deref()
            .and_then(parse_version)
            .map_or(true, |floor| version >= &floor);
        let below_fix = self
            .fixed
            .as_deref()
            .and_then(parse_version)
            .map_or(true, |fixed| version < &fixed);
        let within_last = self
            .last_affected
            .as_deref()
            .and_then(parse_version)
            .map_or(true, |last| version <= &last);
        above_floor && below_fix && within_last
    }
}

/// A vulnerability recorded against one package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CveRecord {
    pub id: String,
    /// Canonical name of the affected package.
    pub package: String,
    #[serde(default)]
    pub affected_versions: Vec<AffectedRange>,
    /// First fixed version, when the advisory names one.
    #[serde(default)]
    pub fixed_version: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub cvss_score: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CveRecord {
    /// Whether `version` is vulnerable. Ranges win when present; otherwise
    /// anything below the fixed version (or everything, with no fix) is.
    pub fn affects(&self, version: &Version) -> bool {
        if !self.affected_versions.is_empty() {
            return self.affected_versions.iter().any(|r| r.contains(version));
        }
        match self.fixed_version.as_deref().and_then(parse_version) {
            Some(fixed) => version < &fixed,
            None => true,
        }
    }

    pub fn fixed(&self) -> Option<Version> {
        self.fixed_version.as_deref().and_then(parse_version)
    }
}

/// Minimum (and optionally maximum) version a package must respect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConstraint {
    pub package: String,
    #[serde(default)]
    pub min_version: Option<String>,
    #[serde(default)]
    pub max_version: Option<String>,
    pub reason: String,
    #[serde(default)]
    pub cve_ids: Vec<String>,
}

impl SecurityConstraint {
    /// Whether `version` sits outside the constraint's bounds.
    pub fn is_violated_by(&self, version: &Version) -> bool {
        let below = self
            .min_version
            .as_deref()
            .and_then(parse_version)
            .is_some_and(|min| version < &min);
        let above = self
            .max_version
            .as_deref()
            .and_then(parse_version)
            .is_some_and(|max| version > &max);
        below || above
    }
}
