//! The persisted security overlay.

use depgov_types::{canonical_name, parse_version, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, SecurityError};
use crate::osv::{load_osv_findings, OsvFinding};
use crate::types::{CveRecord, SecurityConstraint};

/// CVE database plus per-package minimum-version constraints, stored as
/// pretty-printed JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityOverlay {
    #[serde(skip)]
    path: Option<PathBuf>,
    #[serde(default)]
    pub constraints: BTreeMap<String, SecurityConstraint>,
    #[serde(default)]
    pub cve_database: BTreeMap<String, CveRecord>,
}

impl SecurityOverlay {
    /// Load the overlay at `path`; a missing file yields an empty overlay
    /// bound to that path.
    pub fn load(path: &Path) -> Result<Self> {
        let mut overlay = if path.exists() {
            let text = depgov_types::error::read_to_string(path)?;
            serde_json::from_str::<Self>(&text).map_err(depgov_types::LoadError::from)?
        } else {
            debug!(path = %path.display(), "overlay absent, starting empty");
            Self::default()
        };
        overlay.path = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            constraints = overlay.constraints.len(),
            cves = overlay.cve_database.len(),
            "Security overlay loaded"
        );
        Ok(overlay)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save(&self) -> Result<()> {
        let path = self.path.as_deref().ok_or(SecurityError::NoPath)?;
        self.save_to(path)
    }

    /// Write the overlay to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let write_err = |source| SecurityError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(write_err)?;
        debug!(path = %path.display(), "Security overlay saved");
        Ok(())
    }

    /// Import an OSV scan report; returns the number of (package,
    /// vulnerability) pairs recorded.
    ///
    /// `cve_database` is keyed by vulnerability id. When one advisory affects
    /// several packages, the first package recorded keeps the bare id and
    /// the others are stored under `<id>@<package>`, so every counted pair
    /// stays in the database.
    pub fn import_osv_scan(&mut self, path: &Path) -> Result<usize> {
        let findings = load_osv_findings(path)?;
        let count = self.import_findings(findings);
        info!(path = %path.display(), recorded = count, "OSV scan imported");
        Ok(count)
    }

    pub fn import_findings(&mut self, findings: impl IntoIterator<Item = OsvFinding>) -> usize {
        let mut count = 0;
        for finding in findings {
            let record = finding.record;
            if record.severity.is_severe() && record.fixed_version.is_some() {
                self.create_constraint_for_cve(&record);
            }
            let key = self.database_key(&record);
            self.cve_database.insert(key, record);
            count += 1;
        }
        count
    }

    fn database_key(&self, record: &CveRecord) -> String {
        match self.cve_database.get(&record.id) {
            Some(existing) if existing.package != record.package => {
                format!("{}@{}", record.id, record.package)
            }
            _ => record.id.clone(),
        }
    }

    /// Raise the package's minimum version to the CVE's fixed version.
    /// Returns `true` when the minimum moved. A lower or equal fix only adds
    /// the CVE id to the constraint.
    pub fn create_constraint_for_cve(&mut self, record: &CveRecord) -> bool {
        let Some(fixed_raw) = record.fixed_version.as_deref() else {
            return false;
        };
        let Some(fixed) = parse_version(fixed_raw) else {
            debug!(cve = %record.id, fixed = fixed_raw, "unparsable fixed version, no constraint");
            return false;
        };
        let package = canonical_name(&record.package);
        let constraint = self
            .constraints
            .entry(package.clone())
            .or_insert_with(|| SecurityConstraint {
                package: package.clone(),
                min_version: None,
                max_version: None,
                reason: String::new(),
                cve_ids: Vec::new(),
            });

        if !constraint.cve_ids.contains(&record.id) {
            constraint.cve_ids.push(record.id.clone());
        }
        let current_min = constraint.min_version.as_deref().and_then(parse_version);
        let raise = current_min.map_or(true, |min| fixed > min);
        if raise {
            constraint.min_version = Some(fixed_raw.to_string());
            constraint.reason = format!(
                "{} ({}) fixed in {fixed_raw}",
                record.id, record.severity
            );
            info!(
                package = %package,
                min_version = fixed_raw,
                cve = %record.id,
                "Security constraint raised"
            );
        }
        raise
    }

    pub fn constraint_for(&self, package: &str) -> Option<&SecurityConstraint> {
        self.constraints.get(&canonical_name(package))
    }

    /// The package's constraint when `version` violates it.
    pub fn check_version(&self, package: &str, version: &str) -> Option<&SecurityConstraint> {
        let version = parse_version(version)?;
        self.constraint_for(package)
            .filter(|c| c.is_violated_by(&version))
    }

    /// Recorded CVEs that still apply at `version`: fixed strictly later, or
    /// with no fix at all. An unparsable version matches every record.
    pub fn vulnerabilities_for(&self, package: &str, version: &str) -> Vec<&CveRecord> {
        let package = canonical_name(package);
        let version = parse_version(version);
        self.cve_database
            .values()
            .filter(|r| r.package == package)
            .filter(|r| match (&version, r.fixed()) {
                (Some(v), Some(fixed)) => fixed > *v,
                _ => true,
            })
            .collect()
    }

    /// Highest severity among `vulnerabilities_for`.
    pub fn highest_severity(&self, package: &str, version: &str) -> Option<Severity> {
        self.vulnerabilities_for(package, version)
            .into_iter()
            .map(|r| r.severity)
            .max()
    }
}
