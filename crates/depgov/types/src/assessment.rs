use serde::{Deserialize, Serialize};

use crate::risk::RiskLevel;
use crate::severity::{DriftSeverity, Severity};

/// Verdict for one package within one guard run.
///
/// `risk` is monotonic: [`PackageAssessment::elevate`] is the only way to
/// change it and it never lowers the level, so the final verdict does not
/// depend on the order evidence is applied in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAssessment {
    pub package: String,
    pub current_version: Option<String>,
    pub candidate_version: Option<String>,
    pub risk: RiskLevel,
    pub reasons: Vec<String>,
    /// Drift tier between current and candidate, when both are known.
    #[serde(default)]
    pub drift: Option<DriftSeverity>,
    /// Highest severity among unsuppressed CVE findings for the current version.
    #[serde(default)]
    pub security: Option<Severity>,
    #[serde(default)]
    pub cve_ids: Vec<String>,
}

impl PackageAssessment {
    pub fn new(
        package: impl Into<String>,
        current_version: Option<String>,
        candidate_version: Option<String>,
    ) -> Self {
        Self {
            package: package.into(),
            current_version,
            candidate_version,
            risk: RiskLevel::Safe,
            reasons: Vec::new(),
            drift: None,
            security: None,
            cve_ids: Vec::new(),
        }
    }

    /// Record a reason and raise the risk to `risk` if it is strictly higher.
    pub fn elevate(&mut self, risk: RiskLevel, reason: impl Into<String>) {
        self.reasons.push(reason.into());
        if risk > self.risk {
            self.risk = risk;
        }
    }

    /// Record a CVE finding against the current version.
    pub fn record_finding(&mut self, cve_id: impl Into<String>, severity: Severity) {
        let cve_id = cve_id.into();
        if !self.cve_ids.contains(&cve_id) {
            self.cve_ids.push(cve_id);
        }
        self.security = Some(self.security.map_or(severity, |s| s.max(severity)));
    }

    pub fn is_blocked(&self) -> bool {
        self.risk == RiskLevel::Blocked
    }
}
