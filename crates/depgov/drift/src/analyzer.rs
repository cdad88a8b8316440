use depgov_types::{classify_delta, DriftSeverity, Severity};
use tracing::debug;

use crate::types::{DriftPolicy, PackageDrift};

/// Classify drift from the semver delta alone.
pub fn assess_drift(package: &str, current: &str, latest: &str, policy: &DriftPolicy) -> PackageDrift {
    let severity = classify_delta(current, latest);
    let mut notes = Vec::new();
    if severity == DriftSeverity::Major && policy.major_review_required_for(package) {
        notes.push(format!(
            "Major upgrade {current} -> {latest} requires review"
        ));
    }
    debug!(package, current, latest, tier = %severity, "drift assessed");
    PackageDrift {
        package: package.to_string(),
        current_version: current.to_string(),
        latest_version: latest.to_string(),
        severity,
        notes,
    }
}

/// Like [`assess_drift`], adding a note when the package has sat on the
/// old version longer than its review window.
pub fn assess_drift_with_age(
    package: &str,
    current: &str,
    latest: &str,
    policy: &DriftPolicy,
    age_days: u32,
) -> PackageDrift {
    let mut drift = assess_drift(package, current, latest, policy);
    if drift.severity == DriftSeverity::Safe {
        return drift;
    }
    let window = policy.review_window(package, drift.severity);
    if age_days > window {
        drift.notes.push(format!(
            "{} drift is {age_days} days old, beyond the {window}-day review window",
            drift.severity
        ));
    }
    drift
}

/// `weight_recency × rank(tier) + weight_security × rank(security)`, with
/// zero-based ranks and no security finding counting as zero.
pub fn drift_score(drift: &PackageDrift, policy: &DriftPolicy, security: Option<Severity>) -> f64 {
    let recency = f64::from(drift.severity.rank());
    let security = security.map_or(0.0, |s| f64::from(s.rank() - 1));
    policy.weight_recency * recency + policy.weight_security * security
}
