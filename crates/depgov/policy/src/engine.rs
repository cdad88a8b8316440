use chrono::{DateTime, Duration, Utc};
use depgov_types::{
    canonical_name, is_prerelease, major_jump, parse_version, RunContext, VersionSpecifier,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::PolicyError;
use crate::types::{
    DependencyPolicy, PackagePolicy, PolicySummary, PolicyViolation, ViolationKind,
    ViolationSeverity,
};

pub const DEFAULT_DENY_REASON: &str = "Package not in allowlist and default policy is deny";
const DENYLIST_REASON: &str = "Package is on the denylist";

/// Evaluates packages, versions and upgrades against a [`DependencyPolicy`].
///
/// The only mutable state is the per-package upgrade history used for cadence
/// checks. It lives in this instance and is never shared.
pub struct PolicyEngine {
    policy: DependencyPolicy,
    now: DateTime<Utc>,
    upgrade_history: HashMap<String, DateTime<Utc>>,
}

impl PolicyEngine {
    pub fn new(policy: DependencyPolicy, ctx: &RunContext) -> Self {
        Self {
            policy,
            now: ctx.now,
            upgrade_history: HashMap::new(),
        }
    }

    pub fn from_contract_path(path: &Path, ctx: &RunContext) -> Result<Self, PolicyError> {
        Ok(Self::new(DependencyPolicy::from_contract_path(path)?, ctx))
    }

    pub fn policy(&self) -> &DependencyPolicy {
        &self.policy
    }

    pub fn policy_summary(&self) -> PolicySummary {
        self.policy.summary()
    }

    /// Rule for a package; denylist entries shadow allowlist entries.
    pub fn rule_for(&self, name: &str) -> Option<&PackagePolicy> {
        let key = canonical_name(name);
        self.policy
            .denylist
            .get(&key)
            .or_else(|| self.policy.allowlist.get(&key))
    }

    /// Whether a package may be used at all, with the blocking reason.
    pub fn check_package_allowed(&self, name: &str) -> (bool, Option<String>) {
        let key = canonical_name(name);

        if let Some(rule) = self.policy.denylist.get(&key) {
            let reason = rule.reason.clone().unwrap_or_else(|| DENYLIST_REASON.into());
            debug!(package = %key, %reason, "Package denied by denylist");
            return (false, Some(reason));
        }

        if let Some(rule) = self.policy.allowlist.get(&key) {
            if !rule.allowed {
                let reason = rule
                    .reason
                    .clone()
                    .unwrap_or_else(|| "Package is disallowed by its allowlist entry".into());
                return (false, Some(reason));
            }
            return (true, None);
        }

        if self.policy.default_allowed {
            (true, None)
        } else {
            debug!(package = %key, "Package not allowlisted under default-deny");
            (false, Some(DEFAULT_DENY_REASON.into()))
        }
    }

    /// Whether a specific version of a package is admissible.
    ///
    /// Order: unparsable → pre-release → blocked list → allowed list →
    /// floor/ceiling.
    pub fn check_version_allowed(&self, name: &str, version: &str) -> (bool, Option<String>) {
        let Some(parsed) = parse_version(version) else {
            return (false, Some(format!("Invalid version format: {version}")));
        };

        if is_prerelease(&parsed) && !self.policy.allow_pre_releases {
            return (
                false,
                Some(format!("Pre-release version {version} is not allowed")),
            );
        }

        let Some(rule) = self.rule_for(name) else {
            return (true, None);
        };

        let listed = |list: &[String]| {
            list.iter()
                .filter_map(|v| parse_version(v))
                .any(|v| v == parsed)
        };

        if listed(&rule.blocked_versions) {
            return (false, Some(format!("Version {version} is explicitly blocked")));
        }
        if !rule.allowed_versions.is_empty() {
            return if listed(&rule.allowed_versions) {
                (true, None)
            } else {
                (
                    false,
                    Some(format!("Version {version} is not in the allowed versions list")),
                )
            };
        }

        if let Some(max) = rule.max_version.as_deref().and_then(parse_version) {
            if parsed > max {
                return (
                    false,
                    Some(format!(
                        "Version {version} exceeds maximum allowed version {}",
                        rule.max_version.as_deref().unwrap_or_default()
                    )),
                );
            }
        }
        if let Some(min) = rule.min_version.as_deref().and_then(parse_version) {
            if parsed < min {
                return (
                    false,
                    Some(format!(
                        "Version {version} is below minimum allowed version {}",
                        rule.min_version.as_deref().unwrap_or_default()
                    )),
                );
            }
        }

        (true, None)
    }

    /// Every policy rule an upgrade `from → to` breaks.
    pub fn check_upgrade_allowed(&self, name: &str, from: &str, to: &str) -> Vec<PolicyViolation> {
        let key = canonical_name(name);
        let mut violations = Vec::new();
        let violation = |kind, severity, message: String| PolicyViolation {
            package: name.to_string(),
            current_version: from.to_string(),
            target_version: to.to_string(),
            kind,
            message,
            severity,
        };

        let (allowed, reason) = self.check_package_allowed(name);
        if !allowed {
            violations.push(violation(
                ViolationKind::PackageDenied,
                ViolationSeverity::Error,
                reason.unwrap_or_else(|| DENYLIST_REASON.into()),
            ));
        }

        let (allowed, reason) = self.check_version_allowed(name, to);
        if !allowed {
            violations.push(violation(
                ViolationKind::VersionDenied,
                ViolationSeverity::Error,
                reason.unwrap_or_else(|| format!("Version {to} is not allowed")),
            ));
        }

        if let (Some(from_v), Some(to_v)) = (parse_version(from), parse_version(to)) {
            let jump = major_jump(&from_v, &to_v);
            if jump > self.policy.max_major_version_jump {
                violations.push(violation(
                    ViolationKind::MajorVersionJump,
                    ViolationSeverity::Error,
                    format!(
                        "Major version jump of {jump} exceeds maximum of {}",
                        self.policy.max_major_version_jump
                    ),
                ));
            }
        }

        let rule = self.rule_for(name);
        let cadence_days = rule
            .and_then(|r| r.upgrade_cadence_days)
            .unwrap_or(self.policy.upgrade_cadence_days);
        if cadence_days > 0 {
            if let Some(last) = self.upgrade_history.get(&key) {
                let elapsed = self.now - *last;
                if elapsed < Duration::days(i64::from(cadence_days)) {
                    violations.push(violation(
                        ViolationKind::UpgradeCadence,
                        ViolationSeverity::Warning,
                        format!(
                            "Last upgraded {} days ago; cadence requires {cadence_days} days",
                            elapsed.num_days()
                        ),
                    ));
                }
            }
        }

        if rule.is_some_and(|r| r.requires_review) {
            violations.push(violation(
                ViolationKind::ReviewRequired,
                ViolationSeverity::Warning,
                format!("Upgrades of {name} require manual review"),
            ));
        }

        debug!(
            package = %key,
            from,
            to,
            violations = violations.len(),
            "Upgrade checked"
        );
        violations
    }

    /// Remember that `name` was upgraded now (the engine's clock).
    pub fn record_upgrade(&mut self, name: &str) {
        let now = self.now;
        self.record_upgrade_at(name, now);
    }

    pub fn record_upgrade_at(&mut self, name: &str, at: DateTime<Utc>) {
        self.upgrade_history.insert(canonical_name(name), at);
    }

    pub fn last_upgrade(&self, name: &str) -> Option<DateTime<Utc>> {
        self.upgrade_history.get(&canonical_name(name)).copied()
    }

    /// Check an interpreter version against `python_version_requirement`.
    pub fn check_python_version(&self, version: &str) -> (bool, Option<String>) {
        let Some(requirement) = self.policy.python_version_requirement.as_deref() else {
            return (true, None);
        };
        let spec = match requirement.parse::<VersionSpecifier>() {
            Ok(spec) => spec,
            Err(e) => return (false, Some(format!("Invalid python requirement: {e}"))),
        };
        match parse_version(version) {
            Some(v) if spec.allows(&v) => (true, None),
            Some(_) => (
                false,
                Some(format!("Python {version} does not satisfy {requirement}")),
            ),
            None => (false, Some(format!("Invalid version format: {version}"))),
        }
    }
}
