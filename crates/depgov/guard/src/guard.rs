use chrono::{DateTime, Utc};
use depgov_drift::{assess_drift, assess_drift_with_age, load_metadata, load_sbom, DriftPolicy, PackageMetadata};
use depgov_policy::{PolicyEngine, ViolationSeverity};
use depgov_security::{load_osv_findings, OsvFinding};
use depgov_types::{
    canonical_name, parse_version, DriftSeverity, PackageAssessment, RiskLevel, RunContext, Sbom,
    Severity, SourceLoad, SourceStatus,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::GuardConfig;
use crate::contract::{evaluate_contract_metadata, ContractDocument};
use crate::error::GuardError;
use crate::preflight::{load_preflight, PreflightPackage, PreflightReport};
use crate::report::{write_artifacts, GuardRun, GuardSummary, SuppressedFinding};

/// The upgrade guard.
///
/// Loads every configured evidence source, evaluates each package
/// independently and folds the results (plus contract freshness) into one
/// highest risk, compared against the fail threshold for the exit code.
pub struct UpgradeGuard {
    config: GuardConfig,
    ctx: RunContext,
}

struct Evidence {
    preflight: SourceLoad<PreflightReport>,
    cve: SourceLoad<Vec<OsvFinding>>,
    sbom: SourceLoad<Sbom>,
    contract: SourceLoad<ContractDocument>,
    metadata: SourceLoad<BTreeMap<String, PackageMetadata>>,
}

impl Evidence {
    fn sources(&self) -> BTreeMap<String, SourceStatus> {
        [
            ("preflight", &self.preflight.status),
            ("cve", &self.cve.status),
            ("sbom", &self.sbom.status),
            ("contract", &self.contract.status),
            ("metadata", &self.metadata.status),
        ]
        .into_iter()
        .map(|(name, status)| (name.to_string(), status.clone()))
        .collect()
    }
}

/// Everything known about one package before evaluation.
struct PackageInputs<'a> {
    name: String,
    current: Option<String>,
    preflight: Option<&'a PreflightPackage>,
}

/// Shared, read-only evaluation state.
struct Evaluation<'a> {
    now: DateTime<Utc>,
    engine: Option<PolicyEngine>,
    contract: Option<&'a ContractDocument>,
    drift_policy: DriftPolicy,
    metadata: Option<&'a BTreeMap<String, PackageMetadata>>,
    findings: BTreeMap<String, Vec<&'a OsvFinding>>,
}

impl UpgradeGuard {
    pub fn new(config: GuardConfig, ctx: &RunContext) -> Self {
        Self {
            config,
            ctx: ctx.clone(),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Evaluate and write the configured artifacts. Writing is the only
    /// step that can fail.
    pub fn run(&self) -> Result<GuardRun, GuardError> {
        let run = self.evaluate();
        write_artifacts(
            &run,
            self.config.json_output.as_deref(),
            self.config.markdown_output.as_deref(),
        )?;
        Ok(run)
    }

    /// Evaluate without writing artifacts.
    pub fn evaluate(&self) -> GuardRun {
        let evidence = self.load_evidence();
        info!(
            preflight = %evidence.preflight.status.state,
            cve = %evidence.cve.status.state,
            sbom = %evidence.sbom.status.state,
            contract = %evidence.contract.status.state,
            metadata = %evidence.metadata.status.state,
            "Guard evidence loaded"
        );

        let contract = evidence.contract.value.as_ref();
        let contract_eval = contract.map(|c| evaluate_contract_metadata(&c.metadata, self.ctx.now));
        if let Some(eval) = &contract_eval {
            info!(status = %eval.status, risk = %eval.risk, "Contract evaluated");
        }

        let mut findings: BTreeMap<String, Vec<&OsvFinding>> = BTreeMap::new();
        for finding in evidence.cve.value.iter().flatten() {
            findings.entry(finding.package.clone()).or_default().push(finding);
        }
        let eval = Evaluation {
            now: self.ctx.now,
            engine: contract.map(|c| PolicyEngine::new(c.policy.clone(), &self.ctx)),
            contract,
            drift_policy: contract.map(|c| c.drift_policy.clone()).unwrap_or_default(),
            metadata: evidence.metadata.value.as_ref(),
            findings,
        };

        let mut packages = Vec::new();
        let mut suppressed = Vec::new();
        for inputs in collect_packages(&evidence) {
            let (assessment, hidden) = eval.package(inputs);
            debug!(
                package = %assessment.package,
                risk = %assessment.risk,
                reasons = assessment.reasons.len(),
                "package evaluated"
            );
            packages.push(assessment);
            suppressed.extend(hidden);
        }

        let contract_risk = contract_eval.as_ref().map_or(RiskLevel::Safe, |e| e.risk);
        let highest_risk = packages
            .iter()
            .map(|a| a.risk)
            .chain(std::iter::once(contract_risk))
            .max()
            .unwrap_or_default();
        let count = |risk: RiskLevel| packages.iter().filter(|a| a.risk == risk).count();
        let summary = GuardSummary {
            total: packages.len(),
            safe: count(RiskLevel::Safe),
            needs_review: count(RiskLevel::NeedsReview),
            blocked: count(RiskLevel::Blocked),
            highest_risk,
            fail_threshold: self.config.fail_threshold,
        };
        let exit_code = i32::from(highest_risk >= self.config.fail_threshold);

        info!(
            packages = summary.total,
            blocked = summary.blocked,
            needs_review = summary.needs_review,
            highest = %highest_risk,
            exit_code,
            "Guard run complete"
        );

        GuardRun {
            generated_at: self.ctx.now,
            sources: evidence.sources(),
            contract: contract_eval,
            policy: eval.engine.as_ref().map(PolicyEngine::policy_summary),
            signatures: contract.and_then(|c| c.signatures.clone()),
            snoozes: contract.map(|c| c.snoozes.clone()).unwrap_or_default(),
            environment_alignment: contract.and_then(|c| c.environment_alignment.clone()),
            suppressed,
            packages,
            summary,
            exit_code,
        }
    }

    fn load_evidence(&self) -> Evidence {
        let cfg = &self.config;
        Evidence {
            preflight: SourceLoad::load("preflight", cfg.preflight.as_deref(), load_preflight),
            cve: SourceLoad::load("cve", cfg.cve_scan.as_deref(), load_osv_findings),
            sbom: SourceLoad::load("sbom", cfg.sbom.as_deref(), load_sbom),
            contract: SourceLoad::load("contract", cfg.contract.as_deref(), ContractDocument::load),
            metadata: SourceLoad::load("metadata", cfg.metadata.as_deref(), load_metadata),
        }
    }
}

/// Union of SBOM components and preflight entries, keyed by canonical name.
/// The SBOM version wins over the preflight `current_version`.
fn collect_packages(evidence: &Evidence) -> Vec<PackageInputs<'_>> {
    let mut packages: BTreeMap<String, PackageInputs<'_>> = BTreeMap::new();
    for component in evidence.sbom.value.iter().flat_map(|s| &s.components) {
        let entry = packages
            .entry(canonical_name(&component.name))
            .or_insert_with(|| PackageInputs {
                name: component.name.clone(),
                current: None,
                preflight: None,
            });
        if component.version.is_some() {
            entry.current = component.version.clone();
        }
    }
    for pkg in evidence.preflight.value.iter().flat_map(|r| &r.packages) {
        let entry = packages
            .entry(canonical_name(&pkg.name))
            .or_insert_with(|| PackageInputs {
                name: pkg.name.clone(),
                current: None,
                preflight: None,
            });
        if entry.current.is_none() {
            entry.current = pkg.current_version.clone();
        }
        entry.preflight = Some(pkg);
    }
    packages.into_values().collect()
}

impl Evaluation<'_> {
    fn package(&self, inputs: PackageInputs<'_>) -> (PackageAssessment, Vec<SuppressedFinding>) {
        let canonical = canonical_name(&inputs.name);
        let meta = self.metadata.and_then(|m| m.get(&canonical));
        let candidate = inputs
            .preflight
            .and_then(|p| p.latest_version.clone())
            .or_else(|| meta.and_then(|m| m.latest.clone()));

        let mut a = PackageAssessment::new(inputs.name.clone(), inputs.current.clone(), candidate);
        self.apply_policy(&mut a);
        if let Some(pkg) = inputs.preflight {
            apply_preflight(&mut a, pkg);
        }
        self.apply_drift(&mut a, meta);
        let suppressed = self.apply_findings(&mut a, &canonical);
        if let Some(meta) = meta {
            for id in meta.advisory_ids() {
                a.elevate(RiskLevel::Safe, format!("metadata: advisory {id} published"));
            }
        }
        (a, suppressed)
    }

    fn apply_policy(&self, a: &mut PackageAssessment) {
        let Some(engine) = &self.engine else {
            return;
        };
        let name = a.package.clone();
        let (allowed, reason) = engine.check_package_allowed(&name);
        if !allowed {
            a.elevate(
                RiskLevel::Blocked,
                format!("policy: {}", reason.unwrap_or_else(|| "package denied".into())),
            );
            return;
        }

        let current = a.current_version.clone();
        let candidate = a.candidate_version.clone();
        if let Some(current) = &current {
            let (ok, reason) = engine.check_version_allowed(&name, current);
            if !ok {
                a.elevate(
                    RiskLevel::NeedsReview,
                    format!(
                        "policy: installed version {current} not allowed: {}",
                        reason.unwrap_or_default()
                    ),
                );
            }
        }
        match (&current, &candidate) {
            (Some(current), Some(candidate)) if current != candidate => {
                for violation in engine.check_upgrade_allowed(&name, current, candidate) {
                    let risk = match violation.severity {
                        ViolationSeverity::Error => RiskLevel::Blocked,
                        ViolationSeverity::Warning => RiskLevel::NeedsReview,
                    };
                    a.elevate(risk, format!("policy: {}", violation.message));
                }
            }
            (None, Some(candidate)) => {
                let (ok, reason) = engine.check_version_allowed(&name, candidate);
                if !ok {
                    a.elevate(
                        RiskLevel::Blocked,
                        format!("policy: {}", reason.unwrap_or_default()),
                    );
                }
            }
            _ => {}
        }
    }

    fn apply_drift(&self, a: &mut PackageAssessment, meta: Option<&PackageMetadata>) {
        let (Some(current), Some(candidate)) = (a.current_version.clone(), a.candidate_version.clone())
        else {
            return;
        };
        let drift = match meta.and_then(|m| m.age_days) {
            Some(age) => assess_drift_with_age(&a.package, &current, &candidate, &self.drift_policy, age),
            None => assess_drift(&a.package, &current, &candidate, &self.drift_policy),
        };
        a.drift = Some(drift.severity);
        if drift.severity == DriftSeverity::Safe {
            return;
        }

        let review = drift.severity == DriftSeverity::Major
            && self.drift_policy.major_review_required_for(&a.package);
        let level = if review {
            RiskLevel::NeedsReview
        } else {
            RiskLevel::Safe
        };
        a.elevate(level, format!("drift: {} ({current} -> {candidate})", drift.severity));
        for note in drift.notes {
            a.elevate(RiskLevel::Safe, format!("drift: {note}"));
        }
    }

    fn apply_findings(&self, a: &mut PackageAssessment, canonical: &str) -> Vec<SuppressedFinding> {
        let mut suppressed = Vec::new();
        let Some(findings) = self.findings.get(canonical) else {
            return suppressed;
        };
        let current = a.current_version.as_deref().and_then(parse_version);
        let candidate = a.candidate_version.as_deref().and_then(parse_version);
        let require_review = self
            .contract
            .is_some_and(|c| c.policy.require_security_review);

        for finding in findings {
            let record = &finding.record;
            if current.as_ref().is_some_and(|v| !record.affects(v)) {
                continue;
            }

            let mut ids: Vec<&str> = vec![record.id.as_str()];
            ids.extend(record.aliases.iter().map(String::as_str));
            if let Some(snooze) = self
                .contract
                .and_then(|c| c.active_snooze(&a.package, &ids, self.now))
            {
                warn!(
                    package = %a.package,
                    cve = %record.id,
                    snooze = %snooze.id,
                    expires = ?snooze.expires,
                    "finding suppressed by snooze"
                );
                suppressed.push(SuppressedFinding {
                    package: a.package.clone(),
                    cve: record.id.clone(),
                    severity: record.severity,
                    snooze_id: snooze.id.clone(),
                    expires: snooze.expires.clone(),
                    reason: snooze.reason.clone(),
                    approved_by: snooze.approved_by.clone(),
                });
                continue;
            }

            a.record_finding(record.id.clone(), record.severity);
            let mut risk = match record.severity {
                Severity::Critical | Severity::High => RiskLevel::Blocked,
                Severity::Medium => RiskLevel::NeedsReview,
                Severity::Low => RiskLevel::Safe,
            };
            if require_review {
                risk = risk.max(RiskLevel::NeedsReview);
            }
            let fix = record
                .fixed_version
                .as_deref()
                .map(|f| format!(", fixed in {f}"))
                .unwrap_or_default();
            a.elevate(risk, format!("security: {} ({}{fix})", record.id, record.severity));

            let candidate_affected =
                record.severity.is_severe() && candidate.as_ref().is_some_and(|c| record.affects(c));
            if candidate_affected {
                let raw = a.candidate_version.clone().unwrap_or_default();
                a.elevate(
                    RiskLevel::Safe,
                    format!("security: candidate {raw} is still affected by {}", record.id),
                );
            }
        }
        suppressed
    }
}

fn apply_preflight(a: &mut PackageAssessment, pkg: &PreflightPackage) {
    if let Some(status) = pkg.status.as_deref() {
        let risk = pkg.status_risk().unwrap_or(RiskLevel::Safe);
        a.elevate(risk, format!("preflight: status {status}"));
    }
    for note in pkg.notes.to_vec() {
        a.elevate(RiskLevel::Safe, format!("preflight: {note}"));
    }
}
