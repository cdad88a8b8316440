use depgov_guard::GuardRun;
use depgov_types::{classify_delta, parse_version, RunContext, Sbom};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::PlannerError;
use crate::resolver::{CommandResolver, Resolver};
use crate::types::{
    PlanEntry, PlannerConfig, PlannerRun, PlannerSummary, ResolverResult, ResolverStatus,
    ScoreBreakdown, UpgradeCandidate,
};

const SKIP_CONFIGURED: &str = "resolver skipped by configuration";
const SKIP_MAJOR: &str = "major upgrade not allowed";
const SKIP_LIMIT: &str = "success limit reached";

/// Candidates for every SBOM package whose guard candidate version is newer
/// than the installed one, highest score first (ties by canonical name).
pub fn build_candidates(
    guard: &GuardRun,
    sbom: &Sbom,
    config: &PlannerConfig,
) -> Vec<UpgradeCandidate> {
    let targets = guard.candidate_versions();
    let mut candidates: Vec<UpgradeCandidate> = sbom
        .current_versions()
        .into_iter()
        .filter(|(canonical, _)| {
            config
                .packages
                .as_ref()
                .map_or(true, |allow| allow.contains(canonical))
        })
        .filter_map(|(canonical, (name, current))| {
            let latest = targets.get(&canonical)?.clone();
            let newer = match (parse_version(&current), parse_version(&latest)) {
                (Some(c), Some(l)) => l > c,
                _ => false,
            };
            if !newer {
                return None;
            }

            let assessment = guard.assessment(&canonical);
            let severity = assessment
                .and_then(|a| a.drift)
                .unwrap_or_else(|| classify_delta(&current, &latest));
            let breakdown = ScoreBreakdown {
                security: assessment
                    .and_then(|a| a.security)
                    .map_or(0, |s| 10 * i32::from(s.rank())),
                staleness: 5 * i32::from(severity.rank()),
                policy_friction: -3 * assessment.map_or(0, |a| i32::from(a.risk.rank())),
            };
            Some(UpgradeCandidate {
                package: name,
                canonical,
                current_version: current,
                latest_version: latest,
                severity,
                notes: assessment.map(|a| a.reasons.clone()).unwrap_or_default(),
                score: breakdown.total(),
                breakdown,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.canonical.cmp(&b.canonical)));
    candidates
}

/// Plans and attempts upgrades, strictly one resolver call at a time.
pub struct UpgradePlanner {
    config: PlannerConfig,
    resolver: Box<dyn Resolver>,
    ctx: RunContext,
}

impl UpgradePlanner {
    pub fn new(config: PlannerConfig, ctx: &RunContext) -> Self {
        Self {
            config,
            resolver: Box::new(CommandResolver::new()),
            ctx: ctx.clone(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn validate(&self) -> Result<(), PlannerError> {
        if !self.config.command_template.contains("{package}") {
            return Err(PlannerError::InvalidConfig(format!(
                "command template '{}' has no {{package}} placeholder",
                self.config.command_template
            )));
        }
        if self.config.timeout.is_zero() {
            return Err(PlannerError::InvalidConfig("resolver timeout must be positive".into()));
        }
        Ok(())
    }

    /// Load the SBOM from `path`, then [`plan`](Self::plan).
    pub fn plan_from_path(&self, guard: &GuardRun, sbom_path: &Path) -> Result<PlannerRun, PlannerError> {
        let sbom = depgov_drift::load_sbom(sbom_path)?;
        self.plan(guard, &sbom)
    }

    pub fn plan(&self, guard: &GuardRun, sbom: &Sbom) -> Result<PlannerRun, PlannerError> {
        self.validate()?;
        let candidates = build_candidates(guard, sbom, &self.config);
        info!(
            candidates = candidates.len(),
            limit = ?self.config.limit,
            allow_major = self.config.allow_major,
            skip_resolver = self.config.skip_resolver,
            "Planning upgrades"
        );

        let mut successes = 0usize;
        let mut attempts = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let command = self
                .config
                .render_command(&candidate.canonical, &candidate.latest_version);
            let result = if self.config.skip_resolver {
                ResolverResult::skipped(command, SKIP_CONFIGURED)
            } else if !self.config.allow_major && is_major(&candidate) {
                ResolverResult::skipped(command, SKIP_MAJOR)
            } else if self.config.limit.is_some_and(|limit| successes >= limit) {
                ResolverResult::skipped(command, SKIP_LIMIT)
            } else {
                let result = self.resolver.run(&command, self.config.timeout)?;
                if result.status == ResolverStatus::Success {
                    successes += 1;
                }
                result
            };

            match result.status {
                ResolverStatus::Failure => warn!(
                    package = %candidate.canonical,
                    version = %candidate.latest_version,
                    reason = ?result.reason,
                    "upgrade attempt failed"
                ),
                status => debug!(
                    package = %candidate.canonical,
                    version = %candidate.latest_version,
                    status = %status,
                    reason = ?result.reason,
                    "upgrade attempt"
                ),
            }
            attempts.push(PlanEntry { candidate, result });
        }

        let count = |status: ResolverStatus| attempts.iter().filter(|e| e.result.status == status).count();
        let summary = PlannerSummary {
            candidates: attempts.len(),
            success: count(ResolverStatus::Success),
            failure: count(ResolverStatus::Failure),
            skipped: count(ResolverStatus::Skipped),
        };
        let recommended_commands = attempts
            .iter()
            .filter(|e| e.result.status != ResolverStatus::Success)
            .map(|e| e.result.command_line())
            .collect();
        let exit_code = i32::from(summary.failure > 0);

        info!(
            success = summary.success,
            failure = summary.failure,
            skipped = summary.skipped,
            exit_code,
            "Planning complete"
        );
        Ok(PlannerRun {
            generated_at: self.ctx.now,
            summary,
            recommended_commands,
            attempts,
            exit_code,
        })
    }
}

fn is_major(candidate: &UpgradeCandidate) -> bool {
    match (
        parse_version(&candidate.current_version),
        parse_version(&candidate.latest_version),
    ) {
        (Some(current), Some(latest)) => latest.major > current.major,
        _ => false,
    }
}
