//! Property tests: the planner respects its success limit and never attempts
//! a major bump unless allowed.

use depgov_guard::{GuardRun, GuardSummary};
use depgov_planner::{PlannerConfig, ResolverStatus, SimulatedResolver, UpgradePlanner};
use depgov_tests::fixed_context;
use depgov_types::{PackageAssessment, RiskLevel, Sbom, SbomComponent};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// `(major bump, fails)` per package.
fn arb_packages() -> impl Strategy<Value = Vec<(bool, bool)>> {
    prop::collection::vec((any::<bool>(), any::<bool>()), 0..12)
}

fn inputs(packages: &[(bool, bool)]) -> (GuardRun, Sbom) {
    let mut assessments = Vec::new();
    let mut components = Vec::new();
    for (i, (major, _)) in packages.iter().enumerate() {
        let name = format!("pkg-{i:02}");
        let target = if *major { "2.0.0" } else { "1.1.0" };
        assessments.push(PackageAssessment::new(
            name.clone(),
            Some("1.0.0".into()),
            Some(target.into()),
        ));
        components.push(SbomComponent {
            name,
            version: Some("1.0.0".into()),
            purl: None,
        });
    }
    let guard = GuardRun {
        generated_at: fixed_context().now,
        sources: BTreeMap::new(),
        contract: None,
        policy: None,
        signatures: None,
        snoozes: Vec::new(),
        environment_alignment: None,
        suppressed: Vec::new(),
        summary: GuardSummary {
            total: assessments.len(),
            safe: assessments.len(),
            needs_review: 0,
            blocked: 0,
            highest_risk: RiskLevel::Safe,
            fail_threshold: RiskLevel::Blocked,
        },
        packages: assessments,
        exit_code: 0,
    };
    (guard, Sbom { components })
}

fn resolver(packages: &[(bool, bool)]) -> SimulatedResolver {
    packages
        .iter()
        .enumerate()
        .filter(|(_, (_, fails))| *fails)
        .fold(SimulatedResolver::passing(), |r, (i, _)| r.with_failure(format!("pkg-{i:02}")))
}

proptest! {
    #[test]
    fn successes_never_exceed_limit(
        packages in arb_packages(),
        limit in 0usize..6,
        allow_major in any::<bool>(),
    ) {
        let (guard, sbom) = inputs(&packages);
        let config = PlannerConfig::new().with_limit(limit).with_allow_major(allow_major);
        let run = UpgradePlanner::new(config, &fixed_context())
            .with_resolver(resolver(&packages))
            .plan(&guard, &sbom)
            .unwrap();

        prop_assert!(run.summary.success <= limit);
        prop_assert_eq!(run.summary.candidates, packages.len());
        prop_assert_eq!(
            run.summary.success + run.summary.failure + run.summary.skipped,
            packages.len()
        );
        prop_assert_eq!(run.exit_code, i32::from(run.summary.failure > 0));
        prop_assert_eq!(
            run.recommended_commands.len(),
            run.summary.failure + run.summary.skipped
        );
    }

    #[test]
    fn major_bumps_are_never_attempted_unless_allowed(packages in arb_packages()) {
        let (guard, sbom) = inputs(&packages);
        let run = UpgradePlanner::new(PlannerConfig::new(), &fixed_context())
            .with_resolver(resolver(&packages))
            .plan(&guard, &sbom)
            .unwrap();

        for entry in &run.attempts {
            if entry.candidate.latest_version == "2.0.0" {
                prop_assert_eq!(entry.result.status, ResolverStatus::Skipped);
                prop_assert_eq!(entry.result.reason.as_deref(), Some("major upgrade not allowed"));
            } else {
                prop_assert_ne!(entry.result.status, ResolverStatus::Skipped);
            }
        }
    }
}
