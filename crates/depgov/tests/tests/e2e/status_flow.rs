//! End-to-end test: guard followed by the planner through the status facade.
//!
//! Verifies that:
//! - Security fixes are attempted first
//! - Major bumps are skipped unless allowed
//! - Resolver failures and aborts surface in the combined exit code

use depgov_guard::GuardConfig;
use depgov_planner::{PlannerConfig, ResolverStatus, SimulatedResolver};
use depgov_status::{run_dependency_status, StatusConfig};
use depgov_tests::{fixed_context, osv_doc, preflight_doc, sbom_doc, Fixture, OsvEntry};
use depgov_types::RiskLevel;

fn config(fx: &Fixture) -> StatusConfig {
    let sbom = fx
        .write_json(
            "sbom.json",
            &sbom_doc(&[("requests", "2.31.0"), ("urllib3", "1.26.18"), ("idna", "3.6")]),
        )
        .unwrap();
    let preflight = fx
        .write_json(
            "preflight.json",
            &preflight_doc(&[
                ("requests", "2.31.0", "2.32.3", "ok"),
                ("urllib3", "1.26.18", "2.2.1", "ok"),
                ("idna", "3.6", "3.7", "ok"),
            ]),
        )
        .unwrap();
    let cve = fx
        .write_json(
            "osv.json",
            &osv_doc(&[OsvEntry {
                package: "requests",
                version: "2.31.0",
                id: "CVE-2024-35195",
                aliases: &[],
                severity: "MODERATE",
                fixed: Some("2.32.0"),
            }]),
        )
        .unwrap();
    let guard = GuardConfig::new()
        .with_sbom(&sbom)
        .with_preflight(preflight)
        .with_cve_scan(cve)
        .with_json_output(fx.path("out/guard.json"));
    StatusConfig::new(guard)
}

#[test]
fn plans_security_fix_first_and_skips_major() {
    let fx = Fixture::new().unwrap();
    let resolver = SimulatedResolver::passing();
    let status = run_dependency_status(&config(&fx), &fixed_context(), Some(Box::new(resolver))).unwrap();

    assert_eq!(status.summary.highest_severity, RiskLevel::NeedsReview);
    assert_eq!(status.guard.exit_code, 0);
    assert!(fx.path("out/guard.json").exists());

    let planner = status.planner.as_ref().unwrap();
    let order: Vec<&str> = planner
        .attempts
        .iter()
        .map(|e| e.candidate.canonical.as_str())
        .collect();
    assert_eq!(order, vec!["requests", "urllib3", "idna"]);

    let requests = &planner.attempts[0];
    assert_eq!(requests.candidate.breakdown.security, 20);
    assert_eq!(requests.result.status, ResolverStatus::Success);

    let urllib3 = &planner.attempts[1];
    assert_eq!(urllib3.result.status, ResolverStatus::Skipped);
    assert_eq!(urllib3.result.reason.as_deref(), Some("major upgrade not allowed"));

    assert_eq!(planner.summary.success, 2);
    assert_eq!(
        planner.recommended_commands,
        vec!["uv lock --upgrade-package urllib3==2.2.1".to_string()]
    );
    assert_eq!(status.exit_code, 0);
}

#[test]
fn resolver_failure_fails_status() {
    let fx = Fixture::new().unwrap();
    let config = config(&fx).with_planner(PlannerConfig::new().with_allow_major(true));
    let resolver = SimulatedResolver::passing().with_timeout("urllib3");
    let status = run_dependency_status(&config, &fixed_context(), Some(Box::new(resolver))).unwrap();

    let planner = status.planner.as_ref().unwrap();
    let urllib3 = planner
        .attempts
        .iter()
        .find(|e| e.candidate.canonical == "urllib3")
        .unwrap();
    assert_eq!(urllib3.result.status, ResolverStatus::Failure);
    assert_eq!(urllib3.result.reason.as_deref(), Some("timeout"));
    assert_eq!(planner.exit_code, 1);
    assert_eq!(status.exit_code, 1);
}

#[test]
fn missing_resolver_aborts_planner_only() {
    let fx = Fixture::new().unwrap();
    let status = run_dependency_status(
        &config(&fx),
        &fixed_context(),
        Some(Box::new(SimulatedResolver::missing_executable())),
    )
    .unwrap();

    assert!(status.planner.is_none());
    assert_eq!(status.guard.summary.total, 3);
    assert!(status.planner_reason.as_deref().unwrap().contains("uv"));
    assert_eq!(status.exit_code, 2);
}
