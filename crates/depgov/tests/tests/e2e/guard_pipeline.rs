//! End-to-end test: the upgrade guard over a full evidence set.
//!
//! Verifies that:
//! - CVE, preflight, drift and policy evidence combine into per-package risk
//! - Active snoozes suppress findings and expired ones do not
//! - Contract freshness feeds the run's highest risk
//! - Malformed sources degrade to source states instead of aborting

use depgov_guard::{ContractStatus, GuardConfig, UpgradeGuard};
use depgov_tests::{contract_text, fixed_context, osv_doc, preflight_doc, sbom_doc, Fixture, OsvEntry};
use depgov_types::{RiskLevel, Severity, SourceState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const JINJA_ADVISORY: OsvEntry<'static> = OsvEntry {
    package: "Jinja2",
    version: "3.1.2",
    id: "GHSA-h5c8-rqwp-cp95",
    aliases: &["CVE-2024-22195"],
    severity: "HIGH",
    fixed: Some("3.1.3"),
};

fn evidence(fx: &Fixture, contract_body: &str, last_validated: &str) -> GuardConfig {
    let sbom = fx
        .write_json(
            "sbom.json",
            &sbom_doc(&[("requests", "2.31.0"), ("urllib3", "1.26.18"), ("Jinja2", "3.1.2")]),
        )
        .unwrap();
    let preflight = fx
        .write_json(
            "preflight.json",
            &preflight_doc(&[
                ("requests", "2.31.0", "2.32.3", "ok"),
                ("urllib3", "1.26.18", "2.2.1", "outdated-major"),
                ("jinja2", "3.1.2", "3.1.4", "ok"),
            ]),
        )
        .unwrap();
    let cve = fx.write_json("osv.json", &osv_doc(&[JINJA_ADVISORY])).unwrap();
    let contract = fx
        .write_text("contract.toml", &contract_text(last_validated, 30, contract_body))
        .unwrap();
    GuardConfig::new()
        .with_sbom(sbom)
        .with_preflight(preflight)
        .with_cve_scan(cve)
        .with_contract(contract)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn high_cve_blocks_and_artifacts_are_written() {
    let fx = Fixture::new().unwrap();
    let config = evidence(&fx, "", "2026-02-20")
        .with_json_output(fx.path("out/guard.json"))
        .with_markdown_output(fx.path("out/guard.md"));

    let run = UpgradeGuard::new(config, &fixed_context()).run().unwrap();

    let jinja = run.assessment("jinja2").unwrap();
    assert_eq!(jinja.risk, RiskLevel::Blocked);
    assert_eq!(jinja.security, Some(Severity::High));
    assert_eq!(jinja.cve_ids, vec!["GHSA-h5c8-rqwp-cp95".to_string()]);
    assert!(jinja
        .reasons
        .iter()
        .any(|r| r == "security: GHSA-h5c8-rqwp-cp95 (high, fixed in 3.1.3)"));

    let urllib3 = run.assessment("urllib3").unwrap();
    assert_eq!(urllib3.risk, RiskLevel::NeedsReview);
    assert!(urllib3.reasons.iter().any(|r| r.starts_with("preflight: status outdated-major")));

    assert_eq!(run.assessment("requests").unwrap().risk, RiskLevel::Safe);

    assert_eq!(run.summary.total, 3);
    assert_eq!(run.summary.blocked, 1);
    assert_eq!(run.summary.needs_review, 1);
    assert_eq!(run.summary.safe, 1);
    assert_eq!(run.highest_risk(), RiskLevel::Blocked);
    assert_eq!(run.exit_code, 1);
    assert_eq!(run.contract.as_ref().unwrap().status, ContractStatus::Fresh);

    let json = std::fs::read_to_string(fx.path("out/guard.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["exit_code"], 1);
    assert_eq!(parsed["summary"]["highest_risk"], "blocked");
    let md = std::fs::read_to_string(fx.path("out/guard.md")).unwrap();
    assert!(md.contains("**FAIL**"));
    assert!(md.contains("| Jinja2 | 3.1.2 | 3.1.4 | blocked |"));
}

#[test]
fn active_snooze_suppresses_finding_by_alias() {
    let fx = Fixture::new().unwrap();
    let body = r#"
[governance.snoozes.jinja-sandbox]
package = "jinja2"
cve = "CVE-2024-22195"
expires = "2026-06-30"
reason = "sandbox not used"
approved_by = "secops"
"#;
    let run = UpgradeGuard::new(evidence(&fx, body, "2026-02-20"), &fixed_context()).evaluate();

    assert_eq!(run.suppressed.len(), 1);
    let hidden = &run.suppressed[0];
    assert_eq!(hidden.cve, "GHSA-h5c8-rqwp-cp95");
    assert_eq!(hidden.snooze_id, "jinja-sandbox");
    assert_eq!(hidden.approved_by.as_deref(), Some("secops"));

    let jinja = run.assessment("jinja2").unwrap();
    assert_eq!(jinja.risk, RiskLevel::Safe);
    assert!(jinja.cve_ids.is_empty());
    assert_eq!(run.highest_risk(), RiskLevel::NeedsReview);
    assert_eq!(run.exit_code, 0);
}

#[test]
fn expired_snooze_does_not_apply() {
    let fx = Fixture::new().unwrap();
    let body = r#"
[governance.snoozes.jinja-sandbox]
package = "jinja2"
cve = "CVE-2024-22195"
expires = "2026-02-01"
"#;
    let run = UpgradeGuard::new(evidence(&fx, body, "2026-02-20"), &fixed_context()).evaluate();
    assert!(run.suppressed.is_empty());
    assert_eq!(run.assessment("jinja2").unwrap().risk, RiskLevel::Blocked);
}

#[test]
fn expired_contract_fails_the_run() {
    let fx = Fixture::new().unwrap();
    let contract = fx
        .write_text("contract.toml", &contract_text("2025-12-01", 14, ""))
        .unwrap();
    let config = GuardConfig::new().with_contract(contract);
    let run = UpgradeGuard::new(config, &fixed_context()).evaluate();

    let eval = run.contract.as_ref().unwrap();
    assert_eq!(eval.status, ContractStatus::Expired);
    assert_eq!(eval.risk, RiskLevel::Blocked);
    assert!(run.packages.is_empty());
    assert_eq!(run.exit_code, 1);
}

#[test]
fn denylisted_package_is_blocked_by_policy() {
    let fx = Fixture::new().unwrap();
    let body = r#"
[dependency_policy.denylist.requests]
reason = "Use httpx"
"#;
    let run = UpgradeGuard::new(evidence(&fx, body, "2026-02-20"), &fixed_context()).evaluate();
    let requests = run.assessment("requests").unwrap();
    assert_eq!(requests.risk, RiskLevel::Blocked);
    assert!(requests.reasons.iter().any(|r| r == "policy: Use httpx"));
    assert!(run.policy.as_ref().is_some_and(|p| p.denylisted == 1));
}

#[test]
fn malformed_sources_degrade_gracefully() {
    let fx = Fixture::new().unwrap();
    let sbom = fx.write_text("sbom.json", "{ not json").unwrap();
    let cve = fx.write_json("osv.json", &serde_json::json!({"packages": []})).unwrap();
    let preflight = fx
        .write_json("preflight.json", &preflight_doc(&[("demo", "1.0.0", "1.0.1", "ok")]))
        .unwrap();
    let config = GuardConfig::new()
        .with_sbom(sbom)
        .with_cve_scan(cve)
        .with_preflight(preflight)
        .with_metadata(fx.path("missing-metadata.json"));

    let run = UpgradeGuard::new(config, &fixed_context()).evaluate();

    assert_eq!(run.sources["sbom"].state, SourceState::Error);
    assert_eq!(run.sources["cve"].state, SourceState::Error);
    assert_eq!(run.sources["preflight"].state, SourceState::Ok);
    assert_eq!(run.sources["contract"].state, SourceState::Missing);
    assert_eq!(run.summary.total, 1);
    assert_eq!(run.exit_code, 0);
}
