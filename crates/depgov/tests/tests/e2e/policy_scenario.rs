//! End-to-end test: policy contract loaded from disk and queried.
//!
//! Verifies that:
//! - Denylist wins over everything and carries its reason
//! - Default-deny rejects packages missing from the allowlist
//! - Upgrade checks report every broken rule with its severity

use depgov_policy::{PolicyEngine, ViolationKind, ViolationSeverity};
use depgov_tests::{fixed_context, fixed_now, Fixture};

const CONTRACT: &str = r#"
[contract]
status = "active"
last_validated = "2026-02-20"

[dependency_policy]
default_allowed = false
max_major_version_jump = 1
upgrade_cadence_days = 30

[dependency_policy.allowlist.demo]
min_version = "1.0.0"
max_version = "3.9.9"
blocked_versions = ["2.1.0"]

[dependency_policy.allowlist.reviewed]
requires_review = true

[dependency_policy.denylist.legacy]
reason = "Nope"
"#;

fn engine(fx: &Fixture) -> PolicyEngine {
    let path = fx.write_text("contract.toml", CONTRACT).unwrap();
    PolicyEngine::from_contract_path(&path, &fixed_context()).unwrap()
}

#[test]
fn package_decisions() {
    let fx = Fixture::new().unwrap();
    let engine = engine(&fx);

    assert_eq!(
        engine.check_package_allowed("legacy"),
        (false, Some("Nope".to_string()))
    );
    assert_eq!(engine.check_package_allowed("demo"), (true, None));
    assert_eq!(
        engine.check_package_allowed("unknown"),
        (
            false,
            Some("Package not in allowlist and default policy is deny".to_string())
        )
    );
}

#[test]
fn version_decisions() {
    let fx = Fixture::new().unwrap();
    let engine = engine(&fx);

    assert!(engine.check_version_allowed("demo", "2.0.0").0);
    assert!(!engine.check_version_allowed("demo", "2.1.0").0);
    assert!(!engine.check_version_allowed("demo", "0.9.0").0);
    assert!(!engine.check_version_allowed("demo", "4.0.0").0);
    assert!(!engine.check_version_allowed("demo", "2.0.0rc1").0);
    assert!(!engine.check_version_allowed("demo", "not-a-version").0);
}

#[test]
fn upgrade_violations_accumulate() {
    let fx = Fixture::new().unwrap();
    let mut engine = engine(&fx);

    let clean = engine.check_upgrade_allowed("demo", "1.0.0", "2.0.0");
    assert!(clean.is_empty(), "unexpected violations: {clean:?}");

    let jump = engine.check_upgrade_allowed("demo", "1.0.0", "3.0.0");
    assert_eq!(jump.len(), 1);
    assert_eq!(jump[0].kind, ViolationKind::MajorVersionJump);
    assert_eq!(jump[0].severity, ViolationSeverity::Error);

    engine.record_upgrade_at("demo", fixed_now() - chrono::Duration::days(3));
    let cadence = engine.check_upgrade_allowed("demo", "2.0.0", "2.0.1");
    assert_eq!(cadence.len(), 1);
    assert_eq!(cadence[0].kind, ViolationKind::UpgradeCadence);
    assert_eq!(cadence[0].severity, ViolationSeverity::Warning);

    let denied = engine.check_upgrade_allowed("legacy", "1.0.0", "1.1.0");
    assert!(denied.iter().any(|v| v.kind == ViolationKind::PackageDenied && v.is_error()));

    let review = engine.check_upgrade_allowed("reviewed", "1.0.0", "1.0.1");
    assert_eq!(review.len(), 1);
    assert_eq!(review[0].kind, ViolationKind::ReviewRequired);
}
