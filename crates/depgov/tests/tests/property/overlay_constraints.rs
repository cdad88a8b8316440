//! Property tests: overlay imports are idempotent, never lower a minimum and
//! survive a save/load round trip.

use depgov_security::{CveRecord, OsvFinding, SecurityOverlay};
use depgov_tests::Fixture;
use depgov_types::{parse_version, Severity};
use proptest::prelude::*;

fn arb_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Low),
        Just(Severity::Medium),
        Just(Severity::High),
        Just(Severity::Critical),
    ]
}

/// Findings against a small set of packages so constraints collide.
fn arb_finding() -> impl Strategy<Value = OsvFinding> {
    (
        prop_oneof![Just("alpha"), Just("beta"), Just("gamma")],
        0u32..500,
        (0u64..4, 0u64..10, 0u64..10),
        arb_severity(),
    )
        .prop_map(|(package, n, (major, minor, patch), severity)| OsvFinding {
            package: package.to_string(),
            version: None,
            record: CveRecord {
                id: format!("CVE-2024-{n:04}"),
                package: package.to_string(),
                affected_versions: Vec::new(),
                fixed_version: Some(format!("{major}.{minor}.{patch}")),
                severity,
                cvss_score: Some(severity.representative_score()),
                description: String::new(),
                published: None,
                references: Vec::new(),
                aliases: Vec::new(),
            },
        })
}

proptest! {
    #[test]
    fn import_is_idempotent(findings in prop::collection::vec(arb_finding(), 0..30)) {
        let mut overlay = SecurityOverlay::default();
        overlay.import_findings(findings.clone());
        let once = overlay.clone();
        overlay.import_findings(findings);
        prop_assert_eq!(overlay, once);
    }

    #[test]
    fn minimum_never_lowers(findings in prop::collection::vec(arb_finding(), 1..30)) {
        let mut overlay = SecurityOverlay::default();
        for finding in findings {
            let package = finding.package.clone();
            let before = overlay
                .constraint_for(&package)
                .and_then(|c| c.min_version.as_deref())
                .and_then(parse_version);
            overlay.import_findings([finding]);
            let after = overlay
                .constraint_for(&package)
                .and_then(|c| c.min_version.as_deref())
                .and_then(parse_version);
            if let Some(before) = before {
                prop_assert!(after.is_some_and(|a| a >= before));
            }
        }
    }

    #[test]
    fn save_load_round_trip(findings in prop::collection::vec(arb_finding(), 0..20)) {
        let fx = Fixture::new().unwrap();
        let path = fx.path("overlay.json");
        let mut overlay = SecurityOverlay::load(&path).unwrap();
        overlay.import_findings(findings);
        overlay.save().unwrap();
        prop_assert_eq!(SecurityOverlay::load(&path).unwrap(), overlay);
    }
}
