//! End-to-end test: OSV scan imported into the persisted security overlay.

use depgov_security::SecurityOverlay;
use depgov_tests::{osv_doc, Fixture, OsvEntry};
use depgov_types::Severity;

fn scan(fx: &Fixture) -> std::path::PathBuf {
    fx.write_json(
        "osv.json",
        &osv_doc(&[
            OsvEntry {
                package: "Django",
                version: "4.2.0",
                id: "CVE-2024-0001",
                aliases: &[],
                severity: "CRITICAL",
                fixed: Some("4.2.8"),
            },
            OsvEntry {
                package: "django",
                version: "4.2.0",
                id: "CVE-2024-0002",
                aliases: &[],
                severity: "HIGH",
                fixed: Some("4.2.5"),
            },
            OsvEntry {
                package: "pyyaml",
                version: "5.3",
                id: "CVE-2020-14343",
                aliases: &["GHSA-8q59-q68h-6hv4"],
                severity: "MODERATE",
                fixed: Some("5.4"),
            },
        ]),
    )
    .unwrap()
}

#[test]
fn import_builds_constraints_and_persists() {
    let fx = Fixture::new().unwrap();
    let overlay_path = fx.path("state/security-overlay.json");

    let mut overlay = SecurityOverlay::load(&overlay_path).unwrap();
    assert_eq!(overlay.import_osv_scan(&scan(&fx)).unwrap(), 3);
    overlay.save().unwrap();

    let reloaded = SecurityOverlay::load(&overlay_path).unwrap();
    assert_eq!(reloaded, overlay);
    assert_eq!(reloaded.cve_database.len(), 3);

    // Only severe findings raise minimums; the highest fix wins.
    let django = reloaded.constraint_for("Django").unwrap();
    assert_eq!(django.min_version.as_deref(), Some("4.2.8"));
    assert_eq!(django.cve_ids.len(), 2);
    assert!(reloaded.constraint_for("pyyaml").is_none());

    assert!(reloaded.check_version("django", "4.2.5").is_some());
    assert!(reloaded.check_version("django", "4.2.8").is_none());

    let open = reloaded.vulnerabilities_for("django", "4.2.5");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, "CVE-2024-0001");
    assert_eq!(reloaded.highest_severity("django", "4.2.0"), Some(Severity::Critical));
    assert_eq!(reloaded.highest_severity("pyyaml", "5.3"), Some(Severity::Medium));
    assert_eq!(reloaded.highest_severity("pyyaml", "5.4"), None);
}

#[test]
fn reimport_is_idempotent() {
    let fx = Fixture::new().unwrap();
    let scan = scan(&fx);
    let mut overlay = SecurityOverlay::default();
    overlay.import_osv_scan(&scan).unwrap();
    let first = overlay.clone();
    overlay.import_osv_scan(&scan).unwrap();
    assert_eq!(overlay, first);
}
