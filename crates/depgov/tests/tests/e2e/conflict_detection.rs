//! End-to-end test: conflicts across pyproject.toml and uv.lock.

use depgov_conflicts::{load_manifest, ConflictResolver, ResolutionType};
use depgov_tests::{fixed_context, Fixture};
use depgov_types::Severity;

const PYPROJECT: &str = r#"
[project]
name = "service"
version = "0.3.0"
dependencies = [
    "requests >= 2.31",
    "pydantic>=2.5,<3",
    "httpx[http2]==0.27.0 ; python_version >= '3.10'",
]

[project.optional-dependencies]
dev = ["pytest>=8"]
"#;

const LOCK: &str = r#"
version = 1

[[package]]
name = "service"
version = "0.3.0"

[package.metadata]
requires-dist = [{ name = "requests", specifier = ">=2.0" }]

[[package]]
name = "sdk-client"
version = "1.4.0"

[package.metadata]
requires-dist = [
    { name = "requests", specifier = "<2.30" },
    { name = "urllib3", specifier = "<2" },
    { name = "pydantic", specifier = "<3, >=2.5" },
]

[[package]]
name = "botocore"
version = "1.34.0"

[package.metadata]
requires-dist = [{ name = "urllib3", specifier = ">=1.25.4,<1.27" }]
"#;

#[test]
fn detects_and_resolves_conflicts() {
    let fx = Fixture::new().unwrap();
    let pyproject = fx.write_text("pyproject.toml", PYPROJECT).unwrap();
    let lock = fx.write_text("uv.lock", LOCK).unwrap();

    let manifest = load_manifest(&pyproject, Some(&lock)).unwrap();
    assert_eq!(manifest.project_name.as_deref(), Some("service"));
    // The root project's own lock entry is not a transitive requirer.
    assert_eq!(manifest.constraints["requests"].len(), 2);

    let report = ConflictResolver::new(&fixed_context()).analyze_conflicts(&manifest);

    // pydantic constraints are equivalent once normalised.
    let packages: Vec<&str> = report.conflicts.iter().map(|c| c.package.as_str()).collect();
    assert_eq!(packages, vec!["requests", "urllib3"]);
    assert_eq!(report.summary["total"], 2);
    assert_eq!(report.summary["version"], 2);
    assert_eq!(report.auto_resolvable, 1);

    let requests = &report.conflicts[0];
    assert!(requests.auto_resolvable);
    assert_eq!(requests.severity, Severity::High);
    let pin = report.resolution_for("requests").unwrap();
    assert_eq!(pin.resolution_type, ResolutionType::Pin);
    assert_eq!(pin.target_version.as_deref(), Some(">=2.31"));
    assert_eq!(pin.commands[0], "uv add \"requests>=2.31\"");

    let urllib3 = &report.conflicts[1];
    assert!(!urllib3.auto_resolvable);
    assert_eq!(urllib3.severity, Severity::Medium);
    let manual = report.resolution_for("urllib3").unwrap();
    assert_eq!(manual.resolution_type, ResolutionType::Manual);
    assert!(manual.target_version.is_none());
}

#[test]
fn missing_lock_only_uses_direct_requirements() {
    let fx = Fixture::new().unwrap();
    let pyproject = fx.write_text("pyproject.toml", PYPROJECT).unwrap();
    let manifest = load_manifest(&pyproject, Some(&fx.path("uv.lock"))).unwrap();
    assert_eq!(manifest.package_count(), 4);

    let report = ConflictResolver::new(&fixed_context()).analyze_conflicts(&manifest);
    assert!(!report.has_conflicts());
}
