//! Property tests: one direct requirement pins, anything else is manual.

use depgov_conflicts::{ConflictResolver, DependencyConstraint, DependencyManifest, ResolutionType};
use depgov_tests::fixed_context;
use proptest::prelude::*;

fn manifest(direct: usize, transitive: usize) -> DependencyManifest {
    let direct = (0..direct).map(|i| DependencyConstraint::direct("demo", format!(">=1.{i}")));
    let transitive = (0..transitive)
        .map(|j| DependencyConstraint::transitive("demo", format!("<{}", j + 2), format!("lib-{j}")));
    DependencyManifest::from_constraints(direct.chain(transitive))
}

proptest! {
    #[test]
    fn pin_iff_exactly_one_direct(direct in 0usize..4, transitive in 0usize..4) {
        prop_assume!(direct + transitive >= 2);
        let report = ConflictResolver::new(&fixed_context()).analyze_conflicts(&manifest(direct, transitive));

        prop_assert_eq!(report.conflicts.len(), 1);
        let conflict = &report.conflicts[0];
        let resolution = report.resolution_for("demo").unwrap();
        if direct == 1 {
            prop_assert!(conflict.auto_resolvable);
            prop_assert_eq!(resolution.resolution_type, ResolutionType::Pin);
            prop_assert_eq!(resolution.target_version.as_deref(), Some(">=1.0"));
            prop_assert_eq!(report.auto_resolvable, 1);
        } else {
            prop_assert!(!conflict.auto_resolvable);
            prop_assert_eq!(resolution.resolution_type, ResolutionType::Manual);
            prop_assert!(resolution.target_version.is_none());
            prop_assert_eq!(report.auto_resolvable, 0);
        }
    }

    /// Equivalent spellings of one specifier never conflict.
    #[test]
    fn equivalent_specifiers_do_not_conflict(minor in 0u32..50, spaces in 0usize..3) {
        let pad = " ".repeat(spaces);
        let manifest = DependencyManifest::from_constraints([
            DependencyConstraint::direct("demo", format!(">=1.{minor},<2")),
            DependencyConstraint::transitive("demo", format!("<2{pad},{pad}>=1.{minor}.0"), "lib"),
        ]);
        let report = ConflictResolver::new(&fixed_context()).analyze_conflicts(&manifest);
        prop_assert!(!report.has_conflicts());
    }
}
