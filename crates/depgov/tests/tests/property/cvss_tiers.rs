//! Property tests: CVSS scores map onto severity tiers, boundaries upward.

use depgov_types::Severity;
use proptest::prelude::*;

#[test]
fn boundaries_map_to_the_higher_tier() {
    assert_eq!(Severity::from_cvss(9.0), Severity::Critical);
    assert_eq!(Severity::from_cvss(7.0), Severity::High);
    assert_eq!(Severity::from_cvss(4.0), Severity::Medium);
    assert_eq!(Severity::from_cvss(3.99), Severity::Low);
    assert_eq!(Severity::from_cvss(0.0), Severity::Low);
}

proptest! {
    #[test]
    fn tiers_follow_thresholds(score in 0.0f64..=10.0) {
        let expected = if score >= 9.0 {
            Severity::Critical
        } else if score >= 7.0 {
            Severity::High
        } else if score >= 4.0 {
            Severity::Medium
        } else {
            Severity::Low
        };
        prop_assert_eq!(Severity::from_cvss(score), expected);
    }

    /// A higher score never yields a lower severity.
    #[test]
    fn severity_is_monotonic_in_score(a in 0.0f64..=10.0, b in 0.0f64..=10.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(Severity::from_cvss(lo) <= Severity::from_cvss(hi));
    }
}
