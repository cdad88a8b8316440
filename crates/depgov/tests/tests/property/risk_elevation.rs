//! Property tests: risk elevation is monotonic and order-independent.

use depgov_types::{PackageAssessment, RiskLevel};
use proptest::prelude::*;

fn arb_risk() -> impl Strategy<Value = RiskLevel> {
    prop_oneof![
        Just(RiskLevel::Safe),
        Just(RiskLevel::NeedsReview),
        Just(RiskLevel::Blocked),
    ]
}

fn elevate_all(steps: &[RiskLevel]) -> PackageAssessment {
    let mut a = PackageAssessment::new("demo", Some("1.0.0".into()), None);
    for (i, risk) in steps.iter().enumerate() {
        a.elevate(*risk, format!("step {i}"));
    }
    a
}

proptest! {
    /// Risk never decreases as reasons are added.
    #[test]
    fn elevation_is_monotonic(steps in prop::collection::vec(arb_risk(), 0..20)) {
        let mut a = PackageAssessment::new("demo", None, None);
        let mut previous = a.risk;
        for risk in steps {
            a.elevate(risk, "step");
            prop_assert!(a.risk >= previous);
            prop_assert!(a.risk >= risk);
            previous = a.risk;
        }
    }

    /// The final risk is the maximum of all steps, whatever their order.
    #[test]
    fn elevation_is_commutative(steps in prop::collection::vec(arb_risk(), 1..20)) {
        let forward = elevate_all(&steps);
        let mut reversed_steps = steps.clone();
        reversed_steps.reverse();
        let reversed = elevate_all(&reversed_steps);

        let expected = steps.iter().copied().max().unwrap_or_default();
        prop_assert_eq!(forward.risk, expected);
        prop_assert_eq!(reversed.risk, expected);
        prop_assert_eq!(forward.reasons.len(), steps.len());
    }
}
