//! Property tests: contract age maps onto fresh / stale / expired.

use chrono::Duration;
use depgov_guard::{evaluate_contract_metadata, ContractMetadata, ContractStatus};
use depgov_tests::fixed_now;
use depgov_types::RiskLevel;
use proptest::prelude::*;

fn metadata(age_days: i64, review_days: u32) -> ContractMetadata {
    let validated = fixed_now() - Duration::days(age_days);
    ContractMetadata {
        status: Some("active".into()),
        last_validated: Some(validated.format("%Y-%m-%d").to_string()),
        default_review_days: review_days,
    }
}

#[test]
fn default_window_examples() {
    let check = |age, status| {
        assert_eq!(evaluate_contract_metadata(&metadata(age, 14), fixed_now()).status, status);
    };
    check(0, ContractStatus::Fresh);
    check(20, ContractStatus::Stale);
    check(40, ContractStatus::Expired);
}

#[test]
fn missing_date_is_unknown() {
    let meta = ContractMetadata {
        last_validated: None,
        ..metadata(0, 14)
    };
    let eval = evaluate_contract_metadata(&meta, fixed_now());
    assert_eq!(eval.status, ContractStatus::Unknown);
    assert_eq!(eval.risk, RiskLevel::NeedsReview);
}

proptest! {
    #[test]
    fn age_tiers(age in 0i64..400, review in 1u32..120) {
        let eval = evaluate_contract_metadata(&metadata(age, review), fixed_now());
        let r = i64::from(review);
        let (status, risk) = if age <= r {
            (ContractStatus::Fresh, RiskLevel::Safe)
        } else if age <= 2 * r {
            (ContractStatus::Stale, RiskLevel::NeedsReview)
        } else {
            (ContractStatus::Expired, RiskLevel::Blocked)
        };
        prop_assert_eq!(eval.status, status);
        prop_assert_eq!(eval.risk, risk);
        prop_assert_eq!(eval.age_days, Some(age));
    }
}
