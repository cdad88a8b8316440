//! Risk tiers for upgrade decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Overall verdict for a package or a run.
///
/// Ordered `Safe < NeedsReview < Blocked`. Within one assessment the risk only
/// ever moves up this order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    #[default]
    Safe,
    NeedsReview,
    Blocked,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Safe, RiskLevel::NeedsReview, RiskLevel::Blocked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::NeedsReview => "needs-review",
            Self::Blocked => "blocked",
        }
    }

    /// Zero-based position in the ordering.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::NeedsReview => 1,
            Self::Blocked => 2,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "safe" => Ok(Self::Safe),
            "needs-review" | "review" => Ok(Self::NeedsReview),
            "blocked" => Ok(Self::Blocked),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}
