#![deny(unsafe_code)]
//! # depgov-planner
//!
//! Turns a guard run plus an SBOM into a ranked list of upgrade candidates
//! and attempts them, one at a time, through a [`Resolver`].
//!
//! Scoring favours security fixes, then staleness, and penalises policy
//! friction. Attempts are strictly sequential with a per-attempt timeout and
//! no retries.

pub mod error;
pub mod planner;
pub mod resolver;
pub mod types;

pub use error::PlannerError;
pub use planner::{build_candidates, UpgradePlanner};
pub use resolver::{CommandResolver, Resolver, SimulatedResolver};
pub use types::{
    PlanEntry, PlannerConfig, PlannerRun, PlannerSummary, ResolverResult, ResolverStatus,
    ScoreBreakdown, UpgradeCandidate, DEFAULT_COMMAND_TEMPLATE,
};
