#![deny(unsafe_code)]
//! # depgov-status
//!
//! One-shot dependency status: the upgrade guard, followed by the upgrade
//! planner when an SBOM is available and planning is enabled.

pub mod error;
pub mod status;

pub use error::StatusError;
pub use status::{run_dependency_status, DependencyStatus, StatusConfig, StatusSummary};
