#![deny(unsafe_code)]
//! # depgov-guard
//!
//! The upgrade guard. Loads five evidence sources (preflight report, OSV CVE
//! scan, SBOM, policy contract, package metadata), each of which may be
//! missing or malformed without aborting the run, and folds them into one
//! [`PackageAssessment`](depgov_types::PackageAssessment) per package.
//!
//! Stages, in order:
//! 1. Load sources into [`SourceStatus`](depgov_types::SourceStatus) values.
//! 2. Evaluate contract freshness ([`evaluate_contract_metadata`]).
//! 3. Evaluate every package: policy, preflight status, drift, CVEs.
//! 4. Compare the highest risk with the fail threshold and write artifacts.

pub mod config;
pub mod contract;
pub mod error;
pub mod guard;
pub mod preflight;
pub mod report;

pub use config::GuardConfig;
pub use contract::{
    evaluate_contract_metadata, ContractDocument, ContractEvaluation, ContractMetadata,
    ContractStatus, Snooze,
};
pub use error::GuardError;
pub use guard::UpgradeGuard;
pub use preflight::{load_preflight, PreflightPackage, PreflightReport};
pub use report::{render_markdown, write_artifacts, GuardRun, GuardSummary, SuppressedFinding};
