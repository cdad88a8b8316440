#![deny(unsafe_code)]
//! # depgov-drift
//!
//! How far behind is each package, and does it need a look?
//!
//! - [`assess_drift`] classifies the current→latest delta into a
//!   [`DriftSeverity`](depgov_types::DriftSeverity) tier.
//! - [`assess_drift_with_age`] adds review notes from the [`DriftPolicy`]
//!   windows without ever changing the tier.
//! - [`loader`] reads the SBOM, package metadata and `[drift_policy]` inputs.

pub mod analyzer;
pub mod loader;
pub mod types;

pub use analyzer::{assess_drift, assess_drift_with_age, drift_score};
pub use loader::{load_metadata, load_sbom, parse_policy, PackageMetadata};
pub use types::{DriftOverride, DriftPolicy, PackageDrift};
