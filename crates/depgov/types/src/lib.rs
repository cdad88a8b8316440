#![deny(unsafe_code)]
//! # depgov-types
//!
//! Shared vocabulary for the dependency upgrade governance engine.
//!
//! This crate provides:
//! - **Risk and severity tiers** ([`RiskLevel`], [`Severity`], [`DriftSeverity`]).
//! - **Version handling** for Python-style package versions mapped onto
//!   [`semver::Version`] ([`parse_version`], [`VersionSpecifier`], [`Requirement`]).
//! - **Per-package assessments** with monotonic risk ([`PackageAssessment`]).
//! - **Evidence source states** ([`SourceState`], [`SourceStatus`], [`SourceLoad`]).
//! - **SBOM documents** ([`Sbom`], [`SbomComponent`]).
//! - **The run context** passed into every engine ([`RunContext`]).

pub mod assessment;
pub mod context;
pub mod error;
pub mod risk;
pub mod sbom;
pub mod severity;
pub mod source;
pub mod specifier;
pub mod version;

pub use assessment::PackageAssessment;
pub use context::RunContext;
pub use error::LoadError;
pub use risk::RiskLevel;
pub use sbom::{Sbom, SbomComponent};
pub use severity::{DriftSeverity, Severity};
pub use source::{SourceLoad, SourceState, SourceStatus};
pub use specifier::{normalize_specifier, Operator, Requirement, SpecifierError, VersionSpecifier};
pub use version::{canonical_name, classify_delta, is_prerelease, major_jump, parse_version};
