#![deny(unsafe_code)]
//! # depgov-policy
//!
//! Policy engine for dependency upgrades. Answers three questions against a
//! [`DependencyPolicy`] loaded from the `[dependency_policy]` section of a
//! policy contract:
//!
//! - is package X allowed at all ([`PolicyEngine::check_package_allowed`]);
//! - is version V of X allowed ([`PolicyEngine::check_version_allowed`]);
//! - which rules does an upgrade A→B break ([`PolicyEngine::check_upgrade_allowed`]).
//!
//! Upgrade checks collect every violation instead of stopping at the first.

pub mod engine;
pub mod error;
pub mod types;

pub use engine::PolicyEngine;
pub use error::PolicyError;
pub use types::{
    DependencyPolicy, PackagePolicy, PolicySummary, PolicyViolation, ViolationKind,
    ViolationSeverity,
};
