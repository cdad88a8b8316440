#![deny(unsafe_code)]
//! # depgov-conflicts
//!
//! Collects every version constraint declared against each package (direct,
//! dev and transitive requirers), detects packages whose constraints disagree
//! and proposes a resolution:
//!
//! - exactly one direct constraint → **pin** the package to the project's own
//!   requirement;
//! - zero or several direct constraints → **manual** review, with read-only
//!   inspection commands.

pub mod error;
pub mod manifest;
pub mod resolver;
pub mod types;

pub use error::ConflictError;
pub use manifest::{collect_constraints, load_manifest, DependencyManifest};
pub use resolver::ConflictResolver;
pub use types::{
    Conflict, ConflictAnalysisReport, ConflictKind, DependencyConstraint, Resolution,
    ResolutionType, ROOT_DEV_REQUIRER, ROOT_REQUIRER,
};
