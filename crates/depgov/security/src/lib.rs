#![deny(unsafe_code)]
//! # depgov-security
//!
//! Persistent security overlay for dependency governance:
//!
//! - [`parse_osv_findings`] turns an OSV scanner report into typed
//!   [`OsvFinding`]s (shared with the upgrade guard).
//! - [`SecurityOverlay`] keeps a CVE database and one minimum-version
//!   [`SecurityConstraint`] per package, raised by high and critical CVEs that
//!   carry a fixed version and never lowered.

pub mod error;
pub mod osv;
pub mod overlay;
pub mod types;

pub use error::SecurityError;
pub use osv::{load_osv_findings, parse_osv_findings, OsvFinding};
pub use overlay::SecurityOverlay;
pub use types::{AffectedRange, CveRecord, SecurityConstraint};
