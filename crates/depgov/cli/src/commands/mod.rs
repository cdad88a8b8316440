//! CLI command implementations

pub mod conflicts;
pub mod policy;
pub mod run;
pub mod security;
