#[path = "property/risk_elevation.rs"]
mod risk_elevation;

#[path = "property/cvss_tiers.rs"]
mod cvss_tiers;

#[path = "property/contract_age.rs"]
mod contract_age;

#[path = "property/conflict_resolution.rs"]
mod conflict_resolution;

#[path = "property/overlay_constraints.rs"]
mod overlay_constraints;

#[path = "property/planner_limits.rs"]
mod planner_limits;
