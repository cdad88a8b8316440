#[path = "e2e/guard_pipeline.rs"]
mod guard_pipeline;

#[path = "e2e/policy_scenario.rs"]
mod policy_scenario;

#[path = "e2e/security_overlay.rs"]
mod security_overlay;

#[path = "e2e/conflict_detection.rs"]
mod conflict_detection;

#[path = "e2e/status_flow.rs"]
mod status_flow;
