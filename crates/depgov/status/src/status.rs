use depgov_guard::{GuardConfig, GuardRun, UpgradeGuard};
use depgov_planner::{PlannerConfig, PlannerError, PlannerRun, Resolver, UpgradePlanner};
use depgov_types::{RiskLevel, RunContext};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::StatusError;

const PLANNER_DISABLED: &str = "planner skipped by configuration";
const PLANNER_NO_SBOM: &str = "planner skipped (no SBOM provided)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusConfig {
    pub guard: GuardConfig,
    /// SBOM for planning. Falls back to the guard's SBOM when unset.
    pub sbom: Option<PathBuf>,
    pub planner_enabled: bool,
    pub planner: PlannerConfig,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            guard: GuardConfig::default(),
            sbom: None,
            planner_enabled: true,
            planner: PlannerConfig::default(),
        }
    }
}

impl StatusConfig {
    pub fn new(guard: GuardConfig) -> Self {
        Self {
            guard,
            ..Self::default()
        }
    }

    pub fn with_sbom(mut self, path: impl AsRef<Path>) -> Self {
        self.sbom = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_planner_enabled(mut self, enabled: bool) -> Self {
        self.planner_enabled = enabled;
        self
    }

    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    fn sbom_path(&self) -> Option<&Path> {
        self.sbom.as_deref().or(self.guard.sbom.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Highest guard risk.
    pub highest_severity: RiskLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub guard: GuardRun,
    pub planner: Option<PlannerRun>,
    pub planner_reason: Option<String>,
    pub exit_code: i32,
    pub summary: StatusSummary,
}

impl DependencyStatus {
    pub fn to_json_pretty(&self) -> Result<String, StatusError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run the guard, then the planner if enabled and an SBOM is available.
///
/// Without an explicit `resolver` the planner spawns the configured command.
pub fn run_dependency_status(
    config: &StatusConfig,
    ctx: &RunContext,
    resolver: Option<Box<dyn Resolver>>,
) -> Result<DependencyStatus, StatusError> {
    let guard = UpgradeGuard::new(config.guard.clone(), ctx).run()?;
    let highest = guard.highest_risk();

    let (planner, planner_reason, planner_exit) = match config.sbom_path() {
        _ if !config.planner_enabled => (None, Some(PLANNER_DISABLED.to_string()), 0),
        None => (None, Some(PLANNER_NO_SBOM.to_string()), 0),
        Some(sbom) => {
            let mut planner = UpgradePlanner::new(config.planner.clone(), ctx);
            if let Some(resolver) = resolver {
                planner = planner.with_resolver(resolver);
            }
            match planner.plan_from_path(&guard, sbom) {
                Ok(run) => {
                    let code = run.exit_code;
                    (Some(run), None, code)
                }
                Err(e) => {
                    warn!(error = %e, "planner aborted");
                    (None, Some(e.to_string()), PlannerError::EXIT_CODE)
                }
            }
        }
    };

    let exit_code = guard.exit_code.max(planner_exit);
    info!(
        highest_risk = %highest,
        guard_exit = guard.exit_code,
        planner_exit,
        exit_code,
        "Dependency status complete"
    );
    Ok(DependencyStatus {
        guard,
        planner,
        planner_reason,
        exit_code,
        summary: StatusSummary {
            highest_severity: highest,
        },
    })
}
