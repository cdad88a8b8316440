use chrono::{DateTime, Utc};
use depgov_types::{canonical_name, DriftSeverity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Resolver command; `{package}` and `{version}` are substituted per token.
pub const DEFAULT_COMMAND_TEMPLATE: &str = "uv lock --upgrade-package {package}=={version}";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Stop attempting once this many attempts have succeeded; `None` attempts
    /// every candidate.
    pub limit: Option<usize>,
    pub allow_major: bool,
    pub skip_resolver: bool,
    pub timeout: Duration,
    pub command_template: String,
    /// Canonical names to restrict planning to; `None` plans everything.
    pub packages: Option<BTreeSet<String>>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            limit: None,
            allow_major: false,
            skip_resolver: false,
            timeout: Duration::from_secs(300),
            command_template: DEFAULT_COMMAND_TEMPLATE.to_string(),
            packages: None,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_allow_major(mut self, allow: bool) -> Self {
        self.allow_major = allow;
        self
    }

    pub fn with_skip_resolver(mut self, skip: bool) -> Self {
        self.skip_resolver = skip;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_command_template(mut self, template: impl Into<String>) -> Self {
        self.command_template = template.into();
        self
    }

    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.packages = Some(packages.into_iter().map(|p| canonical_name(p.as_ref())).collect());
        self
    }

    /// Render the command for one candidate as an argv vector.
    pub fn render_command(&self, package: &str, version: &str) -> Vec<String> {
        self.command_template
            .split_whitespace()
            .map(|token| token.replace("{package}", package).replace("{version}", version))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// 10 × CVE severity rank (1..4), 0 without findings.
    pub security: i32,
    /// 5 × drift rank (0..3).
    pub staleness: i32,
    /// −3 × risk rank (0..2).
    pub policy_friction: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.security + self.staleness + self.policy_friction
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeCandidate {
    pub package: String,
    pub canonical: String,
    pub current_version: String,
    pub latest_version: String,
    pub severity: DriftSeverity,
    pub notes: Vec<String>,
    pub score: i32,
    pub breakdown: ScoreBreakdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStatus {
    Success,
    Failure,
    Skipped,
}

impl fmt::Display for ResolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Skipped => "skipped",
        })
    }
}

/// Outcome of one resolver attempt (or of deciding not to attempt).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolverResult {
    pub status: ResolverStatus,
    pub command: Vec<String>,
    pub returncode: Option<i32>,
    /// Wall-clock seconds.
    pub duration: f64,
    pub stdout: String,
    pub stderr: String,
    pub reason: Option<String>,
}

impl ResolverResult {
    pub fn skipped(command: Vec<String>, reason: impl Into<String>) -> Self {
        Self {
            status: ResolverStatus::Skipped,
            command,
            returncode: None,
            duration: 0.0,
            stdout: String::new(),
            stderr: String::new(),
            reason: Some(reason.into()),
        }
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub candidate: UpgradeCandidate,
    pub result: ResolverResult,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerSummary {
    pub candidates: usize,
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannerRun {
    pub generated_at: DateTime<Utc>,
    pub summary: PlannerSummary,
    /// Commands to run by hand for every skipped or failed attempt.
    pub recommended_commands: Vec<String>,
    pub attempts: Vec<PlanEntry>,
    pub exit_code: i32,
}
