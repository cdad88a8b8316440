//! CLI configuration file (`depgov.toml`)

use anyhow::Context;
use depgov_types::RiskLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "depgov.toml";
/// Where reports and state land unless configured otherwise.
pub const DEFAULT_OUTPUT_DIR: &str = ".depgov";
const GUARD_JSON_FILE: &str = "guard-report.json";
const GUARD_MARKDOWN_FILE: &str = "guard-report.md";

/// Default input and output locations. Command-line flags win over these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub inputs: InputPaths,
    pub outputs: OutputPaths,
    pub guard: GuardDefaults,
    pub planner: PlannerDefaults,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputPaths {
    pub preflight: Option<PathBuf>,
    pub cve_scan: Option<PathBuf>,
    pub sbom: Option<PathBuf>,
    pub contract: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub pyproject: Option<PathBuf>,
    pub lock: Option<PathBuf>,
    pub overlay: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputPaths {
    /// Directory for reports without an explicit path.
    pub dir: Option<PathBuf>,
    pub guard_json: Option<PathBuf>,
    pub guard_markdown: Option<PathBuf>,
}

impl OutputPaths {
    pub fn report_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    /// The guard JSON report is always written; this is where.
    pub fn guard_json_path(&self) -> PathBuf {
        self.guard_json
            .clone()
            .unwrap_or_else(|| self.report_dir().join(GUARD_JSON_FILE))
    }

    pub fn guard_markdown_path(&self) -> PathBuf {
        self.guard_markdown
            .clone()
            .unwrap_or_else(|| self.report_dir().join(GUARD_MARKDOWN_FILE))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardDefaults {
    pub fail_threshold: Option<RiskLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerDefaults {
    pub limit: Option<usize>,
    pub allow_major: Option<bool>,
    pub command: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl CliConfig {
    /// Load from `path`, or from `depgov.toml` when `path` is `None`.
    /// A missing file yields the defaults; an unreadable or invalid one is an
    /// error.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}
