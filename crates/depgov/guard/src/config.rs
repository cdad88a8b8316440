use depgov_types::RiskLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Inputs and outputs for one guard run. Every path is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    pub preflight: Option<PathBuf>,
    pub cve_scan: Option<PathBuf>,
    pub sbom: Option<PathBuf>,
    pub contract: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    /// Lowest risk that fails the run.
    pub fail_threshold: RiskLevel,
    pub json_output: Option<PathBuf>,
    pub markdown_output: Option<PathBuf>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            preflight: None,
            cve_scan: None,
            sbom: None,
            contract: None,
            metadata: None,
            fail_threshold: RiskLevel::Blocked,
            json_output: None,
            markdown_output: None,
        }
    }
}

impl GuardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preflight(mut self, path: impl AsRef<Path>) -> Self {
        self.preflight = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_cve_scan(mut self, path: impl AsRef<Path>) -> Self {
        self.cve_scan = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_sbom(mut self, path: impl AsRef<Path>) -> Self {
        self.sbom = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_contract(mut self, path: impl AsRef<Path>) -> Self {
        self.contract = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_metadata(mut self, path: impl AsRef<Path>) -> Self {
        self.metadata = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_fail_threshold(mut self, threshold: RiskLevel) -> Self {
        self.fail_threshold = threshold;
        self
    }

    pub fn with_json_output(mut self, path: impl AsRef<Path>) -> Self {
        self.json_output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_markdown_output(mut self, path: impl AsRef<Path>) -> Self {
        self.markdown_output = Some(path.as_ref().to_path_buf());
        self
    }
}
