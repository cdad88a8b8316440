//! Evidence source states.
//!
//! Every input document goes through the same small state machine: not
//! supplied or absent on disk is `missing` (no evidence), parsed is `ok`,
//! unreadable or malformed is `error` (bad evidence, with a message). None of
//! these abort a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    Missing,
    Ok,
    Error,
}

impl SourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported status of one evidence source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub state: SourceState,
    pub path: Option<PathBuf>,
    pub message: Option<String>,
}

impl SourceStatus {
    pub fn not_supplied() -> Self {
        Self {
            state: SourceState::Missing,
            path: None,
            message: Some("path not supplied".into()),
        }
    }

    pub fn absent(path: &Path) -> Self {
        Self {
            state: SourceState::Missing,
            path: Some(path.to_path_buf()),
            message: Some("file not found".into()),
        }
    }

    pub fn ok(path: &Path) -> Self {
        Self {
            state: SourceState::Ok,
            path: Some(path.to_path_buf()),
            message: None,
        }
    }

    pub fn error(path: &Path, message: impl Into<String>) -> Self {
        Self {
            state: SourceState::Error,
            path: Some(path.to_path_buf()),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state == SourceState::Ok
    }
}

/// A loaded source: its status plus the parsed value when the state is `ok`.
#[derive(Clone, Debug)]
pub struct SourceLoad<T> {
    pub status: SourceStatus,
    pub value: Option<T>,
}

impl<T> SourceLoad<T> {
    /// Run `load` against `path` and fold the outcome into a source state.
    pub fn load<E, F>(name: &str, path: Option<&Path>, load: F) -> Self
    where
        E: fmt::Display,
        F: FnOnce(&Path) -> Result<T, E>,
    {
        let Some(path) = path else {
            debug!(source = name, "source not supplied");
            return Self {
                status: SourceStatus::not_supplied(),
                value: None,
            };
        };
        if !path.exists() {
            debug!(source = name, path = %path.display(), "source file absent");
            return Self {
                status: SourceStatus::absent(path),
                value: None,
            };
        }
        match load(path) {
            Ok(value) => {
                debug!(source = name, path = %path.display(), "source loaded");
                Self {
                    status: SourceStatus::ok(path),
                    value: Some(value),
                }
            }
            Err(e) => {
                warn!(source = name, path = %path.display(), error = %e, "source malformed");
                Self {
                    status: SourceStatus::error(path, e.to_string()),
                    value: None,
                }
            }
        }
    }
}
