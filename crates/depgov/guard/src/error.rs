use std::path::PathBuf;
use thiserror::Error;

/// Fatal guard errors. Malformed inputs are not errors; they become source
/// states in the report.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
