use depgov_types::LoadError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("security input error: {0}")]
    Load(#[from] LoadError),

    #[error("failed to write overlay {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("overlay serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("overlay has no backing file; use save_to")]
    NoPath,
}

pub type Result<T> = std::result::Result<T, SecurityError>;
