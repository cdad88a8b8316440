use depgov_guard::GuardError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("guard failed: {0}")]
    Guard(#[from] GuardError),

    #[error("status serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
