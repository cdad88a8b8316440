use depgov_types::LoadError;
use thiserror::Error;

/// Errors from loading a dependency policy.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("policy load error: {0}")]
    Load(#[from] LoadError),

    #[error("invalid dependency policy: {0}")]
    Invalid(#[from] toml::de::Error),
}
