use depgov_types::LoadError;
use thiserror::Error;

/// Errors from reading a dependency manifest.
#[derive(Error, Debug)]
pub enum ConflictError {
    #[error("manifest load error: {0}")]
    Load(#[from] LoadError),

    #[error("invalid manifest TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
