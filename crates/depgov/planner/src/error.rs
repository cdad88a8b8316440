use depgov_types::LoadError;
use thiserror::Error;

/// Errors that stop planning altogether (planner exit code 2).
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("resolver executable not found: {program}")]
    ResolverMissing { program: String },

    #[error("invalid planner configuration: {0}")]
    InvalidConfig(String),

    #[error("resolver I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("planner input error: {0}")]
    Load(#[from] LoadError),
}

impl PlannerError {
    pub const EXIT_CODE: i32 = 2;
}
