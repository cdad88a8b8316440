use chrono::{DateTime, Utc};

/// Per-invocation context, built once at program start and handed to every
/// engine constructor.
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Evaluation clock. Ages, cadences and report timestamps are all
    /// measured against this instant.
    pub now: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Context frozen at a fixed instant.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
