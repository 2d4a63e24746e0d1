use thiserror::Error;

/// The scheduling engine's complete error taxonomy. Every component (C1-C10)
/// surfaces failures through this enum; `web` converts it to HTTP, `scheduling`'s
/// task executor converts it to a FAILED task record.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("{0}")]
    BadInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("no route from \"{from}\" to \"{to}\"")]
    NoRoute { from: String, to: String },

    #[error("routing provider error: {0}")]
    ProviderError(String),

    #[error("{0}")]
    NoSchedule(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl From<utility::timezone::TimeAddrError> for SchedulerError {
    fn from(value: utility::timezone::TimeAddrError) -> Self {
        SchedulerError::BadInput(value.to_string())
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
