use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Fetch aborted at deadline")]
    TimeoutAbort,

    #[error("Network error: {0}")]
    Network(#[source] ApiError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unable to load events after {attempts} attempts")]
    PersistentFailure { attempts: u32 },
}

impl SyncError {
    /// Whether this failure counts against the retry budget
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Network(_) | SyncError::InvalidResponse(_))
    }
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout => SyncError::TimeoutAbort,
            ApiError::InvalidResponse(msg) => SyncError::InvalidResponse(msg),
            other => SyncError::Network(other),
        }
    }
}
