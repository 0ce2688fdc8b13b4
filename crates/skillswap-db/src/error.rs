use skillswap_types::{ParseStatusError, TransitionError};
use thiserror::Error;
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed input, or a reference that does not resolve.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("swap request {0} is already completed")]
    AlreadyCompleted(Uuid),

    /// A concurrent writer moved the record first. Callers may re-fetch and retry.
    #[error("interaction {0} was changed concurrently")]
    Conflict(Uuid),

    #[error("user {actor} is not a party of swap request {swap_request}")]
    Forbidden { actor: Uuid, swap_request: Uuid },

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<ParseStatusError> for StoreError {
    fn from(err: ParseStatusError) -> Self {
        Self::Validation(err.to_string())
    }
}
