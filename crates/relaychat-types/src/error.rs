use thiserror::Error;

use crate::provider::ProviderError;

/// Errors from repository operations (used by trait definitions in relaychat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors from driving a chat turn.
///
/// Maps one-to-one to the failure classes the HTTP layer distinguishes:
/// bad input, missing session, store failure before the provider call, and
/// provider failure before any bytes were forwarded. Failures *after*
/// forwarding began are reported through the turn outcome, not this type.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("session not found")]
    NotFound,

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl From<RepositoryError> for TurnError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => TurnError::NotFound,
            other => TurnError::Persistence(other.to_string()),
        }
    }
}
