//! Error types shared by the ranking core and its collaborators.

use thiserror::Error;

use crate::modality::{Modality, UserId};

/// Failures reported by a measurement store or summary backing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store cannot be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A write collided with an existing record.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by [`RankService`](crate::service::RankService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    /// A collaborator store could not be reached. Not retried here.
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// The user has no recorded result for the modality.
    #[error("no {modality} result recorded for user {user}")]
    NotFound { user: UserId, modality: Modality },
    /// Missing or malformed request data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A record with the same key already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<StoreError> for RankError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::Unavailable(msg),
            StoreError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}
