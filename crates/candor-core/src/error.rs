use thiserror::Error;

/// Every way a tracker operation can fail.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing, invalid or expired credentials, or an unknown subject.
    #[error("Could not validate credentials")]
    Unauthenticated,

    /// An authorization rule rejected the actor.
    #[error("{0}")]
    Forbidden(String),

    /// The record does not exist, or cannot be used in this position.
    #[error("{0}")]
    NotFound(String),

    /// Malformed or conflicting input, rejected before anything is written.
    #[error("{0}")]
    Validation(String),

    /// The store failed; the surrounding transaction has been rolled back.
    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl CoreError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
