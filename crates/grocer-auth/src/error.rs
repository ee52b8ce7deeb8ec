//! Authentication errors.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Role string is not one of the known roles.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Persisted session could not be written or removed.
    #[error("session storage error: {0}")]
    Storage(#[from] grocer_store::StoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::Serialization(e.to_string())
    }
}
