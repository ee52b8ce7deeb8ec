//! Session and client error types.

use std::path::PathBuf;

use grocer_auth::AuthError;
use grocer_data::FetchError;
use grocer_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the session layer and the API client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network or HTTP failure, passed through unchanged.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The backend rejected the login credentials.
    #[error("Login rejected ({status}): {message}")]
    CredentialsRejected { status: u16, message: String },

    /// The session could not be refreshed; the user has been signed out.
    #[error("Session refresh failed: {0}")]
    RefreshFailed(FetchError),

    /// The login response could not be turned into an identity.
    #[error("Invalid login response: {0}")]
    InvalidResponse(String),

    /// Identity or persistence error.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Storage backend error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// HTTP status behind the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Fetch(e) | ClientError::RefreshFailed(e) => e.status(),
            ClientError::CredentialsRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors loading or validating a client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read or written.
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML/JSON for this schema.
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The config could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// The config parsed but is not usable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}
