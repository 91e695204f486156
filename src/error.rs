//! Error types shared by the session client, credential store and audio engine

use thiserror::Error;

/// Errors raised while talking to the Jellyfin server
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection refused, timeout, bad JSON body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{operation} failed with status {status}")]
    Status {
        operation: &'static str,
        status: reqwest::StatusCode,
    },

    /// Server rejected the username/password or returned an unusable auth payload
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// An authenticated call was made before login
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Hostname could not be turned into a base URL
    #[error("Invalid server address: {0}")]
    InvalidUrl(String),
}

/// Errors raised by a credential store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a playback engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Audio output unavailable: {0}")]
    Output(String),

    #[error("Engine worker has shut down")]
    Closed,

    /// A stream could not be fetched or decoded
    #[error("{0}")]
    Stream(String),
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
