//! Auth-related errors.

use gcs_core::ErrorKind;
use thiserror::Error;

/// Errors from the credential store and OAuth device-flow client.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials file exists, or it contains no usable token.
    #[error("no valid credentials available")]
    NoValidCredentials,

    /// The file lock guarding the credentials file was not acquired within
    /// the configured timeout.
    #[error("timed out waiting for credentials file lock")]
    LockTimeout,

    /// The credentials file could not be parsed as JSON in any recognised
    /// shape.
    #[error("malformed credentials file: {0}")]
    MalformedFile(String),

    /// I/O failure reading or writing the credentials file.
    #[error("credentials I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device-authorization or refresh HTTP request failed.
    #[error("oauth request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The device code expired before the user completed authorization.
    #[error("device code expired before authorization completed")]
    DeviceCodeExpired,

    /// The user explicitly denied the authorization request.
    #[error("authorization denied by user")]
    AccessDenied,

    /// The authorization server returned a refresh-token rejection (HTTP
    /// 400); credentials have been cleared.
    #[error("refresh rejected by server, credentials cleared")]
    RefreshRejected,

    /// An unrecognised error response from the authorization server.
    #[error("oauth server error: {0}")]
    ServerError(String),
}

impl AuthError {
    /// Map to the shared error-kind taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LockTimeout => ErrorKind::LockTimeout,
            Self::RequestFailed(_) => ErrorKind::NetworkError,
            Self::NoValidCredentials
            | Self::MalformedFile(_)
            | Self::DeviceCodeExpired
            | Self::AccessDenied
            | Self::RefreshRejected
            | Self::ServerError(_) => ErrorKind::AuthError,
            Self::Io(_) => ErrorKind::AuthError,
        }
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
