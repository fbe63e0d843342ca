//! Client error types

use crate::types::ErrorDetail;
use portal_core::CoreError;
use thiserror::Error;

/// Transport-level failures from [`super::ApiClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (connection refused, DNS failure, timeout)
    #[error("Cannot reach server: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error {status}: {body}")]
    Status { status: u16, body: String },

    /// Success response whose body is not the expected JSON
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Classify a reqwest failure raised before a response arrived
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Configuration(err.to_string())
        } else {
            Self::Unreachable(err)
        }
    }

    /// HTTP status, for status errors
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server's `detail` message, when the error body carries one
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Status { body, .. } => serde_json::from_str::<ErrorDetail>(body)
                .ok()
                .and_then(|detail| detail.message()),
            _ => None,
        }
    }

    /// Check if the server rejected the presented credential
    pub const fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Login failures from [`super::auth::AuthGateway`]
#[derive(Debug, Error)]
pub enum AuthError {
    /// The auth service refused the login
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AuthError {
    pub(crate) const FALLBACK_MESSAGE: &'static str = "Login failed";

    /// Map a client error, turning status errors into rejections
    pub(crate) fn from_client(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, .. } => Self::Rejected {
                status,
                message: err
                    .detail()
                    .unwrap_or_else(|| Self::FALLBACK_MESSAGE.to_string()),
            },
            other => Self::Client(other),
        }
    }
}

/// Failures from [`super::users::UserGateway`]
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No access credential in the session store; nothing was sent
    #[error("Not signed in")]
    Unauthenticated,

    /// The server rejected the credential (401 or 403)
    #[error("Session rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] CoreError),
}
