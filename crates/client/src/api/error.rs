//! HTTP-layer errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the banking API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}")]
    Status {
        /// HTTP status.
        status: StatusCode,
        /// `error` field of the JSON body, when present and non-blank.
        message: Option<String>,
    },

    /// A success response whose body could not be decoded.
    #[error("malformed response: {0}")]
    Response(String),
}

impl ApiError {
    /// Message the backend supplied for this failure, if any.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            Self::Request(_) | Self::Response(_) => None,
        }
    }

    /// HTTP status of the failure, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(_) | Self::Response(_) => None,
        }
    }
}
