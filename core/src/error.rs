//! Error types for the GitLab API requestor.
//!
//! # Design
//! `GitLab` and `Deserialization` are distinct variants so callers can tell
//! "the server refused the request" from "the server accepted it but
//! answered with something that does not fit the expected type". Transport
//! failures (no response at all) are a third, separate case.
//!
//! Nothing here models cancellation. Dropping a requestor future aborts the
//! in-flight transport call and produces no error value.

use http::StatusCode;

use crate::transport::TransportError;

/// A non-2xx response from the GitLab API.
///
/// The message is the raw response body, or empty when the body could not be
/// read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GitLabError {
    status: StatusCode,
    message: String,
}

impl GitLabError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by `Requestor` operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a status outside 2xx.
    #[error("GitLab API error ({status}): {0}", status = .0.status())]
    GitLab(#[from] GitLabError),

    /// A success response body could not be decoded into the expected type.
    #[error("failed to decode response body: {source}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The request payload could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    /// True when the server rejected the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::GitLab(_))
    }

    /// True when a success response could not be decoded.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, ApiError::Deserialization { .. })
    }

    pub fn rejection(&self) -> Option<&GitLabError> {
        match self {
            ApiError::GitLab(err) => Some(err),
            _ => None,
        }
    }
}
