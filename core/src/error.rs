//! Error types for the Outline management API client.
//!
//! # Design
//! Every call surfaces exactly one `ApiError`; there is no retry and no
//! classification beyond the variant. A missing access key is not an error:
//! lookups return a zero-value key instead.

use thiserror::Error;

/// Errors returned by `OutlineClient` methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be constructed (bad URL, bad header).
    #[error("failed to create request: {0}")]
    RequestError(String),

    /// DNS, connection, TLS or timeout failure while executing the request.
    #[error("failed to execute request: {0}")]
    TransportError(String),

    /// The server answered with a status code of 400 or above.
    #[error("server responded with code {status}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// The HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
