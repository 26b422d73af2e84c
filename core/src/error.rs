//! Error types for the carmod API client.
//!
//! Every non-2xx response lands in `Status` with the raw code and body. The
//! studio controller does not branch on the variant; it turns any failure
//! into a single alert for the user.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The host could not complete the round-trip (DNS, connect, reset...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// A local file meant for upload could not be read.
    #[error("reading {path} failed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
