// ── Error types for the gateway client ──

use thiserror::Error;

/// Errors produced by [`GatewayClient`](crate::GatewayClient) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connect, TLS, timeout, body read).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL (or a joined path) is not a valid URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The gateway rejected the API token.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The gateway returned a non-success status.
    #[error("gateway error ({status}): {message}")]
    Gateway { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("response deserialization failed: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status carried by this error, when the gateway answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Gateway { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            _ => None,
        }
    }
}
