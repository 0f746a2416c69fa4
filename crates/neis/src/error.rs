// ABOUTME: Error types for NEIS API calls.
// ABOUTME: Separates transport problems from API-reported errors and envelope surprises.

use thiserror::Error;

/// Errors that can occur while querying the NEIS API.
#[derive(Debug, Error)]
pub enum NeisError {
    /// Transport failure or non-2xx HTTP status.
    #[error("NEIS request failed: {0}")]
    Http(String),

    /// The API answered with an error envelope (bad key, bad params).
    #[error("NEIS API error {code}: {message}")]
    Api { code: String, message: String },

    /// The response JSON did not match the documented envelope shape.
    #[error("unexpected NEIS response shape: {0}")]
    Envelope(String),
}

impl NeisError {
    pub fn http(err: impl std::fmt::Display) -> Self {
        NeisError::Http(err.to_string())
    }

    pub fn envelope(msg: impl Into<String>) -> Self {
        NeisError::Envelope(msg.into())
    }
}
