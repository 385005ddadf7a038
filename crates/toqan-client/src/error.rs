//! Error types for toqan-client.

use thiserror::Error;

/// Errors that can occur when talking to the Toqan API.
#[derive(Debug, Error)]
pub enum ToqanError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered with JSON that is not an object.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A field the caller relies on is missing from the response.
    #[error("Response is missing field `{0}`")]
    MissingField(&'static str),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
