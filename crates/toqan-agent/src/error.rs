//! Error types for conversation orchestration.

use std::time::Duration;

use thiserror::Error;
use toqan_client::{Record, ToqanError};

/// Errors that can occur while running a conversation request.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A required input is missing or invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network or HTTP-layer failure on any call.
    #[error("{0}")]
    Transport(#[from] ToqanError),

    /// The backend reported status `error` for the request.
    #[error("Toqan API Error: {}", render(.0))]
    Backend(Record),

    /// The local polling budget ran out before a terminal status.
    #[error("Timeout exceeded waiting for AI response (last status: {last_status})")]
    Timeout {
        last_status: String,
        elapsed: Duration,
    },

    /// A chat turn failed for a reason other than a backend error.
    #[error("Toqan API Error: {0}")]
    Chat(#[source] Box<AgentError>),
}

impl AgentError {
    /// Stable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Transport(_) => "transport_error",
            Self::Backend(_) => "backend_error",
            Self::Timeout { .. } => "timeout",
            Self::Chat(inner) => inner.kind(),
        }
    }

    /// Wrap for chat callers so every message carries the API prefix.
    pub fn into_chat(self) -> Self {
        match self {
            Self::Backend(_) | Self::Chat(_) => self,
            other => Self::Chat(Box::new(other)),
        }
    }
}

fn render(record: &Record) -> String {
    serde_json::to_string(record).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_error_message_includes_response() {
        let record = toqan_client::into_record(json!({ "status": "error" })).unwrap();
        let err = AgentError::Backend(record);
        assert_eq!(err.to_string(), r#"Toqan API Error: {"status":"error"}"#);
        assert_eq!(err.kind(), "backend_error");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(AgentError::Validation("x".into()).kind(), "validation_error");
        let timeout = AgentError::Timeout {
            last_status: "in_progress".into(),
            elapsed: Duration::from_secs(3),
        };
        assert_eq!(timeout.kind(), "timeout");
        assert!(timeout.to_string().starts_with("Timeout exceeded"));
    }

    #[test]
    fn test_into_chat_prefixes_once() {
        let err = AgentError::Validation("no messages".into()).into_chat();
        assert_eq!(err.to_string(), "Toqan API Error: validation error: no messages");
        assert_eq!(err.kind(), "validation_error");

        let record = toqan_client::into_record(json!({ "status": "error" })).unwrap();
        let err = AgentError::Backend(record).into_chat().into_chat();
        assert_eq!(err.to_string(), r#"Toqan API Error: {"status":"error"}"#);
    }
}
