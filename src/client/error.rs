//! Client error taxonomy.

use std::fmt;
use thiserror::Error;

use crate::client::record::RecordId;
use crate::config::ConfigError;

/// Why a request never produced a usable HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Could not establish a connection.
    Connect,
    /// Deadline expired before the response was fully read.
    Timeout,
    /// Any other I/O or protocol failure.
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportKind::Connect => "connect",
            TransportKind::Timeout => "timeout",
            TransportKind::Other => "io",
        };
        f.write_str(s)
    }
}

/// Errors surfaced by [`ResourceClient`](crate::client::ResourceClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or deadline failure. The only retryable kind.
    #[error("Transport error ({kind}): {message}")]
    Transport { kind: TransportKind, message: String },

    /// Non-2xx response with no more specific meaning.
    #[error("HTTP error: status {status}")]
    Http { status: u16, body: String },

    /// Server rejected the payload with a structured error body.
    #[error("Validation failed with status {status}: {details}")]
    Validation { status: u16, details: serde_json::Value },

    /// Server reported that the target id does not exist.
    #[error("Record not found: {id}")]
    NotFound { id: RecordId },

    /// Response body was not well-formed or did not match the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Request could not be built; nothing was sent.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Client could not be constructed from its configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn timeout(message: impl Into<String>) -> Self {
        ClientError::Transport {
            kind: TransportKind::Timeout,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        ClientError::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ClientError::Decode {
            message: message.into(),
        }
    }

    /// True for failures expected to sometimes succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } | ClientError::Validation { status, .. } => {
                Some(*status)
            }
            ClientError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "transport",
            ClientError::Http { .. } => "http",
            ClientError::Validation { .. } => "validation",
            ClientError::NotFound { .. } => "not_found",
            ClientError::Decode { .. } => "decode",
            ClientError::InvalidRequest { .. } => "invalid_request",
            ClientError::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportKind::Timeout
        } else if e.is_connect() {
            TransportKind::Connect
        } else {
            TransportKind::Other
        };
        ClientError::Transport {
            kind,
            message: e.to_string(),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_transient() {
        assert!(ClientError::timeout("deadline").is_transient());
        assert!(!ClientError::Http { status: 503, body: String::new() }.is_transient());
        assert!(!ClientError::decode("bad json").is_transient());
        assert!(!ClientError::NotFound { id: RecordId::new("1").unwrap() }.is_transient());
        assert!(!ClientError::Validation {
            status: 422,
            details: serde_json::json!({"error": "x"}),
        }
        .is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::timeout("request exceeded 500ms");
        assert_eq!(err.to_string(), "Transport error (timeout): request exceeded 500ms");

        let err = ClientError::NotFound { id: RecordId::new("9").unwrap() };
        assert_eq!(err.to_string(), "Record not found: 9");
        assert_eq!(err.status(), Some(404));
    }
}
