//! Connector error types
//!
//! A single error type is surfaced to the host for every failed operation.
//! Downstream failures carry the HTTP status and response body so the host can
//! show the user what the directory actually said.

use thiserror::Error;

/// Error that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Authentication errors (permanent)
    /// The token endpoint rejected the client credentials or could not be reached.
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Downstream errors
    /// A resource call returned a non-2xx response.
    #[error("Issue when trying to {operation} - {status} - {body}")]
    DownstreamRequest {
        operation: String,
        status: u16,
        body: String,
    },

    /// A resource call failed before a response was received.
    #[error("Issue when trying to {operation} - transport error: {message}")]
    Transport {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The connection test did not succeed.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Request errors (permanent)
    /// An attribute change carried an operation tag other than Add, Remove or Set.
    #[error("Operation not supported: {op}")]
    UnsupportedOperation { op: String },

    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A request or response payload had an unexpected shape.
    #[error("invalid data: {message}")]
    InvalidData { message: String },
}

impl ConnectorError {
    /// Check if this error is transient and the operation could be retried by the host.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::Transport { .. } | ConnectorError::ConnectionFailed { .. } => true,
            ConnectorError::DownstreamRequest { status, .. } => {
                *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::AuthenticationFailed { .. } => "AUTH_FAILED",
            ConnectorError::DownstreamRequest { .. } => "DOWNSTREAM_REQUEST_FAILED",
            ConnectorError::Transport { .. } => "TRANSPORT_ERROR",
            ConnectorError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            ConnectorError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::InvalidData { .. } => "INVALID_DATA",
        }
    }

    /// HTTP status reported by the directory, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConnectorError::DownstreamRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    // Convenience constructors

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        ConnectorError::AuthenticationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an authentication failed error with source.
    pub fn authentication_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::AuthenticationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a downstream request error.
    pub fn downstream(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        ConnectorError::DownstreamRequest {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a transport error with source.
    pub fn transport_with_source(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Transport {
            operation: operation.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        ConnectorError::InvalidData {
            message: message.into(),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        let transient_errors = vec![
            ConnectorError::connection_failed("test"),
            ConnectorError::Transport {
                operation: "list accounts".to_string(),
                message: "connection reset".to_string(),
                source: None,
            },
            ConnectorError::downstream("list accounts", 503, "unavailable"),
            ConnectorError::downstream("list accounts", 429, "slow down"),
        ];

        for err in transient_errors {
            assert!(
                err.is_transient(),
                "Expected {} to be transient",
                err.error_code()
            );
            assert!(!err.is_permanent());
        }
    }

    #[test]
    fn test_permanent_errors() {
        let permanent_errors = vec![
            ConnectorError::authentication_failed("bad secret"),
            ConnectorError::downstream("read account `1`", 404, "not found"),
            ConnectorError::UnsupportedOperation {
                op: "Replace".to_string(),
            },
            ConnectorError::InvalidConfiguration {
                message: "test".to_string(),
            },
        ];

        for err in permanent_errors {
            assert!(
                err.is_permanent(),
                "Expected {} to be permanent",
                err.error_code()
            );
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ConnectorError::authentication_failed("x").error_code(),
            "AUTH_FAILED"
        );
        assert_eq!(
            ConnectorError::downstream("list groups", 500, "").error_code(),
            "DOWNSTREAM_REQUEST_FAILED"
        );
        assert_eq!(
            ConnectorError::UnsupportedOperation { op: "x".into() }.error_code(),
            "UNSUPPORTED_OPERATION"
        );
    }

    #[test]
    fn test_downstream_display_embeds_status_and_body() {
        let err = ConnectorError::downstream("read account `1`", 404, "{\"error\":\"missing\"}");
        assert_eq!(
            err.to_string(),
            "Issue when trying to read account `1` - 404 - {\"error\":\"missing\"}"
        );
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_unsupported_operation_display() {
        let err = ConnectorError::UnsupportedOperation {
            op: "Replace".to_string(),
        };
        assert_eq!(err.to_string(), "Operation not supported: Replace");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_with_source() {
        let source_err = std::io::Error::new(std::io::ErrorKind::Other, "underlying error");
        let err = ConnectorError::connection_failed_with_source("failed", source_err);

        if let ConnectorError::ConnectionFailed { source, .. } = &err {
            assert!(source.is_some());
        } else {
            panic!("Expected ConnectionFailed variant");
        }
    }
}
