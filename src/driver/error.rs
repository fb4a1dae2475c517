//! Driver error types.

use std::io;

use thiserror::Error;

use crate::bolt::BoltError;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Driver-level errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Transport-level failure
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected the credentials
    #[error("authentication error: {0}")]
    Authentication(String),

    /// The exchange violated the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid driver or security configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An exchange did not complete within the read timeout
    #[error("timeout: {0}")]
    Timeout(String),

    /// The operation is not valid in the connection's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A value accessor was called on the wrong variant
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Variant the accessor requires
        expected: &'static str,
        /// Variant the value actually holds
        actual: &'static str,
    },

    /// A value has no representation on the other side of the adapter
    #[error("cannot represent value: {0}")]
    Unrepresentable(String),

    /// A path failed structural validation
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A received date-time cannot be represented in host types; the
    /// original conversion failure is preserved
    #[error("unsupported date-time value: {0}")]
    UnsupportedDateTime(String),

    /// The server reported a failure for a specific exchange
    #[error("server error: {code} - {message}")]
    Server {
        /// Structured error code
        code: String,
        /// Human-readable message
        message: String,
    },

    /// The server skipped the request because the connection is in a
    /// failed state; RESET recovers it
    #[error("request ignored by server, connection needs reset")]
    Ignored,

    /// The server is temporarily unable to serve the request
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DriverError {
    /// Transport-level failure.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Authentication failure.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Protocol violation.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Invalid configuration.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Read timeout.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Invalid connection state.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Accessor/variant mismatch.
    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::TypeMismatch { expected, actual }
    }

    /// Value without a wire or host representation.
    pub fn unrepresentable(msg: impl Into<String>) -> Self {
        Self::Unrepresentable(msg.into())
    }

    /// Structural path violation.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Server-reported failure.
    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        if code.contains("Security") || code.contains("Authentication") {
            Self::Authentication(message)
        } else {
            Self::Server { code, message }
        }
    }

    /// Whether retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) | Self::ServiceUnavailable(_) => true,
            Self::Server { code, .. } => code.starts_with("Neo.TransientError"),
            _ => false,
        }
    }

    /// Whether the failure was caused by the caller rather than the
    /// server or the transport.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_)
                | Self::Configuration(_)
                | Self::TypeMismatch { .. }
                | Self::Unrepresentable(_)
                | Self::InvalidPath(_)
                | Self::InvalidState(_)
        )
    }
}

impl From<BoltError> for DriverError {
    fn from(err: BoltError) -> Self {
        match err {
            BoltError::Io(e) => DriverError::Io(e),
            BoltError::ConnectionClosed => {
                DriverError::Connection("connection closed by server".to_string())
            }
            BoltError::Connection(msg) => DriverError::Connection(msg),
            BoltError::Handshake(e) => DriverError::Connection(e.to_string()),
            other => DriverError::Protocol(other.to_string()),
        }
    }
}
