//! Bolt protocol error types.

use std::fmt;
use std::io;

use super::packstream::PackStreamError;

/// Result type for wire-level Bolt operations.
pub type BoltResult<T> = Result<T, BoltError>;

/// Wire-level Bolt errors.
#[derive(Debug)]
pub enum BoltError {
    /// I/O error on the underlying transport
    Io(io::Error),

    /// Handshake failed
    Handshake(HandshakeError),

    /// PackStream serialization error
    PackStream(PackStreamError),

    /// Malformed or unexpected message
    Protocol(String),

    /// Connection-level failure
    Connection(String),

    /// A reassembled message exceeded the size cap
    MessageTooLarge {
        /// Observed size in bytes
        size: usize,
        /// Configured cap in bytes
        max: usize,
    },

    /// The peer closed the connection
    ConnectionClosed,
}

impl fmt::Display for BoltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoltError::Io(e) => write!(f, "I/O error: {}", e),
            BoltError::Handshake(e) => write!(f, "handshake error: {}", e),
            BoltError::PackStream(e) => write!(f, "packstream error: {}", e),
            BoltError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            BoltError::Connection(msg) => write!(f, "connection error: {}", msg),
            BoltError::MessageTooLarge { size, max } => {
                write!(f, "message too large: {} bytes (max {})", size, max)
            }
            BoltError::ConnectionClosed => write!(f, "connection closed by peer"),
        }
    }
}

impl std::error::Error for BoltError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoltError::Io(e) => Some(e),
            BoltError::Handshake(e) => Some(e),
            BoltError::PackStream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BoltError {
    fn from(err: io::Error) -> Self {
        BoltError::Io(err)
    }
}

impl From<HandshakeError> for BoltError {
    fn from(err: HandshakeError) -> Self {
        BoltError::Handshake(err)
    }
}

impl From<PackStreamError> for BoltError {
    fn from(err: PackStreamError) -> Self {
        BoltError::PackStream(err)
    }
}

/// Handshake-specific errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeError {
    /// The server rejected every proposed version
    NoCompatibleVersion,

    /// The server picked a version this driver does not implement
    UnsupportedVersion {
        /// Major version the server chose
        major: u8,
        /// Minor version the server chose
        minor: u8,
    },

    /// The connection closed mid-handshake
    ConnectionClosed,
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::NoCompatibleVersion => {
                write!(f, "server supports none of the proposed Bolt versions")
            }
            HandshakeError::UnsupportedVersion { major, minor } => {
                write!(f, "server chose unsupported Bolt version {}.{}", major, minor)
            }
            HandshakeError::ConnectionClosed => {
                write!(f, "connection closed during handshake")
            }
        }
    }
}

impl std::error::Error for HandshakeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        let err = BoltError::MessageTooLarge { size: 200, max: 100 };
        assert_eq!(err.to_string(), "message too large: 200 bytes (max 100)");

        assert_eq!(
            BoltError::ConnectionClosed.to_string(),
            "connection closed by peer"
        );

        let hs = HandshakeError::UnsupportedVersion { major: 4, minor: 4 };
        assert!(hs.to_string().contains("4.4"));
    }

    #[test]
    fn conversions() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(BoltError::from(io_err), BoltError::Io(_)));

        assert!(matches!(
            BoltError::from(HandshakeError::NoCompatibleVersion),
            BoltError::Handshake(_)
        ));

        assert!(matches!(
            BoltError::from(PackStreamError::UnexpectedEof),
            BoltError::PackStream(_)
        ));
    }
}
