//! PackStream binary serialization.
//!
//! PackStream is the value serialization format carried inside Bolt
//! messages. Every value is a marker byte followed by type-specific
//! payload; composite values nest. The submodules split the concern:
//!
//! - [`marker`] - marker bytes and structure tags
//! - [`types`] - the [`PackStreamValue`] sum type
//! - [`encoder`] / [`decoder`] - byte-level serialization
//! - [`structures`] - typed graph/temporal/spatial structure shapes

use std::fmt;

pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod structures;
pub mod types;

pub use decoder::{decode, PackStreamDecoder};
pub use encoder::{encode, PackStreamEncoder};
pub use structures::{
    PackStreamDate, PackStreamDateTime, PackStreamDateTimeZoneId, PackStreamDuration,
    PackStreamLocalDateTime, PackStreamLocalTime, PackStreamNode, PackStreamPath,
    PackStreamPoint2D, PackStreamPoint3D, PackStreamRelationship, PackStreamTime,
    PackStreamUnboundRelationship,
};
pub use types::{PackStreamStructure, PackStreamValue};

/// Errors produced while encoding or decoding PackStream data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackStreamError {
    /// Input ended in the middle of a value
    UnexpectedEof,
    /// Marker byte is not assigned in the format
    UnknownMarker(u8),
    /// String data is not valid UTF-8
    InvalidUtf8(String),
    /// Map keys must be strings
    InvalidMapKey,
    /// A value exceeds the maximum encodable size
    ValueTooLarge(&'static str, usize),
    /// A structure does not match its expected shape
    InvalidStructure(String),
}

impl fmt::Display for PackStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStreamError::UnexpectedEof => write!(f, "unexpected end of input"),
            PackStreamError::UnknownMarker(m) => write!(f, "unknown marker byte 0x{:02X}", m),
            PackStreamError::InvalidUtf8(msg) => write!(f, "invalid UTF-8 string: {}", msg),
            PackStreamError::InvalidMapKey => write!(f, "map key must be a string"),
            PackStreamError::ValueTooLarge(what, len) => {
                write!(f, "{} of length {} exceeds encodable size", what, len)
            }
            PackStreamError::InvalidStructure(msg) => write!(f, "invalid structure: {}", msg),
        }
    }
}

impl std::error::Error for PackStreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            PackStreamError::UnknownMarker(0xC7).to_string(),
            "unknown marker byte 0xC7"
        );
        assert!(PackStreamError::ValueTooLarge("string", 5_000_000_000)
            .to_string()
            .contains("string"));
        assert_eq!(
            PackStreamError::InvalidMapKey.to_string(),
            "map key must be a string"
        );
    }

    #[test]
    fn encode_decode_smoke() {
        let value = PackStreamValue::List(vec![
            PackStreamValue::Integer(1),
            PackStreamValue::String("two".into()),
        ]);
        let bytes = encode(&value).unwrap();
        assert_eq!(decode(&bytes).unwrap(), value);
    }
}
