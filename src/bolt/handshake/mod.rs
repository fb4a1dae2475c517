//! Bolt handshake: magic preamble and version negotiation.
//!
//! The client opens with a 4-byte magic value followed by four 4-byte
//! version proposals; the server answers with the single 4-byte version it
//! picked (all zeroes if none matched).

pub mod version;

pub use version::BoltVersion;

use super::error::HandshakeError;

/// The Bolt magic preamble.
pub const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Size of the full client handshake message (magic + 4 proposals).
pub const HANDSHAKE_REQUEST_SIZE: usize = 20;

/// Size of the server's handshake reply.
pub const HANDSHAKE_RESPONSE_SIZE: usize = 4;

/// Build the client handshake message.
///
/// The first proposal offers the newest supported version with a minor
/// range covering every older supported minor; the remaining slots are
/// zero. Each proposal is `[0x00, range, minor, major]`.
pub fn proposal() -> [u8; HANDSHAKE_REQUEST_SIZE] {
    let mut buf = [0u8; HANDSHAKE_REQUEST_SIZE];
    buf[0..4].copy_from_slice(&BOLT_MAGIC);

    let newest = BoltVersion::ALL[0];
    let oldest = BoltVersion::ALL[BoltVersion::ALL.len() - 1];
    buf[4] = 0;
    buf[5] = newest.minor() - oldest.minor(); // covered minor range
    buf[6] = newest.minor();
    buf[7] = newest.major();

    buf
}

/// Parse the server's 4-byte version reply.
pub fn agreement(reply: [u8; HANDSHAKE_RESPONSE_SIZE]) -> Result<BoltVersion, HandshakeError> {
    let minor = reply[2];
    let major = reply[3];

    if major == 0 && minor == 0 {
        return Err(HandshakeError::NoCompatibleVersion);
    }

    BoltVersion::from_parts(major, minor)
        .ok_or(HandshakeError::UnsupportedVersion { major, minor })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_layout() {
        let buf = proposal();
        assert_eq!(&buf[0..4], &BOLT_MAGIC);
        // first slot: range 4 over 5.4 covers 5.0-5.4
        assert_eq!(buf[4], 0);
        assert_eq!(buf[5], 4);
        assert_eq!(buf[6], 4);
        assert_eq!(buf[7], 5);
        // remaining slots empty
        assert!(buf[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn agreement_accepts_supported_versions() {
        assert_eq!(agreement([0, 0, 0, 5]).unwrap(), BoltVersion::V5_0);
        assert_eq!(agreement([0, 0, 4, 5]).unwrap(), BoltVersion::V5_4);
    }

    #[test]
    fn agreement_rejects_zero_reply() {
        assert!(matches!(
            agreement([0, 0, 0, 0]),
            Err(HandshakeError::NoCompatibleVersion)
        ));
    }

    #[test]
    fn agreement_rejects_unknown_version() {
        assert!(matches!(
            agreement([0, 0, 4, 4]),
            Err(HandshakeError::UnsupportedVersion { major: 4, minor: 4 })
        ));
    }
}
