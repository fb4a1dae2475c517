//! Bolt protocol version definitions.

use std::fmt;

/// Bolt protocol versions this driver can negotiate.
///
/// Versions are encoded on the wire as 4 big-endian bytes
/// `00 RR mm MM`-style fields: reserved, range, minor, major — see
/// [`super::proposal`] for how proposals are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoltVersion {
    /// Bolt 5.0 - element ids on all graph entities, UTC date-times
    V5_0,
    /// Bolt 5.1
    V5_1,
    /// Bolt 5.2
    V5_2,
    /// Bolt 5.3 - bolt_agent in HELLO
    V5_3,
    /// Bolt 5.4
    V5_4,
}

impl BoltVersion {
    /// All supported versions, newest first.
    pub const ALL: [BoltVersion; 5] = [
        BoltVersion::V5_4,
        BoltVersion::V5_3,
        BoltVersion::V5_2,
        BoltVersion::V5_1,
        BoltVersion::V5_0,
    ];

    /// Major version number.
    pub fn major(self) -> u8 {
        5
    }

    /// Minor version number.
    pub fn minor(self) -> u8 {
        match self {
            BoltVersion::V5_0 => 0,
            BoltVersion::V5_1 => 1,
            BoltVersion::V5_2 => 2,
            BoltVersion::V5_3 => 3,
            BoltVersion::V5_4 => 4,
        }
    }

    /// Resolve a (major, minor) pair to a supported version.
    pub fn from_parts(major: u8, minor: u8) -> Option<Self> {
        match (major, minor) {
            (5, 0) => Some(BoltVersion::V5_0),
            (5, 1) => Some(BoltVersion::V5_1),
            (5, 2) => Some(BoltVersion::V5_2),
            (5, 3) => Some(BoltVersion::V5_3),
            (5, 4) => Some(BoltVersion::V5_4),
            _ => None,
        }
    }

    /// Whether HELLO may carry the bolt_agent identification map.
    pub fn supports_bolt_agent(self) -> bool {
        self >= BoltVersion::V5_3
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

impl PartialOrd for BoltVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BoltVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.major(), self.minor()).cmp(&(other.major(), other.minor()))
    }
}
