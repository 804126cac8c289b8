//! Client protocol version handling
//!
//! Client releases are identified by an ordered decimal such as `190.2`:
//! an integer major release and a single fractional digit for the
//! subversion. Comparisons are ordinary numeric ordering, which the
//! derived lexicographic ordering over (major, minor) reproduces exactly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A client protocol version, e.g. `172.0` or `190.2`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProtocolVersion {
    major: u16,
    minor: u8,
}

impl ProtocolVersion {
    /// Create a version from its major release and subversion digit.
    ///
    /// The minor part is a single fractional digit; `new(190, 2)` is
    /// version `190.2`.
    #[inline]
    pub const fn new(major: u16, minor: u8) -> Self {
        Self { major, minor }
    }

    #[inline]
    pub const fn major(&self) -> u16 {
        self.major
    }

    #[inline]
    pub const fn minor(&self) -> u8 {
        self.minor
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Error produced when a version string does not parse
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid protocol version: {0:?}")]
pub struct ParseVersionError(pub String);

impl FromStr for ProtocolVersion {
    type Err = ParseVersionError;

    /// Parse `"190"` or `"190.2"`; the fractional part is one digit.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bad = || ParseVersionError(s.to_string());
        let (major_str, minor_str) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, "0"),
        };
        let major: u16 = major_str.trim().parse().map_err(|_| bad())?;
        let minor: u8 = minor_str.trim().parse().map_err(|_| bad())?;
        if minor > 9 {
            return Err(bad());
        }
        Ok(Self { major, minor })
    }
}
