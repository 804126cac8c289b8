//! Packet metadata type definitions

use serde::{Deserialize, Serialize};

/// Transfer direction of a captured packet
///
/// Byte values match the capture container encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Packet sent by the game client
    ClientToServer = 0,
    /// Packet sent by the game server
    ServerToClient = 1,
}

impl Direction {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Direction::ClientToServer),
            1 => Some(Direction::ServerToClient),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// Protocol family (transport channel) of a captured packet
///
/// The two channels share nothing: each has its own opcode namespace,
/// so the family participates in decoder resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProtocolFamily {
    Tcp = 0,
    Udp = 1,
}

impl ProtocolFamily {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ProtocolFamily::Tcp),
            1 => Some(ProtocolFamily::Udp),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_byte_round_trip() {
        for dir in [Direction::ClientToServer, Direction::ServerToClient] {
            assert_eq!(Direction::from_u8(dir.as_u8()), Some(dir));
        }
        assert_eq!(Direction::from_u8(7), None);
    }

    #[test]
    fn family_byte_round_trip() {
        for family in [ProtocolFamily::Tcp, ProtocolFamily::Udp] {
            assert_eq!(ProtocolFamily::from_u8(family.as_u8()), Some(family));
        }
        assert_eq!(ProtocolFamily::from_u8(2), None);
    }
}
