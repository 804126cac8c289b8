//! Packet filter predicates
//!
//! A [`FilterPredicate`] decides whether a decoded packet reaches the
//! output. Predicates are pure: they see only the packet under test,
//! never log-wide state, and never mutate anything. Filtering is a view
//! over the log; excluded packets stay in the source log untouched.

use camlog_core::{parse_i32, Direction, ProtocolFamily};
use camlog_protocol::DecodedPacket;

/// Composable packet predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPredicate {
    /// Opcode equals
    Opcode(u16),
    /// Opcode is one of
    OpcodeIn(Vec<u16>),
    /// Transfer direction equals
    Direction(Direction),
    /// Protocol family equals
    Family(ProtocolFamily),
    /// Packet references one of these object ids
    ObjectIdIn(Vec<u16>),
    /// Raw buffer contains this byte pattern anywhere
    Contains(Vec<u8>),
    /// Raw buffer holds exactly these bytes at the given offset
    BytesAt { offset: usize, bytes: Vec<u8> },
    /// Every inner predicate matches
    All(Vec<FilterPredicate>),
    /// At least one inner predicate matches
    Any(Vec<FilterPredicate>),
    /// Inner predicate does not match
    Not(Box<FilterPredicate>),
}

impl FilterPredicate {
    /// Evaluate this predicate against one packet.
    pub fn matches(&self, packet: &DecodedPacket) -> bool {
        match self {
            FilterPredicate::Opcode(opcode) => packet.opcode() == *opcode,
            FilterPredicate::OpcodeIn(opcodes) => opcodes.contains(&packet.opcode()),
            FilterPredicate::Direction(direction) => packet.direction() == *direction,
            FilterPredicate::Family(family) => packet.family() == *family,
            FilterPredicate::ObjectIdIn(ids) => packet
                .object_ids()
                .iter()
                .any(|id| ids.contains(id)),
            FilterPredicate::Contains(pattern) => {
                !pattern.is_empty()
                    && packet
                        .raw()
                        .data()
                        .windows(pattern.len())
                        .any(|window| window == pattern.as_slice())
            }
            FilterPredicate::BytesAt { offset, bytes } => {
                let data = packet.raw().data();
                match offset.checked_add(bytes.len()) {
                    Some(end) => data.get(*offset..end) == Some(bytes.as_slice()),
                    None => false,
                }
            }
            FilterPredicate::All(inner) => inner.iter().all(|p| p.matches(packet)),
            FilterPredicate::Any(inner) => inner.iter().any(|p| p.matches(packet)),
            FilterPredicate::Not(inner) => !inner.matches(packet),
        }
    }

    /// Build an opcode-membership predicate from a configuration string:
    /// comma-separated codes, each decimal or `0x` hex, `^`-combinable.
    ///
    /// Returns `None` when any code fails to parse or the list is empty.
    pub fn opcodes_from_str(input: &str) -> Option<Self> {
        let opcodes = parse_code_list(input)?;
        Some(FilterPredicate::OpcodeIn(opcodes))
    }

    /// Build an object-id-membership predicate from a configuration
    /// string with the same syntax as [`FilterPredicate::opcodes_from_str`].
    pub fn object_ids_from_str(input: &str) -> Option<Self> {
        let ids = parse_code_list(input)?;
        Some(FilterPredicate::ObjectIdIn(ids))
    }
}

fn parse_code_list(input: &str) -> Option<Vec<u16>> {
    let mut codes = Vec::new();
    for token in input.split(',') {
        if token.trim().is_empty() {
            continue;
        }
        let value = parse_i32(token)?;
        codes.push(u16::try_from(value).ok()?);
    }
    if codes.is_empty() {
        None
    } else {
        Some(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use camlog_core::ProtocolVersion;
    use camlog_protocol::{standard_registry, LogContext, RawPacket};

    use crate::log::PacketLog;

    fn sample_log() -> PacketLog {
        let registry = std::sync::Arc::new(standard_registry().unwrap());
        let mut log = PacketLog::new(registry, LogContext::new(ProtocolVersion::new(190, 2)));
        // Visual effect on oid 0x1234.
        log.append(RawPacket::new(
            0x4C,
            Direction::ServerToClient,
            ProtocolFamily::Tcp,
            0,
            Bytes::from(vec![0x12, 0x34, 6, 1, 0, 0, 0, 0]),
        ));
        // Unregistered client packet.
        log.append(RawPacket::new(
            0x18,
            Direction::ClientToServer,
            ProtocolFamily::Udp,
            1,
            Bytes::from(vec![0xCA, 0xFE, 0xBA, 0xBE]),
        ));
        log
    }

    fn retained(log: &PacketLog, predicate: &FilterPredicate) -> Vec<u16> {
        log.iter()
            .filter(|p| predicate.matches(p))
            .map(|p| p.opcode())
            .collect()
    }

    #[test]
    fn opcode_and_direction_predicates() {
        let log = sample_log();
        assert_eq!(retained(&log, &FilterPredicate::Opcode(0x4C)), vec![0x4C]);
        assert_eq!(
            retained(&log, &FilterPredicate::Direction(Direction::ClientToServer)),
            vec![0x18]
        );
        assert_eq!(
            retained(&log, &FilterPredicate::Family(ProtocolFamily::Udp)),
            vec![0x18]
        );
    }

    #[test]
    fn object_id_membership() {
        let log = sample_log();
        assert_eq!(
            retained(&log, &FilterPredicate::ObjectIdIn(vec![0x1234])),
            vec![0x4C]
        );
        assert!(retained(&log, &FilterPredicate::ObjectIdIn(vec![0x9999])).is_empty());
    }

    #[test]
    fn byte_pattern_predicates() {
        let log = sample_log();
        assert_eq!(
            retained(&log, &FilterPredicate::Contains(vec![0xBA, 0xBE])),
            vec![0x18]
        );
        assert_eq!(
            retained(
                &log,
                &FilterPredicate::BytesAt {
                    offset: 2,
                    bytes: vec![6],
                }
            ),
            vec![0x4C]
        );
        // Pattern running past the end never matches.
        assert!(retained(
            &log,
            &FilterPredicate::BytesAt {
                offset: 3,
                bytes: vec![0xBE, 0xEF],
            }
        )
        .is_empty());
    }

    #[test]
    fn combinators() {
        let log = sample_log();
        let stoc_effects = FilterPredicate::All(vec![
            FilterPredicate::Opcode(0x4C),
            FilterPredicate::Direction(Direction::ServerToClient),
        ]);
        assert_eq!(retained(&log, &stoc_effects), vec![0x4C]);

        let either = FilterPredicate::Any(vec![
            FilterPredicate::Opcode(0x4C),
            FilterPredicate::Opcode(0x18),
        ]);
        assert_eq!(retained(&log, &either), vec![0x4C, 0x18]);

        let not_effects = FilterPredicate::Not(Box::new(FilterPredicate::Opcode(0x4C)));
        assert_eq!(retained(&log, &not_effects), vec![0x18]);
    }

    #[test]
    fn filtering_is_idempotent_and_non_destructive() {
        let log = sample_log();
        let predicate = FilterPredicate::Direction(Direction::ServerToClient);
        let once = retained(&log, &predicate);
        let twice: Vec<u16> = log
            .iter()
            .filter(|p| predicate.matches(p))
            .filter(|p| predicate.matches(p))
            .map(|p| p.opcode())
            .collect();
        assert_eq!(once, twice);
        // The source log still holds every packet.
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn code_lists_parse_from_config_strings() {
        assert_eq!(
            FilterPredicate::opcodes_from_str("0x4C, 0xA9, 24"),
            Some(FilterPredicate::OpcodeIn(vec![0x4C, 0xA9, 24]))
        );
        assert_eq!(
            FilterPredicate::object_ids_from_str("0x10 ^ 0x02"),
            Some(FilterPredicate::ObjectIdIn(vec![0x12]))
        );
        assert_eq!(FilterPredicate::opcodes_from_str("pigs"), None);
        assert_eq!(FilterPredicate::opcodes_from_str(""), None);
    }
}
