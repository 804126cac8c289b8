//! Decoder registry and version resolution
//!
//! # Purpose
//! Maintains the mapping from (opcode, direction, protocol family) to the
//! version-ordered set of packet decoders, and resolves which decoder is
//! in effect for a requested protocol version.
//!
//! # Resolution
//! Within one key group, the entry with the greatest minimum version at or
//! below the requested version wins. The any-version entry (no minimum) is
//! the fallback and has the lowest priority. A key with no registrations
//! at all resolves to [`ResolveError::UnknownOpcode`]; the caller renders
//! such packets as raw bytes.
//!
//! # Registration
//! Registration happens once, at load time, through [`RegistryBuilder`];
//! the built [`DecoderRegistry`] is immutable and is passed around
//! explicitly (typically behind an `Arc`). Registering the same
//! (opcode, direction, family, minimum version) twice is a configuration
//! error and fails the build.

use std::collections::HashMap;

use camlog_core::{CamlogError, Direction, ProtocolFamily, ProtocolVersion, Result};

use crate::cursor::DecodeError;
use crate::decoders;
use crate::packet::{PacketBody, RawPacket};

/// Static registration metadata for one decoder
#[derive(Debug)]
pub struct DecoderDescriptor {
    /// Message type code within the direction/family namespace
    pub opcode: u16,
    /// Transfer direction this decoder applies to
    pub direction: Direction,
    /// Transport channel this decoder applies to
    pub family: ProtocolFamily,
    /// Minimum client version this layout appears in; `None` = any version
    pub min_version: Option<ProtocolVersion>,
    /// Human-readable decoder label
    pub label: &'static str,
    /// Stable identity string written to the container
    pub identity: &'static str,
}

/// Decode entry point: raw packet + active version to parsed body
pub type DecodeFn =
    fn(&RawPacket, ProtocolVersion) -> std::result::Result<Box<dyn PacketBody>, DecodeError>;

/// One registered decoder: descriptor plus entry point
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    pub descriptor: &'static DecoderDescriptor,
    pub decode: DecodeFn,
}

/// Error produced when no decoder is registered for a packet
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no decoder for opcode 0x{opcode:02X} {direction:?} {family:?}")]
    UnknownOpcode {
        opcode: u16,
        direction: Direction,
        family: ProtocolFamily,
    },
}

type Key = (u16, Direction, ProtocolFamily);

/// Load-time builder for the immutable registry
#[derive(Default, Debug)]
pub struct RegistryBuilder {
    groups: HashMap<Key, Vec<Registration>>,
    by_identity: HashMap<&'static str, Registration>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one decoder.
    ///
    /// Fails with [`CamlogError::DuplicateRegistration`] when the group
    /// already holds an entry with the same minimum version, and with a
    /// configuration error when the identity string is already taken.
    pub fn register(
        &mut self,
        descriptor: &'static DecoderDescriptor,
        decode: DecodeFn,
    ) -> Result<&mut Self> {
        let key = (descriptor.opcode, descriptor.direction, descriptor.family);
        let registration = Registration { descriptor, decode };

        let group = self.groups.entry(key).or_default();
        if group
            .iter()
            .any(|r| r.descriptor.min_version == descriptor.min_version)
        {
            return Err(CamlogError::DuplicateRegistration {
                opcode: descriptor.opcode,
                direction: descriptor.direction,
                family: descriptor.family,
                min_version: match descriptor.min_version {
                    Some(version) => version.to_string(),
                    None => "any".to_string(),
                },
            });
        }
        group.push(registration);

        if self
            .by_identity
            .insert(descriptor.identity, registration)
            .is_some()
        {
            return Err(CamlogError::Config(format!(
                "decoder identity {:?} registered twice",
                descriptor.identity
            )));
        }

        tracing::debug!(
            opcode = descriptor.opcode,
            label = descriptor.label,
            "registered packet decoder"
        );
        Ok(self)
    }

    /// Freeze the table. Groups are ordered by descending minimum version
    /// with the any-version fallback last.
    pub fn build(mut self) -> DecoderRegistry {
        for group in self.groups.values_mut() {
            group.sort_by(|a, b| match (a.descriptor.min_version, b.descriptor.min_version) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }
        DecoderRegistry {
            groups: self.groups,
            by_identity: self.by_identity,
        }
    }
}

/// Immutable decoder lookup table
pub struct DecoderRegistry {
    groups: HashMap<Key, Vec<Registration>>,
    by_identity: HashMap<&'static str, Registration>,
}

impl DecoderRegistry {
    /// Resolve the decoder in effect for a packet at `version`.
    pub fn resolve(
        &self,
        opcode: u16,
        direction: Direction,
        family: ProtocolFamily,
        version: ProtocolVersion,
    ) -> std::result::Result<Registration, ResolveError> {
        let unknown = || ResolveError::UnknownOpcode {
            opcode,
            direction,
            family,
        };
        let group = self
            .groups
            .get(&(opcode, direction, family))
            .ok_or_else(unknown)?;
        group
            .iter()
            .find(|r| match r.descriptor.min_version {
                Some(min) => min <= version,
                None => true,
            })
            .copied()
            .ok_or_else(unknown)
    }

    /// Look a decoder up by the identity string stored in a container.
    pub fn resolve_identity(&self, identity: &str) -> Option<Registration> {
        self.by_identity.get(identity).copied()
    }

    /// Number of registered decoders.
    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }
}

/// Build the registry holding the full built-in decoder population.
pub fn standard_registry() -> Result<DecoderRegistry> {
    let mut builder = RegistryBuilder::new();
    builder
        .register(
            &decoders::player_position::BASE_DESCRIPTOR,
            decoders::player_position::decode_base,
        )?
        .register(
            &decoders::player_position::V190_DESCRIPTOR,
            decoders::player_position::decode_v190,
        )?
        .register(
            &decoders::visual_effect::DESCRIPTOR,
            decoders::visual_effect::decode,
        )?
        .register(
            &decoders::siege_weapon::DESCRIPTOR,
            decoders::siege_weapon::decode,
        )?
        .register(
            &decoders::region_tables::DESCRIPTOR,
            decoders::region_tables::decode,
        )?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[derive(Debug)]
    struct NullBody;

    impl PacketBody for NullBody {
        fn render(&self, _verbose: bool) -> String {
            String::new()
        }
    }

    fn null_decode(
        _raw: &RawPacket,
        _version: ProtocolVersion,
    ) -> std::result::Result<Box<dyn PacketBody>, DecodeError> {
        Ok(Box::new(NullBody))
    }

    static ANY: DecoderDescriptor = DecoderDescriptor {
        opcode: 0x10,
        direction: Direction::ServerToClient,
        family: ProtocolFamily::Tcp,
        min_version: None,
        label: "test any",
        identity: "test.0x10.any",
    };
    static V172: DecoderDescriptor = DecoderDescriptor {
        opcode: 0x10,
        direction: Direction::ServerToClient,
        family: ProtocolFamily::Tcp,
        min_version: Some(ProtocolVersion::new(172, 0)),
        label: "test 172",
        identity: "test.0x10.v172",
    };
    static V190: DecoderDescriptor = DecoderDescriptor {
        opcode: 0x10,
        direction: Direction::ServerToClient,
        family: ProtocolFamily::Tcp,
        min_version: Some(ProtocolVersion::new(190, 0)),
        label: "test 190",
        identity: "test.0x10.v190",
    };
    static V190_2: DecoderDescriptor = DecoderDescriptor {
        opcode: 0x10,
        direction: Direction::ServerToClient,
        family: ProtocolFamily::Tcp,
        min_version: Some(ProtocolVersion::new(190, 2)),
        label: "test 190.2",
        identity: "test.0x10.v190_2",
    };

    fn build_group() -> DecoderRegistry {
        let mut builder = RegistryBuilder::new();
        builder
            .register(&V190_2, null_decode)
            .unwrap()
            .register(&ANY, null_decode)
            .unwrap()
            .register(&V172, null_decode)
            .unwrap()
            .register(&V190, null_decode)
            .unwrap();
        builder.build()
    }

    fn resolve_at(registry: &DecoderRegistry, major: u16, minor: u8) -> &'static str {
        registry
            .resolve(
                0x10,
                Direction::ServerToClient,
                ProtocolFamily::Tcp,
                ProtocolVersion::new(major, minor),
            )
            .unwrap()
            .descriptor
            .identity
    }

    #[test]
    fn resolution_picks_greatest_min_at_or_below() {
        let registry = build_group();
        assert_eq!(resolve_at(&registry, 190, 1), "test.0x10.v190");
        assert_eq!(resolve_at(&registry, 190, 2), "test.0x10.v190_2");
        assert_eq!(resolve_at(&registry, 195, 0), "test.0x10.v190_2");
        assert_eq!(resolve_at(&registry, 172, 0), "test.0x10.v172");
    }

    #[test]
    fn resolution_falls_back_to_any_version() {
        let registry = build_group();
        assert_eq!(resolve_at(&registry, 100, 0), "test.0x10.any");
    }

    #[test]
    fn unknown_opcode_fails_resolution() {
        let registry = build_group();
        let err = registry
            .resolve(
                0x77,
                Direction::ServerToClient,
                ProtocolFamily::Tcp,
                ProtocolVersion::new(190, 0),
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownOpcode { opcode: 0x77, .. }));
    }

    #[test]
    fn direction_and_family_participate_in_the_key() {
        let registry = build_group();
        assert!(registry
            .resolve(
                0x10,
                Direction::ClientToServer,
                ProtocolFamily::Tcp,
                ProtocolVersion::new(190, 0),
            )
            .is_err());
        assert!(registry
            .resolve(
                0x10,
                Direction::ServerToClient,
                ProtocolFamily::Udp,
                ProtocolVersion::new(190, 0),
            )
            .is_err());
    }

    #[test]
    fn duplicate_min_version_is_fatal() {
        let mut builder = RegistryBuilder::new();
        builder.register(&V190, null_decode).unwrap();
        let err = builder.register(&V190, null_decode).unwrap_err();
        assert!(matches!(err, CamlogError::DuplicateRegistration { .. }));
    }

    #[test]
    fn standard_registry_builds() {
        let registry = standard_registry().unwrap();
        assert_eq!(registry.len(), 5);
        assert!(registry.resolve_identity("stoc.0x4c.visual_effect").is_some());
        assert!(registry.resolve_identity("no.such.decoder").is_none());
    }

    #[test]
    fn decode_fn_is_invocable_through_resolution() {
        let registry = build_group();
        let raw = RawPacket::new(
            0x10,
            Direction::ServerToClient,
            ProtocolFamily::Tcp,
            0,
            Bytes::new(),
        );
        let registration = registry
            .resolve(
                0x10,
                Direction::ServerToClient,
                ProtocolFamily::Tcp,
                ProtocolVersion::new(190, 0),
            )
            .unwrap();
        let body = (registration.decode)(&raw, ProtocolVersion::new(190, 0)).unwrap();
        assert_eq!(body.render(false), "");
    }
}
