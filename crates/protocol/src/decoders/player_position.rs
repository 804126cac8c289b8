//! Player position update (StoC 0xA9)
//!
//! # Packet Format
//! Base layout (clients since 172):
//! ```text
//! {u16 sessionId}{u16 status}{u16 zoneZ}{u16 zoneX}{u16 zoneY}
//! {u16 zoneId}{u16 heading}{u16 zSpeed}{u8 flag}{u8 health}
//! ```
//! The 190 layout appends:
//! ```text
//! {u8 manaPercent}{u8 endurancePercent}{char[32] className}
//! ```
//!
//! # Bit packing
//! - `status`: ground speed in the low 9 bits, state flags in the high 7.
//! - `heading`: direction in the low 12 bits, extra bits above bit 12.
//! - `zSpeed`: magnitude in the low 12 bits, sign in bit 0x1000, fly
//!   flags in the bits above bit 11.
//! - `health`: percentage in the low 7 bits, in-combat flag in bit 7.
//!
//! # Version drift
//! A 54-byte payload can only be the 190.2 layout. When the log context
//! still assumes a 190 version below 190.2 and is not latched, decoding
//! such a packet corrects the context (subversion detection is not
//! reliable server-side, so the payload length is the signal).

use camlog_core::{Direction, ProtocolFamily, ProtocolVersion};

use crate::context::LogContext;
use crate::cursor::{DecodeError, PacketCursor};
use crate::packet::{PacketBody, RawPacket};
use crate::registry::DecoderDescriptor;

/// Total payload length of the base layout.
pub const BASE_LEN: usize = 20;
/// Total payload length of the 190 layout.
pub const V190_LEN: usize = 54;
/// Fixed width of the trailing class name field.
const CLASS_NAME_WIDTH: usize = 32;

const V190_0: ProtocolVersion = ProtocolVersion::new(190, 0);
const V190_2: ProtocolVersion = ProtocolVersion::new(190, 2);

pub static BASE_DESCRIPTOR: DecoderDescriptor = DecoderDescriptor {
    opcode: 0xA9,
    direction: Direction::ServerToClient,
    family: ProtocolFamily::Tcp,
    min_version: Some(ProtocolVersion::new(172, 0)),
    label: "Player position update",
    identity: "stoc.0xa9.player_position.v172",
};

pub static V190_DESCRIPTOR: DecoderDescriptor = DecoderDescriptor {
    opcode: 0xA9,
    direction: Direction::ServerToClient,
    family: ProtocolFamily::Tcp,
    min_version: Some(ProtocolVersion::new(190, 1)),
    label: "Player position update (190c)",
    identity: "stoc.0xa9.player_position.v190",
};

/// Fields only present in the 190 layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V190Fields {
    pub mana_percent: u8,
    pub endurance_percent: u8,
    pub class_name: String,
}

/// Decoded player position update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerPositionBody {
    pub session_id: u16,
    pub status: u16,
    pub zone_z: u16,
    pub zone_x: u16,
    pub zone_y: u16,
    pub zone_id: u16,
    pub heading: u16,
    pub z_speed: u16,
    pub flag: u8,
    pub health: u8,
    /// Trailing fields of the 190 layout; `None` for the base layout
    pub v190: Option<V190Fields>,
}

impl PlayerPositionBody {
    /// Ground speed packed into the low 9 bits of `status`.
    #[inline]
    pub fn speed(&self) -> u16 {
        self.status & 0x1FF
    }

    /// State flags from the high bits of `status`.
    #[inline]
    pub fn status_flags(&self) -> u8 {
        ((self.status & !0x1FF) >> 8) as u8
    }

    /// Heading direction, low 12 bits.
    #[inline]
    pub fn heading_value(&self) -> u16 {
        self.heading & 0xFFF
    }

    /// Bits above the heading direction.
    #[inline]
    pub fn heading_high_bits(&self) -> u8 {
        (self.heading >> 13) as u8
    }

    /// Vertical speed with the 0x1000 sign bit applied.
    pub fn z_speed_signed(&self) -> i32 {
        let magnitude = i32::from(self.z_speed & 0xFFF);
        if self.z_speed & 0x1000 == 0x1000 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Fly flags from the high bits of the z-speed word.
    #[inline]
    pub fn fly_flags(&self) -> u8 {
        ((self.z_speed & !0x7FF) >> 8) as u8
    }

    /// Health percentage, low 7 bits of the health byte.
    #[inline]
    pub fn health_percent(&self) -> u8 {
        self.health & 0x7F
    }

    /// In-combat flag, bit 7 of the health byte.
    #[inline]
    pub fn health_flag(&self) -> bool {
        self.health & 0x80 != 0
    }
}

fn read_shared(cursor: &mut PacketCursor<'_>) -> Result<PlayerPositionBody, DecodeError> {
    Ok(PlayerPositionBody {
        session_id: cursor.read_u16()?,
        status: cursor.read_u16()?,
        zone_z: cursor.read_u16()?,
        zone_x: cursor.read_u16()?,
        zone_y: cursor.read_u16()?,
        zone_id: cursor.read_u16()?,
        heading: cursor.read_u16()?,
        z_speed: cursor.read_u16()?,
        flag: cursor.read_u8()?,
        health: cursor.read_u8()?,
        v190: None,
    })
}

/// Decode the base (172) layout.
pub fn decode_base(
    raw: &RawPacket,
    _version: ProtocolVersion,
) -> Result<Box<dyn PacketBody>, DecodeError> {
    let mut cursor = PacketCursor::new(raw.data());
    let body = read_shared(&mut cursor)?;
    Ok(Box::new(body))
}

/// Decode the 190 layout: shared fields plus mana/endurance/class name.
pub fn decode_v190(
    raw: &RawPacket,
    _version: ProtocolVersion,
) -> Result<Box<dyn PacketBody>, DecodeError> {
    let mut cursor = PacketCursor::new(raw.data());
    let mut body = read_shared(&mut cursor)?;
    body.v190 = Some(V190Fields {
        mana_percent: cursor.read_u8()?,
        endurance_percent: cursor.read_u8()?,
        class_name: cursor.read_string(CLASS_NAME_WIDTH)?,
    });
    Ok(Box::new(body))
}

impl PacketBody for PlayerPositionBody {
    fn render(&self, verbose: bool) -> String {
        let mut text = format!(
            "sessionId:0x{:04X} status:0x{:02X} speed:{:<3} heading:0x{:04X}(0x{:X}) currentZone({:<3}): ({:<6} {:<6} {:<5}) flyFlags:0x{:02X} speedZ:{:<5} flag:0x{:02X} health:{:>3}%",
            self.session_id,
            self.status_flags(),
            self.speed(),
            self.heading_value(),
            self.heading_high_bits(),
            self.zone_id,
            self.zone_x,
            self.zone_y,
            self.zone_z,
            self.fly_flags(),
            self.z_speed_signed(),
            self.flag,
            self.health_percent(),
        );
        if let Some(v190) = &self.v190 {
            text.push_str(&format!(
                " mana:{:>3}% endurance:{:>3}% className:{}",
                v190.mana_percent, v190.endurance_percent, v190.class_name
            ));
        }
        if verbose {
            text.push_str(&format!(
                " rawStatus:0x{:04X} rawHeading:0x{:04X} rawSpeedZ:0x{:04X} combat:{}",
                self.status,
                self.heading,
                self.z_speed,
                u8::from(self.health_flag()),
            ));
        }
        text
    }

    fn update_context(&self, raw: &RawPacket, ctx: &mut LogContext) {
        // Subversion detection: a 54-byte payload only exists from 190.2 on.
        if ctx.is_latched() {
            return;
        }
        let version = ctx.version();
        if version >= V190_0 && version < V190_2 && raw.len() == V190_LEN {
            ctx.request_version(V190_2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn base_payload() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0x0042u16.to_be_bytes()); // sessionId
        buf.extend_from_slice(&0x0280u16.to_be_bytes()); // status: flags 0x02, speed 0x80
        buf.extend_from_slice(&100u16.to_be_bytes()); // zoneZ
        buf.extend_from_slice(&2000u16.to_be_bytes()); // zoneX
        buf.extend_from_slice(&3000u16.to_be_bytes()); // zoneY
        buf.extend_from_slice(&51u16.to_be_bytes()); // zoneId
        buf.extend_from_slice(&0x2123u16.to_be_bytes()); // heading
        buf.extend_from_slice(&0x1014u16.to_be_bytes()); // zSpeed: -0x14
        buf.push(0x05); // flag
        buf.push(0xE3); // health: flag bit set, 99%
        buf
    }

    fn v190_payload() -> Vec<u8> {
        let mut buf = base_payload();
        buf.push(87); // manaPercent
        buf.push(100); // endurancePercent
        let mut class_name = [0u8; 32];
        class_name[..8].copy_from_slice(b"Armsman\0");
        buf.extend_from_slice(&class_name);
        buf
    }

    fn raw(payload: Vec<u8>) -> RawPacket {
        RawPacket::new(
            0xA9,
            Direction::ServerToClient,
            ProtocolFamily::Tcp,
            0,
            Bytes::from(payload),
        )
    }

    #[test]
    fn base_layout_is_twenty_bytes() {
        assert_eq!(base_payload().len(), BASE_LEN);
        assert_eq!(v190_payload().len(), V190_LEN);
    }

    #[test]
    fn decode_base_fields() {
        let raw = raw(base_payload());
        let body = decode_base(&raw, ProtocolVersion::new(172, 0)).unwrap();
        let text = body.render(false);
        assert!(text.contains("sessionId:0x0042"));
        assert!(text.contains("speed:128"));
        assert!(text.contains("health: 99%"));
        assert!(!text.contains("className"));
    }

    #[test]
    fn decode_v190_fields() {
        let raw = raw(v190_payload());
        let body = decode_v190(&raw, ProtocolVersion::new(190, 2)).unwrap();
        let text = body.render(false);
        assert!(text.contains("mana: 87%"));
        assert!(text.contains("className:Armsman"));
    }

    #[test]
    fn health_bits_split() {
        let payload = base_payload();
        let mut cursor = PacketCursor::new(&payload);
        let body = read_shared(&mut cursor).unwrap();
        assert_eq!(body.health, 0xE3);
        assert_eq!(body.health_percent(), 0x63);
        assert!(body.health_flag());
    }

    #[test]
    fn z_speed_sign_bit() {
        let payload = base_payload();
        let mut cursor = PacketCursor::new(&payload);
        let body = read_shared(&mut cursor).unwrap();
        assert_eq!(body.z_speed_signed(), -0x14);
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let raw = raw(base_payload()[..7].to_vec());
        let err = decode_base(&raw, ProtocolVersion::new(172, 0)).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedBuffer { .. }));
    }

    #[test]
    fn fifty_four_byte_payload_corrects_version() {
        let raw = raw(v190_payload());
        let body = decode_base(&raw, ProtocolVersion::new(190, 0)).unwrap();
        let mut ctx = LogContext::inferred(ProtocolVersion::new(190, 0));
        body.update_context(&raw, &mut ctx);
        assert_eq!(ctx.version(), ProtocolVersion::new(190, 2));
        assert!(ctx.needs_reinit());
    }

    #[test]
    fn no_correction_outside_the_version_window() {
        let raw = raw(v190_payload());
        let body = decode_base(&raw, ProtocolVersion::new(172, 0)).unwrap();

        let mut ctx = LogContext::inferred(ProtocolVersion::new(172, 0));
        body.update_context(&raw, &mut ctx);
        assert_eq!(ctx.version(), ProtocolVersion::new(172, 0));

        let mut ctx = LogContext::inferred(ProtocolVersion::new(190, 2));
        body.update_context(&raw, &mut ctx);
        assert!(!ctx.needs_reinit());
    }

    #[test]
    fn no_correction_when_latched() {
        let raw = raw(v190_payload());
        let body = decode_base(&raw, ProtocolVersion::new(190, 0)).unwrap();
        let mut ctx = LogContext::new(ProtocolVersion::new(190, 0));
        ctx.latch();
        body.update_context(&raw, &mut ctx);
        assert_eq!(ctx.version(), ProtocolVersion::new(190, 0));
    }

    #[test]
    fn no_correction_for_base_length_payload() {
        let raw = raw(base_payload());
        let body = decode_base(&raw, ProtocolVersion::new(190, 0)).unwrap();
        let mut ctx = LogContext::inferred(ProtocolVersion::new(190, 0));
        body.update_context(&raw, &mut ctx);
        assert_eq!(ctx.version(), ProtocolVersion::new(190, 0));
    }
}
