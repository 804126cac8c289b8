//! Region init tables (StoC 0x9E)
//!
//! # Packet Format
//! Four region entries, fixed width:
//! ```text
//! {u8 regionIndex}{u8 regionId}{char[20] name}
//! {char[5] fromPort}{char[5] toPort}{char[20] ip}
//! ```
//! Unused slots carry region index 0 and are skipped when rendering.

use camlog_core::{Direction, ProtocolFamily, ProtocolVersion};

use crate::cursor::{DecodeError, PacketCursor};
use crate::packet::{PacketBody, RawPacket};
use crate::registry::DecoderDescriptor;

/// Entries per packet, used slots or not.
pub const REGION_SLOTS: usize = 4;

pub static DESCRIPTOR: DecoderDescriptor = DecoderDescriptor {
    opcode: 0x9E,
    direction: Direction::ServerToClient,
    family: ProtocolFamily::Tcp,
    min_version: None,
    label: "Region init tables",
    identity: "stoc.0x9e.region_init_tables",
};

/// One region routing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    pub region_index: u8,
    pub region_id: u8,
    pub name: String,
    pub from_port: String,
    pub to_port: String,
    pub ip: String,
}

/// Decoded region init packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInitBody {
    pub regions: Vec<RegionEntry>,
}

pub fn decode(
    raw: &RawPacket,
    _version: ProtocolVersion,
) -> Result<Box<dyn PacketBody>, DecodeError> {
    let mut cursor = PacketCursor::new(raw.data());
    let mut regions = Vec::with_capacity(REGION_SLOTS);
    for _ in 0..REGION_SLOTS {
        regions.push(RegionEntry {
            region_index: cursor.read_u8()?,
            region_id: cursor.read_u8()?,
            name: cursor.read_string(20)?,
            from_port: cursor.read_string(5)?,
            to_port: cursor.read_string(5)?,
            ip: cursor.read_string(20)?,
        });
    }
    Ok(Box::new(RegionInitBody { regions }))
}

impl PacketBody for RegionInitBody {
    fn render(&self, _verbose: bool) -> String {
        let mut text = String::new();
        for region in &self.regions {
            if region.region_index == 0 {
                continue;
            }
            text.push_str(&format!(
                "\n\tregionIndex:{:<3} regionId:{:<3} name:{} fromPort:{} toPort:{} ip:{:<15}",
                region.region_index,
                region.region_id,
                region.name,
                region.from_port,
                region.to_port,
                region.ip,
            ));
        }
        text
    }
}
