//! Siege weapon interact (StoC 0xF5)
//!
//! # Packet Format
//! ```text
//! {u8 menuButtons}{u8 canMove}{u16 unk2}{u8 timer}{u8 ammoCount}
//! {u8 action}{u8 currentAmmoIndex}{u16 effect}{u16 unk6}{u16 unk7}
//! {u16 oid}{Item[ammoCount] items}{pascal name}
//! ```
//! Each inventory item:
//! ```text
//! {u8 index}{u8 level}{u8 value1}{u8 value2}{u8 unk1}{u8 objectType}
//! {u8 unk2}{u8 count}{u8 condition}{u8 durability}{u8 quality}
//! {u8 bonus}{u16 model}{u8 extension}{u16 effect}{u16 color}
//! {pascal name}
//! ```
//!
//! The timer field counts tenths of seconds.

use camlog_core::{Direction, ProtocolFamily, ProtocolVersion};

use crate::cursor::{DecodeError, PacketCursor};
use crate::packet::{PacketBody, RawPacket};
use crate::registry::DecoderDescriptor;

pub static DESCRIPTOR: DecoderDescriptor = DecoderDescriptor {
    opcode: 0xF5,
    direction: Direction::ServerToClient,
    family: ProtocolFamily::Tcp,
    min_version: None,
    label: "Siege weapon interact",
    identity: "stoc.0xf5.siege_weapon_interact",
};

/// One loadable ammo item shown in the siege weapon window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiegeAmmoItem {
    pub index: u8,
    pub level: u8,
    pub value1: u8,
    pub value2: u8,
    pub unk1: u8,
    pub object_type: u8,
    pub unk2: u8,
    pub count: u8,
    pub condition: u8,
    pub durability: u8,
    pub quality: u8,
    pub bonus: u8,
    pub model: u16,
    pub extension: u8,
    pub effect: u16,
    pub color: u16,
    pub name: String,
}

/// Decoded siege weapon interact packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiegeWeaponBody {
    pub menu_buttons: u8,
    pub can_move: u8,
    pub unk2: u16,
    /// Action countdown in tenths of seconds
    pub timer: u8,
    pub ammo_count: u8,
    pub action: u8,
    pub current_ammo_index: u8,
    pub effect: u16,
    pub unk6: u16,
    pub unk7: u16,
    pub oid: u16,
    pub items: Vec<SiegeAmmoItem>,
    pub name: String,
}

impl SiegeWeaponBody {
    /// Label for the action byte; "opening" doubles as "closing" when the
    /// second word is 1.
    pub fn action_label(&self) -> &'static str {
        match self.action {
            0 if self.unk2 == 1 => "closing",
            0 => "opening",
            1 => "aiming",
            2 => "arming",
            3 => "loading",
            5 => "helping",
            _ => "unknown",
        }
    }
}

pub fn decode(
    raw: &RawPacket,
    _version: ProtocolVersion,
) -> Result<Box<dyn PacketBody>, DecodeError> {
    let mut cursor = PacketCursor::new(raw.data());
    let menu_buttons = cursor.read_u8()?;
    let can_move = cursor.read_u8()?;
    let unk2 = cursor.read_u16()?;
    let timer = cursor.read_u8()?;
    let ammo_count = cursor.read_u8()?;
    let action = cursor.read_u8()?;
    let current_ammo_index = cursor.read_u8()?;
    let effect = cursor.read_u16()?;
    let unk6 = cursor.read_u16()?;
    let unk7 = cursor.read_u16()?;
    let oid = cursor.read_u16()?;

    let mut items = Vec::with_capacity(ammo_count as usize);
    for _ in 0..ammo_count {
        items.push(SiegeAmmoItem {
            index: cursor.read_u8()?,
            level: cursor.read_u8()?,
            value1: cursor.read_u8()?,
            value2: cursor.read_u8()?,
            unk1: cursor.read_u8()?,
            object_type: cursor.read_u8()?,
            unk2: cursor.read_u8()?,
            count: cursor.read_u8()?,
            condition: cursor.read_u8()?,
            durability: cursor.read_u8()?,
            quality: cursor.read_u8()?,
            bonus: cursor.read_u8()?,
            model: cursor.read_u16()?,
            extension: cursor.read_u8()?,
            effect: cursor.read_u16()?,
            color: cursor.read_u16()?,
            name: cursor.read_pascal_string()?,
        });
    }
    let name = cursor.read_pascal_string()?;

    Ok(Box::new(SiegeWeaponBody {
        menu_buttons,
        can_move,
        unk2,
        timer,
        ammo_count,
        action,
        current_ammo_index,
        effect,
        unk6,
        unk7,
        oid,
        items,
        name,
    }))
}

impl PacketBody for SiegeWeaponBody {
    fn render(&self, verbose: bool) -> String {
        let mut text = format!(
            "menuButtons:0x{:02X} canMove:{} unk2:0x{:04X} timer:{:<3} externalAmmoCount:{} action:{}({}) currentAmmoIndex:{:<2} effect:0x{:04X} unk6:0x{:04X} unk7:0x{:04X} oid:0x{:04X} name:\"{}\"",
            self.menu_buttons,
            self.can_move,
            self.unk2,
            self.timer,
            self.ammo_count,
            self.action,
            self.action_label(),
            self.current_ammo_index,
            self.effect,
            self.unk6,
            self.unk7,
            self.oid,
            self.name,
        );
        if verbose && self.effect != 0 {
            text.push_str(&format!(" spellId:0x{:04X}", self.effect));
        }
        for item in &self.items {
            text.push_str(&format!(
                "\n\tindex:{:<2} level:{:<2} value1:0x{:02X} value2:0x{:02X} unk1:0x{:02X} objectType:0x{:02X} unk2:0x{:02X} count:{:<2} condition:{:<3} durability:{:<3} quality:{:<3} bonus:{:<2} model:0x{:04X} extension:{} effect:0x{:04X} color:0x{:04X} name:\"{}\"",
                item.index,
                item.level,
                item.value1,
                item.value2,
                item.unk1,
                item.object_type,
                item.unk2,
                item.count,
                item.condition,
                item.durability,
                item.quality,
                item.bonus,
                item.model,
                item.extension,
                item.effect,
                item.color,
                item.name,
            ));
        }
        text
    }

    fn object_ids(&self) -> Vec<u16> {
        vec![self.oid]
    }
}
