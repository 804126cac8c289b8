//! Visual effect (StoC 0x4C)
//!
//! # Packet Format
//! ```text
//! {u16 oid}{u8 subCode}{subcode-specific payload}
//! ```
//!
//! The sub-code selects one of several independent payload shapes, decoded
//! into the closed [`EffectUpdate`] union. Codes outside the known mapping
//! decode the common five-byte tail into [`EffectUpdate::Unknown`] and
//! render with an explicit `(UNKNOWN)` marker; dispatch itself never
//! fails.

use camlog_core::{Direction, ProtocolFamily, ProtocolVersion};

use crate::cursor::{DecodeError, PacketCursor};
use crate::packet::{PacketBody, RawPacket};
use crate::registry::DecoderDescriptor;

pub static DESCRIPTOR: DecoderDescriptor = DecoderDescriptor {
    opcode: 0x4C,
    direction: Direction::ServerToClient,
    family: ProtocolFamily::Tcp,
    min_version: None,
    label: "Visual effect",
    identity: "stoc.0x4c.visual_effect",
};

/// Client UI panels addressed by the blink-panel effect
const PANEL_LABELS: [&str; 24] = [
    "CommandWindow",
    "JournalButton",
    "MapButton",
    "SitButton",
    "StatsIndexWindow",
    "AttributesButton",
    "InventoryButton",
    "SpecializationsButton",
    "CombatStylesButton",
    "MagicSpellsButton",
    "GroupButton",
    "MiniInfoWindow",
    "CommandEnterWindow",
    "QuickBar1Window",
    "QBar1Bank1Button",
    "QBar1Bank2Button",
    "QBar1Bank3Button",
    "QBar1Bank4Button",
    "QBar1Bank5Button",
    "QBar1Bank6Button",
    "QBar1Bank7Button",
    "QBar1Bank8Button",
    "QBar1Bank9Button",
    "QBar1Bank10Button",
];

fn enable_disable(flag: u8) -> &'static str {
    if flag == 0 {
        "Disable"
    } else {
        "Enable"
    }
}

/// Sub-coded payload of a visual effect packet
///
/// Exactly one variant is active per packet; variants own their fields
/// and never reference a sibling's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectUpdate {
    /// Sub-code 1, mobs only
    MobGhost { flag: u8, unk1: u32 },
    /// Sub-code 3
    HexEffects { effects: [u8; 5] },
    /// Sub-code 4, high-speed underground-race movement
    VampiirFly { flag: u8, unk1: u32 },
    /// Sub-code 5, name coloring rule set
    ColorName { flag: u8, unk1: u32 },
    /// Sub-code 6, mobs only
    MobStealth { flag: u8, unk1: u32 },
    /// Sub-code 7
    QuestEffect { flag: u8, unk1: u32 },
    /// Sub-code 8, self only
    BlinkPanel { panel: u8, unk1: u32 },
    /// Sub-code 9, self only
    FreeLevel { flag: u8, unk1: u16, time: i16 },
    /// Sub-code 11, other players only
    Title {
        flag: u8,
        title_length: u16,
        unk1: u16,
        title: Option<String>,
    },
    /// Sub-code 12, players only
    Banner {
        flag: u8,
        new_emblem: u16,
        emblem: u16,
    },
    /// Sub-code 13, players only
    MinoRelicBegin { flag: u8, effect: u32 },
    /// Sub-code 14, players only
    MinoRelicTimer { flag: u8, timer: u32 },
    /// Sub-code 15, players only
    MinoRelicSetTimer { flag: u8, timer: u32 },
    /// Any sub-code outside the known mapping; common tail only
    Unknown { flag: u8, unk1: u16, unk2: u16 },
}

/// Decoded visual effect packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualEffectBody {
    pub oid: u16,
    pub sub_code: u8,
    pub effect: EffectUpdate,
}

/// Decode the prefix, then dispatch on the sub-code.
pub fn decode(
    raw: &RawPacket,
    _version: ProtocolVersion,
) -> Result<Box<dyn PacketBody>, DecodeError> {
    let mut cursor = PacketCursor::new(raw.data());
    let oid = cursor.read_u16()?;
    let sub_code = cursor.read_u8()?;
    let effect = decode_effect(sub_code, &mut cursor)?;
    Ok(Box::new(VisualEffectBody {
        oid,
        sub_code,
        effect,
    }))
}

fn decode_effect(
    sub_code: u8,
    cursor: &mut PacketCursor<'_>,
) -> Result<EffectUpdate, DecodeError> {
    let effect = match sub_code {
        1 => EffectUpdate::MobGhost {
            flag: cursor.read_u8()?,
            unk1: cursor.read_u32()?,
        },
        3 => {
            let mut effects = [0u8; 5];
            for slot in effects.iter_mut() {
                *slot = cursor.read_u8()?;
            }
            EffectUpdate::HexEffects { effects }
        }
        4 => EffectUpdate::VampiirFly {
            flag: cursor.read_u8()?,
            unk1: cursor.read_u32()?,
        },
        5 => EffectUpdate::ColorName {
            flag: cursor.read_u8()?,
            unk1: cursor.read_u32()?,
        },
        6 => EffectUpdate::MobStealth {
            flag: cursor.read_u8()?,
            unk1: cursor.read_u32()?,
        },
        7 => EffectUpdate::QuestEffect {
            flag: cursor.read_u8()?,
            unk1: cursor.read_u32()?,
        },
        8 => EffectUpdate::BlinkPanel {
            panel: cursor.read_u8()?,
            unk1: cursor.read_u32()?,
        },
        9 => EffectUpdate::FreeLevel {
            flag: cursor.read_u8()?,
            unk1: cursor.read_u16()?,
            time: cursor.read_u16()? as i16,
        },
        11 => {
            let flag = cursor.read_u8()?;
            let title_length = cursor.read_u16()?;
            let unk1 = cursor.read_u16()?;
            let title = if flag == 1 {
                Some(cursor.read_string(title_length as usize)?)
            } else {
                None
            };
            EffectUpdate::Title {
                flag,
                title_length,
                unk1,
                title,
            }
        }
        12 => EffectUpdate::Banner {
            flag: cursor.read_u8()?,
            new_emblem: cursor.read_u16()?,
            emblem: cursor.read_u16()?,
        },
        13 => EffectUpdate::MinoRelicBegin {
            flag: cursor.read_u8()?,
            effect: cursor.read_u32()?,
        },
        14 => EffectUpdate::MinoRelicTimer {
            flag: cursor.read_u8()?,
            timer: cursor.read_u32()?,
        },
        15 => EffectUpdate::MinoRelicSetTimer {
            flag: cursor.read_u8()?,
            timer: cursor.read_u32()?,
        },
        _ => EffectUpdate::Unknown {
            flag: cursor.read_u8()?,
            unk1: cursor.read_u16()?,
            unk2: cursor.read_u16()?,
        },
    };
    Ok(effect)
}

impl EffectUpdate {
    fn render(&self, verbose: bool) -> String {
        match self {
            EffectUpdate::MobGhost { flag, unk1 } => {
                let mut text = format!("(MobGhost?) flag:{}({})", flag, enable_disable(*flag));
                if verbose {
                    text.push_str(&format!(" unk1:{unk1}"));
                }
                text
            }
            EffectUpdate::HexEffects { effects } => format!(
                "(HexEffects) effect1:0x{:02X} effect2:0x{:02X} effect3:0x{:02X} effect4:0x{:02X} effect5:0x{:02X}",
                effects[0], effects[1], effects[2], effects[3], effects[4]
            ),
            EffectUpdate::VampiirFly { flag, unk1 } => {
                let mut text = format!("(VampiirFly) flag:{flag}");
                if verbose {
                    text.push_str(&format!(" unk1:{unk1}"));
                }
                text
            }
            EffectUpdate::ColorName { flag, unk1 } => {
                let rule = if *flag == 1 { "PvP" } else { "RvR" };
                let mut text = format!("(ColorName) flag:{flag}({rule})");
                if verbose {
                    text.push_str(&format!(" unk1:{unk1}"));
                }
                text
            }
            EffectUpdate::MobStealth { flag, unk1 } => {
                let mut text = format!("(MobStealth) flag:{}({})", flag, enable_disable(*flag));
                if verbose {
                    text.push_str(&format!(" unk1:{unk1}"));
                }
                text
            }
            EffectUpdate::QuestEffect { flag, unk1 } => {
                let mut text =
                    format!("(QuestEffect) flag:0x{:02X}({})", flag, enable_disable(*flag));
                if verbose {
                    text.push_str(&format!(" unk1:{unk1}"));
                }
                text
            }
            EffectUpdate::BlinkPanel { panel, unk1 } => {
                let mut text = match PANEL_LABELS.get(*panel as usize) {
                    Some(label) => format!("(BlinkPanel) flag:{panel}({label})"),
                    None => format!("(BlinkPanel) flag:{panel}"),
                };
                if verbose {
                    text.push_str(&format!(" unk1:{unk1}"));
                }
                text
            }
            EffectUpdate::FreeLevel { flag, unk1, time } => {
                let mut text = format!("(FreeLevel) flag:{flag}");
                text.push_str(&free_level_message(*flag, *time));
                if verbose {
                    text.push_str(&format!(" unk1:{unk1}"));
                }
                text
            }
            EffectUpdate::Title {
                flag,
                title_length,
                unk1,
                title,
            } => {
                let state = if *flag == 0 { "Clear" } else { "Set" };
                let mut text = format!(
                    "(Title) flag:{flag}({state}) titleLength:{title_length} unk1:{unk1}"
                );
                if let Some(title) = title {
                    text.push_str(&format!(" title:\"{title}\""));
                }
                text
            }
            EffectUpdate::Banner {
                flag,
                new_emblem,
                emblem,
            } => {
                // Disable is flag == 1 for banners, inverted from the
                // other effects.
                let state = if *flag == 1 { "Disable" } else { "Enable" };
                format!(
                    "(Banner) flag:{flag}({state}) newEmblem:0x{new_emblem:04X} guildEmblem:{emblem}"
                )
            }
            EffectUpdate::MinoRelicBegin { flag, effect } => {
                let state = if *flag == 1 { "Disable" } else { "Enable" };
                format!("(MinoRelic) flag:{flag}({state}) effect:0x{effect:08X}")
            }
            EffectUpdate::MinoRelicTimer { flag, timer } => {
                format!("(MinoRelicTimer) flag:{flag} timer:{timer}")
            }
            EffectUpdate::MinoRelicSetTimer { flag, timer } => {
                format!("(MinoRelicTimerSet) flag:{flag} timer:{timer}")
            }
            EffectUpdate::Unknown { flag, unk1, unk2 } => {
                format!("(UNKNOWN) flag:{flag} unk1:0x{unk1:04X} unk2:0x{unk2:04X}")
            }
        }
    }
}

/// Free-level state messages keyed by the flag value.
fn free_level_message(flag: u8, time: i16) -> String {
    let minutes_total = i32::from(time) - 1;
    let days = minutes_total / (24 * 60);
    let hours = (minutes_total / 60) % 24;
    let minutes = minutes_total % 60;
    match flag {
        1 => "(\"Above the max level to obtain a free level\")".to_string(),
        2 => "(\"Now eligible for a free level\")".to_string(),
        3 => format!(
            "(\"{days} days {hours} hours {minutes} minutes until a free level\") time:0x{time:04X}"
        ),
        4 => format!(
            "(\"One level and {days} days {hours} hours {minutes} minutes until a free level\") time:0x{time:04X}"
        ),
        5 => "(\"One level until a free level\")".to_string(),
        _ => "(Disable)".to_string(),
    }
}

impl PacketBody for VisualEffectBody {
    fn render(&self, verbose: bool) -> String {
        format!(
            "oid:0x{:04X} subcode:{} {}",
            self.oid,
            self.sub_code,
            self.effect.render(verbose)
        )
    }

    fn object_ids(&self) -> Vec<u16> {
        vec![self.oid]
    }
}
