//! Built-in packet decoder population
//!
//! One module per packet format. Each module owns its descriptor
//! statics, its decode entry point and the body type with its render
//! logic; [`crate::registry::standard_registry`] wires them together.

pub mod player_position;
pub mod region_tables;
pub mod siege_weapon;
pub mod visual_effect;
