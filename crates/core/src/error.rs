//! Core error types for camlog

use crate::{Direction, ProtocolFamily};

#[derive(thiserror::Error, Debug)]
pub enum CamlogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Duplicate decoder registration: opcode 0x{opcode:02X} {direction:?} {family:?} min version {min_version}"
    )]
    DuplicateRegistration {
        opcode: u16,
        direction: Direction,
        family: ProtocolFamily,
        min_version: String,
    },

    #[error("Malformed container: {0}")]
    MalformedContainer(String),
}

pub type Result<T> = std::result::Result<T, CamlogError>;
