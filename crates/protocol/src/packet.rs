//! Raw and decoded packet model
//!
//! [`RawPacket`] is the immutable captured record; [`DecodedPacket`] pairs
//! it with the parsed representation and the descriptor that produced it.
//! Decoding never consumes the raw bytes, so any decoded packet can be
//! re-serialized byte-exactly.

use bytes::Bytes;
use camlog_core::{Direction, ProtocolFamily};

use crate::context::LogContext;
use crate::cursor::DecodeError;
use crate::registry::DecoderDescriptor;

/// Identity written to the container for packets without a decoder.
pub const RAW_IDENTITY: &str = "raw";

/// One captured packet, never mutated after capture
#[derive(Debug, Clone)]
pub struct RawPacket {
    opcode: u16,
    direction: Direction,
    family: ProtocolFamily,
    timestamp_ticks: i64,
    data: Bytes,
}

impl RawPacket {
    pub fn new(
        opcode: u16,
        direction: Direction,
        family: ProtocolFamily,
        timestamp_ticks: i64,
        data: Bytes,
    ) -> Self {
        Self {
            opcode,
            direction,
            family,
            timestamp_ticks,
            data,
        }
    }

    #[inline]
    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn family(&self) -> ProtocolFamily {
        self.family
    }

    /// Capture time in 100 ns ticks.
    #[inline]
    pub fn timestamp_ticks(&self) -> i64 {
        self.timestamp_ticks
    }

    /// Raw payload bytes as captured.
    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Parsed representation of one packet
///
/// Implementations own their fields and a self-contained render method.
/// `update_context` is the version-drift side channel: it runs once per
/// decode and may request a correction on the shared [`LogContext`].
pub trait PacketBody: std::fmt::Debug {
    /// Produce the human-readable diagnostic string for this packet.
    ///
    /// Verbose mode additionally shows fields with unknown purpose that
    /// the normal rendering suppresses.
    fn render(&self, verbose: bool) -> String;

    /// Object identifiers this packet references, for id-based filtering.
    fn object_ids(&self) -> Vec<u16> {
        Vec::new()
    }

    /// Inspect the decoded packet against the shared version context.
    fn update_context(&self, _raw: &RawPacket, _ctx: &mut LogContext) {}
}

/// A decoded packet: source bytes plus parsed body
#[derive(Debug)]
pub struct DecodedPacket {
    raw: RawPacket,
    descriptor: Option<&'static DecoderDescriptor>,
    body: Box<dyn PacketBody>,
}

impl DecodedPacket {
    pub fn new(
        raw: RawPacket,
        descriptor: Option<&'static DecoderDescriptor>,
        body: Box<dyn PacketBody>,
    ) -> Self {
        Self {
            raw,
            descriptor,
            body,
        }
    }

    #[inline]
    pub fn raw(&self) -> &RawPacket {
        &self.raw
    }

    #[inline]
    pub fn opcode(&self) -> u16 {
        self.raw.opcode()
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.raw.direction()
    }

    #[inline]
    pub fn family(&self) -> ProtocolFamily {
        self.raw.family()
    }

    /// Descriptor of the decoder that produced the body, if any.
    #[inline]
    pub fn descriptor(&self) -> Option<&'static DecoderDescriptor> {
        self.descriptor
    }

    /// Stable identity string written to the container.
    pub fn identity(&self) -> &'static str {
        self.descriptor.map_or(RAW_IDENTITY, |d| d.identity)
    }

    #[inline]
    pub fn body(&self) -> &dyn PacketBody {
        self.body.as_ref()
    }

    pub fn render(&self, verbose: bool) -> String {
        self.body.render(verbose)
    }

    pub fn object_ids(&self) -> Vec<u16> {
        self.body.object_ids()
    }
}

/// Fallback body for packets without a usable decoder
///
/// Covers both unregistered opcodes and decode failures; either way the
/// packet stays in the log and renders its raw bytes.
#[derive(Debug)]
pub struct UndecodedBody {
    data: Bytes,
    error: Option<DecodeError>,
}

impl UndecodedBody {
    /// Body for an opcode with no registered decoder.
    pub fn unknown_opcode(data: Bytes) -> Self {
        Self { data, error: None }
    }

    /// Body for a packet whose decoder failed on malformed input.
    pub fn malformed(data: Bytes, error: DecodeError) -> Self {
        Self {
            data,
            error: Some(error),
        }
    }

    pub fn decode_error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }
}

impl PacketBody for UndecodedBody {
    fn render(&self, _verbose: bool) -> String {
        match &self.error {
            Some(error) => format!(
                "MALFORMED ({error}) len:{} data:{}",
                self.data.len(),
                hex_dump(&self.data)
            ),
            None => format!(
                "UNKNOWN OPCODE len:{} data:{}",
                self.data.len(),
                hex_dump(&self.data)
            ),
        }
    }
}

/// Render bytes as space-separated uppercase hex pairs.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02X}"));
    }
    out
}
