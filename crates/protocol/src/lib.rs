//! # camlog protocol library
//!
//! Decoding layer for the versioned binary client-server protocol found in
//! captured packet logs.
//!
//! ## Architecture
//!
//! The crate is organized into layers:
//!
//! ### 1. Cursor layer ([`cursor`])
//! A sequential bounds-checked reader over one packet's raw buffer. All
//! multi-byte integers are network order (big-endian) as on the wire.
//!
//! ### 2. Packet model ([`packet`])
//! [`RawPacket`] is the immutable captured record (opcode, direction,
//! family, timestamp, bytes). [`DecodedPacket`] pairs it with a decoded
//! [`PacketBody`] and the descriptor that produced it.
//!
//! ### 3. Decoder registry ([`registry`])
//! An immutable table from (opcode, direction, family) to version-ordered
//! decoders. Resolution picks the decoder with the greatest minimum
//! version at or below the active version, falling back to the
//! any-version entry.
//!
//! ### 4. Decoder population ([`decoders`])
//! One module per packet format, including the sub-coded visual-effect
//! payloads which dispatch into a closed variant enum.
//!
//! ## Version context
//!
//! [`LogContext`] carries the active protocol version for one log. Some
//! decoders can tell from their own payload shape that the assumed
//! version is stale and request a (monotonic) correction; see
//! [`LogContext::request_version`].

pub mod context;
pub mod cursor;
pub mod decoders;
pub mod packet;
pub mod registry;

pub use context::LogContext;
pub use cursor::{DecodeError, PacketCursor};
pub use packet::{DecodedPacket, PacketBody, RawPacket, UndecodedBody};
pub use registry::{
    standard_registry, DecodeFn, DecoderDescriptor, DecoderRegistry, RegistryBuilder,
    Registration, ResolveError,
};
