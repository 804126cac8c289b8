//! Packet log replay with version-drift correction
//!
//! A [`PacketLog`] owns the decoded packets of one capture and the
//! [`LogContext`] they share. Appending decodes under the context's
//! current version, then gives the decoded body a chance to correct that
//! version from its own structural signals. A granted correction
//! re-decodes everything read so far under the corrected version and
//! latches the context, so recurring ambiguous payloads cannot make the
//! version oscillate.

use std::sync::Arc;

use camlog_protocol::{
    DecodedPacket, DecoderRegistry, LogContext, RawPacket, UndecodedBody,
};

/// Ordered, decoded packets of one capture sharing one version context
pub struct PacketLog {
    registry: Arc<DecoderRegistry>,
    context: LogContext,
    packets: Vec<DecodedPacket>,
}

impl PacketLog {
    pub fn new(registry: Arc<DecoderRegistry>, context: LogContext) -> Self {
        Self {
            registry,
            context,
            packets: Vec::new(),
        }
    }

    #[inline]
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn packets(&self) -> &[DecodedPacket] {
        &self.packets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecodedPacket> {
        self.packets.iter()
    }

    fn decode_raw(registry: &DecoderRegistry, raw: RawPacket, ctx: &LogContext) -> DecodedPacket {
        match registry.resolve(raw.opcode(), raw.direction(), raw.family(), ctx.version()) {
            Ok(registration) => match (registration.decode)(&raw, ctx.version()) {
                Ok(body) => DecodedPacket::new(raw, Some(registration.descriptor), body),
                Err(error) => {
                    tracing::debug!(
                        opcode = raw.opcode(),
                        %error,
                        "packet failed to decode; keeping raw bytes"
                    );
                    let body = UndecodedBody::malformed(raw.data().clone(), error);
                    DecodedPacket::new(raw, Some(registration.descriptor), Box::new(body))
                }
            },
            Err(error) => {
                tracing::debug!(%error, "no decoder; keeping raw bytes");
                let body = UndecodedBody::unknown_opcode(raw.data().clone());
                DecodedPacket::new(raw, None, Box::new(body))
            }
        }
    }

    /// Decode and append one captured packet in capture order.
    ///
    /// When the decoded body corrects the context version, all packets
    /// already read (including this one) are re-decoded under the
    /// corrected version and the context is latched.
    pub fn append(&mut self, raw: RawPacket) {
        let mut decoded = Self::decode_raw(&self.registry, raw, &self.context);
        decoded.body().update_context(decoded.raw(), &mut self.context);

        if self.context.take_reinit() {
            self.context.latch();
            for packet in &mut self.packets {
                *packet = Self::decode_raw(&self.registry, packet.raw().clone(), &self.context);
            }
            decoded = Self::decode_raw(&self.registry, decoded.raw().clone(), &self.context);
        }

        self.packets.push(decoded);
    }

    /// Append a packet decoded by identity, bypassing version resolution.
    ///
    /// Used when loading the canonical container, whose records carry the
    /// decoder that originally produced them. Unknown identities keep the
    /// raw bytes. No version inference runs on this path; the record
    /// already pins its decoder.
    pub fn append_with_identity(&mut self, raw: RawPacket, identity: &str) {
        let decoded = match self.registry.resolve_identity(identity) {
            Some(registration) => match (registration.decode)(&raw, self.context.version()) {
                Ok(body) => DecodedPacket::new(raw, Some(registration.descriptor), body),
                Err(error) => {
                    tracing::debug!(identity, %error, "stored decoder failed; keeping raw bytes");
                    let body = UndecodedBody::malformed(raw.data().clone(), error);
                    DecodedPacket::new(raw, Some(registration.descriptor), Box::new(body))
                }
            },
            None => {
                let body = UndecodedBody::unknown_opcode(raw.data().clone());
                DecodedPacket::new(raw, None, Box::new(body))
            }
        };
        self.packets.push(decoded);
    }
}

impl<'a> IntoIterator for &'a PacketLog {
    type Item = &'a DecodedPacket;
    type IntoIter = std::slice::Iter<'a, DecodedPacket>;

    fn into_iter(self) -> Self::IntoIter {
        self.packets.iter()
    }
}
