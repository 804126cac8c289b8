//! Canonical binary container codec
//!
//! # Container Format
//! ```text
//! [11 bytes ASCII magic "[camlog v1]"]
//! then one record per retained packet:
//! [u16 rawLen][u8 idLen][idLen bytes decoder identity]
//! [u16 opcode][u8 direction][u8 family][i64 timestampTicks]
//! [rawLen bytes raw payload]
//! ```
//! Record scalars are little-endian; the payload is opaque. Records
//! appear in capture order with no trailing index or checksum. The format
//! stores the decoder identity per record, so a mixed-version log round
//! trips without re-running version inference.
//!
//! An unexpected end of stream inside a record is a
//! [`CamlogError::MalformedContainer`]; it fails that log only, never a
//! sibling log in a batch.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use camlog_core::{CamlogError, Direction, ProtocolFamily, Result};
use camlog_protocol::RawPacket;

use crate::filter::FilterPredicate;
use crate::log::PacketLog;

/// ASCII magic opening every container.
pub const CONTAINER_MAGIC: &[u8] = b"[camlog v1]";

/// Default progress cadence: one callback per this many records.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 4096;

/// Writer for the canonical container
pub struct ContainerWriter {
    progress_interval: usize,
}

impl Default for ContainerWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Override the progress cadence. The period is a tuning knob, not a
    /// format property; an interval of 1 reports every record.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Serialize one log, skipping filter-excluded packets entirely.
    pub fn write(
        &self,
        out: &mut dyn Write,
        log: &PacketLog,
        filter: Option<&FilterPredicate>,
        progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<()> {
        out.write_all(CONTAINER_MAGIC)?;
        self.write_records(out, log, filter, progress)?;
        out.flush()?;
        Ok(())
    }

    /// Serialize several logs into one container, one magic header, all
    /// records in order.
    pub fn write_batch(
        &self,
        out: &mut dyn Write,
        logs: &[PacketLog],
        filter: Option<&FilterPredicate>,
        mut progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<()> {
        out.write_all(CONTAINER_MAGIC)?;
        for log in logs {
            self.write_records(out, log, filter, progress.as_deref_mut())?;
        }
        out.flush()?;
        Ok(())
    }

    fn write_records(
        &self,
        out: &mut dyn Write,
        log: &PacketLog,
        filter: Option<&FilterPredicate>,
        mut progress: Option<&mut (dyn FnMut(usize, usize) + '_)>,
    ) -> Result<()> {
        let total = log.len();
        let mut record = BytesMut::new();
        for (i, packet) in log.iter().enumerate() {
            if let Some(callback) = progress.as_deref_mut() {
                if i % self.progress_interval == 0 {
                    callback(i + 1, total);
                }
            }
            if let Some(predicate) = filter {
                if !predicate.matches(packet) {
                    continue;
                }
            }

            let raw = packet.raw();
            let raw_len = u16::try_from(raw.len()).map_err(|_| {
                CamlogError::MalformedContainer(format!(
                    "packet of {} bytes exceeds the container record limit",
                    raw.len()
                ))
            })?;
            let identity = packet.identity().as_bytes();

            record.clear();
            record.put_u16_le(raw_len);
            record.put_u8(identity.len() as u8);
            record.put_slice(identity);
            record.put_u16_le(raw.opcode());
            record.put_u8(raw.direction().as_u8());
            record.put_u8(raw.family().as_u8());
            record.put_i64_le(raw.timestamp_ticks());
            record.put_slice(raw.data());
            out.write_all(&record)?;
        }
        Ok(())
    }
}

/// One record read back from a container
#[derive(Debug, Clone)]
pub struct ContainerRecord {
    /// Identity of the decoder that produced the packet when written
    pub identity: String,
    /// The captured packet, byte-exact
    pub raw: RawPacket,
}

/// Fill `buf`, distinguishing a clean end of stream (no bytes at all,
/// returns false) from a truncated record.
fn read_or_end(input: &mut dyn Read, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(CamlogError::MalformedContainer(
                "unexpected end of stream inside a record".to_string(),
            ));
        }
        filled += n;
    }
    Ok(true)
}

fn read_exact(input: &mut dyn Read, buf: &mut [u8], what: &str) -> Result<()> {
    if read_or_end(input, buf)? {
        Ok(())
    } else {
        Err(CamlogError::MalformedContainer(format!(
            "unexpected end of stream reading {what}"
        )))
    }
}

/// Read a whole container back into records.
pub fn read_container(input: &mut dyn Read) -> Result<Vec<ContainerRecord>> {
    let mut magic = [0u8; CONTAINER_MAGIC.len()];
    read_exact(input, &mut magic, "container magic")?;
    if magic != CONTAINER_MAGIC {
        return Err(CamlogError::MalformedContainer(
            "bad container magic".to_string(),
        ));
    }

    let mut records = Vec::new();
    loop {
        let mut raw_len_buf = [0u8; 2];
        if !read_or_end(input, &mut raw_len_buf)? {
            break;
        }
        let raw_len = u16::from_le_bytes(raw_len_buf) as usize;

        let mut id_len_buf = [0u8; 1];
        read_exact(input, &mut id_len_buf, "identity length")?;
        let mut identity = vec![0u8; id_len_buf[0] as usize];
        read_exact(input, &mut identity, "decoder identity")?;
        let identity = String::from_utf8(identity).map_err(|_| {
            CamlogError::MalformedContainer("decoder identity is not UTF-8".to_string())
        })?;

        let mut opcode_buf = [0u8; 2];
        read_exact(input, &mut opcode_buf, "opcode")?;
        let opcode = u16::from_le_bytes(opcode_buf);

        let mut direction_buf = [0u8; 1];
        read_exact(input, &mut direction_buf, "direction")?;
        let direction = Direction::from_u8(direction_buf[0]).ok_or_else(|| {
            CamlogError::MalformedContainer(format!("bad direction byte {}", direction_buf[0]))
        })?;

        let mut family_buf = [0u8; 1];
        read_exact(input, &mut family_buf, "protocol family")?;
        let family = ProtocolFamily::from_u8(family_buf[0]).ok_or_else(|| {
            CamlogError::MalformedContainer(format!("bad family byte {}", family_buf[0]))
        })?;

        let mut timestamp_buf = [0u8; 8];
        read_exact(input, &mut timestamp_buf, "timestamp")?;
        let timestamp_ticks = i64::from_le_bytes(timestamp_buf);

        let mut data = vec![0u8; raw_len];
        read_exact(input, &mut data, "raw payload")?;

        records.push(ContainerRecord {
            identity,
            raw: RawPacket::new(opcode, direction, family, timestamp_ticks, Bytes::from(data)),
        });
    }
    Ok(records)
}

/// Read a container and decode every record with its stored identity.
pub fn read_log(
    input: &mut dyn Read,
    registry: std::sync::Arc<camlog_protocol::DecoderRegistry>,
    context: camlog_protocol::LogContext,
) -> Result<PacketLog> {
    let records = read_container(input)?;
    let mut log = PacketLog::new(registry, context);
    for record in records {
        log.append_with_identity(record.raw, &record.identity);
    }
    Ok(log)
}
