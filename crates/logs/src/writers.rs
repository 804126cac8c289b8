//! Archive writers
//!
//! The converter can re-serialize a decoded log into several archive
//! formats behind one [`LogWriter`] trait: the canonical binary container
//! (the only format that round trips), a plain-text rendering for humans,
//! and a JSON export for tooling. All writers honor the filter and the
//! coarse progress cadence.

use std::io::Write;

use camlog_core::{Direction, ProtocolFamily, Result};
use serde::Serialize;

use crate::codec::{ContainerWriter, DEFAULT_PROGRESS_INTERVAL};
use crate::filter::FilterPredicate;
use crate::log::PacketLog;

/// One archive output format
pub trait LogWriter {
    /// Serialize the retained packets of `log` to `out`.
    fn write_log(
        &self,
        out: &mut dyn Write,
        log: &PacketLog,
        filter: Option<&FilterPredicate>,
        progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<()>;
}

/// Canonical binary container writer
#[derive(Default)]
pub struct BinaryLogWriter {
    inner: ContainerWriter,
}

impl BinaryLogWriter {
    pub fn new() -> Self {
        Self {
            inner: ContainerWriter::new(),
        }
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.inner = self.inner.with_progress_interval(interval);
        self
    }
}

impl LogWriter for BinaryLogWriter {
    fn write_log(
        &self,
        out: &mut dyn Write,
        log: &PacketLog,
        filter: Option<&FilterPredicate>,
        progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<()> {
        self.inner.write(out, log, filter, progress)
    }
}

fn direction_arrow(direction: Direction) -> &'static str {
    match direction {
        Direction::ClientToServer => "C=>S",
        Direction::ServerToClient => "S=>C",
    }
}

fn family_tag(family: ProtocolFamily) -> &'static str {
    match family {
        ProtocolFamily::Tcp => "TCP",
        ProtocolFamily::Udp => "UDP",
    }
}

/// Human-readable text archive writer
pub struct TextLogWriter {
    verbose: bool,
    progress_interval: usize,
}

impl TextLogWriter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }
}

impl LogWriter for TextLogWriter {
    fn write_log(
        &self,
        out: &mut dyn Write,
        log: &PacketLog,
        filter: Option<&FilterPredicate>,
        mut progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<()> {
        let total = log.len();
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
            let label = packet.descriptor().map_or("unknown", |d| d.label);
            writeln!(
                out,
                "[{}] {} {} 0x{:02X} ({}): {}",
                packet.raw().timestamp_ticks(),
                family_tag(packet.family()),
                direction_arrow(packet.direction()),
                packet.opcode(),
                label,
                packet.render(self.verbose),
            )?;
        }
        out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    opcode: u16,
    direction: Direction,
    family: ProtocolFamily,
    timestamp_ticks: i64,
    decoder: &'a str,
    label: Option<&'a str>,
    text: String,
}

/// JSON archive writer for downstream tooling
pub struct JsonLogWriter {
    verbose: bool,
    progress_interval: usize,
}

impl JsonLogWriter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }
}

impl LogWriter for JsonLogWriter {
    fn write_log(
        &self,
        out: &mut dyn Write,
        log: &PacketLog,
        filter: Option<&FilterPredicate>,
        mut progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> Result<()> {
        let total = log.len();
        let mut records = Vec::new();
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
            records.push(JsonRecord {
                opcode: packet.opcode(),
                direction: packet.direction(),
                family: packet.family(),
                timestamp_ticks: packet.raw().timestamp_ticks(),
                decoder: packet.identity(),
                label: packet.descriptor().map(|d| d.label),
                text: packet.render(self.verbose),
            });
        }
        serde_json::to_writer_pretty(&mut *out, &records)
            .map_err(|e| camlog_core::CamlogError::Io(e.into()))?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use camlog_core::ProtocolVersion;
    use camlog_protocol::{standard_registry, LogContext, RawPacket};

    fn sample_log() -> PacketLog {
        let registry = std::sync::Arc::new(standard_registry().unwrap());
        let mut log = PacketLog::new(registry, LogContext::new(ProtocolVersion::new(190, 2)));
        log.append(RawPacket::new(
            0x4C,
            Direction::ServerToClient,
            ProtocolFamily::Tcp,
            42,
            Bytes::from(vec![0x12, 0x34, 5, 1, 0, 0, 0, 0]),
        ));
        log.append(RawPacket::new(
            0x18,
            Direction::ClientToServer,
            ProtocolFamily::Udp,
            43,
            Bytes::from(vec![0x01]),
        ));
        log
    }

    #[test]
    fn text_writer_renders_one_line_per_packet() {
        let log = sample_log();
        let mut buf = Vec::new();
        TextLogWriter::new(false)
            .write_log(&mut buf, &log, None, None)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[42] TCP S=>C 0x4C (Visual effect):"));
        assert!(lines[0].contains("(ColorName) flag:1(PvP)"));
        assert!(lines[1].contains("UNKNOWN OPCODE"));
    }

    #[test]
    fn text_writer_honors_the_filter() {
        let log = sample_log();
        let mut buf = Vec::new();
        let filter = FilterPredicate::Opcode(0x4C);
        TextLogWriter::new(false)
            .write_log(&mut buf, &log, Some(&filter), None)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn json_writer_emits_valid_records() {
        let log = sample_log();
        let mut buf = Vec::new();
        JsonLogWriter::new(true)
            .write_log(&mut buf, &log, None, None)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["opcode"], 0x4C);
        assert_eq!(records[0]["decoder"], "stoc.0x4c.visual_effect");
        assert_eq!(records[0]["direction"], "ServerToClient");
        assert_eq!(records[1]["decoder"], "raw");
        assert!(records[1]["label"].is_null());
    }

    #[test]
    fn binary_writer_matches_the_container_codec() {
        let log = sample_log();
        let mut via_trait = Vec::new();
        BinaryLogWriter::new()
            .write_log(&mut via_trait, &log, None, None)
            .unwrap();
        let mut direct = Vec::new();
        ContainerWriter::new()
            .write(&mut direct, &log, None, None)
            .unwrap();
        assert_eq!(via_trait, direct);
    }
}
