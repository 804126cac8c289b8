//! # camlog log handling
//!
//! The replay and conversion layer on top of `camlog-protocol`:
//!
//! - [`PacketLog`] replays captured packets through the decoder registry
//!   under one shared version context, correcting the assumed protocol
//!   version mid-stream when a decoder's payload shape proves it stale.
//! - [`FilterPredicate`] selects which packets reach the output.
//! - [`codec`] reads and writes the canonical binary container; the
//!   [`writers`] module adds text and JSON archive formats behind one
//!   [`LogWriter`] trait.
//! - [`ConvertSettings`] loads conversion options from a plain-text
//!   settings file.
//!
//! Everything here is synchronous and single-threaded per log; separate
//! logs are independent and may be processed in parallel by the caller.

pub mod codec;
pub mod filter;
pub mod log;
pub mod settings;
pub mod writers;

pub use codec::{read_container, read_log, ContainerRecord, ContainerWriter, CONTAINER_MAGIC};
pub use filter::FilterPredicate;
pub use log::PacketLog;
pub use settings::ConvertSettings;
pub use writers::{BinaryLogWriter, JsonLogWriter, LogWriter, TextLogWriter};
