//! Per-log protocol version context
//!
//! Each log carries exactly one [`LogContext`]. Decode runs under the
//! context's current version; decoders whose payload shape proves the
//! assumed version stale may request a correction through
//! [`LogContext::request_version`].
//!
//! # Invariants
//! - The version never decreases across a log's lifetime.
//! - Once the ignore latch is set, no further requests are granted.

use camlog_core::ProtocolVersion;

/// Mutable version state shared by all packets of one log
#[derive(Debug, Clone)]
pub struct LogContext {
    version: ProtocolVersion,
    inferred: bool,
    ignore_version_changes: bool,
    subversion_reinit: bool,
}

impl LogContext {
    /// Create a context with an explicitly configured version.
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            inferred: false,
            ignore_version_changes: false,
            subversion_reinit: false,
        }
    }

    /// Create a context whose version is an assumption, not configuration.
    pub fn inferred(version: ProtocolVersion) -> Self {
        Self {
            inferred: true,
            ..Self::new(version)
        }
    }

    /// Active protocol version used for decoder resolution.
    #[inline]
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Whether the current version was inferred rather than configured.
    #[inline]
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    /// Whether further version requests are ignored.
    #[inline]
    pub fn is_latched(&self) -> bool {
        self.ignore_version_changes
    }

    /// Set the ignore latch. Used by configuration, and internally after a
    /// subversion reinit to stop oscillation on recurring ambiguous
    /// payload lengths.
    pub fn latch(&mut self) {
        self.ignore_version_changes = true;
    }

    /// Whether a granted version change is waiting for a re-decode pass.
    #[inline]
    pub fn needs_reinit(&self) -> bool {
        self.subversion_reinit
    }

    /// Consume the reinit flag, returning whether it was set.
    pub fn take_reinit(&mut self) -> bool {
        std::mem::replace(&mut self.subversion_reinit, false)
    }

    /// Request a version correction from a decoder's structural signal.
    ///
    /// Only an increase can be granted. A request while latched is a
    /// logged no-op; an equal or lower version is silently ignored.
    /// Returns whether the version actually changed.
    pub fn request_version(&mut self, version: ProtocolVersion) -> bool {
        if self.ignore_version_changes {
            tracing::debug!(
                current = %self.version,
                requested = %version,
                "version change requested while latched; ignoring"
            );
            return false;
        }
        if version <= self.version {
            return false;
        }
        tracing::info!(from = %self.version, to = %version, "correcting log protocol version");
        self.version = version;
        self.inferred = true;
        self.subversion_reinit = true;
        true
    }
}
