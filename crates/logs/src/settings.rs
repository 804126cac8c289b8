//! Conversion settings file
//!
//! Options load from a plain-text file of `key = value` lines; `#` opens
//! a comment and blank lines are skipped. Unknown keys are a
//! configuration error so typos fail loudly at startup.
//!
//! ```text
//! # camlog settings
//! version = 190.2
//! version_inferred = false
//! ignore_version_changes = false
//! verbose = true
//! progress_interval = 0x1000
//! ```

use std::fs;
use std::path::Path;

use camlog_core::{parse_i64, CamlogError, ProtocolVersion, Result};
use camlog_protocol::LogContext;

use crate::codec::DEFAULT_PROGRESS_INTERVAL;

/// Options controlling one conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSettings {
    /// Protocol version assumed at the start of each log
    pub version: ProtocolVersion,
    /// Whether `version` is an assumption (subject to correction) or an
    /// explicitly configured fact
    pub version_inferred: bool,
    /// Start logs latched: never correct the version mid-stream
    pub ignore_version_changes: bool,
    /// Render unknown-purpose fields in archive output
    pub verbose: bool,
    /// Progress callback cadence in records
    pub progress_interval: usize,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::new(190, 2),
            version_inferred: true,
            ignore_version_changes: false,
            verbose: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(CamlogError::Config(format!(
            "option {key:?} expects a boolean, got {value:?}"
        ))),
    }
}

impl ConvertSettings {
    /// Parse settings text. Missing keys keep their defaults.
    pub fn parse(text: &str) -> Result<Self> {
        let mut settings = Self::default();
        for (line_no, line) in text.lines().enumerate() {
            let line = match line.find('#') {
                Some(comment) => &line[..comment],
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                CamlogError::Config(format!("line {}: expected key = value", line_no + 1))
            })?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            match key.as_str() {
                "version" => {
                    settings.version = value.parse().map_err(|_| {
                        CamlogError::Config(format!("bad version value {value:?}"))
                    })?;
                }
                "version_inferred" => settings.version_inferred = parse_bool(&key, value)?,
                "ignore_version_changes" => {
                    settings.ignore_version_changes = parse_bool(&key, value)?;
                }
                "verbose" => settings.verbose = parse_bool(&key, value)?,
                "progress_interval" => {
                    let interval = parse_i64(value)
                        .filter(|v| *v > 0)
                        .ok_or_else(|| {
                            CamlogError::Config(format!(
                                "bad progress_interval value {value:?}"
                            ))
                        })?;
                    settings.progress_interval = interval as usize;
                }
                _ => {
                    return Err(CamlogError::Config(format!("unknown option {key:?}")));
                }
            }
        }
        Ok(settings)
    }

    /// Load settings from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Build the starting log context these settings describe.
    pub fn context(&self) -> LogContext {
        let mut context = if self.version_inferred {
            LogContext::inferred(self.version)
        } else {
            LogContext::new(self.version)
        };
        if self.ignore_version_changes {
            context.latch();
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let settings = ConvertSettings::parse("").unwrap();
        assert_eq!(settings, ConvertSettings::default());
    }

    #[test]
    fn parse_full_file() {
        let text = "\
# conversion options
version = 190.1
version_inferred = false
ignore_version_changes = true  # latch from the start
verbose = yes
progress_interval = 0x1000
";
        let settings = ConvertSettings::parse(text).unwrap();
        assert_eq!(settings.version, ProtocolVersion::new(190, 1));
        assert!(!settings.version_inferred);
        assert!(settings.ignore_version_changes);
        assert!(settings.verbose);
        assert_eq!(settings.progress_interval, 4096);
    }

    #[test]
    fn unknown_key_is_a_config_error() {
        let err = ConvertSettings::parse("colour = blue").unwrap_err();
        assert!(matches!(err, CamlogError::Config(_)));
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(ConvertSettings::parse("version = fast").is_err());
        assert!(ConvertSettings::parse("verbose = maybe").is_err());
        assert!(ConvertSettings::parse("progress_interval = 0").is_err());
        assert!(ConvertSettings::parse("version").is_err());
    }

    #[test]
    fn context_reflects_the_settings() {
        let settings = ConvertSettings::parse(
            "version = 190.0\nversion_inferred = true\nignore_version_changes = true\n",
        )
        .unwrap();
        let context = settings.context();
        assert_eq!(context.version(), ProtocolVersion::new(190, 0));
        assert!(context.is_inferred());
        assert!(context.is_latched());
    }
}
