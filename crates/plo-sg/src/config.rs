//! Session configuration.

use std::path::Path;
use std::time::Duration;

use plo_sg_protocol::ProtocolRevision;
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, Result};

/// Serial line speed used by every PLO module.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// Time allowed for a full response frame to arrive.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 2000;
/// Pause between writing a command and reading the response.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Configuration for a serial session.
///
/// Every field has a default, so a YAML file only needs the values it
/// changes:
///
/// ```yaml
/// port: /dev/ttyUSB0
/// revision: legacy
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Port to open. `None` picks the first discovered device.
    pub port: Option<String>,
    /// Line speed.
    pub baud_rate: u32,
    /// Read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Settle delay after each write, in milliseconds.
    pub settle_delay_ms: u64,
    /// Command set spoken by the module firmware.
    pub revision: ProtocolRevision,
    /// Report the device's out-of-range warning on save-nth-frequency.
    pub report_frequency_warning: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            revision: ProtocolRevision::default(),
            report_frequency_warning: false,
        }
    }
}

impl SessionConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Reject values the link cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(DriverError::Config("baud_rate must be non-zero".to_string()));
        }
        if self.read_timeout_ms == 0 {
            return Err(DriverError::Config(
                "read_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Read timeout as a duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Settle delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Set the port.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Set the command set.
    pub fn with_revision(mut self, revision: ProtocolRevision) -> Self {
        self.revision = revision;
        self
    }

    /// Set the settle delay.
    pub fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }
}
