//! Error types for the driver.

use plo_sg_protocol::{ProtocolError, ResultCode};
use thiserror::Error;

/// Errors that stop an operation before or outside a protocol exchange.
///
/// Protocol-level failures (timeouts, checksum problems, device errors) are
/// not errors here; they come back as a [`ResultCode`].
#[derive(Debug, Error)]
pub enum DriverError {
    /// No port was given and discovery found no device.
    #[error("no SG device found and no port selected")]
    NoDevice,

    /// The serial port could not be opened.
    #[error("failed to open {port}: {source}")]
    OpenPort {
        /// Port that was requested.
        port: String,
        /// Underlying serial error.
        #[source]
        source: serialport::Error,
    },

    /// Argument rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Writing to the port failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame or payload error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DriverError {
    /// Result code reported for this error by the command-line tool.
    pub fn result_code(&self) -> ResultCode {
        match self {
            DriverError::NoDevice | DriverError::OpenPort { .. } => ResultCode::ErrorOpenPort,
            _ => ResultCode::Error,
        }
    }
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
