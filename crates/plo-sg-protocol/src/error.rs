//! Protocol error types.

use thiserror::Error;

use crate::commands::{Command, ProtocolRevision};

/// Errors that can occur when building or interpreting frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Command payload does not fit in a frame.
    #[error("payload too long: maximum {max} bytes, got {actual}")]
    PayloadTooLong {
        /// Maximum payload length.
        max: usize,
        /// Length supplied by the caller.
        actual: usize,
    },

    /// Frame has the wrong length for the operation.
    #[error("frame length mismatch: expected {expected} bytes, got {actual}")]
    FrameLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Command is not part of the selected command set.
    #[error("{command:?} is not supported by the {revision} command set")]
    UnsupportedCommand {
        /// Requested command.
        command: Command,
        /// Active protocol revision.
        revision: ProtocolRevision,
    },

    /// A payload byte is outside the legal range of its field.
    #[error("invalid {field} value: {value}")]
    InvalidValue {
        /// Field being decoded.
        field: &'static str,
        /// Offending raw value.
        value: u32,
    },

    /// UTF-8 decoding error.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
}
