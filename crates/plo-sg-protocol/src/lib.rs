//! PLO Signal Generator UART Protocol
//!
//! This crate provides the wire format used by PLO signal generator modules:
//! the command registry, frame encoding and validation, exchange result codes
//! and decoders for the typed values the module reports. It performs no I/O.
//!
//! # Protocol Overview
//!
//! The host sends fixed 18-byte command frames and the module answers with a
//! 10-byte frame, or a 28-byte frame for the module id and serial number.
//! Every frame ends with an LRC over all bytes after the `0xFF 0xFE` header.
//! The status byte of a response echoes the opcode, or carries `0xFE` when the
//! module rejected the command checksum and `0xFF` for a generic error.
//!
//! # Example
//!
//! ```rust
//! use plo_sg_protocol::{decode_frame, encode_frame, Command, Payload, ProtocolRevision};
//!
//! let descriptor = ProtocolRevision::Extended.lookup(Command::SetFrequency).unwrap();
//! let frame = encode_frame(descriptor.opcode, &Payload::new().with_u32_le(0, 100_000));
//! assert_eq!(frame.len(), 18);
//!
//! let reply = [0xFF, 0xFE, 0x10, 0x01, 0, 0, 0, 0, 0, 0xEF];
//! let decoded = decode_frame(&reply, descriptor.response_frame_len(), descriptor.response_len);
//! assert!(decoded.code.is_success());
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod result;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use result::*;
pub use types::*;
