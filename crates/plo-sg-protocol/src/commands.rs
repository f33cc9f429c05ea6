//! Command registry.
//!
//! Every logical command maps to an opcode, the number of payload bytes the
//! device returns for it, and the response frame size. Two firmware families
//! exist; each one is a separate table selected by [`ProtocolRevision`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProtocolError;

/// Logical commands understood by PLO modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Bare response / echo.
    Response,
    /// Set the output frequency.
    SetFrequency,
    /// Set the output frequency and store it in a save slot.
    SaveNthFrequency,
    /// Number of frequency save slots.
    GetFrequencyCount,
    /// Read a saved frequency.
    GetNthFrequency,
    /// Module identifier string.
    GetId,
    /// Hardware revision.
    GetHardwareVersion,
    /// Firmware version.
    GetFirmwareVersion,
    /// Output post multiplier.
    GetPostMultiplier,
    /// Reference clock frequency.
    GetReferenceClock,
    /// Module internal serial number.
    GetSerialNumber,
    /// DIP switch reading.
    GetDipSwitch,
    /// Set the output power step.
    SetOutputPower,
    /// Set the output A/B enables.
    SetOutputConfig,
    /// Set the reference clock frequency.
    SetReferenceClock,
    /// Set the reference clock source.
    SetReferenceConfig,
    /// Output power step read-back.
    GetOutputPower,
    /// Output A/B enable read-back.
    GetOutputConfig,
    /// Reference clock source read-back.
    GetReferenceConfig,
    /// Current output frequency read-back.
    GetFrequency,
    /// PLL lock status.
    GetLockStatus,
}

impl Command {
    /// All logical commands, in extended opcode order.
    pub const ALL: [Command; 21] = [
        Command::Response,
        Command::SetFrequency,
        Command::SaveNthFrequency,
        Command::GetFrequencyCount,
        Command::GetNthFrequency,
        Command::GetId,
        Command::GetHardwareVersion,
        Command::GetFirmwareVersion,
        Command::GetPostMultiplier,
        Command::GetReferenceClock,
        Command::GetSerialNumber,
        Command::GetDipSwitch,
        Command::SetOutputPower,
        Command::SetOutputConfig,
        Command::SetReferenceClock,
        Command::SetReferenceConfig,
        Command::GetOutputPower,
        Command::GetOutputConfig,
        Command::GetReferenceConfig,
        Command::GetFrequency,
        Command::GetLockStatus,
    ];
}

/// Response frame size used by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVariant {
    /// 10-byte response frame.
    Standard,
    /// 28-byte response frame.
    Large,
}

impl FrameVariant {
    /// Total response frame length in bytes.
    pub fn total_len(self) -> usize {
        match self {
            FrameVariant::Standard => STANDARD_FRAME_SIZE,
            FrameVariant::Large => LARGE_FRAME_SIZE,
        }
    }

    /// Payload bytes available between the status byte and the checksum:
    /// 5 for `Standard`, 23 for `Large`.
    pub fn payload_capacity(self) -> usize {
        self.total_len() - PAYLOAD_OFFSET - 1
    }
}

/// Wire metadata for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Logical command.
    pub command: Command,
    /// Opcode placed in byte 3 of the command frame.
    pub opcode: u8,
    /// Payload bytes the device returns.
    pub response_len: usize,
    /// Response frame size.
    pub variant: FrameVariant,
}

impl CommandDescriptor {
    const fn standard(command: Command, opcode: u8, response_len: usize) -> Self {
        CommandDescriptor {
            command,
            opcode,
            response_len,
            variant: FrameVariant::Standard,
        }
    }

    const fn large(command: Command, opcode: u8, response_len: usize) -> Self {
        CommandDescriptor {
            command,
            opcode,
            response_len,
            variant: FrameVariant::Large,
        }
    }

    /// Total response frame length for this command.
    pub fn response_frame_len(&self) -> usize {
        self.variant.total_len()
    }
}

/// Firmware command set.
///
/// Legacy firmware only knows opcodes 0 to 11. Extended firmware adds the
/// output, reference and lock commands from opcode 12 on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolRevision {
    /// Opcodes 0..=11.
    Legacy,
    /// Opcodes 0..=20.
    #[default]
    Extended,
}

impl fmt::Display for ProtocolRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolRevision::Legacy => write!(f, "legacy"),
            ProtocolRevision::Extended => write!(f, "extended"),
        }
    }
}

impl ProtocolRevision {
    /// Look up the descriptor of `command` in this command set.
    pub fn lookup(self, command: Command) -> Result<CommandDescriptor, ProtocolError> {
        let descriptor = match self {
            ProtocolRevision::Legacy => legacy_descriptor(command),
            ProtocolRevision::Extended => Some(extended_descriptor(command)),
        };
        descriptor.ok_or(ProtocolError::UnsupportedCommand {
            command,
            revision: self,
        })
    }

    /// Every descriptor defined by this command set.
    pub fn descriptors(self) -> Vec<CommandDescriptor> {
        Command::ALL
            .iter()
            .filter_map(|&command| self.lookup(command).ok())
            .collect()
    }

    /// Check whether `command` exists in this command set.
    pub fn supports(self, command: Command) -> bool {
        self.lookup(command).is_ok()
    }
}

fn legacy_descriptor(command: Command) -> Option<CommandDescriptor> {
    match command {
        Command::SetOutputPower
        | Command::SetOutputConfig
        | Command::SetReferenceClock
        | Command::SetReferenceConfig
        | Command::GetOutputPower
        | Command::GetOutputConfig
        | Command::GetReferenceConfig
        | Command::GetFrequency
        | Command::GetLockStatus => None,
        // Opcodes 0..=11 are shared.
        shared => Some(extended_descriptor(shared)),
    }
}

fn extended_descriptor(command: Command) -> CommandDescriptor {
    use CommandDescriptor as D;
    match command {
        Command::Response => D::standard(command, CMD_RESP, 0),
        Command::SetFrequency => D::standard(command, CMD_SET_FREQ, 0),
        Command::SaveNthFrequency => D::standard(command, CMD_SAVE_NTH_FREQ, 0),
        Command::GetFrequencyCount => D::standard(command, CMD_GET_FREQ_COUNT, 1),
        Command::GetNthFrequency => D::standard(command, CMD_GET_NTH_FREQ, 4),
        Command::GetId => D::large(command, CMD_GET_ID, 8),
        Command::GetHardwareVersion => D::standard(command, CMD_GET_HW_VER, 1),
        Command::GetFirmwareVersion => D::standard(command, CMD_GET_FW_VER, 3),
        Command::GetPostMultiplier => D::standard(command, CMD_GET_POST_MULTI, 1),
        Command::GetReferenceClock => D::standard(command, CMD_GET_REF_CLOCK, 3),
        Command::GetSerialNumber => D::large(command, CMD_GET_SN, 23),
        Command::GetDipSwitch => D::standard(command, CMD_GET_DIP_SW, 1),
        Command::SetOutputPower => D::standard(command, CMD_SET_OUTPUT_POWER, 0),
        Command::SetOutputConfig => D::standard(command, CMD_SET_OUTPUT_CONFIG, 0),
        Command::SetReferenceClock => D::standard(command, CMD_SET_REF_CLOCK, 0),
        Command::SetReferenceConfig => D::standard(command, CMD_SET_REF_CONFIG, 0),
        Command::GetOutputPower => D::standard(command, CMD_GET_OUTPUT_POWER, 1),
        Command::GetOutputConfig => D::standard(command, CMD_GET_OUTPUT_CONFIG, 1),
        Command::GetReferenceConfig => D::standard(command, CMD_GET_REF_CONFIG, 1),
        Command::GetFrequency => D::standard(command, CMD_GET_FREQ, 4),
        Command::GetLockStatus => D::standard(command, CMD_GET_LOCK_STATUS, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_len_fits_variant() {
        for revision in [ProtocolRevision::Legacy, ProtocolRevision::Extended] {
            for d in revision.descriptors() {
                assert!(
                    d.response_len <= d.variant.payload_capacity(),
                    "{:?} returns {} bytes in a {:?} frame",
                    d.command,
                    d.response_len,
                    d.variant
                );
            }
        }
    }

    #[test]
    fn test_payload_capacity() {
        assert_eq!(FrameVariant::Standard.payload_capacity(), 5);
        assert_eq!(FrameVariant::Large.payload_capacity(), 23);
    }

    #[test]
    fn test_large_variant_commands() {
        let rev = ProtocolRevision::Extended;
        assert_eq!(rev.lookup(Command::GetId).unwrap().response_frame_len(), 28);
        assert_eq!(rev.lookup(Command::GetSerialNumber).unwrap().response_frame_len(), 28);
        assert_eq!(rev.lookup(Command::GetLockStatus).unwrap().response_frame_len(), 10);
    }

    #[test]
    fn test_extended_opcodes_are_unique() {
        let mut opcodes: Vec<u8> = ProtocolRevision::Extended
            .descriptors()
            .iter()
            .map(|d| d.opcode)
            .collect();
        assert_eq!(opcodes.len(), 21);
        opcodes.sort_unstable();
        opcodes.dedup();
        assert_eq!(opcodes.len(), 21);
        assert_eq!(*opcodes.last().unwrap(), CMD_GET_LOCK_STATUS);
    }

    #[test]
    fn test_legacy_rejects_extended_commands() {
        let legacy = ProtocolRevision::Legacy;
        assert_eq!(legacy.descriptors().len(), 12);
        assert!(legacy.supports(Command::GetReferenceClock));
        assert!(!legacy.supports(Command::SetReferenceClock));

        let err = legacy.lookup(Command::GetLockStatus).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnsupportedCommand {
                command: Command::GetLockStatus,
                revision: ProtocolRevision::Legacy,
            }
        );
    }

    #[test]
    fn test_shared_opcodes_match() {
        for d in ProtocolRevision::Legacy.descriptors() {
            assert_eq!(ProtocolRevision::Extended.lookup(d.command).unwrap(), d);
        }
    }
}
