//! Protocol constants
//!
//! Opcodes, frame geometry and reserved status values used on the PLO
//! signal generator UART link.

// ============================================================================
// Frame Geometry
// ============================================================================

/// First header byte of every frame.
pub const FRAME_HEADER_0: u8 = 0xFF;
/// Second header byte of every frame.
pub const FRAME_HEADER_1: u8 = 0xFE;
/// Command length byte. Always 16, although a command frame is 18 bytes long.
pub const FRAME_LEN_BYTE: u8 = 0x10;

/// Size of a host → device command frame.
pub const COMMAND_FRAME_SIZE: usize = 18;
/// Payload bytes carried by a command frame.
pub const COMMAND_PAYLOAD_SIZE: usize = 13;

/// Size of a standard device → host response frame.
pub const STANDARD_FRAME_SIZE: usize = 10;
/// Size of a large device → host response frame (module id, serial number).
pub const LARGE_FRAME_SIZE: usize = 28;

/// Offset of the command / status byte.
pub const OPCODE_OFFSET: usize = 3;
/// Offset of the first payload byte.
pub const PAYLOAD_OFFSET: usize = 4;
/// Header bytes excluded from the checksum.
pub const LRC_SKIP: usize = 2;

// ============================================================================
// Status Codes (device → host, byte 3)
// ============================================================================

/// Device accepted the command.
pub const PLO_RET_SUCCESS: u8 = 0x00;
/// Device accepted a frequency outside its calibrated range.
pub const PLO_RET_WARNING: u8 = 0x01;
/// Device rejected the command frame because of a bad checksum.
pub const PLO_RET_ERROR_LRC: u8 = 0xFE;
/// Generic error. Meaning depends on the command.
pub const PLO_RET_ERROR: u8 = 0xFF;

// ============================================================================
// Command Codes (host → device)
// ============================================================================

/// Bare response / echo.
pub const CMD_RESP: u8 = 0;
/// Set the output frequency in kHz.
pub const CMD_SET_FREQ: u8 = 1;
/// Set the output frequency and store it in a save slot.
pub const CMD_SAVE_NTH_FREQ: u8 = 2;
/// Number of frequency save slots.
pub const CMD_GET_FREQ_COUNT: u8 = 3;
/// Read a saved frequency.
pub const CMD_GET_NTH_FREQ: u8 = 4;
/// Module identifier string.
pub const CMD_GET_ID: u8 = 5;
/// Hardware revision byte.
pub const CMD_GET_HW_VER: u8 = 6;
/// Firmware version triple.
pub const CMD_GET_FW_VER: u8 = 7;
/// Output post multiplier.
pub const CMD_GET_POST_MULTI: u8 = 8;
/// Reference clock frequency in kHz.
pub const CMD_GET_REF_CLOCK: u8 = 9;
/// Module internal serial number.
pub const CMD_GET_SN: u8 = 10;
/// DIP switch reading.
pub const CMD_GET_DIP_SW: u8 = 11;

/// Output power step (extended firmware only).
pub const CMD_SET_OUTPUT_POWER: u8 = 12;
/// Output A/B enable (extended firmware only).
pub const CMD_SET_OUTPUT_CONFIG: u8 = 13;
/// Reference clock frequency in kHz (extended firmware only).
pub const CMD_SET_REF_CLOCK: u8 = 14;
/// Reference clock source (extended firmware only).
pub const CMD_SET_REF_CONFIG: u8 = 15;
/// Output power step read-back (extended firmware only).
pub const CMD_GET_OUTPUT_POWER: u8 = 16;
/// Output A/B enable read-back (extended firmware only).
pub const CMD_GET_OUTPUT_CONFIG: u8 = 17;
/// Reference clock source read-back (extended firmware only).
pub const CMD_GET_REF_CONFIG: u8 = 18;
/// Current output frequency read-back (extended firmware only).
pub const CMD_GET_FREQ: u8 = 19;
/// PLL lock status (extended firmware only).
pub const CMD_GET_LOCK_STATUS: u8 = 20;

// ============================================================================
// Value Ranges
// ============================================================================

/// Highest output power step accepted by the module.
pub const MAX_OUTPUT_POWER_STEP: u8 = 12;
/// Payload offset of the save slot index for save-nth-frequency.
pub const SAVE_SLOT_OFFSET: usize = COMMAND_PAYLOAD_SIZE - 1;
