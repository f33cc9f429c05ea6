//! Typed values carried in response payloads.

use std::fmt;

use crate::error::ProtocolError;

fn require(payload: &[u8], len: usize) -> Result<(), ProtocolError> {
    if payload.len() < len {
        return Err(ProtocolError::FrameLength {
            expected: len,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Decode a little-endian integer of up to four bytes.
///
/// Frequencies use all four bytes, the reference clock only three.
pub fn decode_u32_le(payload: &[u8]) -> u32 {
    let mut bytes = [0u8; 4];
    let len = payload.len().min(4);
    bytes[..len].copy_from_slice(&payload[..len]);
    u32::from_le_bytes(bytes)
}

/// Decode a single byte value.
pub fn decode_u8(payload: &[u8]) -> Result<u8, ProtocolError> {
    require(payload, 1)?;
    Ok(payload[0])
}

/// Decode a text field. Trailing NUL padding is dropped.
pub fn decode_string(payload: &[u8]) -> Result<String, ProtocolError> {
    let end = payload
        .iter()
        .rposition(|&b| b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    std::str::from_utf8(&payload[..end])
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidUtf8)
}

/// Firmware version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FirmwareVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Patch level.
    pub patch: u8,
}

impl FirmwareVersion {
    /// Decode from the first three payload bytes.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        require(payload, 3)?;
        Ok(FirmwareVersion {
            major: payload[0],
            minor: payload[1],
            patch: payload[2],
        })
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Hardware revision byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareVersion(pub u8);

impl fmt::Display for HardwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Output frequency multiplier applied after the PLL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostMultiplier(u8);

impl PostMultiplier {
    /// Largest raw setting whose factor fits in a `u32`.
    pub const MAX_RAW: u8 = 32;

    /// Decode the raw setting `p` as a factor of `2^(p-1)`: 1 = x1, 2 = x2,
    /// 3 = x4 and so on. Zero has no integer factor.
    pub fn from_raw(raw: u8) -> Result<Self, ProtocolError> {
        match raw {
            1..=Self::MAX_RAW => Ok(PostMultiplier(raw)),
            _ => Err(ProtocolError::InvalidValue {
                field: "post multiplier",
                value: raw as u32,
            }),
        }
    }

    /// Multiplication factor, `2^(raw - 1)`.
    pub fn factor(self) -> u32 {
        1 << (self.0 - 1)
    }

    /// Raw setting byte.
    pub fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PostMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor())
    }
}

/// Which RF outputs are enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputConfig {
    /// Both outputs disabled.
    Off = 0,
    /// Output A only.
    OutAOnly = 1,
    /// Output B only.
    OutBOnly = 2,
    /// Both outputs enabled.
    #[default]
    Both = 3,
}

impl TryFrom<u8> for OutputConfig {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OutputConfig::Off),
            1 => Ok(OutputConfig::OutAOnly),
            2 => Ok(OutputConfig::OutBOnly),
            3 => Ok(OutputConfig::Both),
            _ => Err(ProtocolError::InvalidValue {
                field: "output config",
                value: value as u32,
            }),
        }
    }
}

impl From<OutputConfig> for u8 {
    fn from(config: OutputConfig) -> Self {
        config as u8
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputConfig::Off => write!(f, "OUTA_OFF_OUTB_OFF"),
            OutputConfig::OutAOnly => write!(f, "OUTA_ON_OUTB_OFF"),
            OutputConfig::OutBOnly => write!(f, "OUTA_OFF_OUTB_ON"),
            OutputConfig::Both => write!(f, "OUTA_ON_OUTB_ON"),
        }
    }
}

/// Reference clock source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum RefClockSource {
    /// Internal reference.
    #[default]
    Internal = 0,
    /// Internal reference, also driven on the reference connector.
    InternalWithOutput = 1,
    /// External reference input.
    ExternalInput = 2,
}

impl TryFrom<u8> for RefClockSource {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RefClockSource::Internal),
            1 => Ok(RefClockSource::InternalWithOutput),
            2 => Ok(RefClockSource::ExternalInput),
            _ => Err(ProtocolError::InvalidValue {
                field: "reference clock config",
                value: value as u32,
            }),
        }
    }
}

impl From<RefClockSource> for u8 {
    fn from(source: RefClockSource) -> Self {
        source as u8
    }
}

impl fmt::Display for RefClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefClockSource::Internal => write!(f, "REF_CLOCK_INTERNAL"),
            RefClockSource::InternalWithOutput => write!(f, "REF_CLOCK_INTERNAL_OUT"),
            RefClockSource::ExternalInput => write!(f, "REF_CLOCK_EXTERNAL_IN"),
        }
    }
}

/// PLL lock status byte. Non-zero means locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus(pub u8);

impl LockStatus {
    /// Check if the PLL reports lock.
    pub fn is_locked(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
